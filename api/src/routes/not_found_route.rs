use crate::error_handler::AppError;

/// Fallback for every unknown route.
pub async fn not_found() -> AppError {
    AppError::NotFound
}

/// Known route, wrong method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
