pub mod chat;
pub mod not_found_route;
