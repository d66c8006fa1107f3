pub mod chat_completion_service;
pub mod envelope;
