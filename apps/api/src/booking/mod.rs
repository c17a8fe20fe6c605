pub mod draft;
pub mod extractor;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod repository;
pub mod validation;
