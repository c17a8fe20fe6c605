pub mod answer;
pub mod embeddings;
pub mod handlers;
pub mod intent;
pub mod prompts;
pub mod vector_store;
