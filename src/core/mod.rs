pub mod chat_stream;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod message;
pub mod orchestrator;
pub mod pacer;
pub mod persona;
pub mod templates;
