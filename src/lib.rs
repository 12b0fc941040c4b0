//! Bodhi is a terminal chat client for a remote reasoning model, with paced
//! streaming output and canned-answer guardrails for sensitive questions.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation model, query classification, request
//!   construction, stream demultiplexing, the typing pacer, and per-turn
//!   orchestration.
//! - [`ui`] renders the terminal interface, converts message text into a
//!   structured display tree, and runs the interactive event loop.
//! - [`api`] defines the chat-completions payloads exchanged with the remote
//!   service.
//!
//! The binary entrypoint (`src/main.rs`) loads configuration from the
//! environment and dispatches into [`ui::chat_loop`] for interactive
//! sessions.

pub mod api;
pub mod core;
pub mod ui;
pub mod utils;
