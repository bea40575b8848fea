//! Chatdeck is a line-oriented client for an agent chat backend.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] defines the backend payloads, the [`api::RemoteDataClient`]
//!   seam, and its `reqwest` implementation.
//! - [`core`] owns the query cache, mutation invalidation, the chat session
//!   and the provider/model hierarchy, plus configuration and keyring access.
//! - [`auth`] stores backend access tokens and runs the terminal prompts.
//! - [`cli`] parses arguments and drives the core from the terminal.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which builds a [`core::app::App`] per
//! invocation.

pub mod api;
pub mod auth;
pub mod cli;
pub mod core;
pub mod utils;
