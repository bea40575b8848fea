pub mod app;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod flight;
pub mod hierarchy;
pub mod keyring;
pub mod mutation;
pub mod queries;
pub mod session;
