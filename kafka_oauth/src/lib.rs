pub mod auth;
pub mod configurator;
pub mod connection_settings;
pub mod consumer;
pub mod contexts;
pub mod error;
pub mod producer;
pub mod run_state;
