// src/adapters.rs
pub mod cli;
pub mod command;
pub mod config_loader;
pub mod filesystem;
pub mod logging;
pub mod progress;
pub mod s3;
