pub mod application;
pub mod command;
pub mod config_loader;
pub mod filesystem;
pub mod object_store;
pub mod progress;
