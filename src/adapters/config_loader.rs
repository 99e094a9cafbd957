// src/adapters/config_loader.rs
pub mod yaml;
