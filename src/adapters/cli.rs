// src/adapters/cli.rs
pub mod clap_adapter;
