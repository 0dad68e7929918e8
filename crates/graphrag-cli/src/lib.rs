//! `grag` command-line interface over the GraphRAG engine

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod factories;
pub mod output;
