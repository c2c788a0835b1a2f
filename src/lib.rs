//! devlam - Python serverless monorepo workflow tool
//!
//! This crate provides both a library and CLI for devlam, including:
//! - Configuration file parsing and merging
//! - Project analysis (manifest discovery, directory classification)
//! - Explicit Python environment handling (venv lifecycle)
//! - Recursive dependency installation with function/layer bundle staging
//! - Multi-stack deployment

pub mod classify;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod error;
pub mod install;
pub mod pip;
pub mod progress;
pub mod project;
pub mod pyenv;
pub mod runner;

pub use error::{Error, Result};
