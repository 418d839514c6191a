//! Core engine for shipwright operations
//!
//! This module contains the fundamental building blocks for all shipwright
//! functionality:
//!
//! - **config**: Shipwright configuration (shipwright.toml) parsing and validation
//! - **context**: Unified orchestration context and cancellation token
//! - **error**: Comprehensive error types per failing concern
//! - **vcs**: Git metadata reads (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
