//! The skeleton search engine.
//!
//! This module provides:
//! - **errors**: Configuration and per-test error types
//! - **variable**: Named variables and the dense id index
//! - **combinations**: Lexicographic conditioning-set enumeration
//! - **knowledge**: Forbidden/required edges and temporal tiers
//! - **adjacency**: Symmetric "possibly adjacent" state
//! - **sepset**: Write-once separating sets per removed pair
//! - **config**: Depth, pass mode and FDR settings
//! - **fdr**: Benjamini-Hochberg / Benjamini-Yekutieli cutoffs
//! - **observer**: Progress callbacks and recording/tracing observers
//! - **outcome**: Result, counters and the independence fact log
//! - **skeleton**: The depth-iteration controller

pub mod adjacency;
pub mod combinations;
pub mod config;
pub mod errors;
pub mod fdr;
pub mod knowledge;
pub mod observer;
pub mod outcome;
pub(crate) mod pass;
pub mod sepset;
pub mod skeleton;
pub mod variable;
