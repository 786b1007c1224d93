//! # cortex
//!
//! Command-line front end for `cortex-core`: argument parsing, the
//! `cortex.toml` configuration layer and text/JSON rendering of results.

pub mod cli;
pub mod config;
