//! longcat-studio library crate.
//!
//! A browser front end for the LongCat-Video model hosted on fal.ai. The
//! modules are exposed for the binary and for integration testing.

pub mod cli;
pub mod config;
pub mod fal;
pub mod generation;
pub mod web;
