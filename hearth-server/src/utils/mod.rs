//! Utility modules
//!
//! - [`logger`] - tracing setup with optional file output
//! - [`time`] - business timezone date conversions
//! - [`validation`] - text length checks shared by handlers

pub mod logger;
pub mod time;
pub mod validation;
