//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the pool:
//! - Math types and instance placement
//! - Logging utilities

pub mod math;
pub mod logging;
