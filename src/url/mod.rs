//! URL handling module for Url-Insight
//!
//! This module provides address validation, host extraction and
//! internal/external link classification.

mod domain;
mod validate;

// Re-export main functions
pub use domain::{extract_host, is_external};
pub use validate::validate_address;
