//! Utility functions for common operations.
//!
//! - **URL validation**: API base checks and locator validation to prevent SSRF
//! - **Text processing**: Unicode-aware width handling, sanitising remote text,
//!   and catalog display helpers (`#0025`, capitalisation)

mod text;
mod url_validator;

pub use text::{capitalize, display_width, format_id, humanize, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_api_base, validate_url, UrlValidationError};

/// Maximum allowed search term length, enforced by the search input.
pub const MAX_SEARCH_TERM_LENGTH: usize = 64;
