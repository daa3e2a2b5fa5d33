//! Process-wide run identifier.
//!
//! Evaluation reports and server startup logs carry the same ULID so that
//! output files can be tied back to the process that produced them.

use once_cell::sync::Lazy;
use ulid::Ulid;

static RUN_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// Same value for the lifetime of the process.
#[inline]
pub fn get() -> &'static str {
    &RUN_ID
}
