//! Validation for database, schema and collection names that end up
//! spliced into query text.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{StatsError, StatsResult};

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]{0,127}$").expect("identifier regex is valid")
});

/// Accept a plain identifier, rejecting anything that could break out of a
/// quoted name (brackets, quotes, whitespace, semicolons).
pub fn validate_identifier(name: &str) -> StatsResult<&str> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(StatsError::InvalidIdentifier(name.to_string()))
    }
}
