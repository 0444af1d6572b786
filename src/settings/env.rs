// src/settings/env.rs

use std::fmt::Display;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::sheets::error::{SheetError, SheetResult};

/// Trimmed value of `key`; blank counts as unset.
pub fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> SheetResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match optional(lookup, key) {
        Some(raw) => raw.parse().map_err(|e| {
            warn!("Invalid {key} value: {e}");
            SheetError::Config(format!("invalid {key} value {raw:?}: {e}"))
        }),
        None => {
            debug!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
