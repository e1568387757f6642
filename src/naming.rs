//! Source names → safe member names.
//!
//! Everything outside `[0-9a-zA-Z]` is dropped. The XML walker only ever
//! passes local names, so `dc:id` and `id` collapse onto the same member.
use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SlurperError};

/// Prepended when a sanitized name is empty or starts with a digit.
pub const NAME_PREFIX: &str = "prop";

static INVALID_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new("[^0-9a-zA-Z]+").unwrap());

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NamingPolicy {
    /// Fix names silently.
    #[default]
    Lenient,
    /// Reject any name that would need fixing.
    Strict,
}

impl NamingPolicy {
    pub fn from_sanitize_flag(sanitize_property_names: bool) -> Self {
        if sanitize_property_names { Self::Lenient } else { Self::Strict }
    }
}

/// Sanitize `raw` under `policy`.
///
/// The empty name stays empty; it marks anonymous array elements.
pub fn sanitize(raw: &str, policy: NamingPolicy) -> Result<Cow<'_, str>> {
    if raw.is_empty() {
        return Ok(Cow::Borrowed(raw));
    }
    let stripped = INVALID_CHARS.replace_all(raw, "");
    let needs_prefix = stripped.is_empty() || stripped.starts_with(|c: char| c.is_ascii_digit());
    let safe: Cow<'_, str> = if needs_prefix {
        Cow::Owned(format!("{NAME_PREFIX}{stripped}"))
    } else {
        stripped
    };
    if safe.as_ref() == raw {
        return Ok(safe);
    }
    match policy {
        NamingPolicy::Lenient => {
            tracing::debug!(raw, safe = safe.as_ref(), "sanitized member name");
            Ok(safe)
        }
        NamingPolicy::Strict => Err(SlurperError::NamingPolicy { raw_name: raw.to_string() }),
    }
}

/// Member name holding a group of same-named siblings.
pub fn list_name(base: &str, suffix: &str) -> String {
    format!("{base}{suffix}")
}
