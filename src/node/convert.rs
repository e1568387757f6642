//! Text-based scalar conversions.
//!
//! Every conversion goes through the scalar's text form, so a boolean never
//! reads as a number and a number never reads as a boolean.
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use super::{GenericNode, Scalar, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetType {
    Bool,
    Int,
    Long,
    Decimal,
    Double,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TargetType::Bool => "bool",
            TargetType::Int => "i32",
            TargetType::Long => "i64",
            TargetType::Decimal => "decimal",
            TargetType::Double => "f64",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot convert {} to type {target}", .value.as_deref().unwrap_or("null"))]
pub struct ConversionError {
    pub target: TargetType,
    /// text that failed to parse; `None` when there was no scalar at all
    pub value: Option<String>,
}

impl ConversionError {
    pub fn new(target: TargetType, value: Option<&str>) -> Self {
        Self { target, value: value.map(str::to_string) }
    }
}

// ------------------------------- Parsers ---------------------------------- //

pub fn parse_bool(text: &str) -> Option<bool> {
    let t = text.trim();
    if t.eq_ignore_ascii_case("true") {
        Some(true)
    } else if t.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub fn parse_i32(text: &str) -> Option<i32> { text.trim().parse().ok() }

pub fn parse_i64(text: &str) -> Option<i64> { text.trim().parse().ok() }

pub fn parse_decimal(text: &str) -> Option<Decimal> { Decimal::from_str(text.trim()).ok() }

pub fn parse_f64(text: &str) -> Option<f64> { text.trim().parse().ok() }

// ------------------------------ ScalarText -------------------------------- //

/// Anything that can expose a scalar text and be converted from it.
///
/// `try_as_*` returns `None` on a missing scalar or a failed parse; `as_*`
/// turns the same outcome into a [`ConversionError`].
pub trait ScalarText {
    fn as_text(&self) -> Option<Cow<'_, str>>;

    fn try_as_bool(&self) -> Option<bool> { self.as_text().and_then(|t| parse_bool(&t)) }
    fn try_as_i32(&self) -> Option<i32> { self.as_text().and_then(|t| parse_i32(&t)) }
    fn try_as_i64(&self) -> Option<i64> { self.as_text().and_then(|t| parse_i64(&t)) }
    fn try_as_decimal(&self) -> Option<Decimal> { self.as_text().and_then(|t| parse_decimal(&t)) }
    fn try_as_f64(&self) -> Option<f64> { self.as_text().and_then(|t| parse_f64(&t)) }

    fn as_bool(&self) -> Result<bool, ConversionError> { convert(self, TargetType::Bool, parse_bool) }
    fn as_i32(&self) -> Result<i32, ConversionError> { convert(self, TargetType::Int, parse_i32) }
    fn as_i64(&self) -> Result<i64, ConversionError> { convert(self, TargetType::Long, parse_i64) }
    fn as_decimal(&self) -> Result<Decimal, ConversionError> { convert(self, TargetType::Decimal, parse_decimal) }
    fn as_f64(&self) -> Result<f64, ConversionError> { convert(self, TargetType::Double, parse_f64) }
}

fn convert<S, T>(source: &S, target: TargetType, parse: fn(&str) -> Option<T>) -> Result<T, ConversionError>
where
    S: ScalarText + ?Sized,
{
    let text = source.as_text();
    text.as_deref()
        .and_then(parse)
        .ok_or_else(|| ConversionError::new(target, text.as_deref()))
}

impl ScalarText for Scalar {
    fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Scalar::Text(s) => Some(Cow::Borrowed(s.as_str())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }
}

impl ScalarText for GenericNode {
    fn as_text(&self) -> Option<Cow<'_, str>> { self.as_str().map(Cow::Borrowed) }
}

impl ScalarText for Value {
    fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null | Value::List(_) => None,
            Value::Scalar(s) => s.as_text(),
            Value::Node(node) => node.as_text(),
        }
    }
}

impl<T: ScalarText + ?Sized> ScalarText for &T {
    fn as_text(&self) -> Option<Cow<'_, str>> { (**self).as_text() }
}
