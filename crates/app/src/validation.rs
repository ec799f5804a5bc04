//! Input validation.
//!
//! Raw operation inputs are converted into validated values, collecting every
//! failing field into [`ValidationErrors`] instead of stopping at the first.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use rust_decimal::Decimal;
use smallvec::SmallVec;
use thiserror::Error;

/// Default upper bound for free-text fields.
pub const MAX_TEXT_CHARS: usize = 255;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field error found while validating one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("validation failed: {}", summary(.0))]
pub struct ValidationErrors(SmallVec<[FieldError; 4]>);

fn summary(errors: &SmallVec<[FieldError; 4]>) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortcut for an error list with a single entry.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(FieldError::new(field, message));
        errors
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Record the error (if any) and hand back the value or its default.
    pub fn check<T: Default>(&mut self, result: Result<T, FieldError>) -> T {
        result.unwrap_or_else(|error| {
            self.push(error);
            T::default()
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Fold in a nested result, keeping its errors next to ours.
    pub fn absorb<T: Default>(&mut self, result: Result<T, ValidationErrors>) -> T {
        result.unwrap_or_else(|errors| {
            self.0.extend(errors.0);
            T::default()
        })
    }

    /// `Ok` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        let mut errors = Self::new();
        errors.push(error);
        errors
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A non-blank string of at most `max_chars` characters, trimmed.
pub fn required_text(field: &str, value: &str, max_chars: usize) -> Result<String, FieldError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(FieldError::new(field, "is required"));
    }

    if trimmed.chars().count() > max_chars {
        return Err(FieldError::new(
            field,
            format!("must be at most {max_chars} characters"),
        ));
    }

    Ok(trimmed.to_string())
}

/// Like [`required_text`], but absent or blank values become `None`.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<Option<String>, FieldError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => required_text(field, text, max_chars).map(Some),
    }
}

/// A strictly positive quantity that fits the storage column.
pub fn positive_quantity(field: &str, value: i64) -> Result<i32, FieldError> {
    if value <= 0 {
        return Err(FieldError::new(field, "must be at least 1"));
    }

    i32::try_from(value).map_err(|_overflow| FieldError::new(field, "is too large"))
}

/// A decimal amount given as text, at least `min`, with at most `scale`
/// fractional digits.
pub fn decimal_amount(
    field: &str,
    raw: &str,
    min: Decimal,
    scale: u32,
) -> Result<Decimal, FieldError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(FieldError::new(field, "is required"));
    }

    let amount = Decimal::from_str(trimmed)
        .map_err(|_parse| FieldError::new(field, "must be a decimal number"))?;

    if amount < min {
        return Err(FieldError::new(field, format!("must be at least {min}")));
    }

    if amount.normalize().scale() > scale {
        return Err(FieldError::new(
            field,
            format!("must have at most {scale} decimal places"),
        ));
    }

    Ok(amount.normalize())
}

/// One of a closed set of values parsed through `FromStr`.
pub fn one_of<T: FromStr>(field: &str, raw: &str, allowed: &[&str]) -> Result<T, FieldError> {
    raw.trim().parse::<T>().map_err(|_unknown| {
        FieldError::new(field, format!("must be one of: {}", allowed.join(", ")))
    })
}
