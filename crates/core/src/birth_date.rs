//! Birth date normalisation.
//!
//! Callers may supply a birth date as a date-time value, as milliseconds since the Unix epoch
//! or as a date-like string. All forms are stored as the same ISO-8601 UTC string with millisecond precision, for example
//! `1990-05-01T00:00:00.000Z`.

use crate::{RegistryError, RegistryResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// A birth date as received from the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BirthDateInput {
    Instant(DateTime<Utc>),
    EpochMillis(i64),
    Text(String),
}

impl BirthDateInput {
    /// Short label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            BirthDateInput::Instant(_) => "instant",
            BirthDateInput::EpochMillis(_) => "epoch_millis",
            BirthDateInput::Text(_) => "text",
        }
    }

    /// Resolve the input to a UTC instant.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidBirthDate`] if the text is not a recognised date form.
    pub fn to_instant(&self) -> RegistryResult<DateTime<Utc>> {
        match self {
            BirthDateInput::Instant(dt) => Ok(*dt),
            BirthDateInput::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms)
                .ok_or_else(|| RegistryError::InvalidBirthDate(ms.to_string())),
            BirthDateInput::Text(text) => parse_date_like(text)
                .ok_or_else(|| RegistryError::InvalidBirthDate(text.clone())),
        }
    }

    /// ISO-8601 form stored in the patient record.
    pub fn to_iso_string(&self) -> RegistryResult<String> {
        Ok(self
            .to_instant()?
            .to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl From<DateTime<Utc>> for BirthDateInput {
    fn from(value: DateTime<Utc>) -> Self {
        BirthDateInput::Instant(value)
    }
}

impl From<i64> for BirthDateInput {
    fn from(value: i64) -> Self {
        BirthDateInput::EpochMillis(value)
    }
}

impl From<String> for BirthDateInput {
    fn from(value: String) -> Self {
        BirthDateInput::Text(value)
    }
}

impl From<&str> for BirthDateInput {
    fn from(value: &str) -> Self {
        BirthDateInput::Text(value.to_string())
    }
}

/// Normalise an optional birth date.
///
/// Blank text counts as not supplied and yields `Ok(None)`.
pub fn normalise_birth_date(input: Option<&BirthDateInput>) -> RegistryResult<Option<String>> {
    match input {
        None => Ok(None),
        Some(BirthDateInput::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(value) => value.to_iso_string().map(Some),
    }
}

// Strings without an offset are read as UTC.
fn parse_date_like(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
