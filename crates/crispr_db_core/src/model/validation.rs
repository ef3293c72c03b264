//! Field-level validation shared by record types.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static DNA_SEQUENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ACGTN]+$").expect("static DNA pattern must compile"));
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static date pattern must compile"));

/// Input rejected before any database work.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },
    InvalidSequence {
        entity: &'static str,
        value: String,
    },
    InvalidRange {
        entity: &'static str,
        start: i64,
        end: i64,
    },
    NonPositive {
        entity: &'static str,
        field: &'static str,
        value: f64,
    },
    InvalidDate(String),
    /// Primer sequence does not begin with its declared tail.
    TailMismatch {
        sequence: String,
        tail: String,
    },
    MissingAssociation {
        entity: &'static str,
        association: &'static str,
    },
    DuplicateAssociation {
        entity: &'static str,
        association: &'static str,
        key: String,
    },
    AlreadyStored {
        entity: &'static str,
        id: i64,
    },
    NotStored(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { entity, field } => write!(f, "{entity}.{field} must not be empty"),
            Self::InvalidSequence { entity, value } => {
                write!(f, "{entity} sequence is not DNA: {value}")
            }
            Self::InvalidRange { entity, start, end } => {
                write!(f, "{entity} start {start} is after end {end}")
            }
            Self::NonPositive {
                entity,
                field,
                value,
            } => write!(f, "{entity}.{field} must be positive, got {value}"),
            Self::InvalidDate(value) => write!(f, "date must be YYYY-MM-DD, got `{value}`"),
            Self::TailMismatch { sequence, tail } => {
                write!(f, "primer sequence {sequence} does not start with tail {tail}")
            }
            Self::MissingAssociation {
                entity,
                association,
            } => write!(f, "{entity} requires at least one {association}"),
            Self::DuplicateAssociation {
                entity,
                association,
                key,
            } => write!(f, "{entity} lists {association} `{key}` more than once"),
            Self::AlreadyStored { entity, id } => {
                write!(f, "{entity} is already stored with id {id}")
            }
            Self::NotStored(entity) => write!(f, "{entity} must be stored first"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_non_empty(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { entity, field });
    }
    Ok(())
}

pub(crate) fn require_dna(entity: &'static str, value: &str) -> Result<(), ValidationError> {
    if !DNA_SEQUENCE.is_match(value) {
        return Err(ValidationError::InvalidSequence {
            entity,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn require_range(
    entity: &'static str,
    start: i64,
    end: i64,
) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::InvalidRange { entity, start, end });
    }
    Ok(())
}

pub(crate) fn require_positive(
    entity: &'static str,
    field: &'static str,
    value: f64,
) -> Result<(), ValidationError> {
    if value.is_nan() || value <= 0.0 {
        return Err(ValidationError::NonPositive {
            entity,
            field,
            value,
        });
    }
    Ok(())
}

pub(crate) fn require_date(value: &str) -> Result<(), ValidationError> {
    if !ISO_DATE.is_match(value) {
        return Err(ValidationError::InvalidDate(value.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{require_date, require_dna, require_positive, require_range, ValidationError};

    #[test]
    fn dna_accepts_uppercase_bases_only() {
        assert!(require_dna("primer", "ACGTNACGT").is_ok());
        assert_eq!(
            require_dna("primer", "acgt"),
            Err(ValidationError::InvalidSequence {
                entity: "primer",
                value: "acgt".to_string(),
            })
        );
        assert!(require_dna("primer", "").is_err());
    }

    #[test]
    fn range_allows_single_base() {
        assert!(require_range("target", 10, 10).is_ok());
        assert!(require_range("target", 11, 10).is_err());
    }

    #[test]
    fn positive_rejects_zero_and_nan() {
        assert!(require_positive("sample", "concentration", 0.0).is_err());
        assert!(require_positive("sample", "concentration", f64::NAN).is_err());
        assert!(require_positive("sample", "concentration", 12.5).is_ok());
    }

    #[test]
    fn date_must_be_iso_day() {
        assert!(require_date("2016-03-14").is_ok());
        assert!(require_date("14/03/2016").is_err());
    }
}
