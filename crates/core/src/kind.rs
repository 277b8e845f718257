//! Value-kind classification with canonical parse/format behavior.
//!
//! Raw input events arrive as text; the cell's value type decides how that
//! text becomes a typed draft. Each value type implements [`Classify`] to
//! supply a [`KindProfile`]: a small kind tag plus parse/format function
//! pointers. Profiles are memoized in a global dispatch table indexed by
//! `TypeId` on first use, so hot input paths never do runtime type
//! inspection.
//!
//! Display/locale formatting is a host concern; the formats here are the
//! canonical interchange forms only (`true`/`false`, decimal digits, ISO
//! 8601 dates, RFC 3339 timestamps).

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};

/// Category of a cell value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// True/false cells.
    Boolean,
    /// Calendar date without a time of day.
    Date,
    /// Time of day without a date.
    Time,
    /// Date and time with timezone.
    DateTime,
    /// Whole-number cells.
    Integral,
    /// Floating-point cells.
    Real,
    /// One token out of a closed set.
    Choice,
    /// Free-form text.
    Text,
    /// No canonical textual form; raw input cannot target this cell.
    Opaque,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Kind tag plus canonical parse/format behavior for a value type.
///
/// Function pointers, not closures: a profile is plain data, `Copy`, and
/// free to cache.
pub struct KindProfile<V> {
    /// The kind tag.
    pub kind: ValueKind,
    /// Parse canonical text into a value.
    pub parse: fn(&str) -> Result<V>,
    /// Render a value in its canonical text form.
    pub format: fn(&V) -> String,
}

impl<V> Clone for KindProfile<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for KindProfile<V> {}

impl<V> std::fmt::Debug for KindProfile<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindProfile").field("kind", &self.kind).finish()
    }
}

/// A value type that knows its kind and canonical text behavior.
///
/// Hosts implement this for their own cell value types; the engine provides
/// implementations for the common primitive kinds.
pub trait Classify: Sized + 'static {
    /// Build this type's profile. Called at most once per type; use
    /// [`profile_of`] for the memoized lookup.
    fn profile() -> KindProfile<Self>;
}

static PROFILES: Lazy<DashMap<TypeId, &'static (dyn Any + Send + Sync)>> =
    Lazy::new(DashMap::new);

/// Memoized profile lookup for `V`.
///
/// First use per type builds the profile and parks it in a global `TypeId`
/// dispatch table; every later call is a lock-free-read map hit plus a copy
/// of three words.
pub fn profile_of<V: Classify>() -> KindProfile<V> {
    let entry = PROFILES
        .entry(TypeId::of::<V>())
        .or_insert_with(|| Box::leak(Box::new(V::profile())));
    *entry
        .downcast_ref::<KindProfile<V>>()
        .expect("profile table entry registered under its own TypeId")
}

/// Parse canonical text as `V` via its memoized profile.
pub fn parse_as<V: Classify>(raw: &str) -> Result<V> {
    (profile_of::<V>().parse)(raw)
}

/// Format a value in its canonical text form via its memoized profile.
pub fn format_value<V: Classify>(value: &V) -> String {
    (profile_of::<V>().format)(value)
}

fn parse_error(kind: ValueKind, input: &str, reason: impl Into<String>) -> Error {
    Error::Parse {
        kind,
        input: input.to_string(),
        reason: reason.into(),
    }
}

impl Classify for bool {
    fn profile() -> KindProfile<Self> {
        KindProfile {
            kind: ValueKind::Boolean,
            parse: |raw| match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(parse_error(ValueKind::Boolean, raw, "expected true/false")),
            },
            format: |v| v.to_string(),
        }
    }
}

impl Classify for i32 {
    fn profile() -> KindProfile<Self> {
        KindProfile {
            kind: ValueKind::Integral,
            parse: |raw| {
                raw.trim()
                    .parse::<i32>()
                    .map_err(|e| parse_error(ValueKind::Integral, raw, e.to_string()))
            },
            format: |v| v.to_string(),
        }
    }
}

impl Classify for i64 {
    fn profile() -> KindProfile<Self> {
        KindProfile {
            kind: ValueKind::Integral,
            parse: |raw| {
                raw.trim()
                    .parse::<i64>()
                    .map_err(|e| parse_error(ValueKind::Integral, raw, e.to_string()))
            },
            format: |v| v.to_string(),
        }
    }
}

impl Classify for f64 {
    fn profile() -> KindProfile<Self> {
        KindProfile {
            kind: ValueKind::Real,
            parse: |raw| {
                raw.trim()
                    .parse::<f64>()
                    .map_err(|e| parse_error(ValueKind::Real, raw, e.to_string()))
            },
            format: |v| v.to_string(),
        }
    }
}

impl Classify for String {
    fn profile() -> KindProfile<Self> {
        KindProfile {
            kind: ValueKind::Text,
            parse: |raw| Ok(raw.to_string()),
            format: |v| v.clone(),
        }
    }
}

impl Classify for NaiveDate {
    fn profile() -> KindProfile<Self> {
        KindProfile {
            kind: ValueKind::Date,
            parse: |raw| {
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|e| parse_error(ValueKind::Date, raw, e.to_string()))
            },
            format: |v| v.format("%Y-%m-%d").to_string(),
        }
    }
}

impl Classify for NaiveTime {
    fn profile() -> KindProfile<Self> {
        KindProfile {
            kind: ValueKind::Time,
            parse: |raw| {
                let trimmed = raw.trim();
                NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
                    .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
                    .map_err(|e| parse_error(ValueKind::Time, raw, e.to_string()))
            },
            format: |v| v.format("%H:%M:%S").to_string(),
        }
    }
}

impl Classify for DateTime<Utc> {
    fn profile() -> KindProfile<Self> {
        KindProfile {
            kind: ValueKind::DateTime,
            parse: |raw| {
                DateTime::parse_from_rfc3339(raw.trim())
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| parse_error(ValueKind::DateTime, raw, e.to_string()))
            },
            format: |v| v.to_rfc3339(),
        }
    }
}

/// One token out of a closed set, for enum-like columns.
///
/// The engine does not know the legal set; pair this with a membership
/// validator in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Choice(pub String);

impl Choice {
    /// The selected token.
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl Classify for Choice {
    fn profile() -> KindProfile<Self> {
        KindProfile {
            kind: ValueKind::Choice,
            parse: |raw| {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    Err(parse_error(ValueKind::Choice, raw, "empty token"))
                } else {
                    Ok(Choice(trimmed.to_string()))
                }
            },
            format: |v| v.0.clone(),
        }
    }
}
