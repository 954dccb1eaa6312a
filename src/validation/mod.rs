//! Request-shape validation. Runs before any database access and reports all
//! field problems at once as a 400 with per-field messages.

use chrono::{DateTime, NaiveDate, NaiveTime};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::ApiError;

pub const RELATIONSHIPS: &[&str] = &[
    "mom",
    "dad",
    "stepmom",
    "stepdad",
    "grandmother",
    "grandfather",
    "guardian",
    "other",
];

pub const COMMUNICATION_STYLES: &[&str] = &["phone", "text", "email", "video", "in-person"];

pub const NOTE_TYPES: &[&str] = &["appointment", "medication", "symptom", "general"];

pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 150;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Accumulates field -> message errors; at most one message per field, the
/// last check wins.
#[derive(Debug, Default)]
pub struct Validator {
    errors: HashMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.insert(field.to_string(), message.into());
    }

    /// Present and non-empty after trimming
    pub fn require(&mut self, field: &str, value: Option<&str>) {
        match value {
            Some(v) if !v.trim().is_empty() => {}
            _ => self.error(field, "This field is required"),
        }
    }

    /// Supplied values must not be blank (absence is fine)
    pub fn check_not_blank(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if v.trim().is_empty() {
                self.error(field, "Must not be empty");
            }
        }
    }

    pub fn check_date(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if !is_iso_date(v) {
                self.error(field, "Must be an ISO-8601 date (YYYY-MM-DD)");
            }
        }
    }

    pub fn check_time(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if !is_hhmm_time(v) {
                self.error(field, "Must be a 24-hour time (HH:MM)");
            }
        }
    }

    pub fn check_timestamp(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if DateTime::parse_from_rfc3339(v).is_err() {
                self.error(field, "Must be an RFC 3339 timestamp");
            }
        }
    }

    pub fn check_enum(&mut self, field: &str, value: Option<&str>, allowed: &[&str]) {
        if let Some(v) = value {
            if !allowed.contains(&v.trim()) {
                self.error(field, format!("Must be one of: {}", allowed.join(", ")));
            }
        }
    }

    pub fn check_range(&mut self, field: &str, value: Option<i64>, min: i64, max: i64) {
        if let Some(v) = value {
            if v < min || v > max {
                self.error(field, format!("Must be between {} and {}", min, max));
            }
        }
    }

    pub fn check_uuid(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if Uuid::parse_str(v.trim()).is_err() {
                self.error(field, "Must be a valid id");
            }
        }
    }

    pub fn check_email(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            let v = v.trim();
            let valid = match v.split_once('@') {
                Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
                None => false,
            };
            if !v.is_empty() && !valid {
                self.error(field, "Must be a valid email address");
            }
        }
    }

    pub fn check_min_len(&mut self, field: &str, value: Option<&str>, min: usize) {
        if let Some(v) = value {
            if !v.is_empty() && v.chars().count() < min {
                self.error(field, format!("Must be at least {} characters", min));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Validation failed", self.errors))
        }
    }
}

pub fn is_iso_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

pub fn is_hhmm_time(value: &str) -> bool {
    NaiveTime::parse_from_str(value, "%H:%M").is_ok()
}
