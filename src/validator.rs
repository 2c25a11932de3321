// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Contact form submission validator.
//!
//! Checks run in a fixed order and stop at the first failure:
//! - All fields present and non-empty
//! - Email address shape
//! - Field lengths

use crate::config::ValidationConfig;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

/// Loose address shape: something, `@`, something, `.`, something.
/// Not RFC 5322; it only rules out obvious typos.
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// A contact form submission as posted by the site.
///
/// Missing keys and `null` values deserialize to empty strings so they fail
/// the presence check instead of the JSON parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submission {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Submission field, for length errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Message,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Email => write!(f, "email"),
            Self::Message => write!(f, "message"),
        }
    }
}

/// Validation error types. The display text is what the caller sees.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required.")]
    MissingFields,

    #[error("Invalid email address.")]
    InvalidEmail,

    #[error("Field length exceeded.")]
    FieldTooLong { field: Field },
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Submission is valid
    Valid,
    /// Submission is invalid
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }
}

/// Contact submission validator.
pub struct ContactValidator {
    config: ValidationConfig,
    email_pattern: Regex,
}

impl ContactValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            config,
            email_pattern: Regex::new(EMAIL_PATTERN)?,
        })
    }

    /// Check that every field carries a value.
    pub fn validate_presence(&self, submission: &Submission) -> ValidationResult {
        if submission.name.is_empty() || submission.email.is_empty() || submission.message.is_empty()
        {
            debug!("Submission has empty fields");
            return ValidationResult::Invalid(ValidationError::MissingFields);
        }
        ValidationResult::Valid
    }

    /// Check the email address shape.
    pub fn validate_email(&self, email: &str) -> ValidationResult {
        if self.email_pattern.is_match(email) {
            ValidationResult::Valid
        } else {
            debug!(email = %email, "Email address rejected");
            ValidationResult::Invalid(ValidationError::InvalidEmail)
        }
    }

    /// Check field lengths, counted in characters.
    pub fn validate_lengths(&self, submission: &Submission) -> ValidationResult {
        let limits = [
            (Field::Name, &submission.name, self.config.max_name_len),
            (Field::Email, &submission.email, self.config.max_email_len),
            (Field::Message, &submission.message, self.config.max_message_len),
        ];

        for (field, value, max) in limits {
            let len = value.chars().count();
            if len > max {
                debug!(%field, len, max, "Field too long");
                return ValidationResult::Invalid(ValidationError::FieldTooLong { field });
            }
        }
        ValidationResult::Valid
    }

    /// Validate a complete submission.
    pub fn validate(&self, submission: &Submission) -> ValidationResult {
        let presence = self.validate_presence(submission);
        if !presence.is_valid() {
            return presence;
        }

        let email = self.validate_email(&submission.email);
        if !email.is_valid() {
            return email;
        }

        self.validate_lengths(submission)
    }
}
