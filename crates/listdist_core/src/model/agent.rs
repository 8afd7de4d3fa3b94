//! Agent (list recipient) domain model.
//!
//! # Responsibility
//! - Define the public agent shape returned by the registry.
//! - Define the registration request and its field validation.
//!
//! # Invariants
//! - The credential is write-only: `Agent` has no credential field and
//!   `NewAgent` never prints it.
//! - Emails are compared case-insensitively and stored lower-cased.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a registered agent.
pub type AgentId = Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Registered agent as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Registration request for a new agent.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAgent {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    /// Accepts the legacy `password` key as well.
    #[serde(alias = "password")]
    pub credential: String,
}

impl Debug for NewAgent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAgent")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone_number", &self.phone_number)
            .field("credential", &"<redacted>")
            .finish()
    }
}

/// Field-level registration failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentValidationError {
    BlankField(&'static str),
    InvalidEmail(String),
}

impl Display for AgentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} is required"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
        }
    }
}

impl Error for AgentValidationError {}

impl NewAgent {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone_number: phone_number.into(),
            credential: credential.into(),
        }
    }

    /// Checks required fields and email shape.
    ///
    /// Fields are checked in declaration order; the first failure wins.
    pub fn validate(&self) -> Result<(), AgentValidationError> {
        for (field, value) in [
            ("name", self.name.as_str()),
            ("email", self.email.as_str()),
            ("phoneNumber", self.phone_number.as_str()),
            ("credential", self.credential.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(AgentValidationError::BlankField(field));
            }
        }

        let email = self.email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(AgentValidationError::InvalidEmail(email.to_string()));
        }

        Ok(())
    }

    /// Returns a copy with trimmed text fields and a lower-cased email.
    ///
    /// The credential is kept byte-for-byte.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            phone_number: self.phone_number.trim().to_string(),
            credential: self.credential.clone(),
        }
    }
}

/// Canonical storage form of an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
