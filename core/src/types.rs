//! Domain DTOs for the visitor logbook API.
//!
//! # Design
//! These types mirror the backend's JSON schema but are defined
//! independently from the mock-server crate; integration tests catch drift.
//! The edit endpoint is consumed as a bare visitor object.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SexError;

pub type VisitorId = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Sex {
    Male,
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => f.write_str("Male"),
            Sex::Female => f.write_str("Female"),
        }
    }
}

impl FromStr for Sex {
    type Err = SexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            _ => Err(SexError(s.to_string())),
        }
    }
}

/// Row of the backend's `sexes` relationship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SexRecord {
    pub id: u64,
    pub sex: Sex,
}

/// A visitor record as returned by the API.
///
/// The backend reports the sex either as a flat `sex` field or through the
/// `sexes` relationship (with `sex_id` as the foreign key); use
/// [`Visitor::sex`] rather than the raw fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Visitor {
    pub id: VisitorId,
    pub firstname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middlename: Option<String>,
    pub lastname: String,
    pub age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sexes: Vec<SexRecord>,
    pub contact_number: String,
    pub purpose_of_visit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Sign-out time. `None` while the visitor is still on the premises.
    #[serde(default)]
    pub time_out: Option<DateTime<Utc>>,
}

impl Visitor {
    pub fn is_active(&self) -> bool {
        self.time_out.is_none()
    }

    /// The related sex record when loaded, otherwise the flat field.
    pub fn sex(&self) -> Option<Sex> {
        self.sexes.first().map(|record| record.sex).or(self.sex)
    }

    /// First, middle (when present and non-empty) and last name.
    pub fn full_name(&self) -> String {
        match self.middlename.as_deref().filter(|m| !m.is_empty()) {
            Some(middle) => format!("{} {} {}", self.firstname, middle, self.lastname),
            None => format!("{} {}", self.firstname, self.lastname),
        }
    }
}

/// Payload for registering or editing a visitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewVisitor {
    pub firstname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middlename: Option<String>,
    pub lastname: String,
    pub age: u32,
    pub sex: Sex,
    pub contact_number: String,
    pub purpose_of_visit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Admin {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Login payload for `POST /auth/adminLogin`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Dashboard payload returned by `GET /admin`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminPanel {
    #[serde(default)]
    pub admins: Vec<Admin>,
    #[serde(default)]
    pub visitors: Vec<Visitor>,
}
