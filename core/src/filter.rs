//! Visitor search, status filtering and summary counts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::types::Visitor;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    SignedOut,
}

impl StatusFilter {
    pub fn matches(&self, visitor: &Visitor) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => visitor.is_active(),
            StatusFilter::SignedOut => !visitor.is_active(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusFilter::All => "all",
            StatusFilter::Active => "active",
            StatusFilter::SignedOut => "signed-out",
        })
    }
}

impl FromStr for StatusFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "signed-out" | "signed_out" | "signedout" => Ok(StatusFilter::SignedOut),
            _ => Err(FilterError(s.to_string())),
        }
    }
}

/// Search term plus status filter; a visitor must satisfy both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitorFilter {
    search: String,
    status: StatusFilter,
}

impl VisitorFilter {
    pub fn new(search: impl Into<String>, status: StatusFilter) -> Self {
        Self {
            search: search.into().to_lowercase(),
            status,
        }
    }

    /// True when neither a search term nor a status restriction is set.
    pub fn is_unrestricted(&self) -> bool {
        self.search.is_empty() && self.status == StatusFilter::All
    }

    /// Case-insensitive substring match on first name, last name or purpose.
    pub fn matches_search(&self, visitor: &Visitor) -> bool {
        if self.search.is_empty() {
            return true;
        }
        [&visitor.firstname, &visitor.lastname, &visitor.purpose_of_visit]
            .iter()
            .any(|field| field.to_lowercase().contains(&self.search))
    }

    pub fn matches(&self, visitor: &Visitor) -> bool {
        self.matches_search(visitor) && self.status.matches(visitor)
    }

    pub fn apply<'a>(&self, visitors: &'a [Visitor]) -> Vec<&'a Visitor> {
        visitors.iter().filter(|v| self.matches(v)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisitorStats {
    pub total: usize,
    pub active: usize,
    pub signed_out: usize,
}

impl VisitorStats {
    pub fn collect<'a>(visitors: impl IntoIterator<Item = &'a Visitor>) -> Self {
        visitors.into_iter().fold(Self::default(), |mut stats, v| {
            stats.total += 1;
            if v.is_active() {
                stats.active += 1;
            } else {
                stats.signed_out += 1;
            }
            stats
        })
    }
}
