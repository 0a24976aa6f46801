//! Narrative result type

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fragment returned whenever nothing could be rendered
pub const NO_NARRATIVE: &str = "<div>No narrative available</div>";

/// Whether the narrative carries rendered content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeStatus {
    Generated,
    Empty,
}

impl NarrativeStatus {
    /// FHIR code for the status
    pub fn code(self) -> &'static str {
        match self {
            NarrativeStatus::Generated => "generated",
            NarrativeStatus::Empty => "empty",
        }
    }
}

impl fmt::Display for NarrativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Serialized XHTML fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Xhtml(String);

impl Xhtml {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Xhtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-readable narrative attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub status: NarrativeStatus,
    pub div: Xhtml,
}

impl Narrative {
    /// Rendered narrative
    pub fn generated(markup: impl Into<String>) -> Self {
        Self {
            status: NarrativeStatus::Generated,
            div: Xhtml::new(markup),
        }
    }

    /// The fallback narrative
    pub fn empty() -> Self {
        Self {
            status: NarrativeStatus::Empty,
            div: Xhtml::new(NO_NARRATIVE),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status == NarrativeStatus::Empty
    }

    /// JSON form as stored in a record's `text` element
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status.code(),
            "div": self.div.as_str(),
        })
    }
}
