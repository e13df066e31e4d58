//! Conversation classification reported by the `start` record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of dialogue the server detected in the input transcript.
///
/// Unknown values are preserved verbatim in [`ConversationType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConversationType {
    General,
    Interview,
    Meeting,
    Consultation,
    Casual,
    Emotional,
    Other(String),
}

impl ConversationType {
    /// Wire identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::General => "general",
            Self::Interview => "interview",
            Self::Meeting => "meeting",
            Self::Consultation => "consultation",
            Self::Casual => "casual",
            Self::Emotional => "emotional",
            Self::Other(raw) => raw,
        }
    }

    /// Human-readable label for status displays.
    pub fn display_name(&self) -> &str {
        match self {
            Self::General => "General",
            Self::Interview => "Interview",
            Self::Meeting => "Meeting notes",
            Self::Consultation => "Consultation",
            Self::Casual => "Casual",
            Self::Emotional => "Emotional",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for ConversationType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "general" => Self::General,
            "interview" => Self::Interview,
            "meeting" => Self::Meeting,
            "consultation" => Self::Consultation,
            "casual" => Self::Casual,
            "emotional" => Self::Emotional,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ConversationType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ConversationType> for String {
    fn from(value: ConversationType) -> Self {
        match value {
            ConversationType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ConversationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
