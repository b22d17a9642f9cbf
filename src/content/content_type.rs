//! Content Types
//!
//! Categories of onboarding content and how long each stays fresh.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const MINUTE: Duration = Duration::from_secs(60);

// == Content Type ==
/// Category of cached content. Its tag is the first segment of every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Published training phase info
    Phase,
    /// Published training items
    Training,
    /// Draft content still being edited
    Draft,
    /// Per-session training items
    Session,
    /// Quiz questions and answers
    Quiz,
}

impl ContentType {
    pub const ALL: [ContentType; 5] = [
        ContentType::Phase,
        ContentType::Training,
        ContentType::Draft,
        ContentType::Session,
        ContentType::Quiz,
    ];

    /// Key prefix for this content type.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Phase => "phase",
            ContentType::Training => "training",
            ContentType::Draft => "draft",
            ContentType::Session => "session",
            ContentType::Quiz => "quiz",
        }
    }

    /// TTL used when the caller does not override it.
    ///
    /// Published content lives 10 minutes, drafts 2, session items 1, and
    /// quizzes, which rarely change, 30.
    pub fn default_ttl(self) -> Duration {
        match self {
            ContentType::Phase | ContentType::Training => 10 * MINUTE,
            ContentType::Draft => 2 * MINUTE,
            ContentType::Session => MINUTE,
            ContentType::Quiz => 30 * MINUTE,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
