use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant selecting which content collection a reaction points at.
/// One toggle implementation is parameterized by this; there are no
/// per-variant code paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Video,
    Comment,
    Post,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Video => "video",
            TargetKind::Comment => "comment",
            TargetKind::Post => "post",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public profile fields attached to content summaries. When an owner join
/// misses (dangling reference), the fields stay empty rather than the row
/// being dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnerProfile {
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
}
