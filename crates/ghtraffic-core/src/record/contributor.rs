//! Contributor summaries as returned by `stats/contributors`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One contributor of a repository.
///
/// Only the fields we report on are typed; the rest of the author profile is
/// carried through untouched so the stored record mirrors what the API sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    #[serde(default)]
    pub author: Option<ContributorAuthor>,
    /// Total commits by this author.
    #[serde(default)]
    pub total: u64,
    /// Weekly additions/deletions/commits. Large; dropped before persisting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weeks: Option<Vec<WeeklyActivity>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorAuthor {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub id: u64,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

/// One week of activity (`w` = week start as unix seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyActivity {
    #[serde(default)]
    pub w: i64,
    #[serde(default)]
    pub a: u64,
    #[serde(default)]
    pub d: u64,
    #[serde(default)]
    pub c: u64,
}

impl Contributor {
    #[cfg(test)]
    pub(crate) fn login(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.login.as_str())
    }

    pub fn drop_weekly_breakdown(&mut self) {
        self.weeks = None;
    }
}
