//! Repositories whose contributor stats were still being computed (202).

use crate::record::RepoRef;

/// Retry queue. Each entry keeps the collection it came from, so a retried
/// result is written back to the same place.
#[derive(Debug, Default)]
pub(crate) struct DeferredContributors {
    entries: Vec<RepoRef>,
}

impl DeferredContributors {
    pub(crate) fn push(&mut self, repo: RepoRef) {
        if !self.entries.contains(&repo) {
            self.entries.push(repo);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl IntoIterator for DeferredContributors {
    type Item = RepoRef;
    type IntoIter = std::vec::IntoIter<RepoRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
