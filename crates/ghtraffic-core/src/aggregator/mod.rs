//! Fetch-and-merge pass over every known repository.
//!
//! Per repository: views, clones, contributors, then totals. Contributor stats
//! the API is still computing are retried once after a pause; weekly
//! breakdowns are pruned only once every fetch (retries included) is done.

mod deferred;

use std::thread;
use std::time::Duration;

use crate::api::{ApiResponse, StatsApi};
use crate::error::{Endpoint, FailedResponse, StatsError};
use crate::record::{CumulativeRecord, RepoRef, RepoStats, TrafficKind};

use deferred::DeferredContributors;

/// What happened to contributor stats during a refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Repositories fetched in the main pass.
    pub repositories: usize,
    /// Contributor stats that arrived on the delayed retry.
    pub resolved_on_retry: Vec<RepoRef>,
    /// Contributor stats still not ready after the retry; stored data kept.
    pub still_pending: Vec<RepoRef>,
}

#[derive(Debug)]
pub struct Aggregator<A> {
    api: A,
    retry_delay: Duration,
}

impl<A: StatsApi> Aggregator<A> {
    pub fn new(api: A, retry_delay: Duration) -> Self {
        Self { api, retry_delay }
    }

    /// Fetch and merge stats for every repository in `record`.
    ///
    /// Any fatal fetch aborts with the record partially updated in memory;
    /// the caller must not persist it.
    pub fn refresh(&self, record: &mut CumulativeRecord) -> Result<RefreshSummary, StatsError> {
        let repos = record.repo_refs();
        let mut deferred = DeferredContributors::default();
        for repo in &repos {
            self.refresh_repo(repo, record.repo_mut(repo), &mut deferred)?;
        }

        let mut summary = RefreshSummary {
            repositories: repos.len(),
            ..RefreshSummary::default()
        };
        self.retry_contributors(record, deferred, &mut summary)?;
        record.prune_weekly_breakdown();
        Ok(summary)
    }

    /// Views, clones, then contributors for one repository.
    ///
    /// A 202 from a traffic endpoint is not fatal: nothing is merged for that
    /// kind and the stored history stays. Any non-2xx status aborts.
    fn refresh_repo(
        &self,
        repo: &RepoRef,
        stats: &mut RepoStats,
        deferred: &mut DeferredContributors,
    ) -> Result<(), StatsError> {
        tracing::debug!(%repo, "fetching stats");

        for kind in [TrafficKind::Views, TrafficKind::Clones] {
            let (endpoint, response) = match kind {
                TrafficKind::Views => (Endpoint::Views, self.api.views(&repo.name)?),
                TrafficKind::Clones => (Endpoint::Clones, self.api.clones(&repo.name)?),
            };
            match response {
                ApiResponse::Ready(points) => stats.merge_traffic(kind, &points),
                ApiResponse::Pending => {
                    tracing::warn!(%repo, "{} not ready yet, keeping stored history", endpoint);
                }
                ApiResponse::Failed(response) => {
                    return Err(fetch_failed(endpoint, repo, response));
                }
            }
        }

        match self.api.contributors(&repo.name)? {
            ApiResponse::Ready(contributors) => stats.set_contributors(contributors),
            ApiResponse::Pending => {
                tracing::debug!(%repo, "contributor stats are being computed, will retry");
                deferred.push(repo.clone());
            }
            ApiResponse::Failed(response) => {
                return Err(fetch_failed(Endpoint::Contributors, repo, response));
            }
        }

        stats.recompute_totals();
        Ok(())
    }

    fn retry_contributors(
        &self,
        record: &mut CumulativeRecord,
        deferred: DeferredContributors,
        summary: &mut RefreshSummary,
    ) -> Result<(), StatsError> {
        if deferred.is_empty() {
            return Ok(());
        }
        tracing::info!(
            "waiting {:?} for contributor stats of {} repositories",
            self.retry_delay,
            deferred.len()
        );
        if !self.retry_delay.is_zero() {
            thread::sleep(self.retry_delay);
        }

        for repo in deferred {
            match self.api.contributors(&repo.name)? {
                ApiResponse::Ready(contributors) => {
                    record.repo_mut(&repo).set_contributors(contributors);
                    summary.resolved_on_retry.push(repo);
                }
                ApiResponse::Pending => {
                    tracing::info!(
                        %repo,
                        "tried getting contributors after delay, but they took too long"
                    );
                    summary.still_pending.push(repo);
                }
                ApiResponse::Failed(response) => {
                    return Err(fetch_failed(Endpoint::Contributors, &repo, response));
                }
            }
        }
        Ok(())
    }
}

fn fetch_failed(endpoint: Endpoint, repo: &RepoRef, response: FailedResponse) -> StatsError {
    StatsError::Fetch {
        endpoint,
        repo: repo.name.clone(),
        response,
    }
}
