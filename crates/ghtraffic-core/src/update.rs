//! One complete update run: load, discover, refresh, persist.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::aggregator::{Aggregator, RefreshSummary};
use crate::api::StatsApi;
use crate::config::GhTrafficConfig;
use crate::error::StatsError;
use crate::record::{Collection, CumulativeRecord};
use crate::sources::{self, RegistryLocation};

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub finished_at: DateTime<Utc>,
    pub stats_file: PathBuf,
    /// Names seen for the first time this run, per collection.
    pub discovered: Vec<(Collection, String)>,
    pub refresh: RefreshSummary,
}

/// Run a full update against `api` using the locations in `cfg`.
///
/// The stats file is only written when every fetch succeeded; on error the
/// previous file is left as it was.
pub fn run_update<A: StatsApi>(cfg: &GhTrafficConfig, api: A) -> Result<UpdateReport, StatsError> {
    let started = Utc::now();
    let mut record = CumulativeRecord::load_or_init(&cfg.stats_file, started.timestamp())?;

    let registry = RegistryLocation::parse(&cfg.sources.pipelines_registry);
    let pipelines = sources::read_pipeline_names(&registry, &cfg.user_agent())?;
    let core_repos = sources::read_repo_list(&cfg.sources.ignored_repos)?;

    let mut discovered = Vec::new();
    for (collection, names) in [
        (Collection::Pipelines, pipelines.as_slice()),
        (Collection::CoreRepos, core_repos.as_slice()),
    ] {
        for name in record.register(collection, names) {
            tracing::info!(%collection, name = %name, "tracking new repository");
            discovered.push((collection, name));
        }
    }
    tracing::info!(
        repositories = record.repo_count(),
        "fetching stats for {} pipelines and {} core repos",
        record.pipelines.len(),
        record.core_repos.len()
    );

    let refresh = Aggregator::new(api, cfg.contributors_retry_delay()).refresh(&mut record)?;

    let finished_at = Utc::now();
    record.updated = finished_at.timestamp();
    record.save(&cfg.stats_file)?;
    tracing::info!(path = %cfg.stats_file.display(), "stats file written");

    Ok(UpdateReport {
        finished_at,
        stats_file: cfg.stats_file.clone(),
        discovered,
        refresh,
    })
}
