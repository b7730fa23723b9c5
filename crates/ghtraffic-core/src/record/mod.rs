//! The cumulative stats record persisted between runs.
//!
//! Loaded once at start (or created fresh), mutated in place by the aggregator
//! and written back in full at the end. Writes go to a `.part` file that is
//! renamed over the target, so an aborted run never leaves a truncated record.

mod contributor;
mod lenient;
mod repo_stats;

pub use contributor::{Contributor, ContributorAuthor, WeeklyActivity};
pub use repo_stats::{RepoStats, Series, TrafficKind, TrafficPoint};

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// The two repository groups kept in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Pipelines listed in the registry.
    Pipelines,
    /// Auxiliary repositories from the ignore list.
    CoreRepos,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Pipelines, Collection::CoreRepos];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Pipelines => "pipelines",
            Collection::CoreRepos => "core_repos",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repository within a specific collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoRef {
    pub collection: Collection,
    pub name: String,
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CumulativeRecord {
    /// Unix seconds of the last completed run.
    #[serde(default)]
    pub updated: i64,
    #[serde(default, deserialize_with = "lenient::map")]
    pub pipelines: BTreeMap<String, RepoStats>,
    #[serde(default, deserialize_with = "lenient::map")]
    pub core_repos: BTreeMap<String, RepoStats>,
}

impl CumulativeRecord {
    /// Fresh record with no repositories.
    pub fn new(updated: i64) -> Self {
        Self {
            updated,
            ..Self::default()
        }
    }

    /// Load the record at `path`, or start a fresh one stamped `now` if the file does not exist.
    pub fn load_or_init(path: &Path, now: i64) -> Result<Self, StatsError> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("no stats file at {}, starting a new record", path.display());
                return Ok(Self::new(now));
            }
            Err(source) => {
                return Err(StatsError::PersistenceRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes).map_err(|source| StatsError::PersistenceParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overwrite `path` with the pretty-printed record (write `.part`, then rename).
    pub fn save(&self, path: &Path) -> Result<(), StatsError> {
        let write_err = |source: io::Error| StatsError::PersistenceWrite {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| write_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        json.push('\n');

        let temp = temp_path(path);
        fs::write(&temp, json).map_err(write_err)?;
        if let Err(source) = fs::rename(&temp, path) {
            let _ = fs::remove_file(&temp);
            return Err(write_err(source));
        }
        Ok(())
    }

    pub fn collection(&self, collection: Collection) -> &BTreeMap<String, RepoStats> {
        match collection {
            Collection::Pipelines => &self.pipelines,
            Collection::CoreRepos => &self.core_repos,
        }
    }

    pub fn collection_mut(&mut self, collection: Collection) -> &mut BTreeMap<String, RepoStats> {
        match collection {
            Collection::Pipelines => &mut self.pipelines,
            Collection::CoreRepos => &mut self.core_repos,
        }
    }

    /// Ensure every name has an entry in `collection`. Returns the names that were new.
    pub fn register<S: AsRef<str>>(&mut self, collection: Collection, names: &[S]) -> Vec<String> {
        let repos = self.collection_mut(collection);
        let mut added = Vec::new();
        for name in names {
            let name = name.as_ref();
            if !repos.contains_key(name) {
                repos.insert(name.to_string(), RepoStats::default());
                added.push(name.to_string());
            }
        }
        added
    }

    /// Every known repository, pipelines first.
    pub fn repo_refs(&self) -> Vec<RepoRef> {
        Collection::ALL
            .into_iter()
            .flat_map(|collection| {
                self.collection(collection).keys().map(move |name| RepoRef {
                    collection,
                    name: name.clone(),
                })
            })
            .collect()
    }

    pub fn repo_mut(&mut self, repo: &RepoRef) -> &mut RepoStats {
        self.collection_mut(repo.collection)
            .entry(repo.name.clone())
            .or_default()
    }

    pub fn repo_count(&self) -> usize {
        self.pipelines.len() + self.core_repos.len()
    }

    /// Drop the weekly breakdown from every contributor in every repository.
    pub fn prune_weekly_breakdown(&mut self) {
        for stats in self.pipelines.values_mut().chain(self.core_repos.values_mut()) {
            stats.prune_weekly_breakdown();
        }
    }
}

/// `stats.json` → `stats.json.part`
fn temp_path(path: &Path) -> PathBuf {
    let mut o = path.as_os_str().to_owned();
    o.push(".part");
    PathBuf::from(o)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_starts_fresh() {
        let dir = tempdir().unwrap();
        let record = CumulativeRecord::load_or_init(&dir.path().join("stats.json"), 1_700_000_000).unwrap();
        assert_eq!(record.updated, 1_700_000_000);
        assert!(record.pipelines.is_empty());
        assert!(record.core_repos.is_empty());
    }

    #[test]
    fn corrupt_file_is_persistence_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.json");
        fs::write(&path, "{not json").unwrap();
        let err = CumulativeRecord::load_or_init(&path, 0).unwrap_err();
        assert!(matches!(err, StatsError::PersistenceParse { .. }));
    }

    #[test]
    fn save_then_load_preserves_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("stats.json");
        let mut record = CumulativeRecord::new(10);
        record.register(Collection::Pipelines, &["rnaseq"]);
        let stats = record.repo_mut(&RepoRef {
            collection: Collection::Pipelines,
            name: "rnaseq".to_string(),
        });
        stats.merge_traffic(
            TrafficKind::Views,
            &[TrafficPoint {
                timestamp: "2024-01-01T00:00:00Z".to_string(),
                count: 3,
                uniques: 1,
            }],
        );
        stats.recompute_totals();
        record.save(&path).unwrap();

        assert!(!temp_path(&path).exists());
        let loaded = CumulativeRecord::load_or_init(&path, 0).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn failed_rename_removes_part_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), "x").unwrap();

        let err = CumulativeRecord::new(0).save(&path).unwrap_err();

        assert!(matches!(err, StatsError::PersistenceWrite { .. }));
        assert!(!temp_path(&path).exists());
        assert!(path.join("occupied").exists());
    }

    #[test]
    fn register_reports_only_new_names() {
        let mut record = CumulativeRecord::new(0);
        let added = record.register(Collection::Pipelines, &["a", "b"]);
        assert_eq!(added, vec!["a".to_string(), "b".to_string()]);
        let added = record.register(Collection::Pipelines, &["b", "c"]);
        assert_eq!(added, vec!["c".to_string()]);
        assert_eq!(record.pipelines.len(), 3);
        assert!(record.core_repos.is_empty());
        assert_eq!(record.pipelines["c"], RepoStats::default());
    }

    #[test]
    fn legacy_record_with_empty_arrays_loads() {
        let json = r#"{
            "updated": 1546300800,
            "pipelines": {
                "atacseq": [],
                "rnaseq": {
                    "views_count": {"2019-01-01T00:00:00Z": 12},
                    "views_uniques": {"2019-01-01T00:00:00Z": 4},
                    "clones_count": [],
                    "clones_uniques": [],
                    "contributors": {},
                    "num_contributors": 0,
                    "views_count_total": 12,
                    "views_uniques_total": 4,
                    "clones_count_total": 0,
                    "clones_uniques_total": 0
                }
            },
            "core_repos": []
        }"#;
        let record: CumulativeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.updated, 1546300800);
        assert_eq!(record.pipelines["atacseq"], RepoStats::default());
        assert_eq!(record.pipelines["rnaseq"].views_count_total, 12);
        assert!(record.core_repos.is_empty());
    }

    #[test]
    fn prune_reaches_both_collections() {
        let mut record = CumulativeRecord::new(0);
        let contributor: Contributor = serde_json::from_str(
            r#"{"author": {"login": "x", "id": 7}, "total": 2, "weeks": [{"w": 1, "a": 1, "d": 0, "c": 2}]}"#,
        )
        .unwrap();
        for collection in Collection::ALL {
            record.register(collection, &["repo"]);
            record
                .collection_mut(collection)
                .get_mut("repo")
                .unwrap()
                .set_contributors(vec![contributor.clone()]);
        }
        record.prune_weekly_breakdown();
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("\"weeks\""));
    }
}
