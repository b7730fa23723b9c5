//! Per-repository counters and the merge rules for new traffic data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::contributor::Contributor;
use super::lenient;

/// One day of traffic as reported by `traffic/views` or `traffic/clones`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficPoint {
    pub timestamp: String,
    pub count: u64,
    pub uniques: u64,
}

/// Which traffic time series a batch of points belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficKind {
    Views,
    Clones,
}

/// The four per-day counter series kept for each repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    ViewsCount,
    ViewsUniques,
    ClonesCount,
    ClonesUniques,
}

impl Series {
    pub const ALL: [Series; 4] = [
        Series::ViewsCount,
        Series::ViewsUniques,
        Series::ClonesCount,
        Series::ClonesUniques,
    ];
}

/// Cumulative statistics for one repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoStats {
    #[serde(default, deserialize_with = "lenient::map")]
    pub views_count: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "lenient::map")]
    pub views_uniques: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "lenient::map")]
    pub clones_count: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "lenient::map")]
    pub clones_uniques: BTreeMap<String, u64>,
    #[serde(default)]
    pub views_count_total: u64,
    #[serde(default)]
    pub views_uniques_total: u64,
    #[serde(default)]
    pub clones_count_total: u64,
    #[serde(default)]
    pub clones_uniques_total: u64,
    #[serde(default, deserialize_with = "lenient::list")]
    pub contributors: Vec<Contributor>,
    #[serde(default)]
    pub num_contributors: usize,
}

impl RepoStats {
    pub fn series(&self, series: Series) -> &BTreeMap<String, u64> {
        match series {
            Series::ViewsCount => &self.views_count,
            Series::ViewsUniques => &self.views_uniques,
            Series::ClonesCount => &self.clones_count,
            Series::ClonesUniques => &self.clones_uniques,
        }
    }

    fn series_mut(&mut self, series: Series) -> &mut BTreeMap<String, u64> {
        match series {
            Series::ViewsCount => &mut self.views_count,
            Series::ViewsUniques => &mut self.views_uniques,
            Series::ClonesCount => &mut self.clones_count,
            Series::ClonesUniques => &mut self.clones_uniques,
        }
    }

    #[cfg(test)]
    pub(crate) fn total(&self, series: Series) -> u64 {
        match series {
            Series::ViewsCount => self.views_count_total,
            Series::ViewsUniques => self.views_uniques_total,
            Series::ClonesCount => self.clones_count_total,
            Series::ClonesUniques => self.clones_uniques_total,
        }
    }

    fn total_mut(&mut self, series: Series) -> &mut u64 {
        match series {
            Series::ViewsCount => &mut self.views_count_total,
            Series::ViewsUniques => &mut self.views_uniques_total,
            Series::ClonesCount => &mut self.clones_count_total,
            Series::ClonesUniques => &mut self.clones_uniques_total,
        }
    }

    /// Merge one fetched window into the day-keyed series.
    ///
    /// The API reports a single value per day, so an existing day is replaced,
    /// never added to.
    pub fn merge_traffic(&mut self, kind: TrafficKind, points: &[TrafficPoint]) {
        let (count, uniques) = match kind {
            TrafficKind::Views => (Series::ViewsCount, Series::ViewsUniques),
            TrafficKind::Clones => (Series::ClonesCount, Series::ClonesUniques),
        };
        for point in points {
            self.series_mut(count)
                .insert(point.timestamp.clone(), point.count);
            self.series_mut(uniques)
                .insert(point.timestamp.clone(), point.uniques);
        }
    }

    /// Recompute every `*_total` from the values currently stored.
    pub fn recompute_totals(&mut self) {
        for series in Series::ALL {
            let sum: u64 = self.series(series).values().sum();
            *self.total_mut(series) = sum;
        }
    }

    pub fn set_contributors(&mut self, contributors: Vec<Contributor>) {
        self.num_contributors = contributors.len();
        self.contributors = contributors;
    }

    pub fn prune_weekly_breakdown(&mut self) {
        for contributor in &mut self.contributors {
            contributor.drop_weekly_breakdown();
        }
    }
}
