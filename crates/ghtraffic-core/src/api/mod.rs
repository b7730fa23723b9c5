//! Hosting API access.
//!
//! Every call returns an [`ApiResponse`] that carries its own status, so callers
//! never have to look at "the last response" to learn what happened.

mod client;

pub use client::GithubClient;

use crate::error::{FailedResponse, StatsError};
use crate::record::{Contributor, TrafficPoint};

/// Outcome of a single API call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    /// 2xx with a usable body.
    Ready(T),
    /// 202 Accepted: the host is still computing the data; ask again later.
    Pending,
    /// Any other status.
    Failed(FailedResponse),
}

impl<T> ApiResponse<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResponse<U> {
        match self {
            ApiResponse::Ready(v) => ApiResponse::Ready(f(v)),
            ApiResponse::Pending => ApiResponse::Pending,
            ApiResponse::Failed(r) => ApiResponse::Failed(r),
        }
    }
}

/// The three statistics endpoints the aggregator needs for a repository.
///
/// `Err` is reserved for transport and decoding problems; HTTP statuses are
/// reported through [`ApiResponse`].
pub trait StatsApi {
    fn views(&self, repo: &str) -> Result<ApiResponse<Vec<TrafficPoint>>, StatsError>;
    fn clones(&self, repo: &str) -> Result<ApiResponse<Vec<TrafficPoint>>, StatsError>;
    fn contributors(&self, repo: &str) -> Result<ApiResponse<Vec<Contributor>>, StatsError>;
}

impl<A: StatsApi + ?Sized> StatsApi for &A {
    fn views(&self, repo: &str) -> Result<ApiResponse<Vec<TrafficPoint>>, StatsError> {
        (**self).views(repo)
    }

    fn clones(&self, repo: &str) -> Result<ApiResponse<Vec<TrafficPoint>>, StatsError> {
        (**self).clones(repo)
    }

    fn contributors(&self, repo: &str) -> Result<ApiResponse<Vec<Contributor>>, StatsError> {
        (**self).contributors(repo)
    }
}
