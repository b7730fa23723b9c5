//! Error type shared by the record, sources, API client and aggregator.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// API endpoint family a request belongs to. Used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Views,
    Clones,
    Contributors,
}

impl Endpoint {
    /// Path below `/repos/<org>/<repo>/`.
    pub fn path(self) -> [&'static str; 2] {
        match self {
            Endpoint::Views => ["traffic", "views"],
            Endpoint::Clones => ["traffic", "clones"],
            Endpoint::Contributors => ["stats", "contributors"],
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Views => write!(f, "repo views"),
            Endpoint::Clones => write!(f, "repo clones"),
            Endpoint::Contributors => write!(f, "repo contributors"),
        }
    }
}

/// A response the API answered with a status we cannot use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedResponse {
    pub url: String,
    pub status: u32,
    /// Raw header lines including the status line, in arrival order.
    pub headers: Vec<String>,
}

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("could not read stats file {path}")]
    PersistenceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stats file {path} is not a valid cumulative record")]
    PersistenceParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not write stats file {path}")]
    PersistenceWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read {location}")]
    InputRead {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("pipeline registry {location} is malformed")]
    RegistryParse {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("repository list {location} is malformed")]
    RepoListParse {
        location: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("could not download {location}: HTTP {status}")]
    InputFetch { location: String, status: u32 },
    #[error("invalid API url {url}: {reason}")]
    InvalidApiUrl { url: String, reason: String },
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },
    #[error("unexpected response body from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not fetch {endpoint} for {repo}: HTTP {} from {}", .response.status, .response.url)]
    Fetch {
        endpoint: Endpoint,
        repo: String,
        response: FailedResponse,
    },
}

impl StatsError {
    /// Header lines of the failing response, if this is a fatal fetch error.
    pub fn response_headers(&self) -> Option<&[String]> {
        match self {
            StatsError::Fetch { response, .. } => Some(&response.headers),
            _ => None,
        }
    }
}
