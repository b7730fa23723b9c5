//! GitHub REST client for the traffic and contributor statistics endpoints.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::{ApiResponse, StatsApi};
use crate::config::GhTrafficConfig;
use crate::error::{Endpoint, FailedResponse, StatsError};
use crate::http::{self, RawResponse, RequestOptions};
use crate::record::{Contributor, TrafficPoint};

const ACCEPT: (&str, &str) = ("Accept", "application/vnd.github+json");

/// Body of `traffic/views`.
#[derive(Debug, Default, Deserialize)]
struct ViewsBody {
    #[serde(default)]
    views: Vec<TrafficPoint>,
}

/// Body of `traffic/clones`.
#[derive(Debug, Default, Deserialize)]
struct ClonesBody {
    #[serde(default)]
    clones: Vec<TrafficPoint>,
}

/// Authenticated client bound to one organization.
#[derive(Debug, Clone)]
pub struct GithubClient {
    api_url: Url,
    organization: String,
    username: String,
    access_token: String,
    user_agent: String,
}

impl GithubClient {
    pub fn new(cfg: &GhTrafficConfig) -> Result<Self, StatsError> {
        let api_url = Url::parse(&cfg.github.api_url).map_err(|e| StatsError::InvalidApiUrl {
            url: cfg.github.api_url.clone(),
            reason: e.to_string(),
        })?;
        if api_url.cannot_be_a_base() {
            return Err(StatsError::InvalidApiUrl {
                url: cfg.github.api_url.clone(),
                reason: "not a base URL".to_string(),
            });
        }
        Ok(Self {
            api_url,
            organization: cfg.github.organization.clone(),
            username: cfg.github.username.clone(),
            access_token: cfg.github.access_token.clone(),
            user_agent: cfg.user_agent(),
        })
    }

    /// `<api>/repos/<org>/<repo>/<endpoint path>`, with each segment escaped.
    pub fn endpoint_url(&self, repo: &str, endpoint: Endpoint) -> Result<Url, StatsError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| StatsError::InvalidApiUrl {
                url: self.api_url.to_string(),
                reason: "not a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(["repos", self.organization.as_str(), repo])
            .extend(endpoint.path());
        Ok(url)
    }

    fn fetch<T>(&self, repo: &str, endpoint: Endpoint) -> Result<ApiResponse<T>, StatsError>
    where
        T: DeserializeOwned + Default,
    {
        let url = self.endpoint_url(repo, endpoint)?;
        tracing::debug!(%url, repo, "GET {}", endpoint);
        let opts = RequestOptions {
            user_agent: &self.user_agent,
            basic_auth: Some((self.username.as_str(), self.access_token.as_str())),
            headers: &[ACCEPT],
        };
        let raw = http::get(&url, &opts).map_err(|source| StatsError::Transport {
            url: url.to_string(),
            source,
        })?;
        if let Some(remaining) = raw.header("x-ratelimit-remaining") {
            tracing::debug!(remaining, "API rate limit");
        }
        interpret(&url, raw)
    }
}

/// Turn a raw response into the tagged outcome. 202 means "still computing";
/// a blank 2xx body (204 for empty repositories) decodes as `T::default()`.
fn interpret<T>(url: &Url, raw: RawResponse) -> Result<ApiResponse<T>, StatsError>
where
    T: DeserializeOwned + Default,
{
    if raw.status == 202 {
        return Ok(ApiResponse::Pending);
    }
    if !raw.is_success() {
        return Ok(ApiResponse::Failed(FailedResponse {
            url: url.to_string(),
            status: raw.status,
            headers: raw.headers,
        }));
    }
    if raw.body_is_blank() {
        return Ok(ApiResponse::Ready(T::default()));
    }
    serde_json::from_slice(&raw.body)
        .map(ApiResponse::Ready)
        .map_err(|source| StatsError::Decode {
            url: url.to_string(),
            source,
        })
}

impl StatsApi for GithubClient {
    fn views(&self, repo: &str) -> Result<ApiResponse<Vec<TrafficPoint>>, StatsError> {
        Ok(self
            .fetch::<ViewsBody>(repo, Endpoint::Views)?
            .map(|body| body.views))
    }

    fn clones(&self, repo: &str) -> Result<ApiResponse<Vec<TrafficPoint>>, StatsError> {
        Ok(self
            .fetch::<ClonesBody>(repo, Endpoint::Clones)?
            .map(|body| body.clones))
    }

    fn contributors(&self, repo: &str) -> Result<ApiResponse<Vec<Contributor>>, StatsError> {
        self.fetch(repo, Endpoint::Contributors)
    }
}
