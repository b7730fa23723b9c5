use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `github.username`.
pub const USERNAME_ENV: &str = "GHTRAFFIC_GITHUB_USERNAME";
/// Environment variable that overrides `github.access_token`.
pub const TOKEN_ENV: &str = "GHTRAFFIC_GITHUB_TOKEN";

/// Hosting API access (the `[github]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Account used for HTTP Basic auth.
    #[serde(default)]
    pub username: String,
    /// Personal access token; needs push access for the traffic endpoints.
    #[serde(default)]
    pub access_token: String,
    /// Organization that owns every tracked repository.
    #[serde(default = "default_organization")]
    pub organization: String,
    /// API base URL; override for GitHub Enterprise or tests.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            access_token: String::new(),
            organization: default_organization(),
            api_url: default_api_url(),
        }
    }
}

fn default_organization() -> String {
    "nf-core".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

/// Where repository names come from (the `[sources]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Pipeline registry JSON: a local path or an http(s) URL.
    pub pipelines_registry: String,
    /// TOML file with `repos = [...]` listing the core (non-pipeline) repositories.
    pub ignored_repos: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            pipelines_registry: "public_html/pipelines.json".to_string(),
            ignored_repos: PathBuf::from("ignored_repos.toml"),
        }
    }
}

/// Global configuration loaded from `~/.config/ghtraffic/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhTrafficConfig {
    /// Cumulative record, read at start and overwritten at the end of each run.
    pub stats_file: PathBuf,
    /// Pause before re-requesting contributor stats the API is still computing.
    #[serde(default = "default_retry_delay_secs")]
    pub contributors_retry_delay_secs: u64,
    /// Optional User-Agent override (the API rejects requests without one).
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

fn default_retry_delay_secs() -> u64 {
    10
}

impl Default for GhTrafficConfig {
    fn default() -> Self {
        Self {
            stats_file: PathBuf::from("nfcore_stats.json"),
            contributors_retry_delay_secs: default_retry_delay_secs(),
            user_agent: None,
            github: GithubConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

impl GhTrafficConfig {
    pub fn contributors_retry_delay(&self) -> Duration {
        Duration::from_secs(self.contributors_retry_delay_secs)
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("ghtraffic/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Apply credential overrides; `lookup` is usually `std::env::var(..).ok()`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(user) = lookup(USERNAME_ENV).filter(|v| !v.is_empty()) {
            self.github.username = user;
        }
        if let Some(token) = lookup(TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.github.access_token = token;
        }
    }

    /// Reject configurations that cannot make authenticated API calls.
    pub fn validate(&self) -> Result<()> {
        if self.github.username.trim().is_empty() || self.github.access_token.trim().is_empty() {
            bail!(
                "github.username and github.access_token must be set (or {} / {})",
                USERNAME_ENV,
                TOKEN_ENV
            );
        }
        if self.github.organization.trim().is_empty() {
            bail!("github.organization must not be empty");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ghtraffic")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from the default location, creating a default file if none exists.
pub fn load_or_init() -> Result<GhTrafficConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

/// Like [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<GhTrafficConfig> {
    if !path.exists() {
        let default_cfg = GhTrafficConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write default config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: GhTrafficConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
