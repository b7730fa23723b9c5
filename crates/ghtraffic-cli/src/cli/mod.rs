//! CLI for ghtraffic. A bare `ghtraffic` runs one update with the default config.

use anyhow::Result;
use clap::Parser;
use ghtraffic_core::api::GithubClient;
use ghtraffic_core::config;
use ghtraffic_core::update::{self, UpdateReport};
use ghtraffic_core::StatsError;
use std::path::PathBuf;

/// Accumulate GitHub traffic and contributor statistics into a JSON record.
#[derive(Debug, Parser)]
#[command(name = "ghtraffic")]
#[command(about = "Accumulate GitHub traffic and contributor stats beyond the two-week window", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/ghtraffic/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Stats file to read and overwrite, overriding `stats_file` from the config.
    #[arg(long, value_name = "PATH")]
    pub stats_file: Option<PathBuf>,
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        Cli::parse().run()
    }

    pub fn run(self) -> Result<()> {
        let mut cfg = match &self.config {
            Some(path) => config::load_or_init_at(path)?,
            None => config::load_or_init()?,
        };
        cfg.apply_overrides(|key| std::env::var(key).ok());
        if let Some(path) = self.stats_file {
            cfg.stats_file = path;
        }
        cfg.validate()?;
        tracing::debug!(
            stats_file = %cfg.stats_file.display(),
            organization = %cfg.github.organization,
            api_url = %cfg.github.api_url,
            "loaded config"
        );

        let client = GithubClient::new(&cfg)?;
        let report = update::run_update(&cfg, &client)?;

        for repo in &report.refresh.still_pending {
            println!(
                "Tried getting contributors after delay for {}, but took too long.",
                repo
            );
        }
        let summary = run_summary(&report);
        tracing::info!("{}", summary);
        println!("{}", summary);
        println!("ghtraffic update done {}", report.finished_at.to_rfc3339());
        Ok(())
    }
}

/// One-line account of a finished run.
pub fn run_summary(report: &UpdateReport) -> String {
    format!(
        "refreshed {} repositories, {} new, {} contributors resolved on retry, {} still pending",
        report.refresh.repositories,
        report.discovered.len(),
        report.refresh.resolved_on_retry.len(),
        report.refresh.still_pending.len()
    )
}

/// Diagnostic lines for a failed run: the full response headers of a fatal
/// API call, so the operator can see rate limits, auth failures and so on.
pub fn failure_details(err: &anyhow::Error) -> Vec<String> {
    let Some(stats_err) = err.downcast_ref::<StatsError>() else {
        return Vec::new();
    };
    let Some(headers) = stats_err.response_headers() else {
        return Vec::new();
    };
    std::iter::once("response headers:".to_string())
        .chain(headers.iter().map(|h| format!("  {}", h)))
        .collect()
}
