//! Repository names to track: pipelines from the registry document and core
//! repositories from the ignore list.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::error::StatsError;
use crate::http::{self, RequestOptions};

/// Where the pipeline registry lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryLocation {
    Path(PathBuf),
    Url(Url),
}

impl RegistryLocation {
    /// http(s) URLs are fetched, anything else is read as a local path.
    pub fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => RegistryLocation::Url(url),
            _ => RegistryLocation::Path(PathBuf::from(location)),
        }
    }

    fn describe(&self) -> String {
        match self {
            RegistryLocation::Path(p) => p.display().to_string(),
            RegistryLocation::Url(u) => u.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PipelineRegistry {
    remote_workflows: Vec<PipelineDescriptor>,
}

#[derive(Debug, Deserialize)]
struct PipelineDescriptor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RepoList {
    repos: Vec<String>,
}

/// Read pipeline names from the registry, in registry order.
pub fn read_pipeline_names(location: &RegistryLocation, user_agent: &str) -> Result<Vec<String>, StatsError> {
    let bytes = match location {
        RegistryLocation::Path(path) => fs::read(path).map_err(|source| StatsError::InputRead {
            location: location.describe(),
            source,
        })?,
        RegistryLocation::Url(url) => {
            let opts = RequestOptions {
                user_agent,
                ..RequestOptions::default()
            };
            let raw = http::get(url, &opts).map_err(|source| StatsError::Transport {
                url: url.to_string(),
                source,
            })?;
            if !raw.is_success() {
                return Err(StatsError::InputFetch {
                    location: location.describe(),
                    status: raw.status,
                });
            }
            raw.body
        }
    };
    let registry: PipelineRegistry =
        serde_json::from_slice(&bytes).map_err(|source| StatsError::RegistryParse {
            location: location.describe(),
            source,
        })?;
    Ok(registry.remote_workflows.into_iter().map(|wf| wf.name).collect())
}

/// Read core repository names (`repos = [...]`) from a TOML file.
pub fn read_repo_list(path: &Path) -> Result<Vec<String>, StatsError> {
    let data = fs::read_to_string(path).map_err(|source| StatsError::InputRead {
        location: path.display().to_string(),
        source,
    })?;
    let list: RepoList = toml::from_str(&data).map_err(|source| StatsError::RepoListParse {
        location: path.display().to_string(),
        source,
    })?;
    Ok(list.repos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn location_parse() {
        assert_eq!(
            RegistryLocation::parse("public_html/pipelines.json"),
            RegistryLocation::Path(PathBuf::from("public_html/pipelines.json"))
        );
        assert!(matches!(
            RegistryLocation::parse("https://nf-co.re/pipelines.json"),
            RegistryLocation::Url(_)
        ));
        assert!(matches!(
            RegistryLocation::parse("/abs/pipelines.json"),
            RegistryLocation::Path(_)
        ));
    }

    #[test]
    fn registry_names_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipelines.json");
        fs::write(
            &path,
            r#"{"pipeline_count": 2, "remote_workflows": [
                {"name": "rnaseq", "full_name": "nf-core/rnaseq", "stargazers_count": 500},
                {"name": "atacseq"}
            ]}"#,
        )
        .unwrap();
        let names = read_pipeline_names(&RegistryLocation::Path(path), "test").unwrap();
        assert_eq!(names, vec!["rnaseq".to_string(), "atacseq".to_string()]);
    }

    #[test]
    fn registry_without_workflows_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipelines.json");
        fs::write(&path, r#"{"workflows": []}"#).unwrap();
        let err = read_pipeline_names(&RegistryLocation::Path(path), "test").unwrap_err();
        assert!(matches!(err, StatsError::RegistryParse { .. }));
    }

    #[test]
    fn missing_registry_is_read_error() {
        let dir = tempdir().unwrap();
        let err = read_pipeline_names(&RegistryLocation::Path(dir.path().join("nope.json")), "test")
            .unwrap_err();
        assert!(matches!(err, StatsError::InputRead { .. }));
    }

    #[test]
    fn repo_list_from_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ignored_repos.toml");
        fs::write(&path, "repos = [\"tools\", \"nf-co.re\", \"modules\"]\n").unwrap();
        assert_eq!(
            read_repo_list(&path).unwrap(),
            vec!["tools".to_string(), "nf-co.re".to_string(), "modules".to_string()]
        );
    }

    #[test]
    fn repo_list_bad_type_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ignored_repos.toml");
        fs::write(&path, "repos = \"tools\"\n").unwrap();
        assert!(matches!(read_repo_list(&path), Err(StatsError::RepoListParse { .. })));
    }

    #[test]
    fn repo_list_without_repos_key_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ignored_repos.toml");
        fs::write(&path, "ignored = [\"tools\"]\n").unwrap();
        assert!(matches!(read_repo_list(&path), Err(StatsError::RepoListParse { .. })));
    }
}
