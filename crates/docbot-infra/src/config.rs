//! Configuration loader for docbot.
//!
//! Reads `docbot.toml` and deserializes it into [`DocbotConfig`]. A missing
//! file falls back to defaults (no projects). A file that exists but fails to
//! read, parse, or validate is an error: silently defaulting would drop every
//! channel restriction and grant full access.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use docbot_types::config::{DocbotConfig, SHARED_DOCS_PROJECT_ID};
use docbot_types::error::ConfigError;
use docbot_types::project::Project;

use crate::filesystem::SharedDocs;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "DOCBOT_CONFIG";

const CONFIG_FILE: &str = "docbot.toml";

/// Resolve which config file to load.
///
/// Priority:
/// 1. Explicit path (the `--config` flag)
/// 2. `DOCBOT_CONFIG` environment variable
/// 3. `./docbot.toml` if present
/// 4. `~/.docbot/docbot.toml` if present
/// 5. `./docbot.toml` (missing; defaults apply)
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }

    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return local;
    }
    if let Some(home) = dirs::home_dir() {
        let global = home.join(".docbot").join(CONFIG_FILE);
        if global.exists() {
            return global;
        }
    }
    local
}

/// Load and validate configuration from `path`.
pub async fn load_config(path: &Path) -> Result<DocbotConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            return Ok(DocbotConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    let config = toml::from_str::<DocbotConfig>(&content).map_err(|err| ConfigError::Parse {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    validate_config(&config)?;

    tracing::debug!(
        path = %path.display(),
        projects = config.projects.len(),
        restricted_channels = config.channel_access.len(),
        "loaded config"
    );
    Ok(config)
}

/// Reject configurations the pipeline cannot run safely with.
pub fn validate_config(config: &DocbotConfig) -> Result<(), ConfigError> {
    let mut ids = BTreeSet::new();
    for project in &config.projects {
        if project.id.trim().is_empty() {
            return Err(ConfigError::Invalid("project with empty id".to_string()));
        }
        if project.id.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "project id '{}' must not contain path separators",
                project.id
            )));
        }
        if !ids.insert(project.id.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "duplicate project id '{}'",
                project.id
            )));
        }
    }

    if config.shared_docs.is_some() && ids.contains(SHARED_DOCS_PROJECT_ID) {
        return Err(ConfigError::Invalid(format!(
            "project id '{SHARED_DOCS_PROJECT_ID}' is reserved for [shared_docs]"
        )));
    }

    for (channel, allowed) in &config.channel_access {
        if let Some(unknown) = allowed.iter().find(|id| !ids.contains(id.as_str())) {
            return Err(ConfigError::Invalid(format!(
                "channel '{channel}' grants unknown project '{unknown}'"
            )));
        }
    }

    if config.max_session_turns == 0 {
        return Err(ConfigError::Invalid(
            "max_session_turns must be at least 1".to_string(),
        ));
    }
    if config.session_timeout().is_none() {
        return Err(ConfigError::Invalid(format!(
            "session_timeout_secs must be positive and representable, got {}",
            config.session_timeout_secs
        )));
    }
    if config.inference_timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "inference_timeout_secs must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Directory that relative paths in the config file resolve against.
pub fn config_base_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Turn `[[projects]]` entries into `Project`s with resolved roots.
pub fn resolve_projects(config: &DocbotConfig, base_dir: &Path) -> Vec<Project> {
    config
        .projects
        .iter()
        .map(|p| Project {
            id: p.id.clone(),
            name: p.name.clone(),
            root: resolve_path(base_dir, &p.root),
        })
        .collect()
}

/// The `[shared_docs]` table with its root resolved, if configured.
pub fn resolve_shared_docs(config: &DocbotConfig, base_dir: &Path) -> Option<SharedDocs> {
    config.shared_docs.as_ref().map(|shared| SharedDocs {
        project: Project {
            id: SHARED_DOCS_PROJECT_ID.to_string(),
            name: shared.name.clone(),
            root: resolve_path(base_dir, &shared.root),
        },
        exclude: shared.exclude.clone(),
    })
}

/// Repository whose history answers "what changed recently".
pub fn resolve_repository_root(config: &DocbotConfig, base_dir: &Path) -> PathBuf {
    match &config.repository_root {
        Some(root) => resolve_path(base_dir, root),
        None => base_dir.to_path_buf(),
    }
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE);
        tokio::fs::write(&path, body).await.unwrap();
        path
    }

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILE)).await.unwrap();
        assert!(config.projects.is_empty());
        assert_eq!(config.max_session_turns, 20);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
inference_timeout_secs = 30

[[projects]]
id = "project_alpha"
name = "Project Alpha"
root = "project_alpha"

[channel_access]
C0123456789 = ["project_alpha"]
"#,
        )
        .await;

        let config = load_config(&path).await.unwrap();
        assert_eq!(config.inference_timeout_secs, 30);
        assert_eq!(config.projects[0].id, "project_alpha");

        let projects = resolve_projects(&config, &config_base_dir(&path));
        assert_eq!(projects[0].root, tmp.path().join("project_alpha"));
    }

    #[tokio::test]
    async fn load_config_invalid_toml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "this is not { valid toml !!!").await;
        let err = load_config(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[tokio::test]
    async fn load_config_rejects_unknown_channel_project() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
[[projects]]
id = "alpha"
name = "Alpha"
root = "alpha"

[channel_access]
C1 = ["beta"]
"#,
        )
        .await;
        let err = load_config(&path).await.unwrap_err();
        assert!(err.to_string().contains("beta"));
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let config: DocbotConfig = toml::from_str(
            r#"
[[projects]]
id = "alpha"
name = "A"
root = "a"

[[projects]]
id = "alpha"
name = "B"
root = "b"
"#,
        )
        .unwrap();
        assert!(matches!(validate_config(&config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let config = DocbotConfig {
            max_session_turns: 0,
            ..DocbotConfig::default()
        };
        assert!(validate_config(&config).is_err());

        let config = DocbotConfig {
            session_timeout_secs: 0,
            ..DocbotConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn validate_rejects_unrepresentable_session_timeout() {
        let config = DocbotConfig {
            session_timeout_secs: i64::MAX,
            ..DocbotConfig::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("session_timeout_secs"));
    }

    #[tokio::test]
    async fn load_config_resolves_shared_docs() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
[[projects]]
id = "alpha"
name = "Alpha"
root = "alpha"

[shared_docs]
root = "."
exclude = ["CLAUDE.md", "NOTES.md"]
"#,
        )
        .await;
        let config = load_config(&path).await.unwrap();
        let shared = resolve_shared_docs(&config, &config_base_dir(&path)).unwrap();
        assert_eq!(shared.project.id, SHARED_DOCS_PROJECT_ID);
        assert_eq!(shared.project.root, tmp.path().join("."));
        assert_eq!(shared.exclude.len(), 2);
        assert!(resolve_shared_docs(&DocbotConfig::default(), tmp.path()).is_none());
    }

    #[test]
    fn validate_keeps_shared_docs_away_from_channel_policies() {
        let config: DocbotConfig = toml::from_str(
            r#"
[[projects]]
id = "alpha"
name = "Alpha"
root = "alpha"

[shared_docs]
root = "."

[channel_access]
C1 = ["alpha", "shared_docs"]
"#,
        )
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("shared_docs"));

        let config: DocbotConfig = toml::from_str(
            r#"
[[projects]]
id = "shared_docs"
name = "Clash"
root = "clash"

[shared_docs]
root = "."
"#,
        )
        .unwrap();
        assert!(validate_config(&config).unwrap_err().to_string().contains("reserved"));
    }

    #[test]
    fn absolute_roots_are_kept() {
        let config: DocbotConfig = toml::from_str(
            r#"
repository_root = "/srv/repo"

[[projects]]
id = "beta"
name = "Beta"
root = "/srv/docs/beta"
"#,
        )
        .unwrap();
        let base = PathBuf::from("/etc/docbot");
        assert_eq!(resolve_projects(&config, &base)[0].root, PathBuf::from("/srv/docs/beta"));
        assert_eq!(resolve_repository_root(&config, &base), PathBuf::from("/srv/repo"));
        assert_eq!(
            resolve_repository_root(&DocbotConfig::default(), &base),
            base
        );
    }

    #[test]
    fn base_dir_of_bare_file_name_is_current_dir() {
        assert_eq!(config_base_dir(Path::new("docbot.toml")), PathBuf::from("."));
        assert_eq!(
            config_base_dir(Path::new("/etc/docbot/docbot.toml")),
            PathBuf::from("/etc/docbot")
        );
    }

    #[test]
    fn explicit_config_path_wins() {
        let path = resolve_config_path(Some(PathBuf::from("/tmp/custom.toml")));
        assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
    }
}
