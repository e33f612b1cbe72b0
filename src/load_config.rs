/// `load_config` module: merges the optional YAML file, command-line flags and
/// environment secrets into one validated [`UploadConfig`].
///
/// Secrets never come from YAML: the user and password are taken from the
/// flags or from `FILESTORE_USER` / `FILESTORE_PASSWORD`. Validation collects
/// every problem before failing so a user can fix the configuration in one go.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use filestore_sync_core::config::{FilestoreConfig, SynchroniseConfig};
use filestore_sync_core::selection::SelectionConfig;
use serde::Deserialize;
use tracing::{error, info};

use crate::cli::UploadArgs;

pub const USER_ENV: &str = "FILESTORE_USER";
pub const PASSWORD_ENV: &str = "FILESTORE_PASSWORD";

const MAX_CONTAINER_NAME: usize = 15;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub connection: ConnectionSection,
    pub target: TargetSection,
    pub source: SourceSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionSection {
    pub server: Option<String>,
    pub client: Option<String>,
    pub strict_ssl: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TargetSection {
    pub package: Option<String>,
    pub container: Option<String>,
    pub container_description: Option<String>,
    pub transport: Option<String>,
    pub language: Option<String>,
    pub recalculate_index: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub base_dir: Option<PathBuf>,
    pub files: Option<String>,
    pub include_dotfiles: bool,
    pub git_diff_commit: Option<String>,
    pub git_diff_unstaged: bool,
    pub preserve_unselected: bool,
}

/// Where and as whom to connect.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub server: String,
    pub client: Option<String>,
    pub user: String,
    pub password: String,
    pub strict_ssl: bool,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server", &self.server)
            .field("client", &self.client)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("strict_ssl", &self.strict_ssl)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub connection: ConnectionConfig,
    pub filestore: FilestoreConfig,
    pub synchronise: SynchroniseConfig,
    pub selection: SelectionConfig,
}

/// Reads the YAML file named by `--config`, if any. Every section is optional.
pub fn read_config_file<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        e
    })
    .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;

    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    let parsed: FileConfig = serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
        e
    })
    .context("Failed to parse config YAML")?;
    info!(config_path = ?path_ref, "Parsed config YAML successfully");
    Ok(parsed)
}

/// Merges file, flags and environment into a validated configuration.
pub fn load_config(args: &UploadArgs) -> Result<UploadConfig> {
    let file = match &args.config {
        Some(path) => read_config_file(path)?,
        None => FileConfig::default(),
    };
    let config = merge(file, args);

    let problems = validate(&config);
    if !problems.is_empty() {
        for problem in &problems {
            error!(problem = %problem, "Invalid configuration");
        }
        bail!("Invalid configuration:\n  - {}", problems.join("\n  - "));
    }

    info!(
        server = %config.connection.server,
        container = %config.filestore.container,
        base_dir = %config.selection.base_dir.display(),
        "Config loaded and merged successfully"
    );
    Ok(config)
}

fn merge(file: FileConfig, args: &UploadArgs) -> UploadConfig {
    let FileConfig {
        connection,
        target,
        source,
    } = file;

    let server = pick(&args.server, connection.server)
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_default();
    let language = pick(&args.language, target.language)
        .map(|l| l.trim().to_uppercase())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| "EN".to_string());
    let base_dir = args.base.clone().or(source.base_dir).unwrap_or_default();

    UploadConfig {
        connection: ConnectionConfig {
            server: server.clone(),
            client: pick(&args.client, connection.client),
            user: secret(&args.user, USER_ENV),
            password: secret(&args.password, PASSWORD_ENV),
            strict_ssl: args.strict_ssl.or(connection.strict_ssl).unwrap_or(true),
        },
        filestore: FilestoreConfig {
            server,
            container: pick(&args.container, target.container).unwrap_or_default(),
            container_description: pick(&args.container_description, target.container_description)
                .unwrap_or_default(),
            package: pick(&args.package, target.package).unwrap_or_default(),
            transport: pick(&args.transport, target.transport),
            language: Some(language),
        },
        synchronise: SynchroniseConfig {
            base_dir: base_dir.clone(),
            preserve_unselected: args.preserve_unselected || source.preserve_unselected,
            recalculate_index: args.recalculate_index || target.recalculate_index,
        },
        selection: SelectionConfig {
            base_dir,
            pattern: pick(&args.files, source.files).unwrap_or_else(|| "**".to_string()),
            include_dotfiles: args.include_dotfiles || source.include_dotfiles,
            git_diff_commit: pick(&args.git_diff_commit, source.git_diff_commit),
            git_diff_unstaged: args.git_diff_unstaged || source.git_diff_unstaged,
        },
    }
}

/// Flag value if given, otherwise the file value; blank strings count as absent.
fn pick(flag: &Option<String>, file: Option<String>) -> Option<String> {
    flag.clone()
        .filter(|v| !v.trim().is_empty())
        .or(file)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn secret(flag: &Option<String>, env_name: &str) -> String {
    flag.clone()
        .filter(|v| !v.is_empty())
        .or_else(|| std::env::var(env_name).ok())
        .unwrap_or_default()
}

/// Every rule a configuration must satisfy before any file or remote call is touched.
pub fn validate(config: &UploadConfig) -> Vec<String> {
    let mut problems = Vec::new();
    let target = &config.filestore;

    if config.connection.server.is_empty() {
        problems.push("Define the server URL.".to_string());
    }
    if config.selection.base_dir.as_os_str().is_empty() || config.selection.pattern.is_empty() {
        problems.push("Define both the base dir and files.".to_string());
    }
    if config.connection.user.is_empty() || config.connection.password.is_empty() {
        problems.push(format!(
            "Define both a username and password (or set {USER_ENV} and {PASSWORD_ENV})."
        ));
    }
    if target.package.is_empty() || target.container.is_empty() || target.container_description.is_empty() {
        problems.push(
            "Target not fully specified (check package, container and container description).".to_string(),
        );
    }
    // A namespace prefix such as /NS/ does not count towards the limit.
    let name = target.container.rsplit('/').next().unwrap_or_default();
    if name.chars().count() > MAX_CONTAINER_NAME {
        problems.push(format!(
            "Container name must not be longer than {MAX_CONTAINER_NAME} characters."
        ));
    }
    if !target.package.starts_with(['$', 'T']) && target.transport.is_none() {
        problems.push("You should supply a transport.".to_string());
    }

    problems
}
