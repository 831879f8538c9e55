use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::RunnerConfig;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

const ENV_PREFIX: &str = "TIDY_RUNNER_";
const REPO_CONFIG_NAMES: [&str; 4] = [
    "tidy-runner.toml",
    "tidy-runner.json",
    "tidy-runner.yaml",
    "tidy-runner.yml",
];

/// Serialization format for `config show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

/// Values given on the command line; unset fields leave lower layers alone
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    pub tool: ToolOverrides,
    pub paths: PathsOverrides,
    pub execution: ExecutionOverrides,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PathsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore: Option<Vec<PathBuf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_aware_ignore: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_symlinks: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl RunnerConfig {
    /// Load the merged configuration.
    ///
    /// `custom_config` replaces the repository config files; unlike those it must exist.
    pub fn load(custom_config: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let figment = Self::figment(custom_config, overrides)?;
        figment
            .extract()
            .context("Invalid tidy-runner configuration")
    }

    /// The provider stack, exposed for callers that need raw values
    pub fn figment(custom_config: Option<&Path>, overrides: &ConfigOverrides) -> Result<Figment> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(custom_path) = custom_config {
            if !custom_path.is_file() {
                bail!("Config file {} not found", custom_path.display());
            }
            tracing::debug!("Using config file {}", custom_path.display());
            figment = merge_file(figment, custom_path)?;
        } else {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            for name in REPO_CONFIG_NAMES {
                let path = cwd.join(name);
                if path.is_file() {
                    tracing::debug!("Using config file {}", path.display());
                    figment = merge_file(figment, &path)?;
                }
            }
        }

        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides)))
    }

    /// Render this configuration in the requested format
    pub fn export(&self, format: ConfigFormat) -> Result<String> {
        let rendered = match format {
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Yaml => serde_yml::to_string(self)?,
        };
        Ok(rendered)
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let figment = match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
        _ => bail!(
            "Unsupported config file {}: expected .toml, .json, .yaml or .yml",
            path.display()
        ),
    };
    Ok(figment)
}
