use crate::detect::UnresolvedReceivers;
use crate::level::LintLevel;
use crate::rewrite::DEFAULT_NAMESPACE;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CastMigrateConfig {
    #[serde(default)]
    pub check: CheckConfig,

    #[serde(default)]
    pub detector: DetectorConfig,

    #[serde(default)]
    pub files: FilesConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    #[serde(default)]
    pub level: LintLevel,

    /// Qualifier injected in front of every rewritten call.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            level: LintLevel::default(),
            namespace: default_namespace(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorConfig {
    #[serde(default)]
    pub unresolved_receivers: UnresolvedReceivers,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names skipped while walking input directories.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude: default_exclude(),
        }
    }
}

impl FilesConfig {
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known == ext))
    }

    pub fn is_excluded_dir(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|name| self.exclude.iter().any(|skip| skip == name))
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_extensions() -> Vec<String> {
    ["cpp", "cc", "cxx", "c++", "h", "hh", "hpp", "hxx", "inc"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_exclude() -> Vec<String> {
    [".git", "build", "target"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub const DEFAULT_CONFIG_FILE_NAME: &str = "cast-migrate.toml";

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut cur = Some(start_dir);
    while let Some(dir) = cur {
        let candidate = dir.join(DEFAULT_CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        cur = dir.parent();
    }
    None
}

pub fn load_config_file(path: &Path) -> Result<CastMigrateConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let cfg: CastMigrateConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(cfg)
}

pub fn load_config(
    explicit_path: Option<&Path>,
    start_dir: &Path,
) -> Result<Option<(PathBuf, CastMigrateConfig)>> {
    if let Some(p) = explicit_path {
        let cfg = load_config_file(p)?;
        return Ok(Some((p.to_path_buf(), cfg)));
    }

    let Some(p) = find_config_file(start_dir) else {
        return Ok(None);
    };
    let cfg = load_config_file(&p)?;
    tracing::debug!(path = %p.display(), "loaded configuration");
    Ok(Some((p, cfg)))
}
