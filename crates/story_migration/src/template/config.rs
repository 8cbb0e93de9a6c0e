//! Template loader configuration.

use super::{TemplateError, TemplateResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where templates live and where their assets are served from.
///
/// Read from a JSON file such as:
///
/// ```json
/// {
///   "template_dir": "/srv/templates",
///   "image_base_url": "https://cdn.example.com/templates/",
///   "names": ["kitchen-makeover", "laptop-buying-guide"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Directory holding one `<name>.json` file per template.
    pub template_dir: PathBuf,
    /// CDN base URL substituted for the asset placeholder.
    pub image_base_url: String,
    /// Templates to load, in order. Empty means every `*.json` in
    /// `template_dir`, sorted by name.
    #[serde(default)]
    pub names: Vec<String>,
}

impl TemplateConfig {
    pub fn new(template_dir: impl Into<PathBuf>, image_base_url: impl Into<String>) -> Self {
        Self {
            template_dir: template_dir.into(),
            image_base_url: image_base_url.into(),
            names: Vec::new(),
        }
    }

    /// Reads and validates a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> TemplateResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|err| {
            TemplateError::InvalidConfig(format!("`{}`: {err}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects an empty base URL and names that are blank or escape the
    /// template directory.
    pub fn validate(&self) -> TemplateResult<()> {
        if self.image_base_url.trim().is_empty() {
            return Err(TemplateError::InvalidConfig(
                "image_base_url cannot be empty".to_string(),
            ));
        }
        for name in &self.names {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(TemplateError::InvalidConfig(
                    "template names cannot be empty".to_string(),
                ));
            }
            if trimmed.contains(['/', '\\']) || trimmed.contains("..") {
                return Err(TemplateError::InvalidConfig(format!(
                    "template name `{trimmed}` must be a plain file stem"
                )));
            }
        }
        Ok(())
    }

    /// Base URL with exactly one trailing slash.
    pub fn normalized_base_url(&self) -> String {
        format!("{}/", self.image_base_url.trim().trim_end_matches('/'))
    }

    /// Template path for `name`.
    pub fn template_path(&self, name: &str) -> PathBuf {
        self.template_dir.join(format!("{}.json", name.trim()))
    }
}
