use super::ModelCatalog;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read model manifest '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse model manifest: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid model manifest: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestGroup {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// A model description on disk: its name, the names it exposes and its muscle groups.
///
/// ```toml
/// name = "gait2392"
/// path = "gait2392.osim"
/// coordinates = ["hip_flexion_r", "knee_angle_r"]
/// muscles = ["glut_med1_r", "soleus_r"]
///
/// [[group]]
/// name = "R_hip_abd"
/// members = ["glut_med1_r"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelManifest {
    pub name: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub coordinates: Vec<String>,
    #[serde(default)]
    pub muscles: Vec<String>,
    #[serde(default, rename = "group")]
    pub groups: Vec<ManifestGroup>,
}

impl ModelManifest {
    pub fn from_toml_str(content: &str) -> Result<Self, ManifestError> {
        let manifest: Self = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reads a manifest and resolves a relative `path` against the manifest's directory.
    pub fn read_from_path(path: &Path) -> Result<Self, ManifestError> {
        debug!("Loading model manifest from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest = Self::from_toml_str(&content)?;
        if let (Some(model_path), Some(base)) = (manifest.path.as_mut(), path.parent()) {
            if model_path.is_relative() {
                *model_path = base.join(&*model_path);
            }
        }
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), ManifestError> {
        if self.name.trim().is_empty() {
            return Err(ManifestError::Invalid("model name is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for group in &self.groups {
            if !seen.insert(group.name.as_str()) {
                return Err(ManifestError::Invalid(format!(
                    "group '{}' is defined more than once",
                    group.name
                )));
            }
        }
        Ok(())
    }
}

impl ModelCatalog for ModelManifest {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn coordinate_names(&self) -> Vec<String> {
        self.coordinates.clone()
    }

    fn muscle_names(&self) -> Vec<String> {
        self.muscles.clone()
    }

    fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name.clone()).collect()
    }

    fn group_members(&self, group: &str) -> Option<Vec<String>> {
        self.groups
            .iter()
            .find(|g| g.name == group)
            .map(|g| g.members.clone())
    }
}
