use crate::core::quantity::selection::Selection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const SETTINGS_EXTENSION: &str = "toml";
/// Written for path properties that are not set; read back case-insensitively.
pub const UNASSIGNED: &str = "Unassigned";

pub const DEFAULT_EVALUATION_POINTS: u32 = 10;
pub const DEFAULT_MIN_DEGREES_INCREMENT: f64 = 2.5;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}", path = path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse settings file '{path}': {source}", path = path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Failed to write settings file '{path}': {source}", path = path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The on-disk form of a muscle optimizer setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SettingsDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "unassigned")]
    pub model: String,
    #[serde(default = "unassigned")]
    pub reference_model: String,
    #[serde(default)]
    pub muscle_optimizer: MuscleOptimizerSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MuscleOptimizerSection {
    #[serde(default = "enabled_by_default")]
    pub apply: bool,
    #[serde(default)]
    pub coordinates: Selection,
    #[serde(default)]
    pub muscles: Selection,
    #[serde(default = "default_evaluation_points")]
    pub n_evaluation_points: u32,
    #[serde(default = "default_min_degrees_increment")]
    pub min_degrees_increment: f64,
    #[serde(default = "unassigned")]
    pub output_model_file: String,
}

fn unassigned() -> String {
    UNASSIGNED.to_string()
}

fn enabled_by_default() -> bool {
    true
}

fn default_evaluation_points() -> u32 {
    DEFAULT_EVALUATION_POINTS
}

fn default_min_degrees_increment() -> f64 {
    DEFAULT_MIN_DEGREES_INCREMENT
}

impl Default for MuscleOptimizerSection {
    fn default() -> Self {
        Self {
            apply: true,
            coordinates: Selection::All,
            muscles: Selection::All,
            n_evaluation_points: DEFAULT_EVALUATION_POINTS,
            min_degrees_increment: DEFAULT_MIN_DEGREES_INCREMENT,
            output_model_file: unassigned(),
        }
    }
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self {
            name: String::new(),
            notes: String::new(),
            model: unassigned(),
            reference_model: unassigned(),
            muscle_optimizer: MuscleOptimizerSection::default(),
        }
    }
}

impl SettingsDocument {
    pub fn from_toml_str(path: &Path, content: &str) -> Result<Self, SettingsError> {
        toml::from_str(content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn read_from_path(path: &Path) -> Result<Self, SettingsError> {
        debug!("Loading settings document from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(path, &content)
    }

    pub fn to_toml_string(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes the document, appending the settings extension when the path lacks it.
    ///
    /// Returns the path actually written.
    pub fn write_to_path(&self, path: &Path) -> Result<PathBuf, SettingsError> {
        let target = with_settings_extension(path);
        let content = self.to_toml_string()?;
        std::fs::write(&target, content).map_err(|source| SettingsError::Write {
            path: target.clone(),
            source,
        })?;
        debug!("Settings document written to {:?}", target);
        Ok(target)
    }
}

pub fn with_settings_extension(path: &Path) -> PathBuf {
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SETTINGS_EXTENSION));
    if has_extension {
        return path.to_path_buf();
    }
    let mut file_name = path.as_os_str().to_os_string();
    file_name.push(".");
    file_name.push(SETTINGS_EXTENSION);
    PathBuf::from(file_name)
}

/// Interprets a stored path property; blank text and `Unassigned` mean "not set".
pub fn optional_path(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNASSIGNED) {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

pub fn path_property(path: Option<&Path>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => unassigned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SETUP: &str = r#"
name = "gait2392-optimized"
notes = "scaled subject"
model = "subject.osim"
reference-model = "Unassigned"

[muscle-optimizer]
apply = true
coordinates = "hip_flexion_r,knee_angle_r"
muscles = "ALL"
n-evaluation-points = 12
min-degrees-increment = 1.5
output-model-file = ""
"#;

    #[test]
    fn parses_a_complete_document() {
        let doc = SettingsDocument::from_toml_str(Path::new("setup.toml"), SETUP).unwrap();

        assert_eq!(doc.name, "gait2392-optimized");
        assert_eq!(
            doc.muscle_optimizer.coordinates,
            Selection::Subset(vec!["hip_flexion_r".into(), "knee_angle_r".into()])
        );
        assert_eq!(doc.muscle_optimizer.muscles, Selection::All);
        assert_eq!(doc.muscle_optimizer.n_evaluation_points, 12);
        assert_eq!(doc.muscle_optimizer.min_degrees_increment, 1.5);
        assert_eq!(optional_path(&doc.reference_model), None);
        assert_eq!(optional_path(&doc.muscle_optimizer.output_model_file), None);
        assert_eq!(optional_path(&doc.model), Some(PathBuf::from("subject.osim")));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let doc = SettingsDocument::from_toml_str(Path::new("s.toml"), "name = \"x\"").unwrap();
        assert_eq!(doc.muscle_optimizer, MuscleOptimizerSection::default());
        assert_eq!(doc.reference_model, UNASSIGNED);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = SettingsDocument::from_toml_str(
            Path::new("s.toml"),
            "[muscle-optimizer]\nn-evaluation-pts = 3",
        );
        assert!(matches!(result, Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn unassigned_is_recognised_in_any_case() {
        assert_eq!(optional_path("unassigned"), None);
        assert_eq!(optional_path("  UNASSIGNED "), None);
        assert_eq!(path_property(None), UNASSIGNED);
    }

    #[test]
    fn write_appends_missing_extension_and_reads_back() {
        let dir = tempdir().unwrap();
        let mut doc = SettingsDocument::default();
        doc.name = "model-optimized".to_string();
        doc.muscle_optimizer.muscles = Selection::None;

        let written = doc.write_to_path(&dir.path().join("setup")).unwrap();

        assert_eq!(written, dir.path().join("setup.toml"));
        let back = SettingsDocument::read_from_path(&written).unwrap();
        assert_eq!(back, doc);
        assert!(fs::read_to_string(&written).unwrap().contains("muscles = \"NONE\""));
    }

    #[test]
    fn existing_extension_is_kept_regardless_of_case() {
        assert_eq!(
            with_settings_extension(Path::new("dir/Setup.TOML")),
            PathBuf::from("dir/Setup.TOML")
        );
        assert_eq!(
            with_settings_extension(Path::new("setup.xml")),
            PathBuf::from("setup.xml.toml")
        );
    }

    #[test]
    fn read_from_missing_file_reports_read_error() {
        let dir = tempdir().unwrap();
        let result = SettingsDocument::read_from_path(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(SettingsError::Read { .. })));
    }
}
