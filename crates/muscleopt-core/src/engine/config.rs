use super::error::EngineError;
use crate::core::events::{EventChannel, ListenerId};
use crate::core::io::settings::{
    self, DEFAULT_EVALUATION_POINTS, DEFAULT_MIN_DEGREES_INCREMENT, MuscleOptimizerSection,
    SettingsDocument,
};
use crate::core::quantity::QuantityKind;
use crate::core::quantity::selection::Selection;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// What part of the configuration a change touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    AllDataChanged,
    SubjectDataChanged,
    ModelOptimizerDataChanged,
    ReferenceModelChanged,
    ExecutionStateChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    EvaluationPoints,
    MinDegreesIncrement,
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericField::EvaluationPoints => write!(f, "number of evaluation points"),
            NumericField::MinDegreesIncrement => write!(f, "minimum degrees increment"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value '{input}' for {field}; keeping {retained}")]
    InvalidNumericInput {
        field: NumericField,
        input: String,
        retained: String,
    },
}

/// Every setting of the muscle optimizer tool.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSettings {
    pub name: String,
    pub notes: String,
    pub model_path: Option<PathBuf>,
    pub reference_model: Option<PathBuf>,
    pub output_model: Option<PathBuf>,
    pub enabled: bool,
    pub coordinates: Selection,
    pub muscles: Selection,
    pub evaluation_points: u32,
    pub min_degrees_increment: f64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            notes: String::new(),
            model_path: None,
            reference_model: None,
            output_model: None,
            enabled: true,
            coordinates: Selection::All,
            muscles: Selection::All,
            evaluation_points: DEFAULT_EVALUATION_POINTS,
            min_degrees_increment: DEFAULT_MIN_DEGREES_INCREMENT,
        }
    }
}

impl OptimizerSettings {
    /// Default settings for a model; the output is named `<model>-optimized`.
    pub fn for_model(model_name: &str) -> Self {
        Self {
            name: format!("{model_name}-optimized"),
            ..Self::default()
        }
    }

    pub fn selection(&self, kind: QuantityKind) -> &Selection {
        match kind {
            QuantityKind::Coordinate => &self.coordinates,
            QuantityKind::Muscle => &self.muscles,
        }
    }

    /// Converts a settings document, resolving relative model paths against `base_dir`.
    pub fn from_document(doc: SettingsDocument, base_dir: Option<&Path>) -> Self {
        let resolve = |value: &str| {
            settings::optional_path(value).map(|path| match base_dir {
                Some(base) if path.is_relative() => base.join(path),
                _ => path,
            })
        };
        let section = doc.muscle_optimizer;

        let evaluation_points = if section.n_evaluation_points == 0 {
            warn!(
                "Settings request 0 evaluation points; using {}.",
                DEFAULT_EVALUATION_POINTS
            );
            DEFAULT_EVALUATION_POINTS
        } else {
            section.n_evaluation_points
        };
        let min_degrees_increment = if section.min_degrees_increment.is_finite() {
            section.min_degrees_increment
        } else {
            warn!(
                "Settings request a non-finite minimum degrees increment; using {}.",
                DEFAULT_MIN_DEGREES_INCREMENT
            );
            DEFAULT_MIN_DEGREES_INCREMENT
        };

        Self {
            name: doc.name,
            notes: doc.notes,
            model_path: resolve(&doc.model),
            reference_model: resolve(&doc.reference_model),
            output_model: settings::optional_path(&section.output_model_file),
            enabled: section.apply,
            coordinates: section.coordinates,
            muscles: section.muscles,
            evaluation_points,
            min_degrees_increment,
        }
    }

    pub fn to_document(&self) -> SettingsDocument {
        SettingsDocument {
            name: self.name.clone(),
            notes: self.notes.clone(),
            model: settings::path_property(self.model_path.as_deref()),
            reference_model: settings::path_property(self.reference_model.as_deref()),
            muscle_optimizer: MuscleOptimizerSection {
                apply: self.enabled,
                coordinates: self.coordinates.clone(),
                muscles: self.muscles.clone(),
                n_evaluation_points: self.evaluation_points,
                min_degrees_increment: self.min_degrees_increment,
                output_model_file: settings::path_property(self.output_model.as_deref()),
            },
        }
    }
}

/// An owned copy of the settings taken when a run is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSnapshot {
    pub settings: OptimizerSettings,
    pub revision: u64,
}

/// The live configuration of one editing session.
///
/// Every effective change bumps the revision, marks the configuration modified and
/// emits one [`ConfigChange`]. Setting a field to the value it already has does nothing.
#[derive(Debug)]
pub struct ToolConfiguration {
    settings: OptimizerSettings,
    dirty: bool,
    revision: u64,
    events: EventChannel<ConfigChange>,
}

impl ToolConfiguration {
    /// A fresh configuration is modified, so a first run is always possible.
    pub fn new(settings: OptimizerSettings) -> Self {
        Self {
            settings,
            dirty: true,
            revision: 0,
            events: EventChannel::new(),
        }
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&ConfigChange) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.settings.name == name {
            return false;
        }
        self.settings.name = name;
        self.changed(ConfigChange::SubjectDataChanged)
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> bool {
        let notes = notes.into();
        if self.settings.notes == notes {
            return false;
        }
        self.settings.notes = notes;
        self.changed(ConfigChange::SubjectDataChanged)
    }

    pub fn set_model_path(&mut self, path: Option<PathBuf>) -> bool {
        if self.settings.model_path == path {
            return false;
        }
        self.settings.model_path = path;
        self.changed(ConfigChange::SubjectDataChanged)
    }

    pub fn set_reference_model(&mut self, path: Option<PathBuf>) -> bool {
        if self.settings.reference_model == path {
            return false;
        }
        self.settings.reference_model = path;
        self.changed(ConfigChange::ReferenceModelChanged)
    }

    pub fn set_output_model(&mut self, path: Option<PathBuf>) -> bool {
        if self.settings.output_model == path {
            return false;
        }
        self.settings.output_model = path;
        self.changed(ConfigChange::ModelOptimizerDataChanged)
    }

    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.settings.enabled == enabled {
            return false;
        }
        self.settings.enabled = enabled;
        self.changed(ConfigChange::ModelOptimizerDataChanged)
    }

    pub fn set_selection(&mut self, kind: QuantityKind, selection: Selection) -> bool {
        let slot = match kind {
            QuantityKind::Coordinate => &mut self.settings.coordinates,
            QuantityKind::Muscle => &mut self.settings.muscles,
        };
        if *slot == selection {
            return false;
        }
        debug!(%kind, selection = %selection, "Configured {} changed.", kind.plural());
        *slot = selection;
        self.changed(ConfigChange::ModelOptimizerDataChanged)
    }

    /// Zero is not a usable number of evaluation points and is ignored.
    pub fn set_evaluation_points(&mut self, points: u32) -> bool {
        if points == 0 {
            warn!("Ignoring request for 0 evaluation points.");
            return false;
        }
        if self.settings.evaluation_points == points {
            return false;
        }
        self.settings.evaluation_points = points;
        self.changed(ConfigChange::ModelOptimizerDataChanged)
    }

    /// Non-finite increments are ignored.
    pub fn set_min_degrees_increment(&mut self, degrees: f64) -> bool {
        if !degrees.is_finite() {
            warn!("Ignoring non-finite minimum degrees increment {}.", degrees);
            return false;
        }
        if self.settings.min_degrees_increment == degrees {
            return false;
        }
        self.settings.min_degrees_increment = degrees;
        self.changed(ConfigChange::ModelOptimizerDataChanged)
    }

    /// Parses user text for a numeric field and applies it.
    ///
    /// Surrounding whitespace and `,` grouping separators are accepted. On rejection the
    /// configuration is left untouched and the error carries the value still in effect.
    pub fn apply_numeric_input(
        &mut self,
        field: NumericField,
        input: &str,
    ) -> Result<bool, ConfigError> {
        let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
        let parsed = cleaned.parse::<f64>().ok().filter(|value| value.is_finite());

        match field {
            NumericField::EvaluationPoints => {
                let points = parsed
                    .filter(|v| v.fract() == 0.0 && *v >= 1.0 && *v <= f64::from(u32::MAX))
                    .map(|v| v as u32)
                    .ok_or_else(|| self.reject(field, input))?;
                Ok(self.set_evaluation_points(points))
            }
            NumericField::MinDegreesIncrement => {
                let degrees = parsed.ok_or_else(|| self.reject(field, input))?;
                Ok(self.set_min_degrees_increment(degrees))
            }
        }
    }

    pub fn snapshot(&self) -> ToolSnapshot {
        ToolSnapshot {
            settings: self.settings.clone(),
            revision: self.revision,
        }
    }

    /// Replaces the whole configuration from a settings file.
    ///
    /// On failure nothing changes. A document without a name keeps the current one.
    pub fn load_settings(&mut self, path: &Path) -> Result<(), EngineError> {
        let doc = SettingsDocument::read_from_path(path).map_err(EngineError::SettingsLoad)?;
        let mut settings = OptimizerSettings::from_document(doc, path.parent());
        if settings.name.trim().is_empty() {
            settings.name = self.settings.name.clone();
        }
        info!("Loaded settings from {:?}", path);
        self.settings = settings;
        self.changed(ConfigChange::AllDataChanged);
        Ok(())
    }

    /// Writes the configuration and returns the path written.
    pub fn save_settings(&self, path: &Path) -> Result<PathBuf, EngineError> {
        let written = self
            .settings
            .to_document()
            .write_to_path(path)
            .map_err(EngineError::SettingsSave)?;
        info!("Saved settings to {:?}", written);
        Ok(written)
    }

    /// Clears the modified flag if nothing changed since the snapshot at `revision`.
    pub(crate) fn mark_executed(&mut self, revision: u64) -> bool {
        if self.revision != revision {
            return false;
        }
        self.dirty = false;
        true
    }

    pub(crate) fn emit(&self, change: ConfigChange) {
        self.events.emit(&change);
    }

    fn changed(&mut self, change: ConfigChange) -> bool {
        self.dirty = true;
        self.revision += 1;
        self.events.emit(&change);
        true
    }

    fn reject(&self, field: NumericField, input: &str) -> ConfigError {
        let retained = match field {
            NumericField::EvaluationPoints => self.settings.evaluation_points.to_string(),
            NumericField::MinDegreesIncrement => self.settings.min_degrees_increment.to_string(),
        };
        warn!(%field, input, %retained, "Rejected numeric input.");
        ConfigError::InvalidNumericInput {
            field,
            input: input.to_string(),
            retained,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn clean_configuration() -> ToolConfiguration {
        let mut config = ToolConfiguration::new(OptimizerSettings::for_model("gait2392"));
        config.mark_executed(config.revision());
        config
    }

    fn recorded(config: &mut ToolConfiguration) -> Arc<Mutex<Vec<ConfigChange>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        config.subscribe(move |change| sink.lock().unwrap().push(*change));
        seen
    }

    #[test]
    fn defaults_follow_the_model_name() {
        let config = ToolConfiguration::new(OptimizerSettings::for_model("gait2392"));
        let settings = config.settings();
        assert_eq!(settings.name, "gait2392-optimized");
        assert_eq!(settings.evaluation_points, 10);
        assert_eq!(settings.min_degrees_increment, 2.5);
        assert!(settings.enabled);
        assert_eq!(settings.muscles, Selection::All);
        assert!(config.is_dirty());
    }

    #[test]
    fn setting_an_equal_value_is_a_no_op() {
        let mut config = clean_configuration();
        let seen = recorded(&mut config);

        assert!(!config.set_evaluation_points(10));
        assert!(!config.set_enabled(true));
        assert!(!config.set_selection(QuantityKind::Muscle, Selection::All));

        assert!(!config.is_dirty());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn effective_changes_mark_dirty_and_emit_typed_events() {
        let mut config = clean_configuration();
        let seen = recorded(&mut config);

        config.set_reference_model(Some(PathBuf::from("generic.osim")));
        config.set_notes("subject 3");
        config.set_selection(QuantityKind::Coordinate, Selection::subset(["knee_angle_r"]));

        assert!(config.is_dirty());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ConfigChange::ReferenceModelChanged,
                ConfigChange::SubjectDataChanged,
                ConfigChange::ModelOptimizerDataChanged,
            ]
        );
    }

    #[test]
    fn numeric_input_accepts_grouping_and_whitespace() {
        let mut config = clean_configuration();
        assert_eq!(
            config.apply_numeric_input(NumericField::EvaluationPoints, " 1,000 "),
            Ok(true)
        );
        assert_eq!(config.settings().evaluation_points, 1000);
        assert_eq!(
            config.apply_numeric_input(NumericField::MinDegreesIncrement, "0.5"),
            Ok(true)
        );
        assert_eq!(config.settings().min_degrees_increment, 0.5);
    }

    #[test]
    fn invalid_numeric_input_is_rejected_without_dirtying() {
        let mut config = clean_configuration();

        for input in ["abc", "", "2.5", "0", "-3", "NaN", "inf"] {
            let result = config.apply_numeric_input(NumericField::EvaluationPoints, input);
            assert_eq!(
                result,
                Err(ConfigError::InvalidNumericInput {
                    field: NumericField::EvaluationPoints,
                    input: input.to_string(),
                    retained: "10".to_string(),
                }),
                "input '{input}' should have been rejected"
            );
        }
        assert!(config
            .apply_numeric_input(NumericField::MinDegreesIncrement, "1e400")
            .is_err());

        assert!(!config.is_dirty());
        assert_eq!(config.settings().evaluation_points, 10);
        assert_eq!(config.settings().min_degrees_increment, 2.5);
    }

    #[test]
    fn mark_executed_only_clears_for_the_current_revision() {
        let mut config = ToolConfiguration::new(OptimizerSettings::default());
        let snapshot = config.snapshot();
        config.set_evaluation_points(20);

        assert!(!config.mark_executed(snapshot.revision));
        assert!(config.is_dirty());
        assert!(config.mark_executed(config.revision()));
        assert!(!config.is_dirty());
    }

    #[test]
    fn save_then_load_restores_the_aggregate_and_marks_dirty() {
        let dir = tempdir().unwrap();
        let mut original = clean_configuration();
        original.set_reference_model(Some(dir.path().join("generic.osim")));
        original.set_selection(
            QuantityKind::Muscle,
            Selection::subset(["soleus_r", "gaslat_r"]),
        );
        original.set_evaluation_points(7);
        let written = original.save_settings(&dir.path().join("setup")).unwrap();

        let mut loaded = clean_configuration();
        let seen = recorded(&mut loaded);
        loaded.load_settings(&written).unwrap();

        assert_eq!(loaded.settings(), original.settings());
        assert!(loaded.is_dirty());
        assert_eq!(*seen.lock().unwrap(), vec![ConfigChange::AllDataChanged]);
    }

    #[test]
    fn load_resolves_relative_model_paths_against_the_settings_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("setup.toml");
        fs::write(&path, "reference-model = \"ref/generic.osim\"\n").unwrap();

        let mut config = clean_configuration();
        config.load_settings(&path).unwrap();

        assert_eq!(
            config.settings().reference_model,
            Some(dir.path().join("ref/generic.osim"))
        );
        assert_eq!(config.settings().name, "gait2392-optimized");
    }

    #[test]
    fn failed_load_leaves_configuration_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[muscle-optimizer\n").unwrap();

        let mut config = clean_configuration();
        let before = config.settings().clone();
        let result = config.load_settings(&path);

        assert!(matches!(result, Err(EngineError::SettingsLoad(_))));
        assert_eq!(config.settings(), &before);
        assert!(!config.is_dirty());
    }
}
