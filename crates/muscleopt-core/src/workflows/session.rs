use crate::core::model::{ModelCatalog, ModelHandle};
use crate::core::quantity::QuantityKind;
use crate::core::quantity::selection::Selection;
use crate::engine::config::{ConfigError, NumericField, OptimizerSettings, ToolConfiguration};
use crate::engine::error::EngineError;
use crate::engine::execution::{ExecutionController, ExecutionState, RunHandle};
use crate::engine::filter::{FilterController, FilterError};
use crate::engine::lock;
use crate::engine::optimizer::ModelOptimizer;
use crate::engine::progress::ProgressReporter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// An editing session over one model.
///
/// Every selection change made through the filters is written into the configuration,
/// which marks it modified and makes the next [`execute`](Self::execute) possible.
pub struct OptimizeSession<C: ModelCatalog, O: ModelOptimizer> {
    catalog: C,
    configuration: Arc<Mutex<ToolConfiguration>>,
    coordinates: FilterController,
    muscles: FilterController,
    executor: ExecutionController<O>,
}

impl<C: ModelCatalog, O: ModelOptimizer> OptimizeSession<C, O> {
    pub fn new(catalog: C, optimizer: O, reporter: ProgressReporter) -> Self {
        let settings = OptimizerSettings::for_model(catalog.model_name());
        let configuration = Arc::new(Mutex::new(ToolConfiguration::new(settings)));
        let coordinates = Self::bind_filter(&catalog, QuantityKind::Coordinate, &configuration);
        let muscles = Self::bind_filter(&catalog, QuantityKind::Muscle, &configuration);
        let executor =
            ExecutionController::with_progress(optimizer, Arc::clone(&configuration), reporter);

        info!(
            model = catalog.model_name(),
            coordinates = coordinates.selection().quantities().len(),
            muscles = muscles.selection().quantities().len(),
            "Optimization session created."
        );
        Self {
            catalog,
            configuration,
            coordinates,
            muscles,
            executor,
        }
    }

    fn bind_filter(
        catalog: &C,
        kind: QuantityKind,
        configuration: &Arc<Mutex<ToolConfiguration>>,
    ) -> FilterController {
        let mut filter = FilterController::new(catalog.registry(kind));
        let initial = lock(configuration).settings().selection(kind).clone();
        filter.selection_mut().mark_selected(&initial);

        let sink = Arc::clone(configuration);
        filter.selection_mut().subscribe(move |change| {
            lock(&sink).set_selection(change.kind, change.selection.clone());
        });
        filter
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Locks the configuration.
    ///
    /// Filter and selection methods of the session must not be called while the guard
    /// is held.
    pub fn configuration(&self) -> MutexGuard<'_, ToolConfiguration> {
        lock(&self.configuration)
    }

    pub fn configuration_handle(&self) -> Arc<Mutex<ToolConfiguration>> {
        Arc::clone(&self.configuration)
    }

    pub fn filter(&self, kind: QuantityKind) -> &FilterController {
        match kind {
            QuantityKind::Coordinate => &self.coordinates,
            QuantityKind::Muscle => &self.muscles,
        }
    }

    fn parts(&mut self, kind: QuantityKind) -> (&mut FilterController, &C) {
        let filter = match kind {
            QuantityKind::Coordinate => &mut self.coordinates,
            QuantityKind::Muscle => &mut self.muscles,
        };
        (filter, &self.catalog)
    }

    pub fn set_pattern(&mut self, kind: QuantityKind, text: &str) -> Result<(), FilterError> {
        self.parts(kind).0.set_pattern_text(text)
    }

    pub fn show_all(&mut self, kind: QuantityKind) {
        self.parts(kind).0.show_all();
    }

    pub fn use_pattern_mode(&mut self, kind: QuantityKind) {
        self.parts(kind).0.use_pattern_mode();
    }

    pub fn use_group_mode(&mut self, kind: QuantityKind) -> Result<(), FilterError> {
        let (filter, catalog) = self.parts(kind);
        filter.use_group_mode(Some(catalog))
    }

    pub fn select_group(&mut self, kind: QuantityKind, group: &str) -> Result<(), FilterError> {
        let (filter, catalog) = self.parts(kind);
        filter.select_group(catalog, group)
    }

    pub fn select_shown(&mut self, kind: QuantityKind, value: bool) -> usize {
        self.parts(kind).0.selection_mut().select_shown(value)
    }

    pub fn toggle(&mut self, kind: QuantityKind, name: &str, value: bool) -> bool {
        self.parts(kind).0.selection_mut().toggle_one(name, value)
    }

    pub fn apply_numeric_input(
        &self,
        field: NumericField,
        input: &str,
    ) -> Result<bool, ConfigError> {
        lock(&self.configuration).apply_numeric_input(field, input)
    }

    /// Replaces the configuration from a settings file and re-marks both selections.
    pub fn load_settings(&mut self, path: &Path) -> Result<(), EngineError> {
        let (coordinates, muscles) = {
            let mut configuration = lock(&self.configuration);
            configuration.load_settings(path)?;
            let settings = configuration.settings();
            (settings.coordinates.clone(), settings.muscles.clone())
        };
        self.coordinates.selection_mut().mark_selected(&coordinates);
        self.muscles.selection_mut().mark_selected(&muscles);
        for kind in QuantityKind::ALL {
            self.store_resolved_selection(kind);
        }
        debug!(
            coordinates = self.coordinates.selection().count_selected(),
            muscles = self.muscles.selection().count_selected(),
            "Selections synchronized with loaded settings."
        );
        Ok(())
    }

    /// Writes the selection as marked on the registry back into the configuration.
    ///
    /// Names the model lacks are dropped this way even when no flag changed. An empty
    /// registry keeps the configured value.
    fn store_resolved_selection(&self, kind: QuantityKind) {
        let set = self.filter(kind).selection();
        if set.quantities().is_empty() {
            return;
        }
        lock(&self.configuration).set_selection(kind, set.selection());
    }

    pub fn save_settings(&self, path: &Path) -> Result<PathBuf, EngineError> {
        lock(&self.configuration).save_settings(path)
    }

    /// Switches to a changed model.
    ///
    /// Selected names that still exist stay selected; a configured selection of
    /// everything selects every name of the new model.
    pub fn refresh_model(&mut self, catalog: C) {
        let previous: Vec<(QuantityKind, Selection)> = {
            let configuration = lock(&self.configuration);
            QuantityKind::ALL
                .iter()
                .map(|kind| (*kind, configuration.settings().selection(*kind).clone()))
                .collect()
        };
        self.catalog = catalog;

        for (kind, selection) in previous {
            let registry = self.catalog.registry(kind);
            let (filter, catalog) = self.parts(kind);
            filter.refresh(registry, Some(catalog));
            if selection == Selection::All {
                filter.selection_mut().mark_selected(&Selection::All);
            }
        }
        info!(model = self.catalog.model_name(), "Session refreshed for the current model.");
    }

    pub fn execute(&self) -> Result<Option<RunHandle>, EngineError> {
        self.executor.execute()
    }

    pub fn request_cancel(&self) -> bool {
        self.executor.request_cancel()
    }

    pub fn dispose(&self) -> bool {
        self.executor.dispose()
    }

    pub fn state(&self) -> ExecutionState {
        self.executor.state()
    }

    pub fn published(&self) -> Option<Arc<ModelHandle>> {
        self.executor.published()
    }

    pub fn executor(&self) -> &ExecutionController<O> {
        &self.executor
    }
}
