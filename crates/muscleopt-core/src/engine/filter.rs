use crate::core::model::ModelCatalog;
use crate::core::quantity::QuantityKind;
use crate::core::quantity::pattern::{self, CompiledPattern, MATCH_ANYTHING, PatternError};
use crate::core::quantity::registry::NameRegistry;
use crate::core::quantity::selection::Selection;
use crate::core::quantity::set::SelectionSet;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    Pattern,
    GroupMembership,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),

    #[error("The model defines no groups to filter {} by", kind.plural())]
    NoGroupsAvailable { kind: QuantityKind },

    #[error("The model has no group named '{0}'")]
    UnknownGroup(String),
}

/// Drives the `shown` flags of one selection set from either a text pattern or a
/// model group.
///
/// Both modes keep their own state: the pattern text survives a detour through group
/// mode and the chosen group survives a detour through pattern mode.
#[derive(Debug)]
pub struct FilterController {
    mode: FilterMode,
    pattern_text: String,
    compiled: CompiledPattern,
    group_name: Option<String>,
    selection: SelectionSet,
}

impl FilterController {
    pub fn new(registry: NameRegistry) -> Self {
        Self {
            mode: FilterMode::Pattern,
            pattern_text: MATCH_ANYTHING.to_string(),
            compiled: CompiledPattern::match_anything(),
            group_name: None,
            selection: SelectionSet::new(registry),
        }
    }

    pub fn kind(&self) -> QuantityKind {
        self.selection.kind()
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn pattern_text(&self) -> &str {
        &self.pattern_text
    }

    pub fn compiled_pattern(&self) -> &CompiledPattern {
        &self.compiled
    }

    pub fn group_name(&self) -> Option<&str> {
        self.group_name.as_deref()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    /// Recompiles the pattern from user text.
    ///
    /// Invalid text is rejected and the last good pattern stays in effect. The new
    /// pattern only drives visibility while the controller is in pattern mode.
    pub fn set_pattern_text(&mut self, text: &str) -> Result<(), FilterError> {
        let compiled = pattern::compile(text).inspect_err(|e| {
            debug!(kind = %self.kind(), "Keeping previous filter: {}", e);
        })?;
        self.pattern_text = text.to_string();
        self.compiled = compiled;
        if self.mode == FilterMode::Pattern {
            self.apply_pattern();
        }
        Ok(())
    }

    pub fn show_all(&mut self) {
        self.pattern_text = MATCH_ANYTHING.to_string();
        self.compiled = CompiledPattern::match_anything();
        if self.mode == FilterMode::Pattern {
            self.apply_pattern();
        }
    }

    pub fn use_pattern_mode(&mut self) {
        self.mode = FilterMode::Pattern;
        self.apply_pattern();
    }

    /// Switches to group filtering.
    ///
    /// Without groups the controller falls back to pattern mode and reports
    /// [`FilterError::NoGroupsAvailable`]. Otherwise the previously chosen group is
    /// applied again if the model still has it, else the first group.
    pub fn use_group_mode(
        &mut self,
        catalog: Option<&dyn ModelCatalog>,
    ) -> Result<(), FilterError> {
        let groups = catalog.map(|c| c.group_names()).unwrap_or_default();
        let (Some(catalog), Some(first)) = (catalog, groups.first()) else {
            info!(kind = %self.kind(), "No groups available; staying in pattern mode.");
            self.use_pattern_mode();
            return Err(FilterError::NoGroupsAvailable { kind: self.kind() });
        };

        let group = match &self.group_name {
            Some(previous) if groups.contains(previous) => previous.clone(),
            _ => first.clone(),
        };
        self.select_group(catalog, &group)
    }

    /// Shows exactly the members of `group` and makes them the selection.
    pub fn select_group(
        &mut self,
        catalog: &dyn ModelCatalog,
        group: &str,
    ) -> Result<(), FilterError> {
        let members = catalog
            .group_members(group)
            .ok_or_else(|| FilterError::UnknownGroup(group.to_string()))?;
        let matcher = CompiledPattern::exact_members(&members)?;

        self.mode = FilterMode::GroupMembership;
        self.group_name = Some(group.to_string());
        self.selection.restrict_shown_by(&matcher);
        self.selection.mark_selected(&Selection::subset(members));
        debug!(
            kind = %self.kind(),
            group,
            shown = self.selection.count_shown(),
            "Group filter applied."
        );
        Ok(())
    }

    /// Moves to a new registry and re-applies the active filter to it.
    ///
    /// Selected flags carry over by name. If the active group disappeared the
    /// controller falls back to pattern mode.
    pub fn refresh(&mut self, registry: NameRegistry, catalog: Option<&dyn ModelCatalog>) {
        self.selection.refresh(registry);
        if self.mode == FilterMode::Pattern {
            self.apply_pattern();
            return;
        }

        let members = catalog
            .zip(self.group_name.as_deref())
            .and_then(|(c, g)| c.group_members(g));
        match members.map(|m| CompiledPattern::exact_members(&m)) {
            Some(Ok(matcher)) => self.selection.restrict_shown_by(&matcher),
            _ => {
                warn!(
                    kind = %self.kind(),
                    group = ?self.group_name,
                    "Active group is no longer available; falling back to pattern filtering."
                );
                self.use_pattern_mode();
            }
        }
    }

    fn apply_pattern(&mut self) {
        if self.compiled.is_match_anything() {
            self.selection.show_all();
        } else {
            self.selection.restrict_shown_by(&self.compiled);
        }
    }
}
