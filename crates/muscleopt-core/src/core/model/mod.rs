//! # Model Module
//!
//! The read-only view of a biomechanical model that the rest of the crate needs:
//! ordered coordinate and muscle names, plus named groups of muscles.
//!
//! - [`ModelCatalog`] - The collaborator trait enumerating names, groups and members
//! - [`ModelHandle`] - The owned result object published after a successful run
//! - [`manifest`] - A TOML-backed catalog used when no live model is available

use crate::core::quantity::QuantityKind;
use crate::core::quantity::registry::NameRegistry;
use std::path::PathBuf;

pub mod manifest;

pub trait ModelCatalog {
    fn model_name(&self) -> &str;

    fn coordinate_names(&self) -> Vec<String>;

    fn muscle_names(&self) -> Vec<String>;

    /// Group names in model order. An empty list means group filtering is unavailable.
    fn group_names(&self) -> Vec<String>;

    /// Members of a group, or `None` when the model has no group with that name.
    fn group_members(&self, group: &str) -> Option<Vec<String>>;

    fn names(&self, kind: QuantityKind) -> Vec<String> {
        match kind {
            QuantityKind::Coordinate => self.coordinate_names(),
            QuantityKind::Muscle => self.muscle_names(),
        }
    }

    fn registry(&self, kind: QuantityKind) -> NameRegistry {
        NameRegistry::new(kind, self.names(kind))
    }
}

/// A model as seen by the execution layer: a name and the file it lives in, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    pub name: String,
    pub path: Option<PathBuf>,
}

impl ModelHandle {
    pub fn new(name: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }
}
