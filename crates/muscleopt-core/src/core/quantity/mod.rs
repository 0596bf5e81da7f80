//! # Quantity Module
//!
//! Named, selectable model elements (coordinates and muscles) and the machinery used to
//! narrow and select them.
//!
//! ## Key Components
//!
//! - [`registry`] - The immutable, ordered universe of names for one quantity kind
//! - [`pattern`] - Compilation of user-typed wildcard text into a "contains" matcher
//! - [`selection`] - The tagged `All | None | Subset` selection value and its wire format
//! - [`set`] - The selection set holding the independent `shown` and `selected` flags
//!
//! Visibility and selection are orthogonal: filtering never changes what is
//! selected, and selecting never changes what is shown. Selecting everything shown and
//! then widening the filter keeps the earlier selection intact, just out of view.

use std::fmt;

pub mod pattern;
pub mod registry;
pub mod selection;
pub mod set;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantityKind {
    Coordinate,
    Muscle,
}

impl QuantityKind {
    pub const ALL: [QuantityKind; 2] = [QuantityKind::Coordinate, QuantityKind::Muscle];

    pub fn plural(self) -> &'static str {
        match self {
            QuantityKind::Coordinate => "coordinates",
            QuantityKind::Muscle => "muscles",
        }
    }
}

impl fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantityKind::Coordinate => write!(f, "coordinate"),
            QuantityKind::Muscle => write!(f, "muscle"),
        }
    }
}

/// One row of a selection set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
    pub name: String,
    pub shown: bool,
    pub selected: bool,
}

impl Quantity {
    pub(crate) fn new(name: String, selected: bool) -> Self {
        Self {
            name,
            shown: true,
            selected,
        }
    }
}
