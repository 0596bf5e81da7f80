use super::pattern::CompiledPattern;
use super::registry::NameRegistry;
use super::selection::Selection;
use super::{Quantity, QuantityKind};
use crate::core::events::{EventChannel, ListenerId};
use std::collections::HashMap;
use tracing::debug;

/// Emitted once per mutation that actually flipped at least one `selected` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChanged {
    pub kind: QuantityKind,
    pub selection: Selection,
}

/// Which bulk actions over the shown rows would change anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkActions {
    pub select_shown: bool,
    pub deselect_shown: bool,
}

#[derive(Debug)]
pub struct SelectionSet {
    registry: NameRegistry,
    quantities: Vec<Quantity>,
    listeners: EventChannel<SelectionChanged>,
}

impl SelectionSet {
    /// Creates a set where every name is shown and none is selected.
    pub fn new(registry: NameRegistry) -> Self {
        let quantities = registry
            .names()
            .iter()
            .map(|name| Quantity::new(name.clone(), false))
            .collect();
        Self {
            registry,
            quantities,
            listeners: EventChannel::new(),
        }
    }

    pub fn kind(&self) -> QuantityKind {
        self.registry.kind()
    }

    pub fn registry(&self) -> &NameRegistry {
        &self.registry
    }

    pub fn quantities(&self) -> &[Quantity] {
        &self.quantities
    }

    pub fn get(&self, name: &str) -> Option<&Quantity> {
        self.registry
            .position(name)
            .map(|index| &self.quantities[index])
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&SelectionChanged) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Replaces the candidate names.
    ///
    /// Names present in both registries keep their `selected` flag; names that
    /// disappeared are dropped. Every name of the new registry starts out shown.
    pub fn refresh(&mut self, registry: NameRegistry) {
        let previous: HashMap<String, bool> = self
            .quantities
            .drain(..)
            .map(|quantity| (quantity.name, quantity.selected))
            .collect();
        let previously_selected = previous.values().filter(|selected| **selected).count();

        self.quantities = registry
            .names()
            .iter()
            .map(|name| {
                let selected = previous.get(name).copied().unwrap_or(false);
                Quantity::new(name.clone(), selected)
            })
            .collect();
        self.registry = registry;

        debug!(
            kind = %self.kind(),
            names = self.quantities.len(),
            "Selection set refreshed from a new registry."
        );
        if self.count_selected() != previously_selected {
            self.notify();
        }
    }

    /// Sets `shown` from the pattern for every row; `selected` is untouched.
    pub fn restrict_shown_by(&mut self, pattern: &CompiledPattern) {
        for quantity in &mut self.quantities {
            quantity.shown = pattern.matches(&quantity.name);
        }
        debug!(
            kind = %self.kind(),
            pattern = pattern.as_str(),
            shown = self.count_shown(),
            "Visible names restricted."
        );
    }

    pub fn show_all(&mut self) {
        for quantity in &mut self.quantities {
            quantity.shown = true;
        }
    }

    /// Overwrites every `selected` flag from the selection.
    pub fn mark_selected(&mut self, selection: &Selection) {
        let mut changed = false;
        for quantity in &mut self.quantities {
            let selected = selection.contains(&quantity.name);
            changed |= quantity.selected != selected;
            quantity.selected = selected;
        }
        if changed {
            self.notify();
        }
    }

    /// Sets `selected` on every shown row and returns how many rows changed.
    pub fn select_shown(&mut self, value: bool) -> usize {
        let mut changed = 0;
        for quantity in self.quantities.iter_mut().filter(|q| q.shown) {
            if quantity.selected != value {
                quantity.selected = value;
                changed += 1;
            }
        }
        if changed > 0 {
            self.notify();
        }
        changed
    }

    /// Sets a single row. Returns `false` when the name is not in the registry.
    pub fn toggle_one(&mut self, name: &str, value: bool) -> bool {
        let Some(index) = self.registry.position(name) else {
            return false;
        };
        let quantity = &mut self.quantities[index];
        if quantity.selected != value {
            quantity.selected = value;
            self.notify();
        }
        true
    }

    pub fn count_selected(&self) -> usize {
        self.quantities.iter().filter(|q| q.selected).count()
    }

    pub fn count_shown(&self) -> usize {
        self.quantities.iter().filter(|q| q.shown).count()
    }

    pub fn count_shown_and_selected(&self) -> usize {
        self.quantities
            .iter()
            .filter(|q| q.shown && q.selected)
            .count()
    }

    pub fn bulk_actions(&self) -> BulkActions {
        let shown_and_selected = self.count_shown_and_selected();
        if shown_and_selected == 0 {
            BulkActions {
                select_shown: true,
                deselect_shown: false,
            }
        } else if shown_and_selected == self.count_shown() {
            BulkActions {
                select_shown: false,
                deselect_shown: true,
            }
        } else {
            BulkActions {
                select_shown: true,
                deselect_shown: true,
            }
        }
    }

    /// The selected names in registry order.
    pub fn selected_names(&self) -> Vec<&str> {
        self.quantities
            .iter()
            .filter(|q| q.selected)
            .map(|q| q.name.as_str())
            .collect()
    }

    /// The selected names in registry order, joined in the settings representation.
    pub fn selected_names_ordered(&self) -> String {
        self.selected_names().join(",")
    }

    /// The current selection as a tagged value.
    pub fn selection(&self) -> Selection {
        let selected = self.count_selected();
        if selected == 0 {
            Selection::None
        } else if selected == self.quantities.len() {
            Selection::All
        } else {
            Selection::subset(self.selected_names())
        }
    }

    fn notify(&self) {
        let event = SelectionChanged {
            kind: self.kind(),
            selection: self.selection(),
        };
        debug!(kind = %event.kind, selected = self.count_selected(), "Selection changed.");
        self.listeners.emit(&event);
    }
}
