use super::QuantityKind;
use std::collections::HashMap;

/// The ordered candidate names for one quantity kind, as enumerated from a model.
///
/// A registry is immutable; a model change produces a new registry which is then handed
/// to [`SelectionSet::refresh`](super::set::SelectionSet::refresh).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRegistry {
    kind: QuantityKind,
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl NameRegistry {
    /// Builds a registry, keeping the first occurrence of any repeated name.
    pub fn new<I, S>(kind: QuantityKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut index = HashMap::new();
        for name in names {
            let name = name.into();
            if index.contains_key(&name) {
                continue;
            }
            index.insert(name.clone(), ordered.len());
            ordered.push(name);
        }
        Self {
            kind,
            names: ordered,
            index,
        }
    }

    pub fn empty(kind: QuantityKind) -> Self {
        Self::new(kind, Vec::<String>::new())
    }

    pub fn kind(&self) -> QuantityKind {
        self.kind
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_preserves_order_and_drops_repeated_names() {
        let registry = NameRegistry::new(
            QuantityKind::Coordinate,
            ["hip_flexion", "knee_angle", "hip_flexion", "ankle_angle"],
        );

        assert_eq!(
            registry.names(),
            &["hip_flexion", "knee_angle", "ankle_angle"]
        );
        assert_eq!(registry.position("ankle_angle"), Some(2));
        assert!(registry.contains("knee_angle"));
        assert!(!registry.contains("lumbar_bending"));
    }

    #[test]
    fn empty_registry_is_valid() {
        let registry = NameRegistry::empty(QuantityKind::Muscle);
        assert!(registry.is_empty());
        assert_eq!(registry.kind(), QuantityKind::Muscle);
    }
}
