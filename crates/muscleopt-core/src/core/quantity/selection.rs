use super::registry::NameRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Wire token meaning "every name currently in the registry".
pub const ALL_TOKEN: &str = "ALL";
/// Wire token meaning "no name at all".
pub const NONE_TOKEN: &str = "NONE";

/// Which names of one quantity kind take part in the optimization.
///
/// On the wire a selection is a comma-separated (or `+`-separated) list of names.
/// `ALL` or an empty list mean [`Selection::All`]; `NONE` means [`Selection::None`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selection {
    #[default]
    All,
    None,
    Subset(Vec<String>),
}

impl Selection {
    /// Interprets a list of names using the wire conventions.
    ///
    /// A list that is empty, or whose first entry is `ALL` or blank, selects everything.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let trimmed: Vec<String> = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .collect();
        match trimmed.first().map(String::as_str) {
            None | Some("") | Some(ALL_TOKEN) => Selection::All,
            Some(NONE_TOKEN) if trimmed.len() == 1 => Selection::None,
            Some(_) => Self::subset(trimmed.into_iter().filter(|name| !name.is_empty())),
        }
    }

    /// Builds an explicit subset with no sentinel interpretation; no names means `None`.
    pub fn subset<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let names: Vec<String> = names
            .into_iter()
            .map(Into::into)
            .filter(|name| seen.insert(name.clone()))
            .collect();
        if names.is_empty() {
            Selection::None
        } else {
            Selection::Subset(names)
        }
    }

    pub fn parse(wire: &str) -> Self {
        Self::from_names(wire.split([',', '+']))
    }

    pub fn to_wire(&self) -> String {
        match self {
            Selection::All => ALL_TOKEN.to_string(),
            Selection::None => NONE_TOKEN.to_string(),
            Selection::Subset(names) => names.join(","),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::None => false,
            Selection::Subset(names) => names.iter().any(|n| n == name),
        }
    }

    /// Resolves the selection against a registry, in registry order.
    ///
    /// Names the registry does not know are dropped.
    pub fn resolve<'r>(&self, registry: &'r NameRegistry) -> Vec<&'r str> {
        match self {
            Selection::All => registry.names().iter().map(String::as_str).collect(),
            Selection::None => Vec::new(),
            Selection::Subset(names) => {
                let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
                registry
                    .names()
                    .iter()
                    .map(String::as_str)
                    .filter(|name| wanted.contains(name))
                    .collect()
            }
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl From<String> for Selection {
    fn from(wire: String) -> Self {
        Selection::parse(&wire)
    }
}

impl From<Selection> for String {
    fn from(selection: Selection) -> Self {
        selection.to_wire()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::quantity::QuantityKind;

    #[test]
    fn parse_accepts_comma_and_plus_separators_and_trims() {
        assert_eq!(
            Selection::parse("hip_flexion_r, knee_angle_r+ankle_angle_r"),
            Selection::Subset(vec![
                "hip_flexion_r".into(),
                "knee_angle_r".into(),
                "ankle_angle_r".into()
            ])
        );
    }

    #[test]
    fn parse_treats_all_token_and_empty_text_as_everything() {
        assert_eq!(Selection::parse("ALL"), Selection::All);
        assert_eq!(Selection::parse(""), Selection::All);
        assert_eq!(Selection::parse("  "), Selection::All);
    }

    #[test]
    fn none_token_round_trips() {
        assert_eq!(Selection::parse("NONE"), Selection::None);
        assert_eq!(Selection::None.to_wire(), "NONE");
    }

    #[test]
    fn subset_of_no_names_is_none_and_duplicates_are_dropped() {
        assert_eq!(Selection::subset(Vec::<String>::new()), Selection::None);
        assert_eq!(
            Selection::subset(["a", "b", "a"]),
            Selection::Subset(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn resolve_follows_registry_order_and_drops_unknown_names() {
        let registry =
            NameRegistry::new(QuantityKind::Muscle, ["soleus_r", "gaslat_r", "tibant_r"]);
        let selection = Selection::parse("tibant_r,bogus,soleus_r");

        assert_eq!(selection.resolve(&registry), vec!["soleus_r", "tibant_r"]);
        assert_eq!(Selection::All.resolve(&registry).len(), 3);
        assert!(Selection::None.resolve(&registry).is_empty());
    }
}
