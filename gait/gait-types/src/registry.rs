//! Bijective name ↔ index registry.
//!
//! Joint and muscle lists are ordered: the external dynamics evaluator and
//! every decision-variable family index by position. The registry is built
//! once from the ordered list; hot loops only ever see the dense indices it
//! hands out.

use std::collections::HashMap;

use crate::error::GaitError;
use crate::Result;

/// Ordered set of unique names with O(1) lookup in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameRegistry {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl NameRegistry {
    /// Build a registry from an ordered list of names.
    ///
    /// Duplicate names are rejected since they would make the mapping
    /// non-bijective.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::default();
        for name in names {
            let name = name.into();
            if registry.index.contains_key(&name) {
                return Err(GaitError::consistency(format!(
                    "duplicate name `{name}` in registry"
                )));
            }
            registry.index.insert(name.clone(), registry.names.len());
            registry.names.push(name);
        }
        Ok(registry)
    }

    /// Number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of `name`, if registered.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Name at position `index`.
    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// All names in registration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate over `(index, name)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }

    /// Resolve a list of names, failing with `on_missing` for the first
    /// unknown name.
    pub fn indices_of<S, F>(&self, names: &[S], on_missing: F) -> Result<Vec<usize>>
    where
        S: AsRef<str>,
        F: Fn(&str) -> GaitError,
    {
        names
            .iter()
            .map(|n| self.get(n.as_ref()).ok_or_else(|| on_missing(n.as_ref())))
            .collect()
    }
}

/// Swap a trailing `_l`/`_r` side suffix; names without a suffix are
/// returned unchanged.
#[must_use]
pub fn mirror_name(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("_r") {
        format!("{stem}_l")
    } else if let Some(stem) = name.strip_suffix("_l") {
        format!("{stem}_r")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_bijective() {
        let reg = NameRegistry::from_names(["a", "b", "c"]).unwrap();
        assert_eq!(reg.len(), 3);
        for (i, name) in reg.iter() {
            assert_eq!(reg.get(name), Some(i));
            assert_eq!(reg.name(i), Some(name));
        }
        assert_eq!(reg.get("d"), None);
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let err = NameRegistry::from_names(["a", "b", "a"]).unwrap_err();
        assert!(err.is_consistency_error());
    }

    #[test]
    fn test_indices_of_reports_missing() {
        let reg = NameRegistry::from_names(["hip", "knee"]).unwrap();
        assert_eq!(
            reg.indices_of(&["knee", "hip"], |n| GaitError::missing_joint(n))
                .unwrap(),
            vec![1, 0]
        );
        let err = reg
            .indices_of(&["ankle"], |n| GaitError::missing_joint(n))
            .unwrap_err();
        assert!(matches!(err, GaitError::MissingJoint { ref name } if name == "ankle"));
    }

    #[test]
    fn test_mirror_name() {
        assert_eq!(mirror_name("hip_flexion_r"), "hip_flexion_l");
        assert_eq!(mirror_name("soleus_l"), "soleus_r");
        assert_eq!(mirror_name("lumbar_extension"), "lumbar_extension");
    }
}
