//! Population metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One population in the remote environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    /// Remote-assigned population id
    pub id: String,
    /// Display name
    pub name: String,
}

/// Id → name lookup for populations.
///
/// Resolved once per sync and read-only for the remainder of that sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PopulationMap {
    entries: BTreeMap<String, String>,
}

impl PopulationMap {
    /// Display name for a population id.
    #[must_use]
    pub fn name(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    /// Number of populations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the environment has no populations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate (id, name) pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.entries.iter()
    }
}

impl FromIterator<Population> for PopulationMap {
    fn from_iter<I: IntoIterator<Item = Population>>(iter: I) -> Self {
        Self { entries: iter.into_iter().map(|p| (p.id, p.name)).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_lookup_from_populations() {
        let map: PopulationMap = vec![
            Population { id: "p-1".into(), name: "Default".into() },
            Population { id: "p-2".into(), name: "Contractors".into() },
        ]
        .into_iter()
        .collect();

        assert_eq!(map.len(), 2);
        assert_eq!(map.name("p-2"), Some("Contractors"));
        assert_eq!(map.name("p-9"), None);
    }
}
