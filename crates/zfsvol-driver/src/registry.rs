use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What the driver remembers about a volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeProperties {
    #[serde(rename = "datasetFQN")]
    pub dataset_fqn: String,
}

impl VolumeProperties {
    pub fn new(dataset_fqn: impl Into<String>) -> Self {
        Self {
            dataset_fqn: dataset_fqn.into(),
        }
    }
}

/// Volume name to dataset mapping
///
/// Serializes as a plain JSON object, `{"<name>": {"datasetFQN": "..."}}`.
/// The manager owns one instance behind a mutex; callers only ever see
/// copies via [`Registry::entries`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    volumes: BTreeMap<String, VolumeProperties>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&VolumeProperties> {
        self.volumes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.volumes.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, props: VolumeProperties) {
        self.volumes.insert(name.into(), props);
    }

    pub fn remove(&mut self, name: &str) -> Option<VolumeProperties> {
        self.volumes.remove(name)
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Owned snapshot of all entries, ordered by name
    pub fn entries(&self) -> Vec<(String, VolumeProperties)> {
        self.volumes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
