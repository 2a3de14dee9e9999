use crate::error::{DriverError, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Option naming an alternative parent dataset for one volume
pub const ROOT_DATASET_OPTION: &str = "driver_zfsRootDataset";

/// Option toggling auto-snapshots; `driver_zfsAutosnapshot:<freq>` scopes it to a frequency
pub const AUTO_SNAPSHOT_OPTION: &str = "driver_zfsAutosnapshot";

/// User property read by zfs-auto-snapshot
pub const AUTO_SNAPSHOT_PROPERTY: &str = "com.sun:auto-snapshot";

/// Native mount path property, always computed by the driver
pub const MOUNTPOINT_PROPERTY: &str = "mountpoint";

/// Everything needed to create the dataset backing a volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPlan {
    /// Fully-qualified dataset name
    pub dataset: String,
    /// Local mount directory for the volume
    pub mount_path: PathBuf,
    /// Properties passed to dataset creation, `mountpoint` included
    pub properties: BTreeMap<String, String>,
}

/// Translates Docker volume options into dataset name and properties
#[derive(Debug, Clone)]
pub struct PropertyTranslator {
    default_root: String,
    volumes_mount_path: PathBuf,
}

impl PropertyTranslator {
    pub fn new(default_root: impl Into<String>, volumes_mount_path: impl Into<PathBuf>) -> Self {
        Self {
            default_root: default_root.into(),
            volumes_mount_path: volumes_mount_path.into(),
        }
    }

    /// Local mount directory for a volume name
    pub fn mount_path(&self, name: &str) -> PathBuf {
        self.volumes_mount_path.join(name)
    }

    /// Consume the caller's option bag and produce the creation plan.
    ///
    /// Driver-internal keys are stripped, auto-snapshot keys are rewritten
    /// to pool properties, anything else passes through untouched.
    pub fn translate(&self, name: &str, mut options: BTreeMap<String, String>) -> Result<DatasetPlan> {
        if options.contains_key(MOUNTPOINT_PROPERTY) {
            return Err(DriverError::reserved_option(MOUNTPOINT_PROPERTY));
        }

        let dataset = match options.remove(ROOT_DATASET_OPTION) {
            Some(root) if !root.is_empty() => format!("{}/{}", root, name),
            _ => format!("{}/volumes/{}", self.default_root, name),
        };

        let snapshot_keys: Vec<String> = options
            .keys()
            .filter(|k| is_auto_snapshot_key(k))
            .cloned()
            .collect();

        for key in snapshot_keys {
            let Some(value) = options.remove(&key) else {
                continue;
            };
            match key.strip_prefix(AUTO_SNAPSHOT_OPTION) {
                Some("") => {
                    if value == "true" {
                        options.insert(AUTO_SNAPSHOT_PROPERTY.to_string(), value);
                    }
                }
                Some(scoped) => {
                    // scoped is ":<freq>"
                    let frequency = &scoped[1..];
                    if !frequency.is_empty() {
                        options.insert(
                            format!("{}:{}", AUTO_SNAPSHOT_PROPERTY, frequency),
                            value,
                        );
                    }
                }
                None => {}
            }
        }

        let mount_path = self.mount_path(name);
        options.insert(
            MOUNTPOINT_PROPERTY.to_string(),
            mount_path.display().to_string(),
        );

        debug!(
            "Translated volume '{}' to dataset '{}' with {} properties",
            name,
            dataset,
            options.len()
        );

        Ok(DatasetPlan {
            dataset,
            mount_path,
            properties: options,
        })
    }
}

fn is_auto_snapshot_key(key: &str) -> bool {
    match key.strip_prefix(AUTO_SNAPSHOT_OPTION) {
        Some(rest) => rest.is_empty() || rest.starts_with(':'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> PropertyTranslator {
        PropertyTranslator::new("pool/docker", "/docker/volumes")
    }

    fn opts(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_dataset_and_mountpoint() {
        let plan = translator().translate("data", BTreeMap::new()).unwrap();
        assert_eq!(plan.dataset, "pool/docker/volumes/data");
        assert_eq!(plan.mount_path, PathBuf::from("/docker/volumes/data"));
        assert_eq!(plan.properties, opts(&[("mountpoint", "/docker/volumes/data")]));
    }

    #[test]
    fn test_root_override_is_consumed() {
        let plan = translator()
            .translate("data", opts(&[(ROOT_DATASET_OPTION, "tank/other")]))
            .unwrap();
        assert_eq!(plan.dataset, "tank/other/data");
        assert!(!plan.properties.contains_key(ROOT_DATASET_OPTION));
    }

    #[test]
    fn test_empty_root_override_falls_back_to_default() {
        let plan = translator()
            .translate("data", opts(&[(ROOT_DATASET_OPTION, "")]))
            .unwrap();
        assert_eq!(plan.dataset, "pool/docker/volumes/data");
        assert!(!plan.properties.contains_key(ROOT_DATASET_OPTION));
    }

    #[test]
    fn test_mountpoint_option_is_rejected() {
        for value in ["/srv/data", "", "none"] {
            let err = translator()
                .translate(
                    "data",
                    opts(&[("mountpoint", value), ("compression", "lz4")]),
                )
                .unwrap_err();
            assert!(matches!(err, DriverError::ReservedOption { .. }));
        }
    }

    #[test]
    fn test_auto_snapshot_true_sets_property() {
        let plan = translator()
            .translate("data", opts(&[(AUTO_SNAPSHOT_OPTION, "true")]))
            .unwrap();
        assert_eq!(
            plan.properties.get(AUTO_SNAPSHOT_PROPERTY).map(String::as_str),
            Some("true")
        );
        assert!(!plan.properties.contains_key(AUTO_SNAPSHOT_OPTION));
    }

    #[test]
    fn test_auto_snapshot_other_values_are_dropped() {
        for value in ["false", "TRUE", "1", ""] {
            let plan = translator()
                .translate("data", opts(&[(AUTO_SNAPSHOT_OPTION, value)]))
                .unwrap();
            assert!(!plan.properties.contains_key(AUTO_SNAPSHOT_PROPERTY));
            assert!(!plan.properties.contains_key(AUTO_SNAPSHOT_OPTION));
        }
    }

    #[test]
    fn test_frequency_scoped_auto_snapshot() {
        let plan = translator()
            .translate(
                "data",
                opts(&[
                    ("driver_zfsAutosnapshot:hourly", "true"),
                    ("driver_zfsAutosnapshot:daily", "false"),
                ]),
            )
            .unwrap();
        assert_eq!(
            plan.properties.get("com.sun:auto-snapshot:hourly").map(String::as_str),
            Some("true")
        );
        assert_eq!(
            plan.properties.get("com.sun:auto-snapshot:daily").map(String::as_str),
            Some("false")
        );
        assert!(!plan.properties.contains_key("driver_zfsAutosnapshot:hourly"));
        assert!(!plan.properties.contains_key("driver_zfsAutosnapshot:daily"));
    }

    #[test]
    fn test_empty_frequency_is_dropped() {
        let plan = translator()
            .translate("data", opts(&[("driver_zfsAutosnapshot:", "true")]))
            .unwrap();
        assert_eq!(plan.properties, opts(&[("mountpoint", "/docker/volumes/data")]));
    }

    #[test]
    fn test_unrelated_options_pass_through() {
        let plan = translator()
            .translate(
                "data",
                opts(&[
                    ("compression", "lz4"),
                    ("driver_zfsAutosnapshotX", "keep"),
                ]),
            )
            .unwrap();
        assert_eq!(plan.properties.get("compression").map(String::as_str), Some("lz4"));
        assert_eq!(
            plan.properties.get("driver_zfsAutosnapshotX").map(String::as_str),
            Some("keep")
        );
    }
}
