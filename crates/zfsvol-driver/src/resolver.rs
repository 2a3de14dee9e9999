//! Mount path translation between the pool's view and the host's view.
//!
//! When the driver runs as a managed plugin, its filesystem is a subtree of
//! the host rooted at the propagated-mount directory, and Docker interprets
//! returned mount paths relative to that directory. Paths must then walk back
//! up to the host root before descending into the pool-reported location.

use std::path::{Component, Path};

/// Path translation strategy, fixed for the lifetime of the process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountStrategy {
    /// Driver and host share a filesystem view
    Direct,
    /// Prefix pool paths with a relative escape such as `/../../..`
    Escaped { prefix: String },
}

impl MountStrategy {
    /// Build the escape for a propagated-mount anchor directory
    ///
    /// One `..` is emitted per normal component of `anchor`, so
    /// `/var/lib/docker/plugins/<id>/propagated-mount` yields six.
    pub fn escaped_from_anchor(anchor: &Path) -> Self {
        let depth = anchor
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .count();
        let prefix = "/..".repeat(depth);
        Self::Escaped { prefix }
    }
}

/// Maps pool-reported mount paths to host-usable ones
#[derive(Debug, Clone)]
pub struct MountpointResolver {
    strategy: MountStrategy,
}

impl MountpointResolver {
    pub fn new(strategy: MountStrategy) -> Self {
        Self { strategy }
    }

    pub fn resolve(&self, pool_path: &str) -> String {
        match &self.strategy {
            MountStrategy::Direct => pool_path.to_string(),
            MountStrategy::Escaped { prefix } => {
                if pool_path.starts_with('/') {
                    format!("{}{}", prefix, pool_path)
                } else {
                    format!("{}/{}", prefix, pool_path)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_returns_path_unchanged() {
        let resolver = MountpointResolver::new(MountStrategy::Direct);
        assert_eq!(
            resolver.resolve("/docker/volumes/data"),
            "/docker/volumes/data"
        );
    }

    #[test]
    fn test_escape_depth_follows_anchor() {
        let strategy =
            MountStrategy::escaped_from_anchor(Path::new("/var/lib/docker/plugins/abc/propagated-mount"));
        assert_eq!(
            strategy,
            MountStrategy::Escaped {
                prefix: "/../../../../../..".to_string()
            }
        );
    }

    #[test]
    fn test_escaped_prefixes_pool_path() {
        let resolver = MountpointResolver::new(MountStrategy::escaped_from_anchor(Path::new(
            "/mnt/propagated",
        )));
        assert_eq!(
            resolver.resolve("/docker/volumes/data"),
            "/../../docker/volumes/data"
        );
        assert_eq!(resolver.resolve("docker/volumes/data"), "/../../docker/volumes/data");
    }

    #[test]
    fn test_escaped_path_normalizes_back_to_host_path() {
        let anchor = Path::new("/var/lib/docker/plugins/abc/propagated-mount");
        let resolver = MountpointResolver::new(MountStrategy::escaped_from_anchor(anchor));
        let seen_by_host = format!("{}{}", anchor.display(), resolver.resolve("/docker/volumes/data"));

        let mut stack: Vec<&str> = Vec::new();
        for part in seen_by_host.split('/').filter(|p| !p.is_empty()) {
            if part == ".." {
                stack.pop();
            } else {
                stack.push(part);
            }
        }
        assert_eq!(format!("/{}", stack.join("/")), "/docker/volumes/data");
    }
}
