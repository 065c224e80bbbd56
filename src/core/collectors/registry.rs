use std::{collections::BTreeMap, sync::Arc};

use once_cell::sync::Lazy;

use super::{error::CollectorError, traits::MetricGroup, types::CollectorResult};
use crate::core::command::CommandRunner;

/// Factory building an optional group for a runner and tool binary.
pub type GroupFactory = fn(Arc<dyn CommandRunner>, &str) -> CollectorResult<Arc<dyn MetricGroup>>;

/// Metadata for one optional metric group, submitted to the global inventory.
pub struct GroupMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub factory: GroupFactory,
}

// Tell the `inventory` crate to collect all submitted `GroupMeta` values.
inventory::collect!(GroupMeta);

/// Registry of optional vendor log groups that configuration can enable by name.
///
/// The info and smart-log groups are always present and are not listed here.
pub struct GroupRegistry {
    groups: BTreeMap<&'static str, &'static GroupMeta>,
}

impl GroupRegistry {
    /// Collects every `GroupMeta` submitted through [`register_group!`].
    pub fn new() -> Self {
        let groups = inventory::iter::<GroupMeta>
            .into_iter()
            .map(|meta| (meta.name, meta))
            .collect();
        GroupRegistry { groups }
    }

    pub fn get(&self, name: &str) -> CollectorResult<&'static GroupMeta> {
        self.groups
            .get(name)
            .copied()
            .ok_or_else(|| CollectorError::GroupNotFound(name.to_string()))
    }

    /// Instantiates the group registered under `name`.
    pub fn build(
        &self,
        name: &str,
        runner: Arc<dyn CommandRunner>,
        binary: &str,
    ) -> CollectorResult<Arc<dyn MetricGroup>> {
        let meta = self.get(name)?;
        (meta.factory)(runner, binary)
    }

    /// Registered names, sorted.
    pub fn list_names(&self) -> Vec<&'static str> {
        self.groups.keys().copied().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Returns a reference to the lazily built global registry.
    pub fn global() -> &'static GroupRegistry {
        &GLOBAL_REGISTRY
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_REGISTRY: Lazy<GroupRegistry> = Lazy::new(GroupRegistry::new);

/// Convenience facade over the global registry.
pub struct Groups;

impl Groups {
    pub fn build(
        name: &str,
        runner: Arc<dyn CommandRunner>,
        binary: &str,
    ) -> CollectorResult<Arc<dyn MetricGroup>> {
        GroupRegistry::global().build(name, runner, binary)
    }
}

/// Registers an optional metric group with the global inventory at compile time.
#[macro_export]
macro_rules! register_group {
    ($name:expr, $description:expr, $factory:path) => {
        inventory::submit! {
            $crate::core::collectors::registry::GroupMeta {
                name: $name,
                description: $description,
                factory: $factory,
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{collectors::traits::GroupKind, command::SystemRunner};

    fn runner() -> Arc<dyn CommandRunner> {
        Arc::new(SystemRunner::default())
    }

    #[test]
    fn test_ocp_group_is_registered() {
        let registry = GroupRegistry::new();
        assert!(registry.contains("ocp"));
        assert!(registry.list_names().contains(&"ocp"));
    }

    #[test]
    fn test_build_registered_group() {
        let group = Groups::build("ocp", runner(), "nvme").expect("ocp group should build");
        assert_eq!(group.name(), "ocp");
        assert_eq!(group.kind(), GroupKind::OptionalLog);
    }

    #[test]
    fn test_unknown_group() {
        let result = GroupRegistry::global().build("wdc", runner(), "nvme");
        assert!(matches!(result, Err(CollectorError::GroupNotFound(name)) if name == "wdc"));
        assert!(!GroupRegistry::global().contains("wdc"));
    }

    #[test]
    fn test_registered_groups_describe_themselves() {
        let meta = GroupRegistry::global().get("ocp").unwrap();
        assert!(meta.description.contains("smart-add-log"));
    }

    #[test]
    fn test_global_registry_is_singleton() {
        let registry1 = GroupRegistry::global();
        let registry2 = GroupRegistry::global();
        assert_eq!(registry1 as *const _, registry2 as *const _);
    }
}
