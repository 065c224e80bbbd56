use prometheus::core::Desc;

use super::{device::DeviceRecord, types::ConstMetric};

/// How a group obtains its source document and treats fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Reads directly off the [`DeviceRecord`]; no fetch.
    Info,
    /// Fetch failures are logged and resolved against an empty document.
    RequiredLog,
    /// Fetch failures drop the group for that device.
    OptionalLog,
}

/// Contract shared by every metric group.
///
/// A group owns a fixed list of field providers and, for log-based groups,
/// the command that fetches the per-device document. `collect` fetches at
/// most once per call, however many providers read from the document.
#[async_trait::async_trait]
pub trait MetricGroup: Send + Sync {
    /// Stable identifier used in logs and configuration.
    fn name(&self) -> &'static str;

    fn kind(&self) -> GroupKind;

    /// Descriptors of every metric this group can emit.
    fn describe(&self) -> Vec<&Desc>;

    /// Produces this group's metrics for one device. Never fails.
    async fn collect(&self, device: &DeviceRecord) -> Vec<ConstMetric>;
}
