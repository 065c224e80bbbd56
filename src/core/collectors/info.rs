//! Static per-namespace information taken from the device inventory.

use prometheus::core::Desc;

use super::{
    device::DeviceRecord,
    provider::{FieldProvider, FieldSpec},
    traits::{GroupKind, MetricGroup},
    types::{CollectorResult, ConstMetric},
};

/// Labels attached to every info metric, in the order of
/// [`DeviceRecord::info_labels`].
pub const INFO_LABELS: [&str; 5] = [
    "device",
    "generic_path",
    "firmware",
    "model_number",
    "serial_number",
];

pub const INFO_FIELDS: &[FieldSpec] = &[
    FieldSpec::gauge("nvme_namespace", "Namespace identifier", "NameSpace"),
    FieldSpec::gauge(
        "nvme_used_bytes",
        "Number of bytes allocated in the namespace",
        "UsedBytes",
    ),
    FieldSpec::gauge(
        "nvme_maximum_lba",
        "Maximum logical block address of the namespace",
        "MaximumLBA",
    ),
    FieldSpec::gauge(
        "nvme_physical_size",
        "Physical size of the namespace in bytes",
        "PhysicalSize",
    ),
    FieldSpec::gauge(
        "nvme_sector_size",
        "Logical sector size in bytes",
        "SectorSize",
    ),
];

/// Metric group reading the inventory attributes of each device.
pub struct InfoGroup {
    providers: Vec<FieldProvider>,
}

impl InfoGroup {
    pub fn new() -> CollectorResult<Self> {
        Ok(Self {
            providers: FieldProvider::from_table(INFO_FIELDS, &INFO_LABELS)?,
        })
    }
}

#[async_trait::async_trait]
impl MetricGroup for InfoGroup {
    fn name(&self) -> &'static str {
        "info"
    }

    fn kind(&self) -> GroupKind {
        GroupKind::Info
    }

    fn describe(&self) -> Vec<&Desc> {
        self.providers.iter().map(FieldProvider::desc).collect()
    }

    async fn collect(&self, device: &DeviceRecord) -> Vec<ConstMetric> {
        let document = device.to_document();
        let labels = device.info_labels();

        self.providers
            .iter()
            .filter_map(|provider| provider.resolve(Some(&document), &labels))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DeviceRecord {
        DeviceRecord {
            device_path: "/dev/nvme0n1".into(),
            generic_path: "/dev/ng0n1".into(),
            firmware: "3B2QGXA7".into(),
            model_number: "Samsung SSD 980 PRO 1TB".into(),
            serial_number: "S5GXNX0T".into(),
            namespace: 1.0,
            used_bytes: 500.0,
            maximum_lba: 1953525168.0,
            physical_size: 1000204886016.0,
            sector_size: 512.0,
        }
    }

    #[tokio::test]
    async fn test_info_group_emits_every_field() {
        let group = InfoGroup::new().unwrap();
        let metrics = group.collect(&record()).await;

        assert_eq!(metrics.len(), INFO_FIELDS.len());
        let values: Vec<(&str, f64)> = metrics.iter().map(|m| (m.name(), m.value)).collect();
        assert_eq!(
            values,
            vec![
                ("nvme_namespace", 1.0),
                ("nvme_used_bytes", 500.0),
                ("nvme_maximum_lba", 1953525168.0),
                ("nvme_physical_size", 1000204886016.0),
                ("nvme_sector_size", 512.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_info_group_labels() {
        let group = InfoGroup::new().unwrap();
        let metrics = group.collect(&record()).await;
        let metric = &metrics[0];

        assert_eq!(metric.label("device"), Some("/dev/nvme0n1"));
        assert_eq!(metric.label("generic_path"), Some("/dev/ng0n1"));
        assert_eq!(metric.label("firmware"), Some("3B2QGXA7"));
        assert_eq!(metric.label("model_number"), Some("Samsung SSD 980 PRO 1TB"));
        assert_eq!(metric.label("serial_number"), Some("S5GXNX0T"));
    }

    #[test]
    fn test_describe_lists_all_descriptors() {
        let group = InfoGroup::new().unwrap();
        let names: Vec<&str> = group.describe().iter().map(|d| d.fq_name.as_str()).collect();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"nvme_sector_size"));
        assert_eq!(group.kind(), GroupKind::Info);
    }
}
