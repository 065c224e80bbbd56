//! Device inventory normalization.
//!
//! `nvme list -o json` changed shape across nvme-cli releases. 1.x prints a
//! flat `Devices` array with one entry per namespace; 2.x nests namespaces
//! under `Devices[].Subsystems[].Controllers[].Namespaces[]`. Both are turned
//! into the same flat list of [`DeviceRecord`]s here.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{provider::extract_numeric, types::CollectorResult};
use crate::core::command::CommandRunner;

/// One addressable namespace on one controller.
///
/// Serializes with the key names of the flat inventory schema, which is
/// what the info metric providers read from. Numeric attributes are kept as
/// `f64` so that whatever the tool printed passes through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceRecord {
    /// Block device path, e.g. `/dev/nvme0n1`. Never empty.
    pub device_path: String,
    /// Character device path, e.g. `/dev/ng0n1`.
    pub generic_path: String,
    pub firmware: String,
    pub model_number: String,
    pub serial_number: String,
    #[serde(rename = "NameSpace")]
    pub namespace: f64,
    pub used_bytes: f64,
    #[serde(rename = "MaximumLBA")]
    pub maximum_lba: f64,
    pub physical_size: f64,
    pub sector_size: f64,
}

impl DeviceRecord {
    /// Builds a record from one element of the flat schema.
    pub fn from_flat(device: &Value) -> Self {
        DeviceRecord {
            device_path: str_field(device, "DevicePath"),
            generic_path: str_field(device, "GenericPath"),
            firmware: str_field(device, "Firmware"),
            model_number: str_field(device, "ModelNumber"),
            serial_number: str_field(device, "SerialNumber"),
            namespace: num_field(device, "NameSpace"),
            used_bytes: num_field(device, "UsedBytes"),
            maximum_lba: num_field(device, "MaximumLBA"),
            physical_size: num_field(device, "PhysicalSize"),
            sector_size: num_field(device, "SectorSize"),
        }
    }

    /// Builds a record from a nested namespace and its owning controller.
    fn from_nested(controller: &Value, namespace: &Value) -> Self {
        DeviceRecord {
            device_path: dev_path(&str_field(namespace, "NameSpace")),
            generic_path: dev_path(&str_field(namespace, "Generic")),
            firmware: str_field(controller, "Firmware"),
            model_number: str_field(controller, "ModelNumber"),
            serial_number: str_field(controller, "SerialNumber"),
            namespace: num_field(namespace, "NSID"),
            used_bytes: num_field(namespace, "UsedBytes"),
            maximum_lba: num_field(namespace, "MaximumLBA"),
            physical_size: num_field(namespace, "PhysicalSize"),
            sector_size: num_field(namespace, "SectorSize"),
        }
    }

    /// Label values of the info metrics, in declaration order.
    pub fn info_labels(&self) -> [&str; 5] {
        [
            &self.device_path,
            &self.generic_path,
            &self.firmware,
            &self.model_number,
            &self.serial_number,
        ]
    }

    /// JSON form of the record, keyed like the flat inventory schema.
    pub fn to_document(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Flattens an inventory document into device records.
///
/// The first element of `Devices` decides the schema. Output order follows
/// the document (devices, subsystems, controllers, namespaces). Device paths
/// are unique in the result: later repeats of a path are dropped.
pub fn normalize(inventory: &Value) -> Vec<DeviceRecord> {
    let devices = array(inventory, "Devices");

    let nested = devices
        .first()
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key("Subsystems"));

    let records: Vec<DeviceRecord> = if nested {
        devices
            .iter()
            .flat_map(|device| array(device, "Subsystems"))
            .flat_map(|subsystem| array(subsystem, "Controllers"))
            .flat_map(|controller| {
                array(controller, "Namespaces")
                    .iter()
                    .map(move |namespace| DeviceRecord::from_nested(controller, namespace))
            })
            .collect()
    } else {
        devices.iter().map(DeviceRecord::from_flat).collect()
    };

    let total = records.len();
    let mut seen = HashSet::new();
    let records: Vec<DeviceRecord> = records
        .into_iter()
        .filter(|record| {
            if record.device_path.is_empty() {
                return false;
            }
            if !seen.insert(record.device_path.clone()) {
                warn!(
                    "Dropped duplicate inventory entry for {}",
                    record.device_path
                );
                return false;
            }
            true
        })
        .collect();
    if records.len() != total {
        warn!(
            "Dropped {} of {} inventory entries (missing or repeated device path)",
            total - records.len(),
            total
        );
    }

    debug!(
        "Normalized {} device(s) from {} inventory",
        records.len(),
        if nested { "nested" } else { "flat" }
    );
    records
}

/// Runs `<binary> list -o json` and normalizes the result.
pub async fn fetch_devices(
    runner: &dyn CommandRunner,
    binary: &str,
) -> CollectorResult<Vec<DeviceRecord>> {
    let inventory = runner.run_json(binary, &["list", "-o", "json"]).await?;
    Ok(normalize(&inventory))
}

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn str_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn num_field(value: &Value, key: &str) -> f64 {
    value.get(key).map(extract_numeric).unwrap_or(0.0)
}

fn dev_path(name: &str) -> String {
    if name.is_empty() {
        String::new()
    } else {
        format!("/dev/{}", name)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;

    fn flat_device(idx: u64) -> Value {
        json!({
            "NameSpace": 1,
            "DevicePath": format!("/dev/nvme{}n1", idx),
            "GenericPath": format!("/dev/ng{}n1", idx),
            "Firmware": "GDC5302Q",
            "Index": idx,
            "ModelNumber": "Samsung SSD 980 PRO 1TB",
            "SerialNumber": format!("S5GXNF0R{}", idx),
            "UsedBytes": 81234567168u64,
            "MaximumLBA": 1953525168u64,
            "PhysicalSize": 1000204886016u64,
            "SectorSize": 512
        })
    }

    fn nested_inventory(subsystems: usize, controllers: usize, namespaces: usize) -> Value {
        let subsystems: Vec<Value> = (0..subsystems)
            .map(|s| {
                let controllers: Vec<Value> = (0..controllers)
                    .map(|c| {
                        let namespaces: Vec<Value> = (0..namespaces)
                            .map(|n| {
                                json!({
                                    "NameSpace": format!("nvme{}c{}n{}", s, c, n + 1),
                                    "Generic": format!("ng{}n{}", s, n + 1),
                                    "NSID": n + 1,
                                    "UsedBytes": 4096,
                                    "MaximumLBA": 1000,
                                    "PhysicalSize": 512000,
                                    "SectorSize": 512
                                })
                            })
                            .collect();
                        json!({
                            "Controller": format!("nvme{}", c),
                            "SerialNumber": format!("SN-{}-{}", s, c),
                            "ModelNumber": "KIOXIA KCD8XPUG1T92",
                            "Firmware": "1TCRS104",
                            "Transport": "pcie",
                            "Namespaces": namespaces,
                            "Paths": []
                        })
                    })
                    .collect();
                json!({
                    "Subsystem": format!("nvme-subsys{}", s),
                    "SubsystemNQN": "nqn.2019-10.com.kioxia:KCD8XPUG1T92",
                    "Controllers": controllers,
                    "Namespaces": []
                })
            })
            .collect();

        json!({
            "Devices": [{
                "HostNQN": "nqn.2014-08.org.nvmexpress:uuid:1234",
                "HostID": "1234",
                "Subsystems": subsystems
            }]
        })
    }

    #[test]
    fn test_flat_inventory_maps_one_to_one() {
        let inventory = json!({ "Devices": [flat_device(0), flat_device(1), flat_device(2)] });
        let records = normalize(&inventory);

        assert_eq!(records.len(), 3);
        let first = &records[0];
        assert_eq!(first.device_path, "/dev/nvme0n1");
        assert_eq!(first.generic_path, "/dev/ng0n1");
        assert_eq!(first.firmware, "GDC5302Q");
        assert_eq!(first.model_number, "Samsung SSD 980 PRO 1TB");
        assert_eq!(first.serial_number, "S5GXNF0R0");
        assert_eq!(first.namespace, 1.0);
        assert_eq!(first.used_bytes, 81234567168.0);
        assert_eq!(first.maximum_lba, 1953525168.0);
        assert_eq!(first.physical_size, 1000204886016.0);
        assert_eq!(first.sector_size, 512.0);
        assert_eq!(records[2].device_path, "/dev/nvme2n1");
    }

    #[test]
    fn test_nested_inventory_flattens_every_namespace() {
        let records = normalize(&nested_inventory(2, 3, 4));
        assert_eq!(records.len(), 2 * 3 * 4);
        assert!(records.iter().all(|r| r.device_path.starts_with("/dev/nvme")));

        let first = &records[0];
        assert_eq!(first.device_path, "/dev/nvme0c0n1");
        assert_eq!(first.generic_path, "/dev/ng0n1");
        assert_eq!(first.serial_number, "SN-0-0");
        assert_eq!(first.firmware, "1TCRS104");
        assert_eq!(first.model_number, "KIOXIA KCD8XPUG1T92");
        assert_eq!(first.namespace, 1.0);
        assert_eq!(first.sector_size, 512.0);
    }

    #[test]
    fn test_nested_inventory_preserves_traversal_order() {
        let records = normalize(&nested_inventory(2, 2, 2));
        let paths: Vec<&str> = records.iter().map(|r| r.device_path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/dev/nvme0c0n1",
                "/dev/nvme0c0n2",
                "/dev/nvme0c1n1",
                "/dev/nvme0c1n2",
                "/dev/nvme1c0n1",
                "/dev/nvme1c0n2",
                "/dev/nvme1c1n1",
                "/dev/nvme1c1n2",
            ]
        );
    }

    #[test]
    fn test_empty_inventory() {
        assert!(normalize(&json!({ "Devices": [] })).is_empty());
        assert!(normalize(&json!({})).is_empty());
        assert!(normalize(&nested_inventory(0, 0, 0)).is_empty());
    }

    #[test]
    fn test_entries_without_device_path_are_dropped() {
        let inventory = json!({ "Devices": [flat_device(0), { "Firmware": "X" }] });
        let records = normalize(&inventory);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_lenient_numeric_fields() {
        let record = DeviceRecord::from_flat(&json!({
            "DevicePath": "/dev/nvme0n1",
            "UsedBytes": "2048",
            "SectorSize": 4096.0,
            "MaximumLBA": "n/a"
        }));
        assert_eq!(record.used_bytes, 2048.0);
        assert_eq!(record.sector_size, 4096.0);
        assert_eq!(record.maximum_lba, 0.0);
        assert_eq!(record.firmware, "");
    }

    #[test]
    fn test_flat_numbers_pass_through_unchanged() {
        let record = DeviceRecord::from_flat(&json!({
            "DevicePath": "/dev/nvme0n1",
            "UsedBytes": 1536.5,
            "PhysicalSize": -1,
            "NameSpace": { "value": 7 }
        }));
        assert_eq!(record.used_bytes, 1536.5);
        assert_eq!(record.physical_size, -1.0);
        assert_eq!(record.namespace, 7.0);

        let doc = record.to_document();
        assert_eq!(doc["UsedBytes"], 1536.5);
        assert_eq!(doc["PhysicalSize"], -1.0);
    }

    #[test]
    #[traced_test]
    fn test_repeated_device_path_is_kept_once() {
        let mut inventory = nested_inventory(1, 2, 1);
        let shared = json!({ "NameSpace": "nvme0n1", "Generic": "ng0n1", "NSID": 1 });
        for controller in inventory["Devices"][0]["Subsystems"][0]["Controllers"]
            .as_array_mut()
            .unwrap()
        {
            controller["Namespaces"] = json!([shared.clone()]);
        }

        let records = normalize(&inventory);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].device_path, "/dev/nvme0n1");
        assert_eq!(records[0].serial_number, "SN-0-0");
        assert!(logs_contain("Dropped duplicate inventory entry for /dev/nvme0n1"));
    }

    #[test]
    fn test_repeated_flat_entries_keep_first() {
        let mut second = flat_device(0);
        second["SerialNumber"] = json!("OTHER");
        let inventory = json!({ "Devices": [flat_device(0), flat_device(1), second] });

        let records = normalize(&inventory);
        let paths: Vec<&str> = records.iter().map(|r| r.device_path.as_str()).collect();
        assert_eq!(paths, vec!["/dev/nvme0n1", "/dev/nvme1n1"]);
        assert_eq!(records[0].serial_number, "S5GXNF0R0");
    }

    #[test]
    fn test_to_document_uses_inventory_keys() {
        let record = DeviceRecord::from_flat(&flat_device(0));
        let doc = record.to_document();
        assert_eq!(doc["DevicePath"], "/dev/nvme0n1");
        assert_eq!(doc["NameSpace"], 1.0);
        assert_eq!(doc["MaximumLBA"], 1953525168.0);
        assert_eq!(doc["UsedBytes"], 81234567168.0);
        assert_eq!(doc["SectorSize"], 512.0);
    }

    #[test]
    fn test_info_labels_order() {
        let record = DeviceRecord::from_flat(&flat_device(3));
        assert_eq!(
            record.info_labels(),
            [
                "/dev/nvme3n1",
                "/dev/ng3n1",
                "GDC5302Q",
                "Samsung SSD 980 PRO 1TB",
                "S5GXNF0R3"
            ]
        );
    }
}
