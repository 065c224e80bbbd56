//! End-to-end scrape through the public API with a scripted nvme-cli.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use nvme_exporter::{
    config::nvme::NvmeConfig,
    core::{
        command::{CommandError, CommandRunner},
        exposition::encode,
        gate::ValidationGate,
        preflight::{validate_version, ToolVersion},
        scrape::NvmeCollector,
    },
};
use serde_json::json;

/// Mimics nvme-cli 2.x: nested inventory with two controllers sharing a
/// subsystem, one namespace each.
struct FakeNvme {
    version: &'static str,
    calls: AtomicUsize,
}

impl FakeNvme {
    fn new(version: &'static str) -> Self {
        Self {
            version,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl CommandRunner for FakeNvme {
    async fn run(&self, command: &str, args: &[&str]) -> Result<String, CommandError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let output = match args {
            ["--version"] => format!("nvme version {} (git {})", self.version, self.version),
            ["list", "-o", "json"] => json!({
                "Devices": [{
                    "HostNQN": "nqn.2014-08.org.nvmexpress:uuid:host",
                    "Subsystems": [{
                        "Subsystem": "nvme-subsys0",
                        "Controllers": [
                            {
                                "Controller": "nvme0",
                                "SerialNumber": "SN-A",
                                "ModelNumber": "Fake NVMe",
                                "Firmware": "FW1",
                                "Namespaces": [{
                                    "NameSpace": "nvme0n1",
                                    "Generic": "ng0n1",
                                    "NSID": 1,
                                    "UsedBytes": 1000,
                                    "MaximumLBA": 2000,
                                    "PhysicalSize": 1024000,
                                    "SectorSize": 512
                                }]
                            },
                            {
                                "Controller": "nvme1",
                                "SerialNumber": "SN-B",
                                "ModelNumber": "Fake NVMe",
                                "Firmware": "FW1",
                                "Namespaces": [{
                                    "NameSpace": "nvme1n1",
                                    "Generic": "ng1n1",
                                    "NSID": 1,
                                    "UsedBytes": 10,
                                    "MaximumLBA": 20,
                                    "PhysicalSize": 10240,
                                    "SectorSize": 4096
                                }]
                            }
                        ]
                    }]
                }]
            })
            .to_string(),
            ["smart-log", device, "-o", "json"] => json!({
                "critical_warning": 0,
                "temperature": if *device == "/dev/nvme0n1" { 310 } else { 305 },
                "power_cycles": 12
            })
            .to_string(),
            _ => {
                return Err(CommandError::ExecutionFailed {
                    command: format!("{} {}", command, args.join(" ")),
                    status: "exit status: 22".into(),
                    output: "Invalid command".into(),
                })
            }
        };
        Ok(output)
    }
}

fn collector(runner: Arc<FakeNvme>, gate: Arc<ValidationGate>) -> NvmeCollector {
    let config = NvmeConfig {
        optional_logs: vec!["ocp".into()],
        ..NvmeConfig::default()
    };
    NvmeCollector::new(runner, gate, &config).unwrap()
}

#[tokio::test]
async fn test_nested_inventory_scrape_renders_all_devices() {
    let runner = Arc::new(FakeNvme::new("2.11"));
    let gate = Arc::new(ValidationGate::new());
    validate_version(runner.as_ref(), "nvme", ToolVersion::DEFAULT_FLOOR, &gate)
        .await
        .unwrap();

    let collector = collector(runner.clone(), gate);
    let text = encode(&collector.gather().await).unwrap();

    assert!(text.contains(
        r#"nvme_sector_size{device="/dev/nvme1n1",generic_path="/dev/ng1n1",firmware="FW1",model_number="Fake NVMe",serial_number="SN-B"} 4096"#
    ));
    assert!(text.contains(r#"nvme_temperature{device="/dev/nvme0n1"} 310"#));
    assert!(text.contains(r#"nvme_temperature{device="/dev/nvme1n1"} 305"#));
    assert!(text.contains("# TYPE nvme_power_cycles counter"));
    assert!(!text.contains("nvme_capacitor_health"));
    assert!(text.contains("nvme_exporter_skipped_scrapes_total 0"));

    // --version, list, then smart-log + ocp per device
    assert_eq!(runner.calls.load(Ordering::SeqCst), 1 + 1 + 2 * 2);
}

#[tokio::test]
async fn test_unsupported_version_turns_scrapes_into_noops() {
    let runner = Arc::new(FakeNvme::new("2.7"));
    let gate = Arc::new(ValidationGate::new());
    assert!(
        validate_version(runner.as_ref(), "nvme", ToolVersion::DEFAULT_FLOOR, &gate)
            .await
            .is_err()
    );

    let collector = collector(runner.clone(), gate);
    let before = runner.calls.load(Ordering::SeqCst);

    let families = collector.gather().await;
    let text = encode(&families).unwrap();

    assert_eq!(families.len(), 1);
    assert!(text.contains("nvme_exporter_skipped_scrapes_total 1"));
    assert_eq!(runner.calls.load(Ordering::SeqCst), before);
}
