//! Metric groups backed by a per-device log page fetched through nvme-cli.

use std::sync::Arc;

use prometheus::core::Desc;
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    device::DeviceRecord,
    error::CollectorError,
    provider::{FieldProvider, FieldSpec},
    traits::{GroupKind, MetricGroup},
    types::{CollectorResult, ConstMetric},
};
use crate::core::command::{command_line, CommandRunner};

/// Labels attached to every log metric.
pub const LOG_LABELS: [&str; 1] = ["device"];

/// A log page group: one fetch per device, many providers reading from it.
pub struct LogGroup {
    name: &'static str,
    kind: GroupKind,
    subcommand: &'static [&'static str],
    binary: String,
    runner: Arc<dyn CommandRunner>,
    providers: Vec<FieldProvider>,
}

impl LogGroup {
    /// Creates a log group running `<binary> <subcommand...> <device> -o json`.
    ///
    /// `kind` must be [`GroupKind::RequiredLog`] or [`GroupKind::OptionalLog`].
    pub fn new(
        name: &'static str,
        kind: GroupKind,
        subcommand: &'static [&'static str],
        fields: &[FieldSpec],
        runner: Arc<dyn CommandRunner>,
        binary: &str,
    ) -> CollectorResult<Self> {
        if kind == GroupKind::Info {
            return Err(CollectorError::InvalidGroup {
                name: name.to_string(),
                reason: "log groups fetch a document and cannot be of kind Info".to_string(),
            });
        }
        Ok(Self {
            name,
            kind,
            subcommand,
            binary: binary.to_string(),
            runner,
            providers: FieldProvider::from_table(fields, &LOG_LABELS)?,
        })
    }

    async fn fetch(&self, device: &str) -> Option<Value> {
        let mut args: Vec<&str> = self.subcommand.to_vec();
        args.extend([device, "-o", "json"]);

        match self.runner.run_json(&self.binary, &args).await {
            Ok(document) => Some(document),
            Err(e) => {
                warn!(
                    "Error running '{}': {}",
                    command_line(&self.binary, &args),
                    e
                );
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl MetricGroup for LogGroup {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> GroupKind {
        self.kind
    }

    fn describe(&self) -> Vec<&Desc> {
        self.providers.iter().map(FieldProvider::desc).collect()
    }

    async fn collect(&self, device: &DeviceRecord) -> Vec<ConstMetric> {
        let document = match (self.fetch(&device.device_path).await, self.kind) {
            (Some(document), _) => document,
            (None, GroupKind::OptionalLog) => {
                debug!(
                    "Skipping '{}' metrics for {}",
                    self.name, device.device_path
                );
                return Vec::new();
            }
            (None, _) => Value::Object(Default::default()),
        };

        let labels = [device.device_path.as_str()];
        self.providers
            .iter()
            .filter_map(|provider| provider.resolve(Some(&document), &labels))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::core::command::CommandError;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::gauge("nvme_test_temperature", "Temperature", "temperature"),
        FieldSpec::counter("nvme_test_power_cycles", "Power cycles", "power_cycles"),
    ];

    struct StubRunner {
        calls: AtomicUsize,
        response: Option<Value>,
        last_args: std::sync::Mutex<Vec<String>>,
    }

    impl StubRunner {
        fn new(response: Option<Value>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response,
                last_args: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl CommandRunner for StubRunner {
        async fn run(&self, command: &str, args: &[&str]) -> Result<String, CommandError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_args.lock().unwrap() = args.iter().map(|a| a.to_string()).collect();
            match &self.response {
                Some(value) => Ok(value.to_string()),
                None => Err(CommandError::ExecutionFailed {
                    command: command.to_string(),
                    status: "exit status: 1".into(),
                    output: "failed".into(),
                }),
            }
        }
    }

    fn device() -> DeviceRecord {
        DeviceRecord {
            device_path: "/dev/nvme0n1".into(),
            ..Default::default()
        }
    }

    fn group(kind: GroupKind, runner: Arc<StubRunner>) -> LogGroup {
        LogGroup::new("test", kind, &["smart-log"], FIELDS, runner, "nvme").unwrap()
    }

    #[tokio::test]
    async fn test_fetches_once_for_all_providers() {
        let runner = Arc::new(StubRunner::new(Some(json!({
            "temperature": 310,
            "power_cycles": { "value": 12 }
        }))));
        let metrics = group(GroupKind::RequiredLog, runner.clone())
            .collect(&device())
            .await;

        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *runner.last_args.lock().unwrap(),
            vec!["smart-log", "/dev/nvme0n1", "-o", "json"]
        );
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].value, 310.0);
        assert_eq!(metrics[1].value, 12.0);
        assert_eq!(metrics[1].label("device"), Some("/dev/nvme0n1"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_required_log_failure_emits_zeroes() {
        let runner = Arc::new(StubRunner::new(None));
        let metrics = group(GroupKind::RequiredLog, runner).collect(&device()).await;

        assert_eq!(metrics.len(), 2);
        assert!(metrics.iter().all(|m| m.value == 0.0));
        assert!(logs_contain("Error running 'nvme smart-log /dev/nvme0n1 -o json'"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_optional_log_failure_emits_nothing() {
        let runner = Arc::new(StubRunner::new(None));
        let metrics = group(GroupKind::OptionalLog, runner).collect(&device()).await;

        assert!(metrics.is_empty());
        assert!(logs_contain("Error running"));
    }

    #[test]
    fn test_info_kind_is_rejected() {
        let runner = Arc::new(StubRunner::new(None));
        let result = LogGroup::new("test", GroupKind::Info, &["smart-log"], FIELDS, runner.clone(), "nvme");
        assert!(matches!(
            result,
            Err(CollectorError::InvalidGroup { ref name, .. }) if name == "test"
        ));
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }
}
