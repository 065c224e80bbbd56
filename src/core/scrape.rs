//! Composite collector driving one full scrape.
//!
//! A scrape fetches the device inventory once and then asks every metric
//! group, in a fixed order, for the metrics of each device. The
//! [`ValidationGate`] is consulted first; while it is invalid no command is
//! run and only the skipped-scrape counter moves.

use std::sync::Arc;

use prometheus::{
    core::{Collector, Desc},
    proto::MetricFamily,
    IntCounter,
};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use super::{
    collectors::{
        device::fetch_devices,
        info::InfoGroup,
        registry::Groups,
        smart_log::smart_log_group,
        traits::MetricGroup,
        types::{CollectorResult, ConstMetric},
        CollectorError,
    },
    command::CommandRunner,
    exposition::into_families,
    gate::ValidationGate,
};
use crate::config::nvme::NvmeConfig;

pub const SKIPPED_SCRAPES_METRIC: &str = "nvme_exporter_skipped_scrapes_total";

pub struct NvmeCollector {
    runner: Arc<dyn CommandRunner>,
    gate: Arc<ValidationGate>,
    binary: String,
    groups: Vec<Arc<dyn MetricGroup>>,
    skipped: IntCounter,
    scrape_lock: Mutex<()>,
}

impl NvmeCollector {
    /// Builds the collector with the info and smart-log groups followed by
    /// the optional groups named in `config.optional_logs`.
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        gate: Arc<ValidationGate>,
        config: &NvmeConfig,
    ) -> CollectorResult<Self> {
        let mut groups: Vec<Arc<dyn MetricGroup>> = vec![
            Arc::new(InfoGroup::new()?),
            Arc::new(smart_log_group(runner.clone(), &config.binary)?),
        ];
        for name in &config.optional_logs {
            groups.push(Groups::build(name, runner.clone(), &config.binary)?);
        }

        Self::with_groups(runner, gate, &config.binary, groups)
    }

    /// Builds the collector from an explicit, already ordered group list.
    pub fn with_groups(
        runner: Arc<dyn CommandRunner>,
        gate: Arc<ValidationGate>,
        binary: &str,
        groups: Vec<Arc<dyn MetricGroup>>,
    ) -> CollectorResult<Self> {
        let skipped = IntCounter::new(
            SKIPPED_SCRAPES_METRIC,
            "Number of scrapes skipped because the environment is invalid",
        )
        .map_err(|source| CollectorError::Descriptor {
            metric: SKIPPED_SCRAPES_METRIC.to_string(),
            source,
        })?;

        info!(
            "Collector ready with groups: {}",
            groups
                .iter()
                .map(|g| g.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            runner,
            gate,
            binary: binary.to_string(),
            groups,
            skipped,
            scrape_lock: Mutex::new(()),
        })
    }

    pub fn group_names(&self) -> Vec<&'static str> {
        self.groups.iter().map(|g| g.name()).collect()
    }

    pub fn gate(&self) -> &Arc<ValidationGate> {
        &self.gate
    }

    pub fn skipped_scrapes(&self) -> u64 {
        self.skipped.get()
    }

    /// Descriptors of every metric a scrape can produce.
    pub fn describe(&self) -> Vec<&Desc> {
        let mut descs: Vec<&Desc> = self.groups.iter().flat_map(|g| g.describe()).collect();
        descs.extend(self.skipped.desc());
        descs
    }

    /// Runs one scrape, handing every produced metric to `emit`.
    ///
    /// Concurrent calls are serialized. Failures never propagate: a broken
    /// inventory yields no metrics, a broken group yields what its kind
    /// allows.
    pub async fn collect<F>(&self, mut emit: F)
    where
        F: FnMut(ConstMetric) + Send,
    {
        let _guard = self.scrape_lock.lock().await;

        if !self.gate.is_valid() {
            self.skipped.inc();
            debug!(
                "Skipping scrape, environment invalid: {}",
                self.gate.state().reason()
            );
            return;
        }

        let devices = match fetch_devices(self.runner.as_ref(), &self.binary).await {
            Ok(devices) => devices,
            Err(e) => {
                warn!("Failed to list NVMe devices: {}", e);
                return;
            }
        };

        for device in &devices {
            for group in &self.groups {
                let metrics = group.collect(device).await;
                trace!(
                    "Group '{}' ({:?}) produced {} metric(s) for {}",
                    group.name(),
                    group.kind(),
                    metrics.len(),
                    device.device_path
                );
                metrics.into_iter().for_each(&mut emit);
            }
        }
    }

    /// Runs one scrape and returns the metric families to expose, with the
    /// skipped-scrape counter last.
    pub async fn gather(&self) -> Vec<MetricFamily> {
        let mut metrics = Vec::new();
        self.collect(|metric| metrics.push(metric)).await;

        let mut families = into_families(metrics);
        families.extend(self.skipped.collect());
        families
    }
}
