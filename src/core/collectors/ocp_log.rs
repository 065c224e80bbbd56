//! OCP datacenter SMART extended log (`nvme ocp smart-add-log`).
//!
//! Only drives implementing the Open Compute Project datacenter NVMe SSD
//! specification expose this page; on other drives the command fails and
//! the group contributes nothing.

use std::sync::Arc;

use super::{
    log_page::LogGroup,
    provider::FieldSpec,
    traits::{GroupKind, MetricGroup},
    types::CollectorResult,
};
use crate::{core::command::CommandRunner, register_group};

pub const OCP_LOG_FIELDS: &[FieldSpec] = &[
    FieldSpec::counter(
        "nvme_physical_media_units_written_hi",
        "Physical media units written, high 64 bits",
        "Physical media units written.hi",
    ),
    FieldSpec::counter(
        "nvme_physical_media_units_written_lo",
        "Physical media units written, low 64 bits",
        "Physical media units written.lo",
    ),
    FieldSpec::counter(
        "nvme_physical_media_units_read_hi",
        "Physical media units read, high 64 bits",
        "Physical media units read.hi",
    ),
    FieldSpec::counter(
        "nvme_physical_media_units_read_lo",
        "Physical media units read, low 64 bits",
        "Physical media units read.lo",
    ),
    FieldSpec::counter(
        "nvme_bad_user_nand_blocks_raw",
        "Raw count of bad user NAND blocks",
        "Bad user nand blocks - Raw",
    ),
    FieldSpec::counter(
        "nvme_bad_user_nand_blocks_normalized",
        "Normalized count of bad user NAND blocks",
        "Bad user nand blocks - Normalized",
    ),
    FieldSpec::counter(
        "nvme_bad_system_nand_blocks_raw",
        "Raw count of bad system NAND blocks",
        "Bad system nand blocks - Raw",
    ),
    FieldSpec::counter(
        "nvme_bad_system_nand_blocks_normalized",
        "Normalized count of bad system NAND blocks",
        "Bad system nand blocks - Normalized",
    ),
    FieldSpec::counter(
        "nvme_xor_recovery_count",
        "Number of times XOR recovery was triggered",
        "XOR recovery count",
    ),
    FieldSpec::counter(
        "nvme_uncorrectable_read_error_count",
        "Number of uncorrectable read errors",
        "Uncorrectable read error count",
    ),
    FieldSpec::counter(
        "nvme_soft_ecc_error_count",
        "Number of reads requiring soft ECC decoding",
        "Soft ecc error count",
    ),
    FieldSpec::counter(
        "nvme_end_to_end_detected_errors",
        "Number of end to end errors detected by the controller",
        "End to end detected errors",
    ),
    FieldSpec::counter(
        "nvme_end_to_end_corrected_errors",
        "Number of end to end errors corrected by the controller",
        "End to end corrected errors",
    ),
    FieldSpec::gauge(
        "nvme_system_data_percent_used",
        "Percentage of system data life used",
        "System data percent used",
    ),
    FieldSpec::counter(
        "nvme_refresh_counts",
        "Number of NAND block refreshes",
        "Refresh counts",
    ),
    FieldSpec::counter(
        "nvme_max_user_data_erase_counts",
        "Maximum erase count across user data blocks",
        "Max User data erase counts",
    ),
    FieldSpec::counter(
        "nvme_min_user_data_erase_counts",
        "Minimum erase count across user data blocks",
        "Min User data erase counts",
    ),
    FieldSpec::counter(
        "nvme_number_of_thermal_throttling_events",
        "Number of thermal throttling events",
        "Number of Thermal throttling events",
    ),
    FieldSpec::gauge(
        "nvme_current_throttling_status",
        "Current thermal throttling status",
        "Current throttling status",
    ),
    FieldSpec::counter(
        "nvme_pcie_correctable_error_count",
        "Number of PCIe correctable errors",
        "PCIe correctable error count",
    ),
    FieldSpec::counter(
        "nvme_incomplete_shutdowns",
        "Number of incomplete shutdowns",
        "Incomplete shutdowns",
    ),
    FieldSpec::gauge(
        "nvme_percent_free_blocks",
        "Percentage of free blocks",
        "Percent free blocks",
    ),
    FieldSpec::gauge(
        "nvme_capacitor_health",
        "Capacitor health as a percentage",
        "Capacitor health",
    ),
    FieldSpec::counter(
        "nvme_unaligned_io",
        "Number of unaligned I/O commands",
        "Unaligned I/O",
    ),
    FieldSpec::gauge(
        "nvme_security_version_number",
        "Security version number of the firmware",
        "Security Version Number",
    ),
    FieldSpec::gauge(
        "nvme_nuse_namespace_utilization",
        "Namespace utilization (NUSE)",
        "NUSE - Namespace utilization",
    ),
    FieldSpec::counter(
        "nvme_plp_start_count",
        "Number of power loss protection events",
        "PLP start count",
    ),
    FieldSpec::gauge(
        "nvme_endurance_estimate",
        "Estimated endurance in bytes that may be written",
        "Endurance estimate",
    ),
    FieldSpec::gauge("nvme_log_page_version", "Log page version", "Log page version"),
    FieldSpec::gauge("nvme_log_page_guid", "Log page GUID", "Log page GUID"),
    FieldSpec::gauge(
        "nvme_errata_version_field",
        "Errata version of the OCP specification",
        "Errata Version Field",
    ),
    FieldSpec::gauge(
        "nvme_point_version_field",
        "Point version of the OCP specification",
        "Point Version Field",
    ),
    FieldSpec::gauge(
        "nvme_minor_version_field",
        "Minor version of the OCP specification",
        "Minor Version Field",
    ),
    FieldSpec::gauge(
        "nvme_major_version_field",
        "Major version of the OCP specification",
        "Major Version Field",
    ),
    FieldSpec::gauge(
        "nvme_nvme_errata_version",
        "NVMe errata version",
        "NVMe Errata Version",
    ),
    FieldSpec::counter(
        "nvme_pcie_link_retraining_count",
        "Number of PCIe link retraining events",
        "PCIe Link Retraining Count",
    ),
    FieldSpec::counter(
        "nvme_power_state_change_count",
        "Number of power state changes",
        "Power State Change Count",
    ),
];

/// Builds the optional OCP extended SMART log group.
pub fn ocp_log_group(
    runner: Arc<dyn CommandRunner>,
    binary: &str,
) -> CollectorResult<Arc<dyn MetricGroup>> {
    let group = LogGroup::new(
        "ocp",
        GroupKind::OptionalLog,
        &["ocp", "smart-add-log"],
        OCP_LOG_FIELDS,
        runner,
        binary,
    )?;
    Ok(Arc::new(group))
}

register_group!(
    "ocp",
    "OCP datacenter extended SMART log (nvme ocp smart-add-log)",
    ocp_log_group
);
