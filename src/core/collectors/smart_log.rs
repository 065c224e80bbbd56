//! SMART / health information log page (`nvme smart-log`).
//!
//! Field descriptions follow the SMART / Health Information log page of the
//! NVM Express Base Specification.

use std::sync::Arc;

use super::{
    log_page::LogGroup,
    provider::FieldSpec,
    traits::GroupKind,
    types::CollectorResult,
};
use crate::core::command::CommandRunner;

pub const SMART_LOG_FIELDS: &[FieldSpec] = &[
    FieldSpec::gauge(
        "nvme_critical_warning",
        "Critical warnings for the state of the controller",
        "critical_warning",
    ),
    FieldSpec::gauge(
        "nvme_temperature",
        "Composite temperature of the controller in kelvin",
        "temperature",
    ),
    FieldSpec::gauge(
        "nvme_avail_spare",
        "Normalized percentage of remaining spare capacity available",
        "avail_spare",
    ),
    FieldSpec::gauge(
        "nvme_spare_thresh",
        "Async event completion may occur when avail spare < threshold",
        "spare_thresh",
    ),
    FieldSpec::gauge(
        "nvme_percent_used",
        "Vendor specific estimate of the percentage of life used",
        "percent_used",
    ),
    FieldSpec::gauge(
        "nvme_endurance_grp_critical_warning_summary",
        "Critical warnings for the state of endurance groups",
        "endurance_grp_critical_warning_summary",
    ),
    FieldSpec::counter(
        "nvme_data_units_read",
        "Number of 512 byte data units host has read",
        "data_units_read",
    ),
    FieldSpec::counter(
        "nvme_data_units_written",
        "Number of 512 byte data units the host has written",
        "data_units_written",
    ),
    FieldSpec::counter(
        "nvme_host_read_commands",
        "Number of read commands completed",
        "host_read_commands",
    ),
    FieldSpec::counter(
        "nvme_host_write_commands",
        "Number of write commands completed",
        "host_write_commands",
    ),
    FieldSpec::counter(
        "nvme_controller_busy_time",
        "Amount of time in minutes controller busy with IO commands",
        "controller_busy_time",
    ),
    FieldSpec::counter("nvme_power_cycles", "Number of power cycles", "power_cycles"),
    FieldSpec::counter(
        "nvme_power_on_hours",
        "Number of power on hours",
        "power_on_hours",
    ),
    FieldSpec::counter(
        "nvme_unsafe_shutdowns",
        "Number of unsafe shutdowns",
        "unsafe_shutdowns",
    ),
    FieldSpec::counter(
        "nvme_media_errors",
        "Number of unrecovered data integrity errors",
        "media_errors",
    ),
    FieldSpec::counter(
        "nvme_num_err_log_entries",
        "Lifetime number of error log entries",
        "num_err_log_entries",
    ),
    FieldSpec::counter(
        "nvme_warning_temp_time",
        "Amount of time in minutes temperature > warning threshold",
        "warning_temp_time",
    ),
    FieldSpec::counter(
        "nvme_critical_comp_time",
        "Amount of time in minutes temperature > critical threshold",
        "critical_comp_time",
    ),
    FieldSpec::counter(
        "nvme_thm_temp1_trans_count",
        "Number of times controller transitioned to lower power for thermal management temperature 1",
        "thm_temp1_trans_count",
    ),
    FieldSpec::counter(
        "nvme_thm_temp2_trans_count",
        "Number of times controller transitioned to lower power for thermal management temperature 2",
        "thm_temp2_trans_count",
    ),
    FieldSpec::counter(
        "nvme_thm_temp1_trans_time",
        "Total number of seconds controller spent in lower power for thermal management temperature 1",
        "thm_temp1_total_time",
    ),
    FieldSpec::counter(
        "nvme_thm_temp2_trans_time",
        "Total number of seconds controller spent in lower power for thermal management temperature 2",
        "thm_temp2_total_time",
    ),
];

/// Builds the mandatory smart-log group.
pub fn smart_log_group(runner: Arc<dyn CommandRunner>, binary: &str) -> CollectorResult<LogGroup> {
    LogGroup::new(
        "smart-log",
        GroupKind::RequiredLog,
        &["smart-log"],
        SMART_LOG_FIELDS,
        runner,
        binary,
    )
}
