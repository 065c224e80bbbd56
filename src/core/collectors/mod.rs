/// Device inventory records and schema normalization.
pub mod device;

/// Error types shared by the collection pipeline.
pub mod error;

/// Static namespace information group.
pub mod info;

/// Generic log-page backed metric group.
pub mod log_page;

/// OCP datacenter extended SMART log group (optional).
pub mod ocp_log;

/// JSON field to metric mapping.
pub mod provider;

/// Registry of optional metric groups selectable from configuration.
pub mod registry;

/// SMART / health information log group.
pub mod smart_log;

pub mod traits;

pub mod types;

// ----------------------------------------------------------------------------
// Re-exports for public API
// ----------------------------------------------------------------------------

pub use device::{fetch_devices, normalize, DeviceRecord};
pub use error::CollectorError;
pub use info::InfoGroup;
pub use log_page::LogGroup;
pub use provider::{extract_numeric, FieldProvider, FieldSpec};
pub use registry::{GroupRegistry, Groups};
pub use smart_log::smart_log_group;
pub use traits::{GroupKind, MetricGroup};
pub use types::{CollectorResult, ConstMetric, ValueKind};
