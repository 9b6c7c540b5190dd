//! Per-URL page metrics: normalization, validation, display formatting and
//! the create/list/latest operations built on top of [`Storage`].
//!
//! [`Storage`]: crate::storage::Storage

pub mod datetime;
pub mod error;
pub mod normalize;
pub mod service;
pub mod validate;

pub use datetime::{
    format_datetime, parse_visit_datetime, resolve_visit_time, visit_datetime_from_epoch,
    DATETIME_FORMAT,
};
pub use error::{MetricsError, MetricsResult};
pub use normalize::normalize_url;
pub use service::{create_visit, get_latest_metrics, list_visits};
pub use validate::{validate_counts, validate_pagination, validate_timezone_offset, validate_url};

pub const DEFAULT_VISIT_LIMIT: i64 = 50;
pub const MAX_VISIT_LIMIT: i64 = 100;
pub const MAX_URL_LENGTH: usize = 2048;
pub const MIN_TZ_OFFSET_HOURS: f64 = -12.0;
pub const MAX_TZ_OFFSET_HOURS: f64 = 14.0;
