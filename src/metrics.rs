//! Metric Sink
//!
//! Accumulates the data points produced during one collection cycle and
//! hands them off as a [`MetricBatch`].
//!
//! - [`MetricsBuilder`]: Record operations plus `emit()`
//! - [`MetricName`] / [`ErrorType`]: Metric catalogue and error labels
//! - [`DataPoint`] / [`MetricBatch`]: What the exporter receives

mod builder;
mod types;

pub use builder::MetricsBuilder;
pub use types::{Attributes, DataPoint, ErrorType, MetricBatch, MetricName, MetricValue};
