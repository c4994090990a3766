pub mod collectors;
pub mod duration;
pub mod error;
pub mod evaluator;
pub mod health;
pub mod rule;
pub mod sample;
pub mod source;
pub mod violation;

pub use collectors::{Collector, DynCollector};
pub use error::{MonitorError, Result};
pub use evaluator::ThresholdEvaluator;
pub use health::{HealthEntry, HealthRegistry, HealthStatus};
pub use rule::{Comparison, RuleId, ThresholdRule};
pub use sample::MetricSample;
pub use source::{DataSourceSpec, SourceKind};
pub use violation::{ViolationMetadata, ViolationRecord};

// Re-export commonly used types
pub use async_trait::async_trait;
