use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a rule in the loaded configuration. Violation counters are
/// keyed by this id, so rules sharing a metric keep independent history.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub usize);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    #[serde(alias = ">")]
    GreaterThan,
    #[serde(alias = "<")]
    LessThan,
    #[serde(alias = "==")]
    Equals,
    #[serde(alias = "!=")]
    NotEquals,
    #[serde(alias = ">=")]
    GreaterThanOrEqual,
    #[serde(alias = "<=")]
    LessThanOrEqual,
}

impl Comparison {
    pub const ALL: [Comparison; 6] = [
        Comparison::GreaterThan,
        Comparison::LessThan,
        Comparison::Equals,
        Comparison::NotEquals,
        Comparison::GreaterThanOrEqual,
        Comparison::LessThanOrEqual,
    ];

    /// True when `value` violates a rule of this kind against `threshold`.
    pub fn violates(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::GreaterThan => value > threshold,
            Comparison::LessThan => value < threshold,
            Comparison::Equals => value == threshold,
            Comparison::NotEquals => value != threshold,
            Comparison::GreaterThanOrEqual => value >= threshold,
            Comparison::LessThanOrEqual => value <= threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::GreaterThan => ">",
            Comparison::LessThan => "<",
            Comparison::Equals => "==",
            Comparison::NotEquals => "!=",
            Comparison::GreaterThanOrEqual => ">=",
            Comparison::LessThanOrEqual => "<=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

fn default_consecutive() -> u32 {
    1
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdRule {
    #[serde(default, skip_deserializing)]
    pub id: RuleId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(alias = "data_source")]
    pub source: String,
    #[serde(alias = "metric_name")]
    pub metric: String,
    #[serde(alias = "threshold_type")]
    pub comparison: Comparison,
    #[serde(alias = "threshold_value")]
    pub threshold: f64,
    #[serde(alias = "consecutive_violations", default = "default_consecutive")]
    pub consecutive: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ThresholdRule {
    pub fn new(
        source: impl Into<String>,
        metric: impl Into<String>,
        comparison: Comparison,
        threshold: f64,
    ) -> Self {
        Self {
            id: RuleId::default(),
            name: None,
            source: source.into(),
            metric: metric.into(),
            comparison,
            threshold,
            consecutive: 1,
            enabled: true,
        }
    }

    pub fn with_id(mut self, id: usize) -> Self {
        self.id = RuleId(id);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn consecutive(mut self, count: u32) -> Self {
        self.consecutive = count;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn description(&self) -> String {
        let label = match &self.name {
            Some(name) => name.clone(),
            None => self.id.to_string(),
        };
        format!(
            "{}: {}.{} {} {} x{}",
            label, self.source, self.metric, self.comparison, self.threshold, self.consecutive
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.source.is_empty() {
            return Err(format!("{} must name a source", self.id));
        }
        if self.metric.is_empty() {
            return Err(format!("{} on '{}' must name a metric", self.id, self.source));
        }
        if !self.threshold.is_finite() {
            return Err(format!("{} threshold must be a finite number", self.id));
        }
        if self.consecutive == 0 {
            return Err(format!("{} consecutive count must be >= 1", self.id));
        }
        Ok(())
    }
}
