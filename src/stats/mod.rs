//! Stats module - derived metrics, risk scoring and summaries

pub mod metrics;
pub mod scorer;
pub mod summary;
pub mod table;

pub use metrics::{DerivedMetrics, MetricDeriver, MetricError};
pub use scorer::{RiskMetric, RiskScorer};
pub use summary::{ColumnSummary, SummaryCalculator};
pub use table::{MapFeature, PrefectureRecord, RankingEntry, RiskTable};
