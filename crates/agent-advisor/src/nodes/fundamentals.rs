//! Fundamentals lookup
//!
//! Turns a raw [`TickerSnapshot`] into a fixed, ordered set of metrics. Every
//! metric is always present; missing data shows up as `N/A`.

use super::Services;
use crate::api::TickerSnapshot;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use tracing::{info, instrument, warn};

/// Placeholder for a metric the provider did not report
pub const MISSING: &str = "N/A";

/// Message used when no snapshot could be fetched
pub const UNAVAILABLE: &str = "No data available";

/// Where a metric's value comes from
#[derive(Debug, Clone, Copy)]
enum Source {
    /// First non-empty string among these fields
    Text(&'static [&'static str]),
    /// Field as reported, number or string
    Raw(&'static str),
    /// Fraction rendered as a percentage; zero counts as not reported
    Percent(&'static str),
    /// Last traded price from the quote endpoint
    LastPrice,
}

const METRICS: [(&str, Source); 22] = [
    ("Company", Source::Text(&["longName", "shortName"])),
    ("Business Summary", Source::Text(&["longBusinessSummary"])),
    ("Sector", Source::Text(&["sector"])),
    ("Industry", Source::Text(&["industry"])),
    ("Open", Source::Raw("open")),
    ("Day Low", Source::Raw("dayLow")),
    ("Day High", Source::Raw("dayHigh")),
    ("PE Ratio (trailing)", Source::Raw("trailingPE")),
    ("Forward PE", Source::Raw("forwardPE")),
    ("ROE (%)", Source::Percent("returnOnEquity")),
    ("Debt to Equity Ratio", Source::Raw("debtToEquity")),
    ("Total Revenue (ttm)", Source::Raw("totalRevenue")),
    ("Net Income (ttm)", Source::Raw("netIncomeToCommon")),
    ("Revenue Growth (%)", Source::Percent("revenueGrowth")),
    ("Current Price", Source::LastPrice),
    ("Market Cap", Source::Raw("marketCap")),
    ("Profit Margins", Source::Raw("profitMargins")),
    ("Operating Margins", Source::Raw("operatingMargins")),
    ("Free Cashflow", Source::Raw("freeCashflow")),
    ("Operating Cashflow", Source::Raw("operatingCashflow")),
    ("FiftyTwo Week High", Source::Raw("fiftyTwoWeekHigh")),
    ("FiftyTwo Week Low", Source::Raw("fiftyTwoWeekLow")),
];

/// Metric names, in display order
pub fn metric_names() -> impl Iterator<Item = &'static str> {
    METRICS.iter().map(|(name, _)| *name)
}

/// Render a fraction as a percentage with two decimals (`0.1523` -> `15.23%`)
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Value of one metric
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Numeric value
    Number(f64),
    /// Text value (names, summaries, formatted percentages)
    Text(String),
    /// Not reported
    Missing,
}

impl MetricValue {
    fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => n.as_f64().map_or(Self::Missing, Self::Number),
            Some(Value::String(s)) if !s.is_empty() => Self::Text(s.clone()),
            Some(Value::Bool(b)) => Self::Text(b.to_string()),
            _ => Self::Missing,
        }
    }

    /// Whether the provider reported this metric
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
            Self::Missing => f.write_str(MISSING),
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Missing => serializer.serialize_str(MISSING),
        }
    }
}

/// One named metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    /// Display name
    pub name: &'static str,
    /// Value
    pub value: MetricValue,
}

/// Result of a fundamentals lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Fundamentals {
    /// Every metric, in display order
    Metrics(Vec<Metric>),
    /// The snapshot could not be fetched
    Unavailable,
}

impl Fundamentals {
    /// Build the metric set from a provider snapshot
    pub fn from_snapshot(snapshot: &TickerSnapshot) -> Self {
        let metrics = METRICS
            .iter()
            .map(|&(name, source)| Metric {
                name,
                value: extract_metric(snapshot, source),
            })
            .collect();
        Self::Metrics(metrics)
    }

    /// Name/value pairs; a single `Error` entry when unavailable
    pub fn entries(&self) -> Vec<(&str, String)> {
        match self {
            Self::Metrics(metrics) => metrics
                .iter()
                .map(|m| (m.name, m.value.to_string()))
                .collect(),
            Self::Unavailable => vec![("Error", UNAVAILABLE.to_string())],
        }
    }

    /// Metric names present in this result
    pub fn keys(&self) -> Vec<&str> {
        self.entries().into_iter().map(|(name, _)| name).collect()
    }

    /// Value of a metric by name
    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        match self {
            Self::Metrics(metrics) => metrics.iter().find(|m| m.name == name).map(|m| &m.value),
            Self::Unavailable => None,
        }
    }

    /// Whether a snapshot was obtained
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Metrics(_))
    }

    /// One `name: value` line per metric, for prompts
    pub fn render(&self) -> String {
        self.entries()
            .into_iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn extract_metric(snapshot: &TickerSnapshot, source: Source) -> MetricValue {
    match source {
        Source::Text(keys) => keys
            .iter()
            .find_map(|key| snapshot.text(key))
            .map_or(MetricValue::Missing, |s| MetricValue::Text(s.to_string())),
        Source::Raw(key) => MetricValue::from_json(snapshot.raw(key)),
        Source::Percent(key) => snapshot
            .number(key)
            .filter(|v| v.is_finite() && v.abs() > 0.0)
            .map_or(MetricValue::Missing, |v| MetricValue::Text(format_percent(v))),
        Source::LastPrice => snapshot
            .last_price
            .filter(|p| p.is_finite())
            .map_or(MetricValue::Missing, MetricValue::Number),
    }
}

/// Fundamentals for a ticker; never fails
///
/// An empty ticker is passed through; the data source decides how to fail.
#[instrument(skip(services))]
pub async fn lookup(services: &Services, ticker: &str) -> Fundamentals {
    match services.financials.snapshot(ticker).await {
        Ok(snapshot) => {
            let fundamentals = Fundamentals::from_snapshot(&snapshot);
            info!("Fundamentals for {ticker:?}: {} fields", snapshot.fields.len());
            fundamentals
        }
        Err(e) => {
            warn!("Fundamentals lookup for {ticker:?} failed: {e}");
            Fundamentals::Unavailable
        }
    }
}
