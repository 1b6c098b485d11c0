//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during aggregation
//! - handed to the chart adapter as typed columns
//! - exported to JSON

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One row of the source price table.
///
/// Optional numeric fields mirror empty cells in the source CSV; every mean
/// over them skips `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub period: NaiveDate,
    pub commodity: String,
    pub category: String,
    pub market: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Price normalized to a common unit/currency basis.
    pub price: Option<f64>,
    pub price_mean: Option<f64>,
    pub price_median: Option<f64>,
    pub price_std: Option<f64>,
}

/// The loaded dataset. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    records: Vec<PriceRecord>,
}

impl PriceTable {
    pub fn new(records: Vec<PriceRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A typed column name.
///
/// Aggregates expose their columns as `Field`s and chart encodings bind
/// `Field`s, so the two can be checked against each other without strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Period,
    Commodity,
    Category,
    Market,
    Latitude,
    Longitude,
    Price,
    PriceMean,
    PriceMedian,
    PriceStd,
}

impl Field {
    /// Column header in the source CSV.
    pub fn column_name(self) -> &'static str {
        match self {
            Field::Period => "Reference_Period_Start",
            Field::Commodity => "Commodity_Name",
            Field::Category => "Commodity_Category",
            Field::Market => "Market_Name",
            Field::Latitude => "Latitude",
            Field::Longitude => "Longitude",
            Field::Price => "Standardized_Price",
            Field::PriceMean => "Price_Mean",
            Field::PriceMedian => "Price_Median",
            Field::PriceStd => "Price_Std",
        }
    }

    /// Human-readable label for axes and table headers.
    pub fn label(self) -> &'static str {
        match self {
            Field::Period => "period",
            Field::Commodity => "commodity",
            Field::Category => "category",
            Field::Market => "market",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::Price => "price",
            Field::PriceMean => "price mean",
            Field::PriceMedian => "price median",
            Field::PriceStd => "price std",
        }
    }

    pub const REQUIRED: [Field; 10] = [
        Field::Period,
        Field::Commodity,
        Field::Category,
        Field::Market,
        Field::Latitude,
        Field::Longitude,
        Field::Price,
        Field::PriceMean,
        Field::PriceMedian,
        Field::PriceStd,
    ];
}

/// One value of a derived table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Date(NaiveDate),
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Date(d) => write!(f, "{d}"),
            Cell::Number(v) => write!(f, "{v:.4}"),
            Cell::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Number of commodities shown on each side of the top/bottom ranking.
///
/// Restricted to `[TopN::MIN, TopN::MAX]`, matching the slider range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct TopN(usize);

impl TopN {
    pub const MIN: usize = 5;
    pub const MAX: usize = 20;
    pub const DEFAULT: usize = 10;

    pub fn new(n: usize) -> Result<Self, AppError> {
        if !(Self::MIN..=Self::MAX).contains(&n) {
            return Err(AppError::invalid_input(format!(
                "Top N must be between {} and {} (got {n}).",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(n))
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// One slider step up, clamped to the maximum.
    pub fn increment(self) -> Self {
        Self((self.0 + 1).min(Self::MAX))
    }

    /// One slider step down, clamped to the minimum.
    pub fn decrement(self) -> Self {
        Self(self.0.saturating_sub(1).max(Self::MIN))
    }
}

impl TryFrom<usize> for TopN {
    type Error = AppError;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<TopN> for usize {
    fn from(n: TopN) -> Self {
        n.0
    }
}

impl Default for TopN {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// The fixed menu of views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewKind {
    Description,
    PriceOverTime,
    Distribution,
    Regional,
    TopBottom,
    Volatility,
    CategoryTrends,
    MeanVsMedian,
}

impl ViewKind {
    /// Menu order.
    pub const ALL: [ViewKind; 8] = [
        ViewKind::Description,
        ViewKind::PriceOverTime,
        ViewKind::Distribution,
        ViewKind::Regional,
        ViewKind::TopBottom,
        ViewKind::Volatility,
        ViewKind::CategoryTrends,
        ViewKind::MeanVsMedian,
    ];

    /// Short identifier used on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            ViewKind::Description => "description",
            ViewKind::PriceOverTime => "price-over-time",
            ViewKind::Distribution => "distribution",
            ViewKind::Regional => "regional",
            ViewKind::TopBottom => "top-bottom",
            ViewKind::Volatility => "volatility",
            ViewKind::CategoryTrends => "category-trends",
            ViewKind::MeanVsMedian => "mean-vs-median",
        }
    }

    /// Menu label.
    pub fn title(self) -> &'static str {
        match self {
            ViewKind::Description => "App Description",
            ViewKind::PriceOverTime => "Average Price Over Time",
            ViewKind::Distribution => "Price Distribution",
            ViewKind::Regional => "Regional Price Differences",
            ViewKind::TopBottom => "Top/Bottom Priced Commodities",
            ViewKind::Volatility => "Price Volatility",
            ViewKind::CategoryTrends => "Category-wise Trends",
            ViewKind::MeanVsMedian => "Median vs Mean Comparison",
        }
    }

    /// Resolve an exact slug or exact menu title. No prefix or fuzzy matching.
    pub fn from_name(name: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == name || kind.title() == name)
            .ok_or_else(|| AppError::unknown_view(name))
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + 1).min(Self::ALL.len() - 1)]
    }

    pub fn prev(self) -> Self {
        Self::ALL[self.index().saturating_sub(1)]
    }
}

/// A fully-parameterized view selection.
///
/// Each variant carries exactly the inputs its aggregation needs.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewRequest {
    Description,
    PriceOverTime { commodity: String },
    Distribution { commodities: Vec<String> },
    Regional,
    TopBottom { n: TopN },
    Volatility,
    CategoryTrends,
    MeanVsMedian,
}

impl ViewRequest {
    pub fn kind(&self) -> ViewKind {
        match self {
            ViewRequest::Description => ViewKind::Description,
            ViewRequest::PriceOverTime { .. } => ViewKind::PriceOverTime,
            ViewRequest::Distribution { .. } => ViewKind::Distribution,
            ViewRequest::Regional => ViewKind::Regional,
            ViewRequest::TopBottom { .. } => ViewKind::TopBottom,
            ViewRequest::Volatility => ViewKind::Volatility,
            ViewRequest::CategoryTrends => ViewKind::CategoryTrends,
            ViewRequest::MeanVsMedian => ViewKind::MeanVsMedian,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn view_kind_resolves_slug_and_title() {
        assert_eq!(ViewKind::from_name("volatility").unwrap(), ViewKind::Volatility);
        assert_eq!(
            ViewKind::from_name("Median vs Mean Comparison").unwrap(),
            ViewKind::MeanVsMedian
        );
        for kind in ViewKind::ALL {
            assert_eq!(ViewKind::from_name(kind.slug()).unwrap(), kind);
            assert_eq!(ViewKind::from_name(kind.title()).unwrap(), kind);
        }
    }

    #[test]
    fn view_kind_rejects_partial_names() {
        for name in ["vol", "Volatility", "price", "", "top-bottom "] {
            let err = ViewKind::from_name(name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnknownView, "{name:?}");
        }
    }

    #[test]
    fn view_kind_navigation_clamps() {
        assert_eq!(ViewKind::Description.prev(), ViewKind::Description);
        assert_eq!(ViewKind::MeanVsMedian.next(), ViewKind::MeanVsMedian);
        assert_eq!(ViewKind::Regional.next(), ViewKind::TopBottom);
    }

    #[test]
    fn top_n_range() {
        assert!(TopN::new(4).is_err());
        assert!(TopN::new(21).is_err());
        assert_eq!(TopN::new(5).unwrap().get(), 5);
        assert_eq!(TopN::default().get(), 10);
        assert_eq!(TopN::new(20).unwrap().increment().get(), 20);
        assert_eq!(TopN::new(5).unwrap().decrement().get(), 5);
    }

    #[test]
    fn top_n_deserialization_is_range_checked() {
        assert!(serde_json::from_str::<TopN>("0").is_err());
        assert!(serde_json::from_str::<TopN>("21").is_err());
        let n: TopN = serde_json::from_str("7").unwrap();
        assert_eq!(n.get(), 7);
        assert_eq!(serde_json::to_string(&n).unwrap(), "7");
    }
}
