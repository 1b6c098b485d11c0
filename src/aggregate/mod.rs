//! Aggregations behind each view.
//!
//! Every function is a pure read of the loaded table: group rows by a key,
//! average one or two columns, then optionally sort and truncate. Groups keep
//! first-encounter order and every sort is stable, so ties never reorder
//! between runs. A selection that matches nothing yields an empty `Vec`.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Cell, Field, PriceTable, Tabular, TopN};

pub mod group;

use group::{Mean, coord_bits, group_by, group_mean};

/// Volatility view length.
pub const VOLATILITY_LIMIT: usize = 15;

/// Default size of the multi-choice commodity selection.
pub const DEFAULT_SELECTION_LEN: usize = 5;

/// Mean price of one commodity in one reference period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodPrice {
    pub period: NaiveDate,
    pub commodity: String,
    pub price: f64,
}

/// A single observed price (no aggregation).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceObservation {
    pub commodity: String,
    pub price: f64,
}

/// Mean price at one market location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketPrice {
    pub market: String,
    pub latitude: f64,
    pub longitude: f64,
    pub price: f64,
}

/// Mean price of one commodity over the whole table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommodityPrice {
    pub commodity: String,
    pub price: f64,
}

/// Mean of the precomputed per-row price standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommodityVolatility {
    pub commodity: String,
    pub price_std: f64,
}

/// Mean price of one category in one reference period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPrice {
    pub period: NaiveDate,
    pub category: String,
    pub price: f64,
}

/// Mean of the precomputed mean and median columns for one commodity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommoditySummary {
    pub commodity: String,
    pub price_mean: f64,
    pub price_median: f64,
}

/// Group by (period, commodity) and average the price, in period order.
pub fn time_series_by_commodity(table: &PriceTable) -> Vec<PeriodPrice> {
    let mut rows: Vec<PeriodPrice> = group_mean(
        table.records(),
        |r| Some((r.period, r.commodity.as_str())),
        |r| r.price,
    )
    .into_iter()
    .map(|((period, commodity), price)| PeriodPrice {
        period,
        commodity: commodity.to_string(),
        price,
    })
    .collect();
    rows.sort_by_key(|r| r.period);
    rows
}

/// The time series for one commodity (empty if the commodity is absent).
pub fn time_series_for(table: &PriceTable, commodity: &str) -> Vec<PeriodPrice> {
    time_series_by_commodity(table)
        .into_iter()
        .filter(|r| r.commodity == commodity)
        .collect()
}

/// Raw prices of the selected commodities, in table order.
pub fn distribution_by_commodity(table: &PriceTable, selected: &[String]) -> Vec<PriceObservation> {
    let wanted: HashSet<&str> = selected.iter().map(String::as_str).collect();
    table
        .records()
        .iter()
        .filter(|r| wanted.contains(r.commodity.as_str()))
        .filter_map(|r| {
            r.price.map(|price| PriceObservation {
                commodity: r.commodity.clone(),
                price,
            })
        })
        .collect()
}

/// Group by (market, latitude, longitude) and average the price.
///
/// Rows without both coordinates do not form a group.
pub fn regional_mean(table: &PriceTable) -> Vec<MarketPrice> {
    group_mean(
        table.records(),
        |r| {
            let lat = r.latitude?;
            let lon = r.longitude?;
            Some((r.market.as_str(), coord_bits(lat), coord_bits(lon)))
        },
        |r| r.price,
    )
    .into_iter()
    .map(|((market, lat, lon), price)| MarketPrice {
        market: market.to_string(),
        latitude: f64::from_bits(lat),
        longitude: f64::from_bits(lon),
        price,
    })
    .collect()
}

/// Mean price per commodity, in first-encounter order.
pub fn commodity_means(table: &PriceTable) -> Vec<CommodityPrice> {
    group_mean(table.records(), |r| Some(r.commodity.as_str()), |r| r.price)
        .into_iter()
        .map(|(commodity, price)| CommodityPrice {
            commodity: commodity.to_string(),
            price,
        })
        .collect()
}

/// The `n` commodities with the highest mean price, highest first.
pub fn top_n(table: &PriceTable, n: TopN) -> Vec<CommodityPrice> {
    let mut rows = commodity_means(table);
    rows.sort_by(|a, b| b.price.total_cmp(&a.price));
    rows.truncate(n.get());
    rows
}

/// The `n` commodities with the lowest mean price, lowest first.
pub fn bottom_n(table: &PriceTable, n: TopN) -> Vec<CommodityPrice> {
    let mut rows = commodity_means(table);
    rows.sort_by(|a, b| a.price.total_cmp(&b.price));
    rows.truncate(n.get());
    rows
}

/// Commodities ranked by mean price std, most volatile first, at most
/// [`VOLATILITY_LIMIT`] rows.
pub fn volatility(table: &PriceTable) -> Vec<CommodityVolatility> {
    let mut rows: Vec<CommodityVolatility> =
        group_mean(table.records(), |r| Some(r.commodity.as_str()), |r| r.price_std)
            .into_iter()
            .map(|(commodity, price_std)| CommodityVolatility {
                commodity: commodity.to_string(),
                price_std,
            })
            .collect();
    rows.sort_by(|a, b| b.price_std.total_cmp(&a.price_std));
    rows.truncate(VOLATILITY_LIMIT);
    rows
}

/// Group by (period, category) and average the price, in period order.
pub fn category_trend(table: &PriceTable) -> Vec<CategoryPrice> {
    let mut rows: Vec<CategoryPrice> = group_mean(
        table.records(),
        |r| Some((r.period, r.category.as_str())),
        |r| r.price,
    )
    .into_iter()
    .map(|((period, category), price)| CategoryPrice {
        period,
        category: category.to_string(),
        price,
    })
    .collect();
    rows.sort_by_key(|r| r.period);
    rows
}

/// Per commodity, the mean of the precomputed mean and median columns.
///
/// A commodity needs at least one value in both columns to appear.
pub fn mean_vs_median(table: &PriceTable) -> Vec<CommoditySummary> {
    group_by(
        table.records(),
        |r| Some(r.commodity.as_str()),
        |acc: &mut (Mean, Mean), r| {
            acc.0.push(r.price_mean);
            acc.1.push(r.price_median);
        },
    )
    .into_iter()
    .filter_map(|(commodity, (mean, median))| {
        Some(CommoditySummary {
            commodity: commodity.to_string(),
            price_mean: mean.value()?,
            price_median: median.value()?,
        })
    })
    .collect()
}

/// Distinct commodity names in first-encounter order.
pub fn distinct_commodities(table: &PriceTable) -> Vec<String> {
    let mut seen = HashSet::new();
    table
        .records()
        .iter()
        .filter(|r| seen.insert(r.commodity.as_str()))
        .map(|r| r.commodity.clone())
        .collect()
}

/// Default single-choice selection: the first commodity in the table.
pub fn first_commodity(table: &PriceTable) -> Option<String> {
    table.records().first().map(|r| r.commodity.clone())
}

/// Default multi-choice selection: the first few distinct commodities.
pub fn default_selection(table: &PriceTable) -> Vec<String> {
    let mut names = distinct_commodities(table);
    names.truncate(DEFAULT_SELECTION_LEN);
    names
}

impl Tabular for PeriodPrice {
    const COLUMNS: &'static [Field] = &[Field::Period, Field::Commodity, Field::Price];

    fn cell(&self, field: Field) -> Option<Cell> {
        match field {
            Field::Period => Some(Cell::Date(self.period)),
            Field::Commodity => Some(Cell::Text(self.commodity.clone())),
            Field::Price => Some(Cell::Number(self.price)),
            _ => None,
        }
    }
}

impl Tabular for PriceObservation {
    const COLUMNS: &'static [Field] = &[Field::Commodity, Field::Price];

    fn cell(&self, field: Field) -> Option<Cell> {
        match field {
            Field::Commodity => Some(Cell::Text(self.commodity.clone())),
            Field::Price => Some(Cell::Number(self.price)),
            _ => None,
        }
    }
}

impl Tabular for MarketPrice {
    const COLUMNS: &'static [Field] =
        &[Field::Market, Field::Latitude, Field::Longitude, Field::Price];

    fn cell(&self, field: Field) -> Option<Cell> {
        match field {
            Field::Market => Some(Cell::Text(self.market.clone())),
            Field::Latitude => Some(Cell::Number(self.latitude)),
            Field::Longitude => Some(Cell::Number(self.longitude)),
            Field::Price => Some(Cell::Number(self.price)),
            _ => None,
        }
    }
}

impl Tabular for CommodityPrice {
    const COLUMNS: &'static [Field] = &[Field::Commodity, Field::Price];

    fn cell(&self, field: Field) -> Option<Cell> {
        match field {
            Field::Commodity => Some(Cell::Text(self.commodity.clone())),
            Field::Price => Some(Cell::Number(self.price)),
            _ => None,
        }
    }
}

impl Tabular for CommodityVolatility {
    const COLUMNS: &'static [Field] = &[Field::Commodity, Field::PriceStd];

    fn cell(&self, field: Field) -> Option<Cell> {
        match field {
            Field::Commodity => Some(Cell::Text(self.commodity.clone())),
            Field::PriceStd => Some(Cell::Number(self.price_std)),
            _ => None,
        }
    }
}

impl Tabular for CategoryPrice {
    const COLUMNS: &'static [Field] = &[Field::Period, Field::Category, Field::Price];

    fn cell(&self, field: Field) -> Option<Cell> {
        match field {
            Field::Period => Some(Cell::Date(self.period)),
            Field::Category => Some(Cell::Text(self.category.clone())),
            Field::Price => Some(Cell::Number(self.price)),
            _ => None,
        }
    }
}

impl Tabular for CommoditySummary {
    const COLUMNS: &'static [Field] = &[Field::Commodity, Field::PriceMean, Field::PriceMedian];

    fn cell(&self, field: Field) -> Option<Cell> {
        match field {
            Field::Commodity => Some(Cell::Text(self.commodity.clone())),
            Field::PriceMean => Some(Cell::Number(self.price_mean)),
            Field::PriceMedian => Some(Cell::Number(self.price_median)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceRecord;
    use proptest::prelude::*;

    fn date(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, 1).unwrap()
    }

    fn rec(period: NaiveDate, commodity: &str, category: &str, price: f64) -> PriceRecord {
        PriceRecord {
            period,
            commodity: commodity.to_string(),
            category: category.to_string(),
            market: "Colombo".to_string(),
            latitude: Some(6.93),
            longitude: Some(79.85),
            price: Some(price),
            price_mean: Some(price),
            price_median: Some(price * 0.9),
            price_std: Some(price / 10.0),
        }
    }

    fn sample_table() -> PriceTable {
        PriceTable::new(vec![
            rec(date(2), "Rice", "Cereals", 20.0),
            rec(date(1), "Rice", "Cereals", 10.0),
            rec(date(1), "Beans", "Pulses", 50.0),
            rec(date(3), "Rice", "Cereals", 30.0),
            rec(date(1), "Rice", "Cereals", 14.0),
            rec(date(2), "Onions", "Vegetables", 5.0),
        ])
    }

    #[test]
    fn rice_time_series_is_in_date_order() {
        let table = PriceTable::new(vec![
            rec(date(3), "Rice", "Cereals", 30.0),
            rec(date(1), "Rice", "Cereals", 10.0),
            rec(date(2), "Rice", "Cereals", 20.0),
        ]);
        let rows = time_series_for(&table, "Rice");
        let prices: Vec<f64> = rows.iter().map(|r| r.price).collect();
        let periods: Vec<NaiveDate> = rows.iter().map(|r| r.period).collect();
        assert_eq!(prices, vec![10.0, 20.0, 30.0]);
        assert_eq!(periods, vec![date(1), date(2), date(3)]);
    }

    #[test]
    fn time_series_averages_within_period() {
        let rows = time_series_for(&sample_table(), "Rice");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].period, date(1));
        assert!((rows[0].price - 12.0).abs() < 1e-12);
    }

    #[test]
    fn absent_commodity_yields_empty_outputs() {
        let table = sample_table();
        assert!(time_series_for(&table, "Saffron").is_empty());
        assert!(distribution_by_commodity(&table, &["Saffron".to_string()]).is_empty());
        assert!(distribution_by_commodity(&table, &[]).is_empty());
    }

    #[test]
    fn distribution_keeps_table_order() {
        let table = sample_table();
        let rows = distribution_by_commodity(&table, &["Onions".to_string(), "Beans".to_string()]);
        let names: Vec<&str> = rows.iter().map(|r| r.commodity.as_str()).collect();
        assert_eq!(names, vec!["Beans", "Onions"]);
    }

    #[test]
    fn regional_mean_groups_by_location() {
        let mut records = sample_table().records().to_vec();
        records[0].market = "Kandy".to_string();
        records[0].latitude = Some(7.29);
        records[0].longitude = Some(80.63);
        records[1].latitude = None;
        let rows = regional_mean(&PriceTable::new(records));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].market, "Kandy");
        assert_eq!(rows[0].price, 20.0);
        assert_eq!(rows[1].market, "Colombo");
        assert!((rows[1].price - (50.0 + 30.0 + 14.0 + 5.0) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn top_and_bottom_rank_by_mean() {
        let table = sample_table();
        let n = TopN::new(5).unwrap();

        let top: Vec<String> = top_n(&table, n).into_iter().map(|r| r.commodity).collect();
        assert_eq!(top, vec!["Beans", "Rice", "Onions"]);

        let bottom: Vec<String> = bottom_n(&table, n).into_iter().map(|r| r.commodity).collect();
        assert_eq!(bottom, vec!["Onions", "Rice", "Beans"]);
    }

    #[test]
    fn ties_keep_encounter_order() {
        let table = PriceTable::new(vec![
            rec(date(1), "A", "X", 10.0),
            rec(date(1), "B", "X", 10.0),
            rec(date(1), "C", "X", 10.0),
        ]);
        let n = TopN::new(5).unwrap();
        let top: Vec<String> = top_n(&table, n).into_iter().map(|r| r.commodity).collect();
        let bottom: Vec<String> = bottom_n(&table, n).into_iter().map(|r| r.commodity).collect();
        assert_eq!(top, vec!["A", "B", "C"]);
        assert_eq!(bottom, vec!["A", "B", "C"]);
    }

    #[test]
    fn volatility_caps_at_fifteen() {
        let records = (0..20)
            .map(|i| rec(date(1), &format!("C{i}"), "X", i as f64))
            .collect();
        let rows = volatility(&PriceTable::new(records));
        assert_eq!(rows.len(), VOLATILITY_LIMIT);
        assert_eq!(rows[0].commodity, "C19");
    }

    #[test]
    fn category_trend_groups_period_and_category() {
        let rows = category_trend(&sample_table());
        assert_eq!(rows.len(), 5);
        assert!(rows.windows(2).all(|w| w[0].period <= w[1].period));
        let cereals_jan = rows
            .iter()
            .find(|r| r.period == date(1) && r.category == "Cereals")
            .unwrap();
        assert!((cereals_jan.price - 12.0).abs() < 1e-12);
    }

    #[test]
    fn mean_vs_median_needs_both_columns() {
        let mut records = sample_table().records().to_vec();
        for r in records.iter_mut().filter(|r| r.commodity == "Onions") {
            r.price_median = None;
        }
        let rows = mean_vs_median(&PriceTable::new(records));
        let names: Vec<&str> = rows.iter().map(|r| r.commodity.as_str()).collect();
        assert_eq!(names, vec!["Rice", "Beans"]);
        assert!((rows[0].price_mean - 18.5).abs() < 1e-12);
        assert!((rows[0].price_median - 18.5 * 0.9).abs() < 1e-9);
    }

    #[test]
    fn default_selection_takes_first_five_distinct() {
        let records = ["A", "B", "A", "C", "D", "E", "F"]
            .iter()
            .map(|c| rec(date(1), c, "X", 1.0))
            .collect();
        let table = PriceTable::new(records);
        assert_eq!(default_selection(&table), vec!["A", "B", "C", "D", "E"]);
        assert_eq!(distinct_commodities(&table).len(), 6);
        assert_eq!(first_commodity(&table).as_deref(), Some("A"));
        assert_eq!(first_commodity(&PriceTable::default()), None);
    }

    fn table_strategy() -> impl Strategy<Value = PriceTable> {
        prop::collection::vec((0usize..8, 1u32..4, 0.0f64..500.0, 0.0f64..50.0), 0..60).prop_map(
            |rows| {
                let records = rows
                    .into_iter()
                    .map(|(c, m, price, std)| {
                        let mut r = rec(date(m), &format!("C{c}"), &format!("K{}", c % 3), price);
                        r.price_std = Some(std);
                        r
                    })
                    .collect();
                PriceTable::new(records)
            },
        )
    }

    proptest! {
        #[test]
        fn outputs_never_exceed_group_count(table in table_strategy(), n in 5usize..=20) {
            let n = TopN::new(n).unwrap();
            let commodities = distinct_commodities(&table).len();

            prop_assert!(commodity_means(&table).len() <= commodities);
            prop_assert!(top_n(&table, n).len() <= commodities);
            prop_assert!(bottom_n(&table, n).len() <= commodities);
            prop_assert!(volatility(&table).len() <= commodities);
            prop_assert!(mean_vs_median(&table).len() <= commodities);
            prop_assert!(regional_mean(&table).len() <= table.len());
            prop_assert!(time_series_by_commodity(&table).len() <= table.len());
            prop_assert!(category_trend(&table).len() <= table.len());
            prop_assert_eq!(
                distribution_by_commodity(&table, &distinct_commodities(&table)).len(),
                table.len()
            );
        }

        #[test]
        fn volatility_is_sorted_descending(table in table_strategy()) {
            let rows = volatility(&table);
            prop_assert!(rows.len() <= VOLATILITY_LIMIT);
            prop_assert!(rows.windows(2).all(|w| w[0].price_std >= w[1].price_std));
        }

        #[test]
        fn top_and_bottom_are_disjoint_and_span_the_range(
            prices in prop::collection::hash_set(0u32..10_000, 10..40),
            extra in 0usize..=15,
        ) {
            let records: Vec<PriceRecord> = prices
                .iter()
                .enumerate()
                .map(|(i, p)| rec(date(1), &format!("C{i}"), "X", *p as f64))
                .collect();
            let table = PriceTable::new(records);
            let distinct = distinct_commodities(&table).len();

            let n = TopN::new((TopN::MIN + extra).min(distinct / 2)).unwrap();
            let top = top_n(&table, n);
            let bottom = bottom_n(&table, n);

            let top_names: HashSet<&str> = top.iter().map(|r| r.commodity.as_str()).collect();
            prop_assert!(bottom.iter().all(|r| !top_names.contains(r.commodity.as_str())));

            let all = commodity_means(&table);
            let max = all.iter().map(|r| r.price).fold(f64::NEG_INFINITY, f64::max);
            let min = all.iter().map(|r| r.price).fold(f64::INFINITY, f64::min);
            prop_assert_eq!(top[0].price, max);
            prop_assert_eq!(bottom[0].price, min);
        }

        #[test]
        fn top_n_with_few_commodities_returns_all_descending(table in table_strategy()) {
            let rows = top_n(&table, TopN::new(5).unwrap());
            let distinct = distinct_commodities(&table).len();
            if distinct < 5 {
                prop_assert_eq!(rows.len(), distinct);
            }
            prop_assert!(rows.windows(2).all(|w| w[0].price >= w[1].price));
        }
    }
}
