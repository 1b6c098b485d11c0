//! Presentation adapter: derived table + chart spec -> chart artifact.
//!
//! An artifact is a render-ready, backend-agnostic description of a chart
//! (series, boxes, markers, bars). The TUI draws it with Plotters and the
//! CLI exports it as JSON.
//!
//! Every encoded field must be a column of the derived table and carry the
//! cell type its chart slot expects. A mismatch is an internal consistency
//! failure reported as an encoding error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Cell, DerivedTable, Field};
use crate::error::AppError;
use crate::math::{BoxStats, TrendLine, box_stats, fit_line};

/// Supported chart kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Line,
    Box,
    ScatterGeo,
    Bar,
    ScatterTrend,
}

/// Field bindings for each visual channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    pub x: Option<Field>,
    pub y: Option<Field>,
    pub color: Option<Field>,
    pub hover: Option<Field>,
    pub size: Option<Field>,
}

impl Encoding {
    pub fn xy(x: Field, y: Field) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn color(self, field: Field) -> Self {
        Self {
            color: Some(field),
            ..self
        }
    }

    pub fn hover(self, field: Field) -> Self {
        Self {
            hover: Some(field),
            ..self
        }
    }

    pub fn size(self, field: Field) -> Self {
        Self {
            size: Some(field),
            ..self
        }
    }

    fn bound(&self) -> impl Iterator<Item = Field> {
        [self.x, self.y, self.color, self.hover, self.size]
            .into_iter()
            .flatten()
    }
}

/// What to draw and how to bind the table's columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub chart_type: ChartType,
    pub encoding: Encoding,
}

impl ChartSpec {
    pub fn new(title: impl Into<String>, chart_type: ChartType, encoding: Encoding) -> Self {
        Self {
            title: title.into(),
            chart_type,
            encoding,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    /// Value of the color field, if the chart is split by color.
    pub name: Option<String>,
    pub points: Vec<(NaiveDate, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxGroup {
    pub label: String,
    pub stats: BoxStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMarker {
    pub label: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub size: Option<f64>,
    pub color: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub label: Option<String>,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartBody {
    Line { series: Vec<LineSeries> },
    Box { groups: Vec<BoxGroup> },
    ScatterGeo { markers: Vec<GeoMarker> },
    Bar { bars: Vec<Bar> },
    ScatterTrend {
        points: Vec<ScatterPoint>,
        trend: Option<TrendLine>,
    },
}

/// A rendered chart, ready for a drawing backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartArtifact {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub body: ChartBody,
}

impl ChartArtifact {
    /// True when there is nothing to draw (the chart shows an empty state).
    pub fn is_empty(&self) -> bool {
        match &self.body {
            ChartBody::Line { series } => series.iter().all(|s| s.points.is_empty()),
            ChartBody::Box { groups } => groups.is_empty(),
            ChartBody::ScatterGeo { markers } => markers.is_empty(),
            ChartBody::Bar { bars } => bars.is_empty(),
            ChartBody::ScatterTrend { points, .. } => points.is_empty(),
        }
    }

    pub fn chart_type(&self) -> ChartType {
        match self.body {
            ChartBody::Line { .. } => ChartType::Line,
            ChartBody::Box { .. } => ChartType::Box,
            ChartBody::ScatterGeo { .. } => ChartType::ScatterGeo,
            ChartBody::Bar { .. } => ChartType::Bar,
            ChartBody::ScatterTrend { .. } => ChartType::ScatterTrend,
        }
    }
}

/// Render `table` according to `spec`.
pub fn render(table: &DerivedTable, spec: &ChartSpec) -> Result<ChartArtifact, AppError> {
    let enc = spec.encoding;
    for field in enc.bound() {
        if !table.has_column(field) {
            return Err(AppError::encoding(format!(
                "Chart '{}' binds `{}`, which is not a column of its table ({}).",
                spec.title,
                field.column_name(),
                column_list(table)
            )));
        }
    }

    let x = required(spec, enc.x, "x")?;
    let y = required(spec, enc.y, "y")?;

    let body = match spec.chart_type {
        ChartType::Line => render_line(table, x, y, enc.color)?,
        ChartType::Box => render_box(table, x, y)?,
        ChartType::ScatterGeo => render_geo(table, x, y, &enc)?,
        ChartType::Bar => render_bar(table, x, y)?,
        ChartType::ScatterTrend => render_scatter(table, x, y, enc.hover)?,
    };

    Ok(ChartArtifact {
        title: spec.title.clone(),
        x_label: x.label().to_string(),
        y_label: y.label().to_string(),
        body,
    })
}

fn render_line(
    table: &DerivedTable,
    x: Field,
    y: Field,
    color: Option<Field>,
) -> Result<ChartBody, AppError> {
    let mut series: Vec<LineSeries> = Vec::new();
    for row in 0..table.len() {
        let date = date_at(table, row, x)?;
        let value = number_at(table, row, y)?;
        let name = match color {
            Some(field) => Some(text_at(table, row, field)?),
            None => None,
        };

        match series.iter_mut().find(|s| s.name == name) {
            Some(s) => s.points.push((date, value)),
            None => series.push(LineSeries {
                name,
                points: vec![(date, value)],
            }),
        }
    }
    Ok(ChartBody::Line { series })
}

fn render_box(table: &DerivedTable, x: Field, y: Field) -> Result<ChartBody, AppError> {
    let mut buckets: Vec<(String, Vec<f64>)> = Vec::new();
    for row in 0..table.len() {
        let label = text_at(table, row, x)?;
        let value = number_at(table, row, y)?;
        match buckets.iter_mut().find(|(l, _)| *l == label) {
            Some((_, values)) => values.push(value),
            None => buckets.push((label, vec![value])),
        }
    }

    let groups = buckets
        .into_iter()
        .filter_map(|(label, values)| box_stats(&values).map(|stats| BoxGroup { label, stats }))
        .collect();
    Ok(ChartBody::Box { groups })
}

fn render_geo(table: &DerivedTable, x: Field, y: Field, enc: &Encoding) -> Result<ChartBody, AppError> {
    let mut markers = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        markers.push(GeoMarker {
            label: enc.hover.map(|f| text_at(table, row, f)).transpose()?,
            longitude: number_at(table, row, x)?,
            latitude: number_at(table, row, y)?,
            size: enc.size.map(|f| number_at(table, row, f)).transpose()?,
            color: enc.color.map(|f| number_at(table, row, f)).transpose()?,
        });
    }
    Ok(ChartBody::ScatterGeo { markers })
}

fn render_bar(table: &DerivedTable, x: Field, y: Field) -> Result<ChartBody, AppError> {
    let mut bars = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        bars.push(Bar {
            label: text_at(table, row, x)?,
            value: number_at(table, row, y)?,
        });
    }
    Ok(ChartBody::Bar { bars })
}

fn render_scatter(
    table: &DerivedTable,
    x: Field,
    y: Field,
    hover: Option<Field>,
) -> Result<ChartBody, AppError> {
    let mut points = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        points.push(ScatterPoint {
            label: hover.map(|f| text_at(table, row, f)).transpose()?,
            x: number_at(table, row, x)?,
            y: number_at(table, row, y)?,
        });
    }
    let xy: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
    let trend = fit_line(&xy);
    Ok(ChartBody::ScatterTrend { points, trend })
}

fn required(spec: &ChartSpec, field: Option<Field>, channel: &str) -> Result<Field, AppError> {
    field.ok_or_else(|| {
        AppError::encoding(format!(
            "Chart '{}' ({:?}) needs an `{channel}` binding.",
            spec.title, spec.chart_type
        ))
    })
}

fn cell_at(table: &DerivedTable, row: usize, field: Field) -> Result<&Cell, AppError> {
    table
        .column_index(field)
        .and_then(|idx| table.rows.get(row).and_then(|r| r.get(idx)))
        .ok_or_else(|| {
            AppError::encoding(format!(
                "Row {row} has no `{}` value.",
                field.column_name()
            ))
        })
}

fn date_at(table: &DerivedTable, row: usize, field: Field) -> Result<NaiveDate, AppError> {
    cell_at(table, row, field)?
        .as_date()
        .ok_or_else(|| mistyped(field, "a date"))
}

fn number_at(table: &DerivedTable, row: usize, field: Field) -> Result<f64, AppError> {
    cell_at(table, row, field)?
        .as_number()
        .ok_or_else(|| mistyped(field, "a number"))
}

fn text_at(table: &DerivedTable, row: usize, field: Field) -> Result<String, AppError> {
    cell_at(table, row, field)?
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| mistyped(field, "text"))
}

fn mistyped(field: Field, expected: &str) -> AppError {
    AppError::encoding(format!(
        "Column `{}` is bound to a channel that needs {expected}.",
        field.column_name()
    ))
}

fn column_list(table: &DerivedTable) -> String {
    table
        .columns
        .iter()
        .map(|f| f.column_name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn d(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, 1).unwrap()
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn category_table() -> DerivedTable {
        DerivedTable {
            columns: vec![Field::Period, Field::Category, Field::Price],
            rows: vec![
                vec![Cell::Date(d(1)), text("Cereals"), Cell::Number(10.0)],
                vec![Cell::Date(d(1)), text("Pulses"), Cell::Number(30.0)],
                vec![Cell::Date(d(2)), text("Cereals"), Cell::Number(12.0)],
            ],
        }
    }

    #[test]
    fn line_splits_series_by_color() {
        let spec = ChartSpec::new(
            "trend",
            ChartType::Line,
            Encoding::xy(Field::Period, Field::Price).color(Field::Category),
        );
        let artifact = render(&category_table(), &spec).unwrap();
        let ChartBody::Line { series } = &artifact.body else {
            panic!("expected a line chart");
        };
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name.as_deref(), Some("Cereals"));
        assert_eq!(series[0].points, vec![(d(1), 10.0), (d(2), 12.0)]);
        assert_eq!(artifact.x_label, "period");
        assert_eq!(artifact.y_label, "price");
    }

    #[test]
    fn absent_column_is_an_encoding_error() {
        let spec = ChartSpec::new(
            "bad",
            ChartType::Bar,
            Encoding::xy(Field::Commodity, Field::Price),
        );
        let err = render(&category_table(), &spec).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert!(err.to_string().contains("Commodity_Name"));
    }

    #[test]
    fn mistyped_column_is_an_encoding_error() {
        let spec = ChartSpec::new(
            "bad",
            ChartType::Line,
            Encoding::xy(Field::Category, Field::Price),
        );
        let err = render(&category_table(), &spec).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
    }

    #[test]
    fn missing_axis_binding_is_an_encoding_error() {
        let spec = ChartSpec::new("bad", ChartType::Bar, Encoding::default());
        assert_eq!(
            render(&category_table(), &spec).unwrap_err().kind(),
            ErrorKind::Encoding
        );
    }

    #[test]
    fn empty_table_renders_empty_artifact() {
        let table = DerivedTable {
            columns: vec![Field::Commodity, Field::Price],
            rows: Vec::new(),
        };
        for chart_type in [ChartType::Box, ChartType::Bar] {
            let spec = ChartSpec::new("empty", chart_type, Encoding::xy(Field::Commodity, Field::Price));
            let artifact = render(&table, &spec).unwrap();
            assert!(artifact.is_empty());
            assert_eq!(artifact.chart_type(), chart_type);
        }
    }

    #[test]
    fn box_groups_follow_first_appearance() {
        let table = DerivedTable {
            columns: vec![Field::Commodity, Field::Price],
            rows: vec![
                vec![text("Rice"), Cell::Number(1.0)],
                vec![text("Beans"), Cell::Number(4.0)],
                vec![text("Rice"), Cell::Number(3.0)],
            ],
        };
        let spec = ChartSpec::new("dist", ChartType::Box, Encoding::xy(Field::Commodity, Field::Price));
        let ChartBody::Box { groups } = render(&table, &spec).unwrap().body else {
            panic!("expected a box chart");
        };
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Rice", "Beans"]);
        assert_eq!(groups[0].stats.median, 2.0);
        assert_eq!(groups[0].stats.count, 2);
    }

    #[test]
    fn geo_markers_carry_every_channel() {
        let table = DerivedTable {
            columns: vec![Field::Market, Field::Latitude, Field::Longitude, Field::Price],
            rows: vec![vec![
                text("Colombo"),
                Cell::Number(6.9),
                Cell::Number(79.8),
                Cell::Number(120.0),
            ]],
        };
        let spec = ChartSpec::new(
            "map",
            ChartType::ScatterGeo,
            Encoding::xy(Field::Longitude, Field::Latitude)
                .size(Field::Price)
                .color(Field::Price)
                .hover(Field::Market),
        );
        let ChartBody::ScatterGeo { markers } = render(&table, &spec).unwrap().body else {
            panic!("expected a geo chart");
        };
        assert_eq!(
            markers,
            vec![GeoMarker {
                label: Some("Colombo".to_string()),
                latitude: 6.9,
                longitude: 79.8,
                size: Some(120.0),
                color: Some(120.0),
            }]
        );
    }

    #[test]
    fn scatter_includes_trend_line() {
        let table = DerivedTable {
            columns: vec![Field::Commodity, Field::PriceMean, Field::PriceMedian],
            rows: vec![
                vec![text("A"), Cell::Number(1.0), Cell::Number(2.0)],
                vec![text("B"), Cell::Number(2.0), Cell::Number(4.0)],
                vec![text("C"), Cell::Number(3.0), Cell::Number(6.0)],
            ],
        };
        let spec = ChartSpec::new(
            "mvm",
            ChartType::ScatterTrend,
            Encoding::xy(Field::PriceMean, Field::PriceMedian).hover(Field::Commodity),
        );
        let ChartBody::ScatterTrend { points, trend } = render(&table, &spec).unwrap().body else {
            panic!("expected a scatter chart");
        };
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].label.as_deref(), Some("B"));
        let trend = trend.unwrap();
        assert!((trend.slope - 2.0).abs() < 1e-9);
        assert!(trend.intercept.abs() < 1e-9);
    }
}
