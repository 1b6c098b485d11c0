//! View selector: one fixed aggregation + chart pairing per menu entry.
//!
//! Shared by the CLI (`fp show`) and the TUI so both front-ends render
//! exactly the same thing for the same request.

use serde::Serialize;
use tracing::{debug, error};

use crate::aggregate;
use crate::chart::{ChartArtifact, ChartBody, ChartSpec, ChartType, Encoding, render};
use crate::domain::{DerivedTable, Field, PriceTable, Tabular, ViewKind, ViewRequest};
use crate::error::AppError;

/// Landing page text.
pub const DESCRIPTION: &str = "\
This dashboard is designed for government officials to:

- Track average and volatile food prices.
- Compare price changes across commodities and regions.
- Make informed policy decisions using clear visual insights.

Data includes commodity-wise pricing, geographic location, and time references.";

/// One chart of a view, with the table it was drawn from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewPanel {
    pub heading: Option<String>,
    /// Chart title (kept even when the chart itself is unavailable).
    pub title: String,
    pub table: DerivedTable,
    /// `None` when the chart could not be rendered.
    pub chart: Option<ChartArtifact>,
}

impl ViewPanel {
    pub fn body(&self) -> Option<&ChartBody> {
        self.chart.as_ref().map(|c| &c.body)
    }
}

/// Everything a front-end needs to show one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedView {
    pub kind: ViewKind,
    pub title: String,
    /// Free text shown instead of (or above) the charts.
    pub text: Option<String>,
    pub panels: Vec<ViewPanel>,
}

impl RenderedView {
    fn new(kind: ViewKind) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            text: None,
            panels: Vec::new(),
        }
    }

    fn with_panel(mut self, panel: ViewPanel) -> Self {
        self.panels.push(panel);
        self
    }
}

/// Run the aggregation and chart pairing for `request`.
///
/// Any chart encoding failure fails the whole view.
pub fn select(table: &PriceTable, request: &ViewRequest) -> Result<RenderedView, AppError> {
    assemble(table, request, |t: &DerivedTable, s: &ChartSpec| render(t, s).map(Some))
}

/// Like [`select`], but a chart that fails to render is logged and left out
/// of its panel. The other panels of the view are unaffected.
pub fn select_partial(table: &PriceTable, request: &ViewRequest) -> RenderedView {
    let view = assemble(table, request, placeholder_on_error(render));
    // The renderer above never returns `Err`.
    view.unwrap_or_else(|_| RenderedView::new(request.kind()))
}

fn placeholder_on_error<F>(
    render: F,
) -> impl FnMut(&DerivedTable, &ChartSpec) -> Result<Option<ChartArtifact>, AppError>
where
    F: Fn(&DerivedTable, &ChartSpec) -> Result<ChartArtifact, AppError>,
{
    move |t: &DerivedTable, s: &ChartSpec| match render(t, s) {
        Ok(artifact) => Ok(Some(artifact)),
        Err(err) => {
            error!(chart = %s.title, error = %err, "chart unavailable");
            Ok(None)
        }
    }
}

fn assemble<R>(table: &PriceTable, request: &ViewRequest, mut chart: R) -> Result<RenderedView, AppError>
where
    R: FnMut(&DerivedTable, &ChartSpec) -> Result<Option<ChartArtifact>, AppError>,
{
    let kind = request.kind();
    debug!(view = kind.slug(), "rendering view");

    let mut panel = |heading: Option<&str>, table: DerivedTable, spec: ChartSpec| -> Result<ViewPanel, AppError> {
        let chart = chart(&table, &spec)?;
        Ok(ViewPanel {
            heading: heading.map(str::to_string),
            title: spec.title,
            table,
            chart,
        })
    };

    let view = RenderedView::new(kind);
    let view = match request {
        ViewRequest::Description => RenderedView {
            text: Some(DESCRIPTION.to_string()),
            ..view
        },
        ViewRequest::PriceOverTime { commodity } => view.with_panel(panel(
            None,
            snapshot(&aggregate::time_series_for(table, commodity)),
            ChartSpec::new(
                format!("Average Price Over Time: {commodity}"),
                ChartType::Line,
                Encoding::xy(Field::Period, Field::Price),
            ),
        )?),
        ViewRequest::Distribution { commodities } => view.with_panel(panel(
            None,
            snapshot(&aggregate::distribution_by_commodity(table, commodities)),
            ChartSpec::new(
                "Price Distribution by Commodity",
                ChartType::Box,
                Encoding::xy(Field::Commodity, Field::Price),
            ),
        )?),
        ViewRequest::Regional => view.with_panel(panel(
            None,
            snapshot(&aggregate::regional_mean(table)),
            ChartSpec::new(
                "Regional Price Differences",
                ChartType::ScatterGeo,
                Encoding::xy(Field::Longitude, Field::Latitude)
                    .size(Field::Price)
                    .color(Field::Price)
                    .hover(Field::Market),
            ),
        )?),
        ViewRequest::TopBottom { n } => {
            let bars = Encoding::xy(Field::Commodity, Field::Price);
            let top = panel(
                Some("Top Priced Commodities"),
                snapshot(&aggregate::top_n(table, *n)),
                ChartSpec::new(format!("Top {} by mean price", n.get()), ChartType::Bar, bars),
            )?;
            let bottom = panel(
                Some("Lowest Priced Commodities"),
                snapshot(&aggregate::bottom_n(table, *n)),
                ChartSpec::new(format!("Bottom {} by mean price", n.get()), ChartType::Bar, bars),
            )?;
            view.with_panel(top).with_panel(bottom)
        }
        ViewRequest::Volatility => view.with_panel(panel(
            None,
            snapshot(&aggregate::volatility(table)),
            ChartSpec::new(
                format!("Most Volatile Commodities (Top {})", aggregate::VOLATILITY_LIMIT),
                ChartType::Bar,
                Encoding::xy(Field::Commodity, Field::PriceStd),
            ),
        )?),
        ViewRequest::CategoryTrends => view.with_panel(panel(
            None,
            snapshot(&aggregate::category_trend(table)),
            ChartSpec::new(
                "Category-wise Price Trends",
                ChartType::Line,
                Encoding::xy(Field::Period, Field::Price).color(Field::Category),
            ),
        )?),
        ViewRequest::MeanVsMedian => view.with_panel(panel(
            None,
            snapshot(&aggregate::mean_vs_median(table)),
            ChartSpec::new(
                "Median vs Mean Price by Commodity",
                ChartType::ScatterTrend,
                Encoding::xy(Field::PriceMean, Field::PriceMedian).hover(Field::Commodity),
            ),
        )?),
    };

    Ok(view)
}

/// The request a view opens with before the user touches any control.
pub fn default_request(table: &PriceTable, kind: ViewKind) -> ViewRequest {
    match kind {
        ViewKind::Description => ViewRequest::Description,
        ViewKind::PriceOverTime => ViewRequest::PriceOverTime {
            commodity: aggregate::first_commodity(table).unwrap_or_default(),
        },
        ViewKind::Distribution => ViewRequest::Distribution {
            commodities: aggregate::default_selection(table),
        },
        ViewKind::Regional => ViewRequest::Regional,
        ViewKind::TopBottom => ViewRequest::TopBottom {
            n: Default::default(),
        },
        ViewKind::Volatility => ViewRequest::Volatility,
        ViewKind::CategoryTrends => ViewRequest::CategoryTrends,
        ViewKind::MeanVsMedian => ViewRequest::MeanVsMedian,
    }
}

fn snapshot<T: Tabular>(rows: &[T]) -> DerivedTable {
    DerivedTable::from_rows(rows)
}
