//! Shared "load -> request -> view" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! config -> dataset cache -> view request -> rendered view
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use crate::aggregate;
use crate::cli::{ShowArgs, SourceArgs};
use crate::data::{DatasetCache, LoadConfig};
use crate::domain::{PriceTable, TopN, ViewKind, ViewRequest};
use crate::error::AppError;
use crate::view::{self, RenderedView};

/// Build the dataset cache for the configured source. Nothing is fetched yet.
pub fn open_dataset(args: &SourceArgs) -> Result<DatasetCache, AppError> {
    let config = LoadConfig::from_env(args.url.clone(), args.file.clone())?;
    Ok(DatasetCache::new(config.into_source()?))
}

/// Turn `fp show` arguments into a typed request for `kind`, filling
/// defaults from the table.
pub fn request_from_args(table: &PriceTable, kind: ViewKind, args: &ShowArgs) -> Result<ViewRequest, AppError> {
    let request = match kind {
        ViewKind::PriceOverTime => match &args.commodity {
            Some(commodity) => ViewRequest::PriceOverTime {
                commodity: commodity.clone(),
            },
            None => view::default_request(table, kind),
        },
        ViewKind::Distribution if !args.commodities.is_empty() => ViewRequest::Distribution {
            commodities: args.commodities.clone(),
        },
        ViewKind::TopBottom => ViewRequest::TopBottom {
            n: TopN::new(args.top)?,
        },
        _ => view::default_request(table, kind),
    };
    Ok(request)
}

/// Load (or reuse) the table and render one view.
///
/// The view name and `--top` are checked before anything is fetched.
pub fn render_request(cache: &DatasetCache, args: &ShowArgs) -> Result<RenderedView, AppError> {
    let kind = ViewKind::from_name(&args.view)?;
    TopN::new(args.top)?;
    let table = cache.get()?;
    let request = request_from_args(table, kind, args)?;
    view::select(table, &request)
}

/// Commodity options for the selector widgets.
pub fn commodity_options(table: &PriceTable) -> Vec<String> {
    aggregate::distinct_commodities(table)
}
