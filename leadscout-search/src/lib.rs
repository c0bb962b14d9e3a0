//! Lead search pipeline and the views built on its results.
//!
//! - [`LeadSearch`]: geocode, nearby search, details, filters, persistence
//! - [`LeadSink`]: where finished leads are written (the SQLite store in production)
//! - [`sort`]: ordering for the lead table
//! - [`export`]: CSV export of displayed rows
//! - [`markers`]: GeoJSON map markers coloured by website presence
//! - [`table`]: plain-text table for the terminal

pub mod export;
pub mod markers;
pub mod pipeline;
pub mod sort;
pub mod table;

pub use export::{CSV_HEADER, ExportError, to_csv_string, write_csv};
pub use markers::{MarkerCollection, MarkerLayer, markers_for};
pub use pipeline::{
    DEFAULT_DETAILS_CONCURRENCY, LeadSearch, LeadSink, SearchError, google_maps_url,
    normalize_category,
};
pub use sort::{LeadSort, SortError, SortKey};
pub use table::render_table;
