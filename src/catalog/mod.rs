//! Client-side catalog state: filtering, windowed pagination and detail
//! resolution.

mod aggregator;
pub mod detail;
mod filter;
mod view;
mod window;

pub use aggregator::{CatalogAggregator, Phase, SourceRequest};
pub use filter::{filter_entries, FilterState};
pub use view::{compute_view, CatalogView, SourceList, ViewStatus};
pub use window::{DisplayWindow, INITIAL_WINDOW, WINDOW_INCREMENT};
