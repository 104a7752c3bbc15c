//! Cross-filtering and aggregation over a video-game sales table.
//!
//! The two entry points are [`resolver::available_options`], which narrows one
//! dropdown by every *other* active filter, and [`aggregate::aggregate`],
//! which applies all filters and derives the chart data. Both are pure
//! functions over an immutable [`dataset::Dataset`].

pub mod aggregate;
pub mod config;
pub mod data;
pub mod dataset;
pub mod demo;
pub mod dimension;
pub mod error;
pub mod logging;
pub mod resolver;
pub mod server;
pub mod state;
pub mod view;

pub use aggregate::{aggregate, AggregationResult};
pub use dataset::{Dataset, Sales, SalesRecord, YearRange};
pub use dimension::{Dimension, Region};
pub use resolver::available_options;
pub use state::{Selection, SelectionState};
