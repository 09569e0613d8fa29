//! Monthly producer/channel viewing summaries.
//!
//! Reads a workbook with a "Viewing data" sheet and a "Producers" sheet and
//! produces, per (Producer, Month, Channel), the top programme, peak and total
//! viewers and a running per-producer viewer total, written as JSON records.

pub mod aggregate;
pub mod coerce;
pub mod error;
pub mod join;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod util;

pub use error::{PipelineError, Result, Stage};
pub use pipeline::{Outcome, Pipeline, RunReport};
pub use types::SummaryRecord;
