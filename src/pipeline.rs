// Pipeline driver: load -> normalize -> join -> aggregate -> coerce -> serialize.
//
// Each stage takes ownership of the previous stage's output and hands a new
// value to the next, so stages can only run in order and nothing is shared
// between non-adjacent stages.
use crate::aggregate::aggregate;
use crate::coerce::coerce;
use crate::error::Result;
use crate::join::join;
use crate::loader::load;
use crate::normalize::normalize;
use crate::output::write_json;
use crate::types::SummaryRecord;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Row counts collected along the way, for the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub viewing_rows: usize,
    pub producer_rows: usize,
    pub joined_rows: usize,
    pub unmatched_viewings: usize,
    pub orphan_producers: usize,
    pub ungrouped_rows: usize,
    pub summary_rows: usize,
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub summary: Vec<SummaryRecord>,
    pub report: RunReport,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    input: PathBuf,
    output: PathBuf,
}

impl Pipeline {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Run every stage up to and including type coercion, without writing.
    pub fn summarize(&self) -> Result<Outcome> {
        summarize(&self.input).inspect_err(log_failure)
    }

    /// Run the whole pipeline and write the summary. Nothing is written unless
    /// every earlier stage succeeded.
    pub fn run(&self) -> Result<Outcome> {
        let outcome = self.summarize()?;
        write_json(&self.output, &outcome.summary).inspect_err(log_failure)?;
        Ok(outcome)
    }
}

// The operator-facing message is printed once by the caller.
fn log_failure(e: &crate::error::PipelineError) {
    debug!(stage = %e.stage(), "{}: {}", e.stage().failure_message(), e);
}

fn summarize(input: &Path) -> Result<Outcome> {
    let tables = load(input)?;
    let mut report = RunReport {
        viewing_rows: tables.viewing.rows.len(),
        producer_rows: tables.producers.rows.len(),
        ..RunReport::default()
    };

    let normalized = normalize(tables.viewing)?;
    let joined = join(normalized, tables.producers)?;
    report.joined_rows = joined.records.len();
    report.unmatched_viewings = joined.unmatched_viewings;
    report.orphan_producers = joined.orphan_producers;

    let aggregated = aggregate(joined.records);
    report.ungrouped_rows = aggregated.ungrouped_rows;

    let summary = coerce(aggregated.groups)?;
    report.summary_rows = summary.len();
    Ok(Outcome { summary, report })
}
