use crate::error::{PipelineError, Result, Stage};
use crate::types::{ChannelId, GroupSummary, SummaryRecord};
use crate::util::parse_i64_safe;
use tracing::info;

const TABLE: &str = "summary";

/// Fix the output schema: text producer/month/programme, integer channel and
/// viewer figures. Viewer figures with a fractional part are truncated.
pub fn coerce(groups: Vec<GroupSummary>) -> Result<Vec<SummaryRecord>> {
    let records = groups
        .into_iter()
        .enumerate()
        .map(|(idx, g)| -> Result<SummaryRecord> {
            let row = idx + 1;
            Ok(SummaryRecord {
                channel: channel_to_int(&g.channel, row)?,
                highest_viewers: viewers_to_int(g.highest_viewers, "Highest_Viewers", row)?,
                sum_of_viewers: viewers_to_int(g.sum_of_viewers, "Sum_of_Viewers", row)?,
                cumulative_viewers: viewers_to_int(g.cumulative_viewers, "Cumulative_Viewers", row)?,
                producer: g.producer,
                month: g.month.to_string(),
                top_programme: g.top_programme,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    info!(rows = records.len(), "coerced summary");
    Ok(records)
}

fn coercion_error(row: usize, column: &str, value: String) -> PipelineError {
    PipelineError::TypeCoercion {
        stage: Stage::Coerce,
        table: TABLE.to_string(),
        row,
        column: column.to_string(),
        value,
        target: "an integer",
    }
}

fn channel_to_int(channel: &ChannelId, row: usize) -> Result<i64> {
    match channel {
        ChannelId::Number(n) => Ok(*n),
        ChannelId::Label(s) => {
            parse_i64_safe(Some(s)).ok_or_else(|| coercion_error(row, "Channel", s.clone()))
        }
    }
}

fn viewers_to_int(value: f64, column: &str, row: usize) -> Result<i64> {
    let t = value.trunc();
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound.
    if !t.is_finite() || t < i64::MIN as f64 || t >= i64::MAX as f64 {
        return Err(coercion_error(row, column, value.to_string()));
    }
    Ok(t as i64)
}
