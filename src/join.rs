use crate::error::{PipelineError, Result, Stage};
use crate::types::{JoinedRecord, NormalizedRecord, Table};
use calamine::Data;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

pub const PRODUCER: &str = "Producer";
pub const PROGRAMME: &str = "Programme";
pub const UNKNOWN_PRODUCER: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct Joined {
    pub records: Vec<JoinedRecord>,
    /// Viewing rows whose programme has no producer row.
    pub unmatched_viewings: usize,
    /// Producer rows that match no viewing row (including rows with no programme).
    pub orphan_producers: usize,
}

/// Outer-join viewing rows with the producer sheet on programme name.
///
/// Every viewing row is kept: no match gives a single row credited to
/// `"Unknown"`, several matches give one row per producer (sheet order).
/// Producer rows without viewings are dropped, since they can never form a
/// (Producer, Month, Channel) group.
pub fn join(viewings: Vec<NormalizedRecord>, producers: Table) -> Result<Joined> {
    let programme_col = producers
        .column(PROGRAMME)
        .ok_or_else(|| PipelineError::missing_column(Stage::Join, &producers.name, PROGRAMME))?;
    let producer_col = producers
        .column(PRODUCER)
        .ok_or_else(|| PipelineError::missing_column(Stage::Join, &producers.name, PRODUCER))?;

    // Rows with no programme can never match a viewing row.
    let mut keyless_producers = 0usize;
    let mut by_programme: HashMap<String, Vec<String>> = HashMap::new();
    for row in &producers.rows {
        let programme = match Table::cell(row, programme_col) {
            Data::Empty | Data::Error(_) => {
                keyless_producers += 1;
                continue;
            }
            Data::String(s) if s.is_empty() => {
                keyless_producers += 1;
                continue;
            }
            cell => cell.to_string(),
        };
        let producer = match Table::cell(row, producer_col) {
            Data::Empty | Data::Error(_) => UNKNOWN_PRODUCER.to_string(),
            Data::String(s) if s.trim().is_empty() => UNKNOWN_PRODUCER.to_string(),
            cell => cell.to_string(),
        };
        by_programme.entry(programme).or_default().push(producer);
    }

    let orphan_producers: usize = {
        let seen: HashSet<&str> = viewings
            .iter()
            .map(|v| v.programme.as_str())
            .filter(|p| !p.is_empty())
            .collect();
        keyless_producers
            + by_programme
                .iter()
                .filter(|(programme, _)| !seen.contains(programme.as_str()))
                .map(|(_, producers)| producers.len())
                .sum::<usize>()
    };

    let mut records = Vec::with_capacity(viewings.len());
    let mut unmatched_viewings = 0usize;
    for viewing in viewings {
        let matches = if viewing.programme.is_empty() {
            None
        } else {
            by_programme.get(&viewing.programme)
        };
        match matches {
            Some(names) => {
                for name in names {
                    records.push(JoinedRecord {
                        row: records.len(),
                        producer: name.clone(),
                        viewing: viewing.clone(),
                    });
                }
            }
            None => {
                unmatched_viewings += 1;
                records.push(JoinedRecord {
                    row: records.len(),
                    producer: UNKNOWN_PRODUCER.to_string(),
                    viewing,
                });
            }
        }
    }

    if orphan_producers > 0 {
        debug!(rows = orphan_producers, "producer rows with no viewing data dropped");
    }
    info!(
        rows = records.len(),
        unmatched = unmatched_viewings,
        "joined viewing data with producers"
    );
    Ok(Joined {
        records,
        unmatched_viewings,
        orphan_producers,
    })
}
