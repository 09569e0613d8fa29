use crate::error::{PipelineError, Result, Stage};
use crate::types::{ChannelId, Month, NormalizedRecord, Table};
use crate::util::{cell_text, parse_date_lenient, parse_f64_safe, parse_i64_safe};
use calamine::Data;
use tracing::{debug, info};

pub const DATE: &str = "Date";
pub const PROGRAMME: &str = "Programme";
pub const TERRITORY: &str = "Territory";
pub const CHANNEL: &str = "Channel";
pub const VIEWERS: &str = "Viewers";

struct ViewingColumns {
    date: usize,
    programme: usize,
    territory: usize,
    channel: usize,
    viewers: usize,
}

impl ViewingColumns {
    fn locate(table: &Table) -> Result<Self> {
        let find = |name: &str| {
            table
                .column(name)
                .ok_or_else(|| PipelineError::missing_column(Stage::Normalize, &table.name, name))
        };
        Ok(Self {
            date: find(DATE)?,
            programme: find(PROGRAMME)?,
            territory: find(TERRITORY)?,
            channel: find(CHANNEL)?,
            viewers: find(VIEWERS)?,
        })
    }
}

/// Clean the raw viewing sheet: parse dates (leniently), bucket them by month,
/// trim the text columns and default missing viewer counts to zero.
pub fn normalize(viewing: Table) -> Result<Vec<NormalizedRecord>> {
    let cols = ViewingColumns::locate(&viewing)?;

    let mut undated = 0usize;
    let mut records = Vec::with_capacity(viewing.rows.len());
    for (idx, row) in viewing.rows.iter().enumerate() {
        let date = parse_date_lenient(Table::cell(row, cols.date));
        if date.is_none() {
            undated += 1;
        }
        let viewers_cell = Table::cell(row, cols.viewers);
        let viewers = parse_viewers(viewers_cell).ok_or_else(|| PipelineError::TypeCoercion {
            stage: Stage::Normalize,
            table: viewing.name.clone(),
            row: idx + 1,
            column: VIEWERS.to_string(),
            value: viewers_cell.to_string(),
            target: "a number",
        })?;

        records.push(NormalizedRecord {
            month: date.as_ref().map(Month::of),
            date,
            programme: cell_text(Table::cell(row, cols.programme)),
            territory: cell_text(Table::cell(row, cols.territory)),
            channel: channel_id(Table::cell(row, cols.channel)),
            viewers,
        });
    }

    if undated > 0 {
        debug!(rows = undated, "viewing rows with no readable date");
    }
    info!(rows = records.len(), "normalized viewing data");
    Ok(records)
}

/// Missing counts (empty cells, blank text, error cells) become zero;
/// anything present that is not a finite number is rejected.
fn parse_viewers(cell: &Data) -> Option<f64> {
    match cell {
        Data::Empty | Data::Error(_) => Some(0.0),
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => f.is_finite().then_some(*f),
        Data::String(s) if s.trim().is_empty() => Some(0.0),
        Data::String(s) => parse_f64_safe(Some(s)),
        _ => None,
    }
}

fn channel_id(cell: &Data) -> Option<ChannelId> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::Int(i) => Some(ChannelId::Number(*i)),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Some(ChannelId::Number(*f as i64))
        }
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            let number = parse_i64_safe(Some(s)).or_else(|| {
                parse_f64_safe(Some(s))
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            });
            Some(number.map_or_else(|| ChannelId::Label(s.to_string()), ChannelId::Number))
        }
        other => Some(ChannelId::Label(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;
    use chrono::NaiveDate;

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn viewing_table(rows: Vec<Vec<Data>>) -> Table {
        Table::new(
            "Viewing data",
            ["Date", "Programme", "Territory", "Channel", "Viewers"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows,
        )
    }

    #[test]
    fn cleans_and_derives_fields() {
        let table = viewing_table(vec![vec![
            s("2024-01-20 21:00:00"),
            s("  Show A "),
            s(" UK"),
            Data::Float(101.0),
            Data::Empty,
        ]]);

        let records = normalize(table).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(
            r.date.unwrap().date(),
            NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()
        );
        assert_eq!(r.month, Month::new(2024, 1));
        assert_eq!(r.programme, "Show A");
        assert_eq!(r.territory, "UK");
        assert_eq!(r.channel, Some(ChannelId::Number(101)));
        assert_eq!(r.viewers, 0.0);
    }

    #[test]
    fn bad_dates_become_null_months() {
        let table = viewing_table(vec![vec![
            s("sometime in spring"),
            s("Show A"),
            s("UK"),
            Data::Int(101),
            Data::Int(250),
        ]]);

        let records = normalize(table).unwrap();
        assert_eq!(records[0].date, None);
        assert_eq!(records[0].month, None);
        assert_eq!(records[0].viewers, 250.0);
    }

    #[test]
    fn column_order_does_not_matter() {
        let table = Table::new(
            "Viewing data",
            ["Viewers", "Channel", "Territory", "Programme", "Date"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            vec![vec![
                s("1,200"),
                s("7"),
                s("IE"),
                s("Show B"),
                s("2024-03-01"),
            ]],
        );

        let records = normalize(table).unwrap();
        assert_eq!(records[0].programme, "Show B");
        assert_eq!(records[0].channel, Some(ChannelId::Number(7)));
        assert_eq!(records[0].viewers, 1200.0);
        assert_eq!(records[0].month, Month::new(2024, 3));
    }

    #[test]
    fn missing_viewers_column_is_schema_mismatch() {
        let table = Table::new(
            "Viewing data",
            ["Date", "Programme", "Territory", "Channel"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            vec![],
        );

        let err = normalize(table).unwrap_err();
        match err {
            PipelineError::SchemaMismatch { stage, column, .. } => {
                assert_eq!(stage, Stage::Normalize);
                assert_eq!(column, "Viewers");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_viewers_are_rejected() {
        let table = viewing_table(vec![
            vec![s("2024-01-05"), s("Show A"), s("UK"), s("1"), s("10")],
            vec![s("2024-01-06"), s("Show A"), s("UK"), s("1"), s("lots")],
        ]);

        let err = normalize(table).unwrap_err();
        match err {
            PipelineError::TypeCoercion { row, value, .. } => {
                assert_eq!(row, 2);
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_cells_read_as_missing() {
        let table = viewing_table(vec![vec![
            s("2024-01-05"),
            Data::Error(CellErrorType::NA),
            s("UK"),
            Data::Error(CellErrorType::Ref),
            Data::Error(CellErrorType::Div0),
        ]]);

        let records = normalize(table).unwrap();
        assert_eq!(records[0].programme, "");
        assert_eq!(records[0].channel, None);
        assert_eq!(records[0].viewers, 0.0);
    }

    #[test]
    fn channel_values_keep_their_identity() {
        assert_eq!(channel_id(&Data::Empty), None);
        assert_eq!(channel_id(&Data::Error(CellErrorType::NA)), None);
        assert_eq!(channel_id(&s("  ")), None);
        assert_eq!(channel_id(&s("101.0")), Some(ChannelId::Number(101)));
        assert_eq!(channel_id(&Data::Float(2.5)), Some(ChannelId::Label("2.5".into())));
        assert_eq!(channel_id(&s("BBC One")), Some(ChannelId::Label("BBC One".into())));
    }
}
