use crate::error::{PipelineError, Result};
use crate::types::Table;
use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, info};

pub const VIEWING_SHEET: &str = "Viewing data";
pub const PRODUCERS_SHEET: &str = "Producers";

/// The two raw sheets the pipeline starts from.
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub viewing: Table,
    pub producers: Table,
}

/// Load both sheets from `path`.
///
/// `path` is either a workbook holding the "Viewing data" and "Producers"
/// sheets, or a directory with one CSV export per sheet
/// (`Viewing data.csv`, `Producers.csv`). Cells are passed through verbatim.
pub fn load(path: &Path) -> Result<SourceTables> {
    if !path.exists() {
        return Err(PipelineError::DataSourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let tables = if path.is_dir() {
        load_csv_dir(path)?
    } else {
        load_workbook(path)?
    };
    info!(
        viewing_rows = tables.viewing.rows.len(),
        producer_rows = tables.producers.rows.len(),
        "loaded {}",
        path.display()
    );
    Ok(tables)
}

fn unreadable(path: &Path, reason: impl ToString) -> PipelineError {
    PipelineError::DataSourceUnreadable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn load_workbook(path: &Path) -> Result<SourceTables> {
    let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(path, e))?;
    debug!(sheets = ?workbook.sheet_names(), "opened workbook");

    let mut read_sheet = |name: &str| -> Result<Table> {
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| unreadable(path, format!("sheet '{}': {}", name, e)))?;
        table_from_range(name, &range)
            .ok_or_else(|| unreadable(path, format!("sheet '{}' has no header row", name)))
    };

    let viewing = read_sheet(VIEWING_SHEET)?;
    let producers = read_sheet(PRODUCERS_SHEET)?;
    Ok(SourceTables { viewing, producers })
}

/// First row of the used range is the header; the rest is data.
pub fn table_from_range(name: &str, range: &Range<Data>) -> Option<Table> {
    let mut rows = range.rows();
    let headers = rows.next()?.iter().map(|c| c.to_string()).collect();
    let rows = rows.map(|r| r.to_vec()).collect();
    Some(Table::new(name, headers, rows))
}

fn load_csv_dir(dir: &Path) -> Result<SourceTables> {
    let viewing = read_csv_sheet(dir, VIEWING_SHEET)?;
    let producers = read_csv_sheet(dir, PRODUCERS_SHEET)?;
    Ok(SourceTables { viewing, producers })
}

fn read_csv_sheet(dir: &Path, name: &str) -> Result<Table> {
    let path = dir.join(format!("{}.csv", name));
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(&path)
        .map_err(|e| unreadable(&path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| unreadable(&path, e))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if headers.is_empty() {
        return Err(unreadable(&path, format!("sheet '{}' has no header row", name)));
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| unreadable(&path, e))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Data::Empty
                    } else {
                        Data::String(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(Table::new(name, headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn range_header_becomes_columns() {
        let mut range = Range::new((0, 0), (2, 1));
        range.set_value((0, 0), Data::String("Programme".to_string()));
        range.set_value((0, 1), Data::String("Producer".to_string()));
        range.set_value((1, 0), Data::String("Show A".to_string()));
        range.set_value((1, 1), Data::String("Acme".to_string()));
        range.set_value((2, 0), Data::String("Show B".to_string()));

        let table = table_from_range(PRODUCERS_SHEET, &range).unwrap();
        assert_eq!(table.name, "Producers");
        assert_eq!(table.headers, vec!["Programme", "Producer"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][1], Data::Empty);
    }

    #[test]
    fn empty_range_has_no_table() {
        let range: Range<Data> = Range::empty();
        assert!(table_from_range(VIEWING_SHEET, &range).is_none());
    }

    #[test]
    fn missing_path_is_not_found() {
        let err = load(Path::new("/definitely/not/here.xlsx")).unwrap_err();
        assert!(matches!(err, PipelineError::DataSourceNotFound { .. }));
    }

    #[test]
    fn malformed_workbook_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tv.xlsx");
        fs::write(&path, b"this is not a zip archive").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, PipelineError::DataSourceUnreadable { .. }));
    }

    #[test]
    fn workbook_loads_both_sheets() {
        let tables = load(&fixture("tv_data.xlsx")).unwrap();

        assert_eq!(
            tables.viewing.headers,
            vec!["Date", "Programme", "Territory", "Channel", "Viewers"]
        );
        assert_eq!(tables.viewing.rows.len(), 3);
        assert!(matches!(tables.viewing.rows[0][0], Data::DateTime(_)));
        assert_eq!(tables.viewing.rows[0][1], Data::String(" Show A ".to_string()));
        assert_eq!(tables.producers.headers, vec!["Programme", "Producer"]);
        assert_eq!(tables.producers.rows.len(), 1);
    }

    #[test]
    fn workbook_missing_sheet_is_unreadable() {
        let err = load(&fixture("tv_data_no_producers.xlsx")).unwrap_err();
        match err {
            PipelineError::DataSourceUnreadable { reason, .. } => {
                assert!(reason.contains("Producers"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn csv_directory_loads_both_sheets() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Viewing data.csv"),
            "Date,Programme,Territory,Channel,Viewers\n2024-01-05, Show A ,UK,101,\n",
        )
        .unwrap();
        fs::write(dir.path().join("Producers.csv"), "Programme,Producer\nShow A,Acme\n").unwrap();

        let tables = load(dir.path()).unwrap();
        assert_eq!(tables.viewing.headers.len(), 5);
        // verbatim: no trimming at load time
        assert_eq!(tables.viewing.rows[0][1], Data::String(" Show A ".to_string()));
        assert_eq!(tables.viewing.rows[0][4], Data::Empty);
        assert_eq!(tables.producers.rows.len(), 1);
    }

    #[test]
    fn csv_directory_missing_sheet_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Viewing data.csv"), "Date,Programme\n").unwrap();

        let err = load(dir.path()).unwrap_err();
        match err {
            PipelineError::DataSourceUnreadable { path, .. } => {
                assert!(path.ends_with("Producers.csv"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
