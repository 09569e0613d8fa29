use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

/// Serialize `value` as JSON and write it to `path`.
///
/// The document goes to a sibling `.tmp` file first and is renamed into
/// place, so a failed write leaves no partial output behind.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let sink_error = |source: io::Error| PipelineError::SinkUnwritable {
        path: path.to_path_buf(),
        source,
    };

    let s = serde_json::to_string_pretty(value).map_err(|e| sink_error(io::Error::other(e)))?;
    let temp = temp_path(path);
    if let Err(e) = fs::write(&temp, s).and_then(|_| fs::rename(&temp, path)) {
        let _ = fs::remove_file(&temp);
        return Err(sink_error(e));
    }
    info!("wrote {}", path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
