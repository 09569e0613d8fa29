// tests/common/mod.rs
// Shared helpers: build CSV-directory inputs in a temp dir.
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const VIEWING_HEADER: &str = "Date,Programme,Territory,Channel,Viewers";

/// A temp directory holding `Viewing data.csv` and `Producers.csv`.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new(viewing: &[&str], producers: &[&str]) -> Self {
        Self::with_viewing_header(VIEWING_HEADER, viewing, producers)
    }

    pub fn with_viewing_header(header: &str, viewing: &[&str], producers: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let input = dir.path().join("input");
        fs::create_dir(&input).expect("Failed to create input dir");
        write_sheet(&input.join("Viewing data.csv"), header, viewing);
        write_sheet(&input.join("Producers.csv"), "Programme,Producer", producers);
        Self { dir }
    }

    pub fn input(&self) -> PathBuf {
        self.dir.path().join("input")
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("summary_data.json")
    }

    pub fn read_output(&self) -> serde_json::Value {
        let text = fs::read_to_string(self.output()).expect("Failed to read summary");
        serde_json::from_str(&text).expect("Summary is not valid JSON")
    }
}

fn write_sheet(path: &std::path::Path, header: &str, rows: &[&str]) {
    let mut body = String::from(header);
    body.push('\n');
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    fs::write(path, body).expect("Failed to write sheet");
}
