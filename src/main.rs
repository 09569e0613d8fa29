// Entry point: run the summary pipeline over one input and write the JSON.
//
// - Loads the workbook (or CSV directory) named on the command line.
// - Prints a short processing report and a preview of the summary.
// - On failure prints the stage that failed and exits non-zero; no output
//   file is written.
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tv_summary::output::preview_table_rows;
use tv_summary::util::format_int;
use tv_summary::{Pipeline, RunReport};

const PREVIEW_ROWS: usize = 10;

#[derive(Parser)]
#[command(
    name = "tv_summary",
    version,
    about = "Monthly per-producer, per-channel viewing summary"
)]
struct Cli {
    /// Workbook with "Viewing data" and "Producers" sheets, or a directory
    /// holding "Viewing data.csv" and "Producers.csv"
    #[arg(default_value = "2024 Mediacells Python Task TV Data.xlsx")]
    input: PathBuf,

    /// Where to write the JSON summary
    #[arg(default_value = "summary_data.json")]
    output: PathBuf,
}

fn print_report(report: &RunReport) {
    println!(
        "Processing dataset... ({} viewing rows, {} producer rows loaded)",
        format_int(report.viewing_rows),
        format_int(report.producer_rows)
    );
    if report.unmatched_viewings > 0 {
        println!(
            "Note: {} viewing rows have no producer and are credited to Unknown.",
            format_int(report.unmatched_viewings)
        );
    }
    if report.ungrouped_rows > 0 {
        println!(
            "Note: {} rows without a valid date or channel left out of the summary.",
            format_int(report.ungrouped_rows)
        );
    }
    if report.orphan_producers > 0 {
        println!(
            "Info: {} producer rows have no viewing data.",
            format_int(report.orphan_producers)
        );
    }
    println!("");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(Level::WARN.as_str())),
        )
        .init();

    let cli = Cli::parse();
    let pipeline = Pipeline::new(cli.input, cli.output);

    let outcome = match pipeline.run() {
        Ok(outcome) => outcome,
        Err(e) => {
            let message = e.stage().failure_message();
            return Err(anyhow::Error::new(e).context(message));
        }
    };

    print_report(&outcome.report);
    println!(
        "Summary ({} rows) saved to {}\n",
        format_int(outcome.report.summary_rows),
        pipeline.output().display()
    );
    preview_table_rows(&outcome.summary, PREVIEW_ROWS);
    Ok(())
}
