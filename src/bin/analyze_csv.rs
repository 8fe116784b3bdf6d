use clap::{Parser, ValueEnum};
use displacement_tracker_service::analysis::ColumnStatistics;
use displacement_tracker_service::series::{ColumnNaming, Record};
use displacement_tracker_service::services::{AnalysisReport, AnalysisService};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "analyze-csv")]
#[command(about = "Analyze a ground displacement and rainfall CSV file", long_about = None)]
struct Cli {
    /// Path to the CSV file (first row is the header)
    #[arg(long)]
    file: PathBuf,

    /// Number of rows to show in the preview
    #[arg(long, default_value = "5")]
    preview_rows: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write the normalized table (ISO dates, sorted rows) to this path
    #[arg(long)]
    export: Option<PathBuf>,

    /// Header of the date column
    #[arg(long, env, default_value = "fecha")]
    date_column: String,

    /// Header of the rainfall column
    #[arg(long, env, default_value = "rainfall(mm)")]
    rainfall_column: String,
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.3}"),
        None => "NaN".to_string(),
    }
}

fn render_preview(report: &AnalysisReport, records: &[Record]) -> String {
    let mut out = String::new();
    let mut header = vec![report.date_column.clone()];
    header.extend(report.series_ids.iter().cloned());
    if let Some(rainfall) = &report.rainfall_column {
        header.push(rainfall.clone());
    }
    out.push_str(&header.join("\t"));
    out.push('\n');

    for record in records {
        let mut row = vec![record.date.to_string()];
        row.extend(record.displacements.iter().map(|v| format_value(*v)));
        if report.rainfall_column.is_some() {
            row.push(format_value(record.rainfall_mm));
        }
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out
}

fn render_statistics(statistics: &[ColumnStatistics]) -> String {
    let mut out = format!(
        "{:<16}{:>8}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}\n",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for stats in statistics {
        out.push_str(&format!(
            "{:<16}{:>8}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}\n",
            stats.column,
            stats.count,
            format_value(stats.mean),
            format_value(stats.std),
            format_value(stats.min),
            format_value(stats.p25),
            format_value(stats.median),
            format_value(stats.p75),
            format_value(stats.max),
        ));
    }
    out
}

fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();

    out.push_str("Data preview\n");
    out.push_str(&"=".repeat(60));
    out.push('\n');
    out.push_str(&render_preview(report, &report.preview));

    out.push_str("\nDate with the highest displacement rate\n");
    out.push_str(&"=".repeat(60));
    out.push('\n');
    match &report.peak_rate {
        Some(peak) => out.push_str(&format!(
            "The highest mean daily rate was recorded on {} ({:.3} cm/day).\n",
            peak.date, peak.rate_cm_per_day
        )),
        None => out.push_str("Not enough rows to compute a displacement rate.\n"),
    }

    out.push_str("\nDescriptive statistics\n");
    out.push_str(&"=".repeat(60));
    out.push('\n');
    out.push_str(&render_statistics(&report.statistics));

    out
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let naming = ColumnNaming {
        date_column: cli.date_column,
        rainfall_column: cli.rainfall_column,
    };
    let service = AnalysisService::new(naming, cli.preview_rows);

    info!("Reading {}", cli.file.display());
    let input = fs::read(&cli.file)?;
    let table = service.load(&input)?;

    if let Some(path) = &cli.export {
        let writer = BufWriter::new(File::create(path)?);
        table.write_csv(writer)?;
        info!("Wrote normalized table to {}", path.display());
    }

    let report = AnalysisService::build_report(&table, cli.preview_rows);

    match cli.format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}
