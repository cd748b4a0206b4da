//! rustspringer - publications per country from the Springer Nature API
//!
//! ## Usage
//!
//! ```bash
//! rustspringer fetch --api-key KEY --years 2000-2020 --topics oncology --journals Nature
//! rustspringer plot --input output/20240101_120000_publications.csv \
//!     --countries "United States",Brazil --topic oncology --journal Nature
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use rustspringer::aggregate::{top_countries, DelayPolicy, Selection};
use rustspringer::metadata::{ClientConfig, SpringerClient, SPRINGER_API_BASE};
use rustspringer::plot;
use rustspringer::table::PublicationsTable;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Publications per country from the Springer Nature metadata API
#[derive(Parser)]
#[command(name = "rustspringer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the API and save the publications table as CSV
    Fetch {
        /// Springer Nature API key
        #[arg(long)]
        api_key: String,

        /// Years: "2020", "2000-2020" or "2000,2005,2010"
        #[arg(long)]
        years: String,

        /// Comma-separated topics (default: all topics)
        #[arg(long, value_delimiter = ',')]
        topics: Vec<String>,

        /// Comma-separated journals (default: all journals)
        #[arg(long, value_delimiter = ',')]
        journals: Vec<String>,

        /// Pause after every API call, in milliseconds
        #[arg(long, default_value = "1000")]
        delay_ms: u64,

        /// API host
        #[arg(long, default_value = SPRINGER_API_BASE)]
        base_url: String,

        /// Request timeout in seconds (default: none)
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,
    },

    /// Plot a country comparison from a saved publications table
    Plot {
        /// Publications table CSV written by `fetch`
        #[arg(short, long)]
        input: PathBuf,

        /// Comma-separated countries to compare
        #[arg(long, value_delimiter = ',', required = true)]
        countries: Vec<String>,

        /// Topic column to plot (empty: all topics)
        #[arg(long, default_value = "")]
        topic: String,

        /// Journal column to plot (empty: all journals)
        #[arg(long, default_value = "")]
        journal: String,

        /// Output SVG file
        #[arg(short, long, default_value = "publications.svg")]
        output: PathBuf,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Fetch {
            api_key,
            years,
            topics,
            journals,
            delay_ms,
            base_url,
            timeout_secs,
            output,
        } => {
            let config = ClientConfig {
                base_url,
                api_key,
                timeout: timeout_secs.map(Duration::from_secs),
            };
            let years = parse_years(&years).context("Invalid --years format")?;

            let mut selection = Selection::new(years);
            if !topics.is_empty() {
                selection = selection.with_topics(topics);
            }
            if !journals.is_empty() {
                selection = selection.with_journals(journals);
            }

            let delay = DelayPolicy::fixed(Duration::from_millis(delay_ms));
            run_fetch(config, selection, delay, output).await
        }
        Commands::Plot {
            input,
            countries,
            topic,
            journal,
            output,
        } => run_plot(input, countries, topic, journal, output),
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn run_fetch(
    config: ClientConfig,
    selection: Selection,
    delay: DelayPolicy,
    output_dir: PathBuf,
) -> Result<()> {
    let client = SpringerClient::new(config).context("Failed to create Springer client")?;

    println!(
        "Querying Springer: {} request(s), {:?} pause after each...",
        selection.request_count(),
        delay.pause()
    );

    let table = top_countries(&client, &selection, delay)
        .await
        .context("Country aggregation failed")?;

    std::fs::create_dir_all(&output_dir).context("Failed to create output directory")?;
    let path = csv_output_path(&output_dir, Local::now());
    table.save_csv(&path).context("Failed to write CSV")?;

    println!("Saved {} rows to {}", table.len(), path.display());
    Ok(())
}

fn run_plot(
    input: PathBuf,
    countries: Vec<String>,
    topic: String,
    journal: String,
    output: PathBuf,
) -> Result<()> {
    let table = PublicationsTable::load_csv(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    info!(countries = ?countries, topic = %topic, journal = %journal, "Plotting");
    plot::compare_publications(&table, &countries, &topic, &journal, &output)
        .context("Failed to plot comparison")?;

    println!("Saved plot: {}", output.display());
    Ok(())
}

/// `<dir>/<YYYYmmdd_HHMMSS>_publications.csv`
fn csv_output_path(output_dir: &Path, now: DateTime<Local>) -> PathBuf {
    output_dir.join(format!("{}_publications.csv", now.format("%Y%m%d_%H%M%S")))
}

/// Parse a year spec: "2020", "2000-2020" (inclusive) or "2000,2005,2010"
fn parse_years(years_str: &str) -> Result<Vec<i32>> {
    let years_str = years_str.trim();
    if years_str.contains(',') {
        return years_str
            .split(',')
            .map(|y| y.trim().parse::<i32>().context("Invalid year"))
            .collect();
    }
    if let Some((start, end)) = years_str.split_once('-') {
        let start: i32 = start.trim().parse().context("Invalid start year")?;
        let end: i32 = end.trim().parse().context("Invalid end year")?;
        if start > end {
            anyhow::bail!("Start year {} is after end year {}", start, end);
        }
        return Ok((start..=end).collect());
    }
    let year: i32 = years_str.parse().context("Invalid year")?;
    Ok(vec![year])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_years() -> Result<()> {
        assert_eq!(parse_years("2020")?, vec![2020]);
        assert_eq!(parse_years("2018-2020")?, vec![2018, 2019, 2020]);
        assert_eq!(parse_years("2000, 2010")?, vec![2000, 2010]);
        assert!(parse_years("2020-2018").is_err());
        assert!(parse_years("twenty").is_err());
        Ok(())
    }

    #[test]
    fn test_csv_output_path_is_inside_output_dir() -> Result<()> {
        use chrono::TimeZone;

        let now = Local
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .single()
            .context("Ambiguous local time")?;

        assert_eq!(
            csv_output_path(Path::new("./output"), now),
            PathBuf::from("./output/20240102_030405_publications.csv")
        );
        Ok(())
    }
}
