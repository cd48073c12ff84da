//! Command-line interface for the harvester.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::HarvestConfig;
use crate::error::Result;
use crate::harvester::{HarvestEvent, Harvester};
use crate::http::HttpFetcher;
use crate::links::TitleMatch;
use crate::writer::{DatasetWriter, WriteOutcome};

/// Dados Abertos Harvester - Mirror parliament open-data datasets as CSV.
#[derive(Parser)]
#[command(name = "dados-abertos-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Theme page to start from; repeat for several (default: the portal's three themes)
    #[arg(short, long = "theme", value_name = "URL")]
    pub themes: Vec<String>,

    /// Match "json" in link titles regardless of case
    #[arg(long)]
    pub ignore_case: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download every dataset, convert to CSV and write the files that changed.
    Sync {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory (default: data/, or $DADOS_ABERTOS_OUTPUT_DIR)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the datasets that would be downloaded.
    List {
        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync { source, output } => {
            let config = build_config(&source, output);
            sync_command(&config)
        }
        Commands::List { source } => {
            let config = build_config(&source, None);
            list_command(&config)
        }
    }
}

fn build_config(source: &SourceArgs, output: Option<PathBuf>) -> HarvestConfig {
    let title_match = if source.ignore_case {
        TitleMatch::CaseInsensitive
    } else {
        TitleMatch::CaseSensitive
    };

    let mut config = HarvestConfig::from_env()
        .with_theme_urls(source.themes.clone())
        .with_title_match(title_match);
    if let Some(output) = output {
        config = config.with_output_dir(output);
    }
    config
}

fn create_harvester(config: &HarvestConfig) -> Result<Harvester<HttpFetcher>> {
    let fetcher = HttpFetcher::new()?.with_timeouts(config.html_timeout, config.json_timeout);
    let writer = DatasetWriter::new(&config.output_dir);
    Ok(Harvester::new(fetcher, writer, config.title_match))
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Format a count with `,` between groups of three digits.
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Execute the sync command.
fn sync_command(config: &HarvestConfig) -> Result<()> {
    let harvester = create_harvester(config)?;
    let pb = spinner();

    let result = harvester.run_with(config.theme_urls.as_slice(), |event| match event {
        HarvestEvent::ThemeStarted { theme_url } => {
            pb.suspend(|| {
                println!();
                println!("=== {} ===", style(theme_url).cyan());
            });
            pb.set_message(format!("Fetching {theme_url}"));
        }
        HarvestEvent::PageSkipped { page_url } => {
            pb.set_message(format!("No JSON on {page_url}"));
        }
        HarvestEvent::DatasetProcessed { link, report } => {
            let line = match report.outcome {
                WriteOutcome::Unchanged => {
                    format!("{} {}: unchanged", style("✓").green(), report.file_name)
                }
                WriteOutcome::Written { bytes } => format!(
                    "{} {}: written ({} bytes)",
                    style("↻").yellow().bold(),
                    report.file_name,
                    group_thousands(bytes)
                ),
            };
            // println on a hidden bar is a no-op, and the bar is hidden without a TTY
            pb.suspend(|| println!("{line}"));
            pb.set_message(format!("Processed {}", link.url));
        }
        HarvestEvent::ThemeFinished { .. } => {}
    });

    pb.finish_and_clear();
    let summary = result?;

    println!();
    println!(
        "{} {} file(s) updated in {}.",
        style("Done -").green().bold(),
        summary.total_changed,
        harvester.writer().output_dir().display()
    );

    Ok(())
}

/// Execute the list command.
fn list_command(config: &HarvestConfig) -> Result<()> {
    let harvester = create_harvester(config)?;
    let pb = spinner();
    pb.set_message("Discovering datasets...");

    let links = match harvester.discover(config.theme_urls.as_slice()) {
        Ok(links) => links,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    for link in &links {
        println!("{}  {}", style(&link.title).green(), link.url);
    }
    println!();
    println!("{} dataset(s)", style(links.len()).bold());

    Ok(())
}
