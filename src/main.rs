use clap::{Parser, Subcommand};
use report_pipeline::config::{Config, DEFAULT_CONFIG_PATH};
use report_pipeline::pipeline::{ImportPipeline, RunSummary, SanitizePipeline};
use report_pipeline::store::{ReportStore, SqliteReportStore};
use report_pipeline::{logging, metrics};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "report-pipeline")]
#[command(about = "Sanitize and import probe measurement reports")]
#[command(version = "0.1.0")]
struct Cli {
    /// Pipeline configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sanitize raw reports, archive the originals and remove them
    Sanitize,
    /// Import sanitized reports into the record store and publish them
    Import,
    /// Run sanitize, then import
    Run,
}

fn run_sanitize(config: &Config) -> anyhow::Result<RunSummary> {
    config.check_sanitize_preconditions()?;
    let pipeline = SanitizePipeline::from_config(config)?;
    Ok(pipeline.run()?)
}

async fn run_import(config: &Config) -> anyhow::Result<RunSummary> {
    config.check_import_preconditions()?;
    let store: Arc<dyn ReportStore> = Arc::new(SqliteReportStore::open(&config.database_path)?);
    Ok(ImportPipeline::new(config, store).run().await?)
}

fn print_summary(summary: &RunSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("\n📊 {} results:", summary.phase);
    println!("   Discovered: {}", summary.discovered);
    println!("   Done: {} ({} entries)", summary.done, summary.entries);
    println!("   Skipped: {}", summary.skipped.len());
    println!("   Failed: {}", summary.failed.len());
    for report in summary.skipped.iter().chain(&summary.failed) {
        println!("   - {}: {}", report.path.display(), report.reason);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    let _guard = logging::init_logging(&config.log_directory);
    metrics::init_metrics(config.metrics_addr);

    let summaries = match cli.command {
        Commands::Sanitize => vec![run_sanitize(&config)],
        Commands::Import => vec![run_import(&config).await],
        Commands::Run => {
            // import preconditions are checked before any file is sanitized
            if let Err(e) = config.check_import_preconditions() {
                error!("{}", e);
                return Err(e.into());
            }
            match run_sanitize(&config) {
                Ok(sanitized) => vec![Ok(sanitized), run_import(&config).await],
                Err(e) => vec![Err(e)],
            }
        }
    };

    for summary in summaries {
        match summary {
            Ok(summary) => print_summary(&summary, cli.json)?,
            Err(e) => {
                error!("Run aborted: {:#}", e);
                return Err(e);
            }
        }
    }
    info!("Run complete");
    Ok(())
}
