use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logsift::config;
use logsift::import::{BulkImporter, ImportOutcome, ImportState};
use logsift::search::LogStore;

#[derive(Parser)]
#[command(name = "logsift-import")]
#[command(about = "Bulk import a log file into the logsift database", long_about = None)]
struct Cli {
    /// Path to the .txt / .log file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Database file (defaults to config.json / LOGSIFT_DB)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Lines per committed transaction
    #[arg(short, long)]
    chunk_size: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logsift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let app_config = config::load_config()?;

    let db_path = cli.db.unwrap_or_else(|| app_config.get_db_path());
    let chunk_size = cli.chunk_size.unwrap_or(app_config.import.chunk_size);

    let store = LogStore::open_and_init(&db_path).await?;

    let state = Arc::new(ImportState::new());
    let signal_state = state.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping import...");
            signal_state.cancel();
        }
    });

    let importer = BulkImporter::new(chunk_size, state);
    let report = importer.import_file(&store, &cli.file).await;
    store.close().await;

    println!("Import {:?}: {} lines submitted", report.outcome, report.lines_submitted);
    println!(
        "  {} new, {} duplicates, {} chunks committed, {} chunks failed ({} lines)",
        report.inserted, report.duplicates, report.chunks_committed, report.failed_chunks, report.failed_lines
    );

    match report.outcome {
        ImportOutcome::Failed => {
            anyhow::bail!(report.error.unwrap_or_else(|| "import failed".to_string()))
        }
        ImportOutcome::Interrupted => {
            println!("Interrupted: re-run the same file to resume, duplicates are skipped.");
            Ok(())
        }
        ImportOutcome::Completed => Ok(()),
    }
}
