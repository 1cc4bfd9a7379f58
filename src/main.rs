use clap::Parser;
use loanflow::application::engine::LoanEngine;
use loanflow::config::Settings;
use loanflow::domain::ports::LoanStoreBox;
use loanflow::infrastructure::in_memory::InMemoryLoanStore;
use loanflow::infrastructure::notifier::LogNotifier;
use loanflow::interfaces::http::{AppState, router};
use loanflow::telemetry;
use miette::{IntoDiagnostic, Result};
use tracing::info;

fn open_store(settings: &Settings) -> Result<LoanStoreBox> {
    match &settings.db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => {
            use loanflow::infrastructure::rocksdb::RocksDbLoanStore;
            info!(db_path = %db_path.display(), "using RocksDB storage");
            let store = RocksDbLoanStore::open(db_path).into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryLoanStore::new()))
        }
        None => Ok(Box::new(InMemoryLoanStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();
    telemetry::init_logging(settings.log_format);

    let store = open_store(&settings)?;
    let engine = LoanEngine::new(store, Box::new(LogNotifier::new()));
    let app = router(AppState::new(engine));

    let addr = settings.socket_addr().into_diagnostic()?;
    let listener = tokio::net::TcpListener::bind(addr).await.into_diagnostic()?;
    info!(%addr, "loanflow listening");

    axum::serve(listener, app).await.into_diagnostic()?;
    Ok(())
}
