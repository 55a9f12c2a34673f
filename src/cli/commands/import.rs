//! Import command implementation
//!
//! This module implements the `import` command: transform the rows of every
//! mapped sheet and upload the resources to the configured FHIR server.

use super::{confirm, exit_code};
use crate::adapters::fhir::FhirClient;
use crate::adapters::files::{load_mapping, load_rows};
use crate::config::load_config;
use crate::core::import::{
    ImportCoordinator, ImportSummary, SheetEvent, SheetEventKind, SheetStatus,
};
use clap::Args;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Mapping document (JSON)
    #[arg(short, long)]
    pub mapping: String,

    /// Parsed row data (JSON, keyed by sheet name)
    #[arg(short, long)]
    pub data: String,

    /// Only import this sheet
    #[arg(long)]
    pub sheet: Option<String>,

    /// Dry run mode - transform everything without uploading
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl ImportArgs {
    /// Execute the import command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting import command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(exit_code::CONFIGURATION);
            }
        };

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.import.dry_run = true;
        }

        let mapping = match load_mapping(&self.mapping) {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load mapping document");
                eprintln!("Failed to load mapping document: {e}");
                return Ok(exit_code::CONFIGURATION);
            }
        };

        let workbook = match load_rows(&self.data) {
            Ok(w) => w,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load row data");
                eprintln!("Failed to load row data: {e}");
                return Ok(exit_code::CONFIGURATION);
            }
        };

        if let Some(sheet) = &self.sheet {
            if !mapping.sheets.contains_key(sheet) {
                eprintln!("Sheet '{sheet}' is not declared in {}", self.mapping);
                return Ok(exit_code::CONFIGURATION);
            }
        }

        let dry_run = config.dry_run();
        if dry_run {
            tracing::info!("Dry run mode enabled - no resources will be uploaded");
            println!("🔍 DRY RUN MODE - No resources will be uploaded");
            println!();
        }

        if !self.yes && !dry_run {
            println!("Import Configuration:");
            println!("  FHIR server: {}", config.fhir.base_url);
            println!(
                "  Sheets: {}",
                match &self.sheet {
                    Some(sheet) => sheet.clone(),
                    None => mapping.sheets.keys().cloned().collect::<Vec<_>>().join(", "),
                }
            );
            println!(
                "  Rows: {}",
                workbook.values().map(Vec::len).sum::<usize>()
            );
            println!("  Chunk size: {}", config.import.chunk_size);
            println!();

            if !confirm("Proceed with import?")? {
                println!("Import cancelled.");
                return Ok(exit_code::SUCCESS);
            }
        }

        let client = match FhirClient::new(config.fhir.clone()) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create FHIR client");
                eprintln!("Failed to initialize FHIR client: {e}");
                return Ok(exit_code::CONNECTION);
            }
        };

        let coordinator = ImportCoordinator::new(&config, client, shutdown_signal);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let printer = tokio::spawn(print_events(events_rx));

        println!("🚀 Starting import...");
        println!();

        let summary = coordinator
            .run(&mapping, &workbook, self.sheet.as_deref(), &events_tx)
            .await;

        drop(events_tx);
        if let Err(e) = printer.await {
            tracing::warn!(error = %e, "Event printer stopped unexpectedly");
        }

        print_summary(&summary);
        Ok(summary_exit_code(&summary))
    }
}

async fn print_events(mut events: mpsc::UnboundedReceiver<SheetEvent>) {
    while let Some(event) = events.recv().await {
        match event.kind {
            SheetEventKind::Info { total } => println!("  📄 {}: {total} rows", event.sheet),
            SheetEventKind::Status(SheetStatus::Done) => println!("  ✅ {}: done", event.sheet),
            SheetEventKind::Status(SheetStatus::Warning { description }) => {
                println!("  ⚠️  {}: {description}", event.sheet)
            }
            SheetEventKind::Status(SheetStatus::Error { description }) => {
                println!("  ❌ {}: {description}", event.sheet)
            }
        }
    }
}

fn print_summary(summary: &ImportSummary) {
    println!();
    println!("📊 Import Summary:");
    println!("  Sheets: {}", summary.sheets.len());
    println!("  Rows: {}", summary.total_rows());
    println!("  Resources generated: {}", summary.resources_generated());
    println!("  Resources uploaded: {}", summary.resources_uploaded());
    println!("  Chunks failed: {}", summary.chunks_failed());
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    for sheet in summary.sheets.iter().filter(|s| !s.is_clean()) {
        println!(
            "  ⚠️  {}: {} failed rows, {} failed chunks, {} skipped chunks",
            sheet.sheet,
            sheet.rows_failed,
            sheet.submission.chunks_failed,
            sheet.submission.chunks_skipped
        );
    }
}

/// Map an import summary to the process exit code
pub fn summary_exit_code(summary: &ImportSummary) -> i32 {
    if summary.was_cancelled() {
        println!("⚠️  Import interrupted.");
        tracing::info!("Import interrupted by user signal");
        exit_code::INTERRUPTED
    } else if summary.is_successful() {
        println!("✅ Import completed successfully!");
        exit_code::SUCCESS
    } else {
        println!("⚠️  Import completed with failures");
        exit_code::PARTIAL_FAILURE
    }
}
