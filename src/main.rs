use anyhow::Context;
use clap::Parser;
use physician_locator::config::Command;
use physician_locator::core::cache::Integrity;
use physician_locator::core::export;
use physician_locator::domain::ports::ConfigProvider;
use physician_locator::utils::error::ErrorSeverity;
use physician_locator::utils::progress::FetchProgress;
use physician_locator::utils::{logger, validation::Validate};
use physician_locator::{
    CliConfig, FetchReport, LocalStorage, LocatorConfig, LocatorError, LocatorPipeline,
    MetroQuery, ZipTable,
};
use std::path::Path;

fn exit_with(e: &LocatorError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn build_pipeline(config: &LocatorConfig) -> physician_locator::Result<LocatorPipeline<LocalStorage>> {
    let table = ZipTable::from_path(config.reference_path())?;
    let storage = LocalStorage::new(config.cache_dir());
    let pipeline = LocatorPipeline::from_config(config, table, storage)?;
    Ok(pipeline.with_progress(FetchProgress::new(true)))
}

fn print_report(report: &FetchReport) {
    println!(
        "📦 {} postal codes: {} cached, {} fetched, {} not persisted, {} failed ({} registry requests)",
        report.outcomes.len(),
        report.cache_hits(),
        report.fetched(),
        report.not_persisted(),
        report.failed(),
        report.network_attempts()
    );
    for failure in report.failures() {
        if let physician_locator::FetchStatus::Failed { reason } = &failure.status {
            println!("   ⚠️  {}: {}", failure.postal_code, reason);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(3);
        }
    };

    let _log_guard = logger::init_cli_logger(cli.verbose, Path::new(&config.logging.directory))
        .with_context(|| format!("creating log directory {}", config.logging.directory))?;

    tracing::info!("Starting physician-locator");
    if cli.verbose {
        tracing::debug!("Effective config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    match &cli.command {
        Command::Metros => {
            let table = ZipTable::from_path(config.reference_path()).unwrap_or_else(|e| exit_with(&e));
            let resolver = physician_locator::core::resolver::ZipResolver::new(table);
            for name in resolver.metro_names() {
                println!("{}", name);
            }
        }
        Command::Locate { metro, output, csv } => {
            let pipeline = build_pipeline(&config).unwrap_or_else(|e| exit_with(&e));
            let query = MetroQuery::parse(metro);
            let result = pipeline.locate(&query).await;

            if result.postal_codes.is_empty() {
                println!("No ZIP codes found for {}", query);
                return Ok(());
            }

            print_report(&result.report);
            for skipped in &result.aggregation.skipped {
                println!("   ⚠️  skipped {}: {}", skipped.postal_code, skipped.reason);
            }
            println!("✅ {} physicians found for {}", result.records().len(), query);

            if let Some(path) = output {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("creating {}", path.display()))?;
                serde_json::to_writer_pretty(file, result.records())
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("📁 Records saved to: {}", path.display());
            }
            if let Some(path) = csv {
                export::export_csv(result.records(), path).unwrap_or_else(|e| exit_with(&e));
                println!("📁 CSV saved to: {}", path.display());
            }
        }
        Command::CacheAll => {
            let pipeline = build_pipeline(&config).unwrap_or_else(|e| exit_with(&e));
            let report = pipeline.cache_all().await;
            print_report(&report);
        }
        Command::CacheStatus => {
            let pipeline = build_pipeline(&config).unwrap_or_else(|e| exit_with(&e));
            let entries = pipeline.cache_status().await.unwrap_or_else(|e| exit_with(&e));
            for entry in &entries {
                let integrity = match entry.integrity {
                    Integrity::Verified => "ok",
                    Integrity::Mismatch => "MODIFIED",
                    Integrity::Unknown => "no metadata",
                };
                match &entry.metadata {
                    Some(meta) => println!(
                        "{}  {:>4} records  fetched {}  {}",
                        entry.postal_code,
                        meta.record_count,
                        meta.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        integrity
                    ),
                    None => println!("{}  {}", entry.postal_code, integrity),
                }
            }
            println!("{} cache entries in {}", entries.len(), config.cache_dir());
        }
    }

    Ok(())
}
