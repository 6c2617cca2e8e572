use clap::Parser;
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};
use vigil::{
    alerts::channel_from_config,
    collector::{Collector, SimulatedResourceCollector, SystemResourceCollector},
    config::{CollectorConfig, Config, StorageConfig, read_config_file},
    engine::MonitoringEngine,
    storage::memory::MemoryStorage,
};

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Periodic metric collection with threshold alerts")]
struct Args {
    /// Config file (JSON); the built-in configuration is used when omitted
    #[arg(short, long)]
    file: Option<String>,

    /// Log level for vigil's own output
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,
}

fn init(level: LevelFilter) {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![("vigil", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init(args.log_level);
    trace!("started with args: {args:?}");

    let config = match &args.file {
        Some(path) => read_config_file(path)?,
        None => Config::default(),
    };

    let mut engine = MonitoringEngine::new(config)?;
    let resolved = engine.config().clone();

    for collector in &resolved.collectors {
        let collector: Box<dyn Collector> = match collector {
            CollectorConfig::Simulated => Box::new(SimulatedResourceCollector::new()),
            CollectorConfig::System => Box::new(SystemResourceCollector::new()),
        };
        engine.register_boxed_collector(collector);
    }

    for alert in &resolved.alerts {
        engine.register_boxed_alerter(channel_from_config(alert));
    }

    match &resolved.storage {
        StorageConfig::None => info!("no storage configured, metrics are not persisted"),
        StorageConfig::Memory => engine.register_storage(MemoryStorage::new()),
        StorageConfig::Sqlite { path } => {
            #[cfg(feature = "storage-sqlite")]
            engine.register_storage(vigil::storage::sqlite::SqliteStorage::new(path).await?);

            #[cfg(not(feature = "storage-sqlite"))]
            anyhow::bail!(
                "SQLite storage at {} requested but built without the storage-sqlite feature",
                path.display()
            );
        }
    }

    println!("Press Ctrl+C to stop the monitoring system.");
    engine.start().await;

    Ok(())
}
