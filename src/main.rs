use std::{
    collections::BTreeSet,
    process,
    sync::{Arc, OnceLock},
};

use nvme_exporter::{
    config::Config,
    core::{
        collectors::registry::GroupRegistry,
        command::{lookup, CommandRunner, SystemRunner},
        gate::ValidationGate,
        preflight::{check_privileges, spawn_revalidation, validate_version},
        scrape::NvmeCollector,
    },
    logger::LoggerManager,
    print_error, server,
};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn config() -> &'static Config {
    CONFIG.get_or_init(|| {
        Config::new().unwrap_or_else(|e| {
            print_error!("{}", e);
            process::exit(1);
        })
    })
}

fn log_groups_table(enabled: &[String], registry: &GroupRegistry) {
    let enabled_set: BTreeSet<&str> = enabled.iter().map(String::as_str).collect();
    let all_names: BTreeSet<&str> = registry
        .list_names()
        .into_iter()
        .chain(enabled_set.iter().copied())
        .collect();

    let name_width = all_names
        .iter()
        .map(|s| s.len())
        .max()
        .unwrap_or(10)
        .max("Optional log".len());
    let status_width = "ENABLED (missing)".len();

    info!(
        "{:<width$} | {:<status_width$} | Description",
        "Optional log",
        "Status",
        width = name_width
    );
    info!(
        "{}-+-{}-+-{}",
        "-".repeat(name_width),
        "-".repeat(status_width),
        "-".repeat(12)
    );

    for name in all_names {
        let description = registry.get(name).map(|meta| meta.description).unwrap_or("");
        let status = match (enabled_set.contains(name), registry.contains(name)) {
            (true, true) => "ENABLED",
            (true, false) => "ENABLED (missing)",
            (false, _) => "DISABLED",
        };
        info!(
            "{:<width$} | {:<status_width$} | {}",
            name,
            status,
            description,
            width = name_width
        );
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    info!("Received Ctrl+C, initiating graceful shutdown...");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config();
    let mut logger_manager = LoggerManager::new(cfg.logger.clone()).unwrap_or_else(|e| {
        print_error!("Failed to setup Log Manager: {}", e);
        process::exit(1);
    });
    logger_manager.init().unwrap_or_else(|e| {
        print_error!("Failed to init Log Manager: {}", e);
        process::exit(1);
    });
    info!("Starting nvme-exporter version {}...", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", cfg.logger.level);
    debug!("{:#?}", cfg.nvme);

    log_groups_table(&cfg.nvme.optional_logs, GroupRegistry::global());

    if let Err(e) = check_privileges(cfg.nvme.require_root) {
        error!("{}", e);
        process::exit(1);
    }
    let executable = lookup(&cfg.nvme.binary).unwrap_or_else(|e| {
        error!("{}", e);
        process::exit(1);
    });
    info!("Using {}", executable.display());

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new(cfg.nvme.command_timeout()));
    let gate = Arc::new(ValidationGate::new());
    let floor = cfg.nvme.version_floor();

    match validate_version(runner.as_ref(), &cfg.nvme.binary, floor, &gate).await {
        Ok(version) => info!("Detected {} version {}", cfg.nvme.binary, version),
        Err(e) => warn!("{}; scrapes will be skipped until this is fixed", e),
    }

    let revalidation = cfg.nvme.revalidate_interval().map(|interval| {
        spawn_revalidation(
            runner.clone(),
            cfg.nvme.binary.clone(),
            floor,
            gate.clone(),
            interval,
        )
    });

    let collector = NvmeCollector::new(runner, gate, &cfg.nvme).unwrap_or_else(|e| {
        error!("Failed to build collector: {}", e);
        process::exit(1);
    });

    let app = server::router(Arc::new(collector), &cfg.exporter.endpoint);
    let addr = cfg.exporter.bind_address();
    let listener = TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        error!("Failed to bind {}: {}", addr, e);
        process::exit(1);
    });
    info!("Serving metrics on http://{}{}", addr, cfg.exporter.endpoint);

    server::serve(listener, app, shutdown_signal()).await?;

    if let Some(handle) = revalidation {
        handle.abort();
    }
    info!("Shutdown complete");
    Ok(())
}
