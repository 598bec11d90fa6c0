use anyhow::Context;
use routedoc::config::ServiceConfig;
use routedoc::logging::{init_logging_with_config, LogConfig};
use routedoc::middleware::ProcedureExt;
use routedoc::runtime_config::RuntimeConfig;
use routedoc::server::{AppService, HttpServer};
use routedoc::RouteTable;
use std::path::PathBuf;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let _guard = init_logging_with_config(&LogConfig::from_env())?;

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => ServiceConfig::load(&path)?,
        None => ServiceConfig::default(),
    };
    let mut runtime = RuntimeConfig::from_env();
    if let Some(stack_size) = config.http.stack_size {
        runtime.stack_size = stack_size;
    }
    runtime.apply();

    let registry = RouteTable::new(routedoc_demo_items::serving_routes())
        .registry()
        .context("building the route registry")?;
    info!(routes = registry.len(), addr = %config.http.addr, "Starting items service");

    let service = AppService::new(
        registry
            .with_recovery()
            .with_status_policy(config.errors)
            .with_tracing(),
    );
    let handle = HttpServer(service)
        .start(config.http.addr.as_str())
        .with_context(|| format!("binding {}", config.http.addr))?;
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("server coroutine panicked"))
}
