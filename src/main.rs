use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use tonearm::infrastructure::media_tool::YtDlpTool;
use tonearm::infrastructure::observability::init_tracing;
use tonearm::infrastructure::persistence::InMemoryJobStore;
use tonearm::infrastructure::process::ProcessSupervisor;
use tonearm::infrastructure::storage::LocalScratchStorage;
use tonearm::presentation::{AppState, Dependencies, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    init_tracing(&settings.tracing_config(environment), settings.server.port);

    let scratch = LocalScratchStorage::new(settings.jobs.scratch_root.clone())?;
    tracing::info!(root = %scratch.root().display(), "Scratch storage ready");

    let deps = Dependencies {
        job_store: Arc::new(InMemoryJobStore::new()),
        process_runner: Arc::new(ProcessSupervisor::new()),
        media_tool: Arc::new(YtDlpTool::new(settings.tool.to_tool_config())),
        scratch: Arc::new(scratch),
    };
    let (state, sweeper) = AppState::assemble(deps, &settings.jobs, settings.tool.stream_progress);

    let shutdown = CancellationToken::new();
    let sweeper_task = tokio::spawn(sweeper.run(shutdown.clone()));

    let router = create_router(state);
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    let server_shutdown = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Err(e) = sweeper_task.await {
        tracing::warn!(error = %e, "Sweeper task ended abnormally");
    }
    Ok(())
}
