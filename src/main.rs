use std::process::ExitCode;
use std::sync::Arc;

use forum::store::MemoryStore;
use forum::{Config, Server, api};
use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let sink = Dispatch::new(
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .finish(),
    );
    if let Err(e) = tracing::dispatcher::set_global_default(sink.clone()) {
        eprintln!("failed to install log subscriber: {e}");
    }

    match run(sink).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(sink: Dispatch) -> Result<(), forum::Error> {
    let config = Config::from_env()?.with_log_sink(sink);
    let app = api::app(&config, Arc::new(MemoryStore::new()))?;

    Server::bind(config.bind_addr).serve(app).await
}
