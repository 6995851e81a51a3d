mod analyze;
mod auth;
mod classifier;
mod config;
mod diagnostics;
mod error;
mod knowledge;
mod model;
mod responder;
mod server;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use lawline_common::generator::{ChatGenerator, TextGenerator};
use lawline_common::openai::OpenAiClient;

use analyze::Analyzer;
use config::Config;
use knowledge::KnowledgeBase;
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting lawline server");
    if let Ok(path) = &dotenv {
        info!(path = %path.display(), "loaded .env");
    } else if let Some(e) = diagnostics::dotenv_failure(&dotenv) {
        warn!(error = %e, "failed to read .env, continuing without it");
    }

    // 1. Configuration
    let config = Config::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "configuration invalid");
    })?;
    info!(
        model = %config.model,
        listen_addr = %config.listen_addr,
        data_path = %config.data_path.display(),
        static_dir = %config.static_dir.display(),
        structured_output = config.structured_output,
        parallel_responder = config.parallel_responder,
        demo_login = config.demo_login.is_some(),
        self_test = config.self_test,
        "configuration loaded"
    );

    // 2. Asset report
    if !diagnostics::report(&diagnostics::check_assets(&config)) {
        warn!("some expected files are missing, see above");
    }

    // 3. Knowledge base
    let knowledge = Arc::new(
        KnowledgeBase::load_or_empty(&config.data_path, config.kb_optional).inspect_err(|e| {
            tracing::error!(error = %e, "knowledge base failed to load");
        })?,
    );
    if knowledge.is_empty() {
        warn!("knowledge base is empty, every query will be reported as not covered");
    }
    for record in knowledge.records() {
        debug!(key = %record.key, title = %record.title, "category available");
    }

    // 4. Generation client
    info!(
        base_url = %config.openai.base_url,
        timeout_ms = config.openai.default_timeout.as_millis(),
        max_retries = config.openai.max_retries,
        "generation client configured"
    );
    let client = OpenAiClient::new(config.openai.clone())?;
    let generator: Arc<dyn TextGenerator> = Arc::new(
        ChatGenerator::new(client, config.model.clone())
            .with_structured_output(config.structured_output),
    );

    // 5. Model self-test (opt-in; a failure is logged, not fatal)
    if config.self_test {
        diagnostics::check_model(generator.as_ref()).await;
    }

    // 6. HTTP server
    let analyzer = Analyzer::new(generator, knowledge, config.parallel_responder);
    let state = AppState::new(analyzer, config.demo_login.clone());
    let app = server::router(state, &config.static_dir);

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!(listen_addr = %config.listen_addr, "lawline server ready");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("lawline server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
