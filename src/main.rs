use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use story_gateway::config::{Args, StoreKind};
use story_gateway::discord::{DiscordClient, SignatureVerifier, story_command};
use story_gateway::dispatch::StoryDispatcher;
use story_gateway::generation::TextSynthClient;
use story_gateway::handlers;
use story_gateway::quota::QuotaTracker;
use story_gateway::state::AppState;
use story_gateway::store::{DocumentStore, FirestoreStore, MemoryStore, QuotaStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,story_gateway=debug")),
        )
        .init();

    // parse cli arguments
    let args = Args::parse();
    let verifier = SignatureVerifier::from_hex(&args.public_key).context("invalid --public-key")?;

    // one http client shared by every outbound caller
    let client = reqwest::Client::new();

    let backend: Arc<dyn DocumentStore> = match args.store {
        StoreKind::Memory => {
            warn!("using in-memory quota store, counters are per-instance and lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreKind::Firestore => Arc::new(FirestoreStore::new(
            client.clone(),
            &args.firestore_url,
            &args.firestore_project,
            &args.collection,
            args.firestore_token.clone(),
            args.store_timeout(),
        )),
    };
    let store = QuotaStore::new(backend, args.store_retries);
    let tracker = QuotaTracker::new(store, args.quota_policy());

    let generator = Arc::new(TextSynthClient::new(
        client.clone(),
        args.textsynth_url.clone(),
        args.bearer_token.clone(),
        args.generation_timeout(),
    ));

    let discord = Arc::new(DiscordClient::new(
        client.clone(),
        &args.discord_api,
        args.application_id.clone(),
        args.bot_token.clone(),
    ));

    if !args.skip_register {
        discord
            .register_commands(args.guild(), &[story_command()])
            .await
            .context("cannot register slash commands")?;
    }

    // creating shared state
    let state = Arc::new(AppState::new(
        StoryDispatcher::new(tracker, generator),
        discord,
        verifier,
    ));

    let app = handlers::router(state.clone());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;

    info!(port = args.port, "bot is up, interactions at /interactions");
    info!(store = ?args.store, "quota store");
    info!(
        limit = args.quota_limit,
        window_secs = args.quota_window,
        "quota policy"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // listener is closed, let admitted stories reach their users
    state.drain(args.shutdown_grace()).await;
    info!("gracefully shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
