//! Support Desk server binary.

use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use support_desk::adapters::ai::{GeminiTextGenerator, MockTextGenerator};
use support_desk::adapters::auth::{JwtConfig, JwtSessionValidator};
use support_desk::adapters::http::{build_router, ChatHandlers, HttpSettings, TicketHandlers};
use support_desk::adapters::notification::LoggingTicketNotifier;
use support_desk::adapters::postgres::{PostgresConversationStore, PostgresTicketRepository};
use support_desk::adapters::redis::RedisConversationCache;
use support_desk::application::{
    ConversationCoordinator, EscalationWatcher, FaqSuggestionCache, TicketLifecycle,
};
use support_desk::config::{AppConfig, GenerationProvider};
use support_desk::domain::conversation::DomainCatalog;
use support_desk::ports::{ConversationStore, SessionValidator, TextGenerator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config);
    config.validate().context("invalid configuration")?;

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await
        .context("failed to connect to PostgreSQL")?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run migrations")?;
    }

    let redis = redis::Client::open(config.redis.url.as_str()).context("invalid Redis URL")?;
    let redis_conn = redis
        .get_multiplexed_tokio_connection()
        .await
        .context("failed to connect to Redis")?;

    let catalog = Arc::new(match &config.conversation.domain_catalog_path {
        Some(path) => DomainCatalog::from_yaml_file(path)
            .with_context(|| format!("failed to load domain catalog {}", path.display()))?,
        None => DomainCatalog::builtin(),
    });

    let generator: Arc<dyn TextGenerator> = match config.generation.provider {
        GenerationProvider::Gemini => {
            let gemini = config
                .generation
                .gemini()
                .context("gemini provider requires an API key")?;
            Arc::new(GeminiTextGenerator::new(gemini).context("failed to build Gemini client")?)
        }
        GenerationProvider::Mock => {
            tracing::warn!("using mock text generator");
            Arc::new(MockTextGenerator::new())
        }
    };

    let mut jwt = JwtConfig::new(config.auth.jwt_secret.expose_secret().clone())
        .with_agent_role(config.auth.agent_role.clone());
    if let Some(issuer) = &config.auth.issuer {
        jwt = jwt.with_issuer(issuer.clone());
    }
    let validator: Arc<dyn SessionValidator> = Arc::new(JwtSessionValidator::new(jwt));

    let store: Arc<dyn ConversationStore> = Arc::new(PostgresConversationStore::new(pool.clone()));
    let cache = Arc::new(
        RedisConversationCache::new(redis_conn, config.redis.timeout())
            .with_key_prefix(config.redis.key_prefix.clone()),
    );
    let tickets = Arc::new(PostgresTicketRepository::new(pool));

    let coordinator = Arc::new(ConversationCoordinator::new(
        store.clone(),
        cache,
        generator,
        catalog.clone(),
        config.conversation.coordinator(config.generation.timeout()),
    ));
    let faqs = Arc::new(FaqSuggestionCache::new(store, config.faq.cache()));
    let lifecycle = Arc::new(TicketLifecycle::new(
        tickets,
        Arc::new(LoggingTicketNotifier::new()),
        catalog,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let watcher = if config.escalation.enabled {
        let watcher = EscalationWatcher::new(lifecycle.clone(), config.escalation.watcher());
        Some(tokio::spawn(async move { watcher.run(shutdown_rx).await }))
    } else {
        tracing::info!("escalation sweep disabled");
        None
    };

    let settings = HttpSettings {
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.cors_origins_list(),
    };
    let app = build_router(
        ChatHandlers::new(coordinator, faqs),
        TicketHandlers::new(lifecycle),
        validator,
        &settings,
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    tracing::info!(%addr, environment = ?config.server.environment, "support desk listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failure")?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = watcher {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "escalation watcher task failed");
        }
    }
    tracing::info!("shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));
    let registry = tracing_subscriber::registry().with(filter);

    // try_init fails only when a subscriber is already installed
    let _ = if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).try_init()
    };
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
