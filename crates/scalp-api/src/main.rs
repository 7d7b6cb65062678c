//! scalpaiboard API 서버 진입점.
//!
//! 시작 순서:
//! 1. `.env`와 설정 파일 로드, 로깅 초기화
//! 2. PostgreSQL(선택, 마이그레이션 포함), Redis(선택) 연결
//! 3. 거래소 라우터, 구독 허브, 시세 스트리머, 알림 평가기 시작
//! 4. REST + `/ws` 라우터로 서버 실행, 종료 시그널에 맞춰 정리

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, Extension, Router};
use scalp_core::{init_logging, AppConfig, LogConfig};
use scalp_exchange::{MarketDataSource, MarketRouter};
use scalp_notification::NotificationManager;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use scalp_api::ai::AiClient;
use scalp_api::auth::JwtConfig;
use scalp_api::cache::RedisCache;
use scalp_api::routes::create_api_router;
use scalp_api::services::AlertEvaluator;
use scalp_api::state::AppState;
use scalp_api::websocket::{
    create_hub, websocket_router, MarketDataStreamer, StreamerConfig, WsState,
};

/// 데이터베이스 연결과 마이그레이션. 실패하면 DB 기능 없이 실행합니다.
async fn connect_database(config: &AppConfig) -> Option<PgPool> {
    let Some(url) = config.database.url.as_deref() else {
        warn!("DATABASE_URL not set, database features will be disabled");
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .connect(url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return None;
        }
    };

    if let Err(e) = sqlx::migrate!("../../migrations").run(&pool).await {
        error!("Failed to run migrations: {}", e);
        return None;
    }

    info!("Connected to PostgreSQL");
    Some(pool)
}

/// Redis 캐시 연결. 실패하면 거래소를 직접 조회합니다.
async fn connect_cache(config: &AppConfig) -> Option<RedisCache> {
    let url = config.redis.url.as_deref()?;
    match RedisCache::connect(url, config.redis.market_ttl_secs).await {
        Ok(cache) => {
            info!("Connected to Redis");
            Some(cache)
        }
        Err(e) => {
            warn!("Failed to connect to Redis, caching disabled: {}", e);
            None
        }
    }
}

/// CORS 설정.
///
/// origin 목록이 비어 있으면 모두 허용합니다.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .server
        .cors_origins()
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        warn!("No valid CORS origins configured, allowing any origin");
        AllowOrigin::any()
    } else {
        info!("CORS configured with {} allowed origins", origins.len());
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600))
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, ws_state: WsState, config: &AppConfig) -> Router {
    let jwt = JwtConfig {
        secret: config.auth.jwt_secret.clone(),
    };

    Router::new()
        .merge(create_api_router().with_state(state))
        .nest("/ws", websocket_router(ws_state))
        .layer(Extension(jwt))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(cors_layer(config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("failed to load configuration")?;

    init_logging(LogConfig::from_section(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    info!("Starting Scalpaiboard API server...");

    if config.auth.uses_default_secret() {
        warn!("JWT_SECRET not set, using default (INSECURE for development only)");
    }

    let market: Arc<dyn MarketDataSource> = Arc::new(
        MarketRouter::from_config(&config.exchange).context("failed to build exchange clients")?,
    );

    let hub = create_hub(config.streaming.outbound_queue_capacity);
    let ai = AiClient::new().context("failed to build AI client")?;

    let db_pool = connect_database(&config).await;
    let cache = connect_cache(&config).await;

    let mut state = AppState::new(config.clone(), market.clone(), hub.clone(), ai);
    if let Some(pool) = db_pool.clone() {
        state = state.with_db_pool(pool);
    }
    if let Some(cache) = cache {
        state = state.with_cache(cache);
    }
    let state = Arc::new(state);

    info!(
        version = %state.version,
        has_db = state.db_pool.is_some(),
        has_cache = state.cache.is_some(),
        "Application state initialized"
    );

    let shutdown_token = CancellationToken::new();

    let streamer = MarketDataStreamer::new(
        hub.clone(),
        market.clone(),
        StreamerConfig::from(&config.streaming),
    );
    let streamer_handle = streamer.spawn(shutdown_token.clone());

    let evaluator_handle = match (&db_pool, config.alerts.enabled) {
        (Some(pool), true) => {
            let notifier = NotificationManager::from_config(&config.notifications.telegram)
                .context("failed to build notification manager")?;
            let evaluator = AlertEvaluator::new(
                pool.clone(),
                market.clone(),
                Arc::new(notifier),
                config.alerts.clone(),
            );
            Some(evaluator.spawn(shutdown_token.clone()))
        }
        (None, true) => {
            warn!("Alert evaluator disabled: database not available");
            None
        }
        (_, false) => {
            info!("Alert evaluator disabled by configuration");
            None
        }
    };

    let ws_state = WsState::new(hub, config.streaming.keepalive());
    let app = create_router(state, ws_state, &config);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(%addr, "API server listening");
    info!("WebSocket available at ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("Server shutdown initiated, cleaning up...");
    shutdown_token.cancel();

    let cleanup = tokio::time::timeout(Duration::from_secs(10), async {
        let _ = streamer_handle.await;
        if let Some(handle) = evaluator_handle {
            let _ = handle.await;
        }
    })
    .await;

    if cleanup.is_err() {
        warn!("Cleanup timeout, forcing shutdown");
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM을 기다린 뒤 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}
