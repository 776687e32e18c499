use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ujamaa_common::Config;
use ujamaa_events::{AiMetricStore, EventLog, ReviewStore};
use ujamaa_ledger::{LedgerStore, MemberStore, VoteStore};
use ujamaa_notify::{AdminWebhook, InboxStore, NotifyRouter, NotifySink, SessionRegistry};
use ujamaa_rewards::{RewardEngine, RewardRuleStore};

mod auth;
mod google;
mod jwt;
mod rest;
mod ws;

use google::GoogleVerifier;
use jwt::JwtService;

pub struct AppState {
    pub jwt: JwtService,
    pub google: Option<GoogleVerifier>,
    pub members: MemberStore,
    pub ledger: LedgerStore,
    pub events: EventLog,
    pub reviews: ReviewStore,
    pub metrics: AiMetricStore,
    pub votes: VoteStore,
    pub inbox: InboxStore,
    pub registry: SessionRegistry,
    pub notifier: Arc<dyn NotifySink>,
    pub engine: RewardEngine,
    pub rules: RewardRuleStore,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ujamaa=info".parse()?))
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    let ledger = LedgerStore::new(pool.clone());
    ledger.migrate().await?;

    let registry = SessionRegistry::new();
    let inbox = InboxStore::new(pool.clone());

    let mut sinks: Vec<Box<dyn NotifySink>> =
        vec![Box::new(registry.clone()), Box::new(inbox.clone())];
    match &config.admin_webhook_url {
        Some(url) => {
            info!("Admin webhook notifications enabled");
            sinks.push(Box::new(AdminWebhook::new(url.clone())));
        }
        None => info!("No ADMIN_WEBHOOK_URL set, admin webhook disabled"),
    }
    let notifier: Arc<dyn NotifySink> = Arc::new(NotifyRouter::new(sinks));

    // Background reconcile/rank/free-vote loop shares this process.
    ujamaa_jobs::start_scheduler(pool.clone(), notifier.clone(), &config);

    let google = match &config.google_client_id {
        Some(client_id) => Some(GoogleVerifier::new(client_id.clone())),
        None => {
            info!("No GOOGLE_CLIENT_ID set, Google login disabled");
            None
        }
    };

    let state = Arc::new(AppState {
        jwt: JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()),
        google,
        members: MemberStore::new(pool.clone()),
        ledger,
        events: EventLog::new(pool.clone()),
        reviews: ReviewStore::new(pool.clone()),
        metrics: AiMetricStore::new(pool.clone()),
        votes: VoteStore::new(pool.clone()),
        inbox,
        registry,
        notifier: notifier.clone(),
        rules: RewardRuleStore::new(pool.clone()),
        engine: RewardEngine::new(pool, notifier),
    });

    let app = Router::new()
        // Health check
        .route("/health", get(|| async { "ok" }))
        // Identity
        .route("/auth/google", post(rest::auth::google_login))
        .route("/auth/me", get(rest::auth::me))
        // Member ledger
        .route("/ledger/share", post(rest::ledger::submit_share))
        .route("/ledger/review-video", post(rest::ledger::submit_review))
        .route("/ledger/balance", get(rest::ledger::balance))
        .route("/ledger/rank", get(rest::ledger::rank))
        // Activity intake
        .route("/fitness/log", post(rest::activity::fitness_log))
        .route("/study/journal", post(rest::activity::study_journal))
        .route("/study/share", post(rest::activity::study_share))
        .route("/language/practice", post(rest::activity::language_practice))
        .route("/ai/metric", post(rest::activity::ai_metric))
        .route("/ai/history", get(rest::activity::ai_history))
        // Contest voting
        .route("/pagt/vote", post(rest::vote::cast_vote))
        // Notifications
        .route("/notifications", get(rest::notifications::list))
        .route("/notifications/read/{id}", post(rest::notifications::mark_read))
        // Admin
        .route("/admin/overview", get(rest::admin::overview))
        .route("/admin/members", get(rest::admin::members))
        .route("/admin/members/{id}", get(rest::admin::member_detail))
        .route("/admin/shares", get(rest::admin::shares))
        .route("/admin/reviews", get(rest::admin::reviews))
        .route("/admin/activity-stream", get(rest::admin::activity_stream))
        .route("/admin/rules", get(rest::admin::rules))
        .route("/admin/reviews/{id}/approve", post(rest::admin::approve_review))
        .route("/admin/reviews/{id}/reject", post(rest::admin::reject_review))
        .route("/admin/issue-bd", post(rest::admin::issue_bd))
        .route("/admin/members/{id}/role", post(rest::admin::set_role))
        // Live notification stream
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Privacy headers: no caching, no tracking
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        // Logging layer: method + path + status + latency only (no query params, no IP)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                }),
        );

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("Ujamaa rewards API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
