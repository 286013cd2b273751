//! Process bootstrap shared by the flock service binaries.
//!
//! Every binary loads the layered configuration, installs the tracing
//! subscriber, connects to `PostgreSQL`, applies migrations and serves one
//! service router behind the common middleware stack.

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use flock_api::{
    AuthState, MessageState, NotificationState, RateLimiterState, TweetState, auth_router,
    banner, messages_router, not_found, notifications_router, tweets_router,
};
use flock_common::{
    Config,
    config::{LoggingConfig, ServerConfig, ServicesConfig},
};
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "flock=debug,tower_http=debug";

/// Request bodies above this size are rejected with 413.
const MAX_BODY_BYTES: usize = 1024 * 1024;

const RATE_LIMIT_SWEEP: Duration = Duration::from_secs(300);

/// The four deployable services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Auth,
    Tweets,
    Messages,
    Notifications,
}

impl Service {
    /// Human-readable name used in the `GET /` banner and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Auth => "Auth Service",
            Self::Tweets => "Tweet Service",
            Self::Messages => "Message Service",
            Self::Notifications => "Notification Service",
        }
    }

    #[must_use]
    pub const fn port(self, services: &ServicesConfig) -> u16 {
        match self {
            Self::Auth => services.auth_port,
            Self::Tweets => services.tweets_port,
            Self::Messages => services.messages_port,
            Self::Notifications => services.notifications_port,
        }
    }
}

/// Run a service until SIGINT or SIGTERM.
pub async fn run(service: Service) -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    info!(service = service.name(), "Starting flock service...");

    let db = flock_db::init(&config)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");

    flock_db::migrate(&db)
        .await
        .context("failed to run migrations")?;
    info!("Migrations completed");

    let db = Arc::new(db);
    let router = match service {
        Service::Auth => {
            let state = AuthState::new(db, &config);
            spawn_rate_limit_sweeper(state.rate_limiter.clone());
            auth_router(state)
        }
        Service::Tweets => tweets_router(TweetState::new(db)),
        Service::Messages => messages_router(MessageState::new(db, &config)),
        Service::Notifications => notifications_router(NotificationState::new(db, &config)),
    };
    let app = build_app(router, service, &config.server);

    let port = service.port(&config.services);
    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {}:{port}", config.server.host))?;
    info!(service = service.name(), "Listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!(service = service.name(), "Server shutdown complete");
    Ok(())
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wrap a service router with the shared routes and middleware stack.
///
/// With `server.static_dir` set, unknown paths serve files from that
/// directory and fall back to its `index.html`; otherwise `GET /` answers
/// with the service banner and unknown paths get a JSON 404.
pub fn build_app(router: Router, service: Service, server: &ServerConfig) -> Router {
    let router = match &server.static_dir {
        Some(dir) => {
            let dir = PathBuf::from(dir);
            let index = ServeFile::new(dir.join("index.html"));
            router.fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => router
            .merge(banner::<()>(service.name()))
            .fallback(not_found),
    };

    router
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&server.cors_origins))
}

/// CORS for the configured origins. Credentials are allowed so browsers
/// send the `jwt` cookie.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

fn spawn_rate_limit_sweeper(limiter: RateLimiterState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_SWEEP);
        loop {
            interval.tick().await;
            limiter.cleanup().await;
        }
    });
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    fn api_stub() -> Router {
        Router::new().route("/api/ping", get(|| async { "pong" }))
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_banner_without_static_dir() {
        let app = build_app(api_stub(), Service::Tweets, &ServerConfig::default());

        let response = app.oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Tweet Service API is running....");
    }

    #[tokio::test]
    async fn test_unknown_path_is_json_404() {
        let app = build_app(api_stub(), Service::Auth, &ServerConfig::default());

        let response = app.oneshot(get_request("/missing")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_static_dir_falls_back_to_index() {
        let dir = std::env::temp_dir().join(format!("flock-spa-{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<html>flock</html>").unwrap();

        let server = ServerConfig {
            static_dir: Some(dir.to_string_lossy().into_owned()),
            ..ServerConfig::default()
        };
        let app = build_app(api_stub(), Service::Auth, &server);

        let response = app
            .clone()
            .oneshot(get_request("/profile/alice"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "<html>flock</html>");

        let response = app.oneshot(get_request("/api/ping")).await.unwrap();
        assert_eq!(body_text(response).await, "pong");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin_with_credentials() {
        let app = build_app(api_stub(), Service::Auth, &ServerConfig::default());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/ping")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[test]
    fn test_ports_follow_config() {
        let services = ServicesConfig::default();
        assert_eq!(Service::Auth.port(&services), 5000);
        assert_eq!(Service::Tweets.port(&services), 5001);
        assert_eq!(Service::Messages.port(&services), 5002);
        assert_eq!(Service::Notifications.port(&services), 5003);
    }
}
