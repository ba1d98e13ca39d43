use blog_api::{
    build_router, AppState, Config, InMemoryPostRepository, InMemoryUserRepository,
    PostRepository, PostgresPostRepository, PostgresUserRepository, StorageBackend,
    TokenService, UserRepository,
};
use sqlx::postgres::PgPoolOptions;
use std::process::ExitCode;
use std::sync::Arc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Repositories = (
    Arc<dyn UserRepository + Send + Sync>,
    Arc<dyn PostRepository + Send + Sync>,
);

async fn connect_repositories(config: &Config) -> Result<Repositories, sqlx::Error> {
    match &config.storage {
        StorageBackend::InMemory => {
            warn!("Using in-memory storage; data will not survive a restart");
            let users: Arc<dyn UserRepository + Send + Sync> =
                Arc::new(InMemoryUserRepository::new());
            let posts: Arc<dyn PostRepository + Send + Sync> =
                Arc::new(InMemoryPostRepository::new());
            Ok((users, posts))
        }
        StorageBackend::Postgres(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .acquire_timeout(config.db_acquire_timeout)
                .connect(url)
                .await?;
            info!(
                max_connections = config.db_max_connections,
                "Connected to PostgreSQL"
            );
            let users: Arc<dyn UserRepository + Send + Sync> =
                Arc::new(PostgresUserRepository::new(pool.clone()));
            let posts: Arc<dyn PostRepository + Send + Sync> =
                Arc::new(PostgresPostRepository::new(pool));
            Ok((users, posts))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(?config, "Starting blog API server");

    let (user_repository, post_repository) = match connect_repositories(&config).await {
        Ok(repos) => repos,
        Err(e) => {
            error!(error = %e, "Failed to connect to database");
            return ExitCode::FAILURE;
        }
    };

    let token_service = TokenService::with_ttl(
        config.jwt_secret.clone(),
        chrono::Duration::hours(config.token_ttl_hours),
    );

    let app_state = AppState::builder()
        .bind_user_repository(user_repository)
        .and_then(|b| b.bind_post_repository(post_repository))
        .and_then(|b| b.bind_token_service(token_service))
        .and_then(|b| b.build());
    let app_state = match app_state {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to bind application state");
            return ExitCode::FAILURE;
        }
    };

    let app = build_router(app_state)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http());

    let address = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, %address, "Failed to bind listener");
            return ExitCode::FAILURE;
        }
    };
    info!("Server running on http://{}", address);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}
