mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::extractor::ClientIpPolicy;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::posts::{routes as posts_routes, PostService};
use crate::features::threads::{routes as threads_routes, ThreadService};
use crate::modules::rate_limit::RateLimiter;
use crate::modules::storage::{MinioStorage, ObjectStorage};
use crate::modules::tripcode::TripcodeGenerator;
use crate::modules::upload::{OrphanReconciler, UploadPipeline};
use axum::{middleware::from_fn, Extension, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Log system info
    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!("Configuration loaded successfully");

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    // Run migrations automatically
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Initialize object storage for originals and thumbnails
    let storage: Arc<dyn ObjectStorage> = Arc::new(
        MinioStorage::new(config.storage.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize storage client: {}", e))?,
    );
    tracing::info!("Storage client initialized");

    // Initialize board primitives
    let tripcodes = Arc::new(TripcodeGenerator::new(&config.board.tripcode_salt));
    let rate_limiter = Arc::new(RateLimiter::new(pool.clone(), config.rate_limit.clone()));
    let pipeline = Arc::new(UploadPipeline::new(Arc::clone(&storage)));
    tracing::info!("Upload pipeline initialized");

    // Initialize Thread Service
    let thread_service = Arc::new(ThreadService::new(
        pool.clone(),
        Arc::clone(&pipeline),
        Arc::clone(&tripcodes),
        Arc::clone(&rate_limiter),
        config.upload.clone(),
        config.board.clone(),
    ));
    tracing::info!("Thread service initialized");

    // Initialize Post Service
    let post_service = Arc::new(PostService::new(
        pool.clone(),
        Arc::clone(&pipeline),
        Arc::clone(&tripcodes),
        Arc::clone(&rate_limiter),
        config.upload.clone(),
        config.board.clone(),
    ));
    tracing::info!("Post service initialized");

    // Spawn orphan reconciler worker
    if config.reconciler.enabled {
        let reconciler = OrphanReconciler::new(
            pool.clone(),
            Arc::clone(&storage),
            config.reconciler.interval_secs,
        );
        tokio::spawn(async move {
            reconciler.run().await;
        });
        tracing::info!(
            "Orphan reconciler worker spawned (interval: {}s)",
            config.reconciler.interval_secs
        );
    } else {
        tracing::info!("Orphan reconciler disabled");
    }

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Simple health check endpoint
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let board_routes = Router::new()
        .merge(threads_routes::routes(
            thread_service,
            config.upload.max_file_size,
        ))
        .merge(posts_routes::routes(
            post_service,
            config.upload.max_file_size,
        ));

    let app = Router::new()
        .merge(swagger)
        .merge(board_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Whether ClientIp may believe X-Forwarded-For
        .layer(Extension(ClientIpPolicy {
            trust_forwarded_header: config.app.trust_proxy_header,
        }))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    // ConnectInfo is needed so handlers can fall back to the peer address
    // when no X-Forwarded-For header is present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
