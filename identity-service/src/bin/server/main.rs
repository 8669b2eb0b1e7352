use std::sync::Arc;

use auth::Authenticator;
use auth::Clock;
use auth::SystemClock;
use identity_service::account::service::AccountService;
use identity_service::config::Config;
use identity_service::inbound::grpc::IdentityGrpcService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::events::KafkaEventProducer;
use identity_service::proto::identity_service_server::IdentityServiceServer;
use identity_service::registration_code::service::RegistrationCodeService;
use identity_service::repositories::PostgresAccountRepository;
use identity_service::repositories::PostgresRegistrationCodeRepository;
use sqlx::postgres::PgPoolOptions;
use tonic::transport::Server;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        grpc_port = config.server.grpc_port,
        kafka_brokers = %config.kafka.brokers,
        kafka_topic = %config.kafka.topic,
        access_token_ttl_minutes = config.jwt.access_token_ttl_minutes,
        refresh_token_ttl_days = config.jwt.refresh_token_ttl_days,
        "Configuration loaded"
    );

    // Rejects short secrets and inconsistent TTLs before anything is served
    let auth_settings = config.auth_settings()?;

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let authenticator = Arc::new(Authenticator::new(&auth_settings, Arc::clone(&clock))?);

    let account_repository = Arc::new(PostgresAccountRepository::new(pg_pool.clone()));
    let code_repository = Arc::new(PostgresRegistrationCodeRepository::new(pg_pool));
    let event_producer = Arc::new(KafkaEventProducer::new(&config.kafka)?);

    let registration_codes = Arc::new(RegistrationCodeService::new(
        code_repository,
        Arc::clone(&clock),
    ));
    let account_service = Arc::new(AccountService::new(
        account_repository,
        Arc::clone(&registration_codes),
        event_producer,
        authenticator,
        clock,
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(Arc::clone(&account_service), registration_codes);
    let http_server =
        tokio::spawn(async move { axum::serve(http_listener, http_application).await });

    let grpc_address = format!("0.0.0.0:{}", config.server.grpc_port).parse()?;
    let grpc_service = IdentityGrpcService::new(account_service);
    tracing::info!(
        address = %grpc_address,
        port = config.server.grpc_port,
        protocol = "grpc",
        "gRpc server listening"
    );

    let grpc_server = tokio::spawn(async move {
        Server::builder()
            .add_service(IdentityServiceServer::new(grpc_service))
            .serve(grpc_address)
            .await
    });

    match tokio::try_join!(http_server, grpc_server) {
        Ok((_, _)) => tracing::info!("Servers exited successfully"),
        Err(e) => tracing::error!(error = %e, "Server error"),
    };

    Ok(())
}
