use std::sync::Arc;

use anyhow::Context;
use auth::Authenticator;
use auth::Clock;
use auth::SystemClock;
use clap::Parser;
use identity_service::account::models::CreateAccountCommand;
use identity_service::account::models::EmailAddress;
use identity_service::account::models::Password;
use identity_service::account::models::PersonName;
use identity_service::account::models::Role;
use identity_service::account::models::Username;
use identity_service::account::ports::AccountServicePort;
use identity_service::account::service::AccountService;
use identity_service::config::Config;
use identity_service::outbound::events::KafkaEventProducer;
use identity_service::registration_code::service::RegistrationCodeService;
use identity_service::repositories::PostgresAccountRepository;
use identity_service::repositories::PostgresRegistrationCodeRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Self-registration always yields the `user` role, so the first
/// administrator is created out of band with this tool.
#[derive(Parser, Debug)]
#[command(name = "seed-admin", about = "Create an administrator account")]
struct Args {
    #[arg(long)]
    username: String,

    #[arg(long)]
    email: String,

    /// Plaintext password; must satisfy the regular password policy.
    #[arg(long)]
    password: String,

    #[arg(long)]
    first_name: Option<String>,

    #[arg(long)]
    last_name: Option<String>,
}

impl Args {
    fn try_into_command(self) -> Result<CreateAccountCommand, anyhow::Error> {
        Ok(CreateAccountCommand {
            username: Username::new(self.username).context("invalid username")?,
            email: EmailAddress::new(self.email).context("invalid email")?,
            password: Password::new(self.password).context("invalid password")?,
            first_name: self
                .first_name
                .map(PersonName::new)
                .transpose()
                .context("invalid first name")?,
            last_name: self
                .last_name
                .map(PersonName::new)
                .transpose()
                .context("invalid last name")?,
            role: Role::Admin,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = Args::parse().try_into_command()?;

    let config = Config::load()?;
    let auth_settings = config.auth_settings()?;

    let pg_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pg_pool).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let authenticator = Arc::new(Authenticator::new(&auth_settings, Arc::clone(&clock))?);

    let registration_codes = Arc::new(RegistrationCodeService::new(
        Arc::new(PostgresRegistrationCodeRepository::new(pg_pool.clone())),
        Arc::clone(&clock),
    ));
    let account_service = AccountService::new(
        Arc::new(PostgresAccountRepository::new(pg_pool)),
        registration_codes,
        Arc::new(KafkaEventProducer::new(&config.kafka)?),
        authenticator,
        clock,
    );

    let account = account_service.create_account(command).await?;

    println!(
        "Created {} account '{}' with id {}",
        account.role, account.username, account.id
    );
    Ok(())
}
