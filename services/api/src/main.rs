use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::database::{DatabaseConfig, health_check, init_pool};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::info;

use recipe_api::{
    config::Settings,
    db::run_migrations,
    error::ApiError,
    jwt::JwtService,
    models::{AttributeKind, NewUser},
    rate_limiter::RateLimiter,
    repositories::{PgAttributeRepository, PgRecipeRepository, PgUserRepository, UserRepository},
    routes,
    state::AppState,
    storage::MediaStorage,
    validation::{validate_email, validate_password},
};

#[derive(Parser, Debug)]
#[command(name = "recipe-api", about = "Recipe management REST API", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply migrations and run the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Create a staff superuser account
    CreateSuperuser {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        #[arg(long, value_name = "PASSWORD")]
        password: String,
        #[arg(long, value_name = "NAME", default_value = "")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    common::telemetry::init_tracing("info");

    let cli = Cli::parse();

    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(pool).await,
        Command::Migrate => {
            run_migrations(&pool).await?;
            Ok(())
        }
        Command::CreateSuperuser {
            email,
            password,
            name,
        } => create_superuser(pool, &email, &password, &name).await,
    }
}

async fn serve(pool: PgPool) -> Result<()> {
    info!("Starting recipe API service");

    let settings = Settings::from_env()?;
    run_migrations(&pool).await?;

    let media_storage = MediaStorage::new(&settings.media_root, &settings.media_url);
    tokio::fs::create_dir_all(media_storage.root())
        .await
        .with_context(|| format!("Failed to create media root {}", settings.media_root.display()))?;

    let app_state = AppState {
        user_repository: Arc::new(PgUserRepository::new(pool.clone())),
        tag_repository: Arc::new(PgAttributeRepository::new(pool.clone(), AttributeKind::Tag)),
        ingredient_repository: Arc::new(PgAttributeRepository::new(
            pool.clone(),
            AttributeKind::Ingredient,
        )),
        recipe_repository: Arc::new(PgRecipeRepository::new(pool)),
        jwt_service: JwtService::new(settings.jwt_config())?,
        rate_limiter: RateLimiter::new(settings.rate_limiter_config()),
        media_storage,
    };

    let app = routes::create_router(app_state);

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Recipe API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn create_superuser(pool: PgPool, email: &str, password: &str, name: &str) -> Result<()> {
    validate_email(&email.trim().to_lowercase()).map_err(anyhow::Error::msg)?;
    validate_password(password).map_err(anyhow::Error::msg)?;

    let repository = PgUserRepository::new(pool);
    let new_user = NewUser::create_superuser(email, password, name).map_err(describe)?;
    let user = repository.create(&new_user).await.map_err(describe)?;

    info!("Created superuser {} ({})", user.email, user.id);
    Ok(())
}

/// Keep field messages when an API error ends up on the command line
fn describe(error: ApiError) -> anyhow::Error {
    match error {
        ApiError::Validation(fields) => anyhow::anyhow!(
            "{}",
            serde_json::to_string(&fields).unwrap_or_else(|_| "Validation failed".to_string())
        ),
        other => other.into(),
    }
}
