// src/main.rs

use std::time::Duration;

use dotenvy::dotenv;
use pinquiz::config::Config;
use pinquiz::routes;
use pinquiz::state::AppState;
use pinquiz::store;
use pinquiz::utils::{hash::hash_password, jwt::ADMIN_ROLE};
use sqlx::SqlitePool;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired sessions and unread reviews are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "pinquiz.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    for warning in &config.env_warnings {
        tracing::warn!("{}", warning);
    }

    let pool = store::connect(&config.database_url)
        .await
        .expect("Failed to open the database");
    tracing::info!("Database opened at {}", config.database_url);

    tracing::info!("Running migrations...");
    store::migrate(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    if let Err(e) = seed_admin_user(&pool, &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let state = AppState::new(pool, config.clone());

    let engine = state.engine.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let (sessions, reviews) = engine.sweep();
            if sessions + reviews > 0 {
                tracing::debug!(
                    "Swept {} expired sessions and {} unread reviews",
                    sessions,
                    reviews
                );
            }
        }
    });

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str())
        .await
        .expect("Failed to bind listening address");
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}

async fn seed_admin_user(
    pool: &SqlitePool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password)
    else {
        return Ok(());
    };

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    if existing.is_none() {
        tracing::info!("Seeding admin user: {}", username);
        let hashed_password = hash_password(password)?;

        sqlx::query("INSERT INTO users (username, password, role) VALUES (?, ?, ?)")
            .bind(username)
            .bind(hashed_password)
            .bind(ADMIN_ROLE)
            .execute(pool)
            .await?;
        tracing::info!("Admin user created successfully.");
    }

    Ok(())
}
