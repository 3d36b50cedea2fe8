use sqlx::{postgres::PgPoolOptions, PgPool};

mod recommendations;
mod tracks;
mod users;

pub use recommendations::PgRecommendationStore;
pub use tracks::PgTrackCatalog;
pub use users::PgUserStore;

/// Creates a PostgreSQL connection pool and applies pending migrations
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
