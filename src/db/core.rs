use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use tokio::sync::OnceCell;
use tokio::time::Duration;
use tracing::{info, instrument};

use crate::environment::require_env;
use crate::TARGET_DB;

#[derive(Clone)]
pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    /// Get access to the database pool
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

impl Database {
    #[instrument(target = "db_query", level = "info", skip(database_url))]
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        info!(target: TARGET_DB, "Creating database pool");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;

        info!(target: TARGET_DB, "Database pool created");

        Ok(Database { pool })
    }

    pub async fn instance() -> &'static Database {
        static INSTANCE: OnceCell<Database> = OnceCell::const_new();

        INSTANCE
            .get_or_init(|| async {
                let database_url = require_env("DATABASE_URL").expect("DATABASE_URL must be set");
                Database::new(&database_url)
                    .await
                    .expect("Failed to initialize database")
            })
            .await
    }

    /// Collect row counts used in batch summaries
    pub async fn collect_stats(&self) -> Result<String, sqlx::Error> {
        let queries = vec![
            "SELECT COUNT(*) FROM videos_new WHERE \"isPublished\" = true;",
            "SELECT COUNT(*) FROM videos_new WHERE \"isPublished\" = false;",
            "SELECT COUNT(*) FROM videos_new WHERE thumbnail IS NULL OR thumbnail = '';",
        ];

        let mut results = vec![];
        for query in queries {
            let count: i64 = sqlx::query_scalar(query).fetch_one(&self.pool).await?;
            results.push(count);
        }

        Ok(results
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(":"))
    }
}
