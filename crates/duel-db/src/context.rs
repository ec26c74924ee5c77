use duel_core::config::DatabaseConfig;
use duel_core::error::DuelResult;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// The persistence service's application context: a bounded connection pool
/// constructed once at startup and cloned (cheap — `sqlx::Pool` is an `Arc`
/// internally) into every handler. Replaces the source's module-level
/// global connection with an explicit, passed-in object.
#[derive(Clone)]
pub struct PersistenceContext {
    pool: PgPool,
}

impl PersistenceContext {
    pub async fn connect(config: &DatabaseConfig) -> DuelResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(crate::db_err)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> DuelResult<()> {
        crate::MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| duel_core::error::DuelError::internal(format!("migration failed: {e}")))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
