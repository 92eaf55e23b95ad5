//! # Database Persistence Layer
//!
//! PostgreSQL persistence for issued certificates, templates, and course
//! references via SQLx.
//!
//! The database layer is optional. When `DATABASE_URL` is set the service
//! stores everything in PostgreSQL; when absent it runs on the in-memory
//! stores, which do not survive a restart.
//!
//! Uniqueness of credential IDs is enforced by the
//! `issued_certificates_credential_id_key` constraint, and revocation is a
//! single conditional `UPDATE`, so correctness does not depend on the
//! number of API replicas.

pub mod certificates;
pub mod references;

use sqlx::postgres::{PgPool, PgPoolOptions};

use certreg_registry::StoreError;

/// Name of the unique constraint on `issued_certificates.credential_id`.
pub const CREDENTIAL_UNIQUE_CONSTRAINT: &str = "issued_certificates_credential_id_key";

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if no database URL is configured (in-memory mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = database_url else {
        tracing::warn!(
            "DATABASE_URL not set, running in-memory only mode. \
             Issued certificates will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Map a SQLx error onto the store error taxonomy.
///
/// A unique violation on the credential ID constraint becomes
/// [`StoreError::DuplicateCredential`] so issuance can regenerate.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() && db.constraint() == Some(CREDENTIAL_UNIQUE_CONSTRAINT) {
            return StoreError::DuplicateCredential;
        }
    }
    StoreError::Backend(err.to_string())
}
