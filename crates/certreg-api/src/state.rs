//! # Application State
//!
//! Shared state for the Axum application: the certificate registry, the
//! storage backend it runs on, and runtime configuration.

use std::sync::Arc;

use sqlx::PgPool;

use certreg_registry::{CertificateRegistry, CredentialIdGenerator};

use crate::backend::Backend;

/// The registry as wired by the API: one backend serving as both the
/// certificate store and the reference resolver.
pub type Registry = CertificateRegistry<Backend, Backend>;

/// Default verification requests per minute per client.
pub const DEFAULT_VERIFY_RATE_LIMIT: u64 = 120;

/// Runtime configuration.
///
/// Custom `Debug` redacts the auth token and database URL.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token secret. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// PostgreSQL connection URL. If `None`, the in-memory stores are used.
    pub database_url: Option<String>,
    /// Public verification requests allowed per client per minute.
    pub verify_rate_limit: u64,
    /// Key the verification rate limit on `X-Forwarded-For` instead of the
    /// peer address. Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl AppConfig {
    /// Build configuration from `PORT`, `AUTH_TOKEN`, `DATABASE_URL`,
    /// `VERIFY_RATE_LIMIT`, and `TRUST_FORWARDED_FOR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid PORT, using default");
                defaults.port
            }),
            None => defaults.port,
        };
        let verify_rate_limit = match non_empty("VERIFY_RATE_LIMIT") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    tracing::warn!(value = %raw, "invalid VERIFY_RATE_LIMIT, using default");
                    defaults.verify_rate_limit
                }
            },
            None => defaults.verify_rate_limit,
        };
        let trust_forwarded_for = match non_empty("TRUST_FORWARDED_FOR") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    tracing::warn!(value = %raw, "invalid TRUST_FORWARDED_FOR, using default");
                    defaults.trust_forwarded_for
                }
            },
            None => defaults.trust_forwarded_for,
        };

        Self {
            port,
            auth_token: non_empty("AUTH_TOKEN"),
            database_url: non_empty("DATABASE_URL"),
            verify_rate_limit,
            trust_forwarded_for,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("verify_rate_limit", &self.verify_rate_limit)
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            database_url: None,
            verify_rate_limit: DEFAULT_VERIFY_RATE_LIMIT,
            trust_forwarded_for: false,
        }
    }
}

/// Shared application state, cheap to clone into every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The certificate registry.
    pub registry: Arc<Registry>,
    /// Storage backend, for template and course management and health checks.
    pub backend: Backend,
    /// Runtime configuration.
    pub config: AppConfig,
}

impl AppState {
    /// In-memory state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// State for the given configuration, on PostgreSQL when a pool is
    /// supplied and in memory otherwise.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        let backend = match db_pool {
            Some(pool) => Backend::Postgres(pool),
            None => Backend::memory(),
        };
        let registry = CertificateRegistry::new(backend.clone(), backend.clone());
        Self::assemble(config, backend, registry)
    }

    /// State with an explicit backend and credential ID generator.
    pub fn with_generator(
        config: AppConfig,
        backend: Backend,
        ids: impl CredentialIdGenerator + 'static,
    ) -> Self {
        let registry = CertificateRegistry::with_generator(backend.clone(), backend.clone(), ids);
        Self::assemble(config, backend, registry)
    }

    fn assemble(config: AppConfig, backend: Backend, registry: Registry) -> Self {
        tracing::debug!(backend = backend.kind(), "application state assembled");
        Self {
            registry: Arc::new(registry),
            backend,
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
