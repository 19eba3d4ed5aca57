//! Shared application state for the web server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bobcats_careers::CareerCatalog;
use bobcats_clubs::{
    ClubRequestService, ClubService, EdgeFunctionTrigger, EmailTrigger, MajorService,
    MembershipService, MemoryStorage, NoopTrigger, ObjectStorage, ReviewService, SupabaseStorage,
};
use bobcats_config::Config;
use bobcats_db::{ClubStore, MemoryClubStore, PgClubStore};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

/// Majors seeded into the in-memory store.
const DEV_MAJORS: &[&str] = &[
    "Cognitive Science",
    "Computer Science and Engineering",
    "Data Science and Analytics",
    "Electrical Engineering",
    "Mechanical Engineering",
    "Political Science",
];

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub requests: ClubRequestService,
    pub clubs: ClubService,
    pub majors: MajorService,
    pub membership: MembershipService,
    pub review: ReviewService,
    pub catalog: CareerCatalog,
    pub admin_token: Option<SecretString>,
    pub cors_origins: Vec<String>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        store: Arc<dyn ClubStore>,
        storage: Arc<dyn ObjectStorage>,
        trigger: Arc<dyn EmailTrigger>,
        catalog: CareerCatalog,
        admin_token: Option<SecretString>,
    ) -> Self {
        Self {
            requests: ClubRequestService::new(store.clone(), storage.clone()),
            clubs: ClubService::new(store.clone(), storage),
            majors: MajorService::new(store.clone()),
            membership: MembershipService::new(store.clone(), trigger.clone()),
            review: ReviewService::new(store, trigger),
            catalog,
            admin_token,
            cors_origins: Vec::new(),
        }
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Wire up real backends where configured, in-memory ones elsewhere.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn ClubStore> = match &config.database.url {
            Some(url) if config.has_database() => {
                let store = PgClubStore::connect(
                    url.expose_secret(),
                    config.database.max_connections,
                    config.database.min_connections,
                )
                .await
                .context("connecting to Postgres")?;
                if config.database.create_schema {
                    store.initialize().await.context("creating database schema")?;
                }
                info!("Using Postgres club store");
                Arc::new(store)
            }
            _ => {
                warn!("DATABASE_URL not set; using in-memory club store (data is lost on restart)");
                Arc::new(MemoryClubStore::with_majors(DEV_MAJORS.iter().copied()))
            }
        };

        let storage: Arc<dyn ObjectStorage> =
            match (config.storage_ready(), &config.supabase.url, &config.supabase.service_role_key) {
                (true, Some(url), Some(key)) => {
                    info!(bucket = %config.supabase.storage_bucket, "Using Supabase storage");
                    Arc::new(SupabaseStorage::new(url.clone(), key.clone(), config.supabase.storage_bucket.clone()))
                }
                _ => {
                    warn!("Supabase storage not configured; uploads are kept in memory");
                    Arc::new(MemoryStorage::new(
                        config.supabase.url.clone().unwrap_or_else(|| "http://localhost:54321".to_string()),
                    ))
                }
            };

        let trigger: Arc<dyn EmailTrigger> = match (
            config.email_trigger_ready(),
            &config.supabase.url,
            &config.supabase.anon_key,
            &config.email.worker_secret,
        ) {
            (true, Some(url), Some(anon), Some(secret)) => Arc::new(EdgeFunctionTrigger::new(
                url,
                anon.clone(),
                secret.clone(),
                Duration::from_secs(config.email.trigger_timeout_secs),
            )?),
            _ => {
                warn!("Email worker trigger not configured; scheduled sends only");
                Arc::new(NoopTrigger)
            }
        };

        let mut catalog = CareerCatalog::builtin()?;
        if let Some(dir) = &config.careers.data_dir {
            catalog.load_dir(dir)?;
        }

        if config.admin.session_token.is_none() {
            warn!("BOBCATS_ADMIN_TOKEN not set; admin endpoints are disabled");
        }

        Ok(Self::new(store, storage, trigger, catalog, config.admin.session_token.clone())
            .with_cors_origins(config.server.cors_origins.clone()))
    }

    /// Fully in-memory state, for local runs and tests.
    pub fn in_memory(store: Arc<MemoryClubStore>, admin_token: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self::new(
            store,
            Arc::new(MemoryStorage::default()),
            Arc::new(NoopTrigger),
            CareerCatalog::builtin()?,
            admin_token.map(SecretString::from),
        ))
    }
}
