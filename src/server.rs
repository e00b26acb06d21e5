//! Server wiring: stores, classifier, pipeline, router.

use crate::config::{ClassifierProvider, Settings, StorageBackend};
use anyhow::{Context, Result};
use hera_core::{
    seed_employees, EmployeeStore, IntentClassifier, KeywordClassifier, MemoryEmployeeStore,
    MemorySessionStore, OpenAiClassifier, Pipeline, SessionStore, SqliteEmployeeStore,
    SqliteSessionStore, TracingAuditSink,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Build the pipeline from settings and run the HTTP server.
pub async fn run(settings: Settings) -> Result<()> {
    let pipeline = build_pipeline(&settings).await?;
    let app = crate::api::router(Arc::new(pipeline));

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(addr = %addr, "Hera listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Seed the configured employee store with the sample roster.
pub async fn seed(settings: Settings) -> Result<()> {
    let employees = employee_store(&settings).await?;
    seed_employees(employees.as_ref()).await?;
    info!("seed complete");
    Ok(())
}

async fn build_pipeline(settings: &Settings) -> Result<Pipeline> {
    let employees = employee_store(settings).await?;
    // The sample roster is always present so a fresh install is usable
    seed_employees(employees.as_ref()).await?;

    let sessions: Arc<dyn SessionStore> = match settings.database.backend {
        StorageBackend::Memory => Arc::new(MemorySessionStore::new()),
        StorageBackend::Sqlite => {
            Arc::new(SqliteSessionStore::new(&settings.database.sessions_path).await?)
        }
    };

    let classifier: Arc<dyn IntentClassifier> = match settings.classifier.provider {
        ClassifierProvider::Keyword => Arc::new(KeywordClassifier::new()),
        ClassifierProvider::Openai => {
            let api_key = settings
                .classifier
                .api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
            match api_key {
                Some(key) => Arc::new(OpenAiClassifier::new(key, &settings.classifier.model)),
                None => {
                    warn!("openai classifier selected but no API key found, using keyword classifier");
                    Arc::new(KeywordClassifier::new())
                }
            }
        }
    };

    Ok(Pipeline::new(
        classifier,
        employees,
        sessions,
        Arc::new(TracingAuditSink::new()),
    ))
}

async fn employee_store(settings: &Settings) -> Result<Arc<dyn EmployeeStore>> {
    Ok(match settings.database.backend {
        StorageBackend::Memory => Arc::new(MemoryEmployeeStore::new()),
        StorageBackend::Sqlite => {
            Arc::new(SqliteEmployeeStore::new(&settings.database.employees_path).await?)
        }
    })
}
