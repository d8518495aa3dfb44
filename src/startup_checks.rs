use crate::{Config, DEFAULT_SESSION_SECRET};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create database directory: {0}")]
    DatabaseDirectoryCreationFailed(#[from] std::io::Error),

    #[error("SESSION_SECRET is still the development default")]
    DefaultSessionSecret,

    #[error("SESSION_SECRET must be at least 32 characters in production")]
    WeakSessionSecret,
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let template_dir = &config.templates.directory;
    if !template_dir.exists() {
        warn!("Templates directory does not exist: {:?}", template_dir);
    } else {
        info!("Templates directory exists: {:?}", template_dir);
    }

    if let Some(db_dir) = sqlite_parent_dir(&config.database.url) {
        if !db_dir.exists() {
            info!("Database directory does not exist, creating: {:?}", db_dir);
            if let Err(e) = tokio::fs::create_dir_all(&db_dir).await {
                error!("Failed to create database directory: {}", e);
                errors.push(StartupCheckError::DatabaseDirectoryCreationFailed(e));
            }
        }
    }

    let secret = &config.app.session_secret;
    if config.app.production {
        if secret == DEFAULT_SESSION_SECRET {
            error!("Refusing to start in production with the default session secret");
            errors.push(StartupCheckError::DefaultSessionSecret);
        } else if secret.chars().count() < MIN_PRODUCTION_SECRET_LEN {
            error!("Session secret is too short for production");
            errors.push(StartupCheckError::WeakSessionSecret);
        }
    } else if secret == DEFAULT_SESSION_SECRET {
        warn!("Using the development session secret; set SESSION_SECRET before deploying");
    }

    match config.generation.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            info!("Metadata generation enabled with model {}", config.generation.model)
        }
        _ => warn!("No OPENAI_API_KEY configured; metadata generation is disabled"),
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}

/// Directory holding a file-backed SQLite database, if the URL names one.
fn sqlite_parent_dir(url: &str) -> Option<PathBuf> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.contains(":memory:") {
        return None;
    }

    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
