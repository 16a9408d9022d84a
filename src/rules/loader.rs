use crate::config::Config;
use crate::error::LoadError;
use crate::rules::RuleDatabase;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches the rule database once per process and hands out shared copies.
///
/// Sources are tried in order: remote URL, then local file. With neither
/// configured the embedded rule set is used. The cache lock is held for the
/// whole load, so concurrent callers wait on the in-flight load instead of
/// starting their own.
pub struct RuleLoader {
    remote_url: Option<String>,
    local_path: Option<PathBuf>,
    timeout: Duration,
    cached: Mutex<Option<Arc<RuleDatabase>>>,
}

impl Default for RuleLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleLoader {
    pub fn new() -> Self {
        Self {
            remote_url: None,
            local_path: None,
            timeout: DEFAULT_TIMEOUT,
            cached: Mutex::new(None),
        }
    }

    /// Build a loader from configuration. Falls back to a previously
    /// downloaded database in the data directory when no path is set.
    pub fn from_config(config: &Config) -> Self {
        let local_path = config
            .rules_path
            .clone()
            .or_else(|| Config::downloaded_rules_path().filter(|p| p.exists()));

        Self {
            remote_url: config.rules_url.clone(),
            local_path,
            timeout: Duration::from_secs(config.fetch_timeout_secs),
            cached: Mutex::new(None),
        }
    }

    pub fn with_remote(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    pub fn with_local(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Return the cached database, loading it on first use.
    pub async fn load(&self) -> Result<Arc<RuleDatabase>, LoadError> {
        let mut cached = self.cached.lock().await;
        if let Some(db) = cached.as_ref() {
            return Ok(Arc::clone(db));
        }

        let db = Arc::new(self.load_uncached().await?);
        info!(
            version = %db.version,
            rules = db.rule_count(),
            categories = db.categories.len(),
            "rule database loaded"
        );
        *cached = Some(Arc::clone(&db));
        Ok(db)
    }

    pub async fn clear_cache(&self) {
        *self.cached.lock().await = None;
    }

    async fn load_uncached(&self) -> Result<RuleDatabase, LoadError> {
        if self.remote_url.is_none() && self.local_path.is_none() {
            debug!("no rule source configured, using embedded rules");
            return RuleDatabase::embedded();
        }

        let mut attempts = Vec::new();

        if let Some(url) = &self.remote_url {
            match fetch_remote(url, self.timeout).await {
                Ok(db) => return Ok(db),
                Err(e) => {
                    warn!(url = %url, error = %error_chain(&e), "remote rule source failed");
                    attempts.push(error_chain(&e));
                }
            }
        }

        if let Some(path) = &self.local_path {
            match read_local(path).await {
                Ok(db) => return Ok(db),
                Err(e) => {
                    warn!(path = %path.display(), error = %error_chain(&e), "local rule source failed");
                    attempts.push(error_chain(&e));
                }
            }
        }

        Err(LoadError::Exhausted { attempts })
    }
}

/// Download raw database bytes without parsing.
pub async fn fetch_bytes(url: &str, timeout: Duration) -> Result<Vec<u8>, LoadError> {
    let fetch_err = |source| LoadError::Fetch {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(fetch_err)?;

    debug!(url, "fetching rule database");
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(fetch_err)?;

    let bytes = response.bytes().await.map_err(fetch_err)?;
    Ok(bytes.to_vec())
}

async fn fetch_remote(url: &str, timeout: Duration) -> Result<RuleDatabase, LoadError> {
    let bytes = fetch_bytes(url, timeout).await?;
    RuleDatabase::from_slice(&bytes, url)
}

async fn read_local(path: &Path) -> Result<RuleDatabase, LoadError> {
    debug!(path = %path.display(), "reading rule database");
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    RuleDatabase::from_slice(&bytes, &path.display().to_string())
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
