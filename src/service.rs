use crate::checker::RuleEngine;
use crate::error::Result;
use crate::rules::RuleLoader;
use crate::{CheckOptions, CheckResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Lazily builds one engine from its loader and reuses it for every call.
///
/// A failed load leaves the service empty; the next call retries.
pub struct SpellService {
    loader: RuleLoader,
    engine: Mutex<Option<Arc<RuleEngine>>>,
}

impl SpellService {
    pub fn new(loader: RuleLoader) -> Self {
        Self {
            loader,
            engine: Mutex::new(None),
        }
    }

    pub async fn engine(&self) -> Result<Arc<RuleEngine>> {
        let mut engine = self.engine.lock().await;
        if let Some(existing) = engine.as_ref() {
            return Ok(Arc::clone(existing));
        }

        let database = self.loader.load().await?;
        debug!(version = %database.version, "building rule engine");
        let built = Arc::new(RuleEngine::new(database));
        *engine = Some(Arc::clone(&built));
        Ok(built)
    }

    pub async fn check_spelling(&self, text: &str, options: &CheckOptions) -> Result<CheckResult> {
        let engine = self.engine().await?;
        Ok(engine.check_text(text, options))
    }

    /// Check `text` and return it with every resolved match corrected.
    pub async fn apply_spell_corrections(&self, text: &str, options: &CheckOptions) -> Result<String> {
        let engine = self.engine().await?;
        let result = engine.check_text(text, options);
        Ok(engine.apply_corrections(text, &result.matches))
    }

    /// Drop the cached engine and database so the next call reloads.
    pub async fn clear_cache(&self) {
        *self.engine.lock().await = None;
        self.loader.clear_cache().await;
    }
}

impl Default for SpellService {
    fn default() -> Self {
        Self::new(RuleLoader::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::tempdir;

    const RULES: &str = r#"{
        "version": "1.0.0",
        "lastUpdated": "2024-02-02",
        "categories": {
            "it_terms": {
                "name": "IT",
                "rules": [
                    {"id": "db", "wrong": "데이타베이스", "correct": "데이터베이스", "type": "foreign", "priority": 5}
                ]
            }
        }
    }"#;

    #[tokio::test]
    async fn test_check_and_correct() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, RULES).unwrap();

        let service = SpellService::new(RuleLoader::new().with_local(&path));
        let options = CheckOptions::default();

        let result = service.check_spelling("데이타베이스를 사용한다", &options).await.unwrap();
        assert_eq!(result.total_errors, 1);

        let corrected = service
            .apply_spell_corrections("데이타베이스를 사용한다", &options)
            .await
            .unwrap();
        assert_eq!(corrected, "데이터베이스를 사용한다");
    }

    #[tokio::test]
    async fn test_engine_is_reused_until_cleared() {
        let service = SpellService::default();
        let first = service.engine().await.unwrap();
        let second = service.engine().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        service.clear_cache().await;
        let third = service.engine().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[tokio::test]
    async fn test_load_failure_surfaces() {
        let dir = tempdir().unwrap();
        let service = SpellService::new(RuleLoader::new().with_local(dir.path().join("missing.json")));

        let err = service
            .check_spelling("텍스트", &CheckOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Load(_)));
        assert_eq!(err.to_string(), "spelling rules could not be loaded");
    }
}
