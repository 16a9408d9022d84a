use crate::error::LoadError;
use flate2::read::GzDecoder;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::io::Read;
use std::str::FromStr;

const EMBEDDED_RULES: &str = include_str!("../../data/rules.json");
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Linguistic nature of the error a rule corrects. Independent of category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Spacing,
    Terminology,
    Grammar,
    Punctuation,
    Foreign,
    Numbers,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Spacing => "spacing",
            RuleType::Terminology => "terminology",
            RuleType::Grammar => "grammar",
            RuleType::Punctuation => "punctuation",
            RuleType::Foreign => "foreign",
            RuleType::Numbers => "numbers",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spacing" => Ok(RuleType::Spacing),
            "terminology" => Ok(RuleType::Terminology),
            "grammar" => Ok(RuleType::Grammar),
            "punctuation" => Ok(RuleType::Punctuation),
            "foreign" => Ok(RuleType::Foreign),
            "numbers" => Ok(RuleType::Numbers),
            _ => Err(format!("Unknown rule type: {}", s)),
        }
    }
}

/// A single wrong → correct mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,

    /// Literal alternatives, all mapping to `correct`. Accepts a bare string in JSON.
    #[serde(deserialize_with = "one_or_many")]
    pub wrong: Vec<String>,

    pub correct: String,

    #[serde(rename = "type")]
    pub kind: RuleType,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub examples: Vec<String>,

    #[serde(default = "default_priority")]
    pub priority: u8,

    /// Reserved for context-sensitive validation. Carried through untouched; no-op today.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_rules: Option<serde_json::Value>,
}

fn default_priority() -> u8 {
    3
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(pattern) => vec![pattern],
        OneOrMany::Many(patterns) => patterns,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// Versioned rule collection. Treated as an immutable value once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDatabase {
    pub version: String,
    pub last_updated: String,

    /// Informational only; never checked against the actual rule count.
    #[serde(default)]
    pub total_rules: usize,

    /// Keyed by category key, in source order.
    pub categories: IndexMap<String, Category>,
}

impl RuleDatabase {
    /// Parse a database from JSON, transparently inflating gzip payloads.
    pub fn from_slice(bytes: &[u8], origin: &str) -> Result<Self, LoadError> {
        if bytes.starts_with(&GZIP_MAGIC) {
            let mut inflated = Vec::new();
            GzDecoder::new(bytes)
                .read_to_end(&mut inflated)
                .map_err(|source| LoadError::Decompress {
                    origin: origin.to_string(),
                    source,
                })?;
            return Self::parse_json(&inflated, origin);
        }

        Self::parse_json(bytes, origin)
    }

    fn parse_json(bytes: &[u8], origin: &str) -> Result<Self, LoadError> {
        serde_json::from_slice(bytes).map_err(|source| LoadError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    /// The rule set bundled with the binary.
    pub fn embedded() -> Result<Self, LoadError> {
        Self::from_slice(EMBEDDED_RULES.as_bytes(), "embedded rules")
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.get(key)
    }

    pub fn rule_count(&self) -> usize {
        self.categories.values().map(|c| c.rules.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "version": "1.2.0",
        "lastUpdated": "2024-03-01",
        "totalRules": 99,
        "categories": {
            "it_terms": {
                "name": "IT terminology",
                "description": "Loanword spelling for IT terms",
                "rules": [
                    {
                        "id": "it_001",
                        "wrong": ["데이타베이스", "데이타 베이스"],
                        "correct": "데이터베이스",
                        "type": "foreign",
                        "description": "database",
                        "examples": ["데이타베이스 → 데이터베이스"],
                        "priority": 5
                    }
                ]
            },
            "punctuation": {
                "name": "Punctuation",
                "rules": [
                    {
                        "id": "p_001",
                        "wrong": "...",
                        "correct": "…",
                        "type": "punctuation",
                        "contextRules": {"after": "word"}
                    }
                ]
            }
        }
    }"#;

    #[test]
    fn test_parse_database() {
        let db = RuleDatabase::from_slice(SAMPLE.as_bytes(), "sample").unwrap();
        assert_eq!(db.version, "1.2.0");
        assert_eq!(db.total_rules, 99);
        assert_eq!(db.rule_count(), 2);

        let keys: Vec<_> = db.categories.keys().cloned().collect();
        assert_eq!(keys, vec!["it_terms", "punctuation"]);

        let rule = &db.categories["it_terms"].rules[0];
        assert_eq!(rule.wrong.len(), 2);
        assert_eq!(rule.kind, RuleType::Foreign);
        assert_eq!(rule.priority, 5);
    }

    #[test]
    fn test_single_wrong_string_and_defaults() {
        let db = RuleDatabase::from_slice(SAMPLE.as_bytes(), "sample").unwrap();
        let rule = &db.categories["punctuation"].rules[0];
        assert_eq!(rule.wrong, vec!["...".to_string()]);
        assert_eq!(rule.priority, 3);
        assert!(rule.context_rules.is_some());
        assert!(db.categories["punctuation"].description.is_empty());
    }

    #[test]
    fn test_gzip_payload() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let db = RuleDatabase::from_slice(&compressed, "sample.json.gz").unwrap();
        assert_eq!(db.rule_count(), 2);
    }

    #[test]
    fn test_unknown_rule_type_rejected() {
        let bad = SAMPLE.replace("\"foreign\"", "\"slang\"");
        let err = RuleDatabase::from_slice(bad.as_bytes(), "bad").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_embedded_database_parses() {
        let db = RuleDatabase::embedded().unwrap();
        assert!(db.rule_count() > 0);
        assert!(db.category("it_terms").is_some());
    }

    #[test]
    fn test_rule_type_from_str() {
        assert_eq!("Spacing".parse::<RuleType>().unwrap(), RuleType::Spacing);
        assert!("other".parse::<RuleType>().is_err());
    }
}
