/// Read-only category table loaded once at startup.
///
/// The file is a flat JSON object, key -> `{title, act, procedure, source}`. Keys are kept
/// sorted so the list offered to the model is stable between runs.
use std::collections::BTreeMap;
use std::path::Path;

use tracing::{error, info};

use crate::classifier::{IRRELEVANT, UNKNOWN};
use crate::error::AppError;
use crate::model::CategoryRecord;

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    records: BTreeMap<String, CategoryRecord>,
}

impl KnowledgeBase {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the file contents. `origin` only labels errors.
    pub fn from_json(origin: &str, content: &str) -> Result<Self, AppError> {
        let kb_error = |message: String| AppError::KnowledgeBase {
            path: origin.to_string(),
            message,
        };

        let raw: BTreeMap<String, CategoryRecord> =
            serde_json::from_str(content).map_err(|e| kb_error(format!("malformed JSON: {e}")))?;

        let mut records = BTreeMap::new();
        for (key, mut record) in raw {
            let trimmed = key.trim();
            if trimmed.is_empty() {
                return Err(kb_error("empty category key".to_string()));
            }
            if trimmed.eq_ignore_ascii_case(IRRELEVANT) || trimmed.eq_ignore_ascii_case(UNKNOWN) {
                return Err(kb_error(format!("category key {trimmed:?} is reserved")));
            }
            if trimmed != key {
                return Err(kb_error(format!(
                    "category key {key:?} has surrounding whitespace"
                )));
            }
            record.key = key.clone();
            records.insert(key, record);
        }
        Ok(Self { records })
    }

    /// Load from disk. A missing or malformed file is a configuration error.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| AppError::KnowledgeBase {
            path: origin.clone(),
            message: format!("cannot read file: {e}"),
        })?;
        let kb = Self::from_json(&origin, &content)?;
        info!(path = %origin, categories = kb.len(), "knowledge base loaded");
        Ok(kb)
    }

    /// Like [`KnowledgeBase::load`], but when `optional` is set a failure is logged and an
    /// empty table is returned. Every query then classifies as unknown.
    pub fn load_or_empty(path: &Path, optional: bool) -> Result<Self, AppError> {
        match Self::load(path) {
            Ok(kb) => Ok(kb),
            Err(e) if optional => {
                error!(
                    error = %e,
                    "knowledge base unavailable, continuing with no categories"
                );
                Ok(Self::empty())
            }
            Err(e) => Err(e),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CategoryRecord> {
        self.records.get(key)
    }

    /// Category keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &CategoryRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
