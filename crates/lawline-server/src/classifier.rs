use std::sync::Arc;

use tracing::{debug, info};

use lawline_common::generator::TextGenerator;

use crate::error::AppError;
use crate::knowledge::KnowledgeBase;
use crate::model::Classification;

/// Model answer for a query that is not a legal problem.
pub const IRRELEVANT: &str = "irrelevant";
/// Model answer for a legal problem with no matching category.
pub const UNKNOWN: &str = "unknown";

/// Maps free text to a knowledge base category with one generation call.
pub struct Classifier {
    generator: Arc<dyn TextGenerator>,
    knowledge: Arc<KnowledgeBase>,
}

impl Classifier {
    pub fn new(generator: Arc<dyn TextGenerator>, knowledge: Arc<KnowledgeBase>) -> Self {
        Self {
            generator,
            knowledge,
        }
    }

    pub async fn classify(&self, text: &str) -> Result<Classification, AppError> {
        let keys = self.knowledge.keys();
        if keys.is_empty() {
            info!(query = %text, "no categories loaded, skipping classification");
            return Ok(Classification::Unknown);
        }

        let prompt = classification_prompt(text, &keys);
        let mut choices = keys;
        choices.push(IRRELEVANT.to_string());
        choices.push(UNKNOWN.to_string());

        let raw = self.generator.choose(&prompt, &choices).await?;
        debug!(raw = %raw, "classifier raw reply");

        let classification = parse_classification(&raw, &self.knowledge);
        info!(query = %text, category = ?classification, "query classified");
        Ok(classification)
    }
}

pub fn classification_prompt(text: &str, keys: &[String]) -> String {
    let key_list = keys
        .iter()
        .map(|k| format!("'{k}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You are a legal dispatcher. Query: \"{text}\"\n\
Map to exactly one key from: [{key_list}].\n\
If unrelated to law, return '{IRRELEVANT}'. If related but not in the list, return '{UNKNOWN}'.\n\
Output ONLY the key string."
    )
}

/// Interpret a model reply. Anything that is neither a known key nor a sentinel counts
/// as unknown.
pub fn parse_classification(raw: &str, knowledge: &KnowledgeBase) -> Classification {
    let cleaned = raw
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c.is_whitespace());

    if knowledge.get(cleaned).is_some() {
        return Classification::Matched(cleaned.to_string());
    }
    if cleaned.eq_ignore_ascii_case(IRRELEVANT) {
        return Classification::Irrelevant;
    }
    Classification::Unknown
}
