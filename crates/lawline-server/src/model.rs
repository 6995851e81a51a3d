use serde::{Deserialize, Serialize};

/// One class of legal issue from the knowledge base file.
///
/// Field names on disk follow the data file: `act` is the legal ground, `procedure` the
/// steps to follow, `source` the citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Category key, e.g. "tenant_deposit". Filled in from the map key on load.
    #[serde(skip)]
    pub key: String,
    /// Human readable title, e.g. "Security Deposit Not Returned"
    pub title: String,
    /// Statute or rule the complaint rests on
    pub act: String,
    /// How to pursue the issue, as free text
    pub procedure: String,
    /// Citation for the legal ground
    pub source: String,
}

fn default_language() -> String {
    "English".to_string()
}

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Deserialize)]
pub struct Query {
    pub text: String,
    #[serde(default = "default_language")]
    pub language: String,
}

/// What the classifier made of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Matched(String),
    Irrelevant,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Success,
    Error,
    Partial,
}

/// Reply of `POST /analyze`. On success the content fields are set and `message` is not;
/// every other status carries only `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub act: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simple_explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnalysisResponse {
    pub fn success(record: &CategoryRecord, simple_explanation: String, draft_letter: String) -> Self {
        Self {
            status: AnalysisStatus::Success,
            category: Some(record.title.clone()),
            act: Some(record.act.clone()),
            simple_explanation: Some(simple_explanation),
            draft_letter: Some(draft_letter),
            source: Some(record.source.clone()),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::message_only(AnalysisStatus::Error, message.into())
    }

    pub fn partial(message: impl Into<String>) -> Self {
        Self::message_only(AnalysisStatus::Partial, message.into())
    }

    fn message_only(status: AnalysisStatus, message: String) -> Self {
        Self {
            status,
            category: None,
            act: None,
            simple_explanation: None,
            draft_letter: None,
            source: None,
            message: Some(message),
        }
    }
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
