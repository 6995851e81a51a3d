/// The analysis pipeline: classify the query, then draft a reply for a matched category.
///
/// Every path ends in a structured [`AnalysisResponse`]. Upstream failures are logged in
/// full here and replaced by a generic message before they reach the caller.
use std::sync::Arc;

use tracing::{error, info};

use lawline_common::generator::TextGenerator;

use crate::classifier::Classifier;
use crate::knowledge::KnowledgeBase;
use crate::model::{AnalysisResponse, Classification, Query};
use crate::responder::Responder;

pub const OUT_OF_DOMAIN_MESSAGE: &str = "Please describe a legal problem.";
pub const NOT_COVERED_MESSAGE: &str =
    "This is a valid legal issue, but our database is still growing. Please consult a lawyer.";
pub const SERVER_ERROR_MESSAGE: &str =
    "Server Error: unable to analyze your request right now. Please try again later.";

/// Terminal state of one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(AnalysisResponse),
    OutOfDomain,
    NotCovered,
    Failed,
}

impl Outcome {
    pub fn into_response(self) -> AnalysisResponse {
        match self {
            Outcome::Success(resp) => resp,
            Outcome::OutOfDomain => AnalysisResponse::error(OUT_OF_DOMAIN_MESSAGE),
            Outcome::NotCovered => AnalysisResponse::partial(NOT_COVERED_MESSAGE),
            Outcome::Failed => AnalysisResponse::error(SERVER_ERROR_MESSAGE),
        }
    }
}

pub struct Analyzer {
    knowledge: Arc<KnowledgeBase>,
    classifier: Classifier,
    responder: Responder,
}

impl Analyzer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        knowledge: Arc<KnowledgeBase>,
        parallel_responder: bool,
    ) -> Self {
        Self {
            classifier: Classifier::new(Arc::clone(&generator), Arc::clone(&knowledge)),
            responder: Responder::new(generator, parallel_responder),
            knowledge,
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub async fn analyze(&self, query: &Query) -> Outcome {
        info!(query = %query.text, language = %query.language, "received query");

        let classification = match self.classifier.classify(&query.text).await {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, stage = "classify", "analysis failed");
                return Outcome::Failed;
            }
        };

        let key = match classification {
            Classification::Matched(key) => key,
            Classification::Irrelevant => return Outcome::OutOfDomain,
            Classification::Unknown => return Outcome::NotCovered,
        };

        // parse_classification only yields keys present in the table
        let Some(record) = self.knowledge.get(&key) else {
            return Outcome::NotCovered;
        };

        match self
            .responder
            .respond(record, &query.text, &query.language)
            .await
        {
            Ok(resp) => Outcome::Success(resp),
            Err(e) => {
                error!(error = %e, stage = "respond", category = %key, "analysis failed");
                Outcome::Failed
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use lawline_common::error::CommonError;

    use super::*;
    use crate::model::AnalysisStatus;

    pub(crate) const SAMPLE_KB: &str = r#"{
        "tenant_deposit": {
            "title": "Security Deposit Not Returned",
            "act": "Residential Tenancies Act",
            "procedure": "Send a written demand, then apply to the tenancy tribunal.",
            "source": "RTA s.12"
        },
        "wage_theft": {
            "title": "Unpaid Wages",
            "act": "Payment of Wages Act",
            "procedure": "Raise a claim with the labour inspector.",
            "source": "PWA s.15"
        }
    }"#;

    /// Replays scripted replies in call order and records every prompt.
    pub(crate) struct FakeGenerator {
        replies: Mutex<VecDeque<Result<String, String>>>,
        pub(crate) prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        pub(crate) fn new(replies: Vec<Result<&str, &str>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, CommonError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("no scripted reply".to_string()))
                .map_err(CommonError::Generation)
        }
    }

    pub(crate) fn sample_kb() -> Arc<KnowledgeBase> {
        Arc::new(KnowledgeBase::from_json("inline", SAMPLE_KB).unwrap())
    }

    fn query(text: &str, language: &str) -> Query {
        Query {
            text: text.to_string(),
            language: language.to_string(),
        }
    }

    fn analyzer(generator: Arc<FakeGenerator>, kb: Arc<KnowledgeBase>) -> Analyzer {
        // sequential so scripted replies line up with prompts
        Analyzer::new(generator, kb, false)
    }

    #[tokio::test]
    async fn test_matched_key_returns_success_with_letter() {
        let generator = Arc::new(FakeGenerator::new(vec![
            Ok("tenant_deposit"),
            Ok("Estimado arrendador, [Date] ... [My Name]"),
            Ok("1. Enviar una carta.\n2. Presentar una solicitud."),
        ]));
        let analyzer = analyzer(generator.clone(), sample_kb());

        let outcome = analyzer
            .analyze(&query("My landlord won't return my deposit", "Spanish"))
            .await;
        let resp = outcome.into_response();

        assert_eq!(resp.status, AnalysisStatus::Success);
        assert_eq!(resp.category.as_deref(), Some("Security Deposit Not Returned"));
        let letter = resp.draft_letter.unwrap();
        assert!(!letter.trim().is_empty());
        assert!(letter.contains("[Date]"));
        assert!(!resp.simple_explanation.unwrap().is_empty());
        assert!(resp.message.is_none());
        assert_eq!(generator.calls(), 3);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[1].contains("Language: Spanish"));
        assert!(prompts[2].contains("simple Spanish"));
    }

    #[tokio::test]
    async fn test_pass_through_for_every_key() {
        let kb = sample_kb();
        for record in kb.records() {
            let generator = Arc::new(FakeGenerator::new(vec![
                Ok(record.key.as_str()),
                Ok("letter [Date]"),
                Ok("1. step"),
            ]));
            let analyzer = analyzer(generator, Arc::clone(&kb));
            let resp = analyzer
                .analyze(&query("some problem", "English"))
                .await
                .into_response();
            assert_eq!(resp.category.as_deref(), Some(record.title.as_str()));
            assert_eq!(resp.act.as_deref(), Some(record.act.as_str()));
            assert_eq!(resp.source.as_deref(), Some(record.source.as_str()));
        }
    }

    #[tokio::test]
    async fn test_irrelevant_never_reaches_responder() {
        let generator = Arc::new(FakeGenerator::new(vec![Ok("irrelevant")]));
        let analyzer = analyzer(generator.clone(), sample_kb());

        let outcome = analyzer
            .analyze(&query("What's the weather today?", "English"))
            .await;
        assert_eq!(outcome, Outcome::OutOfDomain);

        let resp = outcome.into_response();
        assert_eq!(resp.status, AnalysisStatus::Error);
        assert_eq!(resp.message.as_deref(), Some(OUT_OF_DOMAIN_MESSAGE));
        assert!(resp.draft_letter.is_none());
        assert!(resp.simple_explanation.is_none());
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_unmatched_output_is_partial() {
        for reply in ["unknown", "immigration_visa", "I think this is about a lease."] {
            let generator = Arc::new(FakeGenerator::new(vec![Ok(reply)]));
            let analyzer = analyzer(generator.clone(), sample_kb());

            let resp = analyzer
                .analyze(&query("My visa was refused", "English"))
                .await
                .into_response();
            assert_eq!(resp.status, AnalysisStatus::Partial, "{reply:?}");
            assert_eq!(resp.message.as_deref(), Some(NOT_COVERED_MESSAGE));
            assert_eq!(generator.calls(), 1);
        }
    }

    #[tokio::test]
    async fn test_failures_are_generic_errors() {
        let scripts: Vec<Vec<Result<&str, &str>>> = vec![
            vec![Err("401 API key not valid")],
            vec![Ok("wage_theft"), Err("503 overloaded")],
            vec![Ok("wage_theft"), Ok("letter [Date]"), Err("timeout")],
        ];
        for script in scripts {
            let generator = Arc::new(FakeGenerator::new(script));
            let analyzer = analyzer(generator, sample_kb());

            let outcome = analyzer.analyze(&query("unpaid salary", "English")).await;
            assert_eq!(outcome, Outcome::Failed);
            let resp = outcome.into_response();
            assert_eq!(resp.status, AnalysisStatus::Error);
            let message = resp.message.unwrap();
            assert_eq!(message, SERVER_ERROR_MESSAGE);
            assert!(!message.contains("API key"));
            assert!(resp.draft_letter.is_none());
        }
    }

    #[tokio::test]
    async fn test_keeps_serving_after_a_failure() {
        let generator = Arc::new(FakeGenerator::new(vec![
            Err("connection reset"),
            Ok("irrelevant"),
        ]));
        let analyzer = analyzer(generator, sample_kb());

        assert_eq!(analyzer.analyze(&query("a", "English")).await, Outcome::Failed);
        assert_eq!(
            analyzer.analyze(&query("b", "English")).await,
            Outcome::OutOfDomain
        );
    }

    #[tokio::test]
    async fn test_empty_knowledge_base_is_partial() {
        let generator = Arc::new(FakeGenerator::new(vec![]));
        let analyzer = analyzer(generator.clone(), Arc::new(KnowledgeBase::empty()));

        let outcome = analyzer.analyze(&query("deposit", "English")).await;
        assert_eq!(outcome, Outcome::NotCovered);
        assert_eq!(generator.calls(), 0);
    }
}
