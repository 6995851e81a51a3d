use std::sync::Arc;

use tracing::info;

use lawline_common::generator::TextGenerator;

use crate::error::AppError;
use crate::model::{AnalysisResponse, CategoryRecord};

/// Placeholders the drafted letter must leave for the user to fill in.
pub const LETTER_PLACEHOLDERS: [&str; 2] = ["[Date]", "[My Name]"];

/// Drafts the letter and the simplified steps for a matched category.
pub struct Responder {
    generator: Arc<dyn TextGenerator>,
    parallel: bool,
}

impl Responder {
    pub fn new(generator: Arc<dyn TextGenerator>, parallel: bool) -> Self {
        Self {
            generator,
            parallel,
        }
    }

    /// Both generation calls must succeed; a failure in either fails the whole reply.
    pub async fn respond(
        &self,
        record: &CategoryRecord,
        text: &str,
        language: &str,
    ) -> Result<AnalysisResponse, AppError> {
        let letter_prompt = letter_prompt(record, text, language);
        let steps_prompt = steps_prompt(record, language);

        let (draft_letter, steps) = if self.parallel {
            futures::try_join!(
                self.generator.generate(&letter_prompt),
                self.generator.generate(&steps_prompt)
            )?
        } else {
            let letter = self.generator.generate(&letter_prompt).await?;
            let steps = self.generator.generate(&steps_prompt).await?;
            (letter, steps)
        };

        info!(
            category = %record.key,
            language,
            letter_chars = draft_letter.len(),
            steps_chars = steps.len(),
            "response drafted"
        );
        Ok(AnalysisResponse::success(record, steps, draft_letter))
    }
}

pub fn letter_prompt(record: &CategoryRecord, text: &str, language: &str) -> String {
    format!(
        "Act as a professional lawyer.\n\
User Situation: \"{text}\"\n\
Legal Ground: \"{act}\"\n\n\
Task: Write a formal \"Complaint Letter\" or \"Legal Notice\" that the user can send to the authority/offender.\n\
- Keep it strict and formal.\n\
- Use placeholders like {date}, {name} for details the user needs to fill.\n\
- Language: {language}",
        act = record.act,
        date = LETTER_PLACEHOLDERS[0],
        name = LETTER_PLACEHOLDERS[1],
    )
}

pub fn steps_prompt(record: &CategoryRecord, language: &str) -> String {
    format!(
        "Explain the following procedure in simple {language}. Keep it as a numbered list.\n\n\
Procedure: {}",
        record.procedure
    )
}
