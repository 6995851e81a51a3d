/// Error types shared by the Law Line crates.
///
/// These represent failures talking to the text-generation collaborator. Server-specific
/// errors are defined in the server crate and wrap `CommonError` via `#[from]`.
use crate::openai::OpenAiClientError;

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("openai client error: {0}")]
    OpenAi(#[from] OpenAiClientError),

    #[error("model returned an empty completion")]
    EmptyCompletion,

    #[error("generation failed: {0}")]
    Generation(String),
}
