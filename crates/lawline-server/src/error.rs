use lawline_common::error::CommonError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("config error: {0}")]
    Config(String),

    #[error("knowledge base error ({path}): {message}")]
    KnowledgeBase { path: String, message: String },
}
