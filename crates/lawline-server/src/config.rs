use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use lawline_common::openai::{OpenAiClientConfig, DEFAULT_BASE_URL};

use crate::error::AppError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Application configuration, built once at startup and passed to every component.
///
/// Nothing reads the environment after this is constructed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint, credential, timeout and retry settings for the generation client.
    pub openai: OpenAiClientConfig,
    /// Model ID sent with every completion request.
    pub model: String,
    /// Socket address the HTTP server binds to.
    pub listen_addr: String,
    /// JSON file holding the category records.
    pub data_path: PathBuf,
    /// Start with an empty knowledge base instead of exiting when the file is unusable.
    pub kb_optional: bool,
    /// Directory holding `login.html`, `app.html` and other static assets.
    pub static_dir: PathBuf,
    /// Ask the model for a schema-constrained category instead of free text.
    pub structured_output: bool,
    /// Issue the letter and step calls concurrently.
    pub parallel_responder: bool,
    /// Credentials accepted by the demo login. `None` refuses every login.
    pub demo_login: Option<DemoLogin>,
    /// Send one test prompt to the model before serving.
    pub self_test: bool,
}

#[derive(Debug, Clone)]
pub struct DemoLogin {
    pub username: String,
    pub password: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `GEMINI_API_KEY` (or `OPENAI_API_KEY`): credential for the generation endpoint
    ///
    /// Optional:
    /// - `LAWLINE_MODEL`, `LAWLINE_LISTEN_ADDR`, `LAWLINE_DATA_PATH`, `LAWLINE_KB_OPTIONAL`,
    ///   `LAWLINE_STATIC_DIR`, `LAWLINE_STRUCTURED_OUTPUT`, `LAWLINE_PARALLEL_RESPONDER`,
    ///   `LAWLINE_SELF_TEST`
    /// - `LAWLINE_DEMO_USERNAME` + `LAWLINE_DEMO_PASSWORD`: enable the demo login
    /// - `OPENAI_BASE_URL`, `OPENAI_TIMEOUT_SECS`, `OPENAI_MAX_RETRIES`,
    ///   `OPENAI_RETRY_INITIAL_MS`, `OPENAI_RETRY_MAX_MS`, `OPENAI_MAX_ERROR_BODY_BYTES`:
    ///   generation client tuning
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("GEMINI_API_KEY")
            .or_else(|| non_empty("OPENAI_API_KEY"))
            .ok_or_else(|| {
                AppError::Config(
                    "GEMINI_API_KEY environment variable is required (check your .env file)"
                        .to_string(),
                )
            })?;

        let flag = |name: &str, default: bool| -> Result<bool, AppError> {
            match non_empty(name) {
                None => Ok(default),
                Some(v) => parse_bool(&v).ok_or_else(|| {
                    AppError::Config(format!("{name} must be true or false, got {v:?}"))
                }),
            }
        };

        let number = |name: &str| -> Result<Option<u64>, AppError> {
            non_empty(name).map(|v| parse_number(name, &v)).transpose()
        };

        let mut openai = OpenAiClientConfig::new(
            &non_empty("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            Some(api_key),
        );
        if let Some(secs) = number("OPENAI_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(AppError::Config(
                    "OPENAI_TIMEOUT_SECS must be greater than zero".to_string(),
                ));
            }
            openai.default_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = non_empty("OPENAI_MAX_RETRIES") {
            openai.max_retries = parse_number("OPENAI_MAX_RETRIES", &retries)?;
        }
        if let Some(ms) = number("OPENAI_RETRY_INITIAL_MS")? {
            openai.initial_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = number("OPENAI_RETRY_MAX_MS")? {
            openai.max_backoff = Duration::from_millis(ms);
        }
        if openai.max_backoff < openai.initial_backoff {
            return Err(AppError::Config(
                "OPENAI_RETRY_MAX_MS must not be below OPENAI_RETRY_INITIAL_MS".to_string(),
            ));
        }
        if let Some(bytes) = non_empty("OPENAI_MAX_ERROR_BODY_BYTES") {
            openai.max_error_body_bytes = parse_number("OPENAI_MAX_ERROR_BODY_BYTES", &bytes)?;
        }

        let demo_login = match (
            non_empty("LAWLINE_DEMO_USERNAME"),
            non_empty("LAWLINE_DEMO_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(DemoLogin { username, password }),
            (None, None) => None,
            _ => {
                return Err(AppError::Config(
                    "LAWLINE_DEMO_USERNAME and LAWLINE_DEMO_PASSWORD must be set together"
                        .to_string(),
                ))
            }
        };

        Ok(Self {
            openai,
            model: non_empty("LAWLINE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            listen_addr: non_empty("LAWLINE_LISTEN_ADDR")
                .unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            data_path: non_empty("LAWLINE_DATA_PATH")
                .unwrap_or_else(|| "data/legal_data.json".to_string())
                .into(),
            kb_optional: flag("LAWLINE_KB_OPTIONAL", false)?,
            static_dir: non_empty("LAWLINE_STATIC_DIR")
                .unwrap_or_else(|| "static".to_string())
                .into(),
            structured_output: flag("LAWLINE_STRUCTURED_OUTPUT", true)?,
            parallel_responder: flag("LAWLINE_PARALLEL_RESPONDER", true)?,
            demo_login,
            self_test: flag("LAWLINE_SELF_TEST", false)?,
        })
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{name} must be a whole number, got {value:?}")))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
