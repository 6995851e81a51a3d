use std::path::PathBuf;

use lawline_common::generator::TextGenerator;
use tracing::{error, info, warn};

use crate::config::Config;

pub const SELF_TEST_PROMPT: &str = "Hello, are you working?";

#[derive(Debug, Clone)]
pub struct AssetCheck {
    pub name: &'static str,
    pub path: PathBuf,
    pub found: bool,
}

pub fn check_assets(config: &Config) -> Vec<AssetCheck> {
    [
        ("login page", config.static_dir.join("login.html")),
        ("main app page", config.static_dir.join("app.html")),
        ("legal data", config.data_path.clone()),
    ]
    .into_iter()
    .map(|(name, path)| AssetCheck {
        name,
        found: path.is_file(),
        path,
    })
    .collect()
}

/// Logs each check; returns `true` when everything was found.
pub fn report(checks: &[AssetCheck]) -> bool {
    let mut all_found = true;
    for check in checks {
        if check.found {
            info!(asset = check.name, path = %check.path.display(), "found");
        } else {
            warn!(asset = check.name, path = %check.path.display(), "missing");
            all_found = false;
        }
    }
    all_found
}

/// The `.env` error worth reporting. A missing file is not one; the variables may come
/// from the real environment.
pub fn dotenv_failure<T>(result: &dotenvy::Result<T>) -> Option<&dotenvy::Error> {
    result.as_ref().err().filter(|e| !e.not_found())
}

/// Sends one short prompt to the model. Returns `true` when it answered.
pub async fn check_model(generator: &dyn TextGenerator) -> bool {
    match generator.generate(SELF_TEST_PROMPT).await {
        Ok(reply) => {
            info!(reply = %reply, "model answered the self-test");
            true
        }
        Err(e) => {
            error!(error = %e, "model self-test failed, check the API key and model name");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::tests::FakeGenerator;

    #[test]
    fn test_reports_missing_assets() {
        let dir = tempfile::tempdir().unwrap();
        let static_dir = dir.path().join("static");
        std::fs::create_dir(&static_dir).unwrap();
        std::fs::write(static_dir.join("login.html"), "<html></html>").unwrap();

        let mut config = Config::from_lookup(|name: &str| {
            (name == "GEMINI_API_KEY").then(|| "k".to_string())
        })
        .unwrap();
        config.static_dir = static_dir;
        config.data_path = dir.path().join("data/legal_data.json");

        let checks = check_assets(&config);
        assert_eq!(checks.len(), 3);
        assert!(checks[0].found);
        assert!(!checks[1].found);
        assert!(!checks[2].found);
        assert!(!report(&checks));

        std::fs::write(config.static_dir.join("app.html"), "<html></html>").unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        std::fs::write(&config.data_path, "{}").unwrap();
        assert!(report(&check_assets(&config)));
    }

    #[tokio::test]
    async fn test_check_model() {
        let ok = FakeGenerator::new(vec![Ok("Yes, I am working.")]);
        assert!(check_model(&ok).await);
        assert_eq!(ok.calls(), 1);
        assert_eq!(ok.prompts.lock().unwrap()[0], SELF_TEST_PROMPT);

        let failing = FakeGenerator::new(vec![Err("quota exhausted")]);
        assert!(!check_model(&failing).await);
        assert_eq!(failing.calls(), 1);
    }

    #[test]
    fn test_dotenv_failure_ignores_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(dotenv_failure(&dotenvy::from_path(dir.path().join(".env"))).is_none());

        let broken = dir.path().join("broken.env");
        std::fs::write(&broken, "not a valid line\n").unwrap();
        let result = dotenvy::from_path(&broken);
        assert!(result.is_err());
        assert!(dotenv_failure(&result).is_some());

        assert!(dotenv_failure(&Ok::<(), dotenvy::Error>(())).is_none());
    }
}
