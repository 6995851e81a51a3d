/// Demo login. Checks one configured username/password pair and hands back an opaque
/// token. Nothing else in the server inspects that token; it gates no route.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use crate::config::DemoLogin;

static ISSUED: AtomicU64 = AtomicU64::new(0);

pub fn check_login(expected: Option<&DemoLogin>, username: &str, password: &str) -> Option<String> {
    let expected = expected?;
    let matches = expected.username == username && expected.password == password;
    matches.then(|| session_token(username))
}

/// 32 lowercase hex chars, unique per issue within this process.
fn session_token(username: &str) -> String {
    let issued_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let digest = Sha256::new()
        .chain_update(username.as_bytes())
        .chain_update(issued_at.to_le_bytes())
        .chain_update(ISSUED.fetch_add(1, Ordering::Relaxed).to_le_bytes())
        .finalize();
    digest.iter().take(16).map(|b| format!("{b:02x}")).collect()
}
