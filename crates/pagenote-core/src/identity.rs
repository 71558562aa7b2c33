//! The anonymous per-installation user id.

use std::{fmt, fs, path::Path};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{error::ErrorContext, PagenoteResult};

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnonymousId(String);

impl AnonymousId {
    /// A fresh `anon_` id with a random base-36 suffix.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        Self(format!("anon_{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads the id from the state file at `path`, creating and persisting a
    /// new one on first use.
    pub fn load_or_create(path: &Path) -> PagenoteResult<Self> {
        let mut state = State::load(path)?;

        if let Some(id) = &state.anonymous_user_id {
            debug!("Using anonymous id from {}", path.display());
            return Ok(id.clone());
        }

        let id = Self::generate();
        state.anonymous_user_id = Some(id.clone());
        state.save(path)?;
        info!("Generated anonymous id {}", id);
        Ok(id)
    }
}

impl fmt::Display for AnonymousId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnonymousId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct State {
    #[serde(rename = "anonymousUserId", default)]
    anonymous_user_id: Option<AnonymousId>,
}

impl State {
    fn load(path: &Path) -> PagenoteResult<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err::<Self, _>(err).with_context(|| format!("reading {}", path.display())),
        }
    }

    fn save(&self, path: &Path) -> PagenoteResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_generate_format() {
        let id = AnonymousId::generate();
        let suffix = id.as_str().strip_prefix("anon_").unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
    }

    #[test]
    fn test_generate_is_random() {
        assert_ne!(AnonymousId::generate(), AnonymousId::generate());
    }

    #[test]
    fn test_load_or_create_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let first = AnonymousId::load_or_create(&path).unwrap();
        let second = AnonymousId::load_or_create(&path).unwrap();
        assert_eq!(first, second);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("anonymousUserId"));
        assert!(raw.contains(first.as_str()));
    }

    #[test]
    fn test_load_existing_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"anonymousUserId":"anon_fixed"}"#).unwrap();

        let id = AnonymousId::load_or_create(&path).unwrap();
        assert_eq!(id.as_str(), "anon_fixed");
    }

    #[test]
    fn test_corrupt_state_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        assert!(AnonymousId::load_or_create(&path).is_err());
    }
}
