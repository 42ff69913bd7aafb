use crate::corpus::MissingDocumentPolicy;
use crate::weighting::Weighting;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_TOP_K: usize = 5;

/// Engine settings. Every field has a default, so `{}` is a valid config file.
///
/// ```json
/// { "weighting": { "tf": "log_one_plus", "idf": "smoothed" },
///   "missing_documents": "abort",
///   "top_k": 10 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weighting: Weighting,
    pub missing_documents: MissingDocumentPolicy,
    pub top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weighting: Weighting::default(),
            missing_documents: MissingDocumentPolicy::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if given, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_json_file(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weighting::{IdfMode, TfMode};

    #[test]
    fn empty_object_gives_defaults() {
        let c: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(c, EngineConfig::default());
        assert_eq!(c.top_k, 5);
        assert_eq!(c.weighting.tf, TfMode::LogOnePlus);
        assert_eq!(c.weighting.idf, IdfMode::Standard);
    }

    #[test]
    fn partial_overrides() {
        let c: EngineConfig = serde_json::from_str(
            r#"{"weighting":{"idf":"smoothed"},"missing_documents":"abort"}"#,
        )
        .unwrap();
        assert_eq!(c.weighting.idf, IdfMode::Smoothed);
        assert_eq!(c.weighting.tf, TfMode::LogOnePlus);
        assert_eq!(c.missing_documents, MissingDocumentPolicy::Abort);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(serde_json::from_str::<EngineConfig>(r#"{"weighting":{"tf":"raw"}}"#).is_err());
    }
}
