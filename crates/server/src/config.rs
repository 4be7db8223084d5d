use std::path::PathBuf;

use anyhow::Context;
use pipeline::{AttributionPolicy, BlendSession, WeightState};
use serde::Deserialize;

/// Service configuration, read from `RECS_*` environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Directory holding the exported model artifacts
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// CF artifact file name, relative to `models_dir`
    #[serde(default = "default_cf_model")]
    pub cf_model: String,

    /// CBF artifact file name, relative to `models_dir`
    #[serde(default = "default_cbf_model")]
    pub cbf_model: String,

    /// How likes are credited to a model
    #[serde(default)]
    pub attribution: AttributionPolicy,

    /// CF weight of a fresh session
    #[serde(default = "default_initial_cf_weight")]
    pub initial_cf_weight: f64,
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_cf_model() -> String {
    "cf_model.json".to_string()
}

fn default_cbf_model() -> String {
    "cbf_model.json".to_string()
}

fn default_initial_cf_weight() -> f64 {
    6.0
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            cf_model: default_cf_model(),
            cbf_model: default_cbf_model(),
            attribution: AttributionPolicy::default(),
            initial_cf_weight: default_initial_cf_weight(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the environment, after reading `.env` if present
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::prefixed("RECS_")
            .from_env::<ServiceConfig>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Load configuration from explicit `(name, value)` pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed("RECS_")
            .from_iter::<_, ServiceConfig>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn cf_path(&self) -> PathBuf {
        self.models_dir.join(&self.cf_model)
    }

    pub fn cbf_path(&self) -> PathBuf {
        self.models_dir.join(&self.cbf_model)
    }

    /// A fresh session with the configured starting weights and policy
    pub fn session(&self) -> anyhow::Result<BlendSession> {
        let weights = WeightState::from_cf_weight(self.initial_cf_weight)
            .context("Invalid RECS_INITIAL_CF_WEIGHT")?;
        Ok(BlendSession::new()
            .with_weights(weights)
            .with_policy(self.attribution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_vars(Vec::new()).unwrap();
        assert_eq!(config.models_dir, Path::new("models"));
        assert_eq!(config.cf_path(), Path::new("models/cf_model.json"));
        assert_eq!(config.cbf_path(), Path::new("models/cbf_model.json"));
        assert_eq!(config.attribution, AttributionPolicy::NotShownByOther);
        assert_eq!(config.initial_cf_weight, 6.0);
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_vars(vars(&[
            ("RECS_MODELS_DIR", "/srv/recs"),
            ("RECS_CF_MODEL", "cf_v2.json"),
            ("RECS_ATTRIBUTION", "shown_only_by_liked"),
            ("RECS_INITIAL_CF_WEIGHT", "7.0"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();

        assert_eq!(config.cf_path(), Path::new("/srv/recs/cf_v2.json"));
        assert_eq!(config.cbf_path(), Path::new("/srv/recs/cbf_model.json"));
        assert_eq!(config.attribution, AttributionPolicy::ShownOnlyByLiked);

        let session = config.session().unwrap();
        assert_eq!(session.weights().cf_weight(), 7.0);
        assert_eq!(session.counts(), (7, 5));
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(ServiceConfig::from_vars(vars(&[("RECS_ATTRIBUTION", "always")])).is_err());
        assert!(ServiceConfig::from_vars(vars(&[("RECS_INITIAL_CF_WEIGHT", "lots")])).is_err());

        let config = ServiceConfig::from_vars(vars(&[("RECS_INITIAL_CF_WEIGHT", "6.3")])).unwrap();
        assert!(config.session().is_err());
    }
}
