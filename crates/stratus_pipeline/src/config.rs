//! Pipeline configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use stratus_core::CloudProvider;
use stratus_policy::ConstraintSet;

use crate::error::{PipelineError, RunResult};

/// Conventional configuration file name.
pub const CONFIG_FILE: &str = "stratus.toml";

/// Settings for a pipeline run, usually read from `stratus.toml`.
///
/// ```toml
/// provider = "aws"
/// region = "eu-west-1"
/// engine = "terraform"
/// constraints = "policies/"
/// output_dir = "infrastructure"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub provider: CloudProvider,
    /// Deployment region; the provider's default when unset.
    pub region: Option<String>,
    pub engine: String,
    /// Constraint file or directory. Without one the built-in baseline for
    /// the provider is used.
    pub constraints: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_provider(CloudProvider::Aws)
    }
}

impl PipelineConfig {
    pub fn for_provider(provider: CloudProvider) -> Self {
        Self {
            provider,
            region: None,
            engine: "terraform".to_string(),
            constraints: None,
            output_dir: PathBuf::from("infrastructure"),
        }
    }

    pub fn from_toml_str(content: &str) -> RunResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> RunResult<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load `stratus.toml` from `dir` if present, defaults otherwise.
    pub fn discover(dir: &Path) -> RunResult<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn with_constraints(mut self, path: impl Into<PathBuf>) -> Self {
        self.constraints = Some(path.into());
        self
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn region(&self) -> &str {
        match &self.region {
            Some(region) => region,
            None => self.provider.default_region(),
        }
    }

    pub fn validate(&self) -> RunResult<()> {
        if self.engine.trim().is_empty() {
            return Err(PipelineError::Config("engine must not be empty".into()));
        }
        if matches!(&self.region, Some(region) if region.trim().is_empty()) {
            return Err(PipelineError::Config("region must not be blank".into()));
        }
        Ok(())
    }

    /// The constraint set this configuration selects.
    pub fn load_constraints(&self) -> RunResult<ConstraintSet> {
        match &self.constraints {
            Some(path) if path.is_dir() => Ok(ConstraintSet::from_directory(path)?),
            Some(path) => Ok(ConstraintSet::from_file(path)?),
            None if self.provider == CloudProvider::Aws => Ok(ConstraintSet::aws_defaults()),
            None => Ok(ConstraintSet::new()),
        }
    }
}
