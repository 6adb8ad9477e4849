//! Generation results and generated files.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IacError, IacResult};

/// A file produced by code generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Path relative to the output directory.
    pub path: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Write the file below `dir`, creating parent directories.
    ///
    /// Paths that would escape `dir` are rejected.
    pub fn write_to(&self, dir: &Path) -> IacResult<PathBuf> {
        let relative = Path::new(&self.path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || self.path.is_empty() {
            return Err(IacError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("refusing to write outside the output directory: '{}'", self.path),
            )));
        }

        let target = dir.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, &self.content)?;
        debug!("Wrote {}", target.display());
        Ok(target)
    }
}

/// Write every file below `dir`.
pub fn write_all(dir: &Path, files: &[GeneratedFile]) -> IacResult<Vec<PathBuf>> {
    files.iter().map(|file| file.write_to(dir)).collect()
}

/// Overall outcome of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Failed,
}

/// A structured error carried in a [`PipelineResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_type: Option<String>,
}

impl ResultError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            resource_id: None,
            constraint_type: None,
        }
    }

    pub fn with_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_constraint(mut self, constraint_type: impl Into<String>) -> Self {
        self.constraint_type = Some(constraint_type.into());
        self
    }
}

impl From<&IacError> for ResultError {
    fn from(err: &IacError) -> Self {
        let error = ResultError::new(err.code(), err.to_string());
        match err.resource_id() {
            Some(id) => error.with_resource(id),
            None => error,
        }
    }
}

/// The output of code generation: either every file, or only errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub status: ResultStatus,
    pub engine: String,
    #[serde(default)]
    pub files: Vec<GeneratedFile>,
    #[serde(default)]
    pub errors: Vec<ResultError>,
}

impl PipelineResult {
    pub fn success(engine: impl Into<String>, files: Vec<GeneratedFile>) -> Self {
        Self {
            status: ResultStatus::Success,
            engine: engine.into(),
            files,
            errors: Vec::new(),
        }
    }

    pub fn failed(engine: impl Into<String>, errors: Vec<ResultError>) -> Self {
        Self {
            status: ResultStatus::Failed,
            engine: engine.into(),
            files: Vec::new(),
            errors,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    /// Look up a generated file by path.
    pub fn file(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_all() {
        let temp = tempdir().unwrap();
        let files = vec![
            GeneratedFile::new("main.tf", "# main\n"),
            GeneratedFile::new("modules/net/vpc.tf", "# vpc\n"),
        ];

        let written = write_all(temp.path(), &files).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(std::fs::read_to_string(temp.path().join("modules/net/vpc.tf")).unwrap(), "# vpc\n");
    }

    #[test]
    fn test_write_rejects_escaping_paths() {
        let temp = tempdir().unwrap();
        assert!(GeneratedFile::new("../evil.tf", "").write_to(temp.path()).is_err());
        assert!(GeneratedFile::new("/etc/evil.tf", "").write_to(temp.path()).is_err());
    }

    #[test]
    fn test_result_json_shape() {
        let result = PipelineResult::failed(
            "terraform",
            vec![ResultError::new("CyclicDependency", "cycle").with_resource("A")],
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["errors"][0]["resourceId"], "A");
        assert!(json["errors"][0].get("constraintType").is_none());
        assert_eq!(json["files"].as_array().unwrap().len(), 0);
    }
}
