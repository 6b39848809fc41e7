//! # Saved models
//!
//! A model is stored as JSON: the parameters it was learned with, and one array of leaf records
//! per tree.
//!
//! ```json
//! {
//!   "params": { "target": "cancer", "options": { "regression": false, "advice": false }, ... },
//!   "trees": [["cancer(A):-smokes(A) 0.5", "cancer(A):- -0.5"]]
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::boosting::BoostConfig;
use crate::data::DataOptions;
use crate::tree::LearnedTree;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to access model file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed model file")]
    Json(#[from] serde_json::Error),
}

/// How a model was learned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Name of the target predicate.
    pub target: String,
    #[serde(default)]
    pub options: DataOptions,
    #[serde(default)]
    pub config: BoostConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub params: ModelParams,
    pub trees: Vec<LearnedTree>,
}

impl Model {
    pub fn new(params: ModelParams, trees: Vec<LearnedTree>) -> Self {
        Self { params, trees }
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let io_error = |source| ModelError::Io {
            path: path.to_owned(),
            source,
        };
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_error)?;
        }
        fs::write(path, self.to_json()?).map_err(io_error)?;
        debug!(path = %path.display(), trees = self.trees.len(), "saved model");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::boosting::Loss;

    fn model() -> Model {
        let tree: LearnedTree = vec![
            "cancer(A):-smokes(A) 0.5".to_owned(),
            "cancer(A):- -0.5".to_owned(),
        ]
        .try_into()
        .unwrap();
        Model::new(
            ModelParams {
                target: "cancer".into(),
                options: DataOptions::default(),
                config: BoostConfig {
                    trees: 1,
                    loss: Loss::Huber { delta: 0.5 },
                    ..BoostConfig::default()
                },
            },
            vec![tree],
        )
    }

    #[test]
    fn json_layout() {
        let json: serde_json::Value = serde_json::from_str(&model().to_json().unwrap()).unwrap();
        assert_eq!(json["params"]["target"], "cancer");
        assert_eq!(json["params"]["config"]["loss"]["kind"], "huber");
        assert_eq!(json["trees"][0][0], "cancer(A):-smokes(A) 0.5");
        assert_eq!(json["trees"][0][1], "cancer(A):- -0.5");
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("cancer.json");
        let model = model();
        model.save(&path).unwrap();
        assert_eq!(Model::load(&path).unwrap(), model);
    }

    #[test]
    fn defaults_and_errors() {
        let model = Model::from_json(
            r#"{"params": {"target": "cancer"}, "trees": [["cancer(A):- 0.25"]]}"#,
        )
        .unwrap();
        assert_eq!(model.params.config, BoostConfig::default());
        assert_eq!(model.trees[0].clauses()[0].value, 0.25);

        assert!(matches!(
            Model::from_json(r#"{"params": {"target": "cancer"}, "trees": [["cancer(A):-"]]}"#),
            Err(ModelError::Json(_))
        ));
        assert!(matches!(
            Model::load("/nonexistent/model.json"),
            Err(ModelError::Io { .. })
        ));
    }
}
