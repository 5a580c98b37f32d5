use std::path::PathBuf;

use crate::model::Nutrient;

#[derive(Debug, thiserror::Error)]
pub enum PatabaError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to load agronomy config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid agronomy config: {0}")]
    ConfigInvalid(String),

    #[error("no suitable {category} product in catalog to supply {nutrient}")]
    CatalogInsufficient {
        nutrient: Nutrient,
        category: &'static str,
    },

    #[error("failed to load price catalog: {0}")]
    CatalogLoad(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
