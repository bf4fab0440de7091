pub mod app_config;
pub mod config;
pub mod products;
pub mod rules;
pub mod stores;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{ProductRecord, RecordSource};
pub use rules::ExtractionRules;
pub use stores::{
    load_stores, load_stores_or_builtin, parse_stores, ExtractorConfig, ExtractorKind,
    StoreConfig, StoresFile,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read stores file {path}: {source}")]
    StoresFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse stores file: {0}")]
    StoresFileParse(#[from] serde_yaml::Error),

    #[error("invalid stores configuration: {0}")]
    Validation(String),
}
