//! Configuration system
//!
//! Configuration files are TOML or RON, picked by file extension. The only
//! setting the combiner itself consumes is the triangle strip preference; the
//! rest drives the collector's exclusion policy and the caller's scene cleanup.

pub use serde::{Serialize, Deserialize};

use crate::combine::CombineOptions;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Default name of the nodes that receive combined meshes
pub const DEFAULT_COMBINED_NODE_NAME: &str = "Combined mesh";

/// Ratio of `|det|` to the product of the column lengths at or below which a
/// transform counts as singular
pub const DEFAULT_SINGULAR_EPSILON: f32 = 1e-6;

/// Settings for one combine request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineConfig {
    /// Re-encode index ranges as triangle strips when that is not larger
    pub prefer_triangle_strips: bool,

    /// Name substrings that keep a node out of the combination
    ///
    /// Matching nodes are also preserved by the scene cleanup that follows.
    pub exclusion_patterns: Vec<String>,

    /// Name given to nodes created for combined meshes
    pub combined_node_name: String,

    /// Singularity threshold for the normal matrix, relative to the column lengths
    pub singular_epsilon: f32,

    /// Directory the caller writes combined meshes to
    pub output_dir: String,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            prefer_triangle_strips: true,
            exclusion_patterns: vec![
                "Collider".to_string(),
                "Collision".to_string(),
                "Indoors".to_string(),
            ],
            combined_node_name: DEFAULT_COMBINED_NODE_NAME.to_string(),
            singular_epsilon: DEFAULT_SINGULAR_EPSILON,
            output_dir: "combined".to_string(),
        }
    }
}

impl Config for CombineConfig {}

impl CombineConfig {
    /// Options handed to the mesh combiner
    pub fn combine_options(&self) -> CombineOptions {
        CombineOptions {
            prefer_triangle_strips: self.prefer_triangle_strips,
            singular_epsilon: self.singular_epsilon,
        }
    }
}
