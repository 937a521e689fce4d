//! Permission engine limits and bootstrap settings.

use serde::{Deserialize, Serialize};

/// Settings for the resolver and the administrative write paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum length (in characters) of an override note.
    #[serde(default = "default_max_note_length")]
    pub max_note_length: usize,
    /// Maximum number of entries accepted by a single batch apply.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Optional JSON seed applied by `warden seed` when no file is given.
    #[serde(default)]
    pub seed_file: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_note_length: default_max_note_length(),
            max_batch_size: default_max_batch_size(),
            seed_file: None,
        }
    }
}

fn default_max_note_length() -> usize {
    500
}

fn default_max_batch_size() -> usize {
    200
}
