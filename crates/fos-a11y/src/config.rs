//! Event queue configuration

use serde::{Deserialize, Serialize};

use crate::A11yError;

/// Tunables of the event queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Attach a text change to show/hide events whose subtree has text
    pub mutation_text_events: bool,
    /// Drop events whose target accessible is gone instead of firing them
    pub skip_defunct_targets: bool,
    /// Preceding selection events of one widget before they get packed
    /// into a single selection-within event
    pub selection_pack_threshold: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            mutation_text_events: true,
            skip_defunct_targets: true,
            selection_pack_threshold: 5,
        }
    }
}

impl QueueConfig {
    /// Parse from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, A11yError> {
        let config: Self = serde_json::from_str(json)?;
        if config.selection_pack_threshold == 0 {
            return Err(A11yError::InvalidConfig(
                "selection_pack_threshold must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn with_mutation_text_events(mut self, enabled: bool) -> Self {
        self.mutation_text_events = enabled;
        self
    }

    pub fn with_skip_defunct_targets(mut self, enabled: bool) -> Self {
        self.skip_defunct_targets = enabled;
        self
    }

    pub fn with_selection_pack_threshold(mut self, threshold: u32) -> Self {
        self.selection_pack_threshold = threshold.max(1);
        self
    }
}
