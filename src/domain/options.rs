/// Option cache: the server's client-option set.
///
/// Filled wholesale by a `set_options` message and dropped on session
/// reset. Lookups never panic; a miss is logged and reported as `None`.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use crate::error::OptionError;

pub type OptionMap = HashMap<String, Value>;

#[derive(Debug, Default)]
pub struct OptionCache {
    options: Option<OptionMap>,
}

impl OptionCache {
    pub fn new() -> Self {
        OptionCache { options: None }
    }

    /// Replace the whole set. Keys missing from `options` are gone afterwards.
    pub fn set(&mut self, options: OptionMap) {
        self.options = Some(options);
    }

    pub fn clear(&mut self) {
        self.options = None;
    }

    pub fn is_set(&self) -> bool {
        self.options.is_some()
    }

    pub fn lookup(&self, name: &str) -> Result<&Value, OptionError> {
        let options = self
            .options
            .as_ref()
            .ok_or_else(|| OptionError::NotSet(name.to_string()))?;
        options
            .get(name)
            .ok_or_else(|| OptionError::Missing(name.to_string()))
    }

    /// Look up `name`, logging the reason on a miss.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.lookup(name) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }
}
