use std::collections::BTreeSet;

/// Default cap on the compiled size of a single rule regex
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Options that shape how rules are compiled and applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Fields that actions are not allowed to set or remove
    pub protected_fields: BTreeSet<String>,
    pub regex_size_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            protected_fields: BTreeSet::new(),
            regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn protect<I: IntoIterator<Item = S>, S: Into<String>>(mut self, keys: I) -> Self {
        self.protected_fields
            .extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn with_regex_size_limit(mut self, limit: usize) -> Self {
        self.regex_size_limit = limit;
        self
    }

    pub fn is_protected(&self, key: &str) -> bool {
        self.protected_fields.contains(key)
    }
}
