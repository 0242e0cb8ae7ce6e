use crate::pattern::{CompileOptions, OptionsError};
use serde::{Deserialize, Serialize};

use super::cache::DEFAULT_CACHE_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryOptions {
    pub compile: CompileOptions,
    pub cache_patterns: bool,
    pub cache_capacity: usize,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            compile: CompileOptions::default(),
            cache_patterns: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl RegistryOptions {
    pub fn builder() -> RegistryOptionsBuilder {
        RegistryOptionsBuilder::default()
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        self.compile.validate()?;
        if self.cache_patterns && self.cache_capacity == 0 {
            return Err(OptionsError::CacheCapacityInvalid { provided: 0 });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct RegistryOptionsBuilder {
    options: RegistryOptions,
}

impl RegistryOptionsBuilder {
    pub fn compile(mut self, compile: CompileOptions) -> Self {
        self.options.compile = compile;
        self
    }

    pub fn cache_patterns(mut self, value: bool) -> Self {
        self.options.cache_patterns = value;
        self
    }

    pub fn cache_capacity(mut self, value: usize) -> Self {
        self.options.cache_capacity = value;
        self
    }

    pub fn build(self) -> Result<RegistryOptions, OptionsError> {
        let options = self.options;
        options.validate()?;
        Ok(options)
    }
}
