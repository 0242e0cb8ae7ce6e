use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::emitter::MAX_PROGRAM_LEN;

pub const DEFAULT_MAX_PATTERN_LEN: usize = 64 * 1024;
pub const DEFAULT_MAX_PROGRAM_LEN: usize = 16 * 1024 * 1024;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CompileFlags: u8 {
        /// Log the token stream and the disassembled program at debug level.
        const DEBUG_TRACE = 1 << 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub debug_trace: bool,
    pub max_pattern_len: usize,
    pub max_program_len: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            debug_trace: false,
            max_pattern_len: DEFAULT_MAX_PATTERN_LEN,
            max_program_len: DEFAULT_MAX_PROGRAM_LEN,
        }
    }
}

impl CompileOptions {
    pub fn builder() -> CompileOptionsBuilder {
        CompileOptionsBuilder::default()
    }

    pub fn from_flags(flags: CompileFlags) -> Self {
        Self {
            debug_trace: flags.contains(CompileFlags::DEBUG_TRACE),
            ..Self::default()
        }
    }

    pub fn flags(&self) -> CompileFlags {
        let mut flags = CompileFlags::empty();
        flags.set(CompileFlags::DEBUG_TRACE, self.debug_trace);
        flags
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.max_pattern_len == 0 {
            return Err(OptionsError::MaxPatternLenInvalid { provided: 0 });
        }
        if self.max_program_len == 0 || self.max_program_len > MAX_PROGRAM_LEN {
            return Err(OptionsError::MaxProgramLenOutOfRange {
                provided: self.max_program_len,
                max: MAX_PROGRAM_LEN,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CompileOptionsBuilder {
    options: CompileOptions,
}

impl CompileOptionsBuilder {
    pub fn debug_trace(mut self, value: bool) -> Self {
        self.options.debug_trace = value;
        self
    }

    pub fn flags(mut self, flags: CompileFlags) -> Self {
        self.options.debug_trace = flags.contains(CompileFlags::DEBUG_TRACE);
        self
    }

    pub fn max_pattern_len(mut self, value: usize) -> Self {
        self.options.max_pattern_len = value;
        self
    }

    pub fn max_program_len(mut self, value: usize) -> Self {
        self.options.max_program_len = value;
        self
    }

    pub fn build(self) -> Result<CompileOptions, OptionsError> {
        self.options.validate()?;
        Ok(self.options)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("max_pattern_len must be at least 1 (got {provided})")]
    MaxPatternLenInvalid { provided: usize },
    #[error("max_program_len {provided} is outside the supported range 1..={max}")]
    MaxProgramLenOutOfRange { provided: usize, max: usize },
    #[error("cache_capacity must be at least 1 when caching is enabled (got {provided})")]
    CacheCapacityInvalid { provided: usize },
}
