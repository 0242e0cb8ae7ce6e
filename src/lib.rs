pub mod pattern;
pub mod registry;

pub use pattern::{
    CompileError, CompileFlags, CompileOptions, CompileResult, LexError, Pattern,
    PatternErrorCode, compile, compile_with, matches, release,
};
pub use registry::{PatternRegistry, RegistryOptions};
