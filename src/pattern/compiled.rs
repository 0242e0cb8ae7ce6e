use std::fmt;

use super::disasm::{Listing, disassemble};
use super::emitter::emit_program;
use super::error::{CompileError, CompileResult};
use super::lexer::lex;
use super::options::{CompileFlags, CompileOptions};
use super::vm::execute;

/// A compiled pattern. Owns its bytecode; the buffer never changes after
/// compilation, so a shared `&Pattern` can be matched from many threads.
#[derive(Debug, PartialEq, Eq)]
pub struct Pattern {
    source: Box<str>,
    bytecode: Box<[u8]>,
    groups: u8,
}

impl Pattern {
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    pub fn group_count(&self) -> usize {
        self.groups as usize
    }

    #[inline]
    pub fn is_match(&self, input: &str) -> bool {
        execute(&self.bytecode, input)
    }

    pub fn disassemble(&self) -> Listing {
        disassemble(&self.bytecode)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

pub fn compile(pattern: &str, flags: CompileFlags) -> CompileResult<Pattern> {
    compile_with(pattern, &CompileOptions::from_flags(flags))
}

#[tracing::instrument(level = "trace", skip(options), fields(pattern_len = pattern.len() as u64))]
pub fn compile_with(pattern: &str, options: &CompileOptions) -> CompileResult<Pattern> {
    if pattern.len() > options.max_pattern_len {
        return Err(CompileError::PatternTooLong {
            len: pattern.len(),
            limit: options.max_pattern_len,
        });
    }

    let tokens = lex(pattern).inspect_err(|err| {
        tracing::debug!(error = %err, "pattern failed to lex");
    })?;

    if options.debug_trace {
        for (idx, token) in tokens.iter().enumerate() {
            tracing::debug!(
                idx,
                offset = token.offset,
                kind = ?token.kind,
                text = %token.display_text(),
                "token"
            );
        }
    }

    let emitted = emit_program(&tokens, options.max_program_len).inspect_err(|err| {
        tracing::debug!(error = %err, code = err.code().name(), "pattern failed to compile");
    })?;

    if options.debug_trace {
        tracing::debug!(
            bytes = emitted.bytecode.len() as u64,
            groups = emitted.groups,
            "compiled program:\n{}",
            disassemble(&emitted.bytecode)
        );
    }

    Ok(Pattern {
        source: pattern.into(),
        bytecode: emitted.bytecode.into_boxed_slice(),
        groups: emitted.groups,
    })
}

#[inline]
pub fn matches(pattern: &Pattern, input: &str) -> bool {
    pattern.is_match(input)
}

pub fn release(pattern: Pattern) {
    drop(pattern);
}
