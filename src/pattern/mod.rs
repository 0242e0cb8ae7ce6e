mod class;
mod compiled;
mod disasm;
mod emitter;
mod error;
mod instruction;
mod lexer;
mod options;
mod token;
mod vm;

pub use class::{CharClass, ClassItem};
pub use compiled::{Pattern, compile, compile_with, matches, release};
pub use disasm::{Listing, ListingLine, disassemble};
pub use emitter::{MAX_GROUPS, MAX_PROGRAM_LEN, emit};
pub use error::{
    CompileError, CompileResult, DecodeError, LexError, LexResult, PatternErrorCode,
};
pub use instruction::{Instruction, JUMP_WIDTH, JumpTarget, OpCode};
pub use lexer::lex;
pub use options::{
    CompileFlags, CompileOptions, CompileOptionsBuilder, DEFAULT_MAX_PATTERN_LEN,
    DEFAULT_MAX_PROGRAM_LEN, OptionsError,
};
pub use token::{CharacterEncoding, OperatorKind, Token, TokenKind};
pub use vm::execute;
