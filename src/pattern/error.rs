use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("character range starting at {start} in pattern '{pattern}' is missing its closing ']'")]
    UnclosedCharacterRange { pattern: String, start: usize },
    #[error("unexpected character '{found}' at {index} in pattern '{pattern}'")]
    UnexpectedCharacter {
        pattern: String,
        index: usize,
        found: char,
    },
}

pub type LexResult<T> = Result<T, LexError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode 0x{opcode:02x} at bytecode offset {position}")]
    UnknownOpCode { opcode: u8, position: usize },
    #[error("instruction at bytecode offset {position} is truncated")]
    Truncated { position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("mismatched parentheses at {offset}")]
    MismatchedParentheses { offset: usize },
    #[error("expression ends unexpectedly at {offset}")]
    UnexpectedEndOfExpression { offset: usize },
    #[error("{remaining} tokens left over after emission, starting at {offset}")]
    UnexpectedTokensAfterEmission { offset: usize, remaining: usize },
    #[error("invalid token '{text}' at {offset}")]
    InvalidToken { offset: usize, text: String },
    #[error("operator '{text}' at {offset} has nothing to apply to")]
    InvalidOperator { offset: usize, text: String },
    #[error(transparent)]
    Bytecode(#[from] DecodeError),
    #[error("jump emitted at bytecode offset {position} was never resolved")]
    UnresolvedJump { position: usize },
    #[error("{resource} limit exceeded: requested {requested}, limit {limit}")]
    ResourceLimit {
        resource: &'static str,
        requested: usize,
        limit: usize,
    },
    #[error("pattern length {len} exceeds the configured maximum of {limit}")]
    PatternTooLong { len: usize, limit: usize },
}

impl CompileError {
    pub fn code(&self) -> PatternErrorCode {
        match self {
            CompileError::Lex(LexError::UnclosedCharacterRange { .. }) => {
                PatternErrorCode::UnclosedCharacterRange
            }
            CompileError::Lex(LexError::UnexpectedCharacter { .. }) => {
                PatternErrorCode::UnexpectedCharacter
            }
            CompileError::MismatchedParentheses { .. } => PatternErrorCode::MismatchedParentheses,
            CompileError::UnexpectedEndOfExpression { .. } => {
                PatternErrorCode::UnexpectedEndOfExpression
            }
            CompileError::UnexpectedTokensAfterEmission { .. } => {
                PatternErrorCode::UnexpectedTokensAfterEmission
            }
            CompileError::InvalidToken { .. } => PatternErrorCode::InvalidToken,
            CompileError::InvalidOperator { .. } => PatternErrorCode::InvalidOperator,
            CompileError::Bytecode(_) | CompileError::UnresolvedJump { .. } => {
                PatternErrorCode::UnknownOpCode
            }
            CompileError::ResourceLimit { .. } | CompileError::PatternTooLong { .. } => {
                PatternErrorCode::ResourceExhausted
            }
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Stable numeric identifiers for compile failures, for callers that only
/// carry an integer across their own boundary.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternErrorCode {
    UnclosedCharacterRange = 1,
    UnexpectedCharacter = 2,
    MismatchedParentheses = 3,
    UnexpectedEndOfExpression = 4,
    UnexpectedTokensAfterEmission = 5,
    InvalidToken = 6,
    InvalidOperator = 7,
    UnknownOpCode = 8,
    ResourceExhausted = 9,
}

impl PatternErrorCode {
    pub fn name(self) -> &'static str {
        match self {
            PatternErrorCode::UnclosedCharacterRange => "UnclosedCharacterRange",
            PatternErrorCode::UnexpectedCharacter => "UnexpectedCharacter",
            PatternErrorCode::MismatchedParentheses => "MismatchedParentheses",
            PatternErrorCode::UnexpectedEndOfExpression => "UnexpectedEndOfExpression",
            PatternErrorCode::UnexpectedTokensAfterEmission => "UnexpectedTokensAfterEmission",
            PatternErrorCode::InvalidToken => "InvalidToken",
            PatternErrorCode::InvalidOperator => "InvalidOperator",
            PatternErrorCode::UnknownOpCode => "UnknownOpCode",
            PatternErrorCode::ResourceExhausted => "ResourceExhausted",
        }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }
}
