use std::fmt;

use super::error::{CompileError, CompileResult, DecodeError};

/// Width of every jump instruction: opcode plus a 4 byte offset.
pub const JUMP_WIDTH: usize = 5;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    TestSingle = 0x01,
    TestRange = 0x02,
    TestNegatedRange = 0x03,
    TestAny = 0x04,
    TestDigit = 0x05,
    TestLowerCase = 0x06,
    TestUpperCase = 0x07,
    IncPosEq = 0x08,
    IncPos = 0x09,
    DecPos = 0x0A,
    JumpEq = 0x0B,
    JumpNeq = 0x0C,
    JumpPos = 0x0D,
    SetFlag = 0x0E,
    GroupStart = 0x0F,
    GroupEnd = 0x10,
    Accept = 0x11,
    Fail = 0x12,
}

impl OpCode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        let op = match byte {
            0x01 => OpCode::TestSingle,
            0x02 => OpCode::TestRange,
            0x03 => OpCode::TestNegatedRange,
            0x04 => OpCode::TestAny,
            0x05 => OpCode::TestDigit,
            0x06 => OpCode::TestLowerCase,
            0x07 => OpCode::TestUpperCase,
            0x08 => OpCode::IncPosEq,
            0x09 => OpCode::IncPos,
            0x0A => OpCode::DecPos,
            0x0B => OpCode::JumpEq,
            0x0C => OpCode::JumpNeq,
            0x0D => OpCode::JumpPos,
            0x0E => OpCode::SetFlag,
            0x0F => OpCode::GroupStart,
            0x10 => OpCode::GroupEnd,
            0x11 => OpCode::Accept,
            0x12 => OpCode::Fail,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn operand_width(self) -> usize {
        match self {
            OpCode::TestAny
            | OpCode::TestDigit
            | OpCode::TestLowerCase
            | OpCode::TestUpperCase
            | OpCode::IncPosEq
            | OpCode::IncPos
            | OpCode::DecPos
            | OpCode::Accept
            | OpCode::Fail => 0,
            OpCode::TestSingle | OpCode::SetFlag | OpCode::GroupStart | OpCode::GroupEnd => 1,
            OpCode::TestRange | OpCode::TestNegatedRange => 2,
            OpCode::JumpEq | OpCode::JumpNeq | OpCode::JumpPos => 4,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::TestSingle => "TEST_SINGLE",
            OpCode::TestRange => "TEST_RANGE",
            OpCode::TestNegatedRange => "TEST_NEGATED_RANGE",
            OpCode::TestAny => "TEST_ANY",
            OpCode::TestDigit => "TEST_DIGIT",
            OpCode::TestLowerCase => "TEST_LOWER_CASE",
            OpCode::TestUpperCase => "TEST_UPPER_CASE",
            OpCode::IncPosEq => "INC_POS_EQ",
            OpCode::IncPos => "INC_POS",
            OpCode::DecPos => "DEC_POS",
            OpCode::JumpEq => "JUMP_EQ",
            OpCode::JumpNeq => "JUMP_NEQ",
            OpCode::JumpPos => "JUMP_POS",
            OpCode::SetFlag => "SET_FLAG",
            OpCode::GroupStart => "GROUP_START",
            OpCode::GroupEnd => "GROUP_END",
            OpCode::Accept => "ACCEPT",
            OpCode::Fail => "FAIL",
        }
    }
}

/// Destination of a conditional jump while the program is still being emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTarget {
    Unresolved,
    ToFail,
    Offset(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    TestSingle(u8),
    TestRange(u8, u8),
    TestNegatedRange(u8, u8),
    TestAny,
    TestDigit,
    TestLowerCase,
    TestUpperCase,
    IncPosEq,
    IncPos,
    DecPos,
    JumpEq(JumpTarget),
    JumpNeq(JumpTarget),
    JumpPos(i32),
    SetFlag(bool),
    GroupStart(u8),
    GroupEnd(u8),
    Accept,
    Fail,
}

impl Instruction {
    pub fn opcode(&self) -> OpCode {
        match self {
            Instruction::TestSingle(_) => OpCode::TestSingle,
            Instruction::TestRange(..) => OpCode::TestRange,
            Instruction::TestNegatedRange(..) => OpCode::TestNegatedRange,
            Instruction::TestAny => OpCode::TestAny,
            Instruction::TestDigit => OpCode::TestDigit,
            Instruction::TestLowerCase => OpCode::TestLowerCase,
            Instruction::TestUpperCase => OpCode::TestUpperCase,
            Instruction::IncPosEq => OpCode::IncPosEq,
            Instruction::IncPos => OpCode::IncPos,
            Instruction::DecPos => OpCode::DecPos,
            Instruction::JumpEq(_) => OpCode::JumpEq,
            Instruction::JumpNeq(_) => OpCode::JumpNeq,
            Instruction::JumpPos(_) => OpCode::JumpPos,
            Instruction::SetFlag(_) => OpCode::SetFlag,
            Instruction::GroupStart(_) => OpCode::GroupStart,
            Instruction::GroupEnd(_) => OpCode::GroupEnd,
            Instruction::Accept => OpCode::Accept,
            Instruction::Fail => OpCode::Fail,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        1 + self.opcode().operand_width()
    }

    pub fn jump_target(&self) -> Option<JumpTarget> {
        match self {
            Instruction::JumpEq(target) | Instruction::JumpNeq(target) => Some(*target),
            _ => None,
        }
    }

    pub fn set_jump_target(&mut self, target: JumpTarget) {
        if let Instruction::JumpEq(t) | Instruction::JumpNeq(t) = self {
            *t = target;
        }
    }

    pub fn encode(&self, buf: &mut Vec<u8>) -> CompileResult<()> {
        let position = buf.len();
        buf.push(self.opcode().as_byte());

        match *self {
            Instruction::TestSingle(c) => buf.push(c),
            Instruction::TestRange(lo, hi) | Instruction::TestNegatedRange(lo, hi) => {
                buf.push(lo);
                buf.push(hi);
            }
            Instruction::JumpEq(target) | Instruction::JumpNeq(target) => match target {
                JumpTarget::Offset(offset) => buf.extend_from_slice(&offset.to_be_bytes()),
                JumpTarget::Unresolved | JumpTarget::ToFail => {
                    return Err(CompileError::UnresolvedJump { position });
                }
            },
            Instruction::JumpPos(offset) => buf.extend_from_slice(&offset.to_be_bytes()),
            Instruction::SetFlag(value) => buf.push(value as u8),
            Instruction::GroupStart(id) | Instruction::GroupEnd(id) => buf.push(id),
            Instruction::TestAny
            | Instruction::TestDigit
            | Instruction::TestLowerCase
            | Instruction::TestUpperCase
            | Instruction::IncPosEq
            | Instruction::IncPos
            | Instruction::DecPos
            | Instruction::Accept
            | Instruction::Fail => {}
        }

        Ok(())
    }

    #[inline]
    pub fn decode(bytes: &[u8], position: usize) -> Result<(Instruction, usize), DecodeError> {
        let Some(&byte) = bytes.get(position) else {
            return Err(DecodeError::Truncated { position });
        };
        let opcode = OpCode::from_byte(byte).ok_or(DecodeError::UnknownOpCode {
            opcode: byte,
            position,
        })?;
        let width = 1 + opcode.operand_width();
        let operands = bytes
            .get(position + 1..position + width)
            .ok_or(DecodeError::Truncated { position })?;

        let instruction = match opcode {
            OpCode::TestSingle => Instruction::TestSingle(operands[0]),
            OpCode::TestRange => Instruction::TestRange(operands[0], operands[1]),
            OpCode::TestNegatedRange => Instruction::TestNegatedRange(operands[0], operands[1]),
            OpCode::TestAny => Instruction::TestAny,
            OpCode::TestDigit => Instruction::TestDigit,
            OpCode::TestLowerCase => Instruction::TestLowerCase,
            OpCode::TestUpperCase => Instruction::TestUpperCase,
            OpCode::IncPosEq => Instruction::IncPosEq,
            OpCode::IncPos => Instruction::IncPos,
            OpCode::DecPos => Instruction::DecPos,
            OpCode::JumpEq => Instruction::JumpEq(JumpTarget::Offset(read_i32(operands))),
            OpCode::JumpNeq => Instruction::JumpNeq(JumpTarget::Offset(read_i32(operands))),
            OpCode::JumpPos => Instruction::JumpPos(read_i32(operands)),
            OpCode::SetFlag => Instruction::SetFlag(operands[0] != 0),
            OpCode::GroupStart => Instruction::GroupStart(operands[0]),
            OpCode::GroupEnd => Instruction::GroupEnd(operands[0]),
            OpCode::Accept => Instruction::Accept,
            OpCode::Fail => Instruction::Fail,
        };

        Ok((instruction, width))
    }
}

#[inline]
fn read_i32(operands: &[u8]) -> i32 {
    i32::from_be_bytes([operands[0], operands[1], operands[2], operands[3]])
}

struct ByteLiteral(u8);

impl fmt::Display for ByteLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", std::ascii::escape_default(self.0))
    }
}

impl fmt::Display for JumpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JumpTarget::Unresolved => f.write_str("<unresolved>"),
            JumpTarget::ToFail => f.write_str("<fail>"),
            JumpTarget::Offset(offset) => write!(f, "{offset:+}"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.opcode().mnemonic();
        match *self {
            Instruction::TestSingle(c) => write!(f, "{mnemonic} {}", ByteLiteral(c)),
            Instruction::TestRange(lo, hi) | Instruction::TestNegatedRange(lo, hi) => {
                write!(f, "{mnemonic} {}-{}", ByteLiteral(lo), ByteLiteral(hi))
            }
            Instruction::JumpEq(target) | Instruction::JumpNeq(target) => {
                write!(f, "{mnemonic} {target}")
            }
            Instruction::JumpPos(offset) => write!(f, "{mnemonic} {offset:+}"),
            Instruction::SetFlag(value) => write!(f, "{mnemonic} {}", value as u8),
            Instruction::GroupStart(id) | Instruction::GroupEnd(id) => {
                write!(f, "{mnemonic} #{id}")
            }
            _ => f.write_str(mnemonic),
        }
    }
}
