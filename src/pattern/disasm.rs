use std::fmt;

use super::error::DecodeError;
use super::instruction::{Instruction, JumpTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLine {
    pub offset: usize,
    pub instruction: Instruction,
    pub width: usize,
}

impl ListingLine {
    /// Absolute landing offset for jumps.
    pub fn jump_destination(&self) -> Option<i64> {
        match self.instruction.jump_target()? {
            JumpTarget::Offset(offset) => Some((self.offset + self.width) as i64 + offset as i64),
            JumpTarget::Unresolved | JumpTarget::ToFail => None,
        }
    }
}

/// Decoded view of a bytecode buffer. Decoding stops at the first byte that
/// is not a valid instruction; the reason is kept in `error`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Listing {
    pub lines: Vec<ListingLine>,
    pub error: Option<DecodeError>,
}

impl Listing {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

pub fn disassemble(bytecode: &[u8]) -> Listing {
    let mut listing = Listing::default();
    let mut pc = 0usize;

    while pc < bytecode.len() {
        match Instruction::decode(bytecode, pc) {
            Ok((instruction, width)) => {
                listing.lines.push(ListingLine {
                    offset: pc,
                    instruction,
                    width,
                });
                pc += width;
            }
            Err(err) => {
                listing.error = Some(err);
                break;
            }
        }
    }

    listing
}

impl fmt::Display for ListingLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}  {}", self.offset, self.instruction)?;
        if let Some(destination) = self.jump_destination() {
            write!(f, " -> {destination:04}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        if let Some(err) = &self.error {
            writeln!(f, "!! {err}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_offsets_and_jump_destinations() {
        // TEST_SINGLE 'a'; JUMP_NEQ +1; ACCEPT; FAIL
        let bytecode = [0x01, b'a', 0x0C, 0, 0, 0, 1, 0x11, 0x12];
        let listing = disassemble(&bytecode);

        assert!(listing.is_complete());
        assert_eq!(
            listing.to_string(),
            "0000  TEST_SINGLE 'a'\n0002  JUMP_NEQ +1 -> 0008\n0007  ACCEPT\n0008  FAIL\n"
        );
    }

    #[test]
    fn stops_at_unknown_opcode() {
        let listing = disassemble(&[0x11, 0xEE, 0x12]);
        assert_eq!(listing.lines.len(), 1);
        assert_eq!(
            listing.error,
            Some(DecodeError::UnknownOpCode {
                opcode: 0xEE,
                position: 1
            })
        );
        assert!(listing.to_string().ends_with("!! unknown opcode 0xee at bytecode offset 1\n"));
    }
}
