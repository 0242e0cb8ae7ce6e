use super::instruction::{Instruction, JUMP_WIDTH, JumpTarget};

// Tests past the end of the input leave the flag false. Running off the end
// of the program without ACCEPT or FAIL returns the flag.
pub fn execute(bytecode: &[u8], input: &str) -> bool {
    let subject = input.as_bytes();
    let mut pc = 0usize;
    let mut sp = 0usize;
    let mut flag = false;

    while pc < bytecode.len() {
        let (instruction, width) = match Instruction::decode(bytecode, pc) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::error!(error = %err, pc, "bytecode is inconsistent; rejecting input");
                return false;
            }
        };

        let current = subject.get(sp).copied();
        let mut next = pc + width;

        match instruction {
            Instruction::TestSingle(c) => flag = current == Some(c),
            Instruction::TestRange(lo, hi) => {
                flag = current.is_some_and(|b| (lo..=hi).contains(&b));
            }
            Instruction::TestNegatedRange(lo, hi) => {
                flag = current.is_some_and(|b| b < lo || b > hi);
            }
            Instruction::TestAny => flag = current.is_some(),
            Instruction::TestDigit => flag = current.is_some_and(|b| b.is_ascii_digit()),
            Instruction::TestLowerCase => flag = current.is_some_and(|b| b.is_ascii_lowercase()),
            Instruction::TestUpperCase => flag = current.is_some_and(|b| b.is_ascii_uppercase()),
            Instruction::IncPosEq => sp += flag as usize,
            Instruction::IncPos => sp += 1,
            Instruction::DecPos => {
                let Some(prev) = sp.checked_sub(1) else {
                    tracing::error!(pc, "cursor moved before the start of the input");
                    return false;
                };
                sp = prev;
            }
            Instruction::JumpEq(target) | Instruction::JumpNeq(target) => {
                let taken = matches!(instruction, Instruction::JumpEq(_)) == flag;
                if taken {
                    let JumpTarget::Offset(offset) = target else {
                        tracing::error!(pc, "unresolved jump in finished bytecode");
                        return false;
                    };
                    let Some(landing) = displace(pc + JUMP_WIDTH, offset) else {
                        tracing::error!(pc, offset, "jump lands before the start of the program");
                        return false;
                    };
                    next = landing;
                }
            }
            Instruction::JumpPos(offset) => {
                let Some(moved) = displace(sp, offset) else {
                    tracing::error!(pc, offset, "cursor moved before the start of the input");
                    return false;
                };
                sp = moved;
            }
            Instruction::SetFlag(value) => flag = value,
            Instruction::GroupStart(_) | Instruction::GroupEnd(_) => {}
            Instruction::Accept => return true,
            Instruction::Fail => return false,
        }

        pc = next;
    }

    flag
}

#[inline]
fn displace(base: usize, offset: i32) -> Option<usize> {
    base.checked_add_signed(offset as isize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(program: &[Instruction]) -> Vec<u8> {
        let mut buf = Vec::new();
        for instruction in program {
            instruction
                .encode(&mut buf)
                .expect("test program should encode");
        }
        buf
    }

    #[test]
    fn empty_program_returns_initial_flag() {
        assert!(!execute(&[], "anything"));
    }

    #[test]
    fn flag_survives_when_program_runs_out() {
        let code = assemble(&[Instruction::TestSingle(b'x'), Instruction::IncPosEq]);
        assert!(execute(&code, "xyz"));
        assert!(!execute(&code, "yz"));
    }

    #[test]
    fn tests_fail_at_end_of_input() {
        let code = assemble(&[Instruction::TestAny]);
        assert!(!execute(&code, ""));
    }

    #[test]
    fn cursor_moves_unconditionally() {
        let code = assemble(&[
            Instruction::IncPos,
            Instruction::IncPos,
            Instruction::DecPos,
            Instruction::TestSingle(b'b'),
        ]);
        assert!(execute(&code, "abc"));

        let skip = assemble(&[Instruction::JumpPos(2), Instruction::TestSingle(b'c')]);
        assert!(execute(&skip, "abc"));
    }

    #[test]
    fn negated_range_and_classes() {
        let code = assemble(&[Instruction::TestNegatedRange(b'a', b'z')]);
        assert!(execute(&code, "Q"));
        assert!(!execute(&code, "q"));

        let upper = assemble(&[Instruction::TestUpperCase]);
        assert!(execute(&upper, "Q"));
        assert!(!execute(&upper, "q"));
    }

    #[test]
    fn jump_neq_skips_over_accept() {
        let code = assemble(&[
            Instruction::TestSingle(b'a'),
            Instruction::JumpNeq(JumpTarget::Offset(1)),
            Instruction::Accept,
            Instruction::Fail,
        ]);
        assert!(execute(&code, "a"));
        assert!(!execute(&code, "b"));
    }

    #[test]
    fn set_flag_and_groups_are_neutral_to_cursor() {
        let code = assemble(&[
            Instruction::GroupStart(1),
            Instruction::SetFlag(true),
            Instruction::IncPosEq,
            Instruction::GroupEnd(1),
            Instruction::TestSingle(b'b'),
        ]);
        assert!(execute(&code, "ab"));
    }

    #[test]
    fn inconsistent_bytecode_is_rejected() {
        assert!(!execute(&[0x00], "a"));
        assert!(!execute(&[0x0B], "a"));
        assert!(!execute(&assemble(&[Instruction::DecPos]), "a"));

        let before_start = assemble(&[
            Instruction::SetFlag(true),
            Instruction::JumpEq(JumpTarget::Offset(-100)),
        ]);
        assert!(!execute(&before_start, "a"));
    }
}
