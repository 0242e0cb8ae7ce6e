use smallvec::SmallVec;

use super::class::{CharClass, ClassItem};
use super::error::{CompileError, CompileResult};
use super::instruction::{Instruction, JUMP_WIDTH, JumpTarget};
use super::options::DEFAULT_MAX_PROGRAM_LEN;
use super::token::{CharacterEncoding, OperatorKind, Token, TokenKind};

/// Largest program a relative `i32` jump can still span.
pub const MAX_PROGRAM_LEN: usize = i32::MAX as usize;
/// Group ids are one byte wide and id 0 stands for the whole match.
pub const MAX_GROUPS: usize = u8::MAX as usize;

type PendingJumps = SmallVec<[usize; 4]>;

#[derive(Debug)]
pub(crate) struct Emitted {
    pub bytecode: Vec<u8>,
    pub groups: u8,
}

// A fragment that fails leaves the cursor where it started. `width` is the
// number of bytes a success consumes, when every path consumes the same.
#[derive(Debug, Clone, Copy)]
struct Fragment {
    nullable: bool,
    width: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Abort {
    idx: usize,
    consumed: Option<usize>,
}

#[derive(Debug)]
struct Branch {
    aborts: SmallVec<[Abort; 4]>,
    tail: Option<usize>,
    fragment: Fragment,
}

fn sum(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    a.zip(b).map(|(a, b)| a + b)
}

pub fn emit(tokens: &[Token<'_>]) -> CompileResult<Vec<u8>> {
    emit_program(tokens, DEFAULT_MAX_PROGRAM_LEN).map(|emitted| emitted.bytecode)
}

#[tracing::instrument(level = "trace", skip(tokens), fields(tokens = tokens.len() as u64))]
pub(crate) fn emit_program(tokens: &[Token<'_>], max_len: usize) -> CompileResult<Emitted> {
    let mut emitter = Emitter::new(tokens, max_len.min(MAX_PROGRAM_LEN));

    if tokens.is_empty() {
        emitter.push(Instruction::Accept)?;
        return emitter.finish();
    }

    emitter.alternation(true)?;

    if let Some(token) = emitter.peek() {
        if token.kind == TokenKind::GroupEnd {
            return Err(CompileError::MismatchedParentheses {
                offset: token.offset,
            });
        }
        return Err(CompileError::UnexpectedTokensAfterEmission {
            offset: token.offset,
            remaining: tokens.len() - emitter.cursor,
        });
    }

    emitter.push(Instruction::JumpNeq(JumpTarget::ToFail))?;
    emitter.push(Instruction::Accept)?;
    let fail = emitter.push(Instruction::Fail)?;
    emitter.resolve_fail_jumps(fail)?;
    emitter.finish()
}

struct Emitter<'t, 'p> {
    tokens: &'t [Token<'p>],
    cursor: usize,
    code: Vec<Instruction>,
    offsets: Vec<usize>,
    len: usize,
    max_len: usize,
    groups: usize,
}

impl<'t, 'p> Emitter<'t, 'p> {
    fn new(tokens: &'t [Token<'p>], max_len: usize) -> Self {
        Self {
            tokens,
            cursor: 0,
            code: Vec::with_capacity(tokens.len() * 2 + 3),
            offsets: Vec::with_capacity(tokens.len() * 2 + 3),
            len: 0,
            max_len,
            groups: 0,
        }
    }

    fn peek(&self) -> Option<Token<'p>> {
        self.tokens.get(self.cursor).copied()
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }

    fn peek_operator(&self) -> Option<OperatorKind> {
        match self.peek()?.kind {
            TokenKind::Operator(kind) => Some(kind),
            _ => None,
        }
    }

    fn end_offset(&self) -> usize {
        self.tokens.last().map(|t| t.end()).unwrap_or(0)
    }

    fn ensure_room(&self, width: usize) -> CompileResult<()> {
        if self.len + width > self.max_len {
            return Err(CompileError::ResourceLimit {
                resource: "bytecode",
                requested: self.len + width,
                limit: self.max_len,
            });
        }
        Ok(())
    }

    fn push(&mut self, instruction: Instruction) -> CompileResult<usize> {
        let width = instruction.width();
        self.ensure_room(width)?;

        self.code.push(instruction);
        self.offsets.push(self.len);
        self.len += width;
        Ok(self.code.len() - 1)
    }

    fn relative(from: usize, to: usize) -> CompileResult<i32> {
        i32::try_from(to as i64 - from as i64).map_err(|_| CompileError::ResourceLimit {
            resource: "jump distance",
            requested: to.abs_diff(from),
            limit: i32::MAX as usize,
        })
    }

    fn patch(&mut self, idx: usize, target: usize) -> CompileResult<()> {
        let offset = Self::relative(self.offsets[idx] + JUMP_WIDTH, target)?;
        self.code[idx].set_jump_target(JumpTarget::Offset(offset));
        Ok(())
    }

    fn patch_here(&mut self, jumps: &[usize]) -> CompileResult<()> {
        let here = self.len;
        for &idx in jumps {
            self.patch(idx, here)?;
        }
        Ok(())
    }

    fn jump_back(&mut self, target: usize) -> CompileResult<()> {
        let idx = self.push(Instruction::JumpEq(JumpTarget::Unresolved))?;
        self.patch(idx, target)
    }

    fn alternation(&mut self, top_level: bool) -> CompileResult<Fragment> {
        let mut skips = PendingJumps::new();
        let mut branch = self.concatenation()?;
        let mut fragment = branch.fragment;

        loop {
            let more = self.peek_operator() == Some(OperatorKind::Alternate);

            if more || !top_level {
                self.close_branch(&branch)?;
            } else {
                // the last top-level branch has nothing left to try
                for abort in &branch.aborts {
                    self.code[abort.idx].set_jump_target(JumpTarget::ToFail);
                }
            }

            if !more {
                break;
            }

            self.advance();
            skips.push(self.push(Instruction::JumpEq(JumpTarget::Unresolved))?);
            branch = self.concatenation()?;
            fragment.nullable |= branch.fragment.nullable;
            if fragment.width != branch.fragment.width {
                fragment.width = None;
            }
        }

        self.patch_here(&skips)?;
        Ok(fragment)
    }

    fn concatenation(&mut self) -> CompileResult<Branch> {
        let mut aborts = SmallVec::new();
        let mut term = self.quantified()?;
        let mut consumed = Some(0);
        let mut nullable = term.nullable;

        while self.peek_operator() == Some(OperatorKind::Concatenate) {
            self.advance();
            let idx = self.push(Instruction::JumpNeq(JumpTarget::Unresolved))?;
            aborts.push(Abort { idx, consumed });
            consumed = sum(consumed, term.width);
            term = self.quantified()?;
            nullable &= term.nullable;
        }

        Ok(Branch {
            aborts,
            tail: consumed,
            fragment: Fragment {
                nullable,
                width: sum(consumed, term.width),
            },
        })
    }

    // Routes every failure of the branch to its end with the cursor moved back
    // to where the branch began. A failure after a run of unknown length can't
    // be undone and rejects the whole input.
    fn close_branch(&mut self, branch: &Branch) -> CompileResult<()> {
        let mut done = PendingJumps::new();
        let mut rewinds: SmallVec<[(usize, PendingJumps); 4]> = SmallVec::new();

        let tail = match branch.tail {
            Some(0) => None,
            Some(consumed) => Some(Abort {
                idx: self.push(Instruction::JumpNeq(JumpTarget::Unresolved))?,
                consumed: Some(consumed),
            }),
            None => {
                self.push(Instruction::JumpNeq(JumpTarget::ToFail))?;
                None
            }
        };

        for abort in branch.aborts.iter().chain(tail.iter()) {
            match abort.consumed {
                Some(0) => done.push(abort.idx),
                Some(consumed) => match rewinds.last_mut() {
                    Some((last, jumps)) if *last == consumed => jumps.push(abort.idx),
                    _ => rewinds.push((consumed, SmallVec::from_slice(&[abort.idx]))),
                },
                None => self.code[abort.idx].set_jump_target(JumpTarget::ToFail),
            }
        }

        if !rewinds.is_empty() {
            done.push(self.push(Instruction::JumpEq(JumpTarget::Unresolved))?);
            let count = rewinds.len();
            for (i, (consumed, jumps)) in rewinds.into_iter().enumerate() {
                self.patch_here(&jumps)?;
                let distance = i32::try_from(consumed).map_err(|_| CompileError::ResourceLimit {
                    resource: "rewind distance",
                    requested: consumed,
                    limit: i32::MAX as usize,
                })?;
                self.push(Instruction::JumpPos(-distance))?;
                if i + 1 < count {
                    done.push(self.push(Instruction::JumpNeq(JumpTarget::Unresolved))?);
                }
            }
        }

        self.patch_here(&done)
    }

    fn quantified(&mut self) -> CompileResult<Fragment> {
        let start_idx = self.code.len();
        let start = self.len;
        let fragment = self.primary()?;

        let fragment = match self.peek_operator() {
            Some(OperatorKind::ZeroOrMore) => {
                self.advance();
                // a nullable body would spin in place, one attempt is all it gets
                if !fragment.nullable {
                    self.jump_back(start)?;
                }
                self.push(Instruction::SetFlag(true))?;
                Fragment {
                    nullable: true,
                    width: fragment.width.filter(|&w| w == 0),
                }
            }
            Some(OperatorKind::OneOrMore) => {
                self.advance();
                if fragment.nullable {
                    return self.reject_stacked_quantifier(fragment);
                }

                let body_end = self.code.len();
                let body_len = self.len - start;
                // refuse the copy up front so nested repeats stop before allocating
                self.ensure_room(body_len + 2 * JUMP_WIDTH + 2)?;

                let exit = self.push(Instruction::JumpNeq(JumpTarget::Unresolved))?;
                let loop_start = self.len;
                for idx in start_idx..body_end {
                    let instruction = self.code[idx];
                    self.push(instruction)?;
                }
                self.jump_back(loop_start)?;
                self.push(Instruction::SetFlag(true))?;
                self.patch_here(&[exit])?;
                Fragment {
                    nullable: false,
                    width: None,
                }
            }
            Some(OperatorKind::ZeroOrOne) => {
                self.advance();
                self.push(Instruction::SetFlag(true))?;
                Fragment {
                    nullable: true,
                    width: fragment.width.filter(|&w| w == 0),
                }
            }
            _ => return Ok(fragment),
        };

        self.reject_stacked_quantifier(fragment)
    }

    fn reject_stacked_quantifier(&self, fragment: Fragment) -> CompileResult<Fragment> {
        if let Some(token) = self.peek()
            && let TokenKind::Operator(kind) = token.kind
            && kind.is_quantifier()
        {
            return Err(CompileError::InvalidOperator {
                offset: token.offset,
                text: token.display_text(),
            });
        }

        Ok(fragment)
    }

    fn primary(&mut self) -> CompileResult<Fragment> {
        let Some(token) = self.peek() else {
            return Err(CompileError::UnexpectedEndOfExpression {
                offset: self.end_offset(),
            });
        };

        match token.kind {
            TokenKind::Character(encoding) => {
                self.advance();
                let test = match encoding {
                    CharacterEncoding::Any => Instruction::TestAny,
                    CharacterEncoding::Single => {
                        let byte = token.text.as_bytes().first().copied().ok_or_else(|| {
                            CompileError::InvalidToken {
                                offset: token.offset,
                                text: token.display_text(),
                            }
                        })?;
                        Instruction::TestSingle(byte)
                    }
                };
                self.push(test)?;
                self.push(Instruction::IncPosEq)?;
                Ok(Fragment {
                    nullable: false,
                    width: Some(1),
                })
            }
            TokenKind::CharacterRange => {
                self.advance();
                let class =
                    CharClass::parse(token.text).ok_or_else(|| CompileError::InvalidToken {
                        offset: token.offset,
                        text: token.display_text(),
                    })?;
                self.character_class(&class)?;
                Ok(Fragment {
                    nullable: false,
                    width: Some(1),
                })
            }
            TokenKind::GroupBegin => {
                self.advance();
                if self.groups >= MAX_GROUPS {
                    return Err(CompileError::ResourceLimit {
                        resource: "groups",
                        requested: self.groups + 1,
                        limit: MAX_GROUPS,
                    });
                }
                self.groups += 1;
                let id = self.groups as u8;

                self.push(Instruction::GroupStart(id))?;
                let inner = self.alternation(false)?;

                match self.peek() {
                    Some(close) if close.kind == TokenKind::GroupEnd => self.advance(),
                    _ => {
                        return Err(CompileError::MismatchedParentheses {
                            offset: token.offset,
                        });
                    }
                }

                self.push(Instruction::GroupEnd(id))?;
                Ok(inner)
            }
            TokenKind::GroupEnd => Err(CompileError::UnexpectedEndOfExpression {
                offset: token.offset,
            }),
            TokenKind::Operator(_) => Err(CompileError::InvalidOperator {
                offset: token.offset,
                text: token.display_text(),
            }),
            TokenKind::Invalid => Err(CompileError::InvalidToken {
                offset: token.offset,
                text: token.display_text(),
            }),
        }
    }

    fn character_class(&mut self, class: &CharClass) -> CompileResult<()> {
        let mut exits = PendingJumps::new();
        let last = class.items.len().saturating_sub(1);

        for (i, item) in class.items.iter().enumerate() {
            if class.negated {
                self.push(Instruction::TestNegatedRange(item.lo, item.hi))?;
                if i < last {
                    exits.push(self.push(Instruction::JumpNeq(JumpTarget::Unresolved))?);
                }
            } else {
                self.push(class_test(item))?;
                if i < last {
                    exits.push(self.push(Instruction::JumpEq(JumpTarget::Unresolved))?);
                }
            }
        }

        self.patch_here(&exits)?;
        self.push(Instruction::IncPosEq)?;
        Ok(())
    }

    fn resolve_fail_jumps(&mut self, fail: usize) -> CompileResult<()> {
        let target = self.offsets[fail];
        for idx in 0..self.code.len() {
            if self.code[idx].jump_target() == Some(JumpTarget::ToFail) {
                self.patch(idx, target)?;
            }
        }
        Ok(())
    }

    fn finish(self) -> CompileResult<Emitted> {
        let mut bytecode = Vec::with_capacity(self.len);
        for instruction in &self.code {
            instruction.encode(&mut bytecode)?;
        }

        verify(&bytecode)?;

        Ok(Emitted {
            bytecode,
            groups: self.groups as u8,
        })
    }
}

fn class_test(item: &ClassItem) -> Instruction {
    match (item.lo, item.hi) {
        (b'0', b'9') => Instruction::TestDigit,
        (b'a', b'z') => Instruction::TestLowerCase,
        (b'A', b'Z') => Instruction::TestUpperCase,
        (lo, hi) if lo == hi => Instruction::TestSingle(lo),
        (lo, hi) => Instruction::TestRange(lo, hi),
    }
}

// every jump must land on an instruction boundary
fn verify(bytecode: &[u8]) -> CompileResult<()> {
    let mut boundaries = Vec::new();
    let mut jumps: SmallVec<[(usize, usize); 16]> = SmallVec::new();
    let mut pc = 0usize;

    while pc < bytecode.len() {
        let (instruction, width) = Instruction::decode(bytecode, pc)?;
        boundaries.push(pc);
        if let Some(JumpTarget::Offset(offset)) = instruction.jump_target() {
            let target = (pc + width) as i64 + offset as i64;
            if target < 0 {
                return Err(CompileError::UnresolvedJump { position: pc });
            }
            jumps.push((pc, target as usize));
        }
        pc += width;
    }

    for (position, target) in jumps {
        if boundaries.binary_search(&target).is_err() {
            return Err(CompileError::UnresolvedJump { position });
        }
    }

    Ok(())
}
