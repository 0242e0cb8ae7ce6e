use memchr::memchr;

use super::error::{LexError, LexResult};
use super::token::{CharacterEncoding, OperatorKind, Token, TokenKind};

#[tracing::instrument(level = "trace", fields(pattern_len = pattern.len() as u64))]
pub fn lex(pattern: &str) -> LexResult<Vec<Token<'_>>> {
    let bytes = pattern.as_bytes();
    let mut tokens = Vec::with_capacity(bytes.len() * 2);
    let mut needs_concat = false;
    let mut idx = 0usize;

    while idx < bytes.len() {
        let byte = bytes[idx];

        match byte {
            b'|' => {
                tokens.push(operator(pattern, idx, OperatorKind::Alternate));
                needs_concat = false;
                idx += 1;
            }
            b'*' | b'+' | b'?' => {
                if let Some(kind) = OperatorKind::from_byte(byte) {
                    tokens.push(operator(pattern, idx, kind));
                }
                idx += 1;
            }
            b'(' => {
                if needs_concat {
                    tokens.push(Token::concatenation(idx));
                }
                tokens.push(Token::new(&pattern[idx..idx + 1], idx, TokenKind::GroupBegin));
                needs_concat = false;
                idx += 1;
            }
            b')' => {
                tokens.push(Token::new(&pattern[idx..idx + 1], idx, TokenKind::GroupEnd));
                needs_concat = true;
                idx += 1;
            }
            b'[' => {
                let body_start = idx + 1;
                let Some(len) = memchr(b']', &bytes[body_start..]) else {
                    return Err(LexError::UnclosedCharacterRange {
                        pattern: pattern.to_string(),
                        start: idx,
                    });
                };

                if needs_concat {
                    tokens.push(Token::concatenation(idx));
                }
                tokens.push(Token::new(
                    &pattern[body_start..body_start + len],
                    idx,
                    TokenKind::CharacterRange,
                ));
                needs_concat = true;
                idx = body_start + len + 1;
            }
            b'.' => {
                if needs_concat {
                    tokens.push(Token::concatenation(idx));
                }
                tokens.push(Token::new(
                    &pattern[idx..idx + 1],
                    idx,
                    TokenKind::Character(CharacterEncoding::Any),
                ));
                needs_concat = true;
                idx += 1;
            }
            b if b.is_ascii_alphanumeric() || b == b'_' => {
                if needs_concat {
                    tokens.push(Token::concatenation(idx));
                }
                tokens.push(Token::new(
                    &pattern[idx..idx + 1],
                    idx,
                    TokenKind::Character(CharacterEncoding::Single),
                ));
                needs_concat = true;
                idx += 1;
            }
            _ => {
                // idx always sits on a char boundary: only ASCII bytes are stepped over
                let found = pattern[idx..].chars().next().unwrap_or('\u{FFFD}');
                return Err(LexError::UnexpectedCharacter {
                    pattern: pattern.to_string(),
                    index: idx,
                    found,
                });
            }
        }
    }

    Ok(tokens)
}

fn operator(pattern: &str, idx: usize, kind: OperatorKind) -> Token<'_> {
    Token::new(&pattern[idx..idx + 1], idx, TokenKind::Operator(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(pattern: &str) -> Vec<TokenKind> {
        lex(pattern)
            .expect("pattern should lex")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn quantifier_keeps_concatenation_pending() {
        assert_eq!(
            kinds("a*b"),
            vec![
                TokenKind::Character(CharacterEncoding::Single),
                TokenKind::Operator(OperatorKind::ZeroOrMore),
                TokenKind::Operator(OperatorKind::Concatenate),
                TokenKind::Character(CharacterEncoding::Single),
            ]
        );
    }

    #[test]
    fn group_after_matchable_gets_concatenation() {
        assert_eq!(
            kinds("a(b)c"),
            vec![
                TokenKind::Character(CharacterEncoding::Single),
                TokenKind::Operator(OperatorKind::Concatenate),
                TokenKind::GroupBegin,
                TokenKind::Character(CharacterEncoding::Single),
                TokenKind::GroupEnd,
                TokenKind::Operator(OperatorKind::Concatenate),
                TokenKind::Character(CharacterEncoding::Single),
            ]
        );
    }

    #[test]
    fn range_span_excludes_brackets() {
        let tokens = lex("x[a-f0-9]").expect("pattern should lex");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].kind, TokenKind::CharacterRange);
        assert_eq!(tokens[2].text, "a-f0-9");
        assert_eq!(tokens[2].offset, 1);
        assert_eq!(tokens[1].text, "");
    }

    #[test]
    fn non_ascii_is_reported_as_char() {
        let err = lex("ab\u{e9}").expect_err("non-ascii should fail");
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                pattern: "ab\u{e9}".to_string(),
                index: 2,
                found: '\u{e9}',
            }
        );
    }
}
