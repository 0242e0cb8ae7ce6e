use bunner_pattern_rs::pattern::{
    CompileError, CompileFlags, CompileOptions, DEFAULT_MAX_PROGRAM_LEN, Instruction, LexError, MAX_GROUPS,
    PatternErrorCode, Token, TokenKind, compile, compile_with, emit, lex, release,
};

fn compile_err(pattern: &str) -> CompileError {
    compile(pattern, CompileFlags::empty()).expect_err("pattern should be rejected")
}

#[test]
fn empty_pattern_is_a_single_accept() {
    let pattern = compile("", CompileFlags::empty()).expect("empty pattern should compile");
    assert_eq!(pattern.bytecode(), &[0x11]);
}

#[test]
fn program_ends_with_accept_then_fail() {
    for source in ["a", "abc", "cat|dog", "(a|b)+c?", "[^x-z]*"] {
        let pattern = compile(source, CompileFlags::empty()).expect("pattern should compile");
        let code = pattern.bytecode();
        assert_eq!(&code[code.len() - 2..], &[0x11, 0x12], "pattern {source}");
    }
}

#[test]
fn disassembly_of_compiled_program_is_complete() {
    let pattern = compile("(ab|c)+", CompileFlags::empty()).expect("pattern should compile");
    let listing = pattern.disassemble();

    assert!(listing.is_complete());
    let last: Vec<_> = listing
        .lines
        .iter()
        .rev()
        .take(2)
        .map(|line| line.instruction)
        .collect();
    assert_eq!(last, vec![Instruction::Fail, Instruction::Accept]);

    let fail_offset = listing.lines.last().map(|line| line.offset);
    for line in &listing.lines {
        if let Some(destination) = line.jump_destination() {
            assert!(destination >= 0);
            assert!(destination as usize <= fail_offset.unwrap_or(0));
        }
    }
}

#[test]
fn counts_groups() {
    let pattern = compile("(a)(b(c))", CompileFlags::empty()).expect("pattern should compile");
    assert_eq!(pattern.group_count(), 3);
    assert_eq!(pattern.as_str(), "(a)(b(c))");
    release(pattern);
}

#[test]
fn debug_trace_does_not_change_the_program() {
    let plain = compile("a+b", CompileFlags::empty()).expect("pattern should compile");
    let traced = compile("a+b", CompileFlags::DEBUG_TRACE).expect("pattern should compile");
    assert_eq!(plain.bytecode(), traced.bytecode());
}

#[test]
fn reports_mismatched_parentheses() {
    assert_eq!(
        compile_err("(ab"),
        CompileError::MismatchedParentheses { offset: 0 }
    );
    assert_eq!(
        compile_err("ab)"),
        CompileError::MismatchedParentheses { offset: 2 }
    );
}

#[test]
fn lexical_errors_surface_through_compile() {
    match compile_err("[az") {
        CompileError::Lex(LexError::UnclosedCharacterRange { start, .. }) => assert_eq!(start, 0),
        other => panic!("unexpected error: {other:?}"),
    }
    match compile_err("a$b") {
        CompileError::Lex(LexError::UnexpectedCharacter { found, index, .. }) => {
            assert_eq!(found, '$');
            assert_eq!(index, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn reports_dangling_operators() {
    match compile_err("*a") {
        CompileError::InvalidOperator { offset, text } => {
            assert_eq!(offset, 0);
            assert_eq!(text, "*");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(
        compile_err("a**"),
        CompileError::InvalidOperator { offset: 2, .. }
    ));
    assert!(matches!(
        compile_err("a||b"),
        CompileError::InvalidOperator { offset: 2, .. }
    ));
}

#[test]
fn reports_unexpected_end() {
    assert_eq!(
        compile_err("a|"),
        CompileError::UnexpectedEndOfExpression { offset: 2 }
    );
    assert_eq!(
        compile_err("()"),
        CompileError::UnexpectedEndOfExpression { offset: 1 }
    );
}

#[test]
fn rejects_degenerate_character_ranges() {
    for source in ["[]", "[z-a]", "[^]"] {
        match compile_err(source) {
            CompileError::InvalidToken { offset, text } => {
                assert_eq!(offset, 0);
                assert_eq!(text, source);
            }
            other => panic!("unexpected error for {source}: {other:?}"),
        }
    }
}

#[test]
fn invalid_tokens_from_callers_are_rejected() {
    let tokens = [Token::new("#", 0, TokenKind::Invalid)];
    assert_eq!(
        emit(&tokens),
        Err(CompileError::InvalidToken {
            offset: 0,
            text: "#".to_string()
        })
    );
}

#[test]
fn emit_accepts_lexer_output() {
    let tokens = lex("ab").expect("pattern should lex");
    let bytecode = emit(&tokens).expect("tokens should compile");
    let pattern = compile("ab", CompileFlags::empty()).expect("pattern should compile");
    assert_eq!(bytecode.as_slice(), pattern.bytecode());
}

#[test]
fn emit_stops_nested_repetition_at_default_limit() {
    let depth = 30;
    let source = format!("{}a{}", "(".repeat(depth), ")+".repeat(depth));
    let tokens = lex(&source).expect("pattern should lex");

    match emit(&tokens).expect_err("nested repetition should exceed the program limit") {
        CompileError::ResourceLimit {
            resource, limit, ..
        } => {
            assert_eq!(resource, "bytecode");
            assert_eq!(limit, DEFAULT_MAX_PROGRAM_LEN);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn enforces_group_limit() {
    let source = "(a)".repeat(MAX_GROUPS + 1);
    match compile_err(&source) {
        CompileError::ResourceLimit {
            resource,
            requested,
            limit,
        } => {
            assert_eq!(resource, "groups");
            assert_eq!(requested, MAX_GROUPS + 1);
            assert_eq!(limit, MAX_GROUPS);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn enforces_configured_limits() {
    let options = CompileOptions::builder()
        .max_pattern_len(4)
        .build()
        .expect("options should build");
    assert_eq!(
        compile_with("abcdef", &options),
        Err(CompileError::PatternTooLong { len: 6, limit: 4 })
    );

    let options = CompileOptions::builder()
        .max_program_len(16)
        .build()
        .expect("options should build");
    let err = compile_with("abcdefgh", &options).expect_err("program should be too large");
    assert_eq!(err.code(), PatternErrorCode::ResourceExhausted);
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(
        compile_err("(ab").code(),
        PatternErrorCode::MismatchedParentheses
    );
    assert_eq!(compile_err("(ab").code().as_u16(), 3);
    assert_eq!(
        compile_err("[az").code().name(),
        "UnclosedCharacterRange"
    );
    assert_eq!(
        compile_err("a$").code(),
        PatternErrorCode::UnexpectedCharacter
    );
    assert_eq!(
        compile_err("a)b").code(),
        PatternErrorCode::MismatchedParentheses
    );
}
