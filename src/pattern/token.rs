#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterEncoding {
    Single,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Alternate,
    Concatenate,
    ZeroOrMore,
    OneOrMore,
    ZeroOrOne,
}

impl OperatorKind {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'|' => Some(Self::Alternate),
            b'*' => Some(Self::ZeroOrMore),
            b'+' => Some(Self::OneOrMore),
            b'?' => Some(Self::ZeroOrOne),
            _ => None,
        }
    }

    pub fn is_quantifier(&self) -> bool {
        matches!(self, Self::ZeroOrMore | Self::OneOrMore | Self::ZeroOrOne)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Character(CharacterEncoding),
    CharacterRange,
    Operator(OperatorKind),
    GroupBegin,
    GroupEnd,
    Invalid,
}

// `text` is empty for an inserted concatenation and excludes the brackets of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'p> {
    pub text: &'p str,
    pub offset: usize,
    pub kind: TokenKind,
}

impl<'p> Token<'p> {
    pub fn new(text: &'p str, offset: usize, kind: TokenKind) -> Self {
        Self { text, offset, kind }
    }

    pub fn concatenation(offset: usize) -> Self {
        Self {
            text: "",
            offset,
            kind: TokenKind::Operator(OperatorKind::Concatenate),
        }
    }

    pub fn end(&self) -> usize {
        match self.kind {
            TokenKind::CharacterRange => self.offset + self.text.len() + 2,
            _ => self.offset + self.text.len(),
        }
    }

    pub fn display_text(&self) -> String {
        match self.kind {
            TokenKind::CharacterRange => format!("[{}]", self.text),
            TokenKind::Operator(OperatorKind::Concatenate) if self.text.is_empty() => {
                "<concat>".to_string()
            }
            _ => self.text.to_string(),
        }
    }
}
