use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassItem {
    pub lo: u8,
    pub hi: u8,
}

impl ClassItem {
    pub fn single(byte: u8) -> Self {
        Self { lo: byte, hi: byte }
    }

    pub fn is_single(&self) -> bool {
        self.lo == self.hi
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    pub negated: bool,
    pub items: SmallVec<[ClassItem; 4]>,
}

impl CharClass {
    // None for an empty body, a lone `^`, a reversed range or non-ASCII text
    pub fn parse(span: &str) -> Option<Self> {
        let mut bytes = span.as_bytes();
        let negated = bytes.first() == Some(&b'^');
        if negated {
            bytes = &bytes[1..];
        }

        if bytes.is_empty() || !bytes.is_ascii() {
            return None;
        }

        let mut items = SmallVec::new();
        let mut i = 0usize;
        while i < bytes.len() {
            let lo = bytes[i];
            // '-' is literal at either end of the class
            if i + 2 < bytes.len() && bytes[i + 1] == b'-' {
                let hi = bytes[i + 2];
                if lo > hi {
                    return None;
                }
                items.push(ClassItem { lo, hi });
                i += 3;
            } else {
                items.push(ClassItem::single(lo));
                i += 1;
            }
        }

        Some(Self { negated, items })
    }
}
