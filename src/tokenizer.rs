#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(Vec<u8>),
    HexString(Vec<u8>),
    Name(String),
    Keyword(String),

    DictStart,
    DictEnd,
    ArrayStart,
    ArrayEnd,
}

pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a [u8]) -> Scanner<'a> {
        Scanner { input, pos: 0 }
    }

    pub fn at(input: &'a [u8], pos: usize) -> Scanner<'a> {
        Scanner { input, pos }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;
    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

impl Scanner<'_> {
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn next_token(&mut self) -> Option<Token> {
        while self.pos < self.input.len() {
            self.skip_whitespace_and_comments();
            if self.pos >= self.input.len() {
                return None;
            }

            let byte = self.input[self.pos];
            self.pos += 1;
            match byte {
                b'[' => return Some(Token::ArrayStart),
                b']' => return Some(Token::ArrayEnd),
                b'<' if self.peek_byte() == Some(b'<') => {
                    self.pos += 1;
                    return Some(Token::DictStart);
                }
                b'>' if self.peek_byte() == Some(b'>') => {
                    self.pos += 1;
                    return Some(Token::DictEnd);
                }
                b'(' => return Some(Token::String(self.read_literal_string())),
                b'<' => return Some(Token::HexString(self.read_hex_string())),
                b'/' => return Some(Token::Name(self.read_name())),
                b'+' | b'-' | b'.' | b'0'..=b'9' => return Some(self.read_number(byte)),
                _ => {
                    if is_regular(byte) {
                        let word = self.read_word(byte);
                        return Some(word_to_token(word));
                    }
                }
            }
        }
        None
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Consumes exactly `length` payload bytes after the `stream` keyword,
    /// clamped to the end of input.
    pub fn consume_stream(&mut self, length: usize) -> Vec<u8> {
        self.skip_stream_linebreak();
        let start = self.pos;
        let end = start.saturating_add(length).min(self.input.len());
        self.pos = end;
        self.input[start..end].to_vec()
    }

    /// Consumes payload bytes up to (not including) the next `endstream`
    /// marker, or to the end of input when none exists.
    pub fn consume_stream_until_endstream(&mut self) -> Vec<u8> {
        self.skip_stream_linebreak();
        let start = self.pos;
        if let Some(found) = memchr::memmem::find(&self.input[start..], b"endstream") {
            let marker = start + found;
            self.pos = marker;
            return self.input[start..marker].to_vec();
        }
        self.pos = self.input.len();
        self.input[start..].to_vec()
    }

    /// Skips binary inline-image data between the `ID` and `EI` operators.
    /// A first pass requires whitespace before `EI`; damaged streams fall
    /// back to the first `EI` followed by whitespace or a delimiter.
    pub fn skip_inline_image_data(&mut self) {
        if self.pos >= self.input.len() {
            return;
        }

        // ID is followed by a single required whitespace byte.
        if self.input[self.pos] == b'\r' {
            self.pos += 1;
            if self.peek_byte() == Some(b'\n') {
                self.pos += 1;
            }
        } else if is_whitespace(self.input[self.pos]) {
            self.pos += 1;
        }

        let body = &self.input[self.pos..];
        for rel in memchr::memmem::find_iter(body, b"EI") {
            let before_ok = rel > 0 && is_whitespace(body[rel - 1]);
            let after = rel + 2;
            let after_ok = after >= body.len() || is_whitespace(body[after]) || is_delim(body[after]);
            if before_ok && after_ok {
                self.pos += after;
                return;
            }
        }
        for rel in memchr::memmem::find_iter(body, b"EI") {
            let after = rel + 2;
            if after >= body.len() || is_whitespace(body[after]) || is_delim(body[after]) {
                self.pos += after;
                return;
            }
        }
        self.pos = self.input.len();
    }

    fn skip_stream_linebreak(&mut self) {
        if self.peek_byte() == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek_byte() == Some(b'\n') {
            self.pos += 1;
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.input.len() && is_whitespace(self.input[self.pos]) {
                self.pos += 1;
            }
            if self.peek_byte() == Some(b'%') {
                while self.pos < self.input.len()
                    && self.input[self.pos] != b'\n'
                    && self.input[self.pos] != b'\r'
                {
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
    }

    fn read_literal_string(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut depth = 1;
        while self.pos < self.input.len() {
            let byte = self.input[self.pos];
            self.pos += 1;
            match byte {
                b'\\' => {
                    let Some(next) = self.peek_byte() else {
                        break;
                    };
                    self.pos += 1;
                    match next {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0C),
                        b'\\' => out.push(b'\\'),
                        b'(' => out.push(b'('),
                        b')' => out.push(b')'),
                        b'\r' => {
                            // Line continuation; \r\n counts as one break.
                            if self.peek_byte() == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut val = (next - b'0') as u16;
                            for _ in 0..2 {
                                match self.peek_byte() {
                                    Some(b @ b'0'..=b'7') => {
                                        self.pos += 1;
                                        val = (val << 3) | (b - b'0') as u16;
                                    }
                                    _ => break,
                                }
                            }
                            out.push((val & 0xFF) as u8);
                        }
                        other => out.push(other),
                    }
                }
                b'(' => {
                    depth += 1;
                    out.push(byte);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(byte);
                }
                _ => out.push(byte),
            }
        }
        out
    }

    fn read_hex_string(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut pending: Option<u8> = None;
        while self.pos < self.input.len() {
            let byte = self.input[self.pos];
            self.pos += 1;
            if byte == b'>' {
                break;
            }
            if is_whitespace(byte) {
                continue;
            }
            if let Some(nibble) = hex_nibble(byte) {
                match pending.take() {
                    Some(high) => out.push((high << 4) | nibble),
                    None => pending = Some(nibble),
                }
            }
        }
        // Odd trailing digit acts as the high nibble of a final byte.
        if let Some(high) = pending {
            out.push(high << 4);
        }
        out
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.input.len() {
            let byte = self.input[self.pos];
            if is_delim(byte) || is_whitespace(byte) {
                break;
            }
            self.pos += 1;
        }
        decode_name_escapes(&self.input[start..self.pos])
    }

    fn read_number(&mut self, first: u8) -> Token {
        let mut out = vec![first];
        while self.pos < self.input.len() {
            let byte = self.input[self.pos];
            if is_delim(byte) || is_whitespace(byte) {
                break;
            }
            out.push(byte);
            self.pos += 1;
        }
        let Ok(s) = std::str::from_utf8(&out) else {
            return Token::Null;
        };
        if s.contains('.') {
            match s.parse() {
                Ok(v) => Token::Real(v),
                Err(_) => Token::Null,
            }
        } else {
            match s.parse() {
                Ok(v) => Token::Integer(v),
                Err(_) => Token::Null,
            }
        }
    }

    fn read_word(&mut self, first: u8) -> String {
        let mut out = vec![first];
        while self.pos < self.input.len() {
            let byte = self.input[self.pos];
            if is_delim(byte) || is_whitespace(byte) {
                break;
            }
            out.push(byte);
            self.pos += 1;
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

/// Decodes `#XX` hex escapes inside a raw name token.
pub(crate) fn decode_name_escapes(raw: &[u8]) -> String {
    if !raw.contains(&b'#') {
        return String::from_utf8_lossy(raw).into_owned();
    }
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            if let (Some(hi), Some(lo)) = (hex_nibble(raw[i + 1]), hex_nibble(raw[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn word_to_token(word: String) -> Token {
    match word.as_str() {
        "true" => Token::Boolean(true),
        "false" => Token::Boolean(false),
        "null" => Token::Null,
        _ => Token::Keyword(word),
    }
}

pub(crate) fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b'\x00' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

pub(crate) fn is_delim(byte: u8) -> bool {
    matches!(
        byte,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn is_regular(byte: u8) -> bool {
    !(is_delim(byte) || is_whitespace(byte))
}

fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
