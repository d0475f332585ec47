use std::collections::HashMap;

use crate::document::Document;
use crate::model::Object;

/// Decodes glyph codes from PDF text strings into UTF-8.
///
/// Priority, highest first: ToUnicode CMap, `/Encoding` (named table or
/// `/Differences`), the built-in table. Simple fonts read one byte per
/// glyph; composite (`/Type0`) fonts try multi-byte codes first.
pub struct FontEncoding {
    table: [char; 256],
    cmap: HashMap<u32, String>,
    simple: bool,
}

impl FontEncoding {
    pub fn build(doc: &Document, font_obj: &Object) -> FontEncoding {
        let mut enc = FontEncoding {
            table: identity_table(),
            cmap: HashMap::new(),
            simple: true,
        };

        let Some(dict) = font_obj.as_dict() else {
            return enc;
        };
        let subtype = dict.get("Subtype").and_then(|v| v.as_name()).unwrap_or("");

        match dict.get("Encoding") {
            Some(encoding) => match doc.resolve(encoding) {
                Object::Name(name) => enc.apply_named_encoding(&name),
                Object::Dictionary(enc_dict) => {
                    if let Some(base) = enc_dict.get("BaseEncoding").and_then(|v| v.as_name()) {
                        enc.apply_named_encoding(base);
                    }
                    if let Some(diffs) = enc_dict.get("Differences").map(|d| doc.resolve(d))
                        && let Some(diffs) = diffs.as_array()
                    {
                        enc.apply_differences(doc, diffs);
                    }
                }
                _ => {}
            },
            None => match subtype {
                "Type1" | "MMType1" => enc.apply_named_encoding("StandardEncoding"),
                _ => enc.apply_named_encoding("WinAnsiEncoding"),
            },
        }

        if subtype == "Type0" {
            enc.simple = false;
        }

        if let Some(to_unicode) = dict.get("ToUnicode")
            && let Some(data) = doc.decode_stream(to_unicode)
        {
            enc.parse_to_unicode(&data);
        }

        enc
    }

    fn apply_named_encoding(&mut self, name: &str) {
        let table: &[u16; 128] = match name {
            "WinAnsiEncoding" => &WIN_ANSI_UPPER,
            "MacRomanEncoding" => &MAC_ROMAN_UPPER,
            "StandardEncoding" => &STANDARD_UPPER,
            "PDFDocEncoding" => &PDF_DOC_UPPER,
            _ => return,
        };
        for (i, &unit) in table.iter().enumerate() {
            if unit != 0
                && let Some(ch) = char::from_u32(unit as u32)
            {
                self.table[128 + i] = ch;
            }
        }
    }

    /// `/Differences`: an integer selects the next code, each following
    /// glyph name assigns that code and advances it.
    fn apply_differences(&mut self, doc: &Document, diffs: &[Object]) {
        let mut code: i64 = 0;
        for entry in diffs {
            match doc.resolve(entry) {
                Object::Integer(v) => code = v,
                Object::Name(name) => {
                    if (0..256).contains(&code)
                        && let Some(ch) = glyph_name_to_char(&name)
                    {
                        self.table[code as usize] = ch;
                    }
                    code += 1;
                }
                _ => {}
            }
        }
    }

    fn parse_to_unicode(&mut self, data: &[u8]) {
        let mut tokens = CMapTokens::new(data);
        while let Some(token) = tokens.next() {
            match token.as_str() {
                "beginbfchar" => self.parse_bf_chars(&mut tokens),
                "beginbfrange" => self.parse_bf_ranges(&mut tokens),
                _ => {}
            }
        }
    }

    fn parse_bf_chars(&mut self, tokens: &mut CMapTokens<'_>) {
        while let Some(token) = tokens.next() {
            if token == "endbfchar" {
                break;
            }
            let src = hex_token_bytes(&token);
            let dst = hex_token_bytes(&tokens.next().unwrap_or_default());
            if src.is_empty() {
                continue;
            }
            if let Some(text) = utf16be_to_string(&dst) {
                self.map_code(code_from_bytes(&src), text);
            }
        }
    }

    fn parse_bf_ranges(&mut self, tokens: &mut CMapTokens<'_>) {
        while let Some(token) = tokens.next() {
            if token == "endbfrange" {
                break;
            }
            let low = code_from_bytes(&hex_token_bytes(&token));
            let high = code_from_bytes(&hex_token_bytes(&tokens.next().unwrap_or_default()));
            let Some(dst) = tokens.next() else {
                break;
            };
            // A bogus range can span the whole u32 space; bound the work.
            if high.saturating_sub(low) > 0xFFFF {
                continue;
            }

            if dst == "[" {
                // One explicit destination per source code.
                let mut code = low;
                while let Some(item) = tokens.next() {
                    if item == "]" {
                        break;
                    }
                    if code <= high
                        && let Some(text) = utf16be_to_string(&hex_token_bytes(&item))
                    {
                        self.map_code(code, text);
                    }
                    code = code.saturating_add(1);
                }
            } else {
                // Single destination for srcLow; the final UTF-16 code unit
                // increments once per source code.
                let units = utf16be_units(&hex_token_bytes(&dst));
                if units.is_empty() {
                    continue;
                }
                for (delta, code) in (low..=high).enumerate() {
                    let mut stepped = units.clone();
                    let last = stepped.last_mut().expect("non-empty units");
                    let Some(bumped) = (*last as u32)
                        .checked_add(delta as u32)
                        .filter(|v| *v <= u16::MAX as u32)
                    else {
                        break;
                    };
                    *last = bumped as u16;
                    if let Ok(text) = String::from_utf16(&stepped) {
                        self.map_code(code, text);
                    }
                }
            }
        }
    }

    fn map_code(&mut self, code: u32, text: String) {
        if self.simple && code < 256 {
            if let Some(ch) = text.chars().next() {
                self.table[code as usize] = ch;
            }
        } else {
            self.cmap.insert(code, text);
        }
    }

    /// Decodes a text-string byte sequence to UTF-8.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::new();
        if self.simple {
            for &byte in bytes {
                self.push_simple(byte, &mut out);
            }
            return out;
        }

        let mut i = 0;
        while i < bytes.len() {
            if i + 1 < bytes.len() {
                let code = ((bytes[i] as u32) << 8) | bytes[i + 1] as u32;
                if let Some(text) = self.cmap.get(&code) {
                    out.push_str(text);
                    i += 2;
                    continue;
                }
            }
            if let Some(text) = self.cmap.get(&(bytes[i] as u32)) {
                out.push_str(text);
            } else {
                self.push_simple(bytes[i], &mut out);
            }
            i += 1;
        }
        out
    }

    fn push_simple(&self, byte: u8, out: &mut String) {
        let ch = self.table[byte as usize];
        if ch != '\0' {
            out.push(ch);
        }
    }
}

fn identity_table() -> [char; 256] {
    let mut table = ['\0'; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = char::from_u32(i as u32).expect("latin-1 range");
    }
    table
}

fn code_from_bytes(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn utf16be_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

fn utf16be_to_string(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    // Some CMaps write single-byte destinations.
    if bytes.len() == 1 {
        return char::from_u32(bytes[0] as u32).map(String::from);
    }
    if bytes.len() % 2 != 0 {
        return None;
    }
    String::from_utf16(&utf16be_units(bytes)).ok()
}

/// Whitespace-separated CMap tokens; `<...>` hex runs, `[`, and `]` are
/// single tokens.
struct CMapTokens<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> CMapTokens<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn next(&mut self) -> Option<String> {
        while self.pos < self.data.len() && self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= self.data.len() {
            return None;
        }
        let start = self.pos;
        match self.data[self.pos] {
            b'<' => {
                self.pos += 1;
                while self.pos < self.data.len() && self.data[self.pos] != b'>' {
                    self.pos += 1;
                }
                if self.pos < self.data.len() {
                    self.pos += 1;
                }
            }
            b'[' | b']' => self.pos += 1,
            _ => {
                while self.pos < self.data.len()
                    && !self.data[self.pos].is_ascii_whitespace()
                    && !matches!(self.data[self.pos], b'<' | b'[' | b']')
                {
                    self.pos += 1;
                }
            }
        }
        Some(String::from_utf8_lossy(&self.data[start..self.pos]).into_owned())
    }
}

fn hex_token_bytes(token: &str) -> Vec<u8> {
    let inner = token
        .trim()
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or("");
    let digits: Vec<u8> = inner
        .bytes()
        .filter(|b| b.is_ascii_hexdigit())
        .collect();
    digits
        .chunks_exact(2)
        .map(|pair| {
            let hi = hex_value(pair[0]);
            let lo = hex_value(pair[1]);
            (hi << 4) | lo
        })
        .collect()
}

fn hex_value(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        b'A'..=b'F' => byte - b'A' + 10,
        _ => 0,
    }
}

// Upper halves (codes 128-255) of the four named encodings; zero keeps the
// identity mapping.

const WIN_ANSI_UPPER: [u16; 128] = [
    0x20AC, 0x0000, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021,
    0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0x0000, 0x017D, 0x0000,
    0x0000, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014,
    0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0x0000, 0x017E, 0x0178,
    0x00A0, 0x00A1, 0x00A2, 0x00A3, 0x00A4, 0x00A5, 0x00A6, 0x00A7,
    0x00A8, 0x00A9, 0x00AA, 0x00AB, 0x00AC, 0x00AD, 0x00AE, 0x00AF,
    0x00B0, 0x00B1, 0x00B2, 0x00B3, 0x00B4, 0x00B5, 0x00B6, 0x00B7,
    0x00B8, 0x00B9, 0x00BA, 0x00BB, 0x00BC, 0x00BD, 0x00BE, 0x00BF,
    0x00C0, 0x00C1, 0x00C2, 0x00C3, 0x00C4, 0x00C5, 0x00C6, 0x00C7,
    0x00C8, 0x00C9, 0x00CA, 0x00CB, 0x00CC, 0x00CD, 0x00CE, 0x00CF,
    0x00D0, 0x00D1, 0x00D2, 0x00D3, 0x00D4, 0x00D5, 0x00D6, 0x00D7,
    0x00D8, 0x00D9, 0x00DA, 0x00DB, 0x00DC, 0x00DD, 0x00DE, 0x00DF,
    0x00E0, 0x00E1, 0x00E2, 0x00E3, 0x00E4, 0x00E5, 0x00E6, 0x00E7,
    0x00E8, 0x00E9, 0x00EA, 0x00EB, 0x00EC, 0x00ED, 0x00EE, 0x00EF,
    0x00F0, 0x00F1, 0x00F2, 0x00F3, 0x00F4, 0x00F5, 0x00F6, 0x00F7,
    0x00F8, 0x00F9, 0x00FA, 0x00FB, 0x00FC, 0x00FD, 0x00FE, 0x00FF,
];

const MAC_ROMAN_UPPER: [u16; 128] = [
    0x00C4, 0x00C5, 0x00C7, 0x00C9, 0x00D1, 0x00D6, 0x00DC, 0x00E1,
    0x00E0, 0x00E2, 0x00E4, 0x00E3, 0x00E5, 0x00E7, 0x00E9, 0x00E8,
    0x00EA, 0x00EB, 0x00ED, 0x00EC, 0x00EE, 0x00EF, 0x00F1, 0x00F3,
    0x00F2, 0x00F4, 0x00F6, 0x00F5, 0x00FA, 0x00F9, 0x00FB, 0x00FC,
    0x2020, 0x00B0, 0x00A2, 0x00A3, 0x00A7, 0x2022, 0x00B6, 0x00DF,
    0x00AE, 0x00A9, 0x2122, 0x00B4, 0x00A8, 0x2260, 0x00C6, 0x00D8,
    0x221E, 0x00B1, 0x2264, 0x2265, 0x00A5, 0x00B5, 0x2202, 0x2211,
    0x220F, 0x03C0, 0x222B, 0x00AA, 0x00BA, 0x03A9, 0x00E6, 0x00F8,
    0x00BF, 0x00A1, 0x00AC, 0x221A, 0x0192, 0x2248, 0x2206, 0x00AB,
    0x00BB, 0x2026, 0x00A0, 0x00C0, 0x00C3, 0x00D5, 0x0152, 0x0153,
    0x2013, 0x2014, 0x201C, 0x201D, 0x2018, 0x2019, 0x00F7, 0x25CA,
    0x00FF, 0x0178, 0x2044, 0x20AC, 0x2039, 0x203A, 0xFB01, 0xFB02,
    0x2021, 0x00B7, 0x201A, 0x201E, 0x2030, 0x00C2, 0x00CA, 0x00C1,
    0x00CB, 0x00C8, 0x00CD, 0x00CE, 0x00CF, 0x00CC, 0x00D3, 0x00D4,
    0xF8FF, 0x00D2, 0x00DA, 0x00DB, 0x00D9, 0x0131, 0x02C6, 0x02DC,
    0x00AF, 0x02D8, 0x02D9, 0x02DA, 0x00B8, 0x02DD, 0x02DB, 0x02C7,
];

const STANDARD_UPPER: [u16; 128] = [
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x00A1, 0x00A2, 0x00A3, 0x2044, 0x00A5, 0x0192, 0x00A7,
    0x00A4, 0x0027, 0x201C, 0x00AB, 0x2039, 0x203A, 0xFB01, 0xFB02,
    0x0000, 0x2013, 0x2020, 0x2021, 0x00B7, 0x0000, 0x00B6, 0x2022,
    0x201A, 0x201E, 0x201D, 0x00BB, 0x2026, 0x2030, 0x0000, 0x00BF,
    0x0000, 0x0060, 0x00B4, 0x02C6, 0x02DC, 0x00AF, 0x02D8, 0x02D9,
    0x00A8, 0x0000, 0x02DA, 0x00B8, 0x0000, 0x02DD, 0x02DB, 0x02C7,
    0x2014, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x00C6, 0x0000, 0x00AA, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0141, 0x00D8, 0x0152, 0x00BA, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x00E6, 0x0000, 0x0000, 0x0000, 0x0131, 0x0000, 0x0000,
    0x0142, 0x00F8, 0x0153, 0x00DF, 0x0000, 0x0000, 0x0000, 0x0000,
];

const PDF_DOC_UPPER: [u16; 128] = [
    0x02D8, 0x02C7, 0x02C6, 0x02D9, 0x02DD, 0x02DB, 0x02DA, 0x02DC,
    0x2013, 0x2014, 0x2018, 0x2019, 0x201C, 0x201D, 0x2039, 0x203A,
    0x2026, 0x2030, 0x2020, 0x2021, 0x2022, 0x2122, 0x0192, 0x2044,
    0x2212, 0xFB01, 0xFB02, 0x0141, 0x0152, 0x0160, 0x0178, 0x017D,
    0x00A0, 0x00A1, 0x00A2, 0x00A3, 0x00A4, 0x00A5, 0x00A6, 0x00A7,
    0x00A8, 0x00A9, 0x00AA, 0x00AB, 0x00AC, 0x00AD, 0x00AE, 0x00AF,
    0x00B0, 0x00B1, 0x00B2, 0x00B3, 0x00B4, 0x00B5, 0x00B6, 0x00B7,
    0x00B8, 0x00B9, 0x00BA, 0x00BB, 0x00BC, 0x00BD, 0x00BE, 0x00BF,
    0x00C0, 0x00C1, 0x00C2, 0x00C3, 0x00C4, 0x00C5, 0x00C6, 0x00C7,
    0x00C8, 0x00C9, 0x00CA, 0x00CB, 0x00CC, 0x00CD, 0x00CE, 0x00CF,
    0x00D0, 0x00D1, 0x00D2, 0x00D3, 0x00D4, 0x00D5, 0x00D6, 0x00D7,
    0x00D8, 0x00D9, 0x00DA, 0x00DB, 0x00DC, 0x00DD, 0x00DE, 0x00DF,
    0x00E0, 0x00E1, 0x00E2, 0x00E3, 0x00E4, 0x00E5, 0x00E6, 0x00E7,
    0x00E8, 0x00E9, 0x00EA, 0x00EB, 0x00EC, 0x00ED, 0x00EE, 0x00EF,
    0x00F0, 0x00F1, 0x00F2, 0x00F3, 0x00F4, 0x00F5, 0x00F6, 0x00F7,
    0x00F8, 0x00F9, 0x00FA, 0x00FB, 0x00FC, 0x00FD, 0x00FE, 0x00FF,
];

/// Adobe Glyph List subset covering ASCII, Latin-1 letters, typographic
/// punctuation, ligatures, currency, and common diacritics.
fn glyph_name_to_char(name: &str) -> Option<char> {
    let code: u32 = match name {
        "A" => 0x0041, "B" => 0x0042, "C" => 0x0043, "D" => 0x0044, "E" => 0x0045,
        "F" => 0x0046, "G" => 0x0047, "H" => 0x0048, "I" => 0x0049, "J" => 0x004A,
        "K" => 0x004B, "L" => 0x004C, "M" => 0x004D, "N" => 0x004E, "O" => 0x004F,
        "P" => 0x0050, "Q" => 0x0051, "R" => 0x0052, "S" => 0x0053, "T" => 0x0054,
        "U" => 0x0055, "V" => 0x0056, "W" => 0x0057, "X" => 0x0058, "Y" => 0x0059,
        "Z" => 0x005A,
        "a" => 0x0061, "b" => 0x0062, "c" => 0x0063, "d" => 0x0064, "e" => 0x0065,
        "f" => 0x0066, "g" => 0x0067, "h" => 0x0068, "i" => 0x0069, "j" => 0x006A,
        "k" => 0x006B, "l" => 0x006C, "m" => 0x006D, "n" => 0x006E, "o" => 0x006F,
        "p" => 0x0070, "q" => 0x0071, "r" => 0x0072, "s" => 0x0073, "t" => 0x0074,
        "u" => 0x0075, "v" => 0x0076, "w" => 0x0077, "x" => 0x0078, "y" => 0x0079,
        "z" => 0x007A,
        "zero" => 0x0030, "one" => 0x0031, "two" => 0x0032, "three" => 0x0033,
        "four" => 0x0034, "five" => 0x0035, "six" => 0x0036, "seven" => 0x0037,
        "eight" => 0x0038, "nine" => 0x0039,
        "space" => 0x0020, "exclam" => 0x0021, "quotedbl" => 0x0022,
        "numbersign" => 0x0023, "dollar" => 0x0024, "percent" => 0x0025,
        "ampersand" => 0x0026, "quotesingle" => 0x0027, "parenleft" => 0x0028,
        "parenright" => 0x0029, "asterisk" => 0x002A, "plus" => 0x002B,
        "comma" => 0x002C, "hyphen" => 0x002D, "period" => 0x002E,
        "slash" => 0x002F, "colon" => 0x003A, "semicolon" => 0x003B,
        "less" => 0x003C, "equal" => 0x003D, "greater" => 0x003E,
        "question" => 0x003F, "at" => 0x0040, "bracketleft" => 0x005B,
        "backslash" => 0x005C, "bracketright" => 0x005D, "asciicircum" => 0x005E,
        "underscore" => 0x005F, "grave" => 0x0060, "braceleft" => 0x007B,
        "bar" => 0x007C, "braceright" => 0x007D, "asciitilde" => 0x007E,
        "Aacute" => 0x00C1, "Agrave" => 0x00C0, "Acircumflex" => 0x00C2,
        "Atilde" => 0x00C3, "Adieresis" => 0x00C4, "Aring" => 0x00C5,
        "AE" => 0x00C6, "Ccedilla" => 0x00C7, "Eacute" => 0x00C9,
        "Egrave" => 0x00C8, "Ecircumflex" => 0x00CA, "Edieresis" => 0x00CB,
        "Iacute" => 0x00CD, "Igrave" => 0x00CC, "Icircumflex" => 0x00CE,
        "Idieresis" => 0x00CF, "Eth" => 0x00D0, "Ntilde" => 0x00D1,
        "Oacute" => 0x00D3, "Ograve" => 0x00D2, "Ocircumflex" => 0x00D4,
        "Otilde" => 0x00D5, "Odieresis" => 0x00D6, "multiply" => 0x00D7,
        "Oslash" => 0x00D8, "Uacute" => 0x00DA, "Ugrave" => 0x00D9,
        "Ucircumflex" => 0x00DB, "Udieresis" => 0x00DC, "Yacute" => 0x00DD,
        "Thorn" => 0x00DE, "germandbls" => 0x00DF,
        "aacute" => 0x00E1, "agrave" => 0x00E0, "acircumflex" => 0x00E2,
        "atilde" => 0x00E3, "adieresis" => 0x00E4, "aring" => 0x00E5,
        "ae" => 0x00E6, "ccedilla" => 0x00E7, "eacute" => 0x00E9,
        "egrave" => 0x00E8, "ecircumflex" => 0x00EA, "edieresis" => 0x00EB,
        "iacute" => 0x00ED, "igrave" => 0x00EC, "icircumflex" => 0x00EE,
        "idieresis" => 0x00EF, "eth" => 0x00F0, "ntilde" => 0x00F1,
        "oacute" => 0x00F3, "ograve" => 0x00F2, "ocircumflex" => 0x00F4,
        "otilde" => 0x00F5, "odieresis" => 0x00F6, "divide" => 0x00F7,
        "oslash" => 0x00F8, "uacute" => 0x00FA, "ugrave" => 0x00F9,
        "ucircumflex" => 0x00FB, "udieresis" => 0x00FC, "yacute" => 0x00FD,
        "thorn" => 0x00FE, "ydieresis" => 0x00FF,
        "endash" => 0x2013, "emdash" => 0x2014, "quotesinglbase" => 0x201A,
        "quotedblbase" => 0x201E, "quotedblleft" => 0x201C,
        "quotedblright" => 0x201D, "quoteleft" => 0x2018, "quoteright" => 0x2019,
        "ellipsis" => 0x2026, "dagger" => 0x2020, "daggerdbl" => 0x2021,
        "bullet" => 0x2022, "perthousand" => 0x2030, "guilsinglleft" => 0x2039,
        "guilsinglright" => 0x203A, "guillemotleft" => 0x00AB,
        "guillemotright" => 0x00BB, "trademark" => 0x2122, "fi" => 0xFB01,
        "fl" => 0xFB02, "florin" => 0x0192, "fraction" => 0x2044,
        "Euro" => 0x20AC, "currency" => 0x00A4, "copyright" => 0x00A9,
        "registered" => 0x00AE, "degree" => 0x00B0, "plusminus" => 0x00B1,
        "mu" => 0x00B5, "paragraph" => 0x00B6, "periodcentered" => 0x00B7,
        "cedilla" => 0x00B8, "ordmasculine" => 0x00BA, "ordfeminine" => 0x00AA,
        "nobreakspace" => 0x00A0, "softhyphen" => 0x00AD, "OE" => 0x0152,
        "oe" => 0x0153, "Scaron" => 0x0160, "scaron" => 0x0161,
        "Zcaron" => 0x017D, "zcaron" => 0x017E, "Ydieresis" => 0x0178,
        "circumflex" => 0x02C6, "tilde" => 0x02DC, "macron" => 0x00AF,
        "breve" => 0x02D8, "dotaccent" => 0x02D9, "dieresis" => 0x00A8,
        "ring" => 0x02DA, "hungarumlaut" => 0x02DD, "ogonek" => 0x02DB,
        "caron" => 0x02C7, "Lslash" => 0x0141, "lslash" => 0x0142,
        "dotlessi" => 0x0131, "exclamdown" => 0x00A1, "questiondown" => 0x00BF,
        "cent" => 0x00A2, "sterling" => 0x00A3, "yen" => 0x00A5,
        "brokenbar" => 0x00A6, "section" => 0x00A7, "logicalnot" => 0x00AC,
        "onequarter" => 0x00BC, "onehalf" => 0x00BD, "threequarters" => 0x00BE,
        "onesuperior" => 0x00B9, "twosuperior" => 0x00B2,
        "threesuperior" => 0x00B3, "acute" => 0x00B4, "minus" => 0x2212,
        _ => return None,
    };
    char::from_u32(code)
}
