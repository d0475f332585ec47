use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use crate::filters::{self, FilterError};
use crate::model::Object;
use crate::parser::Parser;

const STARTXREF_WINDOW: usize = 1024;
const MAX_PREV_CHAIN: usize = 32;
const MAX_RESOLVE_DEPTH: usize = 32;
const MAX_PAGE_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    Free,
    InUse { offset: usize, r#gen: u16 },
    Compressed { stream_obj: u32, index: usize },
}

#[derive(Debug)]
pub enum LoadError {
    NotAPdf,
    MalformedXref(String),
    MalformedInput(String),
    Filter(FilterError),
    Io(std::io::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NotAPdf => write!(f, "not a PDF file"),
            LoadError::MalformedXref(msg) => write!(f, "malformed xref: {}", msg),
            LoadError::MalformedInput(msg) => write!(f, "malformed input: {}", msg),
            LoadError::Filter(err) => write!(f, "stream filter: {}", err),
            LoadError::Io(err) => write!(f, "reading file: {}", err),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Filter(err) => Some(err),
            LoadError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FilterError> for LoadError {
    fn from(err: FilterError) -> Self {
        LoadError::Filter(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    pub width: f64,
    pub height: f64,
    pub rotation: i32,
}

/// A loaded PDF document.
///
/// Owns the file bytes, the xref map, and the trailer; indirect objects are
/// resolved lazily into an interior cache, so a `Document` is read-only
/// after construction and safe to move between threads but not to share.
pub struct Document {
    data: Vec<u8>,
    version: String,
    xref: HashMap<u32, XRefEntry>,
    trailer: HashMap<String, Object>,
    cache: RefCell<HashMap<u32, Object>>,
}

impl Document {
    pub fn open(path: impl AsRef<Path>) -> Result<Document, LoadError> {
        let data = std::fs::read(path).map_err(LoadError::Io)?;
        Document::load(data)
    }

    pub fn load(data: Vec<u8>) -> Result<Document, LoadError> {
        if !data.starts_with(b"%PDF-") {
            return Err(LoadError::NotAPdf);
        }
        let version = read_version(&data);

        let mut xref = HashMap::new();
        let mut trailer = HashMap::new();
        let mut seen = HashSet::new();
        let mut next = Some(find_startxref(&data)?);
        while let Some(offset) = next {
            // Revisiting an offset means the Prev chain loops; stop there.
            if seen.len() >= MAX_PREV_CHAIN || !seen.insert(offset) {
                break;
            }
            next = load_xref_section(&data, offset, &mut xref, &mut trailer)?;
        }
        if !trailer.contains_key("Root") {
            return Err(LoadError::MalformedXref("trailer has no /Root".to_string()));
        }

        Ok(Document {
            data,
            version,
            xref,
            trailer,
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// The version string from the header, e.g. `"1.7"`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn trailer(&self) -> &HashMap<String, Object> {
        &self.trailer
    }

    /// Resolves an indirect reference. Free, unknown, and damaged entries
    /// yield `Object::Null`; results are cached per object number.
    pub fn resolve_ref(&self, obj_num: u32, _gen_num: u16) -> Object {
        self.resolve_ref_bounded(obj_num, 0)
    }

    /// Follows a reference, or returns the object itself when it is not one.
    pub fn resolve(&self, obj: &Object) -> Object {
        match obj {
            Object::Reference { obj_num, gen_num } => self.resolve_ref(*obj_num, *gen_num),
            other => other.clone(),
        }
    }

    fn resolve_ref_bounded(&self, obj_num: u32, depth: usize) -> Object {
        if depth >= MAX_RESOLVE_DEPTH {
            return Object::Null;
        }
        if let Some(cached) = self.cache.borrow().get(&obj_num) {
            return cached.clone();
        }
        let resolved = match self.xref.get(&obj_num) {
            None | Some(XRefEntry::Free) => Object::Null,
            Some(XRefEntry::InUse { offset, .. }) => self
                .parse_object_at(*offset, depth)
                .unwrap_or(Object::Null),
            Some(XRefEntry::Compressed { stream_obj, index }) => self
                .parse_compressed(obj_num, *stream_obj, *index, depth)
                .unwrap_or(Object::Null),
        };
        self.cache.borrow_mut().insert(obj_num, resolved.clone());
        resolved
    }

    /// Parses `N G obj <object>` at a byte offset. A stream whose `/Length`
    /// is an indirect reference is re-parsed once the length is known.
    fn parse_object_at(&self, offset: usize, depth: usize) -> Option<Object> {
        if offset >= self.data.len() {
            return None;
        }
        let mut parser = Parser::at(&self.data, offset);
        parser.accept_integer()?;
        parser.accept_integer()?;
        if !parser.accept_keyword("obj") {
            return None;
        }
        let obj = parser.parse_object();

        if let Object::Stream { dict, .. } = &obj
            && let Some((len_num, _)) = dict.get("Length").and_then(|v| v.as_reference())
        {
            let length = self
                .resolve_ref_bounded(len_num, depth + 1)
                .as_i64()
                .filter(|v| *v >= 0);
            if let Some(length) = length {
                let mut reparser = Parser::at(&self.data, offset);
                reparser.accept_integer()?;
                reparser.accept_integer()?;
                if !reparser.accept_keyword("obj") {
                    return None;
                }
                reparser.set_length_hint(length as usize);
                return Some(reparser.parse_object());
            }
        }
        Some(obj)
    }

    /// Extracts one object from a compressed object stream. The container
    /// header is `N` pairs of `objId offsetInBody`; when the target id is
    /// missing, the pair at the xref index is used, then the raw index.
    fn parse_compressed(
        &self,
        target: u32,
        stream_obj: u32,
        index: usize,
        depth: usize,
    ) -> Option<Object> {
        let container = self.resolve_ref_bounded(stream_obj, depth + 1);
        let Object::Stream { dict, data } = container else {
            return None;
        };
        let decoded = filters::decompress(&dict, &data).ok()?;
        let n = dict.get("N").and_then(|v| v.as_i64()).unwrap_or(0).max(0) as usize;
        let first = dict.get("First").and_then(|v| v.as_i64()).unwrap_or(0).max(0) as usize;

        let mut header = Parser::at(&decoded, 0);
        let mut entries = Vec::with_capacity(n);
        for _ in 0..n {
            let Some(id) = header.accept_integer() else {
                break;
            };
            let Some(off) = header.accept_integer() else {
                break;
            };
            entries.push((id.max(0) as u32, off.max(0) as usize));
        }

        let offset_in_body = entries
            .iter()
            .find(|(id, _)| *id == target)
            .map(|(_, off)| *off)
            .or_else(|| entries.get(index).map(|(_, off)| *off))
            .unwrap_or(index);
        let pos = first.checked_add(offset_in_body)?;
        if pos >= decoded.len() {
            return None;
        }
        Some(Parser::at(&decoded, pos).parse_object())
    }

    /// All leaf page dictionaries in document order, with `/Resources`,
    /// `/MediaBox`, and `/Rotate` inherited from ancestor nodes.
    pub fn pages(&self) -> Vec<Object> {
        let mut pages = Vec::new();
        let Some(root) = self.trailer.get("Root").map(|r| self.resolve(r)) else {
            return pages;
        };
        let Some(pages_ref) = root.as_dict().and_then(|d| d.get("Pages")) else {
            return pages;
        };
        let pages_root = self.resolve(pages_ref);
        let mut visited = HashSet::new();
        self.walk_page_tree(&pages_root, Inherited::default(), &mut visited, 0, &mut pages);
        pages
    }

    fn walk_page_tree(
        &self,
        node: &Object,
        inherited: Inherited,
        visited: &mut HashSet<u32>,
        depth: usize,
        out: &mut Vec<Object>,
    ) {
        if depth > MAX_PAGE_TREE_DEPTH {
            return;
        }
        let Some(dict) = node.as_dict() else {
            return;
        };
        let inherited = Inherited {
            resources: dict
                .get("Resources")
                .map(|r| self.resolve(r))
                .or(inherited.resources),
            media_box: dict
                .get("MediaBox")
                .map(|b| self.resolve(b))
                .or(inherited.media_box),
            rotate: dict
                .get("Rotate")
                .map(|r| self.resolve(r))
                .or(inherited.rotate),
        };

        if dict.get("Type").and_then(|v| v.as_name()) == Some("Page") {
            let mut page = dict.clone();
            if let Some(resources) = inherited.resources {
                page.entry("Resources".to_string()).or_insert(resources);
            }
            if let Some(media_box) = inherited.media_box {
                page.entry("MediaBox".to_string()).or_insert(media_box);
            }
            if let Some(rotate) = inherited.rotate {
                page.entry("Rotate".to_string()).or_insert(rotate);
            }
            out.push(Object::Dictionary(page));
            return;
        }

        let Some(kids) = dict.get("Kids").map(|k| self.resolve(k)) else {
            return;
        };
        let Some(kids) = kids.as_array() else {
            return;
        };
        for kid in kids {
            if let Some((num, _)) = kid.as_reference()
                && !visited.insert(num)
            {
                continue;
            }
            let child = self.resolve(kid);
            self.walk_page_tree(&child, inherited.clone(), visited, depth + 1, out);
        }
    }

    pub fn page_info(&self, page: &Object) -> PageInfo {
        let mut info = PageInfo {
            width: 0.0,
            height: 0.0,
            rotation: 0,
        };
        let Some(dict) = page.as_dict() else {
            return info;
        };
        if let Some(media_box) = dict.get("MediaBox").map(|b| self.resolve(b))
            && let Some(values) = media_box.as_array()
            && values.len() >= 4
        {
            let corner = |i: usize| self.resolve(&values[i]).as_f64().unwrap_or(0.0);
            info.width = corner(2) - corner(0);
            info.height = corner(3) - corner(1);
        }
        info.rotation =
            normalized_rotation(dict.get("Rotate").map(|r| self.resolve(r)).as_ref());
        info
    }

    /// The page's decompressed content, with multiple `/Contents` streams
    /// joined by one space so operators cannot merge across boundaries.
    pub fn content_streams(&self, page: &Object) -> Vec<u8> {
        let mut out = Vec::new();
        let Some(contents) = page.as_dict().and_then(|d| d.get("Contents")) else {
            return out;
        };
        let contents = self.resolve(contents);
        let streams: Vec<Object> = match contents {
            Object::Array(items) => items.iter().map(|o| self.resolve(o)).collect(),
            other => vec![other],
        };
        for stream in streams {
            let Object::Stream { dict, data } = stream else {
                continue;
            };
            let Ok(decoded) = filters::decompress(&dict, &data) else {
                continue;
            };
            if !out.is_empty() {
                out.push(b' ');
            }
            out.extend_from_slice(&decoded);
        }
        out
    }

    /// Resolved font objects for a page, keyed by resource name.
    pub fn page_fonts(&self, page: &Object) -> HashMap<String, Object> {
        let mut fonts = HashMap::new();
        let Some(resources) = page.as_dict().and_then(|d| d.get("Resources")) else {
            return fonts;
        };
        let resources = self.resolve(resources);
        let Some(font_dict) = resources.as_dict().and_then(|d| d.get("Font")) else {
            return fonts;
        };
        let font_dict = self.resolve(font_dict);
        let Some(font_dict) = font_dict.as_dict() else {
            return fonts;
        };
        for (name, value) in font_dict {
            let resolved = self.resolve(value);
            if !resolved.is_null() {
                fonts.insert(name.clone(), resolved);
            }
        }
        fonts
    }

    /// Resolves and decompresses a stream object, if it is one.
    pub(crate) fn decode_stream(&self, obj: &Object) -> Option<Vec<u8>> {
        let Object::Stream { dict, data } = self.resolve(obj) else {
            return None;
        };
        filters::decompress(&dict, &data).ok()
    }
}

#[derive(Clone, Default)]
struct Inherited {
    resources: Option<Object>,
    media_box: Option<Object>,
    rotate: Option<Object>,
}

fn read_version(data: &[u8]) -> String {
    let rest = &data[b"%PDF-".len()..];
    let end = rest
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(rest.len().min(16));
    String::from_utf8_lossy(&rest[..end.min(16)]).trim().to_string()
}

fn find_startxref(data: &[u8]) -> Result<usize, LoadError> {
    let window_start = data.len().saturating_sub(STARTXREF_WINDOW);
    let found = memchr::memmem::rfind(&data[window_start..], b"startxref")
        .ok_or_else(|| LoadError::MalformedXref("startxref not found".to_string()))?;
    let mut pos = window_start + found + b"startxref".len();
    while pos < data.len() && data[pos].is_ascii_whitespace() {
        pos += 1;
    }
    let digits_start = pos;
    while pos < data.len() && data[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos == digits_start {
        return Err(LoadError::MalformedXref("invalid startxref value".to_string()));
    }
    std::str::from_utf8(&data[digits_start..pos])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| LoadError::MalformedXref("invalid startxref value".to_string()))
}

/// Loads one xref section (classical table or xref stream) and returns the
/// `/Prev` offset of the next-older section, if any.
fn load_xref_section(
    data: &[u8],
    offset: usize,
    xref: &mut HashMap<u32, XRefEntry>,
    trailer: &mut HashMap<String, Object>,
) -> Result<Option<usize>, LoadError> {
    if offset >= data.len() {
        return Err(LoadError::MalformedXref(format!(
            "xref offset {} out of bounds",
            offset
        )));
    }
    let mut parser = Parser::at(data, offset);
    if parser.accept_keyword("xref") {
        load_xref_table(parser, xref, trailer)
    } else {
        load_xref_stream(parser, xref, trailer)
    }
}

fn load_xref_table(
    mut parser: Parser<'_>,
    xref: &mut HashMap<u32, XRefEntry>,
    trailer: &mut HashMap<String, Object>,
) -> Result<Option<usize>, LoadError> {
    loop {
        if parser.accept_keyword("trailer") {
            break;
        }
        let Some(first) = parser.accept_integer() else {
            return Err(LoadError::MalformedXref(
                "xref subsection header expected".to_string(),
            ));
        };
        let Some(count) = parser.accept_integer() else {
            return Err(LoadError::MalformedXref(
                "xref subsection count expected".to_string(),
            ));
        };
        for i in 0..count.max(0) {
            let Some(offset) = parser.accept_integer() else {
                return Err(LoadError::MalformedXref("truncated xref entry".to_string()));
            };
            let Some(r#gen) = parser.accept_integer() else {
                return Err(LoadError::MalformedXref("truncated xref entry".to_string()));
            };
            let in_use = if parser.accept_keyword("n") {
                true
            } else if parser.accept_keyword("f") {
                false
            } else {
                return Err(LoadError::MalformedXref(
                    "xref entry type expected".to_string(),
                ));
            };
            let id = (first + i).max(0) as u32;
            // Newer sections were read earlier; never overwrite them.
            xref.entry(id).or_insert(if in_use {
                XRefEntry::InUse {
                    offset: offset.max(0) as usize,
                    r#gen: r#gen.clamp(0, u16::MAX as i64) as u16,
                }
            } else {
                XRefEntry::Free
            });
        }
    }

    let Object::Dictionary(dict) = parser.parse_object() else {
        return Err(LoadError::MalformedXref(
            "trailer dictionary expected".to_string(),
        ));
    };
    let prev = prev_offset(&dict);
    if trailer.is_empty() {
        *trailer = dict;
    }
    Ok(prev)
}

fn load_xref_stream(
    mut parser: Parser<'_>,
    xref: &mut HashMap<u32, XRefEntry>,
    trailer: &mut HashMap<String, Object>,
) -> Result<Option<usize>, LoadError> {
    if parser.accept_integer().is_none()
        || parser.accept_integer().is_none()
        || !parser.accept_keyword("obj")
    {
        return Err(LoadError::MalformedInput(
            "indirect object header expected at xref offset".to_string(),
        ));
    }
    let Object::Stream { dict, data } = parser.parse_object() else {
        return Err(LoadError::MalformedXref(
            "object at xref offset is not a stream".to_string(),
        ));
    };
    let decoded = filters::decompress(&dict, &data)?;

    let widths: Vec<usize> = dict
        .get("W")
        .and_then(|w| w.as_array())
        .ok_or_else(|| LoadError::MalformedXref("xref stream missing /W".to_string()))?
        .iter()
        .map(|v| v.as_i64().unwrap_or(0).max(0) as usize)
        .collect();
    if widths.len() < 3 {
        return Err(LoadError::MalformedXref("xref stream /W too short".to_string()));
    }
    let (w1, w2, w3) = (widths[0], widths[1], widths[2]);
    let entry_size = w1 + w2 + w3;
    if entry_size == 0 {
        return Err(LoadError::MalformedXref(
            "xref stream has zero entry size".to_string(),
        ));
    }

    let size = dict.get("Size").and_then(|v| v.as_i64()).unwrap_or(0).max(0);
    let mut subsections: Vec<(i64, i64)> = Vec::new();
    if let Some(index) = dict.get("Index").and_then(|v| v.as_array()) {
        for pair in index.chunks(2) {
            if let [first, count] = pair {
                subsections.push((
                    first.as_i64().unwrap_or(0),
                    count.as_i64().unwrap_or(0),
                ));
            }
        }
    } else {
        subsections.push((0, size));
    }

    let mut cursor = 0usize;
    for (first, count) in subsections {
        for i in 0..count.max(0) {
            if cursor + entry_size > decoded.len() {
                break;
            }
            // A zero-width type field defaults the entry type to 1.
            let entry_type = if w1 == 0 {
                1
            } else {
                read_big_endian(&decoded[cursor..cursor + w1])
            };
            let field2 = read_big_endian(&decoded[cursor + w1..cursor + w1 + w2]);
            let field3 = read_big_endian(&decoded[cursor + w1 + w2..cursor + entry_size]);
            cursor += entry_size;

            let id = (first + i).max(0) as u32;
            if xref.contains_key(&id) {
                continue;
            }
            match entry_type {
                0 => {
                    xref.insert(id, XRefEntry::Free);
                }
                1 => {
                    xref.insert(
                        id,
                        XRefEntry::InUse {
                            offset: field2 as usize,
                            r#gen: field3.min(u16::MAX as u64) as u16,
                        },
                    );
                }
                2 => {
                    xref.insert(
                        id,
                        XRefEntry::Compressed {
                            stream_obj: field2.min(u32::MAX as u64) as u32,
                            index: field3 as usize,
                        },
                    );
                }
                _ => {}
            }
        }
    }

    let prev = prev_offset(&dict);
    if trailer.is_empty() {
        *trailer = dict;
    }
    Ok(prev)
}

fn prev_offset(dict: &HashMap<String, Object>) -> Option<usize> {
    dict.get("Prev")
        .and_then(|v| v.as_i64())
        .filter(|v| *v > 0)
        .map(|v| v as usize)
}

fn read_big_endian(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

fn normalized_rotation(rotation: Option<&Object>) -> i32 {
    let raw = rotation
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|n| n.round() as i64)))
        .unwrap_or(0);
    match raw.rem_euclid(360) {
        90 => 90,
        180 => 180,
        270 => 270,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_required() {
        assert!(matches!(
            Document::load(b"not a pdf".to_vec()),
            Err(LoadError::NotAPdf)
        ));
    }

    #[test]
    fn version_is_read_up_to_line_end() {
        assert_eq!(read_version(b"%PDF-1.7\nrest"), "1.7");
        assert_eq!(read_version(b"%PDF-2.0\r\nrest"), "2.0");
    }

    #[test]
    fn startxref_must_exist() {
        assert!(matches!(
            Document::load(b"%PDF-1.4\nno xref here\n%%EOF".to_vec()),
            Err(LoadError::MalformedXref(_))
        ));
    }

    #[test]
    fn startxref_offset_is_parsed_from_tail() {
        let data = b"%PDF-1.4\njunk\nstartxref\n42\n%%EOF";
        assert_eq!(find_startxref(data).expect("offset"), 42);
    }

    #[test]
    fn last_startxref_wins() {
        let data = b"%PDF-1.4\nstartxref\n10\n%%EOF\nstartxref\n99\n%%EOF";
        assert_eq!(find_startxref(data).expect("offset"), 99);
    }

    #[test]
    fn rotation_is_normalized() {
        assert_eq!(normalized_rotation(Some(&Object::Integer(90))), 90);
        assert_eq!(normalized_rotation(Some(&Object::Integer(-90))), 270);
        assert_eq!(normalized_rotation(Some(&Object::Integer(450))), 90);
        assert_eq!(normalized_rotation(Some(&Object::Integer(45))), 0);
        assert_eq!(normalized_rotation(None), 0);
    }

    #[test]
    fn big_endian_fields() {
        assert_eq!(read_big_endian(&[0x01, 0x00]), 256);
        assert_eq!(read_big_endian(&[]), 0);
    }
}
