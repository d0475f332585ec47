use std::collections::HashMap;
use std::fmt;
use std::io::Read;

use crate::model::Object;

/// Cap on any filter stage's decompressed output (256 MiB).
pub const MAX_DECOMPRESSED_SIZE: usize = 256 * 1024 * 1024;

#[derive(Debug)]
pub enum FilterError {
    Unsupported(String),
    LimitExceeded,
    Invalid(String),
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::Unsupported(name) => write!(f, "unsupported filter: {}", name),
            FilterError::LimitExceeded => {
                write!(f, "decompressed data exceeds the 256 MiB limit")
            }
            FilterError::Invalid(msg) => write!(f, "invalid filter input: {}", msg),
        }
    }
}

impl std::error::Error for FilterError {}

/// Applies the stream's `/Filter` chain to its raw payload.
///
/// `/Filter` may be a single name or an array of names; `/DecodeParms`
/// parallels it. Image-domain filters and `Crypt` pass through unchanged.
pub fn decompress(
    dict: &HashMap<String, Object>,
    data: &[u8],
) -> Result<Vec<u8>, FilterError> {
    let Some(filter_obj) = dict.get("Filter") else {
        return Ok(data.to_vec());
    };

    let mut filters: Vec<&str> = Vec::new();
    let mut parms: Vec<Option<&HashMap<String, Object>>> = Vec::new();
    match filter_obj {
        Object::Name(name) => {
            filters.push(name);
            parms.push(dict.get("DecodeParms").and_then(|p| p.as_dict()));
        }
        Object::Array(items) => {
            for item in items {
                if let Object::Name(name) = item {
                    filters.push(name);
                }
            }
            if let Some(Object::Array(parm_items)) = dict.get("DecodeParms") {
                for item in parm_items {
                    parms.push(item.as_dict());
                }
            }
            while parms.len() < filters.len() {
                parms.push(None);
            }
        }
        _ => return Ok(data.to_vec()),
    }

    let mut current = data.to_vec();
    for (filter, parm) in filters.iter().zip(parms) {
        current = apply_filter(filter, parm, &current)?;
        if current.len() > MAX_DECOMPRESSED_SIZE {
            return Err(FilterError::LimitExceeded);
        }
    }
    Ok(current)
}

fn apply_filter(
    filter: &str,
    parms: Option<&HashMap<String, Object>>,
    data: &[u8],
) -> Result<Vec<u8>, FilterError> {
    match filter {
        "FlateDecode" | "Fl" => {
            let inflated = flate_decode(data)?;
            apply_predictor(parms, inflated)
        }
        "LZWDecode" | "LZW" => {
            let expanded = lzw_decode(data)?;
            apply_predictor(parms, expanded)
        }
        "ASCII85Decode" | "A85" => ascii85_decode(data),
        "ASCIIHexDecode" | "AHx" => ascii_hex_decode(data),
        "RunLengthDecode" | "RL" => run_length_decode(data),
        // Image payloads and identity crypt stay encoded for the caller.
        "DCTDecode" | "DCT" | "CCITTFaxDecode" | "CCF" | "JBIG2Decode" | "JPXDecode"
        | "Crypt" => Ok(data.to_vec()),
        other => Err(FilterError::Unsupported(other.to_string())),
    }
}

fn flate_decode(data: &[u8]) -> Result<Vec<u8>, FilterError> {
    let mut out = Vec::new();
    let mut decoder = flate2::read::ZlibDecoder::new(data).take(MAX_DECOMPRESSED_SIZE as u64 + 1);
    decoder
        .read_to_end(&mut out)
        .map_err(|err| FilterError::Invalid(format!("zlib: {}", err)))?;
    if out.len() > MAX_DECOMPRESSED_SIZE {
        return Err(FilterError::LimitExceeded);
    }
    Ok(out)
}

struct PredictorParams {
    predictor: i64,
    colors: i64,
    bits_per_component: i64,
    columns: i64,
}

impl PredictorParams {
    fn from_dict(parms: &HashMap<String, Object>) -> Self {
        let get = |key: &str, default: i64| {
            parms
                .get(key)
                .and_then(|v| v.as_i64())
                .filter(|v| (1..=1 << 24).contains(v))
                .unwrap_or(default)
        };
        Self {
            predictor: get("Predictor", 1),
            colors: get("Colors", 1),
            bits_per_component: get("BitsPerComponent", 8),
            columns: get("Columns", 1),
        }
    }

    fn row_bytes(&self) -> usize {
        ((self.columns * self.colors * self.bits_per_component + 7) / 8) as usize
    }

    fn bytes_per_pixel(&self) -> usize {
        (((self.colors * self.bits_per_component) + 7) / 8).max(1) as usize
    }
}

fn apply_predictor(
    parms: Option<&HashMap<String, Object>>,
    data: Vec<u8>,
) -> Result<Vec<u8>, FilterError> {
    let Some(parms) = parms else {
        return Ok(data);
    };
    let params = PredictorParams::from_dict(parms);
    match params.predictor {
        2 => Ok(tiff_predictor(&params, data)),
        10..=15 => Ok(png_predictor(&params, &data)),
        _ => Ok(data),
    }
}

/// TIFF horizontal predictor: each byte is a delta against the byte one
/// component stride to its left, applied independently per row.
fn tiff_predictor(params: &PredictorParams, mut data: Vec<u8>) -> Vec<u8> {
    let row_bytes = params.row_bytes();
    let bpp = params.bytes_per_pixel();
    if row_bytes == 0 {
        return data;
    }
    let mut start = 0;
    while start < data.len() {
        let end = (start + row_bytes).min(data.len());
        for i in start + bpp..end {
            data[i] = data[i].wrapping_add(data[i - bpp]);
        }
        start = end;
    }
    data
}

/// PNG predictors: every row is prefixed by a 1-byte filter tag
/// (None/Sub/Up/Average/Paeth).
fn png_predictor(params: &PredictorParams, data: &[u8]) -> Vec<u8> {
    let row_bytes = params.row_bytes();
    let bpp = params.bytes_per_pixel();
    let stride = row_bytes + 1;
    // Bogus parameters can claim rows wider than the whole payload.
    if row_bytes == 0 || data.len() < stride {
        return data.to_vec();
    }

    let rows = data.len() / stride;
    let mut out = Vec::with_capacity(rows * row_bytes);
    let mut prev = vec![0u8; row_bytes];

    for chunk in data.chunks(stride).take(rows) {
        let tag = chunk[0];
        let src = &chunk[1..];
        let mut row = vec![0u8; row_bytes];
        match tag {
            0 => row.copy_from_slice(src),
            1 => {
                for i in 0..row_bytes {
                    let left = if i >= bpp { row[i - bpp] } else { 0 };
                    row[i] = src[i].wrapping_add(left);
                }
            }
            2 => {
                for i in 0..row_bytes {
                    row[i] = src[i].wrapping_add(prev[i]);
                }
            }
            3 => {
                for i in 0..row_bytes {
                    let left = if i >= bpp { row[i - bpp] } else { 0 } as i32;
                    let up = prev[i] as i32;
                    row[i] = src[i].wrapping_add(((left + up) / 2) as u8);
                }
            }
            4 => {
                for i in 0..row_bytes {
                    let left = if i >= bpp { row[i - bpp] } else { 0 };
                    let up_left = if i >= bpp { prev[i - bpp] } else { 0 };
                    row[i] = src[i].wrapping_add(paeth(left, prev[i], up_left));
                }
            }
            _ => row.copy_from_slice(src),
        }
        out.extend_from_slice(&row);
        prev = row;
    }
    out
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (ia, ib, ic) = (a as i32, b as i32, c as i32);
    let p = ia + ib - ic;
    let pa = (p - ia).abs();
    let pb = (p - ib).abs();
    let pc = (p - ic).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

fn ascii85_decode(data: &[u8]) -> Result<Vec<u8>, FilterError> {
    let mut out = Vec::new();
    let mut group = [0u8; 5];
    let mut count = 0usize;

    let mut body = data;
    if body.starts_with(b"<~") {
        body = &body[2..];
    }

    for &byte in body {
        if byte.is_ascii_whitespace() || byte == 0 {
            continue;
        }
        if byte == b'~' {
            break;
        }
        if byte == b'z' && count == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        if !(b'!'..=b'u').contains(&byte) {
            return Err(FilterError::Invalid(format!(
                "ascii85: unexpected byte 0x{:02x}",
                byte
            )));
        }
        group[count] = byte - b'!';
        count += 1;
        if count == 5 {
            let value = group.iter().fold(0u32, |acc, &d| acc * 85 + d as u32);
            out.extend_from_slice(&value.to_be_bytes());
            count = 0;
        }
    }

    if count == 1 {
        return Err(FilterError::Invalid(
            "ascii85: truncated final group".to_string(),
        ));
    }
    if count > 1 {
        for slot in group.iter_mut().skip(count) {
            *slot = 84;
        }
        let value = group.iter().fold(0u32, |acc, &d| acc * 85 + d as u32);
        out.extend_from_slice(&value.to_be_bytes()[..count - 1]);
    }
    Ok(out)
}

fn ascii_hex_decode(data: &[u8]) -> Result<Vec<u8>, FilterError> {
    let mut out = Vec::new();
    let mut pending: Option<u8> = None;
    for &byte in data {
        if byte == b'>' {
            break;
        }
        if byte.is_ascii_whitespace() || byte == 0 {
            continue;
        }
        // Unrecognized bytes count as nibble 0 so a stray byte cannot sink
        // the whole stream.
        let nibble = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            _ => 0,
        };
        match pending.take() {
            Some(high) => out.push((high << 4) | nibble),
            None => pending = Some(nibble),
        }
    }
    if let Some(high) = pending {
        out.push(high << 4);
    }
    Ok(out)
}

const LZW_CLEAR: u16 = 256;
const LZW_EOD: u16 = 257;
const LZW_MAX_WIDTH: u32 = 12;

/// MSB-first LZW in the classical TIFF variant: 8-bit literals, clear code
/// 256, end-of-data 257, and the early code-width change.
fn lzw_decode(data: &[u8]) -> Result<Vec<u8>, FilterError> {
    let mut out = Vec::new();
    let mut reader = BitReader::new(data);
    let mut table: Vec<Vec<u8>> = Vec::new();
    let mut width = 9u32;
    let mut prev: Option<Vec<u8>> = None;

    reset_lzw_table(&mut table);

    while let Some(code) = reader.read(width) {
        match code {
            LZW_CLEAR => {
                reset_lzw_table(&mut table);
                width = 9;
                prev = None;
            }
            LZW_EOD => break,
            _ => {
                let entry = if (code as usize) < table.len() {
                    table[code as usize].clone()
                } else if let Some(prev) = &prev
                    && code as usize == table.len()
                {
                    let mut entry = prev.clone();
                    entry.push(prev[0]);
                    entry
                } else {
                    return Err(FilterError::Invalid(format!(
                        "lzw: code {} outside table",
                        code
                    )));
                };

                out.extend_from_slice(&entry);
                if out.len() > MAX_DECOMPRESSED_SIZE {
                    return Err(FilterError::LimitExceeded);
                }
                if let Some(prev) = prev.take() {
                    let mut next = prev;
                    next.push(entry[0]);
                    table.push(next);
                }
                prev = Some(entry);

                if table.len() >= (1usize << width) - 1 && width < LZW_MAX_WIDTH {
                    width += 1;
                }
            }
        }
    }
    Ok(out)
}

fn reset_lzw_table(table: &mut Vec<Vec<u8>>) {
    table.clear();
    for byte in 0..=255u8 {
        table.push(vec![byte]);
    }
    // Placeholder slots for the clear and end-of-data codes.
    table.push(Vec::new());
    table.push(Vec::new());
}

struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    acc: u32,
    bits: u32,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            acc: 0,
            bits: 0,
        }
    }

    fn read(&mut self, width: u32) -> Option<u16> {
        while self.bits < width {
            let byte = *self.data.get(self.pos)?;
            self.pos += 1;
            self.acc = (self.acc << 8) | byte as u32;
            self.bits += 8;
        }
        self.bits -= width;
        let code = (self.acc >> self.bits) & ((1 << width) - 1);
        Some(code as u16)
    }
}

/// PackBits: a length byte L selects a literal copy (L in 0..=127,
/// L+1 bytes follow) or a repeat (L in 129..=255, one byte repeated
/// 257-L times); 128 ends the data.
fn run_length_decode(data: &[u8]) -> Result<Vec<u8>, FilterError> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let length = data[i] as usize;
        i += 1;
        if length == 128 {
            break;
        }
        if length < 128 {
            let count = (length + 1).min(data.len() - i);
            out.extend_from_slice(&data[i..i + count]);
            i += count;
        } else {
            if i >= data.len() {
                break;
            }
            let byte = data[i];
            i += 1;
            out.extend(std::iter::repeat_n(byte, 257 - length));
        }
        if out.len() > MAX_DECOMPRESSED_SIZE {
            return Err(FilterError::LimitExceeded);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn dict(entries: &[(&str, Object)]) -> HashMap<String, Object> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).expect("write");
        encoder.finish().expect("finish")
    }

    #[test]
    fn no_filter_passes_through() {
        let out = decompress(&HashMap::new(), b"raw bytes").expect("decompress");
        assert_eq!(out, b"raw bytes");
    }

    #[test]
    fn flate_round_trip() {
        let d = dict(&[("Filter", Object::Name("FlateDecode".to_string()))]);
        let out = decompress(&d, &deflate(b"compressed payload")).expect("decompress");
        assert_eq!(out, b"compressed payload");
    }

    #[test]
    fn flate_alias_is_accepted() {
        let d = dict(&[("Filter", Object::Name("Fl".to_string()))]);
        let out = decompress(&d, &deflate(b"x")).expect("decompress");
        assert_eq!(out, b"x");
    }

    #[test]
    fn corrupt_zlib_is_rejected() {
        let d = dict(&[("Filter", Object::Name("FlateDecode".to_string()))]);
        assert!(matches!(
            decompress(&d, b"\x00not zlib at all"),
            Err(FilterError::Invalid(_))
        ));
    }

    #[test]
    fn unknown_filter_is_unsupported() {
        let d = dict(&[("Filter", Object::Name("MagicDecode".to_string()))]);
        assert!(matches!(
            decompress(&d, b"x"),
            Err(FilterError::Unsupported(_))
        ));
    }

    #[test]
    fn image_filters_pass_through() {
        for name in ["DCTDecode", "CCITTFaxDecode", "JBIG2Decode", "JPXDecode", "Crypt"] {
            let d = dict(&[("Filter", Object::Name(name.to_string()))]);
            assert_eq!(decompress(&d, b"\xff\xd8jpeg").expect("decompress"), b"\xff\xd8jpeg");
        }
    }

    #[test]
    fn ascii_hex_decodes_with_and_without_whitespace() {
        let d = dict(&[("Filter", Object::Name("ASCIIHexDecode".to_string()))]);
        assert_eq!(decompress(&d, b"48656c6c6f>").expect("decompress"), b"Hello");
        assert_eq!(
            decompress(&d, b"48 65 6c 6c 6f>").expect("decompress"),
            b"Hello"
        );
    }

    #[test]
    fn ascii_hex_pads_odd_final_digit() {
        let d = dict(&[("Filter", Object::Name("AHx".to_string()))]);
        assert_eq!(decompress(&d, b"414>").expect("decompress"), vec![0x41, 0x40]);
    }

    #[test]
    fn ascii_hex_treats_stray_bytes_as_zero_nibbles() {
        let d = dict(&[("Filter", Object::Name("ASCIIHexDecode".to_string()))]);
        assert_eq!(decompress(&d, b"4Z>").expect("decompress"), vec![0x40]);
        assert_eq!(
            decompress(&d, b"48Z5>").expect("decompress"),
            vec![0x48, 0x05]
        );
    }

    #[test]
    fn ascii85_decodes_hello() {
        let d = dict(&[("Filter", Object::Name("ASCII85Decode".to_string()))]);
        // "Hello" encodes to 87cURDZ in base-85.
        assert_eq!(decompress(&d, b"87cURDZ~>").expect("decompress"), b"Hello");
    }

    #[test]
    fn ascii85_handles_z_shortcut_and_whitespace() {
        let d = dict(&[("Filter", Object::Name("A85".to_string()))]);
        assert_eq!(
            decompress(&d, b" z ~>").expect("decompress"),
            vec![0, 0, 0, 0]
        );
    }

    #[test]
    fn run_length_literal_and_repeat() {
        let d = dict(&[("Filter", Object::Name("RunLengthDecode".to_string()))]);
        assert_eq!(
            decompress(&d, &[2, b'A', b'B', b'C', 128]).expect("decompress"),
            b"ABC"
        );
        assert_eq!(
            decompress(&d, &[253, b'X', 128]).expect("decompress"),
            b"XXXX"
        );
    }

    #[test]
    fn lzw_decodes_known_stream() {
        let d = dict(&[("Filter", Object::Name("LZWDecode".to_string()))]);
        // Codes 256, 'A', 258, 258, 257 at 9 bits: "AAAAA".
        let encoded = [0x80, 0x10, 0x60, 0x50, 0x28, 0x08];
        assert_eq!(decompress(&d, &encoded).expect("decompress"), b"AAAAA");
    }

    #[test]
    fn png_up_predictor_wraps_past_255() {
        let rows = [
            vec![0u8, 200, 200],
            // Up deltas of 200 force wrapping sums (200 + 200 = 400).
            vec![2u8, 200, 200],
        ]
        .concat();
        let d = dict(&[
            ("Filter", Object::Name("FlateDecode".to_string())),
            (
                "DecodeParms",
                Object::Dictionary(dict(&[
                    ("Predictor", Object::Integer(12)),
                    ("Columns", Object::Integer(2)),
                ])),
            ),
        ]);
        let out = decompress(&d, &deflate(&rows)).expect("decompress");
        assert_eq!(out, vec![200, 200, 144, 144]);
    }

    #[test]
    fn png_sub_and_paeth_predictors() {
        let rows = [
            vec![1u8, 10, 10, 10],
            vec![4u8, 5, 5, 5],
        ]
        .concat();
        let d = dict(&[
            ("Filter", Object::Name("FlateDecode".to_string())),
            (
                "DecodeParms",
                Object::Dictionary(dict(&[
                    ("Predictor", Object::Integer(15)),
                    ("Columns", Object::Integer(3)),
                ])),
            ),
        ]);
        let out = decompress(&d, &deflate(&rows)).expect("decompress");
        // Row 1 (Sub): 10, 20, 30. Row 2 (Paeth): 15, 25, 35.
        assert_eq!(out, vec![10, 20, 30, 15, 25, 35]);
    }

    #[test]
    fn tiff_predictor_accumulates_per_row() {
        let d = dict(&[
            ("Filter", Object::Name("FlateDecode".to_string())),
            (
                "DecodeParms",
                Object::Dictionary(dict(&[
                    ("Predictor", Object::Integer(2)),
                    ("Columns", Object::Integer(3)),
                ])),
            ),
        ]);
        let out = decompress(&d, &deflate(&[1, 1, 1, 5, 1, 1])).expect("decompress");
        assert_eq!(out, vec![1, 2, 3, 5, 6, 7]);
    }

    #[test]
    fn filter_chain_applies_in_sequence() {
        let inner = deflate(b"chained");
        let mut hex: Vec<u8> = inner
            .iter()
            .flat_map(|b| format!("{:02x}", b).into_bytes())
            .collect();
        hex.push(b'>');
        let d = dict(&[(
            "Filter",
            Object::Array(vec![
                Object::Name("ASCIIHexDecode".to_string()),
                Object::Name("FlateDecode".to_string()),
            ]),
        )]);
        assert_eq!(decompress(&d, &hex).expect("decompress"), b"chained");
    }
}
