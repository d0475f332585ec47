use std::collections::HashMap;

use crate::document::Document;
use crate::font::FontEncoding;
use crate::model::Object;
use crate::tokenizer::{Scanner, Token};

/// One piece of text as shown by a single text-showing operator, positioned
/// at the text-matrix translation in effect when it fired.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub font_size: f64,
}

/// Extracts plain text from the pages of a document.
pub struct Extractor<'a> {
    doc: &'a Document,
}

impl<'a> Extractor<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    /// Text of the page at `index` (0-based). Out-of-range indexes and
    /// damaged pages produce an empty string, never an error.
    pub fn extract_page(&self, index: usize) -> String {
        let pages = self.doc.pages();
        match pages.get(index) {
            Some(page) => self.extract_page_dict(page),
            None => String::new(),
        }
    }

    /// Text of every page, in document order.
    pub fn extract_all(&self) -> Vec<String> {
        self.doc
            .pages()
            .iter()
            .map(|page| self.extract_page_dict(page))
            .collect()
    }

    pub fn extract_page_dict(&self, page: &Object) -> String {
        let fonts: HashMap<String, FontEncoding> = self
            .doc
            .page_fonts(page)
            .iter()
            .map(|(name, obj)| (name.clone(), FontEncoding::build(self.doc, obj)))
            .collect();
        let content = self.doc.content_streams(page);
        if content.is_empty() {
            return String::new();
        }
        let spans = interpret_content(&content, &fonts);
        spans_to_text(spans)
    }
}

#[derive(Debug, Clone)]
struct TextState {
    font: Option<String>,
    font_size: f64,
    // Spacing and the raw CTM are tracked for completeness; span
    // positions only come from the text-matrix translation.
    #[allow(dead_code)]
    char_spacing: f64,
    #[allow(dead_code)]
    word_spacing: f64,
    leading: f64,
    tx: f64,
    ty: f64,
    lx: f64,
    ly: f64,
    #[allow(dead_code)]
    ctm: [f64; 6],
}

impl TextState {
    fn new() -> Self {
        Self {
            font: None,
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            leading: 0.0,
            tx: 0.0,
            ty: 0.0,
            lx: 0.0,
            ly: 0.0,
            ctm: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.lx += tx;
        self.ly += ty;
        self.tx = self.lx;
        self.ty = self.ly;
    }

    fn next_line(&mut self) {
        self.lx = 0.0;
        self.ly -= self.leading;
        self.tx = self.lx;
        self.ty = self.ly;
    }
}

/// Kerning adjustments this far negative (in font-design units) read as
/// word breaks inside a `TJ` array.
const TJ_SPACE_THRESHOLD: f64 = -100.0;

/// Walks a decompressed content stream and collects positioned text spans.
/// Only text operators have effects; everything else just consumes its
/// operands.
pub fn interpret_content(
    content: &[u8],
    fonts: &HashMap<String, FontEncoding>,
) -> Vec<TextSpan> {
    let mut tokens = ContentScanner::new(content);
    let mut state = TextState::new();
    let mut in_text = false;
    let mut spans: Vec<TextSpan> = Vec::new();
    let mut operands: Vec<Object> = Vec::with_capacity(8);

    while let Some(op) = tokens.next_op_into(&mut operands) {
        match op.as_str() {
            "q" | "Q" => {}
            "cm" => {
                if operands.len() >= 6 {
                    for (slot, operand) in state.ctm.iter_mut().zip(&operands) {
                        *slot = number(operand);
                    }
                }
            }
            "BT" => {
                in_text = true;
                state.tx = 0.0;
                state.ty = 0.0;
                state.lx = 0.0;
                state.ly = 0.0;
            }
            "ET" => in_text = false,
            "Tf" => {
                if operands.len() >= 2 {
                    if let Object::Name(name) = &operands[0] {
                        state.font = Some(name.clone());
                    }
                    state.font_size = number(&operands[1]);
                }
            }
            "Tc" => {
                if let Some(v) = operands.first() {
                    state.char_spacing = number(v);
                }
            }
            "Tw" => {
                if let Some(v) = operands.first() {
                    state.word_spacing = number(v);
                }
            }
            "TL" => {
                if let Some(v) = operands.first() {
                    state.leading = number(v);
                }
            }
            "Td" => {
                if operands.len() >= 2 {
                    state.move_line(number(&operands[0]), number(&operands[1]));
                }
            }
            "TD" => {
                if operands.len() >= 2 {
                    let ty = number(&operands[1]);
                    state.leading = -ty;
                    state.move_line(number(&operands[0]), ty);
                }
            }
            "Tm" => {
                if operands.len() >= 6 {
                    state.tx = number(&operands[4]);
                    state.ty = number(&operands[5]);
                    state.lx = state.tx;
                    state.ly = state.ty;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if in_text && let Some(operand) = operands.first() {
                    let text = decode_operand(operand, &state, fonts);
                    emit_span(&mut spans, &state, text);
                }
            }
            "TJ" => {
                if in_text && let Some(Object::Array(items)) = operands.first() {
                    let mut text = String::new();
                    for item in items {
                        match item {
                            Object::String(_) => {
                                text.push_str(&decode_operand(item, &state, fonts));
                            }
                            Object::Integer(_) | Object::Real(_) => {
                                if number(item) < TJ_SPACE_THRESHOLD {
                                    text.push(' ');
                                }
                            }
                            _ => {}
                        }
                    }
                    emit_span(&mut spans, &state, text);
                }
            }
            "'" => {
                state.next_line();
                if in_text && let Some(operand) = operands.first() {
                    let text = decode_operand(operand, &state, fonts);
                    emit_span(&mut spans, &state, text);
                }
            }
            "\"" => {
                if operands.len() >= 3 {
                    state.word_spacing = number(&operands[0]);
                    state.char_spacing = number(&operands[1]);
                }
                state.next_line();
                if in_text && operands.len() >= 3 {
                    let text = decode_operand(&operands[2], &state, fonts);
                    emit_span(&mut spans, &state, text);
                }
            }
            "BMC" | "BDC" | "EMC" | "MP" | "DP" => {}
            _ => {}
        }
    }
    spans
}

fn emit_span(spans: &mut Vec<TextSpan>, state: &TextState, text: String) {
    if text.is_empty() {
        return;
    }
    spans.push(TextSpan {
        x: state.tx,
        y: state.ty,
        text,
        font_size: state.font_size,
    });
}

fn decode_operand(
    operand: &Object,
    state: &TextState,
    fonts: &HashMap<String, FontEncoding>,
) -> String {
    let Some(bytes) = operand.as_bytes() else {
        return String::new();
    };
    if let Some(font) = state.font.as_ref().and_then(|name| fonts.get(name)) {
        return font.decode(bytes);
    }
    latin1_fallback(bytes)
}

fn latin1_fallback(bytes: &[u8]) -> String {
    let mut out = String::new();
    for &byte in bytes {
        if (32..128).contains(&byte) {
            out.push(byte as char);
        } else if byte >= 128 {
            out.push(char::from(byte));
        }
    }
    out
}

fn number(obj: &Object) -> f64 {
    obj.as_f64().unwrap_or(0.0)
}

const LINE_TOLERANCE_RATIO: f64 = 0.5;
const LINE_TOLERANCE_MIN: f64 = 2.0;
const GAP_FONT_RATIO: f64 = 0.3;
const WIDTH_PER_CHAR_RATIO: f64 = 0.5;

struct Line {
    y: f64,
    spans: Vec<TextSpan>,
}

/// Orders spans into lines and rebuilds the page text: lines are bound by a
/// Y window scaled to the mean font size, sorted top-down, spans sorted
/// left-to-right, with a space inserted across visible horizontal gaps.
pub fn spans_to_text(spans: Vec<TextSpan>) -> String {
    if spans.is_empty() {
        return String::new();
    }

    let mean_size = spans.iter().map(|s| s.font_size).sum::<f64>() / spans.len() as f64;
    let tolerance = (mean_size * LINE_TOLERANCE_RATIO).max(LINE_TOLERANCE_MIN);

    let mut lines: Vec<Line> = Vec::new();
    for span in spans {
        match lines.iter_mut().find(|l| (l.y - span.y).abs() < tolerance) {
            Some(line) => line.spans.push(span),
            None => lines.push(Line {
                y: span.y,
                spans: vec![span],
            }),
        }
    }

    // Page origin is bottom-left, so larger Y is higher up.
    lines.sort_by(|a, b| b.y.partial_cmp(&a.y).unwrap_or(std::cmp::Ordering::Equal));
    for line in &mut lines {
        line.spans
            .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    }

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            trim_line_end(&mut out);
            out.push('\n');
        }
        for (j, span) in line.spans.iter().enumerate() {
            if j > 0 {
                let prev = &line.spans[j - 1];
                let gap = span.x - (prev.x + estimated_width(prev));
                let mut avg_size = (span.font_size + prev.font_size) / 2.0;
                if avg_size < 1.0 {
                    avg_size = 12.0;
                }
                if gap > avg_size * GAP_FONT_RATIO {
                    push_space(&mut out);
                }
            }
            push_normalized(&mut out, &span.text);
        }
    }
    trim_line_end(&mut out);
    out.trim().to_string()
}

fn estimated_width(span: &TextSpan) -> f64 {
    span.text.chars().count() as f64 * span.font_size * WIDTH_PER_CHAR_RATIO
}

/// Appends span text with whitespace normalized: CR/LF/FF become spaces,
/// other control characters vanish, and whitespace never doubles up.
fn push_normalized(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '\r' | '\n' | '\u{0C}' => push_space(out),
            ' ' | '\t' => {
                if !ends_with_whitespace(out) {
                    out.push(ch);
                }
            }
            _ if ch.is_control() => {}
            _ => out.push(ch),
        }
    }
}

fn push_space(out: &mut String) {
    if !ends_with_whitespace(out) {
        out.push(' ');
    }
}

fn ends_with_whitespace(out: &str) -> bool {
    matches!(out.chars().next_back(), Some(' ' | '\t' | '\n') | None)
}

fn trim_line_end(out: &mut String) {
    while out.ends_with(' ') || out.ends_with('\t') {
        out.pop();
    }
}

/// Token source for content streams: accumulates operands until an
/// operator keyword, skipping inline image payloads entirely.
struct ContentScanner<'a> {
    scanner: Scanner<'a>,
}

impl<'a> ContentScanner<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            scanner: Scanner::new(data),
        }
    }

    fn next_op_into(&mut self, operands: &mut Vec<Object>) -> Option<String> {
        operands.clear();
        while let Some(token) = self.scanner.next_token() {
            match token {
                Token::Keyword(op) => {
                    if op == "BI" {
                        self.skip_inline_image();
                        operands.clear();
                        continue;
                    }
                    return Some(op);
                }
                other => {
                    if let Some(obj) = self.object_from_token(other) {
                        operands.push(obj);
                    }
                }
            }
        }
        None
    }

    fn object_from_token(&mut self, token: Token) -> Option<Object> {
        match token {
            Token::Null => Some(Object::Null),
            Token::Boolean(v) => Some(Object::Boolean(v)),
            Token::Integer(v) => Some(Object::Integer(v)),
            Token::Real(v) => Some(Object::Real(v)),
            Token::String(v) => Some(Object::String(v)),
            Token::HexString(v) => Some(Object::String(v)),
            Token::Name(v) => Some(Object::Name(v)),
            Token::ArrayStart => Some(Object::Array(self.collect_array())),
            Token::DictStart => Some(Object::Dictionary(self.collect_dict())),
            Token::DictEnd | Token::ArrayEnd | Token::Keyword(_) => None,
        }
    }

    fn collect_array(&mut self) -> Vec<Object> {
        let mut items = Vec::new();
        while let Some(token) = self.scanner.next_token() {
            if token == Token::ArrayEnd {
                break;
            }
            if let Some(obj) = self.object_from_token(token) {
                items.push(obj);
            }
        }
        items
    }

    fn collect_dict(&mut self) -> HashMap<String, Object> {
        let mut dict = HashMap::new();
        while let Some(token) = self.scanner.next_token() {
            match token {
                Token::DictEnd => break,
                Token::Name(key) => {
                    let value = match self.scanner.next_token() {
                        Some(value_token) => self
                            .object_from_token(value_token)
                            .unwrap_or(Object::Null),
                        None => break,
                    };
                    dict.insert(key, value);
                }
                _ => {}
            }
        }
        dict
    }

    fn skip_inline_image(&mut self) {
        while let Some(token) = self.scanner.next_token() {
            if let Token::Keyword(op) = token
                && op == "ID"
            {
                self.scanner.skip_inline_image_data();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_fonts() -> HashMap<String, FontEncoding> {
        HashMap::new()
    }

    fn span(x: f64, y: f64, text: &str, size: f64) -> TextSpan {
        TextSpan {
            x,
            y,
            text: text.to_string(),
            font_size: size,
        }
    }

    #[test]
    fn tj_emits_span_at_text_position() {
        let spans = interpret_content(
            b"BT /F1 12 Tf 100 700 Td (Hello, World!) Tj ET",
            &no_fonts(),
        );
        assert_eq!(spans, vec![span(100.0, 700.0, "Hello, World!", 12.0)]);
    }

    #[test]
    fn text_outside_bt_et_is_dropped() {
        let spans = interpret_content(b"(loose) Tj BT (kept) Tj ET (late) Tj", &no_fonts());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "kept");
    }

    #[test]
    fn tj_array_inserts_space_for_large_kerning_only() {
        let spans = interpret_content(b"BT [(Go) -200 (PDF)] TJ ET", &no_fonts());
        assert_eq!(spans[0].text, "Go PDF");
        let spans = interpret_content(b"BT [(ke) -40 (rn)] TJ ET", &no_fonts());
        assert_eq!(spans[0].text, "kern");
    }

    #[test]
    fn td_accumulates_and_tm_overwrites() {
        let spans = interpret_content(
            b"BT 10 20 Td (a) Tj 5 5 Td (b) Tj 1 0 0 1 300 400 Tm (c) Tj ET",
            &no_fonts(),
        );
        assert_eq!((spans[0].x, spans[0].y), (10.0, 20.0));
        assert_eq!((spans[1].x, spans[1].y), (15.0, 25.0));
        assert_eq!((spans[2].x, spans[2].y), (300.0, 400.0));
    }

    #[test]
    fn t_star_and_quote_advance_by_leading() {
        let spans = interpret_content(
            b"BT 14 TL 0 100 Td (one) Tj T* (two) Tj (three) ' ET",
            &no_fonts(),
        );
        assert_eq!((spans[0].x, spans[0].y), (0.0, 100.0));
        assert_eq!((spans[1].x, spans[1].y), (0.0, 86.0));
        assert_eq!((spans[2].x, spans[2].y), (0.0, 72.0));
    }

    #[test]
    fn td_sets_leading_from_negative_ty() {
        let spans = interpret_content(b"BT 0 -18 TD (a) Tj T* (b) Tj ET", &no_fonts());
        assert_eq!((spans[0].x, spans[0].y), (0.0, -18.0));
        assert_eq!((spans[1].x, spans[1].y), (0.0, -36.0));
    }

    #[test]
    fn double_quote_sets_spacing_and_shows() {
        let spans = interpret_content(b"BT 12 TL 2 1 (shown) \" ET", &no_fonts());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "shown");
        assert_eq!(spans[0].y, -12.0);
    }

    #[test]
    fn unknown_operators_discard_their_operands() {
        let spans = interpret_content(
            b"BT 1 0 0 RG 0.5 w /P <</MCID 0>> BDC (kept) Tj EMC ET",
            &no_fonts(),
        );
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "kept");
    }

    #[test]
    fn inline_images_do_not_derail_the_operator_stream() {
        let content =
            b"BT (before) Tj ET BI /W 2 /H 2 ID \xff\x00\xfe\x01 EI BT 0 0 Td (after) Tj ET";
        let spans = interpret_content(content, &no_fonts());
        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["before", "after"]);
    }

    #[test]
    fn hex_string_operands_are_shown() {
        let spans = interpret_content(b"BT <48656C6C6F> Tj ET", &no_fonts());
        assert_eq!(spans[0].text, "Hello");
    }

    #[test]
    fn empty_decoded_text_emits_no_span() {
        let spans = interpret_content(b"BT () Tj (\x01\x02) Tj ET", &no_fonts());
        assert!(spans.is_empty());
    }

    #[test]
    fn layout_orders_lines_top_down_and_spans_left_right() {
        let text = spans_to_text(vec![
            span(0.0, 100.0, "bottom", 10.0),
            span(60.0, 700.0, "right", 10.0),
            span(0.0, 701.0, "left", 10.0),
        ]);
        assert_eq!(text, "left right\nbottom");
    }

    #[test]
    fn layout_inserts_space_only_across_wide_gaps() {
        // "ab" at width ~10pt ends near x=10; next span at x=11 is adjacent,
        // at x=40 it is a separate word.
        let adjacent = spans_to_text(vec![
            span(0.0, 0.0, "ab", 10.0),
            span(11.0, 0.0, "cd", 10.0),
        ]);
        assert_eq!(adjacent, "abcd");
        let apart = spans_to_text(vec![
            span(0.0, 0.0, "ab", 10.0),
            span(40.0, 0.0, "cd", 10.0),
        ]);
        assert_eq!(apart, "ab cd");
    }

    #[test]
    fn layout_normalizes_whitespace_and_controls() {
        let text = spans_to_text(vec![span(0.0, 0.0, "a\r\nb\u{0}\u{7}c  d\t\te", 10.0)]);
        assert_eq!(text, "a bc d\te");
    }

    #[test]
    fn layout_never_doubles_inserted_spaces() {
        let text = spans_to_text(vec![
            span(0.0, 0.0, "word ", 10.0),
            span(100.0, 0.0, " next", 10.0),
        ]);
        assert_eq!(text, "word next");
    }

    #[test]
    fn layout_trims_the_final_string() {
        let text = spans_to_text(vec![span(0.0, 0.0, "  padded  ", 10.0)]);
        assert_eq!(text, "padded");
    }

    #[test]
    fn no_spans_means_empty_text() {
        assert_eq!(spans_to_text(Vec::new()), "");
    }

    #[test]
    fn latin1_fallback_keeps_printable_range() {
        assert_eq!(latin1_fallback(b"Plain"), "Plain");
        assert_eq!(latin1_fallback(&[0xE9, 0x07, 0x41]), "\u{E9}A");
    }
}
