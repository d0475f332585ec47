mod common;

use pluck::text::Extractor;

use crate::common::{PdfBuilder, load};

fn one_font_page(font_body: &str, content: &[u8]) -> PdfBuilder {
    PdfBuilder::new()
        .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
        .object(
            3,
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
             /Resources << /Font << /F1 5 0 R >> >> >>",
        )
        .stream_object(4, "", content)
        .object(5, font_body)
}

#[test]
fn win_ansi_font_decodes_the_euro_byte() {
    let mut content = b"BT /F1 12 Tf 100 700 Td (price: ".to_vec();
    content.push(0x80);
    content.extend_from_slice(b") Tj ET");
    let doc = load(
        one_font_page(
            "<< /Type /Font /Subtype /TrueType /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
            &content,
        )
        .build(1),
    );
    let text = Extractor::new(&doc).extract_page(0);
    assert_eq!(text, "price: \u{20AC}");
}

#[test]
fn differences_array_remaps_codes_through_glyph_names() {
    let doc = load(
        one_font_page(
            "<< /Type /Font /Subtype /Type1 /BaseFont /Custom \
             /Encoding << /BaseEncoding /WinAnsiEncoding /Differences [65 /Euro /fl] >> >>",
            b"BT /F1 12 Tf 72 720 Td (AB-C) Tj ET",
        )
        .build(1),
    );
    let text = Extractor::new(&doc).extract_page(0);
    assert_eq!(text, "\u{20AC}\u{FB02}-C");
}

#[test]
fn to_unicode_cmap_overrides_the_base_encoding() {
    let cmap = b"/CIDInit /ProcSet findresource begin\n\
12 dict begin\n\
begincmap\n\
1 begincodespacerange\n<00> <FF>\nendcodespacerange\n\
2 beginbfchar\n<41> <0058>\n<42> <0059>\nendbfchar\n\
endcmap\nend\nend\n";
    let doc = load(
        one_font_page(
            "<< /Type /Font /Subtype /TrueType /BaseFont /Helvetica /ToUnicode 6 0 R >>",
            b"BT /F1 10 Tf 50 600 Td (AB) Tj ET",
        )
        .stream_object(6, "", cmap)
        .build(1),
    );
    let text = Extractor::new(&doc).extract_page(0);
    assert_eq!(text, "XY");
}

#[test]
fn type0_font_maps_two_byte_codes_with_surrogates() {
    let cmap = b"begincmap\n\
1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n\
2 beginbfchar\n<0001> <D83DDE00>\n<0002> <0021>\nendbfchar\n\
endcmap\n";
    let doc = load(
        one_font_page(
            "<< /Type /Font /Subtype /Type0 /BaseFont /Emoji /Encoding /Identity-H \
             /ToUnicode 6 0 R >>",
            b"BT /F1 12 Tf 10 10 Td <00010002> Tj ET",
        )
        .stream_object(6, "", cmap)
        .build(1),
    );
    let text = Extractor::new(&doc).extract_page(0);
    assert_eq!(text, "\u{1F600}!");
}

#[test]
fn bfrange_maps_a_run_of_codes() {
    let cmap = b"begincmap\n\
1 beginbfrange\n<41> <43> <0061>\nendbfrange\n\
endcmap\n";
    let doc = load(
        one_font_page(
            "<< /Type /Font /Subtype /TrueType /BaseFont /Helvetica /ToUnicode 6 0 R >>",
            b"BT /F1 10 Tf 0 0 Td (ABC) Tj ET",
        )
        .stream_object(6, "", cmap)
        .build(1),
    );
    let text = Extractor::new(&doc).extract_page(0);
    assert_eq!(text, "abc");
}

#[test]
fn compressed_to_unicode_streams_are_decoded() {
    let cmap = b"1 beginbfchar\n<41> <005A>\nendbfchar\n";
    let packed = common::deflate(cmap);
    let doc = load(
        one_font_page(
            "<< /Type /Font /Subtype /TrueType /BaseFont /Helvetica /ToUnicode 6 0 R >>",
            b"BT /F1 10 Tf 0 0 Td (A) Tj ET",
        )
        .stream_object(6, "/Filter /FlateDecode", &packed)
        .build(1),
    );
    assert_eq!(Extractor::new(&doc).extract_page(0), "Z");
}

#[test]
fn unknown_font_resource_falls_back_to_latin1() {
    let doc = load(
        PdfBuilder::new()
            .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
            .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
            .object(
                3,
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>",
            )
            .stream_object(4, "", b"BT /Missing 12 Tf 0 0 Td (plain) Tj ET")
            .build(1),
    );
    assert_eq!(Extractor::new(&doc).extract_page(0), "plain");
}

#[test]
fn page_fonts_returns_resolved_font_objects() {
    let doc = load(
        one_font_page(
            "<< /Type /Font /Subtype /Type1 /BaseFont /Times-Roman >>",
            b"BT (x) Tj ET",
        )
        .build(1),
    );
    let pages = doc.pages();
    let fonts = doc.page_fonts(&pages[0]);
    assert_eq!(fonts.len(), 1);
    let font = fonts.get("F1").expect("font F1");
    assert_eq!(
        font.as_dict()
            .and_then(|d| d.get("BaseFont"))
            .and_then(|v| v.as_name()),
        Some("Times-Roman")
    );
}
