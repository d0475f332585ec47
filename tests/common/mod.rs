#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Write;

use pluck::document::Document;

/// Assembles a classical-xref PDF from numbered object bodies, computing
/// byte-exact offsets for the xref table.
pub struct PdfBuilder {
    version: &'static str,
    objects: Vec<(u32, Vec<u8>)>,
    trailer_extra: String,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            version: "1.7",
            objects: Vec::new(),
            trailer_extra: String::new(),
        }
    }

    pub fn version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    pub fn object(mut self, num: u32, body: &str) -> Self {
        self.objects.push((num, body.as_bytes().to_vec()));
        self
    }

    pub fn object_bytes(mut self, num: u32, body: Vec<u8>) -> Self {
        self.objects.push((num, body));
        self
    }

    /// A stream object with a correct `/Length` entry appended to `dict`.
    pub fn stream_object(self, num: u32, dict: &str, payload: &[u8]) -> Self {
        let mut body = format!("<< {} /Length {} >>\nstream\n", dict, payload.len()).into_bytes();
        body.extend_from_slice(payload);
        body.extend_from_slice(b"\nendstream");
        self.object_bytes(num, body)
    }

    pub fn trailer_extra(mut self, extra: &str) -> Self {
        self.trailer_extra = extra.to_string();
        self
    }

    pub fn build(self, root: u32) -> Vec<u8> {
        self.build_with_xref_pos(root).0
    }

    pub fn build_with_xref_pos(self, root: u32) -> (Vec<u8>, usize) {
        let mut out = format!("%PDF-{}\n", self.version).into_bytes();
        let mut offsets: BTreeMap<u32, usize> = BTreeMap::new();
        for (num, body) in &self.objects {
            offsets.insert(*num, out.len());
            out.extend_from_slice(format!("{} 0 obj\n", num).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_pos = out.len();
        let max = offsets.keys().max().copied().unwrap_or(0);
        out.extend_from_slice(format!("xref\n0 {}\n", max + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for num in 1..=max {
            match offsets.get(&num) {
                Some(offset) => {
                    out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes())
                }
                None => out.extend_from_slice(b"0000000000 65535 f \n"),
            }
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R {} >>\nstartxref\n{}\n%%EOF\n",
                max + 1,
                root,
                self.trailer_extra,
                xref_pos
            )
            .as_bytes(),
        );
        (out, xref_pos)
    }
}

/// A one-page document with the given content stream and optional extra
/// page entries (e.g. a `/Resources` dictionary).
pub fn single_page_pdf(content: &[u8], page_extra: &str) -> Vec<u8> {
    PdfBuilder::new()
        .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
        .object(
            3,
            &format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R {} >>",
                page_extra
            ),
        )
        .stream_object(4, "", content)
        .build(1)
}

pub fn load(bytes: Vec<u8>) -> Document {
    Document::load(bytes).expect("failed to load synthetic PDF")
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).expect("deflate write");
    encoder.finish().expect("deflate finish")
}
