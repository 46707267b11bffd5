//! # PDF Serializer
//!
//! Writes a captured page as a one-page PDF. The page is a single full-bleed
//! image: the MediaBox is exactly the paper size in points and the bitmap is
//! stretched over it, whatever its pixel density.
//!
//! ## PDF Structure
//!
//! ```text
//! %PDF-1.7
//! 1 0 obj  Catalog
//! 2 0 obj  Pages
//! 3 0 obj  Image XObject (/Im0, FlateDecode RGB)
//! 4 0 obj  Content stream: q W 0 0 H 0 0 cm /Im0 Do Q
//! 5 0 obj  Page
//! 6 0 obj  Info (optional)
//! xref / trailer / %%EOF
//! ```
//!
//! The capture is painted on white paper, so alpha is dropped rather than
//! carried as a soft mask.

use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use image::RgbaImage;
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::PrintError;
use crate::model::PaperSize;

/// Document information written to the Info dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn new() -> Self {
        // Object 0 is the free-list head; real objects are 1-indexed.
        Self {
            objects: vec![PdfObject { data: vec![] }],
        }
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(PdfObject { data });
        self.objects.len() - 1
    }

    fn reserve(&mut self) -> usize {
        self.push(vec![])
    }

    fn stream(&mut self, dict: &str, payload: &[u8]) -> usize {
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(data, "<< {} /Length {} >>\nstream\n", dict, payload.len());
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write `image` as the only page of a `paper` sized document.
    pub fn write_page(&self, image: &RgbaImage, paper: PaperSize, metadata: &Metadata) -> Result<Vec<u8>, PrintError> {
        let (px_w, px_h) = image.dimensions();
        if px_w == 0 || px_h == 0 {
            return Err(PrintError::Pdf("cannot embed an empty page image".to_string()));
        }
        let (page_w, page_h) = paper.dimensions_pt();

        let mut builder = PdfBuilder::new();
        let catalog_id = builder.reserve();
        let pages_id = builder.reserve();

        let image_id = Self::write_image_xobject(&mut builder, image);

        let content = format!("q {:.2} 0 0 {:.2} 0 0 cm /Im0 Do Q", page_w, page_h);
        let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
        let content_id = builder.stream("/Filter /FlateDecode", &compressed);

        let page_id = builder.push(
            format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /XObject << /Im0 {} 0 R >> >> >>",
                pages_id, page_w, page_h, content_id, image_id
            )
            .into_bytes(),
        );

        builder.objects[catalog_id].data = format!("<< /Type /Catalog /Pages {} 0 R >>", pages_id).into_bytes();
        builder.objects[pages_id].data =
            format!("<< /Type /Pages /Kids [{} 0 R] /Count 1 >>", page_id).into_bytes();

        let info_id = Self::write_info(&mut builder, metadata);
        Ok(Self::serialize(&builder, catalog_id, info_id))
    }

    /// Write the page bitmap as an RGB image XObject.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &RgbaImage) -> usize {
        let rgb: Vec<u8> = image
            .pixels()
            .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
            .collect();
        let compressed = compress_to_vec_zlib(&rgb, 6);
        let dict = format!(
            "/Type /XObject /Subtype /Image /Width {} /Height {} \
             /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode",
            image.width(),
            image.height()
        );
        builder.stream(&dict, &compressed)
    }

    fn write_info(builder: &mut PdfBuilder, metadata: &Metadata) -> Option<usize> {
        if metadata.title.is_none() && metadata.author.is_none() && metadata.subject.is_none() {
            return None;
        }
        let mut info = String::from("<< ");
        if let Some(ref title) = metadata.title {
            let _ = write!(info, "/Title ({}) ", Self::escape_pdf_string(title));
        }
        if let Some(ref author) = metadata.author {
            let _ = write!(info, "/Author ({}) ", Self::escape_pdf_string(author));
        }
        if let Some(ref subject) = metadata.subject {
            let _ = write!(info, "/Subject ({}) ", Self::escape_pdf_string(subject));
        }
        let _ = write!(
            info,
            "/Producer (clinic-print {}) /Creator (clinic-print) >>",
            env!("CARGO_PKG_VERSION")
        );
        Some(builder.push(info.into_bytes()))
    }

    /// Escape special characters in a PDF literal string. Non-ASCII
    /// characters become `?`; Info strings here are plain PDFDocEncoding.
    fn escape_pdf_string(s: &str) -> String {
        s.chars()
            .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
            .collect::<String>()
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(builder: &PdfBuilder, root_id: usize, info_obj_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(output, "trailer\n<< /Size {} /Root {} 0 R", builder.objects.len(), root_id);
        if let Some(info_id) = info_obj_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}
