//! PDF content stream generation for QR codes and text.
//!
//! This module provides:
//! - QR code rasterisation and embedding as image XObjects
//! - Centered text rendering with a standard font
//! - PDF content stream building

use crate::error::LabelError;
use crate::layout::DrawOp;
use super::fonts::StandardFont;
use image::{GrayImage, Luma};
use lopdf::{Dictionary, Document, Object, Stream};
use qrcode::{Color, EcLevel, QrCode};
use std::io::Write;

/// Pixels per QR module in the embedded raster
const QR_MODULE_PIXELS: u32 = 10;

/// Light modules drawn around the code
const QR_BORDER_MODULES: u32 = 1;

/// Builder for generating PDF content streams and associated XObjects
pub struct ContentBuilder {
    pub content_parts: Vec<String>,
    pub xobjects: Dictionary,
    font_resource: String,
    font: StandardFont,
    /// Page origin offset, for templates whose MediaBox does not start at 0,0
    origin: (f64, f64),
}

impl ContentBuilder {
    /// Create a new ContentBuilder drawing text with `font` under the
    /// resource name `font_resource`
    pub fn new(font_resource: &str, font: StandardFont) -> Self {
        Self {
            content_parts: Vec::new(),
            xobjects: Dictionary::new(),
            font_resource: font_resource.to_string(),
            font,
            origin: (0.0, 0.0),
        }
    }

    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.origin = (x, y);
        self
    }

    /// Add a QR code encoding `payload` with its lower-left corner at (x, y)
    pub fn add_qr_code(
        &mut self,
        payload: &str,
        x: f64,
        y: f64,
        size: f64,
        doc: &mut Document,
    ) -> Result<(), LabelError> {
        let qr_img = render_qr_raster(payload)?;
        let side = qr_img.width();

        let compressed_bytes = compress_data(qr_img.as_raw())
            .map_err(|e| LabelError::PdfAssembly(format!("failed to compress QR image: {}", e)))?;

        // Create image XObject
        let mut img_dict = Dictionary::new();
        img_dict.set("Type", "XObject");
        img_dict.set("Subtype", "Image");
        img_dict.set("Width", side as i64);
        img_dict.set("Height", side as i64);
        img_dict.set("ColorSpace", "DeviceGray");
        img_dict.set("BitsPerComponent", 8_i64);
        img_dict.set("Interpolate", false);
        img_dict.set("Filter", "FlateDecode");

        let img_stream = Stream::new(img_dict, compressed_bytes);
        let img_id = doc.add_object(img_stream);

        let img_name = format!("QrIm{}", img_id.0);
        self.xobjects.set(img_name.clone(), Object::Reference(img_id));

        let x = x + self.origin.0;
        let y = y + self.origin.1;
        self.content_parts.push(format!(
            "q {} 0 0 {} {} {} cm /{} Do Q ",
            fmt_num(size),
            fmt_num(size),
            fmt_num(x),
            fmt_num(y),
            img_name
        ));

        Ok(())
    }

    /// Add a line of text horizontally centered on `center_x`
    pub fn add_centered_text(&mut self, value: &str, center_x: f64, baseline_y: f64, font_size: f64) {
        let width = self.font.text_width(value, font_size);
        let x = center_x - width / 2.0 + self.origin.0;
        let y = baseline_y + self.origin.1;

        let escaped_value = escape_pdf_string(value);
        self.content_parts.push(format!(
            "q BT 0 g /{} {} Tf {} {} Td ({}) Tj ET Q ",
            self.font_resource,
            fmt_num(font_size),
            fmt_num(x),
            fmt_num(y),
            escaped_value
        ));
    }

    /// Add a layout instruction
    pub fn add_op(&mut self, op: &DrawOp, doc: &mut Document) -> Result<(), LabelError> {
        match op {
            DrawOp::QrImage { payload, x, y, size } => {
                self.add_qr_code(payload, *x, *y, *size, doc)?;
            }
            DrawOp::Text {
                text,
                center_x,
                baseline_y,
                font_size,
            } => {
                self.add_centered_text(text, *center_x, *baseline_y, *font_size);
            }
        }
        Ok(())
    }

    /// Build the final content bytes
    pub fn build_content_bytes(&self) -> Vec<u8> {
        self.content_parts.join("").into_bytes()
    }
}

/// Format a coordinate for a content stream without float noise
fn fmt_num(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Escape special characters in PDF strings
pub fn escape_pdf_string(s: &str) -> String {
    let mut result = String::new();
    for c in s.chars() {
        match c {
            '(' => result.push_str(r"\("),
            ')' => result.push_str(r"\)"),
            '\\' => result.push_str(r"\\"),
            '\n' => result.push_str(r"\n"),
            '\r' => result.push_str(r"\r"),
            '\t' => result.push_str(r"\t"),
            _ => result.push(c),
        }
    }
    result
}

/// Compress data using zlib/flate2
pub fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Render `payload` as a black-on-white QR code raster.
///
/// Uses error correction level L and a one-module quiet zone, with every
/// module drawn as a square block of pixels.
pub fn render_qr_raster(payload: &str) -> Result<GrayImage, LabelError> {
    let qr_code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L)
        .map_err(|source| LabelError::QrEncoding {
            identifier: payload.to_string(),
            source,
        })?;

    let modules = qr_code.width() as u32;
    let colors = qr_code.to_colors();
    let side = (modules + 2 * QR_BORDER_MODULES) * QR_MODULE_PIXELS;

    let img = GrayImage::from_fn(side, side, |px, py| {
        let mx = px / QR_MODULE_PIXELS;
        let my = py / QR_MODULE_PIXELS;
        let inside = (QR_BORDER_MODULES..QR_BORDER_MODULES + modules).contains(&mx)
            && (QR_BORDER_MODULES..QR_BORDER_MODULES + modules).contains(&my);
        if !inside {
            return Luma([255u8]);
        }
        let index = ((my - QR_BORDER_MODULES) * modules + (mx - QR_BORDER_MODULES)) as usize;
        match colors[index] {
            Color::Dark => Luma([0u8]),
            Color::Light => Luma([255u8]),
        }
    });

    Ok(img)
}
