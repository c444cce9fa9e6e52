use crate::error::LabelError;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Standard PDF Type1 fonts available for label text.
///
/// Only fonts with known metrics are offered, since the identifier is
/// centered under its QR code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StandardFont {
    #[default]
    Helvetica,
    HelveticaBold,
    Courier,
    CourierBold,
}

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

/// Helvetica-Bold advance widths for ASCII 32..=126, in 1/1000 em.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

const COURIER_WIDTH: u16 = 600;

impl StandardFont {
    /// Get the PDF BaseFont name for this font
    pub fn base_font_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
        }
    }

    /// Parse a font name into a StandardFont
    pub fn from_name(name: &str) -> Option<StandardFont> {
        match name.to_lowercase().as_str() {
            "helvetica" => Some(StandardFont::Helvetica),
            "helvetica-bold" => Some(StandardFont::HelveticaBold),
            "courier" => Some(StandardFont::Courier),
            "courier-bold" => Some(StandardFont::CourierBold),
            _ => None,
        }
    }

    pub fn parse(name: &str) -> Result<StandardFont, LabelError> {
        Self::from_name(name).ok_or_else(|| LabelError::UnknownFont(name.to_string()))
    }

    /// Advance width of `c` in 1/1000 em. Characters outside printable ASCII
    /// get the width of a space.
    pub fn char_width(&self, c: char) -> u16 {
        let index = match c {
            ' '..='~' => c as usize - ' ' as usize,
            _ => 0,
        };
        match self {
            StandardFont::Helvetica => HELVETICA_WIDTHS[index],
            StandardFont::HelveticaBold => HELVETICA_BOLD_WIDTHS[index],
            StandardFont::Courier | StandardFont::CourierBold => COURIER_WIDTH,
        }
    }

    /// Width of `text` in points when set at `font_size`.
    pub fn text_width(&self, text: &str, font_size: f64) -> f64 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f64 * font_size / 1000.0
    }
}

/// Create a font in the PDF document
pub fn create_font(doc: &mut Document, font: StandardFont) -> ObjectId {
    let mut font_dict = Dictionary::new();
    font_dict.set("Type", "Font");
    font_dict.set("Subtype", "Type1");
    font_dict.set("BaseFont", font.base_font_name());
    font_dict.set("Encoding", "WinAnsiEncoding");

    doc.add_object(Object::Dictionary(font_dict))
}
