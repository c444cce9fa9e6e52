//! PDF assembly: label drawings over a template page or a blank page.

mod content;
mod document;
mod fonts;
mod resources;

pub use document::{create_output_pdf, load_template, Background, Template};
pub use fonts::StandardFont;

use anyhow::{Context, Result};
use lopdf::Document;

/// Compress every stream and serialize the document.
pub fn to_pdf_bytes(mut doc: Document) -> Result<Vec<u8>> {
    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .with_context(|| "Failed to serialize PDF")?;
    Ok(buffer)
}
