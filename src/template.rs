//! Guide template: a page with the outline of every label cell.
//!
//! Handy for test prints on plain paper and for running the tool without
//! the label vendor's template file.

use anyhow::{anyhow, Result};
use printpdf::{BuiltinFont, Color, Greyscale, Line, Mm, PdfDocument, Point};
use std::io::BufWriter;
use std::path::Path;

use crate::config::{Dimension, SheetGeometry};

fn mm(points: f64) -> Mm {
    Mm(Dimension(points).as_mm() as f32)
}

/// Render the guide template for `geometry` as PDF bytes.
pub fn guide_template_bytes(geometry: &SheetGeometry) -> Result<Vec<u8>> {
    geometry.validate()?;

    let (doc, page1, layer1) = PdfDocument::new(
        "Label sheet guide",
        Mm(geometry.page_width.as_mm() as f32),
        Mm(geometry.page_height.as_mm() as f32),
        "Cells",
    );
    let current_layer = doc.get_page(page1).get_layer(layer1);

    current_layer.set_outline_color(Color::Greyscale(Greyscale::new(0.6, None)));
    current_layer.set_outline_thickness(0.5);

    let label_w = geometry.label_width.as_points();
    let label_h = geometry.label_height.as_points();
    for row in 0..geometry.rows {
        for column in 0..geometry.columns {
            let left = geometry.left_margin.as_points() + column as f64 * geometry.column_pitch();
            let top = geometry.page_height.as_points()
                - geometry.top_margin.as_points()
                - row as f64 * geometry.row_pitch();
            let (right, bottom) = (left + label_w, top - label_h);

            current_layer.add_line(Line {
                points: vec![
                    (Point::new(mm(left), mm(bottom)), false),
                    (Point::new(mm(right), mm(bottom)), false),
                    (Point::new(mm(right), mm(top)), false),
                    (Point::new(mm(left), mm(top)), false),
                ],
                is_closed: true,
            });
        }
    }

    let font_ref = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("Failed to add Helvetica: {:?}", e))?;
    let caption = format!(
        "{} x {} labels, {:.1} x {:.1} mm",
        geometry.columns,
        geometry.rows,
        geometry.label_width.as_mm(),
        geometry.label_height.as_mm()
    );
    current_layer.use_text(
        caption,
        7.0,
        mm(geometry.left_margin.as_points()),
        Mm(5.0),
        &font_ref,
    );

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)
        .map_err(|e| anyhow!("Failed to save guide template: {:?}", e))?;
    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush guide template: {}", e.error()))
}

/// Write the guide template to `path`.
pub fn write_guide_template(path: &Path, geometry: &SheetGeometry) -> Result<()> {
    let bytes = guide_template_bytes(geometry)?;
    crate::output::write_atomically(path, &bytes)?;
    Ok(())
}
