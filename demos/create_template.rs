use qr_label_sheet::config::SheetGeometry;
use qr_label_sheet::template::write_guide_template;
use std::path::PathBuf;

/// Writes a guide template with the SL655 cell outlines.
///
///     cargo run --example create_template -- templates/SL655.pdf
fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("templates/SL655-guide.pdf"));

    write_guide_template(&path, &SheetGeometry::sl655())?;
    println!("Created {}", path.display());
    Ok(())
}
