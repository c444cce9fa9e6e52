use clap::Parser;
use std::path::PathBuf;

/// Generate sheets of sequential QR code labels as a print-ready PDF.
#[derive(Parser, Debug)]
#[command(name = "qr_label_sheet", version)]
#[command(about = "Generate sequential QR code labels on a 4 x 6 label sheet.", long_about = None)]
pub struct Args {
    /// Base URL for QR codes (e.g., https://example.com/item/)
    #[arg(long)]
    pub base_url: String,

    /// Prefix for item IDs
    #[arg(long, default_value = "ITEM-")]
    pub prefix: String,

    /// Starting item number
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub start: i64,

    /// Number of labels to generate
    #[arg(long, allow_negative_numbers = true)]
    pub count: i64,

    /// Output PDF path
    #[arg(short, long, default_value = "output/labels.pdf")]
    pub output: PathBuf,

    /// Background label sheet template
    #[arg(long, default_value = "templates/SL655.pdf")]
    pub template: PathBuf,

    /// Print on blank pages instead of the template
    #[arg(long)]
    pub no_template: bool,

    /// JSON file overriding the sheet geometry
    #[arg(long)]
    pub layout: Option<PathBuf>,

    /// Font for the identifier text (helvetica, helvetica-bold, courier, courier-bold)
    #[arg(long, default_value = "helvetica")]
    pub font: String,

    /// Also write a CSV listing each label's sheet, row and column
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
