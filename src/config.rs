//! Sheet geometry configuration.
//!
//! This module handles:
//! - The built-in SL655 geometry (4 × 6 labels of 1.5in on US Letter)
//! - Loading a JSON layout file that overrides parts of it
//! - Unit conversion for dimensions (mm, cm, in, pt)
//! - Geometry validation

use crate::error::LabelError;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const POINTS_PER_INCH: f64 = 72.0;

/// Dimension value that can be specified as:
/// - A number (interpreted as points)
/// - A string with unit: e.g., "38 mm", "3.8 cm", "1.5 in"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension(pub f64);

impl Dimension {
    pub fn inches(value: f64) -> Self {
        Dimension(value * POINTS_PER_INCH)
    }

    /// Convert to points (internal PDF unit)
    pub fn as_points(&self) -> f64 {
        self.0
    }

    pub fn as_mm(&self) -> f64 {
        self.0 * 25.4 / POINTS_PER_INCH
    }

    /// Parse a string such as "100 mm" or "1.5in".
    pub fn parse(value: &str) -> Result<Self, String> {
        let value = value.trim();
        let split = value
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(value.len());
        let (num_str, unit) = value.split_at(split);
        let num_str = num_str.trim();
        let unit = unit.trim().to_lowercase();

        let num: f64 = num_str
            .parse()
            .map_err(|_| format!("invalid number in dimension: {}", num_str))?;

        let points = match unit.as_str() {
            "" | "pt" | "point" | "points" => num,
            "mm" => num * POINTS_PER_INCH / 25.4,
            "cm" => num * POINTS_PER_INCH / 2.54,
            "in" | "inch" | "inches" => num * POINTS_PER_INCH,
            _ => {
                return Err(format!(
                    "unknown unit '{}'. Supported: mm, cm, in, pt",
                    unit
                ))
            }
        };

        Ok(Dimension(points))
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DimensionVisitor;

        impl serde::de::Visitor<'_> for DimensionVisitor {
            type Value = Dimension;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a number or a string with unit (e.g., \"38 mm\", \"1.5 in\")")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Dimension(value as f64))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Dimension(value as f64))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Dimension(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Dimension::parse(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(DimensionVisitor)
    }
}

/// Physical layout of one label sheet.
///
/// Every field can be overridden from a layout file; missing fields keep the
/// SL655 value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetGeometry {
    pub page_width: Dimension,
    pub page_height: Dimension,
    pub columns: u32,
    pub rows: u32,
    pub label_width: Dimension,
    pub label_height: Dimension,
    pub left_margin: Dimension,
    pub top_margin: Dimension,
    pub column_gap: Dimension,
    pub row_gap: Dimension,
    pub qr_size: Dimension,
    /// Raises the QR code above the label's vertical center to leave room
    /// for the identifier text.
    pub qr_lift: Dimension,
    /// Distance from the bottom of the QR code down to the text baseline.
    pub text_gap: Dimension,
    pub font_size: Dimension,
}

impl SheetGeometry {
    /// SL655: 24 square 1.5in labels on a US Letter sheet.
    pub fn sl655() -> Self {
        Self {
            page_width: Dimension::inches(8.5),
            page_height: Dimension::inches(11.0),
            columns: 4,
            rows: 6,
            label_width: Dimension::inches(1.5),
            label_height: Dimension::inches(1.5),
            left_margin: Dimension::inches(0.78125),
            top_margin: Dimension::inches(0.5),
            column_gap: Dimension::inches(0.3125),
            row_gap: Dimension::inches(0.2),
            qr_size: Dimension::inches(1.2),
            qr_lift: Dimension::inches(0.05),
            text_gap: Dimension::inches(0.1),
            font_size: Dimension(8.0),
        }
    }

    pub fn labels_per_sheet(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Horizontal distance between the left edges of adjacent labels.
    pub fn column_pitch(&self) -> f64 {
        self.label_width.as_points() + self.column_gap.as_points()
    }

    /// Vertical distance between the top edges of adjacent labels.
    pub fn row_pitch(&self) -> f64 {
        self.label_height.as_points() + self.row_gap.as_points()
    }

    pub fn validate(&self) -> Result<(), LabelError> {
        let invalid = |msg: String| Err(LabelError::InvalidGeometry(msg));

        if self.columns == 0 || self.rows == 0 {
            return invalid(format!(
                "grid must have at least one column and one row (got {} × {})",
                self.columns, self.rows
            ));
        }

        let positive = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("label_width", self.label_width),
            ("label_height", self.label_height),
            ("qr_size", self.qr_size),
            ("font_size", self.font_size),
        ];
        for (name, value) in positive {
            if !(value.as_points() > 0.0) || !value.as_points().is_finite() {
                return invalid(format!("{} must be positive", name));
            }
        }

        let non_negative = [
            ("left_margin", self.left_margin),
            ("top_margin", self.top_margin),
            ("column_gap", self.column_gap),
            ("row_gap", self.row_gap),
            ("qr_lift", self.qr_lift),
            ("text_gap", self.text_gap),
        ];
        for (name, value) in non_negative {
            if !(value.as_points() >= 0.0) || !value.as_points().is_finite() {
                return invalid(format!("{} must not be negative", name));
            }
        }

        if self.qr_size.as_points() > self.label_width.as_points()
            || self.qr_size.as_points() > self.label_height.as_points()
        {
            return invalid("qr_size does not fit inside a label".to_string());
        }

        let grid_width = self.left_margin.as_points()
            + self.columns as f64 * self.label_width.as_points()
            + (self.columns - 1) as f64 * self.column_gap.as_points();
        let grid_height = self.top_margin.as_points()
            + self.rows as f64 * self.label_height.as_points()
            + (self.rows - 1) as f64 * self.row_gap.as_points();

        // Small tolerance for unit conversion rounding.
        if grid_width > self.page_width.as_points() + 0.01 {
            return invalid(format!(
                "grid is {:.1} mm wide but the page is {:.1} mm",
                Dimension(grid_width).as_mm(),
                self.page_width.as_mm()
            ));
        }
        if grid_height > self.page_height.as_points() + 0.01 {
            return invalid(format!(
                "grid is {:.1} mm tall but the page is {:.1} mm",
                Dimension(grid_height).as_mm(),
                self.page_height.as_mm()
            ));
        }

        Ok(())
    }
}

impl Default for SheetGeometry {
    fn default() -> Self {
        Self::sl655()
    }
}

/// Load a layout override file and validate the resulting geometry.
pub fn load_layout_config(path: &Path) -> Result<SheetGeometry, LabelError> {
    let layout_error = |message: String| LabelError::LayoutFile {
        path: path.to_path_buf(),
        message,
    };

    let file = File::open(path).map_err(|e| layout_error(e.to_string()))?;
    let reader = BufReader::new(file);
    let geometry: SheetGeometry =
        serde_json::from_reader(reader).map_err(|e| layout_error(e.to_string()))?;

    geometry.validate()?;
    Ok(geometry)
}
