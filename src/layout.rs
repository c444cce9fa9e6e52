//! Placement of labels on sheets.
//!
//! Labels fill a sheet in row-major order, left to right and top to bottom,
//! before the next sheet begins. All coordinates are PDF points measured from
//! the lower-left corner of the page.

use crate::config::SheetGeometry;
use crate::labels::LabelEntry;

/// Cell within a sheet's grid. Row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: u32,
    pub column: u32,
}

/// A label with its place on the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub identifier: String,
    pub url: String,
    pub number: u64,
    /// Index in the overall sequence.
    pub position: usize,
    pub sheet_index: usize,
    pub cell: Cell,
}

impl Label {
    pub fn cell_index(&self, columns: u32) -> usize {
        (self.cell.row * columns + self.cell.column) as usize
    }
}

/// Drawing instruction for one page.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Square QR code encoding `payload`, lower-left corner at (`x`, `y`).
    QrImage {
        payload: String,
        x: f64,
        y: f64,
        size: f64,
    },
    /// Single line of text centered horizontally on `center_x`.
    Text {
        text: String,
        center_x: f64,
        baseline_y: f64,
        font_size: f64,
    },
}

/// One output page worth of labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub index: usize,
    pub labels: Vec<Label>,
    pub ops: Vec<DrawOp>,
}

/// Number of sheets needed for `count` labels.
pub fn sheet_count(count: usize, labels_per_sheet: usize) -> usize {
    count.div_ceil(labels_per_sheet)
}

pub struct SheetLayout {
    geometry: SheetGeometry,
}

impl SheetLayout {
    pub fn new(geometry: SheetGeometry) -> Self {
        Self { geometry }
    }

    /// Sheet and cell for the label at `position` in the sequence.
    pub fn locate(&self, position: usize) -> (usize, Cell) {
        let per_sheet = self.geometry.labels_per_sheet();
        let columns = self.geometry.columns as usize;
        let within = position % per_sheet;
        let cell = Cell {
            row: (within / columns) as u32,
            column: (within % columns) as u32,
        };
        (position / per_sheet, cell)
    }

    /// Lower-left corner of the QR code in `cell`.
    pub fn qr_origin(&self, cell: Cell) -> (f64, f64) {
        let g = &self.geometry;
        let label_w = g.label_width.as_points();
        let label_h = g.label_height.as_points();
        let qr = g.qr_size.as_points();

        let cell_left = g.left_margin.as_points() + cell.column as f64 * g.column_pitch();
        let cell_top =
            g.page_height.as_points() - g.top_margin.as_points() - cell.row as f64 * g.row_pitch();

        let x = cell_left + (label_w - qr) / 2.0;
        let y = cell_top - label_h + (label_h - qr) / 2.0 + g.qr_lift.as_points();
        (x, y)
    }

    /// Draw instructions for one label: the QR code, then its identifier below.
    pub fn label_ops(&self, label: &Label) -> [DrawOp; 2] {
        let (x, y) = self.qr_origin(label.cell);
        let size = self.geometry.qr_size.as_points();
        [
            DrawOp::QrImage {
                payload: label.url.clone(),
                x,
                y,
                size,
            },
            DrawOp::Text {
                text: label.identifier.clone(),
                center_x: x + size / 2.0,
                baseline_y: y - self.geometry.text_gap.as_points(),
                font_size: self.geometry.font_size.as_points(),
            },
        ]
    }

    /// Assign every entry to a sheet and cell and build each sheet's drawing.
    pub fn paginate(&self, entries: Vec<LabelEntry>) -> Vec<Sheet> {
        let per_sheet = self.geometry.labels_per_sheet();
        let mut sheets: Vec<Sheet> = Vec::with_capacity(sheet_count(entries.len(), per_sheet));

        for (position, entry) in entries.into_iter().enumerate() {
            let (sheet_index, cell) = self.locate(position);
            let label = Label {
                identifier: entry.identifier,
                url: entry.url,
                number: entry.number,
                position,
                sheet_index,
                cell,
            };

            if sheets.len() == sheet_index {
                sheets.push(Sheet {
                    index: sheet_index,
                    labels: Vec::with_capacity(per_sheet),
                    ops: Vec::with_capacity(per_sheet * 2),
                });
            }
            let sheet = &mut sheets[sheet_index];
            sheet.ops.extend(self.label_ops(&label));
            sheet.labels.push(label);
        }

        sheets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelRequest;

    fn layout() -> SheetLayout {
        SheetLayout::new(SheetGeometry::sl655())
    }

    fn sheets_for(count: i64) -> Vec<Sheet> {
        let entries = LabelRequest::new("https://example.com/item/", count)
            .entries()
            .unwrap();
        layout().paginate(entries)
    }

    #[test]
    fn test_sheet_count_rounds_up() {
        assert_eq!(sheet_count(1, 24), 1);
        assert_eq!(sheet_count(24, 24), 1);
        assert_eq!(sheet_count(25, 24), 2);
        assert_eq!(sheet_count(48, 24), 2);
        assert_eq!(sheet_count(49, 24), 3);
    }

    #[test]
    fn test_paginate_matches_sheet_count() {
        for count in [1, 23, 24, 25, 47, 48, 100] {
            let sheets = sheets_for(count);
            assert_eq!(sheets.len(), sheet_count(count as usize, 24), "count {}", count);
            let total: usize = sheets.iter().map(|s| s.labels.len()).sum();
            assert_eq!(total, count as usize);
        }
    }

    #[test]
    fn test_fill_order_is_row_major() {
        let layout = layout();
        assert_eq!(layout.locate(0), (0, Cell { row: 0, column: 0 }));
        assert_eq!(layout.locate(3), (0, Cell { row: 0, column: 3 }));
        assert_eq!(layout.locate(4), (0, Cell { row: 1, column: 0 }));
        assert_eq!(layout.locate(23), (0, Cell { row: 5, column: 3 }));
        assert_eq!(layout.locate(24), (1, Cell { row: 0, column: 0 }));
        assert_eq!(layout.locate(50), (2, Cell { row: 0, column: 2 }));
    }

    #[test]
    fn test_labels_keep_sequence_positions() {
        let sheets = sheets_for(30);
        assert_eq!(sheets[0].labels.len(), 24);
        assert_eq!(sheets[1].labels.len(), 6);

        let first_on_second = &sheets[1].labels[0];
        assert_eq!(first_on_second.identifier, "ITEM-0025");
        assert_eq!(first_on_second.position, 24);
        assert_eq!(first_on_second.sheet_index, 1);
        assert_eq!(first_on_second.cell_index(4), 0);

        for sheet in &sheets {
            for (i, label) in sheet.labels.iter().enumerate() {
                assert_eq!(label.cell_index(4), i);
                assert_eq!(label.sheet_index, sheet.index);
            }
        }
    }

    #[test]
    fn test_first_cell_coordinates() {
        // Left margin 56.25pt, label 108pt, QR 86.4pt, top margin 36pt,
        // lift 3.6pt on a 792pt page.
        let (x, y) = layout().qr_origin(Cell { row: 0, column: 0 });
        assert!((x - 67.05).abs() < 1e-9);
        assert!((y - 662.4).abs() < 1e-9);
    }

    #[test]
    fn test_last_cell_coordinates() {
        let (x, y) = layout().qr_origin(Cell { row: 5, column: 3 });
        // 3 columns of 130.5pt pitch, 5 rows of 122.4pt pitch
        assert!((x - (67.05 + 3.0 * 130.5)).abs() < 1e-9);
        assert!((y - (662.4 - 5.0 * 122.4)).abs() < 1e-9);
        assert!(y > 0.0);
    }

    #[test]
    fn test_label_ops_put_text_below_qr() {
        let sheets = sheets_for(1);
        let ops = &sheets[0].ops;
        assert_eq!(ops.len(), 2);
        match (&ops[0], &ops[1]) {
            (
                DrawOp::QrImage { payload, x, y, size },
                DrawOp::Text { text, center_x, baseline_y, font_size },
            ) => {
                assert_eq!(payload, "https://example.com/item/ITEM-0001");
                assert_eq!(text, "ITEM-0001");
                assert!((center_x - (x + size / 2.0)).abs() < 1e-9);
                assert!((baseline_y - (y - 7.2)).abs() < 1e-9);
                assert_eq!(*font_size, 8.0);
            }
            other => panic!("unexpected ops: {:?}", other),
        }
    }

    #[test]
    fn test_paginate_is_deterministic() {
        assert_eq!(sheets_for(37), sheets_for(37));
    }

    #[test]
    fn test_custom_grid() {
        let geometry = SheetGeometry {
            columns: 2,
            rows: 3,
            ..SheetGeometry::sl655()
        };
        let layout = SheetLayout::new(geometry);
        assert_eq!(layout.locate(5), (0, Cell { row: 2, column: 1 }));
        assert_eq!(layout.locate(6), (1, Cell { row: 0, column: 0 }));
    }
}
