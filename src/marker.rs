//!
//! # 10-Bit Positional Marker Encoder
//!
//! Renders a (column, row) pair of 5-bit integers as a fixed spatial
//! arrangement of rectangles, used to tag tiled regions so a block can be
//! identified under a microscope. Two anchor rectangles frame the code and
//! double as a scale reference; one additional rectangle per set bit sits at
//! a fixed offset from the marker center. Column bits occupy the upper
//! quadrants, row bits the mirrored lower quadrants.
//!
//! The offset table is a cross-generation convention: markers written by
//! different toolchains must decode identically, so [ANCHOR_CELLS],
//! [COL_BIT_CELLS], and [ROW_BIT_CELLS] are reproduced bit-for-bit from the
//! established layout and must not be reordered or renumbered.
//!
//! Two renderers share the layout: [Cc6Writer::draw_marker] uses filled
//! rectangles (small, high-dose fiducials) and [Cc6Writer::draw_line_marker]
//! uses outlined rectangles (large-scale, low-dose fiducials). Callers choose
//! the renderer, never the layout.
//!

// Local imports
use crate::data::EbResult;
use crate::write::Cc6Writer;

/// Number of bit-width cells the marker size is divided into
pub const MARKER_CELLS: f64 = 7.0;

/// The two always-drawn anchor rectangles, as (x1, y1, x2, y2) offsets from
/// the marker center in bit-width multiples
pub const ANCHOR_CELLS: [[f64; 4]; 2] = [
    [-2.5, 2.5, -0.5, 3.5],
    [0.5, 2.5, 2.5, 3.5],
];

/// Rectangle offsets for column bits 0..4 (values 1, 2, 4, 8, 16)
pub const COL_BIT_CELLS: [[f64; 4]; 5] = [
    [-3.5, 0.5, -2.5, 2.5],
    [-2.5, -0.5, -0.5, 0.5],
    [-0.5, 0.5, 0.5, 2.5],
    [0.5, -0.5, 2.5, 0.5],
    [2.5, 0.5, 3.5, 2.5],
];

/// Rectangle offsets for row bits 0..4, mirroring the column quadrants
pub const ROW_BIT_CELLS: [[f64; 4]; 5] = [
    [-3.5, -2.5, -2.5, -0.5],
    [-2.5, -3.5, -0.5, -2.5],
    [-0.5, -2.5, 0.5, -0.5],
    [0.5, -3.5, 2.5, -2.5],
    [2.5, -2.5, 3.5, -0.5],
];

/// Resolve the full rectangle set for code (`col`, `row`): the two anchors
/// plus one cell per set bit, in bit-width multiples relative to the marker
/// center. Pure layout; both renderers and the decodability tests share it.
///
/// Panics if either value needs more than 5 bits.
pub fn marker_cells(col: u8, row: u8) -> Vec<[f64; 4]> {
    assert!(col < 32 && row < 32, "marker code out of 5-bit range: ({}, {})", col, row);
    let mut cells: Vec<[f64; 4]> = ANCHOR_CELLS.to_vec();
    for bit in 0..5 {
        if col & (1 << bit) != 0 {
            cells.push(COL_BIT_CELLS[bit]);
        }
    }
    for bit in 0..5 {
        if row & (1 << bit) != 0 {
            cells.push(ROW_BIT_CELLS[bit]);
        }
    }
    cells
}

/// Marker renderer selection: same layout, different rectangle primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerStyle {
    Filled,
    Outlined,
}

impl Cc6Writer {
    /// Draw a filled-rectangle marker for code (`col`, `row`) centered at
    /// (`cx`, `cy`) (nm). `size` is the full marker width; each cell is
    /// `size / 7`. Typical use: `size` 1400 nm, dose 1.0 µs.
    pub fn draw_marker(
        &mut self,
        col: u8,
        row: u8,
        cx: f64,
        cy: f64,
        dose: f64,
        size: f64,
    ) -> EbResult<()> {
        self.render_marker(col, row, cx, cy, dose, size, MarkerStyle::Filled)
    }
    /// Draw an outlined-rectangle marker for code (`col`, `row`) centered at
    /// (`cx`, `cy`) (nm). Same layout as [Cc6Writer::draw_marker]; intended
    /// for large, low-dose fiducials (`size` on the order of 140 µm).
    pub fn draw_line_marker(
        &mut self,
        col: u8,
        row: u8,
        cx: f64,
        cy: f64,
        dose: f64,
        size: f64,
    ) -> EbResult<()> {
        self.render_marker(col, row, cx, cy, dose, size, MarkerStyle::Outlined)
    }
    fn render_marker(
        &mut self,
        col: u8,
        row: u8,
        cx: f64,
        cy: f64,
        dose: f64,
        size: f64,
        style: MarkerStyle,
    ) -> EbResult<()> {
        let width = size / MARKER_CELLS;
        for [x1, y1, x2, y2] in marker_cells(col, row) {
            let corners = (x1 * width + cx, y1 * width + cy, x2 * width + cx, y2 * width + cy);
            match style {
                MarkerStyle::Filled => {
                    self.draw_rect_filled(corners.0, corners.1, corners.2, corners.3, dose)?
                }
                MarkerStyle::Outlined => {
                    self.draw_rect_outline(corners.0, corners.1, corners.2, corners.3, dose)?
                }
            }
        }
        Ok(())
    }
}
