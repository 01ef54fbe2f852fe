//!
//! # Two-Level Tiling Driver
//!
//! Arranges motif instances on a two-level grid: an outer grid of blocks,
//! each containing an inner grid of cells, each cell hosting one motif. The
//! driver reserves space at the top-left of every block for a 10-bit marker
//! encoding the block's (column, row) position, and centers the whole tiling
//! within the exposure field.
//!
//! Motif geometry is injected as a shape function called once per cell with
//! the cell's [MotifSite]; the driver is topology-agnostic and never inspects
//! what the function draws.
//!

// Crates.io
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

// Local imports
use crate::data::{EbError, EbResult};
use crate::write::Cc6Writer;

/// Largest outer-grid extent whose block positions fit a 5-bit marker code
const MARKER_CODE_LIMIT: usize = 32;

///
/// # Motif Site
///
/// Everything a shape function may parameterize on: the motif center within
/// the field, and the motif's position at both grid levels. Per-motif dose
/// and length formulas commonly vary with these indices so that neighboring
/// motifs form a parameter sweep.
///
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MotifSite {
    /// Motif center x within the field (nm)
    pub cx: f64,
    /// Motif center y within the field (nm)
    pub cy: f64,
    /// Cell column within the block
    pub cell_col: usize,
    /// Cell row within the block
    pub cell_row: usize,
    /// Block column within the field
    pub block_col: usize,
    /// Block row within the field
    pub block_row: usize,
}

///
/// # Tile Grid Specification
///
/// Counts and pitches of the two grid levels. Block pitch is derived:
/// cell pitch times inner count, plus two marker sizes of reserved space.
///
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[builder(pattern = "owned", setter(into))]
pub struct TileGrid {
    /// Inner-grid (cells per block) column count
    pub inner_cols: usize,
    /// Inner-grid row count
    pub inner_rows: usize,
    /// Outer-grid (blocks per field) column count
    #[builder(default = "1")]
    pub outer_cols: usize,
    /// Outer-grid row count
    #[builder(default = "1")]
    pub outer_rows: usize,
    /// Cell pitch along x (nm)
    pub cell_width: f64,
    /// Cell pitch along y (nm)
    pub cell_height: f64,
    /// Full width of each block marker (nm); zero disables markers
    #[builder(default = "1400.0")]
    pub marker_size: f64,
    /// Dose time for block markers (µs)
    #[builder(default = "3.0")]
    pub marker_dose: f64,
}
impl TileGrid {
    /// Check the grid is drawable: non-zero counts, and block positions that
    /// fit the 5-bit marker code when markers are enabled.
    pub fn validate(&self) -> EbResult<()> {
        if self.inner_cols == 0 || self.inner_rows == 0 || self.outer_cols == 0 || self.outer_rows == 0
        {
            return Err(EbError::Config(format!(
                "tile grid has a zero count: {}x{} blocks of {}x{} cells",
                self.outer_cols, self.outer_rows, self.inner_cols, self.inner_rows
            )));
        }
        if self.marker_size > 0.0
            && (self.outer_cols > MARKER_CODE_LIMIT || self.outer_rows > MARKER_CODE_LIMIT)
        {
            return Err(EbError::Config(format!(
                "{}x{} blocks exceed the {}-position marker code",
                self.outer_cols, self.outer_rows, MARKER_CODE_LIMIT
            )));
        }
        Ok(())
    }
    /// Block pitch along x (nm)
    pub fn block_width(&self) -> f64 {
        self.marker_size * 2.0 + self.cell_width * self.inner_cols as f64
    }
    /// Block pitch along y (nm)
    pub fn block_height(&self) -> f64 {
        self.marker_size * 2.0 + self.cell_height * self.inner_rows as f64
    }
}

impl From<TileGridBuilderError> for EbError {
    fn from(e: TileGridBuilderError) -> Self {
        EbError::Config(e.to_string())
    }
}

impl Cc6Writer {
    /// Tile the field with motif instances per `grid`, invoking `shape` once
    /// per cell and drawing one filled 10-bit marker per block (unless
    /// `grid.marker_size` is zero). The tiling as a whole is centered within
    /// the field.
    pub fn tile<F>(&mut self, grid: &TileGrid, mut shape: F) -> EbResult<()>
    where
        F: FnMut(&mut Cc6Writer, &MotifSite) -> EbResult<()>,
    {
        grid.validate()?;
        let block_w = grid.block_width();
        let block_h = grid.block_height();
        let total_w = block_w * grid.outer_cols as f64;
        let total_h = block_h * grid.outer_rows as f64;
        let x0 = (self.config().field_size - total_w) / 2.0;
        let y0 = (self.config().field_size - total_h) / 2.0;

        for block_row in 0..grid.outer_rows {
            for block_col in 0..grid.outer_cols {
                // Inner-grid origin: marker space sits to the block's left
                let inner_x0 = x0 + block_col as f64 * block_w + grid.marker_size * 2.0;
                let inner_y0 = y0 + block_row as f64 * block_h;
                for cell_row in 0..grid.inner_rows {
                    for cell_col in 0..grid.inner_cols {
                        let site = MotifSite {
                            cx: inner_x0 + grid.cell_width * (cell_col as f64 + 0.5),
                            cy: inner_y0 + grid.cell_height * (cell_row as f64 + 0.5),
                            cell_col,
                            cell_row,
                            block_col,
                            block_row,
                        };
                        shape(self, &site)?;
                    }
                }
                if grid.marker_size > 0.0 {
                    self.draw_marker(
                        block_col as u8,
                        block_row as u8,
                        inner_x0 - grid.marker_size,
                        inner_y0 + grid.marker_size + grid.inner_rows as f64 * grid.cell_height,
                        grid.marker_dose,
                        grid.marker_size,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Tile the entire field with a single unmarked periodic grid: inner
    /// counts are derived from the field size and cell pitch, the outer grid
    /// is 1x1, and no marker space is reserved. Used for simple periodic
    /// samples where per-block identification is unnecessary.
    pub fn tile_full_field<F>(&mut self, cell_width: f64, cell_height: f64, shape: F) -> EbResult<()>
    where
        F: FnMut(&mut Cc6Writer, &MotifSite) -> EbResult<()>,
    {
        let field = self.config().field_size;
        let grid = TileGrid {
            inner_cols: (field / cell_width) as usize,
            inner_rows: (field / cell_height) as usize,
            outer_cols: 1,
            outer_rows: 1,
            cell_width,
            cell_height,
            marker_size: 0.0,
            marker_dose: 0.0,
        };
        self.tile(&grid, shape)
    }
}
