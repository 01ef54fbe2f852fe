//!
//! # DXF Entity Encoding and Writing
//!
//! A minimal writer for the ASCII DXF (R12) ENTITIES section, covering the
//! three entity kinds the drawing sink needs: LINE, CIRCLE, and closed
//! POLYLINE. Geometry is written in the pre-mirror coordinate system, i.e.
//! physical nanometers with y as-is, so the drawing can be overlaid on
//! microscope images directly.
//!

// Std-Lib
use std::fs::File;
use std::io::{BufWriter, Write};

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::data::EbResult;

/// AutoCAD color index for plain white/black geometry
pub const COLOR_FOREGROUND: i16 = 7;
/// AutoCAD "BYLAYER" color index, used where no explicit color is wanted
pub const COLOR_BYLAYER: i16 = 256;

///
/// # Dxf Entity Enumeration
///
/// The graphical elements paired one-to-one (or few-to-one) with accepted
/// CC6 commands. Coordinates are nanometers, unmirrored.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DxfEntity {
    /// Straight line segment
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: i16,
    },
    /// Circle, used with crosshair lines to mark exposure spots
    Circle {
        cx: f64,
        cy: f64,
        radius: f64,
        color: i16,
    },
    /// Closed polyline; the final vertex should repeat the first
    Polyline { vertices: Vec<(f64, f64)>, color: i16 },
}

/// Dxf Writing Helper
pub struct DxfWriter {
    /// Write Destination
    dest: BufWriter<File>,
}
impl DxfWriter {
    /// Create a new [DxfWriter] writing to file `fname`,
    /// and emit the ENTITIES section opener.
    pub fn open(fname: &str) -> EbResult<Self> {
        let dest = BufWriter::new(File::create(fname)?);
        let mut this = Self { dest };
        this.pair(0, "SECTION")?;
        this.pair(2, "ENTITIES")?;
        Ok(this)
    }
    /// Encode `entity` onto the destination as DXF group-code pairs
    pub fn write_entity(&mut self, entity: &DxfEntity) -> EbResult<()> {
        match entity {
            DxfEntity::Line {
                x1,
                y1,
                x2,
                y2,
                color,
            } => {
                self.pair(0, "LINE")?;
                self.pair(8, "0")?;
                self.pair_i16(62, *color)?;
                self.pair_f64(10, *x1)?;
                self.pair_f64(20, *y1)?;
                self.pair_f64(11, *x2)?;
                self.pair_f64(21, *y2)?;
            }
            DxfEntity::Circle {
                cx,
                cy,
                radius,
                color,
            } => {
                self.pair(0, "CIRCLE")?;
                self.pair(8, "0")?;
                self.pair_i16(62, *color)?;
                self.pair_f64(10, *cx)?;
                self.pair_f64(20, *cy)?;
                self.pair_f64(40, *radius)?;
            }
            DxfEntity::Polyline { vertices, color } => {
                self.pair(0, "POLYLINE")?;
                self.pair(8, "0")?;
                self.pair_i16(62, *color)?;
                // Group 66: vertices follow
                self.pair(66, "1")?;
                for (x, y) in vertices.iter() {
                    self.pair(0, "VERTEX")?;
                    self.pair(8, "0")?;
                    self.pair_f64(10, *x)?;
                    self.pair_f64(20, *y)?;
                }
                self.pair(0, "SEQEND")?;
            }
        };
        Ok(())
    }
    /// Write the section and file terminators and flush the destination.
    /// A [DxfWriter] dropped without `close` leaves an unterminated,
    /// invalid file.
    pub fn close(mut self) -> EbResult<()> {
        self.pair(0, "ENDSEC")?;
        self.pair(0, "EOF")?;
        self.dest.flush()?;
        Ok(())
    }
    /// Write one (group-code, string-value) pair
    fn pair(&mut self, code: u16, value: &str) -> EbResult<()> {
        write!(self.dest, "{}\r\n{}\r\n", code, value)?;
        Ok(())
    }
    /// Write one (group-code, float-value) pair
    fn pair_f64(&mut self, code: u16, value: f64) -> EbResult<()> {
        write!(self.dest, "{}\r\n{}\r\n", code, value)?;
        Ok(())
    }
    /// Write one (group-code, integer-value) pair
    fn pair_i16(&mut self, code: u16, value: i16) -> EbResult<()> {
        write!(self.dest, "{}\r\n{}\r\n", code, value)?;
        Ok(())
    }
}
