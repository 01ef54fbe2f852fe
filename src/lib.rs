//!
//! # Ebl21 Electron-Beam Lithography Command-File Writer
//!
//! Ebl21 generates exposure-command files in the line-oriented CC6 text format
//! consumed by an electron-beam lithography tool, and pairs each command file
//! with a DXF vector drawing of the same geometry for review in ordinary CAD
//! viewers.
//!
//! The central type is the [Cc6Writer] session. A session is opened against a
//! destination base-name, producing three files: the command stream
//! (`<name>.CC6`), the vector drawing (`<name>.dxf`), and a plain-text log
//! (`<name>_log.txt`). All drawing operations quantize their physical
//! (nanometer) coordinates onto the device's exposure grid and validate bounds
//! and dose before anything is written; rejected primitives are counted and
//! skipped, never emitted. Closing the session writes the terminators both
//! file formats require and flushes summary statistics to the log.
//!
//! ## Usage
//!
//! ```skip
//! let mut writer = Cc6Writer::open(EbConfig::default(), "my_pattern")?;
//! writer.draw_line(0.0, 0.0, 1000.0, 1000.0, 2.0)?;
//! let stats = writer.close()?;
//! ```
//!
//! Composite shapes are built on top of the primitive operations:
//!
//! * [DotChain] places chains of oriented line segments, each positioned by a
//!   polar offset from a previously placed segment.
//! * [Cc6Writer::draw_marker] renders a (column, row) pair of 5-bit integers
//!   as a spatial arrangement of rectangles, decodable under a microscope.
//! * [Cc6Writer::tile] arranges motif instances on a two-level grid, tagging
//!   each block with one such marker.
//!

pub mod data;
pub mod dots;
pub mod dxf;
pub mod grid;
pub mod marker;
pub mod tile;
pub mod write;

#[cfg(test)]
mod tests;

pub use data::{Cc6Record, EbConfig, EbConfigBuilder, EbError, EbResult, Point, SessionStats};
pub use dots::{DotChain, DotSpec};
pub use dxf::{DxfEntity, DxfWriter};
pub use tile::{MotifSite, TileGrid, TileGridBuilder};
pub use write::Cc6Writer;
