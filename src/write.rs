//!
//! # CC6 Session Writer
//!
//! The [Cc6Writer] session owns the three output sinks (command stream,
//! vector drawing, log) and the accepted/error counters. Its lifecycle is a
//! scoped-resource pair: [Cc6Writer::open] writes the headers both formats
//! require and returns the live session; [Cc6Writer::close] consumes it,
//! writes the terminators, and flushes summary statistics. Because `open` is
//! the only constructor and `close` takes the session by value, drawing
//! against an unopened or already-closed session is unrepresentable.
//!
//! Every primitive drawing call quantizes its coordinates, validates bounds
//! and dose, and then either emits to both sinks (incrementing the accepted
//! counter) or is dropped (incrementing the error counter) -- exactly one of
//! the two, never both, never neither. Commands appear on the stream in call
//! order; the hardware executes the stream as a program.
//!

// Std-Lib
use std::fs::File;
use std::io::{BufWriter, Write};

// Crates.io
use tracing::{debug, warn};

// Local imports
use crate::data::{Cc6Record, EbConfig, EbResult, Reject, SessionStats};
use crate::dxf::{DxfEntity, DxfWriter, COLOR_BYLAYER, COLOR_FOREGROUND};
use crate::grid::{out_of_bounds, out_of_dose, quantize};

/// Radius of the circle marking a spot in the vector drawing (nm)
const SPOT_MARK_RADIUS: f64 = 5.0;

///
/// # CC6 Writer Session
///
/// Created by [Cc6Writer::open], finalized by [Cc6Writer::close].
/// All drawing operations happen between the two.
///
pub struct Cc6Writer {
    /// Device configuration
    config: EbConfig,
    /// Commands accepted and written to both sinks
    accepted: u64,
    /// Primitive calls rejected by validation
    errors: u64,
    /// Command-stream destination
    cc6: BufWriter<File>,
    /// Vector-drawing destination
    dxf: DxfWriter,
    /// Log destination, mirrored to stdout
    log: BufWriter<File>,
}

impl Cc6Writer {
    /// Open a new session writing to `<name>.CC6`, `<name>.dxf`, and
    /// `<name>_log.txt`, and emit both file headers.
    pub fn open(config: EbConfig, name: &str) -> EbResult<Self> {
        let mut cc6 = BufWriter::new(File::create(format!("{}.CC6", name))?);
        cc6.write_all(b"PATTERN\r\n")?;
        let dxf = DxfWriter::open(&format!("{}.dxf", name))?;
        let log = BufWriter::new(File::create(format!("{}_log.txt", name))?);
        debug!(name, "opened CC6 session");
        Ok(Self {
            config,
            accepted: 0,
            errors: 0,
            cc6,
            dxf,
            log,
        })
    }
    /// Finalize the session: write the CC6 end-of-pattern marker and Ctrl-Z
    /// terminator, close the drawing, and flush summary statistics to the
    /// log. The capacity check against [EbConfig::max_commands] happens here
    /// and only here; a session over the cap is still finalized normally so
    /// operators can inspect the (unusable) output.
    pub fn close(self) -> EbResult<SessionStats> {
        let Self {
            config,
            accepted,
            errors,
            mut cc6,
            dxf,
            mut log,
        } = self;

        // CC6 footer: end marker, then a lone Ctrl-Z byte with no newline
        cc6.write_all(b"END\r\n")?;
        cc6.write_all(&[0x1a])?;
        cc6.flush()?;

        dxf.close()?;

        let cap_exceeded = accepted > config.max_commands;
        log_line(&mut log, &format!("Objects: {:10}", accepted))?;
        log_line(&mut log, &format!("Errors:  {:10}", errors))?;
        if cap_exceeded {
            warn!(accepted, cap = config.max_commands, "command cap exceeded");
            log_line(
                &mut log,
                "Number of objects exceeded maximum limit. Please do not use this file.",
            )?;
        }
        log.flush()?;

        Ok(SessionStats {
            accepted,
            errors,
            cap_exceeded,
        })
    }
    /// Get the session configuration
    pub fn config(&self) -> &EbConfig {
        &self.config
    }
    /// Get the accepted-command count
    pub fn accepted(&self) -> u64 {
        self.accepted
    }
    /// Get the rejected-command count
    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// Draw a straight exposure line from (`x1`,`y1`) to (`x2`,`y2`) (nm)
    /// at dose `dose` (µs). Rejected if the dose is out of range, either
    /// endpoint is out of bounds, or the endpoints coincide after
    /// quantization.
    pub fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, dose: f64) -> EbResult<()> {
        let unit = self.config.unit;
        let (sx, sy) = (quantize(x1, unit), quantize(y1, unit));
        let (ex, ey) = (quantize(x2, unit), quantize(y2, unit));
        if self.bad_dose(dose) {
            return self.reject(Reject::Dose);
        }
        if self.out_of_field(sx, sy) || self.out_of_field(ex, ey) || (sx == ex && sy == ey) {
            return self.reject(Reject::Geometry);
        }
        let record = Cc6Record::Line {
            x1: self.grid_x(sx),
            y1: self.grid_y(sy),
            x2: self.grid_x(ex),
            y2: self.grid_y(ey),
            dose,
        };
        let line = DxfEntity::Line {
            x1: sx,
            y1: sy,
            x2: ex,
            y2: ey,
            color: COLOR_FOREGROUND,
        };
        self.emit(&[record], &[line])
    }

    /// Draw the outline of a rectangle given two opposite corners (nm), as
    /// four thin exposure lines. Rejected if the dose is out of range,
    /// either corner is out of bounds, or the corners share an x or y
    /// coordinate after quantization (degenerate rectangle).
    ///
    /// Counts as one accepted command even though four edge records are
    /// written: the four edges stand or fall together.
    pub fn draw_rect_outline(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        dose: f64,
    ) -> EbResult<()> {
        let (sx, sy, ex, ey) = match self.checked_rect(x1, y1, x2, y2, dose) {
            Ok(corners) => corners,
            Err(r) => return self.reject(r),
        };
        let (left, top) = (self.grid_x(sx), self.grid_y(sy));
        let (right, bottom) = (self.grid_x(ex), self.grid_y(ey));
        let records = [
            // Top edge
            Cc6Record::Line {
                x1: left,
                y1: top,
                x2: right,
                y2: top,
                dose,
            },
            // Bottom edge
            Cc6Record::Line {
                x1: left,
                y1: bottom,
                x2: right,
                y2: bottom,
                dose,
            },
            // Left edge
            Cc6Record::Line {
                x1: left,
                y1: top,
                x2: left,
                y2: bottom,
                dose,
            },
            // Right edge
            Cc6Record::Line {
                x1: right,
                y1: top,
                x2: right,
                y2: bottom,
                dose,
            },
        ];
        let edge = |ax, ay, bx, by| DxfEntity::Line {
            x1: ax,
            y1: ay,
            x2: bx,
            y2: by,
            color: COLOR_FOREGROUND,
        };
        let entities = [
            edge(sx, sy, ex, sy),
            edge(sx, ey, ex, ey),
            edge(sx, sy, sx, ey),
            edge(ex, sy, ex, ey),
        ];
        self.emit(&records, &entities)
    }

    /// Draw a filled rectangular exposure region given two opposite corners
    /// (nm). Same rejection rule as [Cc6Writer::draw_rect_outline]; emits a
    /// single `DWSL` region record plus a closed five-vertex polyline in the
    /// drawing.
    pub fn draw_rect_filled(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        dose: f64,
    ) -> EbResult<()> {
        let (sx, sy, ex, ey) = match self.checked_rect(x1, y1, x2, y2, dose) {
            Ok(corners) => corners,
            Err(r) => return self.reject(r),
        };
        let record = Cc6Record::FilledRect {
            x1: self.grid_x(sx),
            y1: self.grid_y(sy),
            x2: self.grid_x(ex),
            y2: self.grid_y(ey),
            dose,
        };
        let outline = DxfEntity::Polyline {
            vertices: vec![(sx, sy), (ex, sy), (ex, ey), (sx, ey), (sx, sy)],
            color: COLOR_BYLAYER,
        };
        self.emit(&[record], &[outline])
    }

    /// Draw a single exposure spot at (`x`,`y`) (nm). Rejected if the dose
    /// is out of range or the point is out of bounds. The drawing gets a
    /// small circle with a crosshair for visual verification.
    pub fn draw_spot(&mut self, x: f64, y: f64, dose: f64) -> EbResult<()> {
        let unit = self.config.unit;
        let (ax, ay) = (quantize(x, unit), quantize(y, unit));
        if self.bad_dose(dose) {
            return self.reject(Reject::Dose);
        }
        if self.out_of_field(ax, ay) {
            return self.reject(Reject::Geometry);
        }
        let record = Cc6Record::Spot {
            x: self.grid_x(ax),
            y: self.grid_y(ay),
            dose,
        };
        let r = SPOT_MARK_RADIUS;
        let entities = [
            DxfEntity::Circle {
                cx: ax,
                cy: ay,
                radius: r,
                color: COLOR_BYLAYER,
            },
            DxfEntity::Line {
                x1: ax - r,
                y1: ay,
                x2: ax + r,
                y2: ay,
                color: COLOR_BYLAYER,
            },
            DxfEntity::Line {
                x1: ax,
                y1: ay - r,
                x2: ax,
                y2: ay + r,
                color: COLOR_BYLAYER,
            },
        ];
        self.emit(&[record], &entities)
    }

    /// Draw a chip marker: four filled bars of width `width` (nm) along the
    /// field edges, for locating the field under a microscope.
    pub fn draw_chip_marker(&mut self, width: f64, dose: f64) -> EbResult<()> {
        let field = self.config.field_size;
        // Left
        self.draw_rect_filled(0.0, width, width, field - width, dose)?;
        // Right
        self.draw_rect_filled(field - width, width, field, field - width, dose)?;
        // Top
        self.draw_rect_filled(width, field - width, field - width, field, dose)?;
        // Bottom
        self.draw_rect_filled(width, 0.0, field - width, width, dose)?;
        Ok(())
    }

    /// Draw a stigmation-check star: `line_count` radial lines spaced evenly
    /// around (`cx`,`cy`), each starting `center_dist` from the center and
    /// extending `length` outward.
    pub fn draw_stigma_checker(
        &mut self,
        cx: f64,
        cy: f64,
        center_dist: f64,
        length: f64,
        dose: f64,
        line_count: usize,
    ) -> EbResult<()> {
        let step = std::f64::consts::TAU / line_count as f64;
        for i in 0..line_count {
            let theta = step * i as f64;
            let x1 = cx + center_dist * theta.cos();
            let y1 = cy + center_dist * theta.sin();
            let x2 = cx + (center_dist + length) * theta.cos();
            let y2 = cy + (center_dist + length) * theta.sin();
            self.draw_line(x1, y1, x2, y2, dose)?;
        }
        Ok(())
    }

    /// Validate and normalize a rectangle's quantized corners.
    /// Returns (left-x, top-y, right-x, bottom-y) in nm, or the rejection
    /// reason. "Top" is the larger y: the drawing's y-axis points up.
    fn checked_rect(
        &self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        dose: f64,
    ) -> Result<(f64, f64, f64, f64), Reject> {
        let unit = self.config.unit;
        let (mut sx, mut sy) = (quantize(x1, unit), quantize(y1, unit));
        let (mut ex, mut ey) = (quantize(x2, unit), quantize(y2, unit));
        if self.bad_dose(dose) {
            return Err(Reject::Dose);
        }
        if self.out_of_field(sx, sy) || self.out_of_field(ex, ey) || sx == ex || sy == ey {
            return Err(Reject::Geometry);
        }
        if sx > ex {
            std::mem::swap(&mut sx, &mut ex);
        }
        if ey > sy {
            std::mem::swap(&mut sy, &mut ey);
        }
        Ok((sx, sy, ex, ey))
    }
    /// Whether quantized point (`x`,`y`) lies outside the field
    fn out_of_field(&self, x: f64, y: f64) -> bool {
        out_of_bounds(x, y, self.config.field_size)
    }
    /// Whether `dose` is outside the device limits
    fn bad_dose(&self, dose: f64) -> bool {
        out_of_dose(dose, self.config.dose_min, self.config.dose_max)
    }
    /// Convert a quantized x-coordinate (nm) to stream grid units
    fn grid_x(&self, x: f64) -> i64 {
        (x / self.config.unit).round() as i64
    }
    /// Convert a quantized y-coordinate (nm) to stream grid units.
    /// The command stream's vertical axis is mirrored relative to the
    /// drawing's: the stream encodes y as `field_size - y`.
    fn grid_y(&self, y: f64) -> i64 {
        ((self.config.field_size - y) / self.config.unit).round() as i64
    }
    /// Accept one command: write `records` to the stream and `entities` to
    /// the drawing, in order, and bump the accepted counter once.
    fn emit(&mut self, records: &[Cc6Record], entities: &[DxfEntity]) -> EbResult<()> {
        for record in records {
            record.encode(&mut self.cc6)?;
        }
        for entity in entities {
            self.dxf.write_entity(entity)?;
        }
        self.accepted += 1;
        Ok(())
    }
    /// Drop one command: bump the error counter and carry on.
    fn reject(&mut self, reason: Reject) -> EbResult<()> {
        debug!(?reason, "rejected primitive");
        self.errors += 1;
        Ok(())
    }
}

/// Write one summary line to the log sink, mirrored to stdout
fn log_line(log: &mut impl Write, info: &str) -> EbResult<()> {
    println!("{}", info);
    write!(log, "{}\r\n", info)?;
    Ok(())
}
