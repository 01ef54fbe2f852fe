//!
//! # Ebl21 Data Model
//!
//! Session configuration, the quantized command enumeration written to the
//! CC6 stream, and the crate-wide error types.
//!

// Std-Lib
use std::error::Error;
use std::io::Write;

// Crates.io
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// # Point in two-dimensional physical space
///
/// Coordinates are in nanometers, prior to exposure-grid quantization.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}
impl Point {
    /// Create a new [Point] from (x,y) coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
    /// Create a new [Point] shifted by `p`
    pub fn shift(&self, p: Point) -> Point {
        Point {
            x: self.x + p.x,
            y: self.y + p.y,
        }
    }
    /// Create a new [Point] at distance `r` and angle `theta_deg`
    /// (degrees, measured from the positive x-axis) from `self`
    pub fn polar_offset(&self, r: f64, theta_deg: f64) -> Point {
        let theta = theta_deg.to_radians();
        Point {
            x: self.x + r * theta.cos(),
            y: self.y + r * theta.sin(),
        }
    }
}

///
/// # Session Configuration
///
/// Device-level parameters of one exposure field. All fields have defaults
/// matching the machine's shipped settings; override any subset through
/// [EbConfigBuilder].
///
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[builder(pattern = "owned", setter(into))]
pub struct EbConfig {
    /// Grid unit: nanometers per addressable exposure step.
    /// The 300 µm field is addressed in 60,000 steps of 5 nm.
    #[builder(default = "5.0")]
    pub unit: f64,
    /// Side length of the square exposure field (nm)
    #[builder(default = "300_000.0")]
    pub field_size: f64,
    /// Minimum legal dose time (µs)
    #[builder(default = "0.1")]
    pub dose_min: f64,
    /// Maximum legal dose time (µs)
    #[builder(default = "3200.0")]
    pub dose_max: f64,
    /// Device limit on accepted commands. Exceeding it is detected at close
    /// and reported in the log; the files are still finalized.
    #[builder(default = "16_000_000")]
    pub max_commands: u64,
}
impl Default for EbConfig {
    fn default() -> Self {
        Self {
            unit: 5.0,
            field_size: 300_000.0,
            dose_min: 0.1,
            dose_max: 3200.0,
            max_commands: 16_000_000,
        }
    }
}

///
/// # CC6 Command Record
///
/// One quantized, validated primitive, in the coordinate system of the
/// command stream: integer grid units, y-axis already mirrored
/// (`field_size - y`). Records are ephemeral; they are constructed, encoded
/// onto the stream, and dropped within a single drawing call.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Cc6Record {
    /// Exposure line: `DWLL(x1,y1,x2,y2,dose)`
    Line {
        x1: i64,
        y1: i64,
        x2: i64,
        y2: i64,
        dose: f64,
    },
    /// Filled rectangular region: `DWSL(x1,y1,x2,y2,1,dose)`
    FilledRect {
        x1: i64,
        y1: i64,
        x2: i64,
        y2: i64,
        dose: f64,
    },
    /// Single exposure spot: `DWSPS(x,y,10,dose)`
    Spot { x: i64, y: i64, dose: f64 },
}
impl Cc6Record {
    /// Encode onto `dest` in the device's line-oriented text syntax.
    /// Every record is CRLF-terminated; dose is formatted to one decimal.
    pub fn encode(&self, dest: &mut dyn Write) -> EbResult<()> {
        match self {
            Cc6Record::Line {
                x1,
                y1,
                x2,
                y2,
                dose,
            } => write!(dest, "DWLL({},{},{},{},{:.1}) ;3\r\n", x1, y1, x2, y2, dose)?,
            Cc6Record::FilledRect {
                x1,
                y1,
                x2,
                y2,
                dose,
            } => write!(
                dest,
                "DWSL({},{},{},{},1,{:.1}) ;3\r\n",
                x1, y1, x2, y2, dose
            )?,
            Cc6Record::Spot { x, y, dose } => {
                write!(dest, "DWSPS({},{},10,{:.1}) ;2\r\n", x, y, dose)?
            }
        };
        Ok(())
    }
}

/// # Rejection Reason
/// Why a primitive drawing call was dropped rather than emitted.
/// Rejections are counted session outcomes, not [EbError]s: a rejected shape
/// never aborts generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reject {
    /// Degenerate or out-of-bounds geometry
    Geometry,
    /// Dose time outside the device limits
    Dose,
}

/// # Session Summary Statistics
/// Returned by [crate::Cc6Writer::close], after both sinks are finalized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStats {
    /// Commands accepted and written to both sinks
    pub accepted: u64,
    /// Primitive calls rejected by validation
    pub errors: u64,
    /// Whether the accepted count exceeded the device's command cap
    pub cap_exceeded: bool,
}

/// # EbResult Type-Alias
pub type EbResult<T> = Result<T, EbError>;

///
/// # Ebl21 Error Enumeration
///
/// Process-level failures only: I/O trouble on a sink, or invalid session
/// configuration. Per-primitive geometry and dose rejections are counted in
/// the session (see [Reject]), not raised through this type.
///
#[derive(Debug)]
pub enum EbError {
    /// Invalid configuration, detected before any emission
    Config(String),
    /// Boxed (External) Errors
    Boxed(Box<dyn Error>),
    /// Other errors
    Str(String),
}
impl std::fmt::Display for EbError {
    /// Display an [EbError].
    /// Functionally delegates to the (derived) [std::fmt::Debug] implementation.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl Error for EbError {}
impl From<std::io::Error> for EbError {
    fn from(e: std::io::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<String> for EbError {
    fn from(e: String) -> Self {
        EbError::Str(e)
    }
}
impl From<&str> for EbError {
    fn from(e: &str) -> Self {
        EbError::Str(e.to_string())
    }
}
impl From<EbConfigBuilderError> for EbError {
    fn from(e: EbConfigBuilderError) -> Self {
        EbError::Config(e.to_string())
    }
}
