//!
//! # Dot-Chain Placement Engine
//!
//! Builds a motif as a chain of oriented line segments ("dots"), each
//! positioned by a polar offset from a previously placed dot. The chain is an
//! indexed working set: [DotChain::new] allocates a fixed number of slots,
//! [DotChain::set_origin] seeds a slot with an absolute origin, and
//! [DotChain::set_dot] computes one slot from one already-computed reference
//! slot. The dependency structure is a DAG by construction -- every reference
//! must point at a slot that has already been seeded or placed, which this
//! module checks explicitly rather than assuming.
//!
//! Reference integrity is a precondition on the caller's placement logic:
//! violating it (dangling index, reference to an empty slot, drawing an
//! incomplete chain) is a programming error and panics. Geometry and dose
//! problems in the resulting line segments are, as everywhere else, counted
//! rejections on the session.
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::data::{EbResult, Point};
use crate::write::Cc6Writer;

/// # Dot Specification
///
/// One fully placed chain element: its center origin and the two endpoints
/// of its line segment, all in motif-local nanometers, plus its dose time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DotSpec {
    /// Center of the dot
    pub origin: Point,
    /// First endpoint
    pub p1: Point,
    /// Second endpoint
    pub p2: Point,
    /// Dose time (µs)
    pub dose: f64,
}

/// Per-slot placement state
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    /// Never touched; may not be referenced or drawn
    Empty,
    /// Origin assigned via [DotChain::set_origin]; referenceable, not drawable
    Seeded(Point),
    /// Fully computed; referenceable and drawable
    Placed(DotSpec),
}

///
/// # Dot Chain
///
/// Fixed-size working set of [DotSpec] slots for one motif. Discarded after
/// the motif is drawn; a fresh chain is built per motif instance.
///
#[derive(Debug, Clone, PartialEq)]
pub struct DotChain {
    slots: Vec<Slot>,
}

impl DotChain {
    /// Create a chain with `len` empty slots
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![Slot::Empty; len],
        }
    }
    /// Number of slots in the chain
    pub fn len(&self) -> usize {
        self.slots.len()
    }
    /// Whether the chain has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
    /// Seed slot `index` with absolute origin (`x`, `y`) (nm), making it
    /// usable as a reference. The usual chain starts with
    /// `set_origin(0, 0.0, 0.0)`; a non-zero seed compensates accumulated
    /// rounding in long chains.
    pub fn set_origin(&mut self, index: usize, x: f64, y: f64) {
        let slot = self.slot_mut(index);
        *slot = Slot::Seeded(Point::new(x, y));
    }
    /// Place slot `target` relative to slot `reference`:
    /// the new dot's center is the reference origin plus a polar offset of
    /// `offset` nm at `offset_angle` degrees; its endpoints sit `length / 2`
    /// on either side of that center along `angle` degrees. Angles are
    /// measured from the positive x-axis.
    ///
    /// Panics if `reference` has not been seeded or placed, or either index
    /// is out of range. `target` may equal `reference` to upgrade a seeded
    /// slot in place.
    pub fn set_dot(
        &mut self,
        reference: usize,
        target: usize,
        offset: f64,
        offset_angle: f64,
        length: f64,
        angle: f64,
        dose: f64,
    ) {
        let origin = self.origin_of(reference).polar_offset(offset, offset_angle);
        let theta = angle.to_radians();
        let lx = -length * 0.5 * theta.cos();
        let ly = -length * 0.5 * theta.sin();
        let spec = DotSpec {
            origin,
            p1: Point::new(origin.x + lx, origin.y + ly),
            p2: Point::new(origin.x - lx, origin.y - ly),
            dose,
        };
        *self.slot_mut(target) = Slot::Placed(spec);
    }
    /// Get the fully placed [DotSpec] at `index`, if any
    pub fn get(&self, index: usize) -> Option<&DotSpec> {
        match self.slots.get(index) {
            Some(Slot::Placed(spec)) => Some(spec),
            _ => None,
        }
    }
    /// Draw the chain: one line per slot, translated by the motif center
    /// (`cx`, `cy`) (nm). Panics if any slot was never placed -- an
    /// incompletely built chain is a programming error, not a runtime
    /// condition.
    pub fn draw(&self, writer: &mut Cc6Writer, cx: f64, cy: f64) -> EbResult<()> {
        for (index, slot) in self.slots.iter().enumerate() {
            let spec = match slot {
                Slot::Placed(spec) => spec,
                _ => panic!("dot chain slot {} drawn before being placed", index),
            };
            writer.draw_line(
                spec.p1.x + cx,
                spec.p1.y + cy,
                spec.p2.x + cx,
                spec.p2.y + cy,
                spec.dose,
            )?;
        }
        Ok(())
    }
    /// Origin of a referenceable slot; panics on empty or out-of-range slots
    fn origin_of(&self, index: usize) -> Point {
        match self.slots.get(index) {
            Some(Slot::Seeded(origin)) => *origin,
            Some(Slot::Placed(spec)) => spec.origin,
            Some(Slot::Empty) => panic!("dot chain slot {} referenced before being set", index),
            None => panic!(
                "dot chain reference {} out of range for chain of {}",
                index,
                self.slots.len()
            ),
        }
    }
    fn slot_mut(&mut self, index: usize) -> &mut Slot {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .unwrap_or_else(|| panic!("dot chain index {} out of range for chain of {}", index, len))
    }
}
