//! Rotary encoders. Quadrature decoding happens outside this crate, usually in the kernel
//! `rotary-encoder` input driver; an `Encoder` only reports the accumulated position.

use crate::Result;

pub trait Encoder: Send {
    /// Accumulated detent count; clockwise is positive.
    fn position(&mut self) -> Result<i32>;
}

// From <linux/input-event-codes.h>.
pub(crate) const EV_REL: u16 = 0x02;
pub(crate) const EV_ABS: u16 = 0x03;

/// Position along one axis of an input device. The `rotary-encoder` driver reports either
/// relative steps (`EV_REL`) or, with `rotary-encoder,steps`, an absolute position (`EV_ABS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InputAxis {
    axis: u16,
    position: i32,
}

impl InputAxis {
    pub fn new(axis: u16) -> InputAxis {
        InputAxis { axis, position: 0 }
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn apply(&mut self, event_type: u16, code: u16, value: i32) {
        if code != self.axis {
            return
        }
        match event_type {
            EV_REL => self.position = self.position.wrapping_add(value),
            EV_ABS => self.position = value,
            _ => ()
        }
    }
}

/// Tracks the change in position between calls to `delta`.
pub struct EncoderTracker {
    encoder: Box<dyn Encoder>,
    last_position: i32,
}

impl EncoderTracker {
    pub fn new(mut encoder: Box<dyn Encoder>) -> Result<EncoderTracker> {
        let last_position = encoder.position()?;
        Ok(EncoderTracker { encoder, last_position })
    }

    pub fn position(&mut self) -> Result<i32> {
        self.encoder.position()
    }

    pub fn delta(&mut self) -> Result<i32> {
        let position = self.encoder.position()?;
        let delta = position.wrapping_sub(self.last_position);
        self.last_position = position;
        Ok(delta)
    }
}

impl std::fmt::Debug for EncoderTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("EncoderTracker").field("last_position", &self.last_position).finish()
    }
}
