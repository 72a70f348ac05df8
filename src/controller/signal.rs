//! # Signal Mapping
//!
//! Converts raw 10-bit ADC readings into gamepad ranges.
//!
//! ## Sticks
//!
//! Raw readings are centered on 512. Positive deflection is scaled by
//! `32767 / 511`, negative by `32768 / 512`, so both extremes land exactly on
//! the signed 16-bit limits. Readings within half the deadzone of center
//! collapse to 0.
//!
//! ## Triggers
//!
//! Readings below the activation threshold are 0. Above it the reading is
//! normalized against `max_input` and squared, which leaves more travel for
//! light presses:
//!
//! `output = min(255, (min(raw, max_input) / max_input)² × 255)`
//!
//! ## Usage
//!
//! ```
//! use arduino_pad_bridge::controller::signal::{SignalMapper, StickSide};
//!
//! let mapper = SignalMapper::default();
//! assert_eq!(mapper.map_stick(512, StickSide::Left), 0);
//! assert_eq!(mapper.map_stick(1023, StickSide::Left), 32767);
//! assert_eq!(mapper.map_trigger(512, 512), 255);
//! ```

use super::frame::RawFrame;
use super::state::{NormalizedState, AXIS_MAX, AXIS_MIN, TRIGGER_MAX};
use crate::config::MappingConfig;

/// Raw reading at stick rest position
pub const RAW_CENTER: i32 = 512;
/// Largest raw ADC reading
pub const RAW_MAX: i32 = 1023;

/// Which stick a reading belongs to; each has its own deadzone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickSide {
    Left,
    Right,
}

/// Stateless raw-to-gamepad value conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalMapper {
    /// Left stick deadzone in raw counts
    deadzone_left: i32,
    /// Right stick deadzone in raw counts
    deadzone_right: i32,
    /// Trigger readings below this are treated as released
    trigger_threshold: i32,
    /// Trigger reading that maps to full pull
    trigger_max_input: i32,
}

impl Default for SignalMapper {
    fn default() -> Self {
        Self::from_config(&MappingConfig::default())
    }
}

impl SignalMapper {
    #[must_use]
    pub fn from_config(config: &MappingConfig) -> Self {
        Self {
            deadzone_left: config.deadzone_left.max(0),
            deadzone_right: config.deadzone_right.max(0),
            trigger_threshold: config.trigger_threshold,
            trigger_max_input: config.trigger_max_input.max(1),
        }
    }

    /// Maps a raw stick reading (0-1023) to a signed axis value.
    ///
    /// Out-of-range readings are clamped to 0-1023 first.
    ///
    /// # Examples
    ///
    /// ```
    /// use arduino_pad_bridge::controller::signal::{SignalMapper, StickSide};
    ///
    /// let mapper = SignalMapper::default();
    /// assert_eq!(mapper.map_stick(0, StickSide::Right), -32768);
    /// assert!(mapper.map_stick(700, StickSide::Right) > 0);
    /// ```
    #[must_use]
    pub fn map_stick(&self, raw: i32, side: StickSide) -> i32 {
        let centered = raw.clamp(0, RAW_MAX) - RAW_CENTER;
        let deadzone = match side {
            StickSide::Left => self.deadzone_left,
            StickSide::Right => self.deadzone_right,
        };

        if centered.abs() < deadzone / 2 {
            return 0;
        }

        let scaled = if centered > 0 {
            f64::from(centered) / 511.0 * f64::from(AXIS_MAX)
        } else {
            f64::from(centered) / 512.0 * -f64::from(AXIS_MIN)
        };

        (scaled as i32).clamp(AXIS_MIN, AXIS_MAX)
    }

    /// Maps a raw trigger reading to 0-255 using a squared response curve.
    ///
    /// # Examples
    ///
    /// ```
    /// use arduino_pad_bridge::controller::signal::SignalMapper;
    ///
    /// let mapper = SignalMapper::default();
    /// assert_eq!(mapper.map_trigger(9, 512), 0);
    /// assert_eq!(mapper.map_trigger(256, 512), 63);
    /// assert_eq!(mapper.map_trigger(1023, 512), 255);
    /// ```
    #[must_use]
    pub fn map_trigger(&self, raw: i32, max_input: i32) -> i32 {
        if raw < self.trigger_threshold {
            return 0;
        }

        let max_input = max_input.max(1);
        let norm = f64::from(raw.clamp(0, max_input)) / f64::from(max_input);
        ((norm * norm * f64::from(TRIGGER_MAX)) as i32).min(TRIGGER_MAX)
    }

    /// Conditions a whole frame.
    ///
    /// The right stick's vertical axis is mirrored around center so that the
    /// board's wiring reads with screen-space orientation.
    #[must_use]
    pub fn map_frame(&self, frame: &RawFrame) -> NormalizedState {
        NormalizedState {
            lx: self.map_stick(frame.lx, StickSide::Left),
            ly: self.map_stick(frame.ly, StickSide::Left),
            rx: self.map_stick(frame.rx, StickSide::Right),
            ry: invert_axis(self.map_stick(frame.ry, StickSide::Right)),
            lt: self.map_trigger(frame.lt, self.trigger_max_input),
            rt: self.map_trigger(frame.rt, self.trigger_max_input),
            buttons: [frame.y, frame.a, frame.x, frame.b, frame.lsw, frame.rsw],
        }
    }
}

/// Mirror of an axis value around 0; `AXIS_MIN` saturates to `AXIS_MAX`.
#[inline]
fn invert_axis(value: i32) -> i32 {
    (-value).clamp(AXIS_MIN, AXIS_MAX)
}
