//! # Serial Frame Parser
//!
//! The Arduino sketch prints one reading per line as twelve comma-separated
//! decimal integers:
//!
//! | Index | Field | Range |
//! |-------|-------|-------|
//! | 0-3 | `lx, ly, rx, ry` | 0-1023 |
//! | 4-5 | `lt, rt` | 0-1023 |
//! | 6-11 | `y, a, x, b, lsw, rsw` | 0/1 |
//!
//! Anything else is rejected with a [`FrameError`] and never reaches the
//! signal mapper.

pub use crate::error::FrameError;

/// Number of fields in one serial line
pub const FRAME_FIELD_COUNT: usize = 12;

/// One parsed serial line, before any signal conditioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    pub lx: i32,
    pub ly: i32,
    pub rx: i32,
    pub ry: i32,
    pub lt: i32,
    pub rt: i32,
    pub y: bool,
    pub a: bool,
    pub x: bool,
    pub b: bool,
    pub lsw: bool,
    pub rsw: bool,
}

impl RawFrame {
    /// Parses one line from the serial link.
    ///
    /// Leading/trailing whitespace (including `\r`) is ignored, as is
    /// whitespace around individual fields. Button fields count as pressed
    /// when non-zero.
    ///
    /// # Errors
    ///
    /// - [`FrameError::Empty`] for a blank line
    /// - [`FrameError::FieldCount`] unless there are exactly twelve fields
    /// - [`FrameError::Parse`] for the first non-integer field
    ///
    /// # Examples
    ///
    /// ```
    /// use arduino_pad_bridge::controller::frame::RawFrame;
    ///
    /// let frame = RawFrame::parse("512,512,512,512,0,0,0,1,0,0,0,0").unwrap();
    /// assert_eq!(frame.lx, 512);
    /// assert!(frame.a);
    /// assert!(RawFrame::parse("1,2,3").is_err());
    /// ```
    pub fn parse(line: &str) -> Result<Self, FrameError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(FrameError::Empty);
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != FRAME_FIELD_COUNT {
            return Err(FrameError::FieldCount { found: fields.len() });
        }

        let mut values = [0i32; FRAME_FIELD_COUNT];
        for (index, (slot, field)) in values.iter_mut().zip(&fields).enumerate() {
            let field = field.trim();
            *slot = field.parse().map_err(|_| FrameError::Parse {
                index,
                value: field.to_string(),
            })?;
        }

        let [lx, ly, rx, ry, lt, rt, y, a, x, b, lsw, rsw] = values;
        Ok(Self {
            lx,
            ly,
            rx,
            ry,
            lt,
            rt,
            y: y != 0,
            a: a != 0,
            x: x != 0,
            b: b != 0,
            lsw: lsw != 0,
            rsw: rsw != 0,
        })
    }
}
