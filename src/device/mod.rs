//! # Virtual Gamepad Module
//!
//! Output side of the bridge: the virtual gamepad the OS sees.
//!
//! The session only talks to [`VirtualGamepad`]; [`uinput::UinputGamepad`] is
//! the Linux implementation. Writes are staged and become visible to the OS
//! on [`VirtualGamepad::flush`].

pub mod uinput;

use crate::controller::state::Button;
use crate::error::Result;

pub use uinput::UinputGamepad;

/// Capabilities of a virtual gamepad device.
#[cfg_attr(test, mockall::automock)]
pub trait VirtualGamepad: Send {
    fn press_button(&mut self, button: Button) -> Result<()>;

    fn release_button(&mut self, button: Button) -> Result<()>;

    /// Left stick as a signed (x, y) pair
    fn set_left_stick(&mut self, x: i32, y: i32) -> Result<()>;

    /// Right stick as a signed (x, y) pair
    fn set_right_stick(&mut self, x: i32, y: i32) -> Result<()>;

    /// Left trigger, 0-255
    fn set_left_trigger(&mut self, value: i32) -> Result<()>;

    /// Right trigger, 0-255
    fn set_right_trigger(&mut self, value: i32) -> Result<()>;

    /// Commits all staged writes as one device update.
    ///
    /// If this fails the writes stay staged and go out with the next flush.
    fn flush(&mut self) -> Result<()>;

    /// Releases every button, centers both sticks, zeroes both triggers and
    /// flushes once.
    fn reset(&mut self) -> Result<()> {
        for button in Button::ALL {
            self.release_button(button)?;
        }
        self.set_left_stick(0, 0)?;
        self.set_right_stick(0, 0)?;
        self.set_left_trigger(0)?;
        self.set_right_trigger(0)?;
        self.flush()
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::error::BridgeError;
    use std::sync::{Arc, Mutex};

    /// One call made against [`RecordingGamepad`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum DeviceCall {
        Press(Button),
        Release(Button),
        LeftStick(i32, i32),
        RightStick(i32, i32),
        LeftTrigger(i32),
        RightTrigger(i32),
        Flush,
    }

    /// Gamepad double that records every call; clones share the log.
    ///
    /// Like the uinput device, writes are staged and only reach
    /// [`delivered`](Self::delivered) on a successful flush. A failed flush
    /// keeps them staged.
    #[derive(Clone, Default)]
    pub struct RecordingGamepad {
        pub calls: Arc<Mutex<Vec<DeviceCall>>>,
        pub staged: Arc<Mutex<Vec<DeviceCall>>>,
        pub delivered: Arc<Mutex<Vec<DeviceCall>>>,
        pub fail_writes: Arc<Mutex<bool>>,
        pub fail_flush: Arc<Mutex<bool>>,
    }

    impl RecordingGamepad {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<DeviceCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Writes that made it through a successful flush, in order
        pub fn delivered(&self) -> Vec<DeviceCall> {
            self.delivered.lock().unwrap().clone()
        }

        pub fn clear(&self) {
            self.calls.lock().unwrap().clear();
        }

        pub fn count(&self, call: &DeviceCall) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
        }

        /// Every call, flush included, fails before being recorded
        pub fn set_fail_writes(&self, fail: bool) {
            *self.fail_writes.lock().unwrap() = fail;
        }

        /// Writes are staged but flushes fail
        pub fn set_fail_flush(&self, fail: bool) {
            *self.fail_flush.lock().unwrap() = fail;
        }

        fn check_writable(&self) -> Result<()> {
            if *self.fail_writes.lock().unwrap() {
                return Err(BridgeError::DeviceWrite("mock write failure".to_string()));
            }
            Ok(())
        }

        fn record(&self, call: DeviceCall) -> Result<()> {
            self.check_writable()?;
            self.calls.lock().unwrap().push(call.clone());
            self.staged.lock().unwrap().push(call);
            Ok(())
        }
    }

    impl VirtualGamepad for RecordingGamepad {
        fn press_button(&mut self, button: Button) -> Result<()> {
            self.record(DeviceCall::Press(button))
        }

        fn release_button(&mut self, button: Button) -> Result<()> {
            self.record(DeviceCall::Release(button))
        }

        fn set_left_stick(&mut self, x: i32, y: i32) -> Result<()> {
            self.record(DeviceCall::LeftStick(x, y))
        }

        fn set_right_stick(&mut self, x: i32, y: i32) -> Result<()> {
            self.record(DeviceCall::RightStick(x, y))
        }

        fn set_left_trigger(&mut self, value: i32) -> Result<()> {
            self.record(DeviceCall::LeftTrigger(value))
        }

        fn set_right_trigger(&mut self, value: i32) -> Result<()> {
            self.record(DeviceCall::RightTrigger(value))
        }

        fn flush(&mut self) -> Result<()> {
            self.check_writable()?;
            self.calls.lock().unwrap().push(DeviceCall::Flush);
            if *self.fail_flush.lock().unwrap() {
                return Err(BridgeError::DeviceWrite("mock flush failure".to_string()));
            }
            let mut staged = self.staged.lock().unwrap();
            self.delivered.lock().unwrap().append(&mut staged);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::{DeviceCall, RecordingGamepad};
    use super::*;

    #[test]
    fn test_reset_releases_everything_and_flushes_once() {
        let mut pad = RecordingGamepad::new();
        pad.reset().unwrap();

        let calls = pad.calls();
        for button in Button::ALL {
            assert_eq!(pad.count(&DeviceCall::Release(button)), 1);
        }
        assert!(calls.contains(&DeviceCall::LeftStick(0, 0)));
        assert!(calls.contains(&DeviceCall::RightStick(0, 0)));
        assert!(calls.contains(&DeviceCall::LeftTrigger(0)));
        assert!(calls.contains(&DeviceCall::RightTrigger(0)));
        assert_eq!(pad.count(&DeviceCall::Flush), 1);
        assert_eq!(calls.last(), Some(&DeviceCall::Flush));
    }

    #[test]
    fn test_reset_delivers_on_flush() {
        let mut pad = RecordingGamepad::new();
        pad.set_fail_flush(true);
        assert!(pad.reset().is_err());
        assert!(pad.delivered().is_empty());

        pad.set_fail_flush(false);
        pad.flush().unwrap();
        assert_eq!(pad.delivered().len(), Button::ALL.len() + 4);
        assert_eq!(pad.delivered()[0], DeviceCall::Release(Button::ALL[0]));
    }

    #[test]
    fn test_reset_propagates_write_failure() {
        let mut pad = RecordingGamepad::new();
        pad.set_fail_writes(true);
        assert!(pad.reset().is_err());
        assert!(pad.calls().is_empty());
    }
}
