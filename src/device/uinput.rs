//! # uinput Virtual Gamepad
//!
//! Creates an Xbox-360-style gamepad through `/dev/uinput` using evdev.
//!
//! | Logical | evdev code | Range |
//! |---------|------------|-------|
//! | A / B / X / Y | BTN_SOUTH / BTN_EAST / BTN_WEST / BTN_NORTH | 0/1 |
//! | Left / Right shoulder | BTN_TL / BTN_TR | 0/1 |
//! | Left stick | ABS_X, ABS_Y | -32768..32767 |
//! | Right stick | ABS_RX, ABS_RY | -32768..32767 |
//! | Left / Right trigger | ABS_Z / ABS_RZ | 0..255 |
//!
//! Writes are staged in an [`EventBatch`] and emitted together, terminated by
//! a single SYN_REPORT, on [`VirtualGamepad::flush`].

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{
    AbsInfo, AbsoluteAxisType, AttributeSet, BusType, EventType, InputEvent, InputId, Key,
    UinputAbsSetup,
};
use tracing::{debug, info};

use super::VirtualGamepad;
use crate::controller::state::{Button, AXIS_MAX, AXIS_MIN, TRIGGER_MAX};
use crate::error::{BridgeError, Result};

/// USB ids reported for the virtual device
const VENDOR_ID: u16 = 0x2341; // Arduino SA
const PRODUCT_ID: u16 = 0x8036;
const VERSION: u16 = 1;

/// evdev key for a logical button.
#[must_use]
pub fn button_key(button: Button) -> Key {
    match button {
        Button::A => Key::BTN_SOUTH,
        Button::B => Key::BTN_EAST,
        Button::X => Key::BTN_WEST,
        Button::Y => Key::BTN_NORTH,
        Button::LeftShoulder => Key::BTN_TL,
        Button::RightShoulder => Key::BTN_TR,
    }
}

/// Events staged for the next flush.
#[derive(Debug, Default)]
pub struct EventBatch {
    events: Vec<InputEvent>,
}

impl EventBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn button(&mut self, button: Button, pressed: bool) {
        self.events.push(InputEvent::new(
            EventType::KEY,
            button_key(button).code(),
            i32::from(pressed),
        ));
    }

    pub fn axis(&mut self, axis: AbsoluteAxisType, value: i32, min: i32, max: i32) {
        self.events
            .push(InputEvent::new(EventType::ABSOLUTE, axis.0, value.clamp(min, max)));
    }

    pub fn stick(&mut self, x_axis: AbsoluteAxisType, y_axis: AbsoluteAxisType, x: i32, y: i32) {
        self.axis(x_axis, x, AXIS_MIN, AXIS_MAX);
        self.axis(y_axis, y, AXIS_MIN, AXIS_MAX);
    }

    pub fn trigger(&mut self, axis: AbsoluteAxisType, value: i32) {
        self.axis(axis, value, 0, TRIGGER_MAX);
    }

    #[must_use]
    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    /// Hands the staged events to `emit` and clears them once it succeeds.
    ///
    /// On failure nothing is dropped, so the next flush resends the same
    /// events followed by anything staged in between.
    pub fn flush_with<F>(&mut self, emit: F) -> std::io::Result<usize>
    where
        F: FnOnce(&[InputEvent]) -> std::io::Result<()>,
    {
        emit(&self.events)?;
        let count = self.events.len();
        self.events.clear();
        Ok(count)
    }
}

/// Virtual gamepad backed by a uinput device.
pub struct UinputGamepad {
    device: VirtualDevice,
    pending: EventBatch,
    name: String,
}

impl std::fmt::Debug for UinputGamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UinputGamepad")
            .field("name", &self.name)
            .field("pending", &self.pending.events().len())
            .finish_non_exhaustive()
    }
}

impl UinputGamepad {
    /// Creates the virtual gamepad.
    ///
    /// # Errors
    ///
    /// Returns `DeviceWrite` if `/dev/uinput` is missing or not writable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use arduino_pad_bridge::device::UinputGamepad;
    ///
    /// let pad = UinputGamepad::create("Arduino Custom Gamepad")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn create(name: &str) -> Result<Self> {
        let device = Self::build_device(name).map_err(|e| {
            BridgeError::DeviceWrite(format!("Failed to create uinput device: {}", e))
        })?;

        info!("Created virtual gamepad '{}'", name);

        Ok(Self {
            device,
            pending: EventBatch::new(),
            name: name.to_string(),
        })
    }

    fn build_device(name: &str) -> std::io::Result<VirtualDevice> {
        let stick = |axis: AbsoluteAxisType| {
            UinputAbsSetup::new(axis, AbsInfo::new(0, AXIS_MIN, AXIS_MAX, 16, 128, 0))
        };
        let trigger = |axis: AbsoluteAxisType| {
            UinputAbsSetup::new(axis, AbsInfo::new(0, 0, TRIGGER_MAX, 0, 0, 0))
        };

        let mut keys = AttributeSet::<Key>::new();
        for button in Button::ALL {
            keys.insert(button_key(button));
        }

        VirtualDeviceBuilder::new()?
            .name(name)
            .input_id(InputId::new(BusType::BUS_VIRTUAL, VENDOR_ID, PRODUCT_ID, VERSION))
            .with_keys(&keys)?
            .with_absolute_axis(&stick(AbsoluteAxisType::ABS_X))?
            .with_absolute_axis(&stick(AbsoluteAxisType::ABS_Y))?
            .with_absolute_axis(&stick(AbsoluteAxisType::ABS_RX))?
            .with_absolute_axis(&stick(AbsoluteAxisType::ABS_RY))?
            .with_absolute_axis(&trigger(AbsoluteAxisType::ABS_Z))?
            .with_absolute_axis(&trigger(AbsoluteAxisType::ABS_RZ))?
            .build()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl VirtualGamepad for UinputGamepad {
    fn press_button(&mut self, button: Button) -> Result<()> {
        self.pending.button(button, true);
        Ok(())
    }

    fn release_button(&mut self, button: Button) -> Result<()> {
        self.pending.button(button, false);
        Ok(())
    }

    fn set_left_stick(&mut self, x: i32, y: i32) -> Result<()> {
        self.pending
            .stick(AbsoluteAxisType::ABS_X, AbsoluteAxisType::ABS_Y, x, y);
        Ok(())
    }

    fn set_right_stick(&mut self, x: i32, y: i32) -> Result<()> {
        self.pending
            .stick(AbsoluteAxisType::ABS_RX, AbsoluteAxisType::ABS_RY, x, y);
        Ok(())
    }

    fn set_left_trigger(&mut self, value: i32) -> Result<()> {
        self.pending.trigger(AbsoluteAxisType::ABS_Z, value);
        Ok(())
    }

    fn set_right_trigger(&mut self, value: i32) -> Result<()> {
        self.pending.trigger(AbsoluteAxisType::ABS_RZ, value);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let device = &mut self.device;
        // emit() appends the SYN_REPORT; an empty batch still reports
        let count = self
            .pending
            .flush_with(|events| device.emit(events))
            .map_err(|e| BridgeError::DeviceWrite(format!("Failed to emit events: {}", e)))?;
        debug!("Flushed {} events to virtual gamepad", count);
        Ok(())
    }
}
