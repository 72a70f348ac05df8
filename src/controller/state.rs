//! # Controller State Types
//!
//! [`NormalizedState`] is what the virtual gamepad understands; [`SentState`]
//! remembers what was last pushed to it.

/// Signed stick axis range
pub const AXIS_MIN: i32 = -32768;
/// Signed stick axis range
pub const AXIS_MAX: i32 = 32767;
/// Trigger range
pub const TRIGGER_MAX: i32 = 255;

/// Logical gamepad buttons carried by the serial frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Y,
    A,
    X,
    B,
    LeftShoulder,
    RightShoulder,
}

impl Button {
    /// All buttons, in serial frame order.
    pub const ALL: [Button; 6] = [
        Button::Y,
        Button::A,
        Button::X,
        Button::B,
        Button::LeftShoulder,
        Button::RightShoulder,
    ];

    /// Position within [`Button::ALL`] and the per-button arrays.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Button::Y => 0,
            Button::A => 1,
            Button::X => 2,
            Button::B => 3,
            Button::LeftShoulder => 4,
            Button::RightShoulder => 5,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Button::Y => "Y",
            Button::A => "A",
            Button::X => "X",
            Button::B => "B",
            Button::LeftShoulder => "LSW",
            Button::RightShoulder => "RSW",
        }
    }
}

/// Conditioned controller reading, ready for the virtual device.
///
/// Sticks are in [`AXIS_MIN`]..=[`AXIS_MAX`], triggers in 0..=[`TRIGGER_MAX`].
/// Buttons are indexed by [`Button::index`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizedState {
    pub lx: i32,
    pub ly: i32,
    pub rx: i32,
    pub ry: i32,
    pub lt: i32,
    pub rt: i32,
    pub buttons: [bool; 6],
}

impl NormalizedState {
    #[must_use]
    pub fn button(&self, button: Button) -> bool {
        self.buttons[button.index()]
    }

    /// Stick axes as `[lx, ly, rx, ry]`
    #[must_use]
    pub fn sticks(&self) -> [i32; 4] {
        [self.lx, self.ly, self.rx, self.ry]
    }

    #[must_use]
    pub fn triggers(&self) -> [i32; 2] {
        [self.lt, self.rt]
    }
}

/// Last state committed to the virtual device.
///
/// Starts out neutral, which is also what a device reset pushes. Each group
/// (sticks, triggers, individual buttons) is committed independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentState {
    state: NormalizedState,
}

impl SentState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &NormalizedState {
        &self.state
    }

    pub fn commit_sticks(&mut self, new: &NormalizedState) {
        self.state.lx = new.lx;
        self.state.ly = new.ly;
        self.state.rx = new.rx;
        self.state.ry = new.ry;
    }

    pub fn commit_triggers(&mut self, new: &NormalizedState) {
        self.state.lt = new.lt;
        self.state.rt = new.rt;
    }

    pub fn commit_button(&mut self, button: Button, pressed: bool) {
        self.state.buttons[button.index()] = pressed;
    }

    /// Back to neutral, matching a device reset.
    pub fn reset(&mut self) {
        self.state = NormalizedState::default();
    }
}
