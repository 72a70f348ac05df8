//! # Status Snapshots
//!
//! JSON view of the controller in the shape of the browser Gamepad API
//! (`axes`, `buttons`, `id`, `index`, `connected`, `mapping`), so a front-end
//! can render it without translation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::controller::state::{Button, NormalizedState, AXIS_MAX, TRIGGER_MAX};

/// Number of entries in [`Snapshot::buttons`]
pub const SNAPSHOT_BUTTON_COUNT: usize = 8;

/// Button order in a snapshot: A, B, X, Y, LSW, RSW, then the triggers
const SNAPSHOT_BUTTON_ORDER: [Button; 6] = [
    Button::A,
    Button::B,
    Button::X,
    Button::Y,
    Button::LeftShoulder,
    Button::RightShoulder,
];

/// One entry of [`Snapshot::buttons`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct ButtonSnapshot {
    pub pressed: bool,
    /// 0.0-1.0
    pub value: f32,
}

impl ButtonSnapshot {
    fn digital(pressed: bool) -> Self {
        Self {
            pressed,
            value: if pressed { 1.0 } else { 0.0 },
        }
    }

    fn analog(value: i32) -> Self {
        Self {
            pressed: value > 0,
            value: value as f32 / TRIGGER_MAX as f32,
        }
    }
}

/// Latest controller reading as served to the web layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// `[lx, ly, rx, ry]`, each divided by 32767
    pub axes: [f32; 4],
    pub buttons: [ButtonSnapshot; SNAPSHOT_BUTTON_COUNT],
    pub id: String,
    pub index: u32,
    pub connected: bool,
    pub mapping: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Projects a mapped reading.
    ///
    /// # Examples
    ///
    /// ```
    /// use arduino_pad_bridge::controller::state::NormalizedState;
    /// use arduino_pad_bridge::status::Snapshot;
    ///
    /// let snapshot = Snapshot::from_state(&NormalizedState::default(), "pad", chrono::Utc::now());
    /// assert_eq!(snapshot.axes, [0.0; 4]);
    /// assert!(snapshot.connected);
    /// ```
    #[must_use]
    pub fn from_state(state: &NormalizedState, id: &str, timestamp: DateTime<Utc>) -> Self {
        let mut buttons = [ButtonSnapshot::default(); SNAPSHOT_BUTTON_COUNT];
        for (slot, &button) in buttons.iter_mut().zip(SNAPSHOT_BUTTON_ORDER.iter()) {
            *slot = ButtonSnapshot::digital(state.button(button));
        }
        buttons[6] = ButtonSnapshot::analog(state.lt);
        buttons[7] = ButtonSnapshot::analog(state.rt);

        Self {
            axes: state.sticks().map(|v| v as f32 / AXIS_MAX as f32),
            buttons,
            id: id.to_string(),
            index: 0,
            connected: true,
            mapping: "standard",
            timestamp: Some(timestamp),
        }
    }

    /// Placeholder served while no reading is available.
    ///
    /// Deterministic: zeroed axes, nothing pressed, no timestamp, and an id
    /// distinct from any real reading.
    #[must_use]
    pub fn no_data(device_name: &str, connected: bool) -> Self {
        Self {
            axes: [0.0; 4],
            buttons: [ButtonSnapshot::default(); SNAPSHOT_BUTTON_COUNT],
            id: format!("{} (No Data)", device_name),
            index: 0,
            connected,
            mapping: "standard",
            timestamp: None,
        }
    }

    /// Serializes to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails (non-finite floats cannot occur)
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn sample_state() -> NormalizedState {
        let mut state = NormalizedState {
            lx: 32767,
            ly: -32768,
            rx: 0,
            ry: 16384,
            lt: 255,
            rt: 0,
            buttons: [false; 6],
        };
        state.buttons[Button::Y.index()] = true;
        state.buttons[Button::RightShoulder.index()] = true;
        state
    }

    #[test]
    fn test_axes_are_scaled() {
        let snapshot = Snapshot::from_state(&sample_state(), "pad", Utc::now());
        assert_eq!(snapshot.axes[0], 1.0);
        assert!((snapshot.axes[1] - (-32768.0 / 32767.0)).abs() < 1e-6);
        assert_eq!(snapshot.axes[2], 0.0);
        assert!((snapshot.axes[3] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_button_order() {
        let snapshot = Snapshot::from_state(&sample_state(), "pad", Utc::now());
        let pressed: Vec<bool> = snapshot.buttons.iter().map(|b| b.pressed).collect();
        // A, B, X, Y, LSW, RSW, LT, RT
        assert_eq!(pressed, vec![false, false, false, true, false, true, true, false]);
        assert_eq!(snapshot.buttons[3].value, 1.0);
        assert_eq!(snapshot.buttons[6].value, 1.0);
        assert_eq!(snapshot.buttons[7].value, 0.0);
    }

    #[test]
    fn test_partial_trigger_value() {
        let state = NormalizedState { lt: 51, ..NormalizedState::default() };
        let snapshot = Snapshot::from_state(&state, "pad", Utc::now());
        assert!(snapshot.buttons[6].pressed);
        assert!((snapshot.buttons[6].value - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_no_data_placeholder() {
        let placeholder = Snapshot::no_data("Arduino Custom Gamepad", false);
        assert_eq!(placeholder.id, "Arduino Custom Gamepad (No Data)");
        assert_eq!(placeholder.axes, [0.0; 4]);
        assert!(placeholder.buttons.iter().all(|b| !b.pressed && b.value == 0.0));
        assert!(!placeholder.connected);
        assert_eq!(placeholder, Snapshot::no_data("Arduino Custom Gamepad", false));
    }

    #[test]
    fn test_json_shape() {
        let snapshot = Snapshot::from_state(&sample_state(), "Arduino Custom Gamepad", Utc::now());
        let json: Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();

        assert_eq!(json["id"], "Arduino Custom Gamepad");
        assert_eq!(json["index"], 0);
        assert_eq!(json["connected"], true);
        assert_eq!(json["mapping"], "standard");
        assert_eq!(json["axes"].as_array().unwrap().len(), 4);
        assert_eq!(json["buttons"].as_array().unwrap().len(), 8);
        assert_eq!(json["buttons"][3]["pressed"], true);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_placeholder_json_omits_timestamp() {
        let json: Value =
            serde_json::from_str(&Snapshot::no_data("pad", true).to_json().unwrap()).unwrap();
        assert!(json.get("timestamp").is_none());
        assert_eq!(json["connected"], true);
    }
}
