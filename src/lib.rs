//! # Arduino Pad Bridge Library
//!
//! Turn an Arduino reading potentiometers and buttons into a virtual gamepad.
//!
//! This library provides the core functionality for bridging 12-field serial
//! readings to a uinput gamepad, and for exposing the live controller state
//! to a status/web layer.

pub mod config;
pub mod error;
pub mod controller;
pub mod device;
pub mod serial;
pub mod session;
pub mod status;
