//! Hardware-independent core library for envcast-rs
//!
//! This crate contains the platform-agnostic half of the envcast sensor
//! bridge: the 4-byte wire codec, the collaborator port traits (sensor,
//! transmitter, display panel), the BMP280 register driver, and the control
//! loop that ties them together at a fixed ~30 Hz cadence.
//!
//! It is `#![no_std]` so it compiles on both the embedded target (ESP32-S3)
//! and desktop hosts (for the simulator and tests).

#![no_std]

pub mod bridge;
pub mod codec;
pub mod config;
pub mod measurement;
pub mod panel;
pub mod sensors;
pub mod transmit;
