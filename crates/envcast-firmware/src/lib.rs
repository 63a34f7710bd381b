//! ESP32-S3 glue for the envcast bridge: BLE notify plumbing.

#![no_std]

pub mod ble;
