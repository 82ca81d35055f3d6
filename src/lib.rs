//! Device logic for the 1602 message board: topic routing, OTA orchestration,
//! button debouncing and the 16x2 character display.
//!
//! Everything in this crate is hardware independent. The ESP32 wiring lives
//! in the `firmware` crate, which plugs its drivers into the ports declared
//! under [`domain::ports`].
#![no_std]

extern crate alloc;

pub mod app;
pub mod config;
pub mod controllers;
pub mod core;
pub mod domain;
pub mod drivers;
