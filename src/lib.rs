#![cfg_attr(not(test), no_std)]

pub extern crate embedded_hal as hal;
pub extern crate fugit;
pub extern crate nb;

#[cfg(feature = "device-selected")]
pub extern crate avr_device;

#[cfg(feature = "atmega328p")]
pub use avr_device::atmega328p as pac;

#[cfg(feature = "atmega2560")]
pub use avr_device::atmega2560 as pac;

#[cfg(feature = "atmega32u4")]
pub use avr_device::atmega32u4 as pac;

#[macro_use]
mod debug;

pub mod clock;
pub mod prelude;
pub mod time;
pub mod twi;
