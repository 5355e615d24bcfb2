//! Two-wire interface (TWI), the AVR flavour of I2C
mod blocking;
mod config;
#[cfg(feature = "device-selected")]
mod device;

#[cfg(test)]
mod sim;

pub use blocking::Scan;
pub use config::{ClockConfig, ClockStatus, Config, Prescaler, DEFAULT_TIMEOUT};

use crate::clock::Clocks;
use crate::time::Hertz;

/// TWCR bits
pub(crate) mod twcr {
    pub const TWINT: u8 = 1 << 7;
    pub const TWEA: u8 = 1 << 6;
    pub const TWSTA: u8 = 1 << 5;
    pub const TWSTO: u8 = 1 << 4;
    pub const TWEN: u8 = 1 << 2;
}

/// Master mode status codes, TWSR with the prescaler bits masked off
#[allow(dead_code)]
pub(crate) mod status {
    pub const MASK: u8 = 0xF8;
    pub const START: u8 = 0x08;
    pub const REP_START: u8 = 0x10;
    pub const MT_SLA_ACK: u8 = 0x18;
    pub const MT_SLA_NACK: u8 = 0x20;
    pub const MT_DATA_ACK: u8 = 0x28;
    pub const MT_DATA_NACK: u8 = 0x30;
    pub const MR_SLA_ACK: u8 = 0x40;
    pub const MR_SLA_NACK: u8 = 0x48;
    pub const MR_DATA_ACK: u8 = 0x50;
    pub const MR_DATA_NACK: u8 = 0x58;
}

/// TWI error
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The unit did not report a (repeated) start after asserting one
    BadStart,
    /// Nobody acknowledged the address byte
    SlaveAddressNotAcknowledging,
    /// The addressed device did not acknowledge a data byte
    SlaveDataNotAcknowledging,
    /// A completion flag did not change within the configured number of polls
    Timeout,
}

impl hal::i2c::Error for Error {
    fn kind(&self) -> hal::i2c::ErrorKind {
        use hal::i2c::{ErrorKind, NoAcknowledgeSource};

        match *self {
            Error::BadStart => ErrorKind::Bus,
            Error::SlaveAddressNotAcknowledging => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            Error::SlaveDataNotAcknowledging => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            Error::Timeout => ErrorKind::Other,
        }
    }
}

/// Transfer direction, the R/W bit of the address byte
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Write = 0,
    Read = 1,
}

impl Direction {
    /// Address byte for a 7 bit `address`
    pub fn address_byte(self, address: u8) -> u8 {
        (address << 1) | self as u8
    }
}

/// Acknowledge bit returned after a received byte
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// More bytes wanted
    Ack,
    /// Last byte
    Nack,
}

impl From<bool> for Ack {
    fn from(ack: bool) -> Self {
        if ack {
            Ack::Ack
        } else {
            Ack::Nack
        }
    }
}

/// Where the engine is within a transaction
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusState {
    /// Bus released, either never claimed or stopped
    Idle,
    /// Start condition issued, address not acknowledged (yet)
    Started,
    /// Address acknowledged, transferring in `Direction`
    Addressed(Direction),
}

impl BusState {
    pub fn is_free(&self) -> bool {
        *self == BusState::Idle
    }
}

/// TWI registers
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Bit rate
    Twbr,
    /// Status and prescaler
    Twsr,
    /// Data
    Twdr,
    /// Control
    Twcr,
}

/// A TWI register block
///
/// Implemented for the device's `TWI` peripheral; anything else that behaves
/// like the register block (a simulator, a recorder) can drive the engine too.
pub trait Instance {
    fn read(&self, reg: Register) -> u8;
    fn write(&mut self, reg: Register, value: u8);

    fn modify<F>(&mut self, reg: Register, f: F)
    where
        F: FnOnce(u8) -> u8,
    {
        let value = self.read(reg);
        self.write(reg, f(value));
    }
}

pub trait TwiExt: Sized {
    fn twi(self, config: impl Into<Config>, clocks: &Clocks) -> Twi<Self>;
}

/// TWI abstraction
#[derive(Debug)]
pub struct Twi<TWI> {
    twi: TWI,
    sys_clk: Hertz,
    timeout: u32,
    clock: ClockConfig,
    clock_status: ClockStatus,
    state: BusState,
}
