//! TWI register block of the selected device
use super::{Instance, Register};

use crate::pac::TWI;

impl Instance for TWI {
    fn read(&self, reg: Register) -> u8 {
        match reg {
            Register::Twbr => self.twbr.read().bits(),
            Register::Twsr => self.twsr.read().bits(),
            Register::Twdr => self.twdr.read().bits(),
            Register::Twcr => self.twcr.read().bits(),
        }
    }

    fn write(&mut self, reg: Register, value: u8) {
        match reg {
            Register::Twbr => self.twbr.write(|w| unsafe { w.bits(value) }),
            Register::Twsr => self.twsr.write(|w| unsafe { w.bits(value) }),
            Register::Twdr => self.twdr.write(|w| unsafe { w.bits(value) }),
            Register::Twcr => self.twcr.write(|w| unsafe { w.bits(value) }),
        }
    }
}
