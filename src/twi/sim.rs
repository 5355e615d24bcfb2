//! Register level model of the TWI unit in master mode, with register
//! pointer devices (EEPROM style) hanging off the bus
use super::{status, twcr, Ack, Instance, Register};

const ARBITRATION_LOST: u8 = 0x38;
const NO_INFO: u8 = 0xF8;

/// Bus activity as seen by an analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Start,
    RepeatedStart,
    Stop,
    Address(u8),
    Write(u8),
    Read(u8, Ack),
}

#[derive(Debug, Clone)]
pub struct Target {
    pub address: u8,
    pub memory: [u8; 256],
    pointer: u8,
}

impl Target {
    pub fn new(address: u8) -> Self {
        Target {
            address,
            memory: [0; 256],
            pointer: 0,
        }
    }

    /// First byte of a write moves the register pointer, the rest is stored
    fn receive(&mut self, idx: usize, byte: u8) {
        if idx == 0 {
            self.pointer = byte;
        } else {
            self.memory[self.pointer as usize] = byte;
            self.pointer = self.pointer.wrapping_add(1);
        }
    }

    fn transmit(&mut self) -> u8 {
        let byte = self.memory[self.pointer as usize];
        self.pointer = self.pointer.wrapping_add(1);
        byte
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    Started,
    Transmit { target: usize, idx: usize },
    Receive { target: usize, idx: usize },
    Unaddressed,
}

#[derive(Debug, Default)]
pub struct SimTwi {
    pub twbr: u8,
    pub twsr: u8,
    pub twdr: u8,
    pub twcr: u8,
    pub targets: Vec<Target>,
    pub events: Vec<Event>,
    pub twcr_writes: usize,
    /// Data byte of a write the device refuses, the sub address is byte 0
    pub nack_write_at: Option<usize>,
    /// Received byte after which the unit reports lost arbitration
    pub fault_read_at: Option<usize>,
    /// Targets acknowledge their write address only
    pub nack_read_address: bool,
    /// Another master wins every start
    pub lose_arbitration: bool,
    /// SCL held low: nothing ever completes
    pub stuck: bool,
    held: bool,
    phase: Phase,
}

impl SimTwi {
    pub fn with_targets(addresses: &[u8]) -> Self {
        SimTwi {
            targets: addresses.iter().map(|address| Target::new(*address)).collect(),
            twsr: NO_INFO,
            ..Default::default()
        }
    }

    fn set_status(&mut self, code: u8) {
        self.twsr = (self.twsr & !status::MASK) | code;
    }

    fn execute(&mut self, cmd: u8) {
        if cmd & twcr::TWSTO != 0 {
            self.events.push(Event::Stop);
            self.held = false;
            self.phase = Phase::Idle;
            self.set_status(NO_INFO);
            // TWINT is not set after a stop
            self.twcr = cmd & !(twcr::TWSTO | twcr::TWINT);
            return;
        }

        if cmd & twcr::TWSTA != 0 {
            if self.lose_arbitration {
                self.set_status(ARBITRATION_LOST);
                self.phase = Phase::Idle;
            } else if self.held {
                self.events.push(Event::RepeatedStart);
                self.set_status(status::REP_START);
                self.phase = Phase::Started;
            } else {
                self.events.push(Event::Start);
                self.set_status(status::START);
                self.held = true;
                self.phase = Phase::Started;
            }
            self.twcr = cmd;
            return;
        }

        match self.phase {
            Phase::Started => {
                let sla = self.twdr;
                self.events.push(Event::Address(sla));
                let target = self.targets.iter().position(|t| t.address == sla >> 1);
                let read = sla & 1 != 0;
                let (code, phase) = match (target, read) {
                    (Some(target), false) => {
                        (status::MT_SLA_ACK, Phase::Transmit { target, idx: 0 })
                    }
                    (Some(target), true) if !self.nack_read_address => {
                        (status::MR_SLA_ACK, Phase::Receive { target, idx: 0 })
                    }
                    (_, false) => (status::MT_SLA_NACK, Phase::Unaddressed),
                    (_, true) => (status::MR_SLA_NACK, Phase::Unaddressed),
                };
                self.set_status(code);
                self.phase = phase;
            }
            Phase::Transmit { target, idx } => {
                let byte = self.twdr;
                self.events.push(Event::Write(byte));
                if self.nack_write_at == Some(idx) {
                    self.set_status(status::MT_DATA_NACK);
                    self.phase = Phase::Unaddressed;
                } else {
                    self.targets[target].receive(idx, byte);
                    self.set_status(status::MT_DATA_ACK);
                    self.phase = Phase::Transmit { target, idx: idx + 1 };
                }
            }
            Phase::Receive { target, idx } => {
                let ack = if cmd & twcr::TWEA != 0 { Ack::Ack } else { Ack::Nack };
                let byte = self.targets[target].transmit();
                self.twdr = byte;
                self.events.push(Event::Read(byte, ack));
                let code = match ack {
                    _ if self.fault_read_at == Some(idx) => ARBITRATION_LOST,
                    Ack::Ack => status::MR_DATA_ACK,
                    Ack::Nack => status::MR_DATA_NACK,
                };
                self.set_status(code);
                self.phase = Phase::Receive { target, idx: idx + 1 };
            }
            Phase::Idle | Phase::Unaddressed => self.set_status(NO_INFO),
        }
        self.twcr = cmd;
    }
}

impl Instance for SimTwi {
    fn read(&self, reg: Register) -> u8 {
        match reg {
            Register::Twbr => self.twbr,
            Register::Twsr => self.twsr,
            Register::Twdr => self.twdr,
            Register::Twcr => self.twcr,
        }
    }

    fn write(&mut self, reg: Register, value: u8) {
        match reg {
            Register::Twbr => self.twbr = value,
            // Only the prescaler bits are writable
            Register::Twsr => self.twsr = (self.twsr & status::MASK) | (value & !status::MASK),
            Register::Twdr => self.twdr = value,
            Register::Twcr => {
                self.twcr_writes += 1;
                if value & twcr::TWINT == 0 {
                    // Writing zero to TWINT leaves the flag alone
                    self.twcr = (self.twcr & twcr::TWINT) | value;
                } else if self.stuck {
                    self.twcr = value & !twcr::TWINT;
                } else {
                    self.execute(value);
                }
            }
        }
    }
}
