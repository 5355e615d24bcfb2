//! Blocking TWI master
use super::config::Config;
use super::{
    status, twcr, Ack, BusState, ClockConfig, ClockStatus, Direction, Error, Instance, Prescaler,
    Register, Twi, TwiExt,
};
use crate::clock::Clocks;
use crate::time::{BusSpeed, Hertz};
use hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};

/// One past the highest 7 bit address
const ADDRESS_END: u8 = 0x80;

impl<TWI: Instance> TwiExt for TWI {
    fn twi(self, config: impl Into<Config>, clocks: &Clocks) -> Twi<Self> {
        Twi::new(self, config, clocks)
    }
}

impl<TWI: Instance> Twi<TWI> {
    pub fn new(twi: TWI, config: impl Into<Config>, clocks: &Clocks) -> Self {
        let config = config.into();
        let mut twi = Twi {
            twi,
            sys_clk: clocks.sys_clk,
            timeout: config.timeout,
            clock: ClockConfig::new(0, Prescaler::NotDivided),
            clock_status: ClockStatus::Ok,
            state: BusState::Idle,
        };
        twi.apply(config.clock(clocks.sys_clk));

        // Enable the TWI unit, it takes over SDA and SCL
        twi.twi.write(Register::Twcr, twcr::TWEN);
        twi
    }

    /// Reprograms the bit rate for `speed`
    pub fn init(&mut self, speed: BusSpeed) -> ClockStatus {
        let clock = ClockConfig::compute(self.sys_clk, speed);
        self.apply(clock)
    }

    fn apply(&mut self, (clock, clock_status): (ClockConfig, ClockStatus)) -> ClockStatus {
        let prescaler = clock.prescaler.bits();
        self.twi
            .modify(Register::Twsr, |twsr| (twsr & status::MASK) | prescaler);
        self.twi.write(Register::Twbr, clock.divisor);

        trace!(
            "twi: divisor {=u8}, prescaler {}, {}",
            clock.divisor,
            clock.prescaler,
            clock_status
        );
        if clock_status == ClockStatus::SlowerThanRequested {
            warn!("twi: bus runs slower than requested");
        }

        self.clock = clock;
        self.clock_status = clock_status;
        clock_status
    }

    /// Last programmed divisor and prescaler
    pub fn clock(&self) -> ClockConfig {
        self.clock
    }

    /// Outcome of the last clock configuration
    pub fn clock_status(&self) -> ClockStatus {
        self.clock_status
    }

    /// Actual SCL frequency
    pub fn bus_rate(&self) -> Hertz {
        self.clock.bus_rate(self.sys_clk)
    }

    pub fn state(&self) -> BusState {
        self.state
    }

    pub fn release(mut self) -> TWI {
        self.stop();
        self.twi
    }

    fn command(&mut self, bits: u8) {
        self.twi
            .write(Register::Twcr, twcr::TWINT | twcr::TWEN | bits);
    }

    fn status(&self) -> u8 {
        self.twi.read(Register::Twsr) & status::MASK
    }

    fn poll_complete(&self) -> nb::Result<(), Error> {
        if self.twi.read(Register::Twcr) & twcr::TWINT != 0 {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn poll_stopped(&self) -> nb::Result<(), Error> {
        if self.twi.read(Register::Twcr) & twcr::TWSTO == 0 {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Polls until `poll` stops blocking, giving up after `timeout` polls
    fn wait<F>(&self, mut poll: F) -> Result<(), Error>
    where
        F: FnMut(&Self) -> nb::Result<(), Error>,
    {
        for _ in 0..self.timeout {
            match poll(self) {
                Ok(()) => return Ok(()),
                Err(nb::Error::Other(err)) => return Err(err),
                Err(nb::Error::WouldBlock) => core::hint::spin_loop(),
            }
        }
        warn!("twi: timeout after {=u32} polls", self.timeout);
        Err(Error::Timeout)
    }

    /// Claims the bus (or restarts while holding it) and sends `address`,
    /// the 7 bit address shifted left with the R/W bit in bit 0
    pub fn start(&mut self, address: u8) -> Result<(), Error> {
        self.state = BusState::Started;
        self.command(twcr::TWSTA);
        self.wait(Self::poll_complete)?;

        let code = self.status();
        if code != status::START && code != status::REP_START {
            warn!("twi: bad start, status {=u8:#x}", code);
            return Err(Error::BadStart);
        }

        self.twi.write(Register::Twdr, address);
        self.command(0);
        self.wait(Self::poll_complete)?;

        match self.status() {
            status::MT_SLA_ACK => self.state = BusState::Addressed(Direction::Write),
            status::MR_SLA_ACK => self.state = BusState::Addressed(Direction::Read),
            _ => {
                trace!("twi: no ack for address byte {=u8:#x}", address);
                return Err(Error::SlaveAddressNotAcknowledging);
            }
        }
        Ok(())
    }

    /// Releases the bus. Does nothing if the bus is not held.
    pub fn stop(&mut self) {
        if self.state.is_free() {
            return;
        }
        self.command(twcr::TWSTO);
        // The bus is given up either way, a stuck stop is already logged
        let _ = self.wait(Self::poll_stopped);
        self.state = BusState::Idle;
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.twi.write(Register::Twdr, byte);
        self.command(0);
        self.wait(Self::poll_complete)?;

        let code = self.status();
        if code != status::MT_DATA_ACK {
            warn!("twi: data byte not acknowledged, status {=u8:#x}", code);
            return Err(Error::SlaveDataNotAcknowledging);
        }
        Ok(())
    }

    /// Receives one byte, acknowledging it if more are wanted
    pub fn read_byte(&mut self, ack: impl Into<Ack>) -> Result<u8, Error> {
        self.receive(ack.into()).map(|(byte, _)| byte)
    }

    /// Receives one byte together with the status latched for it
    fn receive(&mut self, ack: Ack) -> Result<(u8, u8), Error> {
        let bits = match ack {
            Ack::Ack => twcr::TWEA,
            Ack::Nack => 0,
        };
        self.command(bits);
        self.wait(Self::poll_complete)?;

        let code = self.status();
        Ok((self.twi.read(Register::Twdr), code))
    }

    /// Fills `buffer`. Every byte is acknowledged except the last one when
    /// `nack_last` is set.
    fn receive_into(&mut self, buffer: &mut [u8], nack_last: bool) -> Result<(), Error> {
        let len = buffer.len();
        for (idx, byte) in buffer.iter_mut().enumerate() {
            let last = nack_last && idx + 1 == len;
            let (data, code) = self.receive(if last { Ack::Nack } else { Ack::Ack })?;
            *byte = data;

            if !last && code != status::MR_DATA_ACK {
                warn!("twi: receive of byte {=usize} failed, status {=u8:#x}", idx, code);
                return Err(Error::SlaveDataNotAcknowledging);
            }
        }
        Ok(())
    }

    /// Writes `data` to the register `sub_address` of the device at the
    /// 7 bit `address`
    pub fn write_buffer(&mut self, address: u8, sub_address: u8, data: &[u8]) -> Result<(), Error> {
        // Clear whatever a failed transaction left behind
        self.stop();
        let result = self.write_frame(address, sub_address, data);
        self.stop();
        result
    }

    pub fn write_single(&mut self, address: u8, sub_address: u8, byte: u8) -> Result<(), Error> {
        self.write_buffer(address, sub_address, &[byte])
    }

    /// Reads `buffer.len()` bytes starting at register `sub_address` of the
    /// device at the 7 bit `address`
    pub fn read_buffer(
        &mut self,
        address: u8,
        sub_address: u8,
        buffer: &mut [u8],
    ) -> Result<(), Error> {
        self.stop();
        let result = self.read_frame(address, sub_address, buffer);
        self.stop();
        result
    }

    fn write_frame(&mut self, address: u8, sub_address: u8, data: &[u8]) -> Result<(), Error> {
        self.start(Direction::Write.address_byte(address))?;
        self.write_byte(sub_address)?;
        for byte in data {
            self.write_byte(*byte)?;
        }
        Ok(())
    }

    fn read_frame(&mut self, address: u8, sub_address: u8, buffer: &mut [u8]) -> Result<(), Error> {
        self.start(Direction::Write.address_byte(address))?;
        self.write_byte(sub_address)?;
        // Repeated start, the device keeps its register pointer
        self.start(Direction::Read.address_byte(address))?;
        self.receive_into(buffer, true)
    }

    /// Returns `true` if a device acknowledges the 7 bit `address`
    pub fn probe(&mut self, address: u8) -> Result<bool, Error> {
        self.stop();
        let result = self.start(Direction::Write.address_byte(address));
        self.stop();

        match result {
            Ok(()) => Ok(true),
            Err(Error::SlaveAddressNotAcknowledging) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Probes every 7 bit address, yielding the ones that answer
    pub fn scan(&mut self) -> Scan<'_, TWI> {
        Scan { twi: self, next: 0 }
    }

    fn operations(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Error> {
        let mut direction = None;
        for idx in 0..operations.len() {
            // Only a later non-empty read in the same run continues this one
            let read_follows = operations[idx + 1..]
                .iter()
                .take_while(|op| matches!(op, Operation::Read(_)))
                .any(|op| matches!(op, Operation::Read(buffer) if !buffer.is_empty()));
            match &mut operations[idx] {
                Operation::Write(bytes) => {
                    if direction != Some(Direction::Write) {
                        self.start(Direction::Write.address_byte(address))?;
                        direction = Some(Direction::Write);
                    }
                    for byte in bytes.iter() {
                        self.write_byte(*byte)?;
                    }
                }
                Operation::Read(buffer) => {
                    if direction != Some(Direction::Read) {
                        self.start(Direction::Read.address_byte(address))?;
                        direction = Some(Direction::Read);
                    }
                    self.receive_into(buffer, !read_follows)?;
                }
            }
        }
        Ok(())
    }
}

/// Iterator returned by [`Twi::scan`]
///
/// Stops after the first bus error.
pub struct Scan<'a, TWI> {
    twi: &'a mut Twi<TWI>,
    next: u8,
}

impl<TWI: Instance> Iterator for Scan<'_, TWI> {
    type Item = Result<u8, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < ADDRESS_END {
            let address = self.next;
            self.next += 1;
            match self.twi.probe(address) {
                Ok(true) => return Some(Ok(address)),
                Ok(false) => {}
                Err(err) => {
                    self.next = ADDRESS_END;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

impl<TWI: Instance> ErrorType for Twi<TWI> {
    type Error = Error;
}

impl<TWI: Instance> I2c for Twi<TWI> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.stop();
        let result = self.operations(address, operations);
        self.stop();
        result
    }
}
