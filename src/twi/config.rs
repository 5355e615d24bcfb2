use crate::time::{BusSpeed, Hertz};

/// Per-bit overhead of the TWI unit, in units of two CPU cycles
const BIT_OVERHEAD: i64 = 8;

/// Default number of polls before a wait gives up
pub const DEFAULT_TIMEOUT: u32 = 50_000;

/// TWI bit rate prescaler (TWPS1:0)
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Prescaler {
    NotDivided = 0b00,
    Div4 = 0b01,
    Div16 = 0b10,
    Div64 = 0b11,
}

impl Prescaler {
    /// Prescalers tried when the divisor overflows, smallest first
    const ESCALATION: [Prescaler; 3] = [Prescaler::Div4, Prescaler::Div16, Prescaler::Div64];

    pub fn divider(&self) -> u32 {
        match self {
            Prescaler::NotDivided => 1,
            Prescaler::Div4 => 4,
            Prescaler::Div16 => 16,
            Prescaler::Div64 => 64,
        }
    }

    /// Value of the TWPS bits in TWSR
    pub fn bits(&self) -> u8 {
        *self as u8
    }
}

/// Outcome of a clock configuration
///
/// None of these are errors: the bus works in every case, only
/// `SlowerThanRequested` means it runs below the requested speed.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStatus {
    /// Divisor fits without a prescaler
    Ok,
    /// Divisor only fits with a prescaler, at reduced resolution
    PrescalerAttached,
    /// The requested speed is out of reach, the bus runs slower
    SlowerThanRequested,
}

/// Bit rate register value plus prescaler
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    pub divisor: u8,
    pub prescaler: Prescaler,
}

impl ClockConfig {
    pub const fn new(divisor: u8, prescaler: Prescaler) -> Self {
        ClockConfig { divisor, prescaler }
    }

    /// Picks the divisor and the smallest prescaler for `speed`.
    ///
    /// SCL = sys_clk / (16 + 2 * TWBR * prescaler), so the divisor is
    /// `sys_clk / 2 / speed - 8`. Divisions round up: the bus may end up
    /// slightly slower than asked, never faster.
    pub fn compute(sys_clk: Hertz, speed: BusSpeed) -> (Self, ClockStatus) {
        let half_period = (sys_clk.raw() as u64).div_ceil(2 * speed.raw_hz());
        let raw = half_period as i64 - BIT_OVERHEAD;

        if raw < 0 {
            return (
                ClockConfig::new(0, Prescaler::NotDivided),
                ClockStatus::SlowerThanRequested,
            );
        }

        let mut divisor = raw as u64;
        if divisor <= u8::MAX as u64 {
            return (
                ClockConfig::new(divisor as u8, Prescaler::NotDivided),
                ClockStatus::Ok,
            );
        }

        for prescaler in Prescaler::ESCALATION {
            divisor = divisor.div_ceil(4);
            if divisor <= u8::MAX as u64 {
                return (
                    ClockConfig::new(divisor as u8, prescaler),
                    ClockStatus::PrescalerAttached,
                );
            }
        }

        (
            ClockConfig::new(u8::MAX, Prescaler::Div64),
            ClockStatus::SlowerThanRequested,
        )
    }

    /// Status a hand-picked configuration is reported with
    pub fn status(&self) -> ClockStatus {
        match self.prescaler {
            Prescaler::NotDivided => ClockStatus::Ok,
            _ => ClockStatus::PrescalerAttached,
        }
    }

    /// SCL frequency this configuration produces
    pub fn bus_rate(&self, sys_clk: Hertz) -> Hertz {
        let cycles = 16 + 2 * self.divisor as u32 * self.prescaler.divider();
        Hertz::from_raw(sys_clk.raw() / cycles)
    }
}

/// TWI configuration
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub speed: BusSpeed,
    pub timing: Option<ClockConfig>,
    /// Number of polls of a completion flag before `Error::Timeout`
    pub timeout: u32,
}

impl Config {
    pub fn new(speed: BusSpeed) -> Self {
        Config {
            speed,
            timing: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Programs `timing` as is, skipping the divisor search
    pub fn with_timing(timing: ClockConfig) -> Self {
        Config {
            speed: BusSpeed::default(),
            timing: Some(timing),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn timeout(mut self, polls: u32) -> Self {
        assert!(polls > 0);
        self.timeout = polls;
        self
    }

    pub(crate) fn clock(&self, sys_clk: Hertz) -> (ClockConfig, ClockStatus) {
        match self.timing {
            Some(timing) => (timing, timing.status()),
            None => ClockConfig::compute(sys_clk, self.speed),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(BusSpeed::default())
    }
}

impl From<BusSpeed> for Config {
    fn from(speed: BusSpeed) -> Self {
        Config::new(speed)
    }
}
