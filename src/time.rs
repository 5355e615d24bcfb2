use core::num::NonZeroU16;

pub use fugit::HertzU32 as Hertz;
pub use fugit::RateExtU32 as U32Ext;

/// Bus speed in steps of 100 kHz
///
/// `BusSpeed::new(1)` requests 100 kHz standard mode, `BusSpeed::new(4)`
/// requests 400 kHz fast mode.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct BusSpeed(NonZeroU16);

impl BusSpeed {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = match NonZeroU16::new(1) {
        Some(steps) => BusSpeed(steps),
        None => unreachable!(),
    };

    /// Fast mode (400 kHz)
    pub const FAST: Self = match NonZeroU16::new(4) {
        Some(steps) => BusSpeed(steps),
        None => unreachable!(),
    };

    /// Hertz per step
    pub const STEP: u32 = 100_000;

    /// Returns `None` for a zero speed
    pub const fn new(steps: u16) -> Option<Self> {
        match NonZeroU16::new(steps) {
            Some(steps) => Some(BusSpeed(steps)),
            None => None,
        }
    }

    pub const fn steps(&self) -> u16 {
        self.0.get()
    }

    /// Target frequency in Hz, widened so that every step count fits
    pub const fn raw_hz(&self) -> u64 {
        self.0.get() as u64 * Self::STEP as u64
    }
}

impl Default for BusSpeed {
    fn default() -> Self {
        BusSpeed::STANDARD
    }
}
