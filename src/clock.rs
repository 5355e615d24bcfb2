use crate::time::{Hertz, U32Ext};

/// Clock frequencies
///
/// AVR parts run the TWI unit straight from the CPU clock (`F_CPU`), so a
/// single frequency is all the driver needs.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clocks {
    /// System frequency
    pub sys_clk: Hertz,
}

impl Clocks {
    pub fn new(sys_clk: Hertz) -> Self {
        Clocks { sys_clk }
    }
}

impl Default for Clocks {
    fn default() -> Clocks {
        Clocks {
            sys_clk: 16.MHz(),
        }
    }
}

impl From<Hertz> for Clocks {
    fn from(sys_clk: Hertz) -> Self {
        Clocks::new(sys_clk)
    }
}
