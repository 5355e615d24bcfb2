pub use hal::i2c::I2c as _;

pub use crate::time::U32Ext as _;
pub use crate::twi::TwiExt as _;
