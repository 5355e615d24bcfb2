//! Provides debug output based on defmt
//!
//! If the `defmt` feature is enabled, the macros in this module forward to
//! the matching `defmt` logging macro, so bus events end up wherever the
//! application routes its `defmt` frames (RTT, serial, ...).
//!
//! Without the `defmt` feature the macros expand to nothing. The driver can then
//! be built for targets that have no logging transport at all.

/// Logs a bus event at trace level, if the `defmt` feature is enabled
macro_rules! trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($arg)*);
    }};
}

/// Logs a recoverable bus problem, if the `defmt` feature is enabled
macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);
    }};
}
