//! Logging shims.
//!
//! Forward to `defmt` when `defmt-0-3` is enabled, to `log` when `log` is
//! enabled, and swallow their arguments otherwise. Format strings must stick
//! to plain `{}` placeholders so that both backends accept them.

macro_rules! net_log {
    ($level:ident, $($arg:expr),* $(,)?) => {{
        #[cfg(feature = "defmt-0-3")]
        defmt::$level!($($arg),*);
        #[cfg(all(feature = "log", not(feature = "defmt-0-3")))]
        log::$level!($($arg),*);
        #[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
        {
            $( let _ = &$arg; )*
        }
    }};
}

macro_rules! net_trace {
    ($($arg:expr),* $(,)?) => {
        net_log!(trace, $($arg),*)
    };
}

macro_rules! net_debug {
    ($($arg:expr),* $(,)?) => {
        net_log!(debug, $($arg),*)
    };
}

macro_rules! net_warn {
    ($($arg:expr),* $(,)?) => {
        net_log!(warn, $($arg),*)
    };
}
