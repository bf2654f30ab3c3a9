//! Utilities for logging messages from the library.

#[doc(hidden)]
#[macro_export]
macro_rules! svgdraw_log {
    (
        $session:expr,
        $($arg:tt)+
    ) => {
        if $session.log_enabled() {
            println!("{}", format_args!($($arg)+));
        }
    };
}

pub fn log_enabled() -> bool {
    static ENABLED: once_cell::sync::Lazy<bool> =
        once_cell::sync::Lazy::new(|| ::std::env::var_os("SVGDRAW_LOG").is_some());

    *ENABLED
}
