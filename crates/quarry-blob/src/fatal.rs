//! The unrecoverable error path.
//!
//! Buffer-size corruption, allocation failure and injection-prone input are
//! not reported to callers. They are logged and the current thread panics;
//! release builds are compiled with `panic = "abort"`, which turns that into
//! process termination.

use std::fmt;

/// Log `args` and terminate. Never returns.
#[cold]
#[track_caller]
pub fn fatal(args: fmt::Arguments<'_>) -> ! {
    let message = fmt::format(args);
    tracing::error!(target: "quarry::fatal", "{message}");
    panic!("{message}");
}

/// Format a diagnostic and terminate through [`fatal()`].
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {
        $crate::fatal::fatal(format_args!($($arg)*))
    };
}
