#![deny(missing_docs)]
//! Shared logging utilities for the binder workspace.
//!
//! This crate provides the `binder_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every line logged
//! through the macros is prefixed with the series currently being bound on
//! the calling thread, if any.

use std::cell::RefCell;

#[doc(hidden)]
pub use log;

thread_local! {
    /// Slug of the series the current thread is working on.
    static SERIES: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Sets the series slug reported by the logging macros on this thread.
pub fn set_series_context(slug: &str) {
    SERIES.with(|s| *s.borrow_mut() = Some(slug.to_string()));
}

/// Clears the series slug for this thread.
pub fn clear_series_context() {
    SERIES.with(|s| *s.borrow_mut() = None);
}

/// Retrieves the series slug for this thread, if one is set.
pub fn series_context() -> Option<String> {
    SERIES.with(|s| s.borrow().clone())
}

/// Sets the series context and clears it again when dropped.
#[must_use = "the context is cleared as soon as the guard is dropped"]
pub struct SeriesContextGuard {
    _private: (),
}

/// Enters the logging context of `slug` until the returned guard is dropped.
pub fn enter_series(slug: &str) -> SeriesContextGuard {
    set_series_context(slug);
    SeriesContextGuard { _private: () }
}

impl Drop for SeriesContextGuard {
    fn drop(&mut self) {
        clear_series_context();
    }
}

/// Prefix prepended by the logging macros.
#[doc(hidden)]
pub fn context_prefix() -> String {
    SERIES.with(|s| match s.borrow().as_deref() {
        Some(slug) => format!("[{slug}] "),
        None => String::new(),
    })
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! binder_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! binder_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! binder_info {
    ($($arg:tt)*) => {{
        $crate::log::info!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! binder_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! binder_error {
    ($($arg:tt)*) => {{
        $crate::log::error!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
