//! Internal utility macros and helpers.

/// Emits a `trace`-level event when the `tracing` feature is enabled and
/// expands to nothing otherwise.
macro_rules! trace_event {
    ($($arg:tt)+) => {
        #[cfg(feature = "tracing")]
        {
            tracing::trace!($($arg)+);
        }
    };
}

pub(crate) use trace_event;
