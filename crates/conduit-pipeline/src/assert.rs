//! `safe_assert!`/`safe_assert_eq!`: panic in debug builds, log via
//! `tracing::error!` in release, for the state-machine invariants that
//! must never trip in correct use (quiescing helper transitions, ring
//! buffer caps) but shouldn't take an entire release process down if they
//! somehow do.

/// In debug builds, panics on failure just like `debug_assert!`. In release
/// builds, logs an error via `tracing::error!` instead of panicking.
#[macro_export]
macro_rules! safe_assert {
    ($cond:expr $(,)?) => {
        #[cfg(debug_assertions)]
        {
            debug_assert!($cond);
        }
        #[cfg(not(debug_assertions))]
        {
            if !$cond {
                tracing::error!("ASSERT FAILED: {}", stringify!($cond));
            }
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        #[cfg(debug_assertions)]
        {
            debug_assert!($cond, $($arg)+);
        }
        #[cfg(not(debug_assertions))]
        {
            if !$cond {
                tracing::error!("ASSERT FAILED: {}", format!($($arg)+));
            }
        }
    };
}

/// In debug builds, panics on failure just like `debug_assert_eq!`. In
/// release builds, logs an error via `tracing::error!` instead of panicking.
#[macro_export]
macro_rules! safe_assert_eq {
    ($left:expr, $right:expr $(,)?) => {
        #[cfg(debug_assertions)]
        {
            debug_assert_eq!($left, $right);
        }
        #[cfg(not(debug_assertions))]
        {
            if $left != $right {
                tracing::error!(
                    "ASSERT FAILED: {} (left: `{:?}`, right: `{:?}`)",
                    stringify!($left == $right),
                    &$left,
                    &$right
                );
            }
        }
    };
}
