//! Logging shims.
//!
//! With the `tracing` feature each level forwards to `tracing` under the `masonry_adapter` target.
//! Without it nothing is emitted, but `%value` captures are still borrowed so that values which
//! only exist to be logged don't trip `unused_variables`.

#[cfg(feature = "tracing")]
macro_rules! mlog {
    ($level:ident, $($field:tt)*) => {
        tracing::$level!(target: "masonry_adapter", $($field)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! mlog {
    ($level:ident,) => {};
    ($level:ident, % $value:ident $(, $($rest:tt)*)?) => {{
        let _ = &$value;
        mlog!($level, $($($rest)*)?);
    }};
    ($level:ident, $head:tt $($rest:tt)*) => {
        mlog!($level, $($rest)*)
    };
}

macro_rules! mtrace {
    ($($field:tt)*) => {
        mlog!(trace, $($field)*)
    };
}

macro_rules! mdebug {
    ($($field:tt)*) => {
        mlog!(debug, $($field)*)
    };
}

macro_rules! mwarn {
    ($($field:tt)*) => {
        mlog!(warn, $($field)*)
    };
}
