// src/loggers/mod.rs

pub mod builder;
pub mod core;
pub mod handle;
pub mod memory;
pub mod worker;

pub use builder::{Logger, LoggerBuilder};
pub use self::core::{Fields, LogLevel, Message};
pub use handle::LogHandle;
pub use memory::MemoryLogger;

/// Routes a call through a `Dispatcher`, building the data record from `k => v` pairs.
#[macro_export]
macro_rules! log_base {
    // No kv pairs
    ($log:expr, $level:expr, $msg:expr) => {
        $crate::log_base!($log, $level, $msg, );
    };
    // With kv pairs (zero or more)
    ($log:expr, $level:expr, $msg:expr, $( $k:expr => $v:expr ),* $(,)? ) => {
        {
            #[allow(unused_mut)]
            let mut data = $crate::loggers::core::Fields::new();
            $(
                // Convert value to serde_json::Value; fallback to Null on error
                data.insert($k.to_string(), $crate::serde_json::to_value($v).unwrap_or($crate::serde_json::Value::Null));
            )*

            $log.log($level, $msg, data);
        }
    };
}

#[macro_export]
macro_rules! trace {
    ($log:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($log, $crate::loggers::core::LogLevel::Trace, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! debug {
    ($log:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($log, $crate::loggers::core::LogLevel::Debug, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! info {
    ($log:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($log, $crate::loggers::core::LogLevel::Info, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! warn {
    ($log:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($log, $crate::loggers::core::LogLevel::Warn, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! error {
    ($log:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($log, $crate::loggers::core::LogLevel::Error, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! fatal {
    ($log:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($log, $crate::loggers::core::LogLevel::Fatal, $msg $(, $k => $v )* )
    };
}
