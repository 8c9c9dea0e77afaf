//! Console logging for flight runs.
//!
//! Each line carries a colored level tag and a UTC wall-clock stamp.
//! Warnings and errors go to stderr. `AUTOPILOT_LOG` sets the most verbose
//! level printed (`error`, `warn`, `info` or `event`); unset means `info`.

use std::fmt;
use std::sync::OnceLock;

use chrono::Utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Level {
    Error,
    Warn,
    Info,
    /// Per-tick guidance chatter.
    Event,
}

impl Level {
    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Level::Error),
            "warn" => Some(Level::Warn),
            "info" => Some(Level::Info),
            "event" | "trace" => Some(Level::Event),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Level::Error => "\x1b[31m[ERROR]",
            Level::Warn => "\x1b[35m[WARN] ",
            Level::Info => "\x1b[32m[INFO] ",
            Level::Event => "\x1b[36m[EVENT]",
        }
    }
}

fn threshold() -> Level {
    static LEVEL: OnceLock<Level> = OnceLock::new();
    *LEVEL.get_or_init(|| {
        std::env::var("AUTOPILOT_LOG")
            .ok()
            .and_then(|v| Level::parse(&v))
            .unwrap_or(Level::Info)
    })
}

pub(crate) fn emit(level: Level, args: fmt::Arguments<'_>) {
    if level > threshold() {
        return;
    }
    let stamp = Utc::now().format("%H:%M:%S%.3f");
    match level {
        Level::Error | Level::Warn => eprintln!("{}[{}]\x1b[0m {}", level.tag(), stamp, args),
        Level::Info | Level::Event => println!("{}[{}]\x1b[0m {}", level.tag(), stamp, args),
    }
}

macro_rules! info {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Level::Info, format_args!($($arg)*))
    };
}

macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Level::Warn, format_args!($($arg)*))
    };
}

macro_rules! error {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Level::Error, format_args!($($arg)*))
    };
}

macro_rules! event {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Level::Event, format_args!($($arg)*))
    };
}
