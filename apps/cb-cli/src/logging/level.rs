//! Log level definitions for CLI verbose/debug output
//!
//! Levels are cumulative: Debug includes Verbose, Trace includes Debug.

use std::fmt;

pub const VERBOSE_ENV: &str = "CB_CLI_VERBOSE";
pub const DEBUG_ENV: &str = "CB_CLI_DEBUG";
pub const TRACE_ENV: &str = "CB_CLI_TRACE";

/// Verbosity level for CLI output
///
/// Levels are ordered: Quiet < Normal < Verbose < Debug < Trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    /// Errors only
    Quiet = 0,
    /// Warnings and errors (default)
    #[default]
    Normal = 1,
    /// Progress messages for each asset
    Verbose = 2,
    /// HTTP method, URL, status code, timing
    Debug = 3,
    /// Request and response bodies (redacted)
    Trace = 4,
}

impl LogLevel {
    /// Create LogLevel from CLI flags
    ///
    /// Order of precedence: trace > debug > verbose > quiet > normal
    pub fn from_flags(verbose: bool, debug: bool, trace: bool, quiet: bool) -> Self {
        if trace {
            Self::Trace
        } else if debug {
            Self::Debug
        } else if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    /// Flags first; when none is set, the `CB_CLI_*` variables.
    pub fn from_flags_and_env<F>(verbose: bool, debug: bool, trace: bool, quiet: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = Self::from_flags(verbose, debug, trace, quiet);
        if level != Self::Normal {
            return level;
        }
        let set = |key: &str| {
            lookup(key).is_some_and(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"))
        };
        Self::from_flags(set(VERBOSE_ENV), set(DEBUG_ENV), set(TRACE_ENV), false)
    }

    pub fn is_verbose(&self) -> bool {
        *self >= Self::Verbose
    }

    pub fn is_trace(&self) -> bool {
        *self >= Self::Trace
    }

    /// Default `EnvFilter` directive for this level.
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "warn,cb_cli=info",
            Self::Debug => "info,cb_cli=debug",
            Self::Trace => "debug,cb_cli=trace",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Quiet => "QUIET",
            Self::Normal => "NORMAL",
            Self::Verbose => "VERBOSE",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
