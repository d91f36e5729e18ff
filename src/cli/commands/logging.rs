use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names indexed by verbosity count.
pub const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts a level name or its verbosity count, so `FOLIO_LOG_LEVEL=debug`
/// and `FOLIO_LOG_LEVEL=3` mean the same as `-vvv`.
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|level: &str| -> Result<u8, String> {
        let level = level.trim().to_lowercase();
        if let Ok(count) = level.parse::<u8>() {
            return if usize::from(count) < LEVELS.len() {
                Ok(count)
            } else {
                Err(format!("log level must be between 0 and {}", LEVELS.len() - 1))
            };
        }

        LEVELS
            .iter()
            .position(|name| *name == level)
            .and_then(|index| u8::try_from(index).ok())
            .ok_or_else(|| format!("invalid log level, expected one of: {}", LEVELS.join(", ")))
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("FOLIO_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
