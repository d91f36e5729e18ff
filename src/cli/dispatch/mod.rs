//! Maps validated CLI matches to an [`Action`] with its resolved configuration.

use crate::cli::actions::{Action, Command};
use crate::cli::commands::{
    ARG_API_URL, ARG_LANDING_PATH, ARG_PASSWORD, ARG_PATHS, ARG_REMEMBER, ARG_SITE_NAME,
    ARG_STATE_DIR, ARG_TIMEOUT, ARG_USERNAME,
};
use crate::config::{normalize_value, AppConfig, Overrides};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if the subcommand or one of its required arguments is missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let mut config = AppConfig::default();
    config.apply(overrides(matches));

    let command = match matches.subcommand() {
        Some(("login", sub)) => Command::Login {
            username: sub
                .get_one::<String>(ARG_USERNAME)
                .cloned()
                .context("missing required argument: --username")?,
            password: sub
                .get_one::<String>(ARG_PASSWORD)
                .map(|value| SecretString::from(value.clone()))
                .context("missing required argument: --password")?,
            remember_me: sub.get_flag(ARG_REMEMBER),
        },
        Some(("logout", _)) => Command::Logout,
        Some(("status", _)) => Command::Status,
        Some(("visit", sub)) => Command::Visit {
            paths: sub
                .get_many::<String>(ARG_PATHS)
                .context("missing required argument: <paths>")?
                .cloned()
                .collect(),
        },
        Some(("routes", _)) => Command::Routes,
        Some((name, _)) => return Err(anyhow!("unknown command: {name}")),
        None => return Err(anyhow!("missing command")),
    };

    Ok(Action { config, command })
}

fn overrides(matches: &clap::ArgMatches) -> Overrides {
    let string = |id: &str| {
        matches
            .get_one::<String>(id)
            .and_then(|value| normalize_value(value))
    };

    Overrides {
        api_base_url: string(ARG_API_URL),
        site_name: string(ARG_SITE_NAME),
        landing_path: string(ARG_LANDING_PATH),
        state_dir: string(ARG_STATE_DIR),
        request_timeout_secs: matches.get_one::<u64>(ARG_TIMEOUT).copied(),
    }
}
