pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_STATE_DIR: &str = "state-dir";
pub const ARG_SITE_NAME: &str = "site-name";
pub const ARG_LANDING_PATH: &str = "landing-path";
pub const ARG_TIMEOUT: &str = "timeout";

pub const ARG_USERNAME: &str = "username";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_REMEMBER: &str = "remember";
pub const ARG_PATHS: &str = "paths";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("folio")
        .about("Portfolio client session and navigation")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Base URL of the portfolio API, example: https://api.example.dev")
                .env("FOLIO_API_BASE_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_STATE_DIR)
                .long(ARG_STATE_DIR)
                .help("Directory holding the remembered session")
                .env("FOLIO_STATE_DIR")
                .global(true),
        )
        .arg(
            Arg::new(ARG_SITE_NAME)
                .long(ARG_SITE_NAME)
                .help("Site identity appended to page titles")
                .env("FOLIO_SITE_NAME")
                .global(true),
        )
        .arg(
            Arg::new(ARG_LANDING_PATH)
                .long(ARG_LANDING_PATH)
                .help("Where signed-in visitors land when opening a guest-only page")
                .env("FOLIO_LANDING_PATH")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Request timeout in seconds")
                .env("FOLIO_TIMEOUT_SECONDS")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and keep the session")
                .arg(
                    Arg::new(ARG_USERNAME)
                        .short('u')
                        .long(ARG_USERNAME)
                        .help("Account username")
                        .env("FOLIO_USERNAME")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_PASSWORD)
                        .short('p')
                        .long(ARG_PASSWORD)
                        .help("Account password")
                        .env("FOLIO_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_REMEMBER)
                        .short('r')
                        .long(ARG_REMEMBER)
                        .help("Remember the session across runs")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("logout").about("Forget the current session"))
        .subcommand(Command::new("status").about("Show the current session"))
        .subcommand(
            Command::new("visit")
                .about("Navigate through the guarded router")
                .arg(
                    Arg::new(ARG_PATHS)
                        .help("Paths to visit in order")
                        .num_args(1..)
                        .required(true),
                ),
        )
        .subcommand(Command::new("routes").about("List the route table"));

    logging::with_args(command)
}
