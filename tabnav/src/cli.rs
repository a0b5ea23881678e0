use clap::App;
use clap::Arg;
use clap::ArgMatches;
use log::LevelFilter;
use std::str::FromStr;

pub fn init() -> ArgMatches<'static> {
    app().get_matches()
}

/// The `--log` level, defaulting to `Info`
pub fn log_level(args: &ArgMatches) -> anyhow::Result<LevelFilter> {
    match args.value_of("LOG") {
        Some(level) => LevelFilter::from_str(level)
            .map_err(|_| anyhow::format_err!("unknown log level: {}", level)),
        None => Ok(LevelFilter::Info),
    }
}

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn app() -> App<'static, 'static> {
    App::new("Tab Navigation Shell")
        .version(VERSION)
        .name("tabnav")
        .about("`tabnav`, a tabbed navigation shell which saves & restores your open tabs.")
        .arg(
            Arg::with_name("PROFILE")
                .long("profile")
                .short("p")
                .required(false)
                .takes_value(true)
                .validator(is_profile_id)
                .help("Loads the profile, restoring the tabs saved by its last session."),
        )
        .arg(
            Arg::with_name("OPEN")
                .long("open")
                .short("o")
                .required(false)
                .takes_value(true)
                .multiple(true)
                .min_values(1)
                .help("Opens tabs on the given urls.  The last one is focused."),
        )
        .arg(
            Arg::with_name("LIST")
                .long("list")
                .short("l")
                .required(false)
                .takes_value(false)
                .help("Lists the open tabs.  The current tab is marked with a star."),
        )
        .arg(
            Arg::with_name("EPHEMERAL")
                .long("ephemeral")
                .required(false)
                .takes_value(false)
                .help("Keeps profile data in memory.  Nothing is written to ~/.tabnav/profiles."),
        )
        .arg(
            Arg::with_name("DISABLE-TABS")
                .long("disable-tabs")
                .required(false)
                .takes_value(false)
                .help("Single-tab mode.  Only the first saved tab is restored."),
        )
        .arg(
            Arg::with_name("LOG")
                .long("log")
                .required(false)
                .takes_value(true)
                .possible_values(&["trace", "debug", "info", "warn", "error", "off"])
                .help("Sets the log level."),
        )
}

fn is_profile_id(value: String) -> Result<(), String> {
    value
        .parse::<i64>()
        .map(|_| ())
        .map_err(|_| format!("profile ids are integers, found: {}", value))
}
