use clap::{Parser, Subcommand, ValueEnum};
use notification_icons::PrefKey;

/// Struct that gets generated from `RawOpt`.
#[derive(Debug, PartialEq)]
pub struct Opt {
    pub log_debug: bool,
    pub config_path: Option<std::path::PathBuf>,
    pub action: Action,
}

#[derive(Parser, Debug, PartialEq)]
#[command(author = "ElKowar", version, about)]
pub(super) struct RawOpt {
    /// Write out debug logs.
    #[arg(long = "debug", global = true)]
    log_debug: bool,

    /// Override path to the configuration directory (the directory that contains preferences.json)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Action {
    /// Generate a shell completion script
    ShellCompletions {
        #[arg(short, long)]
        #[arg(value_enum)]
        shell: clap_complete::shells::Shell,
    },

    /// Start the notification server, printing the icon row to stdout.
    #[command(name = "daemon", alias = "d")]
    Daemon {
        /// Start with do-not-disturb enabled.
        #[arg(long)]
        dnd: bool,
    },

    #[command(flatten)]
    ClientOnly(ActionClientOnly),

    #[command(flatten)]
    WithServer(ActionWithServer),
}

/// Actions that only touch the preference file.
#[derive(Subcommand, Debug, PartialEq)]
pub enum ActionClientOnly {
    /// Change a preference. A running daemon picks it up automatically.
    #[command(name = "set")]
    Set {
        #[arg(value_parser = parse_pref_key)]
        key: PrefKey,
        /// `true`/`false`, a number, or the name of a mode or size
        value: String,
    },

    /// Print the value of a preference.
    #[command(name = "get")]
    Get {
        #[arg(value_parser = parse_pref_key)]
        key: PrefKey,
    },
}

/// Actions that talk to a running daemon.
#[derive(Subcommand, Debug, PartialEq)]
pub enum ActionWithServer {
    /// Switch do-not-disturb on or off.
    #[command(name = "dnd")]
    Dnd {
        #[arg(value_enum)]
        state: DndSwitch,
    },

    /// Show the notifications behind an icon, as if it was clicked.
    #[command(name = "activate")]
    Activate { identity: String },

    /// Close every notification behind an icon.
    #[command(name = "dismiss")]
    Dismiss { identity: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DndSwitch {
    On,
    Off,
    Toggle,
}

impl Opt {
    pub fn from_env() -> Self {
        let raw: RawOpt = RawOpt::parse();
        raw.into()
    }
}

impl From<RawOpt> for Opt {
    fn from(other: RawOpt) -> Self {
        let RawOpt { action, log_debug, config } = other;
        Opt { action, log_debug, config_path: config }
    }
}

fn parse_pref_key(s: &str) -> Result<PrefKey, String> {
    s.parse().map_err(|_| {
        let keys: Vec<String> = <PrefKey as strum::IntoEnumIterator>::iter().map(|key| key.to_string()).collect();
        format!("unknown preference {:?}, expected one of: {}", s, keys.join(", "))
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::CommandFactory as _;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Result<Opt, clap::Error> {
        RawOpt::try_parse_from(std::iter::once("notification-icons").chain(args.iter().copied())).map(Opt::from)
    }

    #[test]
    fn test_command_is_valid() {
        RawOpt::command().debug_assert();
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            parse(&["--debug", "daemon", "--dnd"]).unwrap(),
            Opt { log_debug: true, config_path: None, action: Action::Daemon { dnd: true } }
        );
        assert_eq!(
            parse(&["set", "icon-size", "large", "--config", "/tmp/icons"]).unwrap(),
            Opt {
                log_debug: false,
                config_path: Some("/tmp/icons".into()),
                action: Action::ClientOnly(ActionClientOnly::Set { key: PrefKey::IconSize, value: "large".to_string() }),
            }
        );
        assert_eq!(
            parse(&["dnd", "toggle"]).unwrap().action,
            Action::WithServer(ActionWithServer::Dnd { state: DndSwitch::Toggle })
        );
        assert_eq!(
            parse(&["dismiss", ":generated-1"]).unwrap().action,
            Action::WithServer(ActionWithServer::Dismiss { identity: ":generated-1".to_string() })
        );
    }

    #[test]
    fn test_unknown_key() {
        let err = parse(&["get", "size"]).unwrap_err();
        assert!(err.to_string().contains("expected one of: right-side, colored-icons"));
    }
}
