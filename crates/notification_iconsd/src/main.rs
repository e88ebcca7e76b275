use anyhow::{Context, Result};
use clap::CommandFactory as _;
use paths::Paths;

mod app;
mod client;
mod dbus;
mod json_row;
mod opts;
mod paths;
mod prefs_file;
mod server;
mod tray;

fn main() {
    let opts: opts::Opt = opts::Opt::from_env();

    let log_level_filter = if opts.log_debug { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    if std::env::var("RUST_LOG").is_ok() {
        pretty_env_logger::init_timed();
    } else {
        pretty_env_logger::formatted_timed_builder()
            .filter(Some("notification_iconsd"), log_level_filter)
            .filter(Some("notification_icons"), log_level_filter)
            .init();
    }

    if let opts::Action::ShellCompletions { shell } = opts.action {
        clap_complete::generate(shell, &mut opts::RawOpt::command(), "notification-icons", &mut std::io::stdout());
        return;
    }

    if let Err(err) = run(opts) {
        log::error!("{:?}", err);
        std::process::exit(1);
    }
}

fn run(opts: opts::Opt) -> Result<()> {
    let paths = opts
        .config_path
        .map(Paths::from_config_dir)
        .unwrap_or_else(Paths::default)
        .context("Failed to initialize notification-icons paths")?;

    match opts.action {
        opts::Action::ShellCompletions { .. } => unreachable!(),
        opts::Action::Daemon { dnd } => {
            log::info!("Initializing notification icons daemon. (do-not-disturb: {})", dnd);
            server::initialize_server(paths, dnd)?;
        }
        opts::Action::ClientOnly(action) => client::handle_client_only_action(&paths, action)?,
        opts::Action::WithServer(action) => client::handle_server_action(action)?,
    }
    Ok(())
}
