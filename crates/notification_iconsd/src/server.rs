use crate::{
    app::{self, DaemonCommand},
    dbus,
    json_row::JsonRow,
    paths::Paths,
    prefs_file::JsonPreferences,
    tray::MessageTray,
};
use anyhow::{Context, Result};
use std::{
    path::{Path, PathBuf},
    sync::{atomic::Ordering, Arc},
};
use tokio::sync::{mpsc::UnboundedSender, watch};

/// Flips to true once SIGINT or SIGTERM arrived. The command loop and the file watcher stop when
/// it does; waiting on an already triggered signal returns immediately.
#[derive(Debug, Clone)]
struct ShutdownSignal(Arc<watch::Sender<bool>>);

impl ShutdownSignal {
    fn new() -> Self {
        ShutdownSignal(Arc::new(watch::channel(false).0))
    }

    fn trigger(&self) {
        self.0.send_replace(true);
    }

    fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    async fn wait(&self) {
        let mut recv = self.0.subscribe();
        // can't fail, the sender lives in self
        let _ = recv.wait_for(|triggered| *triggered).await;
    }
}

/// Run the daemon until it receives SIGINT or SIGTERM.
///
/// The icon state is not `Send`, so it lives in the task driving the runtime; everything else
/// (D-Bus interfaces, file watching) talks to it through [`DaemonCommand`]s.
pub fn initialize_server(paths: Paths, dnd: bool) -> Result<()> {
    log::info!("Loading paths: {}", &paths);

    let shutdown = ShutdownSignal::new();
    {
        let shutdown = shutdown.clone();
        simple_signal::set_handler(&[simple_signal::Signal::Int, simple_signal::Signal::Term], move |_| {
            if shutdown.is_triggered() {
                log::warn!("Shutdown already in progress, exiting right away");
                std::process::exit(1);
            }
            log::info!("Shutting down notification icons daemon...");
            shutdown.trigger();
        });
    }

    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build().context("Failed to initialize tokio runtime")?;
    rt.block_on(async move {
        let (evt_send, mut evt_recv) = tokio::sync::mpsc::unbounded_channel();

        let connection = dbus::serve(!dnd, evt_send.clone())
            .await
            .context("Failed to claim the notification bus names. Is another notification daemon running?")?;
        log::info!("Serving {} and {}", dbus::NOTIFICATIONS_BUS, dbus::CONTROL_BUS);

        let prefs = JsonPreferences::load_or_default(paths.get_preferences_file());
        let mut app = app::App::new(MessageTray::new(!dnd, Some(connection)), prefs, JsonRow::stdout());

        let filewatch_join_handle = {
            let evt_send = evt_send.clone();
            let preferences_file = paths.get_preferences_file();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { run_filewatch(paths.get_config_dir(), preferences_file, evt_send, shutdown).await })
        };

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                command = evt_recv.recv() => match command {
                    Some(command) => app.handle_command(command),
                    None => break,
                },
            }
        }

        app.shutdown();
        match filewatch_join_handle.await {
            Ok(Err(e)) => log::error!("File watcher exited with error: {:?}", e),
            Err(e) => log::error!("File watcher panicked: {}", e),
            Ok(Ok(())) => {}
        }
        log::info!("main application loop finished");
        Ok(())
    })
}

/// Watch the preference file for changes, sending reload events to the app when it changes.
async fn run_filewatch(
    config_dir: impl AsRef<Path>,
    preferences_file: PathBuf,
    evt_send: UnboundedSender<DaemonCommand>,
    shutdown: ShutdownSignal,
) -> Result<()> {
    use notify::{RecommendedWatcher, RecursiveMode, Watcher};

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let file_name = preferences_file.file_name().map(|name| name.to_owned());
    let mut watcher: RecommendedWatcher = Watcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(notify::Event { kind: notify::EventKind::Modify(_) | notify::EventKind::Create(_), paths, .. }) => {
                let relevant_file_changed = paths.iter().any(|path| path.file_name() == file_name.as_deref());
                if relevant_file_changed {
                    if let Err(err) = tx.send(()) {
                        log::warn!("Error forwarding file update event: {:?}", err);
                    }
                }
            }
            Ok(_) => {}
            Err(e) => log::error!("Encountered Error While Watching Files: {}", e),
        },
        notify::Config::default(),
    )?;
    // the directory is watched, since editors tend to replace the file instead of writing to it
    watcher.watch(config_dir.as_ref(), RecursiveMode::NonRecursive)?;

    // only accept one reload every 500ms
    let debounce_done = Arc::new(std::sync::atomic::AtomicBool::new(true));

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            event = rx.recv() => {
                if event.is_none() {
                    break;
                }
                let debounce_done = debounce_done.clone();
                if debounce_done.swap(false, Ordering::SeqCst) {
                    tokio::spawn(async move {
                        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                        debounce_done.store(true, Ordering::SeqCst);
                    });

                    // editors may truncate the file before writing it out
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    evt_send.send(DaemonCommand::ReloadPreferences)?;
                }
            },
        }
    }
    Ok(())
}
