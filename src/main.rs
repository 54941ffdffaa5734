//! Entry point for the **desktab** overlay daemon.
//!
//! Events (host pushes and user input) arrive as JSON lines on a Unix
//! socket and are processed on the main thread.  Requests for the host are
//! written to stdout, one JSON object per line.  The view is kept by a
//! [`HeadlessSurface`] that logs what it shows.

use desktab::config::Config;
use desktab::input::Event;
use desktab::ipc::listener::UnixSocketListener;
use desktab::ipc::relay::JsonLineRelay;
use desktab::overlay::OverlayEngine;
use desktab::page::InMemoryPage;
use desktab::surface::HeadlessSurface;
use desktab::traits::{InputSource, SurfaceEvent};
use log::{error, info};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Frame interval of the surface animations.
const TICK: Duration = Duration::from_millis(16);

/// Default socket path for the event listener.
fn default_socket_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/desktab.sock", runtime)
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/desktab`).
fn config_dir() -> std::path::PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    std::path::PathBuf::from(base).join("desktab")
}

/// Try to load the config from `$XDG_CONFIG_HOME/desktab/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();
    let relay = JsonLineRelay::new(std::io::stdout());
    let mut engine = OverlayEngine::new(relay, InMemoryPage::new(), config.overlay);

    let (surface_tx, surface_rx) = mpsc::channel::<SurfaceEvent>();
    engine.set_surface(surface_tx);

    let (event_tx, event_rx) = mpsc::channel::<Event>();
    spawn_input_sources(event_tx);

    run_event_loop(engine, event_rx, surface_rx);
}

//  Event loop

fn run_event_loop<R, P>(
    mut engine: OverlayEngine<R, P>,
    event_rx: mpsc::Receiver<Event>,
    surface_rx: mpsc::Receiver<SurfaceEvent>,
) where
    R: desktab::traits::Relay,
    P: desktab::traits::PageScroll,
{
    let mut surface = HeadlessSurface::new();
    info!("desktab running");

    loop {
        // Sleep until the next event, or the next frame while animating.
        let timeout = if surface.is_animating() {
            TICK
        } else {
            Duration::from_secs(3600)
        };
        match event_rx.recv_timeout(timeout) {
            Ok(event) => {
                if let Err(e) = engine.handle(event) {
                    error!("event error: {}", e);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        while let Ok(event) = surface_rx.try_recv() {
            surface.apply(event, now);
        }
        surface.tick(now);
    }
    info!("all input sources closed, exiting");
}

//  Helpers

fn spawn_input_sources(tx: mpsc::Sender<Event>) {
    let path = default_socket_path();
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&path);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}
