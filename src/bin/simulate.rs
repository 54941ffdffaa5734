//! Host and overlay in one process, driven from stdin.
//!
//! A [`MemoryDirectory`] plays the browser.  Every page the host delivers a
//! message to gets its own [`OverlayEngine`] and [`HeadlessSurface`], the
//! way every real page runs its own copy of the overlay.
//!
//! Run with:
//!     cargo run --bin desktab-sim -- --tabs tabs.json
//!
//! Each stdin line is one of
//!
//! ```text
//! toggle                  keyboard shortcut / toolbar button
//! navigate <id> <url>     load a new document in a tab
//! activate <id>           the user picks a tab in the browser's tab strip
//! close <id>              the user closes a tab in the browser
//! tabs                    print the directory
//! {"Key":"ArrowRight"}    any InputEvent, sent to the overlay on screen
//! ```

use desktab::config::Config;
use desktab::host::coordinator::Coordinator;
use desktab::host::memory::MemoryDirectory;
use desktab::input::InputEvent;
use desktab::message::{GroupId, HostMessage, OverlayRequest, TabId, TabRecord};
use desktab::overlay::OverlayEngine;
use desktab::page::InMemoryPage;
use desktab::render::{CardIcon, Frame};
use desktab::surface::HeadlessSurface;
use desktab::traits::{Relay, SurfaceEvent, TabDirectory};
use log::{error, info, warn};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

//  Page relay

/// Relay that tags each request with the page it came from.
struct PageRelay {
    page: TabId,
    tx: mpsc::Sender<(TabId, OverlayRequest)>,
}

#[derive(Debug, thiserror::Error)]
#[error("host is gone")]
struct HostGone;

impl Relay for PageRelay {
    type Error = HostGone;

    fn send(&self, request: OverlayRequest) -> Result<(), HostGone> {
        self.tx.send((self.page, request)).map_err(|_| HostGone)
    }
}

/// One page's overlay.
struct Page {
    engine: OverlayEngine<PageRelay, InMemoryPage>,
    surface: HeadlessSurface,
    surface_rx: mpsc::Receiver<SurfaceEvent>,
}

//  Simulation

struct Sim {
    config: Config,
    coordinator: Coordinator<MemoryDirectory>,
    outbox: mpsc::Receiver<(TabId, HostMessage)>,
    requests_tx: mpsc::Sender<(TabId, OverlayRequest)>,
    requests: mpsc::Receiver<(TabId, OverlayRequest)>,
    pages: HashMap<TabId, Page>,
    /// Simulated clock; every command advances it far enough for all
    /// animations to settle.
    clock: Instant,
}

impl Sim {
    fn new(config: Config, tabs: Vec<TabRecord>) -> Self {
        let mut directory = MemoryDirectory::new(tabs);
        let (outbox_tx, outbox) = mpsc::channel();
        directory.set_outbox(outbox_tx);
        let (requests_tx, requests) = mpsc::channel();
        let mut coordinator = Coordinator::new(directory, &config.host);
        coordinator.on_startup();
        Self {
            config,
            coordinator,
            outbox,
            requests_tx,
            requests,
            pages: HashMap::new(),
            clock: Instant::now(),
        }
    }

    fn run_line(&mut self, line: &str) {
        let mut words = line.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (None, _, _) => return,
            (Some("toggle"), None, None) => match self.coordinator.toggle() {
                Ok(outcome) => info!("toggle: {:?}", outcome),
                Err(e) => error!("toggle failed: {}", e),
            },
            (Some("navigate"), Some(id), Some(url)) => {
                if let Some(page) = parse_id(id) {
                    self.navigate(page, url);
                }
            }
            (Some("activate"), Some(id), None) => {
                if let Some(page) = parse_id(id) {
                    self.activate(page);
                }
            }
            (Some("close"), Some(id), None) => {
                if let Some(page) = parse_id(id) {
                    self.close(page);
                }
            }
            (Some("tabs"), None, None) => self.print_tabs(),
            _ => match serde_json::from_str::<InputEvent>(line) {
                Ok(input) => self.input(input),
                Err(e) => error!("unrecognised line {:?}: {}", line, e),
            },
        }
        self.pump();
        self.advance();
        self.print_screen();
    }

    fn navigate(&mut self, page: TabId, url: &str) {
        if let Err(e) = self.coordinator.directory().navigate(page, url) {
            warn!("navigate: {}", e);
            return;
        }
        self.pages.remove(&page);
        self.coordinator.on_tab_loading(page);
        self.coordinator.on_url_changed(page, url);
    }

    fn activate(&mut self, page: TabId) {
        let directory = self.coordinator.directory();
        let group = match directory.get(page) {
            Ok(Some(tab)) => tab.group_id,
            _ => {
                warn!("activate: no {}", page);
                return;
            }
        };
        let result = directory
            .focus_group(group)
            .and_then(|()| directory.activate(page));
        if let Err(e) = result {
            warn!("activate: {}", e);
            return;
        }
        self.coordinator.on_tab_activated(page);
    }

    fn close(&mut self, page: TabId) {
        if let Err(e) = self.coordinator.directory().remove(&[page]) {
            warn!("close: {}", e);
            return;
        }
        self.pages.remove(&page);
        self.coordinator.on_tab_removed(page);
    }

    /// Send user input to the overlay on screen.
    fn input(&mut self, input: InputEvent) {
        let Some(page) = self.visible_page() else {
            warn!("no overlay on screen, dropping {:?}", input);
            return;
        };
        if let Some(p) = self.pages.get_mut(&page) {
            if let Err(e) = p.engine.handle(input.into()) {
                error!("event error: {}", e);
            }
        }
    }

    /// Shuttle messages between host and pages until both sides are quiet.
    fn pump(&mut self) {
        loop {
            let mut busy = false;
            while let Ok((page, message)) = self.outbox.try_recv() {
                busy = true;
                self.page(page).engine.handle_message(message);
            }
            while let Ok((page, request)) = self.requests.try_recv() {
                busy = true;
                if let Some(reply) = self.coordinator.handle_request(Some(page), request) {
                    println!("reply to {}: {} tab(s)", page, reply.tabs.len());
                }
            }
            if !busy {
                break;
            }
        }
    }

    /// The page's overlay, created on first delivery.
    fn page(&mut self, id: TabId) -> &mut Page {
        let config = &self.config;
        let requests_tx = &self.requests_tx;
        self.pages.entry(id).or_insert_with(|| {
            info!("overlay started in {}", id);
            let relay = PageRelay {
                page: id,
                tx: requests_tx.clone(),
            };
            let mut engine = OverlayEngine::new(relay, InMemoryPage::new(), config.overlay.clone());
            let (tx, surface_rx) = mpsc::channel();
            engine.set_surface(tx);
            Page {
                engine,
                surface: HeadlessSurface::new(),
                surface_rx,
            }
        })
    }

    fn advance(&mut self) {
        let now = self.clock;
        self.clock += Duration::from_secs(1);
        for p in self.pages.values_mut() {
            while let Ok(event) = p.surface_rx.try_recv() {
                p.surface.apply(event, now);
            }
            p.surface.tick(self.clock);
        }
    }

    /// The page whose overlay is open: the active tab's, if it has one.
    fn visible_page(&self) -> Option<TabId> {
        let active = self.coordinator.directory().active_tab().ok()??;
        self.pages
            .get(&active.id)
            .filter(|p| p.engine.is_visible())
            .map(|_| active.id)
    }

    fn print_tabs(&self) {
        for tab in self.coordinator.directory().tabs() {
            println!(
                "{:>4} {} pos {:>2} {} {} {}",
                tab.id.0,
                tab.group_id,
                tab.position,
                if tab.is_active { "*" } else { " " },
                tab.display_title(),
                tab.url
            );
        }
    }

    fn print_screen(&self) {
        let Some(page) = self.visible_page() else {
            println!("(overlay hidden)");
            return;
        };
        let Some(frame) = self.pages.get(&page).and_then(|p| p.surface.frame()) else {
            println!("(overlay hidden)");
            return;
        };
        print_frame(page, frame);
    }
}

fn print_frame(page: TabId, frame: &Frame) {
    println!(
        "overlay in {}: {} open tabs, ~{} MB",
        page, frame.header.tab_count, frame.header.estimated_ram_mb
    );
    if frame.is_empty() {
        println!("  {}", Frame::EMPTY_MESSAGE);
    }
    for card in &frame.cards {
        let icon = match &card.icon {
            CardIcon::Image(_) => '#',
            CardIcon::Placeholder(c) => *c,
        };
        println!(
            "  {}{} [{}] {} ({})",
            if card.selected { ">" } else { " " },
            if card.active { "*" } else { " " },
            icon,
            card.title,
            card.tab_id
        );
    }
}

fn parse_id(s: &str) -> Option<TabId> {
    match s.parse() {
        Ok(id) => Some(TabId(id)),
        Err(e) => {
            error!("bad tab id {:?}: {}", s, e);
            None
        }
    }
}

//  Setup

fn sample_tabs() -> Vec<TabRecord> {
    let pages = [
        ("Rust Programming Language", "https://www.rust-lang.org/"),
        ("docs.rs", "https://docs.rs/"),
        ("serde - Rust", "https://docs.rs/serde"),
        ("Extensions", "chrome://extensions"),
        ("The Cargo Book", "https://doc.rust-lang.org/cargo/"),
    ];
    pages
        .iter()
        .enumerate()
        .map(|(i, (title, url))| TabRecord {
            id: TabId(i as u64 + 1),
            title: title.to_string(),
            url: url.to_string(),
            icon_ref: None,
            is_active: i == 0,
            group_id: GroupId(1),
            position: i as i64,
        })
        .collect()
}

fn load_tabs(path: &Path) -> Result<Vec<TabRecord>, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&contents).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
}

fn load_config() -> Config {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    let path = std::path::PathBuf::from(base).join("desktab").join("config.json");
    Config::load(&path).unwrap_or_else(|e| {
        info!("no config file ({}), using defaults", e);
        Config::default()
    })
}

//  Main

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let tabs = match args.iter().position(|a| a == "--tabs") {
        Some(i) => match args.get(i + 1).map(|p| load_tabs(Path::new(p))) {
            Some(Ok(tabs)) => tabs,
            Some(Err(e)) => {
                error!("{}", e);
                std::process::exit(1);
            }
            None => {
                error!("--tabs needs a path");
                std::process::exit(1);
            }
        },
        None => sample_tabs(),
    };

    let mut sim = Sim::new(load_config(), tabs);
    info!("desktab simulator ready ({} tabs)", sim.coordinator.directory().tabs().len());

    for line in std::io::stdin().lock().lines() {
        match line {
            Ok(line) => sim.run_line(line.trim()),
            Err(e) => {
                error!("read error: {}", e);
                break;
            }
        }
    }
}
