//! Action Resolvers
//!
//! Turns a launch target or media request into one side effect through a
//! [`SystemLauncher`] and a sentence describing what happened. Failures
//! never escape: they become the returned sentence.

use crate::error::BotResult;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

pub mod system;

pub use system::NativeLauncher;

/// YouTube search URL; the query is appended percent-encoded
pub const MEDIA_SEARCH_URL: &str = "https://www.youtube.com/results?search_query=";
/// Opened when a media request has no query left after stripping
pub const MEDIA_HOME_URL: &str = "https://www.youtube.com";

lazy_static! {
    /// Media verbs, nouns and the "for" connector, plural forms included
    static ref MEDIA_STOP_WORDS: Regex =
        Regex::new(r"\b(?:play|search|youtube|video|for)s?\b").expect("valid stop-word pattern");
}

/// Host operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl OsFamily {
    pub fn current() -> Self {
        Self::from_name(std::env::consts::OS)
    }

    pub fn from_name(os: &str) -> Self {
        match os {
            "windows" => OsFamily::Windows,
            "macos" => OsFamily::MacOs,
            "linux" => OsFamily::Linux,
            _ => OsFamily::Other,
        }
    }
}

/// How an OS-specific table entry is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppDirective {
    /// Executable path or name, spawned directly (Windows)
    Program(String),
    /// Application bundle name, opened with `open -a` (macOS)
    MacApp(String),
}

/// One table row: a canonical key, its spoken aliases, and the target
#[derive(Debug, Clone, Copy)]
pub struct LaunchEntry {
    pub key: &'static str,
    pub aliases: &'static [&'static str],
    pub target: &'static str,
}

impl LaunchEntry {
    fn matches(&self, name: &str) -> bool {
        self.key == name || self.aliases.contains(&name)
    }
}

const WEBSITES: &[LaunchEntry] = &[
    LaunchEntry { key: "youtube", aliases: &[], target: "https://www.youtube.com" },
    LaunchEntry { key: "google", aliases: &[], target: "https://www.google.com" },
    LaunchEntry { key: "facebook", aliases: &[], target: "https://www.facebook.com" },
    LaunchEntry { key: "x", aliases: &["twitter"], target: "https://www.x.com" },
    LaunchEntry { key: "github", aliases: &[], target: "https://www.github.com" },
    LaunchEntry { key: "netflix", aliases: &[], target: "https://www.netflix.com" },
];

const WINDOWS_APPS: &[LaunchEntry] = &[
    LaunchEntry {
        key: "chrome",
        aliases: &["google chrome"],
        target: r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    },
    LaunchEntry {
        key: "firefox",
        aliases: &["mozilla firefox"],
        target: r"C:\Program Files\Mozilla Firefox\firefox.exe",
    },
    LaunchEntry { key: "notepad", aliases: &[], target: "notepad.exe" },
    LaunchEntry { key: "calculator", aliases: &["calc"], target: "calc.exe" },
    LaunchEntry { key: "explorer", aliases: &["file explorer"], target: "explorer.exe" },
    LaunchEntry { key: "spotify", aliases: &[], target: "Spotify.exe" },
];

const MAC_APPS: &[LaunchEntry] = &[
    LaunchEntry { key: "chrome", aliases: &["google chrome"], target: "Google Chrome" },
    LaunchEntry { key: "firefox", aliases: &["mozilla firefox"], target: "Firefox" },
    LaunchEntry { key: "safari", aliases: &[], target: "Safari" },
    LaunchEntry { key: "calculator", aliases: &[], target: "Calculator" },
    LaunchEntry { key: "finder", aliases: &[], target: "Finder" },
    LaunchEntry { key: "spotify", aliases: &[], target: "Spotify" },
];

/// Static website and per-OS application tables
#[derive(Debug, Clone, Copy)]
pub struct LaunchTable {
    pub websites: &'static [LaunchEntry],
    pub windows: &'static [LaunchEntry],
    pub macos: &'static [LaunchEntry],
}

impl Default for LaunchTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LaunchTable {
    pub const fn builtin() -> Self {
        Self {
            websites: WEBSITES,
            windows: WINDOWS_APPS,
            macos: MAC_APPS,
        }
    }

    pub fn website(&self, name: &str) -> Option<&'static str> {
        lookup(self.websites, name)
    }

    /// Table directive for `name` on `os`. Linux and other hosts have no table.
    pub fn app(&self, os: OsFamily, name: &str) -> Option<AppDirective> {
        match os {
            OsFamily::Windows => lookup(self.windows, name).map(|t| AppDirective::Program(t.into())),
            OsFamily::MacOs => lookup(self.macos, name).map(|t| AppDirective::MacApp(t.into())),
            OsFamily::Linux | OsFamily::Other => None,
        }
    }
}

fn lookup(entries: &'static [LaunchEntry], name: &str) -> Option<&'static str> {
    entries.iter().find(|e| e.matches(name)).map(|e| e.target)
}

/// OS-level launch primitives
pub trait SystemLauncher: Send + Sync {
    /// Open a URL with the default handler
    fn open_url(&self, url: &str) -> BotResult<()>;

    /// Open an application from a table directive
    fn open_application(&self, directive: &AppDirective) -> BotResult<()>;

    /// Spawn an executable by bare name (Linux best-effort tier)
    fn spawn_by_name(&self, name: &str) -> BotResult<()>;
}

/// Open a website or application by spoken name.
///
/// Order: website table, then the host's application table, then on
/// Linux a direct spawn of `name` as an executable.
pub fn open_target(name: &str, os: OsFamily, table: &LaunchTable, launcher: &dyn SystemLauncher) -> String {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return "Sorry, I don't know how to open that".to_string();
    }

    if let Some(url) = table.website(&name) {
        info!("🌐 Opening website {} -> {}", name, url);
        return match launcher.open_url(url) {
            Ok(()) => format!("Opening {} in your default browser", name),
            Err(e) => launch_error(&name, e),
        };
    }

    if let Some(directive) = table.app(os, &name) {
        info!("🚀 Opening {} via {:?}", name, directive);
        return match launcher.open_application(&directive) {
            Ok(()) => format!("Opening {}", name),
            Err(e) => launch_error(&name, e),
        };
    }

    if os == OsFamily::Linux {
        debug!("No table entry for '{}', spawning it by name", name);
        return match launcher.spawn_by_name(&name) {
            Ok(()) => format!("Attempting to open {}", name),
            Err(e) => launch_error(&name, e),
        };
    }

    format!("Sorry, I don't know how to open {}", name)
}

fn launch_error(name: &str, err: impl std::fmt::Display) -> String {
    warn!("❌ Failed to open {}: {}", name, err);
    format!("Error opening {}: {}", name, err)
}

/// Remove media verbs, nouns and "for" as whole words, collapsing whitespace
pub fn clean_media_query(utterance: &str) -> String {
    let lowered = utterance.to_lowercase();
    let stripped = MEDIA_STOP_WORDS.replace_all(&lowered, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Search URL for an already cleaned query
pub fn media_search_url(query: &str) -> String {
    format!("{}{}", MEDIA_SEARCH_URL, urlencoding::encode(query))
}

/// Open a YouTube search for the utterance and describe it
pub fn search_media(utterance: &str, launcher: &dyn SystemLauncher) -> String {
    let query = clean_media_query(utterance);

    if query.is_empty() {
        info!("🎬 Media request without a query, opening YouTube");
        return match launcher.open_url(MEDIA_HOME_URL) {
            Ok(()) => "Opening YouTube".to_string(),
            Err(e) => search_error(e),
        };
    }

    let url = media_search_url(&query);
    info!("🎬 Searching YouTube: {}", url);
    match launcher.open_url(&url) {
        Ok(()) => format!("Searching YouTube for '{}'", query),
        Err(e) => search_error(e),
    }
}

fn search_error(err: impl std::fmt::Display) -> String {
    warn!("❌ YouTube search failed: {}", err);
    format!("Error searching YouTube: {}", err)
}
