//! Intent Classification
//!
//! Maps a normalized utterance to exactly one [`Intent`]. The check order
//! is fixed: terminate, media search, launch, then conversation as the
//! fallback.

use tracing::debug;

/// Phrase that ends the session. Matched by equality only.
pub const TERMINATION_PHRASE: &str = "bye";

/// Verbs that, together with a media noun, request a media search
pub const MEDIA_VERBS: &[&str] = &["play", "search"];

/// Nouns that, together with a media verb, request a media search
pub const MEDIA_NOUNS: &[&str] = &["youtube", "video"];

/// Verbs that request opening an application or website.
/// Order matters: the first verb present decides where the target starts.
pub const LAUNCH_VERBS: &[&str] = &["open", "launch", "start"];

/// Classified purpose of an utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// End the session
    Terminate,
    /// Search for media; carries the full normalized utterance
    MediaSearch { query: String },
    /// Open an application or website by name
    LaunchTarget { name: String },
    /// Forward verbatim to the conversation model
    Converse { message: String },
}

impl Intent {
    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Terminate => "terminate",
            Intent::MediaSearch { .. } => "media_search",
            Intent::LaunchTarget { .. } => "launch_target",
            Intent::Converse { .. } => "converse",
        }
    }
}

/// Trim and lowercase raw transcript text
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Classify a normalized utterance. Total: always yields one variant.
pub fn classify(utterance: &str) -> Intent {
    let intent = if utterance == TERMINATION_PHRASE {
        Intent::Terminate
    } else if is_media_search(utterance) {
        Intent::MediaSearch {
            query: utterance.to_string(),
        }
    } else if let Some(name) = launch_target(utterance) {
        Intent::LaunchTarget { name }
    } else {
        Intent::Converse {
            message: utterance.to_string(),
        }
    };

    debug!("🧭 Classified '{}' as {}", utterance, intent.label());
    intent
}

fn is_media_search(text: &str) -> bool {
    MEDIA_VERBS.iter().any(|v| text.contains(v)) && MEDIA_NOUNS.iter().any(|n| text.contains(n))
}

/// Everything after the first occurrence of the first launch verb present
fn launch_target(text: &str) -> Option<String> {
    let verb = LAUNCH_VERBS.iter().find(|v| text.contains(*v))?;
    let idx = text.find(verb)?;
    Some(text[idx + verb.len()..].trim().to_lowercase())
}
