use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::from_str;

static PASSAGE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/passages");

/// Where the reference text of the next session comes from.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TextMode {
    #[default]
    Random,
    Custom,
}

impl TextMode {
    pub fn toggle(self) -> Self {
        match self {
            TextMode::Random => TextMode::Custom,
            TextMode::Custom => TextMode::Random,
        }
    }
}

/// A named set of sample passages embedded in the binary.
#[derive(Deserialize, Clone, Debug)]
pub struct PassageSet {
    pub name: String,
    pub size: u32,
    pub passages: Vec<String>,
}

impl PassageSet {
    pub fn load(name: &str) -> Option<Self> {
        let file = PASSAGE_DIR.get_file(format!("{name}.json"))?;
        match from_str(file.contents_utf8()?) {
            Ok(set) => Some(set),
            Err(e) => {
                tracing::error!("passage set {} is malformed: {}", name, e);
                None
            }
        }
    }

    pub fn english() -> Self {
        Self::load("english").unwrap_or_else(|| Self {
            name: "english".to_string(),
            size: 1,
            passages: vec!["The quick brown fox jumps over the lazy dog.".to_string()],
        })
    }

    pub fn random(&self) -> Option<&str> {
        self.passages
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }
}

/// Pick the reference text for a session.
///
/// Custom text is trimmed; an empty result is returned as-is so that starting
/// the session reports it. Custom mode with no usable text falls back to a
/// random passage only when `fallback_to_random` is set.
pub fn select_text(
    set: &PassageSet,
    mode: TextMode,
    custom: Option<&str>,
    fallback_to_random: bool,
) -> String {
    let custom = custom.map(str::trim).unwrap_or_default();
    match mode {
        TextMode::Custom if !custom.is_empty() => custom.to_string(),
        TextMode::Custom if !fallback_to_random => String::new(),
        _ => set.random().unwrap_or_default().to_string(),
    }
}
