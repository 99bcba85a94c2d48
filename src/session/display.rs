//! Output regions and the per-session display buffer.
//!
//! Each region corresponds to one output element of the dashboard page. A
//! region holds an append-only list of styled [`Entry`] values; starting a
//! new operation replaces its contents with a single placeholder entry.
//!
//! Every change is also queued as an [`Update`] so the terminal driver can
//! print exactly what was added since it last looked.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named output area of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    BakeReport,
    Tweet,
    Sentiment,
    TerminateReport,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::BakeReport,
        Region::Tweet,
        Region::Sentiment,
        Region::TerminateReport,
    ];

    /// The element id of this region on the dashboard page.
    pub fn element_id(self) -> &'static str {
        match self {
            Self::BakeReport => "bake-report",
            Self::Tweet => "tweet",
            Self::Sentiment => "sentiment",
            Self::TerminateReport => "terminate-report",
        }
    }

    pub fn from_element_id(id: &str) -> Option<Self> {
        let id = id.trim_start_matches('#');
        Self::ALL.into_iter().find(|r| r.element_id() == id)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_id())
    }
}

/// How an entry is styled.
///
/// `Red` and `Blue` are the alternating status colors; they carry no
/// meaning beyond telling consecutive reports apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Plain,
    Red,
    Blue,
    Notice,
    Error,
}

impl Tone {
    fn css_class(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Notice => "notice",
            Self::Error => "error",
        }
    }
}

/// One line of region output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub text: String,
    pub tone: Tone,
}

impl Entry {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Plain)
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Notice)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Error)
    }
}

/// A change made to a region, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// The region was reset to this single entry.
    Replaced(Region, Entry),
    /// The entry was added to the end of the region.
    Appended(Region, Entry),
}

#[derive(Debug, Default)]
pub struct DisplayBuffer {
    regions: HashMap<Region, Vec<Entry>>,
    pending: Vec<Update>,
}

impl DisplayBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset a region to a single entry.
    pub fn replace(&mut self, region: Region, entry: Entry) {
        self.regions.insert(region, vec![entry.clone()]);
        self.pending.push(Update::Replaced(region, entry));
    }

    pub fn append(&mut self, region: Region, entry: Entry) {
        self.regions.entry(region).or_default().push(entry.clone());
        self.pending.push(Update::Appended(region, entry));
    }

    pub fn entries(&self, region: Region) -> &[Entry] {
        self.regions.get(&region).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drain the changes queued since the last call.
    pub fn take_pending(&mut self) -> Vec<Update> {
        std::mem::take(&mut self.pending)
    }

    /// Render a region as an HTML fragment for the dashboard page.
    pub fn render_html(&self, region: Region) -> String {
        self.entries(region)
            .iter()
            .map(|e| {
                format!(
                    "<div class=\"entry {}\">{}</div>",
                    e.tone.css_class(),
                    escape_html(&e.text)
                )
            })
            .collect()
    }
}

/// Escape text for inclusion in HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
