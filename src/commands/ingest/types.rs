use super::*;

/// A positioned run of text, in PDF points with the origin at the bottom-left.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    /// Zero-based position among the images of its page.
    pub index: u32,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfPage {
    pub number: u32,
    pub width: f64,
    pub height: f64,
    pub fragments: Vec<TextFragment>,
    pub images: Vec<EmbeddedImage>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedSource {
    pub title: Option<String>,
    pub author: Option<String>,
    pub pages: Vec<PdfPage>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub page: u32,
    pub centered: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SavedImages {
    pub files: BTreeSet<(u32, u32)>,
    pub map: Option<(u32, u32)>,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

impl SavedImages {
    pub fn contains(&self, page: u32, index: u32) -> bool {
        self.files.contains(&(page, index))
    }
}

/// Hand-tuned recovery for one section boundary the layout heuristics cannot
/// see: while `after` is the current section, a line containing any of
/// `phrases` opens section `header`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryRescue {
    pub after: u32,
    pub header: u32,
    pub phrases: Vec<String>,
}

impl BoundaryRescue {
    /// Typographic single quotes in `text` compare equal to ASCII apostrophes.
    pub fn matches(&self, current: u32, text: &str) -> bool {
        if current != self.after {
            return false;
        }

        let text = text.replace(['\u{2018}', '\u{2019}'], "'");
        self.phrases.iter().any(|phrase| text.contains(phrase.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookProfile {
    pub max_section: u32,
    pub start_markers: Vec<String>,
    pub victory_phrase: String,
    pub require_centered_headers: bool,
    pub rescue: Option<BoundaryRescue>,
}

impl Default for BookProfile {
    fn default() -> Self {
        Self {
            max_section: DEFAULT_MAX_SECTION,
            start_markers: DEFAULT_START_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
            victory_phrase: DEFAULT_VICTORY_PHRASE.to_string(),
            require_centered_headers: false,
            rescue: Some(BoundaryRescue {
                after: 49,
                header: 50,
                phrases: vec!["'Come now,'".to_string(), "lost the wager".to_string()],
            }),
        }
    }
}

impl BookProfile {
    pub fn from_args(args: &IngestArgs) -> Self {
        let mut profile = Self {
            max_section: args.max_section,
            require_centered_headers: args.require_centered_headers,
            ..Self::default()
        };

        if !args.start_markers.is_empty() {
            profile.start_markers = args.start_markers.clone();
        }
        if let Some(phrase) = &args.victory_phrase {
            profile.victory_phrase = phrase.clone();
        }

        profile
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDraft {
    pub number: u32,
    /// Page the header line was found on.
    pub page: u32,
    pub content: String,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    pub introduction: String,
    pub drafts: Vec<SectionDraft>,
    pub rescued: Vec<u32>,
    pub unassigned_lines: usize,
    pub start_marker_found: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledBook {
    pub book: Book,
    pub gap_filled: Vec<u32>,
}
