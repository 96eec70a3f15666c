use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Book {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub introduction: String,
    #[serde(default)]
    pub adventure_sheet_path: Option<String>,
    #[serde(default)]
    pub map_path: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Section {
    pub section_number: u32,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Choice {
    pub target_section_number: u32,
    pub description: String,
    #[serde(default)]
    pub is_dice_roll: bool,
}

/// Every key the book JSON may carry, in its canonical spelling.
pub const BOOK_JSON_KEYS: &[&str] = &[
    "Title",
    "Author",
    "Introduction",
    "AdventureSheetPath",
    "MapPath",
    "Sections",
    "SectionNumber",
    "Content",
    "ImagePath",
    "Choices",
    "TargetSectionNumber",
    "Description",
    "IsDiceRoll",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub filename: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolVersions {
    pub pdftotext: Option<String>,
    pub pdfimages: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestPaths {
    pub source_path: String,
    pub book_json_path: String,
    pub image_dir: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestCounts {
    pub page_count: usize,
    pub line_count: usize,
    pub sections_total: usize,
    pub sections_extracted: usize,
    pub sections_gap_filled: usize,
    pub rescued_boundaries: usize,
    pub choices_total: usize,
    pub dice_choices: usize,
    pub images_saved: usize,
    pub images_skipped: usize,
    pub unassigned_lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub title: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub tool_versions: ToolVersions,
    pub paths: IngestPaths,
    pub source: SourceEntry,
    pub counts: IngestCounts,
    pub gap_filled_sections: Vec<u32>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}
