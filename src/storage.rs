use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

use crate::cli::StorageArgs;
use crate::model::{BOOK_JSON_KEYS, Book, Section};
use crate::util::{remove_dir_if_exists, remove_file_if_exists, write_json_pretty};

pub const PROCESSED_DIR_NAME: &str = "ProcessedBooks";
pub const MANIFEST_DIR_NAME: &str = "manifests";
pub const ASSET_URL_ROOT: &str = "/assets/game-art";

/// Filesystem locations shared by ingestion and the read-side commands.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    upload_root: PathBuf,
    image_root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfSource {
    pub path: PathBuf,
    pub file_name: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub json_removed: bool,
    pub images_removed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
    Book { title: String },
    Section { title: String, number: u32 },
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFound::Book { title } => {
                write!(f, "book '{title}' not found; ingest it first")
            }
            NotFound::Section { title, number } => {
                write!(f, "section {number} not found in '{title}'")
            }
        }
    }
}

impl std::error::Error for NotFound {}

impl StorageLayout {
    pub fn new(upload_root: impl Into<PathBuf>, image_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
            image_root: image_root.into(),
        }
    }

    pub fn from_args(args: &StorageArgs) -> Result<Self> {
        let upload_root = std::path::absolute(&args.upload_root).with_context(|| {
            format!("failed to resolve upload root {}", args.upload_root.display())
        })?;
        let image_root = std::path::absolute(&args.image_root).with_context(|| {
            format!("failed to resolve image root {}", args.image_root.display())
        })?;

        Ok(Self::new(upload_root, image_root))
    }

    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    pub fn image_root(&self) -> &Path {
        &self.image_root
    }

    pub fn resolve_pdf(&self, name: &str) -> PdfSource {
        let name = name.trim();
        let file_name = if name.to_ascii_lowercase().ends_with(".pdf") {
            name.to_string()
        } else {
            format!("{name}.pdf")
        };

        let path = self.upload_root.join(&file_name);
        let title = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| name.to_string());

        PdfSource {
            path,
            file_name,
            title,
        }
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.upload_root.join(PROCESSED_DIR_NAME)
    }

    pub fn manifest_dir(&self) -> PathBuf {
        self.processed_dir().join(MANIFEST_DIR_NAME)
    }

    pub fn book_json_path(&self, title: &str) -> Result<PathBuf> {
        let file_name = format!("{}.json", single_component(title)?);
        Ok(self.processed_dir().join(single_component(&file_name)?))
    }

    pub fn image_dir(&self, title: &str) -> Result<PathBuf> {
        let slug = slug_for(single_component(title)?);
        Ok(self.image_root.join(single_component(&slug)?))
    }
}

/// Titles become file and directory names directly under a storage root, so
/// each must be exactly one normal path component.
fn single_component(name: &str) -> Result<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(name),
        _ => bail!("invalid book title {name:?}: must be a single file name"),
    }
}

pub fn slug_for(title: &str) -> String {
    title.replace(' ', "_").to_lowercase()
}

pub fn image_file_name(page: u32, index: u32) -> String {
    format!("p{page}_i{index}.png")
}

pub fn asset_url(slug: &str, page: u32, index: u32) -> String {
    format!("{ASSET_URL_ROOT}/{slug}/{}", image_file_name(page, index))
}

/// Overwrites any previous JSON for the same title.
pub fn save_book(layout: &StorageLayout, book: &Book) -> Result<PathBuf> {
    let path = layout.book_json_path(&book.title)?;
    write_json_pretty(&path, book)?;
    Ok(path)
}

pub fn load_book(layout: &StorageLayout, title: &str) -> Result<Book> {
    let path = layout.book_json_path(title)?;
    if !path.is_file() {
        return Err(NotFound::Book {
            title: title.to_string(),
        }
        .into());
    }

    let raw = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let book = serde_json::from_value(canonicalize_keys(value))
        .with_context(|| format!("failed to load book data from {}", path.display()))?;

    Ok(book)
}

pub fn find_section(layout: &StorageLayout, title: &str, number: u32) -> Result<Section> {
    let book = load_book(layout, title)?;

    book.sections
        .into_iter()
        .find(|section| section.section_number == number)
        .ok_or_else(|| {
            NotFound::Section {
                title: title.to_string(),
                number,
            }
            .into()
        })
}

pub fn list_titles(layout: &StorageLayout) -> Result<Vec<String>> {
    let processed_dir = layout.processed_dir();
    if !processed_dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(&processed_dir)
        .with_context(|| format!("failed to read {}", processed_dir.display()))?;

    let mut titles = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", processed_dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if !is_json {
            continue;
        }

        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            titles.push(stem.to_string());
        }
    }

    titles.sort();
    Ok(titles)
}

pub fn remove_book(layout: &StorageLayout, title: &str) -> Result<CleanupReport> {
    let json_path = layout.book_json_path(title)?;
    let image_dir = layout.image_dir(title)?;
    let json_removed = remove_file_if_exists(&json_path)?;
    let images_removed = remove_dir_if_exists(&image_dir)?;

    Ok(CleanupReport {
        json_removed,
        images_removed,
    })
}

/// Rewrites object keys that match a known book field case-insensitively to
/// their canonical spelling. Unknown keys pass through untouched.
fn canonicalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut canonical = Map::with_capacity(map.len());
            for (key, inner) in map {
                let key = BOOK_JSON_KEYS
                    .iter()
                    .find(|known| known.eq_ignore_ascii_case(&key))
                    .map(|known| known.to_string())
                    .unwrap_or(key);
                canonical.insert(key, canonicalize_keys(inner));
            }
            Value::Object(canonical)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Choice;

    fn layout_in(root: &Path) -> StorageLayout {
        StorageLayout::new(root.join("uploads"), root.join("art"))
    }

    fn sample_book() -> Book {
        Book {
            title: "Seas of Blood".to_string(),
            author: Some("Andrew Chapman".to_string()),
            introduction: "You are a pirate captain.".to_string(),
            adventure_sheet_path: None,
            map_path: Some("/assets/game-art/seas_of_blood/p4_i0.png".to_string()),
            sections: vec![
                Section {
                    section_number: 1,
                    content: "If you wish to attack, turn to 2.".to_string(),
                    image_path: None,
                    choices: vec![Choice {
                        target_section_number: 2,
                        description: "Turn to 2".to_string(),
                        is_dice_roll: false,
                    }],
                },
                Section {
                    section_number: 2,
                    content: "You have won.".to_string(),
                    image_path: None,
                    choices: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn resolve_pdf_appends_extension_and_derives_title() {
        let layout = StorageLayout::new("/srv/uploads", "/srv/art");

        let source = layout.resolve_pdf("Seas of Blood");
        assert_eq!(source.file_name, "Seas of Blood.pdf");
        assert_eq!(source.title, "Seas of Blood");
        assert_eq!(source.path, PathBuf::from("/srv/uploads/Seas of Blood.pdf"));

        let upper = layout.resolve_pdf("Seas of Blood.PDF");
        assert_eq!(upper.file_name, "Seas of Blood.PDF");
        assert_eq!(upper.title, "Seas of Blood");
    }

    #[test]
    fn slug_and_asset_url_follow_title() {
        assert_eq!(slug_for("Seas of Blood"), "seas_of_blood");
        assert_eq!(
            asset_url("seas_of_blood", 12, 0),
            "/assets/game-art/seas_of_blood/p12_i0.png"
        );

        let layout = StorageLayout::new("/srv/uploads", "/srv/art");
        assert_eq!(
            layout.image_dir("Seas of Blood").unwrap(),
            PathBuf::from("/srv/art/seas_of_blood")
        );
        assert_eq!(
            layout.book_json_path("Seas of Blood").unwrap(),
            PathBuf::from("/srv/uploads/ProcessedBooks/Seas of Blood.json")
        );
    }

    #[test]
    fn saved_book_uses_pascal_case_fields() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout_in(dir.path());

        let path = save_book(&layout, &sample_book()).unwrap();
        let raw = fs::read_to_string(path).unwrap();

        assert!(raw.contains("\"Title\": \"Seas of Blood\""));
        assert!(raw.contains("\"AdventureSheetPath\": null"));
        assert!(raw.contains("\"TargetSectionNumber\": 2"));
        assert!(raw.contains("\"IsDiceRoll\": false"));
    }

    #[test]
    fn load_book_accepts_keys_in_any_case() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout_in(dir.path());
        let path = layout.book_json_path("Lowercase").unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"title":"Lowercase","SECTIONS":[{"sectionnumber":7,"content":"Turn to 8.",
                "choices":[{"targetSectionNumber":8,"description":"Turn to 8","isdiceroll":true}]}]}"#,
        )
        .unwrap();

        let book = load_book(&layout, "Lowercase").unwrap();
        assert_eq!(book.title, "Lowercase");
        assert_eq!(book.sections.len(), 1);
        assert_eq!(book.sections[0].section_number, 7);
        assert_eq!(book.sections[0].choices[0].target_section_number, 8);
        assert!(book.sections[0].choices[0].is_dice_roll);
        assert_eq!(book.introduction, "");
    }

    #[test]
    fn lookups_report_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout_in(dir.path());

        let missing_book = find_section(&layout, "Nothing", 1).unwrap_err();
        assert_eq!(
            missing_book.downcast_ref::<NotFound>(),
            Some(&NotFound::Book {
                title: "Nothing".to_string()
            })
        );

        save_book(&layout, &sample_book()).unwrap();
        let section = find_section(&layout, "Seas of Blood", 2).unwrap();
        assert_eq!(section.content, "You have won.");

        let missing_section = find_section(&layout, "Seas of Blood", 3).unwrap_err();
        assert!(matches!(
            missing_section.downcast_ref::<NotFound>(),
            Some(NotFound::Section { number: 3, .. })
        ));
    }

    #[test]
    fn list_titles_ignores_manifests_and_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout_in(dir.path());
        assert!(list_titles(&layout).unwrap().is_empty());

        save_book(&layout, &sample_book()).unwrap();
        fs::create_dir_all(layout.manifest_dir()).unwrap();
        fs::write(layout.manifest_dir().join("ingest_run_x.json"), "{}").unwrap();
        fs::write(layout.processed_dir().join("notes.txt"), "x").unwrap();

        assert_eq!(list_titles(&layout).unwrap(), vec!["Seas of Blood".to_string()]);
    }

    #[test]
    fn remove_book_deletes_json_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout_in(dir.path());
        save_book(&layout, &sample_book()).unwrap();
        let image_dir = layout.image_dir("Seas of Blood").unwrap();
        fs::create_dir_all(&image_dir).unwrap();
        fs::write(image_dir.join("p1_i0.png"), b"png").unwrap();

        let report = remove_book(&layout, "Seas of Blood").unwrap();
        assert!(report.json_removed);
        assert!(report.images_removed);
        assert!(!image_dir.exists());

        let again = remove_book(&layout, "Seas of Blood").unwrap();
        assert_eq!(again, CleanupReport::default());
    }

    #[test]
    fn titles_that_escape_storage_roots_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout_in(dir.path());
        let other_images = layout.image_root().join("other_book");
        fs::create_dir_all(&other_images).unwrap();
        fs::write(other_images.join("p1_i0.png"), b"png").unwrap();
        fs::create_dir_all(layout.upload_root()).unwrap();
        let uploaded = layout.upload_root().join("keep.pdf");
        fs::write(&uploaded, b"%PDF").unwrap();

        for title in ["", "..", ".", "../uploads", "a/b", "a\\b", "/etc"] {
            assert!(remove_book(&layout, title).is_err(), "title {title:?}");
            assert!(load_book(&layout, title).is_err(), "title {title:?}");
            assert!(layout.book_json_path(title).is_err(), "title {title:?}");
            assert!(layout.image_dir(title).is_err(), "title {title:?}");
        }

        assert!(other_images.join("p1_i0.png").is_file());
        assert!(uploaded.is_file());
    }
}
