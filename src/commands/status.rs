use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::IngestRunManifest;
use crate::storage::{StorageLayout, list_titles};

pub fn run(args: StatusArgs) -> Result<()> {
    let layout = StorageLayout::from_args(&args.storage)?;

    info!(
        upload_root = %layout.upload_root().display(),
        image_root = %layout.image_root().display(),
        "status requested"
    );

    let titles = list_titles(&layout)?;
    if titles.is_empty() {
        warn!(path = %layout.processed_dir().display(), "no processed books");
    }
    for title in &titles {
        let images_present = layout
            .image_dir(title)
            .map(|image_dir| image_dir.is_dir())
            .unwrap_or(false);
        info!(
            title = %title,
            images_present,
            "processed book"
        );
    }

    match latest_run_manifest(&layout.manifest_dir())? {
        Some((path, manifest)) => {
            info!(
                path = %path.display(),
                run_id = %manifest.run_id,
                title = %manifest.title,
                status = %manifest.status,
                updated_at = %manifest.updated_at,
                sections = manifest.counts.sections_total,
                gap_filled = manifest.counts.sections_gap_filled,
                images_saved = manifest.counts.images_saved,
                images_skipped = manifest.counts.images_skipped,
                warnings = manifest.warnings.len(),
                "latest ingest run"
            );
        }
        None => {
            warn!(path = %layout.manifest_dir().display(), "no ingest run manifests");
        }
    }

    Ok(())
}

/// Most recent manifest by `updated_at`; unreadable files are skipped.
fn latest_run_manifest(manifest_dir: &Path) -> Result<Option<(PathBuf, IngestRunManifest)>> {
    if !manifest_dir.is_dir() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut latest: Option<(PathBuf, IngestRunManifest)> = None;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let path = entry.path();
        let is_run_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("ingest_run_") && name.ends_with(".json"))
            .unwrap_or(false);
        if !is_run_manifest {
            continue;
        }

        let parsed = fs::read(&path)
            .ok()
            .and_then(|raw| serde_json::from_slice::<IngestRunManifest>(&raw).ok());
        let Some(manifest) = parsed else {
            warn!(path = %path.display(), "skipping unreadable ingest run manifest");
            continue;
        };

        let newer = latest
            .as_ref()
            .map(|(_, current)| manifest.updated_at > current.updated_at)
            .unwrap_or(true);
        if newer {
            latest = Some((path, manifest));
        }
    }

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IngestCounts, IngestPaths, SourceEntry, ToolVersions};
    use crate::util::write_json_pretty;

    fn manifest(title: &str, updated_at: &str) -> IngestRunManifest {
        IngestRunManifest {
            manifest_version: 1,
            run_id: format!("run-{title}"),
            title: title.to_string(),
            status: "completed".to_string(),
            started_at: updated_at.to_string(),
            updated_at: updated_at.to_string(),
            command: "gamebook ingest".to_string(),
            tool_versions: ToolVersions {
                pdftotext: None,
                pdfimages: None,
            },
            paths: IngestPaths {
                source_path: String::new(),
                book_json_path: String::new(),
                image_dir: String::new(),
            },
            source: SourceEntry {
                filename: format!("{title}.pdf"),
                sha256: String::new(),
            },
            counts: IngestCounts::default(),
            gap_filled_sections: Vec::new(),
            warnings: Vec::new(),
            notes: Vec::new(),
        }
    }

    #[test]
    fn latest_run_manifest_prefers_most_recent_update() {
        let dir = tempfile::tempdir().unwrap();
        write_json_pretty(
            &dir.path().join("ingest_run_a_1.json"),
            &manifest("Older", "2026-01-01T00:00:00Z"),
        )
        .unwrap();
        write_json_pretty(
            &dir.path().join("ingest_run_b_2.json"),
            &manifest("Newer", "2026-03-01T00:00:00Z"),
        )
        .unwrap();
        fs::write(dir.path().join("ingest_run_broken.json"), "{").unwrap();

        let (_, latest) = latest_run_manifest(dir.path()).unwrap().unwrap();

        assert_eq!(latest.title, "Newer");
    }

    #[test]
    fn latest_run_manifest_handles_missing_directory() {
        let dir = tempfile::tempdir().unwrap();

        assert!(
            latest_run_manifest(&dir.path().join("absent"))
                .unwrap()
                .is_none()
        );
    }
}
