use super::*;

#[derive(Debug)]
pub struct ParseOutcome {
    pub book: Book,
    pub book_json_path: PathBuf,
    pub image_dir: PathBuf,
    pub counts: IngestCounts,
    pub gap_filled: Vec<u32>,
    pub warnings: Vec<String>,
}

/// Turns one uploaded gamebook PDF into a persisted `Book`.
#[derive(Debug)]
pub struct BookParser {
    layout: StorageLayout,
    profile: BookProfile,
    choices: ChoiceExtractor,
    author_override: Option<String>,
}

impl BookParser {
    pub fn new(
        layout: StorageLayout,
        profile: BookProfile,
        author_override: Option<String>,
    ) -> Result<Self> {
        let choices = ChoiceExtractor::new(profile.max_section)?;
        Ok(Self {
            layout,
            profile,
            choices,
            author_override,
        })
    }

    /// Reads `{upload_root}/{name}.pdf`, writes its images and the book JSON,
    /// and returns the assembled book.
    pub fn parse(&self, name: &str) -> Result<ParseOutcome> {
        let source = self.layout.resolve_pdf(name);
        if !source.path.is_file() {
            bail!("source PDF not found: {}", source.path.display());
        }

        info!(path = %source.path.display(), title = %source.title, "reading source PDF");
        let extracted = extract_source(&source.path)?;
        self.parse_extracted(&source.title, extracted)
    }

    pub fn parse_extracted(&self, title: &str, extracted: ExtractedSource) -> Result<ParseOutcome> {
        let ExtractedSource {
            title: pdf_title,
            author: pdf_author,
            pages,
            warnings: mut run_warnings,
        } = extracted;

        let image_dir = self.layout.image_dir(title)?;
        ensure_directory(&image_dir)?;
        let saved = save_page_images(&pages, &image_dir);
        run_warnings.extend(saved.warnings.iter().cloned());

        let lines = tokenize_pages(&pages);
        info!(
            pdf_title = %pdf_title.as_deref().unwrap_or_default(),
            pages = pages.len(),
            lines = lines.len(),
            images_saved = saved.files.len(),
            images_skipped = saved.skipped,
            "tokenized source pages"
        );

        let segmentation = SectionSegmenter::new(&self.profile, &self.choices).segment(&lines);
        if !segmentation.start_marker_found {
            warn!(title = %title, "start-of-story marker not found; scanning from the first line");
            run_warnings.push(
                "start-of-story marker not found; introduction left empty".to_string(),
            );
        }

        let mut counts = IngestCounts {
            page_count: pages.len(),
            line_count: lines.len(),
            sections_extracted: segmentation.drafts.len(),
            rescued_boundaries: segmentation.rescued.len(),
            images_saved: saved.files.len(),
            images_skipped: saved.skipped,
            unassigned_lines: segmentation.unassigned_lines,
            ..IngestCounts::default()
        };

        let metadata = BookMetadata {
            title: title.to_string(),
            author: self.author_override.clone().or(pdf_author),
            slug: slug_for(title),
        };
        let AssembledBook { book, gap_filled } =
            assemble_book(metadata, segmentation, &saved, self.profile.max_section);

        if !gap_filled.is_empty() {
            warn!(
                count = gap_filled.len(),
                first = gap_filled[0],
                "filled missing sections with placeholders"
            );
        }

        counts.sections_total = book.sections.len();
        counts.sections_gap_filled = gap_filled.len();
        counts.choices_total = book
            .sections
            .iter()
            .map(|section| section.choices.len())
            .sum();
        counts.dice_choices = book
            .sections
            .iter()
            .flat_map(|section| &section.choices)
            .filter(|choice| choice.is_dice_roll)
            .count();

        let book_json_path = save_book(&self.layout, &book)?;
        info!(path = %book_json_path.display(), sections = book.sections.len(), "wrote book json");

        Ok(ParseOutcome {
            book,
            book_json_path,
            image_dir,
            counts,
            gap_filled,
            warnings: run_warnings,
        })
    }
}

pub fn run(args: IngestArgs) -> Result<()> {
    if args.name.trim().is_empty() {
        bail!("file name is required");
    }

    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let layout = StorageLayout::from_args(&args.storage)?;
    let source = layout.resolve_pdf(&args.name);
    info!(upload_root = %layout.upload_root().display(), run_id = %run_id, name = %args.name, "starting ingest");

    let parser = BookParser::new(
        layout.clone(),
        BookProfile::from_args(&args),
        args.author.clone(),
    )?;
    let outcome = parser.parse(&args.name)?;
    let sha256 = sha256_file(&source.path)?;

    let manifest_path = args.ingest_manifest_path.clone().unwrap_or_else(|| {
        layout.manifest_dir().join(format!(
            "ingest_run_{}_{}.json",
            slug_for(&source.title),
            utc_compact_string(started_ts)
        ))
    });

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        title: outcome.book.title.clone(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_ingest_command(&args),
        tool_versions: collect_tool_versions(),
        paths: IngestPaths {
            source_path: source.path.display().to_string(),
            book_json_path: outcome.book_json_path.display().to_string(),
            image_dir: outcome.image_dir.display().to_string(),
        },
        source: SourceEntry {
            filename: source.file_name.clone(),
            sha256,
        },
        counts: outcome.counts.clone(),
        gap_filled_sections: outcome.gap_filled.clone(),
        warnings: outcome.warnings.clone(),
        notes: vec![
            "Sections segmented from pdftotext word boxes using numeric header heuristics."
                .to_string(),
            "Missing section numbers are filled with placeholder sections.".to_string(),
        ],
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote ingest run manifest");
    info!(
        title = %outcome.book.title,
        sections = outcome.book.sections.len(),
        gap_filled = outcome.gap_filled.len(),
        "ingestion successful"
    );

    Ok(())
}

pub(super) fn render_ingest_command(args: &IngestArgs) -> String {
    let mut command = vec![
        "gamebook".to_string(),
        "ingest".to_string(),
        "--upload-root".to_string(),
        args.storage.upload_root.display().to_string(),
        "--image-root".to_string(),
        args.storage.image_root.display().to_string(),
        "--name".to_string(),
        args.name.clone(),
        "--max-section".to_string(),
        args.max_section.to_string(),
    ];

    if let Some(author) = &args.author {
        command.push("--author".to_string());
        command.push(author.clone());
    }
    for marker in &args.start_markers {
        command.push("--start-marker".to_string());
        command.push(marker.clone());
    }
    if let Some(phrase) = &args.victory_phrase {
        command.push("--victory-phrase".to_string());
        command.push(phrase.clone());
    }
    if args.require_centered_headers {
        command.push("--require-centered-headers".to_string());
    }
    if let Some(path) = &args.ingest_manifest_path {
        command.push("--ingest-manifest-path".to_string());
        command.push(path.display().to_string());
    }

    command.join(" ")
}
