use super::*;

/// Removes its directory when dropped, whichever way extraction exits.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn create(label: &str) -> Result<Self> {
        let safe_label = label
            .chars()
            .map(|character| {
                if character.is_ascii_alphanumeric() {
                    character
                } else {
                    '_'
                }
            })
            .collect::<String>();
        let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let path = std::env::temp_dir().join(format!(
            "gamebook_{}_{}_{}",
            safe_label,
            std::process::id(),
            stamp
        ));
        ensure_directory(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

pub fn extract_source(pdf_path: &Path) -> Result<ExtractedSource> {
    if !command_available("pdftotext") {
        bail!("pdftotext is required to read {}", pdf_path.display());
    }

    let bbox = run_pdftotext_bbox(pdf_path)?;
    let mut source = BboxParser::new()?
        .parse(&bbox)
        .with_context(|| format!("failed to read text layout of {}", pdf_path.display()))?;

    if source.pages.is_empty() {
        bail!("{} contains no readable pages", pdf_path.display());
    }

    if !command_available("pdfimages") {
        source
            .warnings
            .push("pdfimages is unavailable; continuing without images".to_string());
        return Ok(source);
    }

    match extract_page_images(pdf_path) {
        Ok(extracted) => {
            source.warnings.extend(extracted.warnings);
            for page in &mut source.pages {
                if let Some(images) = extracted.by_page.get(&page.number) {
                    page.images = images.clone();
                }
            }
        }
        Err(error) => {
            warn!(path = %pdf_path.display(), error = %error, "image extraction failed");
            source.warnings.push(format!(
                "image extraction failed for {}: {}",
                pdf_path.display(),
                error
            ));
        }
    }

    Ok(source)
}

fn run_pdftotext_bbox(pdf_path: &Path) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-bbox")
        .arg("-enc")
        .arg("UTF-8")
        .arg(pdf_path)
        .arg("-")
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).replace('\u{0000}', ""))
}

/// Reads the XHTML written by `pdftotext -bbox`, one element per line.
#[derive(Debug)]
pub struct BboxParser {
    page: Regex,
    word: Regex,
    title: Regex,
    meta: Regex,
}

impl BboxParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            page: Regex::new(r#"<page\s+width="([0-9.]+)"\s+height="([0-9.]+)"\s*>"#)
                .context("failed to compile bbox page regex")?,
            word: Regex::new(
                r#"<word\s+xMin="(-?[0-9.]+)"\s+yMin="(-?[0-9.]+)"\s+xMax="(-?[0-9.]+)"\s+yMax="(-?[0-9.]+)"\s*>(.*?)</word>"#,
            )
            .context("failed to compile bbox word regex")?,
            title: Regex::new(r"<title>(.*?)</title>").context("failed to compile title regex")?,
            meta: Regex::new(r#"<meta\s+name="([^"]+)"\s+content="([^"]*)"\s*/?>"#)
                .context("failed to compile meta regex")?,
        })
    }

    pub fn parse(&self, document: &str) -> Result<ExtractedSource> {
        let mut source = ExtractedSource::default();

        for raw_line in document.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(captures) = self.word.captures(line) {
                let Some(page) = source.pages.last_mut() else {
                    bail!("word element appears before any page element");
                };
                let height = page.height;
                let x_min = parse_coordinate(&captures[1])?;
                let y_min = parse_coordinate(&captures[2])?;
                let x_max = parse_coordinate(&captures[3])?;
                let y_max = parse_coordinate(&captures[4])?;

                page.fragments.push(TextFragment {
                    text: unescape_entities(&captures[5]),
                    left: x_min,
                    right: x_max,
                    top: height - y_min,
                    bottom: height - y_max,
                });
                continue;
            }

            if let Some(captures) = self.page.captures(line) {
                let number = source.pages.len() as u32 + 1;
                source.pages.push(PdfPage {
                    number,
                    width: parse_coordinate(&captures[1])?,
                    height: parse_coordinate(&captures[2])?,
                    fragments: Vec::new(),
                    images: Vec::new(),
                });
                continue;
            }

            if let Some(captures) = self.title.captures(line) {
                source.title = non_empty(unescape_entities(&captures[1]));
                continue;
            }

            if let Some(captures) = self.meta.captures(line) {
                if captures[1].eq_ignore_ascii_case("author") {
                    source.author = non_empty(unescape_entities(&captures[2]));
                }
            }
        }

        Ok(source)
    }
}

fn parse_coordinate(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .with_context(|| format!("invalid coordinate in bbox output: {raw}"))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Decodes the XML entities pdftotext emits, including numeric references
/// such as `&#8217;`. Unknown entities are kept verbatim.
pub fn unescape_entities(raw: &str) -> String {
    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        let tail = &rest[start..];
        let entity = tail
            .find(';')
            .and_then(|end| decode_entity(&tail[1..end]).map(|ch| (ch, end)));
        match entity {
            Some((ch, end)) => {
                decoded.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                decoded.push('&');
                rest = &tail[1..];
            }
        }
    }

    decoded.push_str(rest);
    decoded
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "amp" => Some('&'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[derive(Debug, Default)]
pub struct ExtractedImages {
    pub by_page: BTreeMap<u32, Vec<EmbeddedImage>>,
    pub warnings: Vec<String>,
}

fn extract_page_images(pdf_path: &Path) -> Result<ExtractedImages> {
    let stem = pdf_path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("pdf");
    let scratch = ScratchDir::create(stem)?;
    let prefix = scratch.path().join("img");

    let output = Command::new("pdfimages")
        .arg("-png")
        .arg("-p")
        .arg(pdf_path)
        .arg(&prefix)
        .output()
        .with_context(|| format!("failed to execute pdfimages for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdfimages returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    collect_image_files(scratch.path())
}

/// Groups `img-PPP-NNN.png` files by page and numbers them per page in
/// extraction order. An unreadable file keeps its index but is left out.
pub fn collect_image_files(dir: &Path) -> Result<ExtractedImages> {
    let name_pattern =
        Regex::new(r"^img-(\d+)-(\d+)\.png$").context("failed to compile image name regex")?;

    let mut found = Vec::<(u32, u32, PathBuf)>::new();
    let entries = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(captures) = name_pattern.captures(name) else {
            continue;
        };
        let (Ok(page), Ok(sequence)) = (captures[1].parse::<u32>(), captures[2].parse::<u32>())
        else {
            continue;
        };
        found.push((page, sequence, path));
    }
    found.sort();

    let mut extracted = ExtractedImages::default();
    let mut next_index = HashMap::<u32, u32>::new();
    for (page, _, path) in found {
        let slot = next_index.entry(page).or_insert(0);
        let index = *slot;
        *slot += 1;

        match fs::read(&path) {
            Ok(bytes) => extracted
                .by_page
                .entry(page)
                .or_default()
                .push(EmbeddedImage { index, bytes }),
            Err(error) => extracted.warnings.push(format!(
                "failed to read extracted image {}: {}",
                path.display(),
                error
            )),
        }
    }

    Ok(extracted)
}

pub fn command_available(program: &str) -> bool {
    Command::new(program).arg("-v").output().is_ok()
}

pub fn collect_tool_versions() -> ToolVersions {
    ToolVersions {
        pdftotext: command_version_optional("pdftotext", &["-v"]),
        pdfimages: command_version_optional("pdfimages", &["-v"]),
    }
}

fn command_version_optional(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}
