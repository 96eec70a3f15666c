use super::*;

/// A header may skip ahead by at most `HEADER_WINDOW - 1` sections.
pub const HEADER_WINDOW: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSection {
    pub number: u32,
    pub page: u32,
    pub body: Vec<String>,
}

/// Scan position over the line sequence. `current` is 0 until the first
/// header after the start marker has been accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    FrontMatter { introduction: Vec<String> },
    InSection { current: u32, open: Option<OpenSection> },
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRule {
    LoneNumber,
    FusedNumber,
    BoundaryRescue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMatch {
    pub number: u32,
    pub remainder: String,
    pub rule: HeaderRule,
}

#[derive(Debug)]
pub struct SectionSegmenter<'a> {
    profile: &'a BookProfile,
    choices: &'a ChoiceExtractor,
}

impl<'a> SectionSegmenter<'a> {
    pub fn new(profile: &'a BookProfile, choices: &'a ChoiceExtractor) -> Self {
        Self { profile, choices }
    }

    pub fn segment(&self, lines: &[Line]) -> Segmentation {
        let mut output = Segmentation {
            start_marker_found: lines.iter().any(|line| self.is_start_marker(&line.text)),
            ..Segmentation::default()
        };

        let initial = if output.start_marker_found {
            ScanState::FrontMatter {
                introduction: Vec::new(),
            }
        } else {
            ScanState::InSection {
                current: 0,
                open: None,
            }
        };

        let last = lines
            .iter()
            .fold(initial, |state, line| self.step(state, line, &mut output));
        self.finish(last, &mut output);

        output
    }

    /// Advances the scan by one line. Finalized sections are pushed onto
    /// `output.drafts`.
    pub fn step(&self, state: ScanState, line: &Line, output: &mut Segmentation) -> ScanState {
        match state {
            ScanState::FrontMatter { introduction } => {
                self.front_matter_step(introduction, line, output)
            }
            ScanState::InSection { current, open } => {
                self.in_section_step(current, open, line, output)
            }
            ScanState::Finished => ScanState::Finished,
        }
    }

    fn front_matter_step(
        &self,
        mut introduction: Vec<String>,
        line: &Line,
        output: &mut Segmentation,
    ) -> ScanState {
        if self.is_start_marker(&line.text) {
            output.introduction = join_body(&introduction);
            return ScanState::InSection {
                current: 0,
                open: None,
            };
        }

        introduction.push(line.text.clone());
        ScanState::FrontMatter { introduction }
    }

    fn in_section_step(
        &self,
        current: u32,
        open: Option<OpenSection>,
        line: &Line,
        output: &mut Segmentation,
    ) -> ScanState {
        if let Some(header) = self.detect_header(current, line) {
            debug!(section = header.number, page = line.page, rule = ?header.rule, "section header");
            if header.rule == HeaderRule::BoundaryRescue {
                info!(section = header.number, page = line.page, "rescued section boundary");
                output.rescued.push(header.number);
            }

            if let Some(done) = open {
                output.drafts.push(self.finalize(done));
            }

            let ends_book =
                header.number == self.profile.max_section && self.is_victory(&header.remainder);
            let mut body = Vec::new();
            if !header.remainder.is_empty() {
                body.push(header.remainder);
            }
            let section = OpenSection {
                number: header.number,
                page: line.page,
                body,
            };

            if ends_book {
                output.drafts.push(self.finalize(section));
                return ScanState::Finished;
            }

            return ScanState::InSection {
                current: header.number,
                open: Some(section),
            };
        }

        let Some(mut section) = open else {
            output.unassigned_lines += 1;
            return ScanState::InSection {
                current,
                open: None,
            };
        };
        section.body.push(line.text.clone());

        if current == self.profile.max_section && self.is_victory(&line.text) {
            output.drafts.push(self.finalize(section));
            return ScanState::Finished;
        }

        ScanState::InSection {
            current,
            open: Some(section),
        }
    }

    fn finish(&self, state: ScanState, output: &mut Segmentation) {
        match state {
            ScanState::FrontMatter { introduction } => {
                output.introduction = join_body(&introduction);
            }
            ScanState::InSection {
                open: Some(section),
                ..
            } => output.drafts.push(self.finalize(section)),
            ScanState::InSection { open: None, .. } | ScanState::Finished => {}
        }
    }

    fn finalize(&self, section: OpenSection) -> SectionDraft {
        let content = join_body(&section.body);
        let choices = self.choices.extract(&content);

        SectionDraft {
            number: section.number,
            page: section.page,
            content,
            choices,
        }
    }

    /// Header rules in priority order: a lone number, the expected number
    /// fused with body text, then the boundary rescue. Whatever they find must
    /// fall inside the acceptance window.
    pub fn detect_header(&self, current: u32, line: &Line) -> Option<HeaderMatch> {
        let expected = current.checked_add(1)?;
        if expected > self.profile.max_section {
            return None;
        }

        let text = line.text.trim();
        let candidate = self
            .lone_number(text, line.centered)
            .or_else(|| fused_number(text, expected))
            .or_else(|| self.boundary_rescue(current, text));

        candidate.filter(|header| self.within_window(expected, header.number))
    }

    fn lone_number(&self, text: &str, centered: bool) -> Option<HeaderMatch> {
        if self.profile.require_centered_headers && !centered {
            return None;
        }

        let digits = text.trim_end_matches('.');
        if digits.is_empty() || !digits.chars().all(|character| character.is_ascii_digit()) {
            return None;
        }
        let number = digits.parse::<u32>().ok()?;

        Some(HeaderMatch {
            number,
            remainder: strip_header_number(text, number),
            rule: HeaderRule::LoneNumber,
        })
    }

    fn boundary_rescue(&self, current: u32, text: &str) -> Option<HeaderMatch> {
        let rescue = self.profile.rescue.as_ref()?;
        if !rescue.matches(current, text) {
            return None;
        }

        Some(HeaderMatch {
            number: rescue.header,
            remainder: strip_header_number(text, rescue.header),
            rule: HeaderRule::BoundaryRescue,
        })
    }

    fn within_window(&self, expected: u32, number: u32) -> bool {
        number >= expected
            && number < expected.saturating_add(HEADER_WINDOW)
            && number <= self.profile.max_section
    }

    fn is_start_marker(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.profile
            .start_markers
            .iter()
            .any(|marker| !marker.is_empty() && lowered.contains(&marker.to_lowercase()))
    }

    fn is_victory(&self, text: &str) -> bool {
        !self.profile.victory_phrase.is_empty()
            && text
                .to_lowercase()
                .contains(&self.profile.victory_phrase.to_lowercase())
    }
}

fn fused_number(text: &str, expected: u32) -> Option<HeaderMatch> {
    let space = format!("{expected} ");
    let period = format!("{expected}.");
    if !text.starts_with(&space) && !text.starts_with(&period) {
        return None;
    }

    Some(HeaderMatch {
        number: expected,
        remainder: strip_header_number(text, expected),
        rule: HeaderRule::FusedNumber,
    })
}

/// Drops the leading section number (and any `.`/space right after it) from
/// a header line. Text that does not start with the number is returned as is.
pub fn strip_header_number(text: &str, number: u32) -> String {
    let trimmed = text.trim();
    let digits = number.to_string();

    if trimmed == digits || trimmed.strip_suffix('.') == Some(digits.as_str()) {
        return String::new();
    }

    match trimmed.strip_prefix(digits.as_str()) {
        Some(rest) => rest.trim_start_matches(['.', ' ']).to_string(),
        None => text.to_string(),
    }
}

fn join_body(lines: &[String]) -> String {
    lines.join("\n").trim().to_string()
}
