use super::*;

/// Fragments whose top edge sits above this fraction of the page height are
/// running headers.
pub const HEADER_BAND_RATIO: f64 = 0.95;
pub const FOOTER_MARGIN_PT: f64 = 45.0;
pub const LINE_BUCKET_PT: f64 = 3.0;
pub const CENTER_TOLERANCE_PT: f64 = 50.0;

pub fn tokenize_pages(pages: &[PdfPage]) -> Vec<Line> {
    pages.iter().flat_map(reconstruct_lines).collect()
}

/// Rebuilds printed lines from word fragments, top of the page first.
pub fn reconstruct_lines(page: &PdfPage) -> Vec<Line> {
    let header_limit = page.height * HEADER_BAND_RATIO;
    let mut buckets = BTreeMap::<i64, Vec<&TextFragment>>::new();

    for fragment in &page.fragments {
        if fragment.text.trim().is_empty() {
            continue;
        }
        if fragment.top >= header_limit || fragment.bottom <= FOOTER_MARGIN_PT {
            continue;
        }

        let bucket = (fragment.bottom / LINE_BUCKET_PT).round() as i64;
        buckets.entry(bucket).or_default().push(fragment);
    }

    buckets
        .into_values()
        .rev()
        .map(|mut fragments| {
            fragments.sort_by(|a, b| a.left.total_cmp(&b.left));

            let text = fragments
                .iter()
                .map(|fragment| fragment.text.trim())
                .collect::<Vec<&str>>()
                .join(" ");
            let left = fragments
                .iter()
                .map(|fragment| fragment.left)
                .fold(f64::INFINITY, f64::min);
            let right = fragments
                .iter()
                .map(|fragment| fragment.right)
                .fold(f64::NEG_INFINITY, f64::max);

            Line {
                text,
                page: page.number,
                centered: is_centered(left, right, page.width),
            }
        })
        .collect()
}

pub fn is_centered(left: f64, right: f64, page_width: f64) -> bool {
    let midpoint = (left + right) / 2.0;
    (midpoint - page_width / 2.0).abs() <= CENTER_TOLERANCE_PT
}
