use super::*;

pub const UNREADABLE_SECTION_TEXT: &str =
    "[Section unreadable: this section could not be extracted from the source PDF.]";

#[derive(Debug, Clone)]
pub struct BookMetadata {
    pub title: String,
    pub author: Option<String>,
    pub slug: String,
}

pub fn assemble_book(
    metadata: BookMetadata,
    segmentation: Segmentation,
    images: &SavedImages,
    max_section: u32,
) -> AssembledBook {
    let mut by_number = BTreeMap::<u32, Section>::new();
    for draft in segmentation.drafts {
        let image_path = images
            .contains(draft.page, 0)
            .then(|| asset_url(&metadata.slug, draft.page, 0));

        by_number.entry(draft.number).or_insert(Section {
            section_number: draft.number,
            content: draft.content,
            image_path,
            choices: draft.choices,
        });
    }

    let (sections, gap_filled) = fill_gaps(by_number, max_section);
    let map_path = images
        .map
        .map(|(page, index)| asset_url(&metadata.slug, page, index));

    AssembledBook {
        book: Book {
            title: metadata.title,
            author: metadata.author,
            introduction: segmentation.introduction,
            adventure_sheet_path: None,
            map_path,
            sections,
        },
        gap_filled,
    }
}

/// Reconciles a sparse number-to-section mapping against `1..=max_section`.
/// Returns the sections in ascending order together with the numbers that
/// had to be synthesized.
pub fn fill_gaps(
    mut by_number: BTreeMap<u32, Section>,
    max_section: u32,
) -> (Vec<Section>, Vec<u32>) {
    let mut gap_filled = Vec::new();

    for number in 1..=max_section {
        by_number.entry(number).or_insert_with(|| {
            gap_filled.push(number);
            placeholder_section(number)
        });
    }

    (by_number.into_values().collect(), gap_filled)
}

pub fn placeholder_section(number: u32) -> Section {
    Section {
        section_number: number,
        content: UNREADABLE_SECTION_TEXT.to_string(),
        image_path: None,
        choices: Vec::new(),
    }
}
