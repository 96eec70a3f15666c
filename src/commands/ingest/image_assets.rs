use super::*;

use image::{GenericImageView, ImageFormat};

pub const MAP_MIN_WIDTH_PX: u32 = 400;
pub const MAP_PAGE_CUTOFF: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Fully decodes a PNG stream. Truncated or corrupt pixel data fails here,
/// not just a bad signature.
pub fn decode_png(bytes: &[u8]) -> Result<ImageSize> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .context("failed to decode PNG image")?;
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        bail!("PNG image has zero dimensions ({width}x{height})");
    }

    Ok(ImageSize { width, height })
}

/// Writes every decodable image as `p{page}_i{index}.png`. A failing image is
/// skipped on its own; the rest of the page is unaffected.
pub fn save_page_images(pages: &[PdfPage], image_dir: &Path) -> SavedImages {
    let mut saved = SavedImages::default();

    for page in pages {
        for image in &page.images {
            let file_name = image_file_name(page.number, image.index);

            let size = match decode_png(&image.bytes) {
                Ok(size) => size,
                Err(error) => {
                    warn!(page = page.number, index = image.index, error = %error, "skipping undecodable image");
                    saved.skipped += 1;
                    saved
                        .warnings
                        .push(format!("skipped {file_name}: {error}"));
                    continue;
                }
            };

            let path = image_dir.join(&file_name);
            if let Err(error) = fs::write(&path, &image.bytes) {
                warn!(path = %path.display(), error = %error, "failed to write image");
                saved.skipped += 1;
                saved
                    .warnings
                    .push(format!("failed to write {}: {}", path.display(), error));
                continue;
            }

            saved.files.insert((page.number, image.index));

            if saved.map.is_none()
                && size.width > MAP_MIN_WIDTH_PX
                && page.number < MAP_PAGE_CUTOFF
            {
                debug!(page = page.number, index = image.index, width = size.width, "selected map image");
                saved.map = Some((page.number, image.index));
            }
        }
    }

    saved
}
