use anyhow::Result;
use tracing::info;

use crate::cli::CleanupArgs;
use crate::storage::{StorageLayout, remove_book};

pub fn run(args: CleanupArgs) -> Result<()> {
    let layout = StorageLayout::from_args(&args.storage)?;
    let report = remove_book(&layout, &args.title)?;

    info!(
        title = %args.title,
        json_removed = report.json_removed,
        images_removed = report.images_removed,
        "Cleared data and images for {}",
        args.title
    );

    Ok(())
}
