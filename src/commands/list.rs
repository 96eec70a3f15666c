use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ListArgs;
use crate::storage::{StorageLayout, list_titles};

pub fn run(args: ListArgs) -> Result<()> {
    let layout = StorageLayout::from_args(&args.storage)?;
    let titles = list_titles(&layout)?;

    info!(processed_dir = %layout.processed_dir().display(), books = titles.len(), "listed books");

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &titles)
            .context("failed to serialize book list json output")?;
        writeln!(output)?;
    } else {
        for title in &titles {
            writeln!(output, "{title}")?;
        }
    }
    output.flush()?;

    Ok(())
}
