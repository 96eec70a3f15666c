use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::SectionArgs;
use crate::model::Section;
use crate::storage::{StorageLayout, find_section};

pub fn run(args: SectionArgs) -> Result<()> {
    let layout = StorageLayout::from_args(&args.storage)?;
    let section = find_section(&layout, &args.title, args.number)?;

    info!(title = %args.title, section = section.section_number, "loaded section");

    if args.json {
        write_json_section(&section)
    } else {
        write_text_section(&section)
    }
}

fn write_json_section(section: &Section) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, section)
        .context("failed to serialize section json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_section(section: &Section) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Section {}", section.section_number)?;
    if let Some(image_path) = &section.image_path {
        writeln!(output, "Image: {image_path}")?;
    }
    writeln!(output)?;
    writeln!(output, "{}", section.content)?;

    if !section.choices.is_empty() {
        writeln!(output)?;
        writeln!(output, "Choices:")?;
        for choice in &section.choices {
            let marker = if choice.is_dice_roll { " (dice)" } else { "" };
            writeln!(
                output,
                "\t-> {}\t{}{}",
                choice.target_section_number, choice.description, marker
            )?;
        }
    }

    output.flush()?;
    Ok(())
}
