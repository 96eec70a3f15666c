use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "gamebook",
    version,
    about = "Gamebook PDF ingestion and section lookup tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Ingest(IngestArgs),
    Section(SectionArgs),
    List(ListArgs),
    Cleanup(CleanupArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    /// Directory that uploaded gamebook PDFs are resolved against.
    #[arg(long, default_value = "Storage/Uploads")]
    pub upload_root: PathBuf,

    /// Directory that per-title image folders are written under.
    #[arg(long, default_value = "Storage/GameArt")]
    pub image_root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Logical PDF name; `.pdf` is appended when missing.
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long, default_value_t = 400)]
    pub max_section: u32,

    #[arg(long = "start-marker")]
    pub start_markers: Vec<String>,

    #[arg(long)]
    pub victory_phrase: Option<String>,

    #[arg(long, default_value_t = false)]
    pub require_centered_headers: bool,

    #[arg(long)]
    pub ingest_manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SectionArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub number: u32,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CleanupArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    #[arg(long)]
    pub title: String,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub storage: StorageArgs,
}
