use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::cli::IngestArgs;
use crate::model::{
    Book, Choice, IngestCounts, IngestPaths, IngestRunManifest, Section, SourceEntry,
    ToolVersions,
};
use crate::storage::{StorageLayout, asset_url, image_file_name, save_book, slug_for};
use crate::util::{
    ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty,
};

pub const DEFAULT_MAX_SECTION: u32 = 400;
pub const DEFAULT_START_MARKERS: &[&str] = &["TURN OVER", "Your journey is about to begin"];
pub const DEFAULT_VICTORY_PHRASE: &str = "you have won";

mod assemble;
mod choices;
mod image_assets;
mod layout_lines;
mod page_extract;
mod run;
mod segmenter;
mod types;

pub use run::run;

use assemble::*;
use choices::*;
use image_assets::*;
use layout_lines::*;
use page_extract::*;
use segmenter::*;
use types::*;
