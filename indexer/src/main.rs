use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use engine::persist::{save_index, IndexPaths, MetaFile, FORMAT_VERSION};
use engine::tokenizer::tokenize;
use engine::IndexBuilder;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a positional TF-IDF index from text documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a text file or a directory of .txt files
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build_index(&input, &output),
    }
}

fn build_index(input: &str, output: &str) -> Result<()> {
    let input_path = Path::new(input);
    let out_paths = IndexPaths::new(output);

    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if ext == "txt" {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        bail!("input path does not exist: {input}");
    }

    let mut builder = IndexBuilder::new();
    for file in &files {
        ingest_file(file, &mut builder)?;
    }

    // Sealing rejects any document id without a numeric ordinal.
    let index = builder.seal()?;
    tracing::info!(
        num_docs = index.num_docs(),
        num_terms = index.num_terms(),
        "ingested documents"
    );

    let meta = MetaFile {
        num_docs: index.num_docs() as u32,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: FORMAT_VERSION,
    };
    save_index(&out_paths, &index, &meta)?;

    tracing::info!(output, "index build complete");
    Ok(())
}

/// One file is one document; the file stem is its id and token positions
/// run 1-based across the whole file.
fn ingest_file(file: &Path, builder: &mut IndexBuilder) -> Result<()> {
    let id = file
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("unreadable file name: {}", file.display()))?;
    let body =
        fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;

    let tokens = tokenize(&body);
    if tokens.is_empty() {
        tracing::warn!(file = %file.display(), "no tokens, document skipped");
        return Ok(());
    }
    for (term, pos) in tokens {
        builder.add_occurrence(&term, id, pos);
    }
    Ok(())
}
