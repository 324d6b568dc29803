use crate::index::{IndexBuilder, PositionalIndex};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn postings(&self) -> PathBuf { self.root.join("postings.txt") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Write the postings file: one `term<TAB>doc: p, p; doc: p;` line per
/// vocabulary term, documents in ordinal order within each line.
pub fn save_postings(paths: &IndexPaths, index: &PositionalIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = BufWriter::new(File::create(paths.postings())?);
    for term in index.terms() {
        let mut segments = Vec::new();
        for doc in index.documents() {
            let positions = index.positions(term, doc);
            if positions.is_empty() {
                continue;
            }
            let joined = positions
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            segments.push(format!("{doc}: {joined}"));
        }
        writeln!(f, "{term}\t{};", segments.join("; "))?;
    }
    f.flush()?;
    Ok(())
}

/// Parse a postings file back into a sealed index.
///
/// Parsing is liberal about whitespace and empty segments but rejects lines
/// without the term separator and postings without a position list, naming
/// the offending line.
pub fn load_postings(paths: &IndexPaths) -> Result<PositionalIndex> {
    let f = File::open(paths.postings())?;
    let mut builder = IndexBuilder::new();
    for (number, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (term, rest) = line
            .split_once('\t')
            .with_context(|| format!("postings line {}: missing term separator", number + 1))?;
        let term = term.trim();
        for segment in rest.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (doc, positions) = segment
                .split_once(':')
                .with_context(|| format!("postings line {}: malformed posting {segment:?}", number + 1))?;
            let doc = doc.trim();
            for position in positions.split(',') {
                let position = position.trim();
                if position.is_empty() {
                    continue;
                }
                let position: u32 = position.parse().with_context(|| {
                    format!("postings line {}: bad position {position:?}", number + 1)
                })?;
                builder.add_occurrence(term, doc, position);
            }
        }
    }
    Ok(builder.seal()?)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

pub fn save_index(paths: &IndexPaths, index: &PositionalIndex, meta: &MetaFile) -> Result<()> {
    save_postings(paths, index)?;
    save_meta(paths, meta)?;
    Ok(())
}

/// Everything required to answer queries: the sealed index plus its metadata.
pub fn load_index(paths: &IndexPaths) -> Result<(PositionalIndex, MetaFile)> {
    let index = load_postings(paths)?;
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        bail!(
            "unsupported index version {} (expected {})",
            meta.version,
            FORMAT_VERSION
        );
    }
    tracing::debug!(
        num_docs = index.num_docs(),
        num_terms = index.num_terms(),
        "loaded index"
    );
    Ok((index, meta))
}
