//! Plain-text snapshots of the posting list, query reports and weight dumps.
//!
//! Index records look like `Term: cat, Document IDs: [d1, d1, d3]`, one per line.
//! Blank lines and `#` comments are ignored; anything else is a format error.

use crate::error::SnapshotError;
use crate::index::PostingList;
use crate::search::ScoredDoc;
use crate::weighting::SparseVector;
use crate::{DocId, Term};
use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use time::format_description::well_known::Rfc3339;

const TERM_PREFIX: &str = "Term: ";
const IDS_SEPARATOR: &str = ", Document IDs: ";

pub fn write_index<W: Write>(out: &mut W, postings: &PostingList, num_docs: usize) -> io::Result<()> {
    let created_at = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
    writeln!(out, "# vecrank index: {} documents, {} terms, created {}", num_docs, postings.len(), created_at)?;
    let mut terms: Vec<&Term> = postings.keys().collect();
    terms.sort();
    for term in terms {
        let ids = &postings[term];
        for id in ids {
            check_doc_id(id)?;
        }
        writeln!(out, "{TERM_PREFIX}{term}{IDS_SEPARATOR}[{}]", ids.join(", "))?;
    }
    Ok(())
}

/// Refuse IDs that would not read back as the same single ID.
fn check_doc_id(id: &str) -> io::Result<()> {
    let reason = if id.is_empty() {
        "empty document ID"
    } else if id.contains(", ") {
        "document ID contains the list delimiter `, `"
    } else if id.contains(['\n', '\r']) {
        "document ID contains a line break"
    } else if id.trim() != id {
        "document ID has surrounding whitespace"
    } else {
        return Ok(());
    };
    Err(io::Error::new(io::ErrorKind::InvalidInput, format!("{reason}: {id:?}")))
}

/// Parse a snapshot. The first malformed line aborts the whole read.
pub fn read_index<R: BufRead>(input: R) -> Result<PostingList, SnapshotError> {
    let mut postings = PostingList::new();
    for (i, line) in input.lines().enumerate() {
        let line = line?;
        let lineno = i + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (term, ids) = parse_record(trimmed).map_err(|reason| SnapshotError::Format {
            line: lineno,
            content: line.clone(),
            reason,
        })?;
        if postings.contains_key(&term) {
            return Err(SnapshotError::DuplicateTerm { line: lineno, term });
        }
        postings.insert(term, ids);
    }
    tracing::debug!(num_terms = postings.len(), "read index snapshot");
    Ok(postings)
}

fn parse_record(line: &str) -> Result<(Term, Vec<DocId>), &'static str> {
    let rest = line.strip_prefix(TERM_PREFIX).ok_or("missing `Term: ` prefix")?;
    let (term, ids) = rest.split_once(IDS_SEPARATOR).ok_or("missing `, Document IDs: ` separator")?;
    let term = term.trim();
    if term.is_empty() {
        return Err("empty term");
    }
    let inner = ids
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or("document IDs must be enclosed in brackets")?;
    let inner = inner.trim();
    if inner.is_empty() {
        return Ok((term.to_string(), Vec::new()));
    }
    let mut doc_ids = Vec::new();
    for id in inner.split(", ") {
        let id = id.trim();
        if id.is_empty() {
            return Err("empty document ID");
        }
        doc_ids.push(id.to_string());
    }
    Ok((term.to_string(), doc_ids))
}

/// Header naming the query, then one `<rank>. Document ID: <id>, Score: <score>` line per hit.
pub fn write_results<W: Write>(out: &mut W, query: &str, results: &[ScoredDoc]) -> io::Result<()> {
    writeln!(out, "Top results for query '{query}':")?;
    for (rank, hit) in results.iter().enumerate() {
        writeln!(out, "{}. Document ID: {}, Score: {:.4}", rank + 1, hit.doc_id, hit.score)?;
    }
    Ok(())
}

/// Every document's TF-IDF vector, documents and terms in ascending order.
pub fn write_weights<W: Write>(out: &mut W, vectors: &HashMap<DocId, SparseVector>) -> io::Result<()> {
    let mut ids: Vec<&DocId> = vectors.keys().collect();
    ids.sort();
    for id in ids {
        writeln!(out, "Document: {id}")?;
        for (term, weight) in vectors[id].iter() {
            writeln!(out, "  Term: {term}, TF-IDF: {weight}")?;
        }
    }
    Ok(())
}

pub fn save_index(path: &Path, postings: &PostingList, num_docs: usize) -> io::Result<()> {
    with_output_file(path, |w| write_index(w, postings, num_docs))
}

pub fn load_index(path: &Path) -> Result<PostingList, SnapshotError> {
    let f = File::open(path)?;
    read_index(BufReader::new(f))
}

pub fn save_results(path: &Path, query: &str, results: &[ScoredDoc]) -> io::Result<()> {
    with_output_file(path, |w| write_results(w, query, results))
}

pub fn save_weights(path: &Path, vectors: &HashMap<DocId, SparseVector>) -> io::Result<()> {
    with_output_file(path, |w| write_weights(w, vectors))
}

fn with_output_file<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir)?;
    }
    let mut w = BufWriter::new(File::create(path)?);
    write(&mut w)?;
    w.flush()
}
