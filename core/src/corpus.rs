use crate::error::CorpusError;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Document ID to raw text, iterated in ID order.
pub type Corpus = BTreeMap<DocId, String>;

/// What to do with a document that cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDocumentPolicy {
    /// Log a warning and leave the document out; `N` shrinks accordingly.
    #[default]
    Skip,
    /// Fail the whole load on the first unreadable document.
    Abort,
}

/// Read every regular file under `root` as a document.
///
/// IDs are paths relative to `root` joined with `/`, so a flat directory gives
/// bare filenames. Dotfiles are ignored.
pub fn load_corpus(root: &Path, policy: MissingDocumentPolicy) -> Result<Corpus, CorpusError> {
    if !root.is_dir() {
        return Err(CorpusError::NotADirectory(root.to_path_buf()));
    }
    let mut corpus = Corpus::new();
    let mut skipped = 0usize;
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => match policy {
                MissingDocumentPolicy::Skip => {
                    let path = err.path().map(|p| p.display().to_string()).unwrap_or_default();
                    tracing::warn!(path = %path, error = %err, "skipping unreadable corpus entry");
                    skipped += 1;
                    continue;
                }
                MissingDocumentPolicy::Abort => return Err(CorpusError::Walk(err)),
            },
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        match fs::read_to_string(path) {
            Ok(text) => {
                corpus.insert(doc_id_for(root, path), text);
            }
            Err(source) => match policy {
                MissingDocumentPolicy::Skip => {
                    tracing::warn!(path = %path.display(), error = %source, "skipping unreadable document");
                    skipped += 1;
                }
                MissingDocumentPolicy::Abort => {
                    return Err(CorpusError::UnreadableDocument { path: path.to_path_buf(), source });
                }
            },
        }
    }
    tracing::info!(root = %root.display(), num_docs = corpus.len(), skipped, "loaded corpus");
    Ok(corpus)
}

fn doc_id_for(root: &Path, path: &Path) -> DocId {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ids_are_relative_paths() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("sub/b.txt"), "beta").unwrap();
        fs::write(dir.path().join(".hidden"), "gamma").unwrap();

        let corpus = load_corpus(dir.path(), MissingDocumentPolicy::Abort).unwrap();
        let ids: Vec<&str> = corpus.keys().map(|s| s.as_str()).collect();
        assert_eq!(ids, vec!["a.txt", "sub/b.txt"]);
        assert_eq!(corpus["a.txt"], "alpha");
    }

    #[test]
    fn invalid_utf8_follows_policy() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("good.txt"), "fine").unwrap();
        fs::write(dir.path().join("bad.bin"), [0xffu8, 0xfe, 0x00, 0xc3]).unwrap();

        let skipped = load_corpus(dir.path(), MissingDocumentPolicy::Skip).unwrap();
        assert_eq!(skipped.len(), 1);
        assert!(skipped.contains_key("good.txt"));

        let err = load_corpus(dir.path(), MissingDocumentPolicy::Abort).unwrap_err();
        assert!(matches!(err, CorpusError::UnreadableDocument { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_follows_policy() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        fs::write(dir.path().join("good.txt"), "fine").unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("inner.txt"), "hidden").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Privileged users can still list the directory; then there is nothing to skip.
        let denied = fs::read_dir(&locked).is_err();

        let skipped = load_corpus(dir.path(), MissingDocumentPolicy::Skip);
        let aborted = load_corpus(dir.path(), MissingDocumentPolicy::Abort);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let skipped = skipped.unwrap();
        assert!(skipped.contains_key("good.txt"));
        if denied {
            assert_eq!(skipped.len(), 1);
            assert!(matches!(aborted, Err(CorpusError::Walk(_))));
        } else {
            assert_eq!(skipped.len(), 2);
            assert!(aborted.is_ok());
        }
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let err = load_corpus(&dir.path().join("nope"), MissingDocumentPolicy::Skip).unwrap_err();
        assert!(matches!(err, CorpusError::NotADirectory(_)));
    }
}
