//! Document index builder.
//!
//! Walks the output directory, reads every `.md` file and produces a
//! [`DocumentIndex`]. Hidden directories and `images/` are not descended
//! into. A file that cannot be read is skipped and counted, never fatal.

use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use walkdir::{DirEntry, WalkDir};

use ysync_core::{DocumentId, DocumentIndex, DocumentMeta};

use crate::error::SyncError;
use crate::frontmatter;
use crate::store;

/// Directory names never descended into, besides hidden ones.
const SKIPPED_DIRS: &[&str] = &["images"];

const CREATED_KEYS: &[&str] = &["date", "createdAt", "created_at"];
const UPDATED_KEYS: &[&str] = &["updated", "updatedAt", "updated_at"];
const SLUG_KEYS: &[&str] = &["slug", "urlname"];

/// A freshly built index plus the number of Markdown files that were skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBuild {
    pub index: DocumentIndex,
    pub skipped: usize,
}

/// Stable id for a document: the first 16 hex chars of the SHA-256 of its
/// `/`-separated path relative to the output root.
pub fn document_id(relative_path: &str) -> DocumentId {
    let mut hasher = Sha256::new();
    hasher.update(relative_path.as_bytes());
    let digest = hex::encode(hasher.finalize());
    DocumentId(digest[..16].to_string())
}

/// Scan `output_dir` and build an index. Nothing is written.
///
/// A missing output directory yields an empty index.
pub fn build_index(output_dir: &Path) -> Result<IndexBuild, SyncError> {
    if !output_dir.exists() {
        return Ok(IndexBuild {
            index: DocumentIndex::new(Vec::new()),
            skipped: 0,
        });
    }

    let mut documents = Vec::new();
    let mut skipped = 0;

    let walker = WalkDir::new(output_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(SyncError::Walk {
                    path: output_dir.to_path_buf(),
                    source: err,
                })
            }
            Err(err) => {
                tracing::debug!("skipping unreadable entry: {err}");
                skipped += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }

        let relative = relative_path(output_dir, entry.path());
        match read_document(entry.path(), &relative) {
            Ok(doc) => documents.push(doc),
            Err(err) => {
                tracing::debug!("skipping {relative}: {err}");
                skipped += 1;
            }
        }
    }

    documents.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(IndexBuild {
        index: DocumentIndex::new(documents),
        skipped,
    })
}

/// Build the index and write it to `index.json`, replacing any previous one.
pub fn rebuild_index(output_dir: &Path) -> Result<IndexBuild, SyncError> {
    let build = build_index(output_dir)?;
    store::save_index(output_dir, &build.index)?;
    tracing::info!(
        "indexed {} document(s) in {} ({} skipped)",
        build.index.total_documents,
        output_dir.display(),
        build.skipped
    );
    Ok(build)
}

fn read_document(path: &Path, relative: &str) -> std::io::Result<DocumentMeta> {
    let content = std::fs::read_to_string(path)?;
    let metadata = std::fs::metadata(path)?;
    let modified = metadata.modified().unwrap_or_else(|_| SystemTime::now());
    let created = metadata.created().unwrap_or(modified);

    let (front, body) = frontmatter::split(&content);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let title = front
        .scalar(&["title"])
        .map(str::to_string)
        .or_else(|| frontmatter::first_heading(body))
        .unwrap_or_else(|| stem.clone());
    let slug = front
        .scalar(SLUG_KEYS)
        .map(str::to_string)
        .unwrap_or(stem);
    let created_at = front
        .scalar(CREATED_KEYS)
        .map(str::to_string)
        .unwrap_or_else(|| iso8601(created));
    let updated_at = front
        .scalar(UPDATED_KEYS)
        .map(str::to_string)
        .unwrap_or_else(|| iso8601(modified));

    Ok(DocumentMeta {
        id: document_id(relative),
        title,
        slug,
        path: relative.to_string(),
        created_at,
        updated_at,
        word_count: frontmatter::word_count(&content),
        tags: front.list("tags"),
    })
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn iso8601(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn document_id_is_deterministic_and_path_sensitive() {
        assert_eq!(document_id("a/b.md"), document_id("a/b.md"));
        assert_ne!(document_id("a/b.md"), document_id("a/c.md"));
        assert_eq!(document_id("a/b.md").0.len(), 16);
    }

    #[test]
    fn builds_titles_from_front_matter_and_heading() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "---\ntitle: Hello\nupdatedAt: 2024-01-01\n---\ntext");
        write(tmp.path(), "b.md", "# World\n\nbody");

        let build = build_index(tmp.path()).unwrap();
        assert_eq!(build.index.total_documents, 2);
        assert_eq!(build.skipped, 0);
        let titles: Vec<_> = build.index.documents.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Hello", "World"]);
        assert_eq!(build.index.documents[0].updated_at, "2024-01-01");
    }

    #[test]
    fn title_falls_back_to_file_stem() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "notes/plain-text.md", "just words");
        let build = build_index(tmp.path()).unwrap();
        let doc = &build.index.documents[0];
        assert_eq!(doc.title, "plain-text");
        assert_eq!(doc.slug, "plain-text");
        assert_eq!(doc.path, "notes/plain-text.md");
        assert_eq!(doc.id, document_id("notes/plain-text.md"));
    }

    #[test]
    fn skips_hidden_dirs_images_and_non_markdown() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "keep.md", "# Keep");
        write(tmp.path(), ".cache/hidden.md", "# Hidden");
        write(tmp.path(), "images/readme.md", "# Image notes");
        write(tmp.path(), "posts/images.md", "# Images is a fine file name");
        write(tmp.path(), "posts/photo.png", "binary");
        write(tmp.path(), "index.json", "{}");

        let build = build_index(tmp.path()).unwrap();
        let paths: Vec<_> = build.index.documents.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["keep.md", "posts/images.md"]);
    }

    #[test]
    fn uses_slug_tags_and_dates_from_front_matter() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "post.md",
            "---\ntitle: T\nurlname: custom-slug\ndate: 2023-05-06\nupdated: 2023-07-08\ntags: [a, \"b\"]\n---\n中文 words",
        );
        let doc = build_index(tmp.path()).unwrap().index.documents.remove(0);
        assert_eq!(doc.slug, "custom-slug");
        assert_eq!(doc.created_at, "2023-05-06");
        assert_eq!(doc.updated_at, "2023-07-08");
        assert_eq!(doc.tags, vec!["a", "b"]);
        assert_eq!(doc.word_count, 3);
    }

    #[test]
    fn falls_back_to_filesystem_mtime() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "dated.md", "# Dated");
        let mtime = filetime::FileTime::from_unix_time(1_700_000_000, 0);
        filetime::set_file_mtime(tmp.path().join("dated.md"), mtime).unwrap();

        let doc = build_index(tmp.path()).unwrap().index.documents.remove(0);
        assert_eq!(doc.updated_at, "2023-11-14T22:13:20.000Z");
    }

    #[test]
    #[cfg(unix)]
    fn unreadable_file_is_skipped_and_counted() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "ok.md", "# Ok");
        write(tmp.path(), "bad.md", "# Bad");
        // Invalid UTF-8 cannot be read as a string even when running as root.
        fs::write(tmp.path().join("binary.md"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
        let bad = tmp.path().join("bad.md");
        fs::set_permissions(&bad, fs::Permissions::from_mode(0o000)).unwrap();
        let bad_readable = fs::read(&bad).is_ok();

        let build = build_index(tmp.path()).unwrap();
        let expected_skipped = if bad_readable { 1 } else { 2 };
        assert_eq!(build.skipped, expected_skipped);
        assert!(build.index.documents.iter().any(|d| d.path == "ok.md"));
        assert!(build.index.documents.iter().all(|d| d.path != "binary.md"));

        fs::set_permissions(&bad, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[test]
    fn missing_output_dir_is_empty_index() {
        let tmp = TempDir::new().unwrap();
        let build = build_index(&tmp.path().join("nope")).unwrap();
        assert_eq!(build.index.total_documents, 0);
    }

    #[test]
    fn rebuild_replaces_previous_index_file() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "one.md", "# One");
        rebuild_index(tmp.path()).unwrap();
        fs::remove_file(tmp.path().join("one.md")).unwrap();
        write(tmp.path(), "two.md", "# Two");
        rebuild_index(tmp.path()).unwrap();

        let index = store::load_index(tmp.path()).unwrap().unwrap();
        assert_eq!(index.total_documents, 1);
        assert_eq!(index.documents[0].title, "Two");
    }
}
