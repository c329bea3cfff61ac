//! Defines the [`Document`], [`RawDocument`], [`Loader`], and
//! [`InvalidDocument`] types. Also defines the logic for loading documents
//! from a content directory into memory.
//!
//! A content directory holds one sub-directory per collection. Each document
//! file is structured as follows:
//!
//! 1. Initial frontmatter fence (`---`)
//! 2. YAML frontmatter with fields `title`, `date`, and optionally `tags`,
//!    `cover`, `description`, `slug` and `modified`
//! 3. Terminal frontmatter fence (`---`)
//! 4. Document body
//!
//! For example:
//!
//! ```md
//! ---
//! title: Hello, world!
//! date: 2021-04-16
//! tags: [react]
//! ---
//! # Hello
//!
//! World
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// The maximum number of characters in a derived excerpt, not counting the
/// trailing ellipsis.
pub const EXCERPT_LENGTH: usize = 160;

const DOCUMENT_EXTENSIONS: &[&str] = &["md", "mdx"];

/// The frontmatter of a document, as authored. Every field is optional at
/// this level; [`Document::from_raw`] enforces which ones are required.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Frontmatter {
    #[serde(default, alias = "Title")]
    pub title: Option<String>,

    #[serde(default, alias = "Date")]
    pub date: Option<String>,

    #[serde(default, alias = "Tags")]
    pub tags: Option<Vec<String>>,

    /// Path of the cover image asset, relative to the site URL.
    #[serde(default, alias = "Cover")]
    pub cover: Option<String>,

    #[serde(default, alias = "Description")]
    pub description: Option<String>,

    /// An explicit slug, overriding the one derived from the source path.
    #[serde(default, alias = "Slug")]
    pub slug: Option<String>,

    /// An explicit last-modified date.
    #[serde(default, alias = "Modified")]
    pub modified: Option<String>,
}

/// A document as handed over by a document store, before validation.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDocument {
    pub id: String,
    pub source_path: PathBuf,
    pub collection: String,
    pub frontmatter: Frontmatter,
    pub body: String,
    pub excerpt: String,
}

/// A validated document. Constructed only by [`Document::from_raw`], so the
/// title is non-empty, the date is a real instant, and the collection is one
/// of the known ones.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// Opaque identifier, unique within the document set.
    pub id: String,

    /// The source location relative to the content directory.
    pub source_path: PathBuf,

    pub collection: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub modified: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub cover: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,

    /// The raw body. This is never interpreted beyond excerpt generation.
    pub body: String,

    pub excerpt: String,
}

impl Document {
    /// Validates a [`RawDocument`] against the set of known `collections`.
    pub fn from_raw(
        raw: RawDocument,
        collections: &[String],
    ) -> std::result::Result<Document, InvalidDocument> {
        let invalid = |field: &'static str, reason: String| InvalidDocument {
            source: raw.id.clone(),
            collection: Some(raw.collection.clone()),
            field: Some(field),
            reason,
        };

        if !collections.iter().any(|c| c == &raw.collection) {
            return Err(invalid(
                "collection",
                format!("unknown collection `{}`", raw.collection),
            ));
        }

        let title = match non_blank(raw.frontmatter.title.as_deref()) {
            Some(title) => title.to_owned(),
            None => return Err(invalid("title", String::from("missing or empty"))),
        };

        let date = match raw.frontmatter.date.as_deref() {
            None => return Err(invalid("date", String::from("missing"))),
            Some(date) => parse_date(date).ok_or_else(|| {
                invalid("date", format!("can't parse `{}` as a date", date))
            })?,
        };

        let modified = match raw.frontmatter.modified.as_deref() {
            None => None,
            Some(modified) => Some(parse_date(modified).ok_or_else(|| {
                invalid(
                    "modified",
                    format!("can't parse `{}` as a date", modified),
                )
            })?),
        };

        let frontmatter = raw.frontmatter;
        Ok(Document {
            id: raw.id,
            source_path: raw.source_path,
            collection: raw.collection,
            title,
            date,
            modified,
            tags: frontmatter.tags.unwrap_or_default(),
            cover: frontmatter.cover.filter(|c| !c.trim().is_empty()),
            description: frontmatter.description,
            slug: frontmatter.slug,
            body: raw.body,
            excerpt: raw.excerpt,
        })
    }
}

#[cfg(test)]
impl Document {
    /// Builds a minimal valid document whose collection is the first segment
    /// of `id`.
    pub(crate) fn fixture(id: &str, date: &str) -> Document {
        let source_path = PathBuf::from(id);
        Document {
            id: id.to_owned(),
            collection: collection_of(&source_path).unwrap_or_default(),
            source_path,
            title: format!("Title of {}", id),
            date: parse_date(date).unwrap(),
            modified: None,
            tags: Vec::new(),
            cover: None,
            description: None,
            slug: None,
            body: String::new(),
            excerpt: String::new(),
        }
    }
}

/// Returns the trimmed value if it contains anything but whitespace.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parses a frontmatter date. Accepts `YYYY-MM-DD` (midnight UTC),
/// `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DDTHH:MM:SS` (UTC), and RFC 3339.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(input) {
        return Some(date_time.with_timezone(&Utc));
    }
    for format in &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    let naive = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Derives a plain-text excerpt from a Markdown body: the text is flattened,
/// whitespace is collapsed, and the result is cut to at most `length`
/// characters (preferring a word boundary) with a trailing `…` when cut.
pub fn excerpt(markdown: &str, length: usize) -> String {
    use pulldown_cmark::{Event, Parser, Tag};

    let mut text = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak
            | Event::HardBreak
            | Event::End(Tag::Paragraph)
            | Event::End(Tag::Heading(_))
            | Event::End(Tag::Item)
            | Event::End(Tag::CodeBlock(_))
            | Event::End(Tag::TableCell) => text.push(' '),
            _ => {}
        }
    }
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    match collapsed.char_indices().nth(length) {
        None => collapsed,
        Some((cut, c)) => {
            let head = &collapsed[..cut];
            let head = match (c, head.rfind(' ')) {
                (' ', _) => head,
                (_, Some(space)) if space > 0 => &head[..space],
                _ => head,
            };
            format!("{}…", head.trim_end())
        }
    }
}

/// Splits a document source into its YAML frontmatter and its body.
fn split_frontmatter(input: &str) -> std::result::Result<(&str, &str), &'static str> {
    const FENCE: &str = "---";
    if !input.starts_with(FENCE) {
        return Err("document must begin with `---`");
    }
    // the closing fence must start a line
    let rest = &input[FENCE.len()..];
    match rest.find("\n---") {
        None => Err("missing closing `---`"),
        Some(offset) => Ok((&rest[..offset], &rest[offset + 1 + FENCE.len()..])),
    }
}

/// Parses a [`RawDocument`] from the source text of a file. The `id` is the
/// path relative to the content directory with `/` separators, and the
/// collection is its first component.
pub fn parse_raw(
    relative_path: &Path,
    input: &str,
) -> std::result::Result<RawDocument, InvalidDocument> {
    let id = path_id(relative_path);
    let collection = collection_of(relative_path);
    let invalid = |field: Option<&'static str>, reason: String| InvalidDocument {
        source: id.clone(),
        collection: collection.clone(),
        field,
        reason,
    };

    let collection = match &collection {
        Some(c) => c.clone(),
        None => {
            return Err(invalid(
                Some("collection"),
                String::from("document is not inside a collection directory"),
            ))
        }
    };

    let (yaml, body) =
        split_frontmatter(input).map_err(|e| invalid(None, e.to_owned()))?;
    let frontmatter: Frontmatter = if yaml.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml)
            .map_err(|e| invalid(None, format!("frontmatter: {}", e)))?
    };

    Ok(RawDocument {
        excerpt: excerpt(body, EXCERPT_LENGTH),
        id,
        source_path: relative_path.to_owned(),
        collection,
        frontmatter,
        body: body.trim_start_matches(|c: char| c == '\r' || c == '\n').to_owned(),
    })
}

fn path_id(relative_path: &Path) -> String {
    relative_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn collection_of(relative_path: &Path) -> Option<String> {
    let mut components = relative_path.components().filter_map(|c| match c {
        Component::Normal(part) => Some(part),
        _ => None,
    });
    let first = components.next()?;
    // A file directly in the content directory has no collection.
    components.next()?;
    Some(first.to_string_lossy().into_owned())
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// The outcome of [`Loader::load`]: every valid document, plus every document
/// that was excluded and why.
#[derive(Debug, Default)]
pub struct Loaded {
    /// Valid documents, ordered by id.
    pub documents: Vec<Document>,

    /// Excluded documents, ordered by source.
    pub invalid: Vec<InvalidDocument>,
}

impl Loaded {
    /// Validates documents handed over by some other document store.
    pub fn from_raw(
        raw: impl IntoIterator<Item = RawDocument>,
        collections: &[String],
    ) -> Loaded {
        Loaded::from_results(
            raw.into_iter()
                .map(|raw| Document::from_raw(raw, collections)),
        )
    }

    fn from_results(
        results: impl IntoIterator<
            Item = std::result::Result<Document, InvalidDocument>,
        >,
    ) -> Loaded {
        let mut loaded = Loaded::default();
        for result in results {
            match result {
                Ok(document) => loaded.documents.push(document),
                Err(invalid) => {
                    tracing::warn!(%invalid, "excluding document");
                    loaded.invalid.push(invalid);
                }
            }
        }
        loaded.documents.sort_by(|a, b| a.id.cmp(&b.id));
        loaded.invalid.sort_by(|a, b| a.source.cmp(&b.source));
        loaded
    }
}

/// Loads [`Document`]s from a content directory.
pub struct Loader<'a> {
    /// The known collection names.
    collections: &'a [String],

    /// The number of worker threads to read and parse files with. Values
    /// below 2 load sequentially.
    threads: usize,
}

impl<'a> Loader<'a> {
    /// Constructs a new loader. See fields on [`Loader`] for argument
    /// descriptions.
    pub fn new(collections: &'a [String], threads: usize) -> Loader<'a> {
        Loader {
            collections,
            threads,
        }
    }

    /// Walks `root` and loads every document file found. Failures for
    /// individual documents are collected into [`Loaded::invalid`]; only a
    /// problem walking the directory itself returns an [`Error`].
    pub fn load(&self, root: &Path) -> Result<Loaded> {
        let mut paths = Vec::new();
        let walker = WalkDir::new(root).min_depth(1).into_iter().filter_entry(
            |entry| !entry.file_name().to_string_lossy().starts_with('.'),
        );
        for result in walker {
            let entry = result?;
            if entry.file_type().is_file() && is_document(entry.path()) {
                paths.push(entry.into_path());
            }
        }
        tracing::debug!(root = %root.display(), files = paths.len(), "found document files");

        let results: Vec<std::result::Result<Document, InvalidDocument>> =
            if self.threads < 2 || paths.len() < 2 {
                paths.iter().map(|path| self.load_file(root, path)).collect()
            } else {
                self.load_parallel(root, paths)?
            };

        Ok(Loaded::from_results(results))
    }

    fn load_parallel(
        &self,
        root: &Path,
        paths: Vec<PathBuf>,
    ) -> Result<Vec<std::result::Result<Document, InvalidDocument>>> {
        use crossbeam_channel::unbounded;

        let (tx, rx) = unbounded::<PathBuf>();
        for path in paths {
            // The receiver is alive until the end of this function.
            let _ = tx.send(path);
        }
        drop(tx);

        std::thread::scope(|scope| {
            let workers: Vec<_> = (0..self.threads)
                .map(|_| {
                    let rx = rx.clone();
                    scope.spawn(move || {
                        rx.iter()
                            .map(|path| self.load_file(root, &path))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mut results = Vec::new();
            for worker in workers {
                results.extend(worker.join().map_err(|_| Error::WorkerPanicked)?);
            }
            Ok(results)
        })
    }

    fn load_file(
        &self,
        root: &Path,
        path: &Path,
    ) -> std::result::Result<Document, InvalidDocument> {
        // `path` always comes from walking `root`.
        let relative = path.strip_prefix(root).unwrap_or(path);
        let contents = std::fs::read_to_string(path).map_err(|e| InvalidDocument {
            source: path_id(relative),
            collection: collection_of(relative),
            field: None,
            reason: format!("reading file: {}", e),
        })?;
        Document::from_raw(parse_raw(relative, &contents)?, self.collections)
    }
}

/// Describes why a document was excluded from its collection.
#[derive(Clone, Debug, PartialEq)]
pub struct InvalidDocument {
    /// The source identifier of the document.
    pub source: String,

    /// The collection the document belongs to, when known.
    pub collection: Option<String>,

    /// The offending frontmatter field, when the problem is with one field.
    pub field: Option<&'static str>,

    pub reason: String,
}

impl fmt::Display for InvalidDocument {
    /// Displays an [`InvalidDocument`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid document `{}`", self.source)?;
        if let Some(collection) = &self.collection {
            write!(f, " in collection `{}`", collection)?;
        }
        if let Some(field) = self.field {
            write!(f, ", field `{}`", field)?;
        }
        write!(f, ": {}", self.reason)
    }
}

impl std::error::Error for InvalidDocument {}

/// Represents the result of a [`Loader`] operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error that stops loading altogether.
#[derive(Debug)]
pub enum Error {
    /// Returned when the content directory can't be walked.
    WalkDir(walkdir::Error),

    /// Returned when a loader worker thread panicked.
    WorkerPanicked,
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::WalkDir(err) => write!(f, "walking content directory: {}", err),
            Error::WorkerPanicked => write!(f, "a loader thread panicked"),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::WalkDir(err) => Some(err),
            Error::WorkerPanicked => None,
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator while walking directories.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
