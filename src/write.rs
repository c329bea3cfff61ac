use crate::config::SiteConfig;
use crate::feed::{self, FEED_FILE};
use crate::page::{paginate, Page};
use crate::view::{Catalog, ListingItem};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use url::ParseError;

/// The directory, relative to a collection's output directory, holding one
/// detail payload per document.
pub const DOCUMENTS_DIRECTORY: &str = "documents";

/// The directory, relative to a collection's output directory, holding the
/// per-tag listings.
pub const TAGS_DIRECTORY: &str = "tags";

/// Responsible for serializing a [`Catalog`] to disk for the renderer.
pub struct Writer<'a> {
    /// The directory in which each collection gets its own sub-directory.
    /// For a collection `blog`, the listing pages are
    /// `{output_directory}/blog/index.json`, `{output_directory}/blog/1.json`,
    /// etc., the detail payloads are
    /// `{output_directory}/blog/documents/{slug}.json`, and the tag listings
    /// are `{output_directory}/blog/tags/{tag}/index.json`, etc.
    pub output_directory: &'a Path,

    /// The number of items per listing page.
    pub page_size: usize,

    pub site: &'a SiteConfig,

    /// Stamped on the feed.
    pub build_time: DateTime<Utc>,

    /// Directories already created during this run.
    seen_dirs: RefCell<HashSet<PathBuf>>,
}

/// Counts of what [`Writer::write_catalog`] wrote.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Written {
    pub pages: usize,
    pub documents: usize,
    pub tags: usize,
}

impl<'a> Writer<'a> {
    pub fn new(
        output_directory: &'a Path,
        page_size: usize,
        site: &'a SiteConfig,
        build_time: DateTime<Utc>,
    ) -> Writer<'a> {
        Writer {
            output_directory,
            page_size,
            site,
            build_time,
            seen_dirs: RefCell::new(HashSet::new()),
        }
    }

    /// The output directory of a collection.
    pub fn collection_directory(&self, collection: &str) -> PathBuf {
        self.output_directory.join(collection)
    }

    /// Writes the listing pages, tag listings, tag index, detail payloads,
    /// and feed of a collection.
    pub fn write_catalog(&self, catalog: &Catalog) -> Result<Written> {
        let dir = self.collection_directory(catalog.name());
        let mut written = Written::default();

        written.pages +=
            self.write_pages(&dir, &paginate(&catalog.listing(), self.page_size, catalog.url())?)?;

        for detail in catalog.details() {
            let path = dir
                .join(DOCUMENTS_DIRECTORY)
                .join(format!("{}.json", detail.slug));
            self.write_json(&path, &detail)?;
            written.documents += 1;
        }

        let tags_dir = dir.join(TAGS_DIRECTORY);
        self.write_json(&tags_dir.join("index.json"), catalog.tags())?;
        for (tag, entry) in catalog.tags().iter() {
            let pages = paginate(
                &catalog.tag_listing(tag),
                self.page_size,
                &catalog.tag_url(entry)?,
            )?;
            written.pages += self.write_pages(&tags_dir.join(&entry.slug), &pages)?;
            written.tags += 1;
        }

        let feed_path = dir.join(FEED_FILE);
        self.ensure_parent(&feed_path)?;
        feed::write_feed(
            self.site,
            catalog,
            self.build_time,
            BufWriter::new(create(&feed_path)?),
        )?;

        tracing::info!(
            collection = catalog.name(),
            pages = written.pages,
            documents = written.documents,
            tags = written.tags,
            "wrote collection"
        );
        Ok(written)
    }

    fn write_pages(&self, dir: &Path, pages: &[Page<ListingItem>]) -> Result<usize> {
        for page in pages {
            self.write_json(&dir.join(page.file_name()), page)?;
        }
        Ok(pages.len())
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        self.ensure_parent(path)?;
        serde_json::to_writer_pretty(BufWriter::new(create(path)?), value).map_err(
            |err| Error::Json {
                path: path.to_owned(),
                err,
            },
        )
    }

    fn ensure_parent(&self, path: &Path) -> Result<()> {
        // every output path is below `output_directory`
        if let Some(dir) = path.parent() {
            if self.seen_dirs.borrow_mut().insert(dir.to_owned()) {
                std::fs::create_dir_all(dir).map_err(|err| Error::Io {
                    path: dir.to_owned(),
                    err,
                })?;
            }
        }
        Ok(())
    }
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })
}

/// The result of a fallible writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error creating an output directory or file.
    Io { path: PathBuf, err: io::Error },

    /// An error serializing a record.
    Json { path: PathBuf, err: serde_json::Error },

    /// An error building a page URL.
    UrlParse(ParseError),

    /// An error writing a feed.
    Feed(feed::Error),
}

impl From<ParseError> for Error {
    /// Converts a [`ParseError`] into an [`Error`]. This allows us to use the
    /// `?` operator when building page URLs.
    fn from(err: ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<feed::Error> for Error {
    /// Converts a [`feed::Error`] into an [`Error`].
    fn from(err: feed::Error) -> Error {
        Error::Feed(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => {
                write!(f, "Writing '{}': {}", path.display(), err)
            }
            Error::Json { path, err } => {
                write!(f, "Serializing '{}': {}", path.display(), err)
            }
            Error::UrlParse(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { path: _, err } => Some(err),
            Error::Json { path: _, err } => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Feed(err) => Some(err),
        }
    }
}
