//! Exports the [`build_site`] function which stitches together the high-level
//! steps of a build: loading the documents ([`crate::document`]), assembling
//! each collection into a [`Catalog`] ([`assemble`]), and writing the
//! catalogs to disk ([`crate::write`]).

use crate::config::{Config, SiteConfig};
use crate::document::{self, Document, InvalidDocument, Loader};
use crate::index::Index;
use crate::slug::{self, SlugCollision};
use crate::view::Catalog;
use crate::write::{Error as WriteError, Writer};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// The in-memory result of assembling a document set.
#[derive(Debug, Default)]
pub struct Assembly {
    /// One catalog per collection without slug collisions, in configuration
    /// order.
    pub catalogs: Vec<Catalog>,

    /// Documents excluded during assembly.
    pub invalid: Vec<InvalidDocument>,

    /// Collections that produced no catalog because of slug collisions.
    pub collisions: Vec<SlugCollision>,
}

/// Groups `documents` by collection and turns each collection into a
/// [`Catalog`]: slugs are assigned, the collection is indexed
/// chronologically, tags are aggregated, and metadata is resolved. A
/// collection with a slug collision is left out and its collision recorded;
/// the other collections are still assembled.
pub fn assemble(
    documents: Vec<Document>,
    collections: &[String],
    site: &SiteConfig,
    build_time: DateTime<Utc>,
) -> Result<Assembly> {
    let mut ids = HashSet::with_capacity(documents.len());
    for document in &documents {
        if !ids.insert(document.id.as_str()) {
            return Err(Error::DuplicateId(document.id.clone()));
        }
    }

    let mut assembly = Assembly::default();
    let mut remaining = documents;
    for collection in collections {
        let (members, rest): (Vec<Document>, Vec<Document>) = remaining
            .into_iter()
            .partition(|document| &document.collection == collection);
        remaining = rest;

        match slug::assign_collection(collection, members) {
            Err(collision) => {
                tracing::error!(%collision, "skipping collection");
                assembly.collisions.push(collision);
            }
            Ok(assigned) => {
                assembly.invalid.extend(assigned.invalid);
                let index = Index::build(collection, assigned.documents);
                tracing::debug!(
                    collection = collection.as_str(),
                    documents = index.len(),
                    "indexed collection"
                );
                assembly
                    .catalogs
                    .push(Catalog::new(index, site, build_time)?);
            }
        }
    }

    // `Document::from_raw` rejects unknown collections, so this only
    // happens for documents constructed elsewhere.
    for document in remaining {
        assembly.invalid.push(InvalidDocument {
            source: document.id,
            collection: Some(document.collection.clone()),
            field: Some("collection"),
            reason: format!("unknown collection `{}`", document.collection),
        });
    }

    Ok(assembly)
}

/// What a build did, and what went wrong without stopping it.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Every document excluded from its collection.
    pub invalid: Vec<InvalidDocument>,

    /// Every collection that was not built because of slug collisions.
    pub collisions: Vec<SlugCollision>,

    /// The collections that were written, with their document counts.
    pub collections: Vec<(String, usize)>,
}

impl BuildReport {
    /// A build succeeds when every collection was written. Invalid documents
    /// don't fail a build.
    pub fn is_success(&self) -> bool {
        self.collisions.is_empty()
    }
}

/// Builds the site from a [`Config`] object. `build_time` is the instant
/// recorded as the modified date of documents without one and as the feed
/// update time.
pub fn build_site(config: &Config, build_time: DateTime<Utc>) -> Result<BuildReport> {
    tracing::info!(content = %config.content_directory.display(), "loading documents");
    let loaded = Loader::new(&config.collections, config.threads)
        .load(&config.content_directory)?;

    let assembly = assemble(
        loaded.documents,
        &config.collections,
        &config.site,
        build_time,
    )?;

    let writer = Writer::new(
        &config.output_directory,
        config.page_size,
        &config.site,
        build_time,
    );

    // Clear every configured collection, including those that failed, so
    // stale output never outlives a collision.
    for collection in &config.collections {
        rmdir(&writer.collection_directory(collection))?;
    }

    let mut report = BuildReport {
        invalid: loaded.invalid,
        collisions: assembly.collisions,
        collections: Vec::with_capacity(assembly.catalogs.len()),
    };
    report.invalid.extend(assembly.invalid);

    for catalog in &assembly.catalogs {
        let written = writer.write_catalog(catalog)?;
        report
            .collections
            .push((catalog.name().to_owned(), written.documents));
    }

    Ok(report)
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during loading,
/// assembling, cleaning output directories, and writing.
#[derive(Debug)]
pub enum Error {
    /// Returned when the content directory can't be loaded.
    Load(document::Error),

    /// Returned when two documents share an id.
    DuplicateId(String),

    /// Returned when a document URL can't be built.
    UrlParse(url::ParseError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for errors writing the output.
    Write(WriteError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Load(err) => err.fmt(f),
            Error::DuplicateId(id) => {
                write!(f, "more than one document has the id `{}`", id)
            }
            Error::UrlParse(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::Write(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Load(err) => Some(err),
            Error::DuplicateId(_) => None,
            Error::UrlParse(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::Write(err) => Some(err),
        }
    }
}

impl From<document::Error> for Error {
    /// Converts [`document::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: document::Error) -> Error {
        Error::Load(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts [`url::ParseError`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}
