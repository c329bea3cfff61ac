//! Support for creating Atom feeds from a [`Catalog`].

use crate::config::SiteConfig;
use crate::view::Catalog;
use atom_syndication::{Category, Entry, Error as AtomError, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt;
use std::io::Write;
use url::{ParseError, Url};

/// The file name of a collection's feed, relative to the collection
/// directory.
pub const FEED_FILE: &str = "feed.atom";

/// Creates the feed for a collection and writes the result to a
/// [`std::io::Write`].
pub fn write_feed<W: Write>(
    site: &SiteConfig,
    catalog: &Catalog,
    build_time: DateTime<Utc>,
    w: W,
) -> Result<()> {
    feed(site, catalog, build_time)?.write_to(w)?;
    Ok(())
}

/// Builds the feed for a collection. Entries come from the resolved
/// metadata, newest first; the feed itself is stamped with `build_time`.
pub fn feed(
    site: &SiteConfig,
    catalog: &Catalog,
    build_time: DateTime<Utc>,
) -> Result<Feed> {
    let mut feed = Feed::default();
    feed.set_title(format!("{} | {}", site.title, catalog.name()));
    feed.set_subtitle(Some(Text::plain(site.description.clone())));
    feed.set_id(catalog.url().to_string());
    feed.set_updated(fixed(build_time));
    feed.set_authors(author_to_people(site));
    feed.set_links(vec![
        link(catalog.url(), "alternate"),
        link(&catalog.url().join(FEED_FILE)?, "self"),
    ]);
    feed.set_entries(feed_entries(site, catalog));
    Ok(feed)
}

fn feed_entries(site: &SiteConfig, catalog: &Catalog) -> Vec<Entry> {
    catalog
        .index()
        .entries()
        .iter()
        .filter_map(|index_entry| {
            let metadata = catalog.metadata(&index_entry.document.id)?;
            let mut entry = Entry::default();
            entry.set_id(metadata.canonical_url.to_string());
            entry.set_title(metadata.title.clone());
            entry.set_summary(Some(Text::plain(metadata.description.clone())));
            entry.set_published(Some(fixed(metadata.published)));
            entry.set_updated(fixed(metadata.modified));
            entry.set_authors(author_to_people(site));
            entry.set_links(vec![link(&metadata.canonical_url, "alternate")]);
            entry.set_categories(
                index_entry
                    .document
                    .tags
                    .iter()
                    .map(|tag| {
                        let mut category = Category::default();
                        category.set_term(tag.clone());
                        category
                    })
                    .collect::<Vec<_>>(),
            );
            Some(entry)
        })
        .collect()
}

fn fixed(date: DateTime<Utc>) -> DateTime<FixedOffset> {
    DateTime::<FixedOffset>::from(date)
}

fn link(href: &Url, rel: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href.to_string());
    link.set_rel(rel);
    link
}

fn author_to_people(site: &SiteConfig) -> Vec<Person> {
    match &site.author_name {
        Some(name) => {
            let mut person = Person::default();
            person.set_name(name.clone());
            person.set_uri(Some(site.site_url.to_string()));
            vec![person]
        }
        None => Vec::new(),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is an Atom-related error, including I/O while
    /// writing.
    Atom(AtomError),

    /// Returned when a feed URL can't be built.
    UrlParse(ParseError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Atom(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Atom(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator when joining URLs.
    fn from(err: ParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::{parse_date, Document};
    use crate::index::Index;
    use crate::slug::{self, Slugged};

    fn site() -> SiteConfig {
        SiteConfig {
            title: String::from("The Localhost Blog"),
            description: String::from("Coding journey"),
            default_image: String::from("/default.png"),
            site_url: Url::parse("https://localhost.blog/").unwrap(),
            site_language: String::from("en"),
            site_locale: String::from("en_US"),
            author_name: Some(String::from("Jane")),
            designation: None,
            twitter_username: None,
            github_username: None,
            linkedin_username: None,
        }
    }

    fn catalog() -> Catalog {
        let slugged = vec![("blog/old.md", "2020-01-01"), ("blog/new.md", "2021-01-01")]
            .into_iter()
            .map(|(id, date)| {
                let mut document = Document::fixture(id, date);
                document.tags = vec![String::from("rust")];
                Slugged {
                    slug: slug::assign(&document).unwrap(),
                    document,
                }
            })
            .collect();
        Catalog::new(
            Index::build("blog", slugged),
            &site(),
            parse_date("2022-01-01").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_feed_entries() -> Result<()> {
        let build_time = parse_date("2022-01-01").unwrap();
        let feed = feed(&site(), &catalog(), build_time)?;

        assert_eq!("https://localhost.blog/blog/", feed.id());
        assert_eq!(fixed(build_time), *feed.updated());
        assert_eq!(2, feed.entries().len());

        let newest = &feed.entries()[0];
        assert_eq!("https://localhost.blog/blog/new/", newest.id());
        assert_eq!(Some(fixed(parse_date("2021-01-01").unwrap())), newest.published().cloned());
        assert_eq!("Jane", newest.authors()[0].name());
        assert_eq!("rust", newest.categories()[0].term());
        Ok(())
    }

    #[test]
    fn test_write_feed() -> Result<()> {
        let mut out: Vec<u8> = Vec::new();
        write_feed(
            &site(),
            &catalog(),
            parse_date("2022-01-01").unwrap(),
            &mut out,
        )?;
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains("<id>https://localhost.blog/blog/new/</id>"));
        assert!(xml.contains("rel=\"self\""));
        Ok(())
    }
}
