//! Resolves the SEO and syndication metadata of a document against the
//! site-wide defaults.

use crate::config::SiteConfig;
use crate::document::non_blank;
use crate::index::Entry;
use crate::slug::Slug;
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::{ParseError, Url};

/// The final metadata for one document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedMetadata {
    pub title: String,
    pub description: String,

    /// Absolute URL of the social image.
    pub image: Url,

    pub canonical_url: Url,
    pub published: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub language: String,
    pub locale: String,
    pub author: Option<String>,
}

/// Resolves the metadata for `entry`. Each field takes the document's own
/// value when it has a non-blank one, then a computed fallback, then the site
/// default:
///
/// * `description`: document description, then excerpt, then site
///   description.
/// * `image`: the cover asset, then the site default image, both joined onto
///   the site URL.
/// * `modified`: the document's explicit modified date, then `build_time`.
///
/// `build_time` is passed in rather than read from a clock so that the same
/// inputs always resolve to the same record.
pub fn synthesize(
    entry: &Entry,
    site: &SiteConfig,
    build_time: DateTime<Utc>,
) -> Result<ResolvedMetadata, ParseError> {
    let document = &entry.document;

    let description = match non_blank(document.description.as_deref()) {
        Some(description) => description,
        None => match non_blank(Some(document.excerpt.as_str())) {
            Some(excerpt) => excerpt,
            None => {
                tracing::debug!(id = %document.id, "using the site description");
                site.description.as_str()
            }
        },
    };

    let image = match non_blank(document.cover.as_deref()) {
        Some(cover) => asset_url(&site.site_url, cover)?,
        None => asset_url(&site.site_url, &site.default_image)?,
    };

    Ok(ResolvedMetadata {
        title: non_blank(Some(document.title.as_str()))
            .unwrap_or(site.title.as_str())
            .to_owned(),
        description: description.to_owned(),
        image,
        canonical_url: document_url(
            &site.site_url,
            &document.collection,
            &entry.slug,
        )?,
        published: document.date,
        modified: document.modified.unwrap_or(build_time),
        language: site.site_language.clone(),
        locale: site.site_locale.clone(),
        author: site.author_name.clone(),
    })
}

/// Returns the URL of a collection's directory, e.g.
/// `https://example.org/blog/`.
pub fn collection_url(site_url: &Url, collection: &str) -> Result<Url, ParseError> {
    // NOTE: [`Url::join`] treats the last path segment of a URL without a
    // trailing slash as a file name and replaces it, so every directory URL
    // we build ends in `/`.
    directory(site_url)?.join(&format!("{}/", collection))
}

/// Returns the URL of a document's detail page, e.g.
/// `https://example.org/blog/hello-world/`.
pub fn document_url(
    site_url: &Url,
    collection: &str,
    slug: &Slug,
) -> Result<Url, ParseError> {
    collection_url(site_url, collection)?.join(&format!("{}/", slug))
}

/// Joins an asset path onto the site URL. Asset paths are relative to the
/// site root whether or not they start with `/`, so a site hosted under a
/// sub-path keeps its prefix. Absolute URLs are returned unchanged.
pub fn asset_url(site_url: &Url, path: &str) -> Result<Url, ParseError> {
    match Url::parse(path) {
        Ok(absolute) => Ok(absolute),
        Err(ParseError::RelativeUrlWithoutBase) => {
            directory(site_url)?.join(path.trim_start_matches('/'))
        }
        Err(e) => Err(e),
    }
}

fn directory(url: &Url) -> Result<Url, ParseError> {
    match url.path().ends_with('/') {
        true => Ok(url.clone()),
        false => Url::parse(&format!("{}/", url)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::{parse_date, Document};
    use crate::index::Neighbor;
    use crate::slug;

    fn site() -> SiteConfig {
        SiteConfig {
            title: String::from("The Localhost Blog"),
            description: String::from("Site description"),
            default_image: String::from("/images/default.png"),
            site_url: Url::parse("https://localhost.blog/").unwrap(),
            site_language: String::from("en"),
            site_locale: String::from("en_GB"),
            author_name: Some(String::from("Jane")),
            designation: None,
            twitter_username: None,
            github_username: None,
            linkedin_username: None,
        }
    }

    fn entry(document: Document) -> Entry {
        Entry {
            rank: 0,
            slug: slug::assign(&document).unwrap(),
            document,
            previous: Neighbor::End,
            next: Neighbor::End,
        }
    }

    fn build_time() -> DateTime<Utc> {
        parse_date("2022-06-01T12:00:00Z").unwrap()
    }

    #[test]
    fn test_site_defaults() -> Result<(), ParseError> {
        let document = Document::fixture("blog/hello-world.md", "2021-01-01");
        let metadata = synthesize(&entry(document), &site(), build_time())?;

        assert_eq!("Title of blog/hello-world.md", metadata.title);
        assert_eq!("Site description", metadata.description);
        assert_eq!(
            "https://localhost.blog/images/default.png",
            metadata.image.as_str()
        );
        assert_eq!(
            "https://localhost.blog/blog/hello-world/",
            metadata.canonical_url.as_str()
        );
        assert_eq!(parse_date("2021-01-01"), Some(metadata.published));
        assert_eq!(build_time(), metadata.modified);
        assert_eq!("en", metadata.language);
        assert_eq!("en_GB", metadata.locale);
        assert_eq!(Some(String::from("Jane")), metadata.author);
        Ok(())
    }

    #[test]
    fn test_description_falls_back_to_excerpt() -> Result<(), ParseError> {
        let mut document = Document::fixture("blog/a.md", "2021-01-01");
        document.excerpt = String::from("An excerpt");
        document.description = Some(String::from("   "));
        let metadata = synthesize(&entry(document.clone()), &site(), build_time())?;
        assert_eq!("An excerpt", metadata.description);

        document.description = Some(String::from("Explicit"));
        let metadata = synthesize(&entry(document), &site(), build_time())?;
        assert_eq!("Explicit", metadata.description);
        Ok(())
    }

    #[test]
    fn test_cover_and_modified() -> Result<(), ParseError> {
        let mut document = Document::fixture("projects/p.md", "2020-09-01");
        document.cover = Some(String::from("/projects/p/cover.png"));
        document.modified = parse_date("2021-04-01");
        let metadata = synthesize(&entry(document.clone()), &site(), build_time())?;

        assert_eq!(
            "https://localhost.blog/projects/p/cover.png",
            metadata.image.as_str()
        );
        assert_eq!(parse_date("2021-04-01"), Some(metadata.modified));

        document.cover = Some(String::from("https://cdn.example.org/c.png"));
        let metadata = synthesize(&entry(document), &site(), build_time())?;
        assert_eq!("https://cdn.example.org/c.png", metadata.image.as_str());
        Ok(())
    }

    #[test]
    fn test_site_under_sub_path() -> Result<(), ParseError> {
        let mut site = site();
        site.site_url = Url::parse("https://example.org/~jane")?;
        let document = Document::fixture("blog/hello.md", "2021-01-01");
        let metadata = synthesize(&entry(document), &site, build_time())?;

        assert_eq!(
            "https://example.org/~jane/images/default.png",
            metadata.image.as_str()
        );
        assert_eq!(
            "https://example.org/~jane/blog/hello/",
            metadata.canonical_url.as_str()
        );
        Ok(())
    }

    #[test]
    fn test_synthesis_is_idempotent() -> Result<(), ParseError> {
        let entry = entry(Document::fixture("blog/a.md", "2021-01-01"));
        assert_eq!(
            synthesize(&entry, &site(), build_time())?,
            synthesize(&entry, &site(), build_time())?
        );
        Ok(())
    }
}
