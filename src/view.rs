//! Shapes an indexed collection into the records listing and detail pages
//! are rendered from. Nothing here does I/O.

use crate::config::SiteConfig;
use crate::index::{Entry, Index, Neighbor};
use crate::metadata::{self, ResolvedMetadata};
use crate::slug::Slug;
use crate::tag::{self, Tag, TagEntry, TagIndex};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use url::{ParseError, Url};

/// One item of a listing page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListingItem {
    pub id: String,
    pub slug: Slug,
    pub url: Url,
    pub title: String,
    pub excerpt: String,
    pub published: DateTime<Utc>,

    /// The absolute cover URL, if the document has a cover.
    pub cover: Option<Url>,

    pub tags: Vec<Tag>,
}

/// A link to a neighbouring document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NeighborLink {
    pub slug: Slug,
    pub title: String,
    pub url: Url,
}

/// Everything a document's detail page needs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetailView {
    pub id: String,
    pub collection: String,
    pub slug: Slug,
    pub rank: usize,
    pub metadata: ResolvedMetadata,

    /// The next-older document, if any.
    pub previous: Option<NeighborLink>,

    /// The next-newer document, if any.
    pub next: Option<NeighborLink>,

    pub tags: Vec<Tag>,
    pub body: String,
}

/// An indexed collection together with its tag index and the resolved
/// metadata of every document.
#[derive(Clone, Debug)]
pub struct Catalog {
    index: Index,
    tags: TagIndex,
    metadata: HashMap<String, ResolvedMetadata>,
    url: Url,
}

impl Catalog {
    /// Aggregates the tags of `index` and resolves the metadata of each of
    /// its documents.
    pub fn new(
        index: Index,
        site: &SiteConfig,
        build_time: DateTime<Utc>,
    ) -> Result<Catalog, ParseError> {
        let tags = tag::aggregate(index.entries().iter().map(|e| &e.document));
        let metadata = index
            .entries()
            .iter()
            .map(|entry| {
                Ok::<_, ParseError>((
                    entry.document.id.clone(),
                    metadata::synthesize(entry, site, build_time)?,
                ))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        let url = metadata::collection_url(&site.site_url, index.collection())?;

        Ok(Catalog {
            index,
            tags,
            metadata,
            url,
        })
    }

    pub fn name(&self) -> &str {
        self.index.collection()
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    /// The public URL of the collection's listing.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The public URL of a tag's listing within the collection.
    pub fn tag_url(&self, tag: &TagEntry) -> Result<Url, ParseError> {
        self.url.join(&format!("tags/{}/", tag.slug))
    }

    pub fn metadata(&self, id: &str) -> Option<&ResolvedMetadata> {
        self.metadata.get(id)
    }

    /// Every resolved metadata record, newest document first.
    pub fn all_metadata(&self) -> impl Iterator<Item = &ResolvedMetadata> {
        self.index
            .entries()
            .iter()
            .filter_map(move |entry| self.metadata.get(&entry.document.id))
    }

    /// The listing of the whole collection, newest first.
    pub fn listing(&self) -> Vec<ListingItem> {
        self.index
            .entries()
            .iter()
            .filter_map(|entry| self.listing_item(entry))
            .collect()
    }

    /// The listing of the documents carrying `tag`, newest first.
    pub fn tag_listing(&self, tag: &str) -> Vec<ListingItem> {
        let ids = match self.tags.get(tag) {
            Some(entry) => &entry.documents,
            None => return Vec::new(),
        };
        self.index
            .entries()
            .iter()
            .filter(|entry| ids.contains(&entry.document.id))
            .filter_map(|entry| self.listing_item(entry))
            .collect()
    }

    /// The detail payload of the document with the given id.
    pub fn detail(&self, id: &str) -> Option<DetailView> {
        let entry = self.index.get(id)?;
        Some(DetailView {
            id: entry.document.id.clone(),
            collection: entry.document.collection.clone(),
            slug: entry.slug.clone(),
            rank: entry.rank,
            metadata: self.metadata.get(id)?.clone(),
            previous: self.link(&entry.previous),
            next: self.link(&entry.next),
            tags: tags(entry),
            body: entry.document.body.clone(),
        })
    }

    /// The detail payloads of every document, newest first.
    pub fn details(&self) -> Vec<DetailView> {
        self.index
            .entries()
            .iter()
            .filter_map(|entry| self.detail(&entry.document.id))
            .collect()
    }

    fn listing_item(&self, entry: &Entry) -> Option<ListingItem> {
        let metadata = self.metadata.get(&entry.document.id)?;
        Some(ListingItem {
            id: entry.document.id.clone(),
            slug: entry.slug.clone(),
            url: metadata.canonical_url.clone(),
            title: entry.document.title.clone(),
            excerpt: entry.document.excerpt.clone(),
            published: entry.document.date,
            cover: entry
                .document
                .cover
                .as_ref()
                .map(|_| metadata.image.clone()),
            tags: tags(entry),
        })
    }

    fn link(&self, neighbor: &Neighbor) -> Option<NeighborLink> {
        let neighbor = neighbor.document()?;
        Some(NeighborLink {
            slug: neighbor.slug.clone(),
            title: neighbor.title.clone(),
            url: self.metadata.get(&neighbor.id)?.canonical_url.clone(),
        })
    }
}

fn tags(entry: &Entry) -> Vec<Tag> {
    let mut tags: Vec<Tag> = Vec::with_capacity(entry.document.tags.len());
    for name in &entry.document.tags {
        let tag = Tag::new(name);
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::{parse_date, Document};
    use crate::slug::{self, Slugged};

    fn site() -> SiteConfig {
        SiteConfig {
            title: String::from("Site"),
            description: String::from("Site description"),
            default_image: String::from("/default.png"),
            site_url: Url::parse("https://example.org/").unwrap(),
            site_language: String::from("en"),
            site_locale: String::from("en_US"),
            author_name: None,
            designation: None,
            twitter_username: None,
            github_username: None,
            linkedin_username: None,
        }
    }

    fn catalog() -> Catalog {
        let documents = vec![
            ("blog/jan.md", "2021-01-01", vec!["react", "unknowntag123"], None),
            ("blog/feb.md", "2021-02-01", vec!["python"], Some("/feb.png")),
            ("blog/mar.md", "2021-03-01", vec!["react", "react"], None),
        ];
        let slugged = documents
            .into_iter()
            .map(|(id, date, tags, cover)| {
                let mut document = Document::fixture(id, date);
                document.tags = tags.into_iter().map(String::from).collect();
                document.cover = cover.map(String::from);
                document.excerpt = format!("Excerpt of {}", id);
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
    fn test_listing() {
        let listing = catalog().listing();
        let slugs: Vec<&str> = listing.iter().map(|i| i.slug.as_str()).collect();
        assert_eq!(vec!["mar", "feb", "jan"], slugs);

        let jan = &listing[2];
        assert_eq!("https://example.org/blog/jan/", jan.url.as_str());
        assert_eq!("Excerpt of blog/jan.md", jan.excerpt);
        assert_eq!(None, jan.cover);
        let icons: Vec<(&str, &str)> = jan
            .tags
            .iter()
            .map(|t| (t.name.as_str(), t.icon.key()))
            .collect();
        assert_eq!(
            vec![("react", "react"), ("unknowntag123", "generic")],
            icons
        );

        assert_eq!(
            Some("https://example.org/feb.png"),
            listing[1].cover.as_ref().map(Url::as_str)
        );
        assert_eq!(1, listing[0].tags.len());
    }

    #[test]
    fn test_detail_links_neighbors() {
        let catalog = catalog();
        let feb = catalog.detail("blog/feb.md").unwrap();

        let previous = feb.previous.unwrap();
        assert_eq!("jan", previous.slug.as_str());
        assert_eq!("https://example.org/blog/jan/", previous.url.as_str());
        assert_eq!("mar", feb.next.unwrap().slug.as_str());

        let mar = catalog.detail("blog/mar.md").unwrap();
        assert_eq!(None, mar.next);
        assert_eq!(0, mar.rank);

        let jan = catalog.detail("blog/jan.md").unwrap();
        assert_eq!(None, jan.previous);
        assert_eq!("Excerpt of blog/jan.md", jan.metadata.description);

        assert_eq!(None, catalog.detail("blog/nope.md"));
    }

    #[test]
    fn test_tag_listing_is_chronological() -> Result<(), ParseError> {
        let catalog = catalog();
        let react: Vec<String> = catalog
            .tag_listing("react")
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(vec!["blog/mar.md", "blog/jan.md"], react);
        assert!(catalog.tag_listing("missing").is_empty());
        assert_eq!(
            "https://example.org/blog/tags/react/",
            catalog.tag_url(catalog.tags().get("react").unwrap())?.as_str()
        );
        Ok(())
    }

    #[test]
    fn test_details_cover_every_document() {
        let catalog = catalog();
        assert_eq!(3, catalog.details().len());
        assert_eq!(3, catalog.all_metadata().count());
        assert_eq!("https://example.org/blog/", catalog.url().as_str());
    }
}
