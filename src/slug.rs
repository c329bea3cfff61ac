//! Defines the [`Slug`] type and slug assignment for a collection.

use crate::document::{Document, InvalidDocument};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};

/// The path of a document's detail page within its collection. Always
/// lowercase, `/`-separated, with no leading or trailing slash and no empty
/// segments.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Normalizes an explicit slug into canonical form. `.` and `..`
    /// segments are rejected so a slug can never leave its collection.
    pub fn normalize(explicit: &str) -> std::result::Result<Slug, Rejected> {
        let segments: Vec<String> = explicit
            .split(|c: char| c == '/' || c == '\\')
            .map(|segment| segment.trim().to_lowercase())
            .collect();
        if let Some(dots) = segments.iter().find(|s| *s == "." || *s == "..") {
            return Err(Rejected::DotSegment(dots.clone()));
        }
        Slug::from_segments(segments.into_iter())
    }

    /// Derives a slug from a source path by stripping the collection
    /// directory and the file extension, dropping the `index` file name of a
    /// bundle, and slugifying each remaining segment.
    pub fn derive(
        source_path: &Path,
        collection: &str,
    ) -> std::result::Result<Slug, Rejected> {
        let mut segments: Vec<String> = source_path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if segments.first().map(String::as_str) == Some(collection) {
            segments.remove(0);
        }
        if let Some(last) = segments.pop() {
            let stem = Path::new(&last)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or(last);
            if stem != "index" || segments.is_empty() {
                segments.push(stem);
            }
        }

        Slug::from_segments(segments.iter().map(|s| ::slug::slugify(s)))
    }

    fn from_segments(
        segments: impl Iterator<Item = String>,
    ) -> std::result::Result<Slug, Rejected> {
        let segments: Vec<String> =
            segments.filter(|segment| !segment.is_empty()).collect();
        match segments.as_slice() {
            [] => Err(Rejected::Empty),
            [first, ..] if first == TAGS_SEGMENT => {
                Err(Rejected::Reserved(first.clone()))
            }
            [only] if only.chars().all(|c| c.is_ascii_digit()) => {
                Err(Rejected::Reserved(only.clone()))
            }
            _ => Ok(Slug(segments.join("/"))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Tag listings live at `{collection}/tags/`, so no slug may start there.
/// Listing pages live at `{collection}/{n}/`, so no slug may be a bare
/// number.
const TAGS_SEGMENT: &str = "tags";

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Why a document could not be given a slug.
#[derive(Clone, Debug, PartialEq)]
pub enum Rejected {
    /// Nothing was left after normalizing.
    Empty,

    /// The explicit slug contains a `.` or `..` segment.
    DotSegment(String),

    /// The slug would start with a segment used by listing pages or tag
    /// listings.
    Reserved(String),
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rejected::Empty => write!(f, "slug is empty"),
            Rejected::DotSegment(segment) => {
                write!(f, "slug contains a `{}` segment", segment)
            }
            Rejected::Reserved(segment) => write!(
                f,
                "slug starts with `{}`, which is reserved for listing pages",
                segment
            ),
        }
    }
}

/// A document paired with its assigned slug.
#[derive(Clone, Debug, PartialEq)]
pub struct Slugged {
    pub slug: Slug,
    pub document: Document,
}

/// Assigns a slug to a single document: the explicit frontmatter slug if
/// present, otherwise one derived from the source path.
pub fn assign(document: &Document) -> std::result::Result<Slug, InvalidDocument> {
    let slug = match &document.slug {
        Some(explicit) => Slug::normalize(explicit),
        None => Slug::derive(&document.source_path, &document.collection),
    };
    slug.map_err(|rejected| InvalidDocument {
        source: document.id.clone(),
        collection: Some(document.collection.clone()),
        field: Some("slug"),
        reason: rejected.to_string(),
    })
}

/// The outcome of assigning slugs to a collection without collisions.
#[derive(Debug, Default)]
pub struct Assigned {
    pub documents: Vec<Slugged>,

    /// Documents that could not be given a slug.
    pub invalid: Vec<InvalidDocument>,
}

/// Assigns slugs to every document of `collection` and checks that they are
/// unique. Any shared slug fails the whole collection with a
/// [`SlugCollision`] naming every conflicting document.
pub fn assign_collection(
    collection: &str,
    documents: Vec<Document>,
) -> Result<Assigned> {
    let mut assigned = Assigned::default();
    for document in documents {
        match assign(&document) {
            Ok(slug) => assigned.documents.push(Slugged { slug, document }),
            Err(invalid) => assigned.invalid.push(invalid),
        }
    }

    let mut sources: BTreeMap<&Slug, Vec<String>> = BTreeMap::new();
    for slugged in &assigned.documents {
        sources
            .entry(&slugged.slug)
            .or_default()
            .push(slugged.document.id.clone());
    }
    let collisions: Vec<Collision> = sources
        .into_iter()
        .filter(|(_, sources)| sources.len() > 1)
        .map(|(slug, mut sources)| {
            sources.sort();
            Collision {
                slug: slug.clone(),
                sources,
            }
        })
        .collect();

    match collisions.is_empty() {
        true => Ok(assigned),
        false => Err(SlugCollision {
            collection: collection.to_owned(),
            collisions,
        }),
    }
}

/// One slug shared by more than one document.
#[derive(Clone, Debug, PartialEq)]
pub struct Collision {
    pub slug: Slug,

    /// The ids of the documents sharing the slug, sorted.
    pub sources: Vec<String>,
}

/// Returned when documents in one collection resolve to the same slug.
#[derive(Clone, Debug, PartialEq)]
pub struct SlugCollision {
    pub collection: String,
    pub collisions: Vec<Collision>,
}

impl fmt::Display for SlugCollision {
    /// Displays a [`SlugCollision`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "slug collision in collection `{}`:", self.collection)?;
        for collision in &self.collisions {
            write!(
                f,
                " `{}` is claimed by {}.",
                collision.slug,
                collision
                    .sources
                    .iter()
                    .map(|s| format!("`{}`", s))
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for SlugCollision {}

/// The result of assigning slugs to a collection.
pub type Result<T> = std::result::Result<T, SlugCollision>;

#[cfg(test)]
mod test {
    use super::*;

    fn document(id: &str, collection: &str, slug: Option<&str>) -> Document {
        let mut document = Document::fixture(id, "2021-01-01");
        assert_eq!(collection, document.collection);
        document.slug = slug.map(str::to_owned);
        document
    }

    #[test]
    fn test_normalize_explicit() {
        let wanted = Ok(Slug(String::from("rating-predictor")));
        assert_eq!(wanted, Slug::normalize("/Rating-Predictor/"));
        assert_eq!(wanted, Slug::normalize("rating-predictor"));
        assert_eq!(
            Ok(Slug(String::from("2021/hello"))),
            Slug::normalize("\\2021//Hello\\")
        );
        assert_eq!(Err(Rejected::Empty), Slug::normalize(" / "));
    }

    #[test]
    fn test_dot_segments_are_rejected() {
        assert_eq!(
            Err(Rejected::DotSegment(String::from(".."))),
            Slug::normalize("../../../escaped")
        );
        assert_eq!(
            Err(Rejected::DotSegment(String::from(".."))),
            Slug::normalize("a/../b")
        );
        assert_eq!(
            Err(Rejected::DotSegment(String::from("."))),
            Slug::normalize("./a")
        );
        assert_eq!(
            Ok(Slug(String::from("a..b"))),
            Slug::normalize("a..b")
        );
    }

    #[test]
    fn test_listing_segments_are_reserved() {
        assert_eq!(
            Err(Rejected::Reserved(String::from("1"))),
            Slug::derive(Path::new("blog/1.md"), "blog")
        );
        assert_eq!(
            Err(Rejected::Reserved(String::from("tags"))),
            Slug::normalize("Tags/rust")
        );
        assert_eq!(
            Ok(Slug(String::from("2021/recap"))),
            Slug::derive(Path::new("blog/2021/recap.md"), "blog")
        );
        assert_eq!(
            Ok(Slug(String::from("tagsoup"))),
            Slug::normalize("tagsoup")
        );
        assert_eq!(
            Ok(Slug(String::from("1st-post"))),
            Slug::derive(Path::new("blog/1st post.md"), "blog")
        );
    }

    #[test]
    fn test_derive_from_source_path() {
        let derive = |path: &str| {
            Slug::derive(Path::new(path), "blog")
                .ok()
                .map(|s| s.as_str().to_owned())
        };
        assert_eq!(Some("hello-world".to_owned()), derive("blog/hello-world.md"));
        assert_eq!(Some("hello-world".to_owned()), derive("blog/Hello World.md"));
        assert_eq!(Some("third-post".to_owned()), derive("blog/third-post/index.md"));
        assert_eq!(Some("index".to_owned()), derive("blog/index.md"));
    }

    #[test]
    fn test_explicit_slug_wins() {
        let doc = document("projects/a.md", "projects", Some("Intro"));
        assert_eq!("intro", assign(&doc).unwrap().as_str());
    }

    #[test]
    fn test_empty_slug_is_invalid() {
        let doc = document("blog/a.md", "blog", Some("///"));
        let invalid = assign(&doc).unwrap_err();
        assert_eq!(Some("slug"), invalid.field);
        assert_eq!("blog/a.md", invalid.source);
    }

    #[test]
    fn test_collision_names_both_sources() {
        let result = assign_collection(
            "projects",
            vec![
                document("projects/b.md", "projects", Some("intro")),
                document("projects/a.md", "projects", Some("intro")),
                document("projects/c.md", "projects", None),
            ],
        );
        assert_eq!(
            Err(SlugCollision {
                collection: String::from("projects"),
                collisions: vec![Collision {
                    slug: Slug(String::from("intro")),
                    sources: vec![
                        String::from("projects/a.md"),
                        String::from("projects/b.md"),
                    ],
                }],
            }),
            result.map(|assigned| assigned.documents.len())
        );
    }

    #[test]
    fn test_derived_and_explicit_slugs_collide() {
        let result = assign_collection(
            "blog",
            vec![
                document("blog/hello.md", "blog", None),
                document("blog/other.md", "blog", Some("Hello")),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_dot_segment_slug_does_not_alias_another() -> Result<()> {
        let assigned = assign_collection(
            "blog",
            vec![
                document("blog/a.md", "blog", Some("a/../b")),
                document("blog/b.md", "blog", None),
            ],
        )?;
        let slugs: Vec<&str> =
            assigned.documents.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(vec!["b"], slugs);
        assert_eq!("blog/a.md", assigned.invalid[0].source);
        assert_eq!(Some("slug"), assigned.invalid[0].field);
        assert_eq!("slug contains a `..` segment", assigned.invalid[0].reason);
        Ok(())
    }

    #[test]
    fn test_unique_slugs() -> Result<()> {
        let assigned = assign_collection(
            "blog",
            vec![
                document("blog/a.md", "blog", None),
                document("blog/b.md", "blog", None),
                document("blog/c.md", "blog", Some("")),
            ],
        )?;
        let slugs: Vec<&str> =
            assigned.documents.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(vec!["a", "b"], slugs);
        assert_eq!(1, assigned.invalid.len());
        Ok(())
    }
}
