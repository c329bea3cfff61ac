//! Defines the [`Tag`] and [`Icon`] types and the [`aggregate`] function which
//! indexes documents by tag.

use crate::document::Document;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::hash::{Hash, Hasher};

/// The icon key that unknown tags resolve to.
pub const FALLBACK_ICON_KEY: &str = "generic";

/// The icons a tag can be displayed with. Tags are free text, so anything
/// without a dedicated icon gets [`Icon::Generic`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Icon {
    Android,
    ChevronLeft,
    ChevronRight,
    Css,
    Django,
    Docker,
    Flask,
    Gatsby,
    Git,
    Github,
    Html,
    Java,
    Javascript,
    Jquery,
    Linkedin,
    Node,
    Python,
    React,
    Rust,
    Spring,
    Twitter,
    Typescript,
    Generic,
}

impl Icon {
    /// Resolves the icon for a tag. Matching is exact.
    pub fn for_tag(tag: &str) -> Icon {
        match tag {
            "android" => Icon::Android,
            "chevleft" => Icon::ChevronLeft,
            "chevright" => Icon::ChevronRight,
            "css" => Icon::Css,
            "django" => Icon::Django,
            "docker" => Icon::Docker,
            "flask" => Icon::Flask,
            "gatsby" => Icon::Gatsby,
            "git" => Icon::Git,
            "github" => Icon::Github,
            "html" => Icon::Html,
            "java" => Icon::Java,
            "javascript" => Icon::Javascript,
            "jquery" => Icon::Jquery,
            "linkedin" => Icon::Linkedin,
            "node" => Icon::Node,
            "python" => Icon::Python,
            "react" => Icon::React,
            "rust" => Icon::Rust,
            "spring" => Icon::Spring,
            "twitter" => Icon::Twitter,
            "typescript" => Icon::Typescript,
            _ => Icon::Generic,
        }
    }

    /// The display key the renderer looks the icon up by.
    pub fn key(self) -> &'static str {
        match self {
            Icon::Android => "android",
            Icon::ChevronLeft => "chevleft",
            Icon::ChevronRight => "chevright",
            Icon::Css => "css",
            Icon::Django => "django",
            Icon::Docker => "docker",
            Icon::Flask => "flask",
            Icon::Gatsby => "gatsby",
            Icon::Git => "git",
            Icon::Github => "github",
            Icon::Html => "html",
            Icon::Java => "java",
            Icon::Javascript => "javascript",
            Icon::Jquery => "jquery",
            Icon::Linkedin => "linkedin",
            Icon::Node => "node",
            Icon::Python => "python",
            Icon::React => "react",
            Icon::Rust => "rust",
            Icon::Spring => "spring",
            Icon::Twitter => "twitter",
            Icon::Typescript => "typescript",
            Icon::Generic => FALLBACK_ICON_KEY,
        }
    }
}

impl Serialize for Icon {
    /// Serializes an [`Icon`] as its key.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// Represents a document tag together with the icon it is displayed with.
#[derive(Clone, Debug, Serialize)]
pub struct Tag {
    /// The tag as authored.
    pub name: String,

    pub icon: Icon,
}

impl Tag {
    pub fn new(name: &str) -> Tag {
        Tag {
            name: name.to_owned(),
            icon: Icon::for_tag(name),
        }
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `name`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state)
    }
}

impl PartialEq for Tag {
    /// Implements [`PartialEq`] and [`Eq`] for [`Tag`] by delegating directly
    /// to the `name` field.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Tag {}

/// The documents carrying one tag.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagEntry {
    pub icon: Icon,

    /// The path segment of the tag's listing, unique within a [`TagIndex`]
    /// and never empty.
    pub slug: String,

    /// Document ids in the order they were encountered, without duplicates.
    pub documents: Vec<String>,
}

/// Maps each tag to its [`TagEntry`]. Tags iterate in lexicographic order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TagIndex(BTreeMap<String, TagEntry>);

impl TagIndex {
    pub fn get(&self, tag: &str) -> Option<&TagEntry> {
        self.0.get(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TagEntry)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Indexes `documents` by tag. The result depends only on the documents and
/// their order.
pub fn aggregate<'a>(documents: impl IntoIterator<Item = &'a Document>) -> TagIndex {
    let mut index: BTreeMap<String, TagEntry> = BTreeMap::new();
    let mut seen: HashSet<(&'a str, &'a str)> = HashSet::new();

    for document in documents {
        for tag in &document.tags {
            if !seen.insert((tag.as_str(), document.id.as_str())) {
                continue;
            }
            index
                .entry(tag.clone())
                .or_insert_with(|| {
                    let icon = Icon::for_tag(tag);
                    if icon == Icon::Generic {
                        tracing::debug!(%tag, "no icon for tag, using `{}`", FALLBACK_ICON_KEY);
                    }
                    TagEntry {
                        icon,
                        slug: String::new(),
                        documents: Vec::new(),
                    }
                })
                .documents
                .push(document.id.clone());
        }
    }

    assign_slugs(&mut index);
    TagIndex(index)
}

/// Gives every tag a distinct listing slug. Tags are visited in
/// lexicographic order; a tag whose slug is already taken gets the first free
/// `-2`, `-3`, ... suffix.
fn assign_slugs(index: &mut BTreeMap<String, TagEntry>) {
    let mut taken: HashSet<String> = HashSet::with_capacity(index.len());
    for (tag, entry) in index.iter_mut() {
        let base = tag_slug(tag);
        let mut slug = base.clone();
        let mut n = 2;
        while taken.contains(&slug) {
            slug = format!("{}-{}", base, n);
            n += 1;
        }
        if slug != base {
            tracing::warn!(%tag, %slug, "tag slug `{}` is taken", base);
        }
        taken.insert(slug.clone());
        entry.slug = slug;
    }
}

/// Slugifies a tag. Tags with nothing to slugify, like `#`, are spelled out
/// as the hex of their bytes.
fn tag_slug(tag: &str) -> String {
    let slug = ::slug::slugify(tag);
    if !slug.is_empty() {
        return slug;
    }
    let hex: String = tag.bytes().map(|b| format!("{:02x}", b)).collect();
    match hex.is_empty() {
        true => String::from("tag"),
        false => format!("tag-{}", hex),
    }
}
