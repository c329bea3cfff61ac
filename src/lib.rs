//! The library code for `folio`, the content engine behind a personal blog
//! and portfolio site. It turns a directory of authored documents into the
//! records a renderer needs, in three steps:
//!
//! 1. Loading documents from the content directory ([`crate::document`])
//! 2. Assembling each collection ([`crate::build::assemble`])
//! 3. Writing the assembled collections to disk ([`crate::write`])
//!
//! The second step does the real work. For each collection, every document
//! gets a unique slug ([`crate::slug`]), the collection is ordered newest
//! first and each document is linked to its neighbours ([`crate::index`]),
//! tags are aggregated with their icons ([`crate::tag`]), and each document's
//! SEO metadata is resolved against the site defaults
//! ([`crate::metadata`]). The result is a [`crate::view::Catalog`], from which
//! listing pages, detail payloads, and the Atom feed ([`crate::feed`]) are
//! derived.
//!
//! Per-document problems never stop a build; they are collected into the
//! [`crate::build::BuildReport`]. A slug collision stops its collection, and
//! the report then marks the build as failed.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod document;
pub mod feed;
pub mod index;
pub mod metadata;
pub mod page;
pub mod slug;
pub mod tag;
pub mod view;
pub mod write;
