//! Chronological ordering of a collection and the previous/next links between
//! its documents.

use crate::document::Document;
use crate::slug::{Slug, Slugged};
use std::cmp::Ordering;

/// Orders documents newest first, breaking ties by ascending id so that
/// documents with the same date always come out in the same order.
pub fn chronological(a: &Document, b: &Document) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id))
}

/// A reference to a neighbouring document.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborRef {
    pub id: String,
    pub slug: Slug,
    pub title: String,
}

/// One side of a document's place in the chronological chain.
#[derive(Clone, Debug, PartialEq)]
pub enum Neighbor {
    /// The adjacent document.
    Document(NeighborRef),

    /// There is no document on this side: the chain ends here.
    End,
}

impl Neighbor {
    pub fn document(&self) -> Option<&NeighborRef> {
        match self {
            Neighbor::Document(neighbor) => Some(neighbor),
            Neighbor::End => None,
        }
    }

    fn of(slugged: Option<&Slugged>) -> Neighbor {
        match slugged {
            Some(s) => Neighbor::Document(NeighborRef {
                id: s.document.id.clone(),
                slug: s.slug.clone(),
                title: s.document.title.clone(),
            }),
            None => Neighbor::End,
        }
    }
}

/// A document in its chronological position.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// Position in the collection, `0` being the newest document.
    pub rank: usize,

    pub slug: Slug,
    pub document: Document,

    /// The next-older document.
    pub previous: Neighbor,

    /// The next-newer document.
    pub next: Neighbor,
}

/// A collection in chronological order. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Index {
    collection: String,
    entries: Vec<Entry>,
}

impl Index {
    /// Sorts `documents` with [`chronological`] and links each one to its
    /// neighbours.
    pub fn build(collection: &str, mut documents: Vec<Slugged>) -> Index {
        documents.sort_by(|a, b| chronological(&a.document, &b.document));

        let neighbors: Vec<(Neighbor, Neighbor)> = (0..documents.len())
            .map(|i| {
                let newer = match i {
                    0 => None,
                    _ => documents.get(i - 1),
                };
                let older = documents.get(i + 1);
                (Neighbor::of(older), Neighbor::of(newer))
            })
            .collect();

        let entries = documents
            .into_iter()
            .zip(neighbors)
            .enumerate()
            .map(|(rank, (slugged, (previous, next)))| Entry {
                rank,
                slug: slugged.slug,
                document: slugged.document,
                previous,
                next,
            })
            .collect();

        Index {
            collection: collection.to_owned(),
            entries,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The entries, newest first.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Looks an entry up by document id.
    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.document.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::slug;

    fn slugged(id: &str, date: &str) -> Slugged {
        let document = Document::fixture(id, date);
        Slugged {
            slug: slug::assign(&document).unwrap(),
            document,
        }
    }

    fn ids(index: &Index) -> Vec<&str> {
        index
            .entries()
            .iter()
            .map(|e| e.document.id.as_str())
            .collect()
    }

    fn neighbor_id(neighbor: &Neighbor) -> Option<&str> {
        neighbor.document().map(|n| n.id.as_str())
    }

    #[test]
    fn test_three_posts() {
        let index = Index::build(
            "blog",
            vec![
                slugged("blog/jan.md", "2021-01-01"),
                slugged("blog/mar.md", "2021-03-01"),
                slugged("blog/feb.md", "2021-02-01"),
            ],
        );

        assert_eq!(vec!["blog/mar.md", "blog/feb.md", "blog/jan.md"], ids(&index));

        let mar = &index.entries()[0];
        let feb = &index.entries()[1];
        let jan = &index.entries()[2];

        assert_eq!((0, 1, 2), (mar.rank, feb.rank, jan.rank));

        assert_eq!(Neighbor::End, mar.next);
        assert_eq!(Some("blog/feb.md"), neighbor_id(&mar.previous));

        assert_eq!(Some("blog/mar.md"), neighbor_id(&feb.next));
        assert_eq!(Some("blog/jan.md"), neighbor_id(&feb.previous));

        assert_eq!(Some("blog/feb.md"), neighbor_id(&jan.next));
        assert_eq!(Neighbor::End, jan.previous);
    }

    #[test]
    fn test_ties_break_by_id() {
        let index = Index::build(
            "blog",
            vec![
                slugged("blog/c.md", "2021-01-01"),
                slugged("blog/a.md", "2021-01-01"),
                slugged("blog/b.md", "2021-01-01"),
                slugged("blog/z.md", "2020-12-31"),
            ],
        );
        assert_eq!(
            vec!["blog/a.md", "blog/b.md", "blog/c.md", "blog/z.md"],
            ids(&index)
        );
        assert_eq!(Some("blog/a.md"), neighbor_id(&index.entries()[1].next));
    }

    #[test]
    fn test_order_is_independent_of_input_order() {
        let forward = vec![
            slugged("blog/a.md", "2021-01-01"),
            slugged("blog/b.md", "2021-01-01"),
            slugged("blog/c.md", "2021-06-01 10:00:00"),
        ];
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(Index::build("blog", forward), Index::build("blog", backward));
    }

    #[test]
    fn test_single_and_empty() {
        let single = Index::build("blog", vec![slugged("blog/only.md", "2021-01-01")]);
        assert_eq!(Neighbor::End, single.entries()[0].previous);
        assert_eq!(Neighbor::End, single.entries()[0].next);

        let empty = Index::build("blog", Vec::new());
        assert!(empty.is_empty());
        assert_eq!("blog", empty.collection());
    }

    #[test]
    fn test_neighbors_are_adjacent_everywhere() {
        let dates = [
            "2019-05-01", "2020-01-01", "2020-01-01", "2018-03-03", "2021-07-07",
            "2020-01-01",
        ];
        let documents = dates
            .iter()
            .enumerate()
            .map(|(i, date)| slugged(&format!("blog/post-{}.md", i), date))
            .collect();
        let index = Index::build("blog", documents);
        let entries = index.entries();

        for pair in entries.windows(2) {
            let (newer, older) = (&pair[0], &pair[1]);
            assert_ne!(
                Ordering::Greater,
                chronological(&newer.document, &older.document)
            );
            assert_eq!(Some(older.document.id.as_str()), neighbor_id(&newer.previous));
            assert_eq!(Some(newer.document.id.as_str()), neighbor_id(&older.next));
        }
        assert_eq!(
            Some(&entries[2].slug),
            index.get(&entries[2].document.id).map(|e| &e.slug)
        );
    }
}
