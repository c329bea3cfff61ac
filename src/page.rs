//! Splits listings into fixed-size pages.

use serde::Serialize;
use url::{ParseError, Url};

/// One page of a listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    /// Zero-based page number.
    pub number: usize,

    /// The total number of pages in the listing.
    pub total: usize,

    /// The public URL of this page.
    pub url: Url,

    /// The URL for the previous page, if any.
    pub prev: Option<Url>,

    /// The URL for the next page, if any.
    pub next: Option<Url>,

    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// The output file name of the page: `index.json` for the first page and
    /// `{number}.json` for the rest.
    pub fn file_name(&self) -> String {
        match self.number {
            0 => String::from("index.json"),
            n => format!("{}.json", n),
        }
    }
}

/// Returns the public URL of page `number` of a listing rooted at
/// `base_url`, which must end in `/`.
pub fn page_url(base_url: &Url, number: usize) -> Result<Url, ParseError> {
    match number {
        0 => Ok(base_url.clone()),
        n => base_url.join(&format!("{}/", n)),
    }
}

/// Splits `items` into pages of at most `page_size` items. An empty listing
/// still has one (empty) page so that its index exists.
pub fn paginate<T: Clone>(
    items: &[T],
    page_size: usize,
    base_url: &Url,
) -> Result<Vec<Page<T>>, ParseError> {
    let page_size = page_size.max(1);
    let total = match items.len() % page_size {
        0 => (items.len() / page_size).max(1),
        _ => items.len() / page_size + 1,
    };

    (0..total)
        .map(|number| {
            let start = number * page_size;
            let end = (start + page_size).min(items.len());
            Ok::<_, ParseError>(Page {
                number,
                total,
                url: page_url(base_url, number)?,
                prev: match number {
                    0 => None,
                    _ => Some(page_url(base_url, number - 1)?),
                },
                next: match number < total - 1 {
                    false => None,
                    true => Some(page_url(base_url, number + 1)?),
                },
                items: items[start..end].to_vec(),
            })
        })
        .collect()
}
