//! Defines the [`Config`] and [`SiteConfig`] types and the logic for loading
//! them from a `folio.yaml` project file.

use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "folio.yaml";

/// Site-wide metadata. This is read once at the start of a build and passed
/// by reference to whatever needs it (chiefly
/// [`crate::metadata::synthesize`]).
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct SiteConfig {
    /// The site title, used when a document has none.
    pub title: String,

    /// The site description, the last fallback for a document description.
    pub description: String,

    /// Path of the default social image, relative to `site_url`.
    pub default_image: String,

    /// The public base URL of the site, e.g. `https://example.org/`.
    pub site_url: Url,

    #[serde(default = "default_language")]
    pub site_language: String,

    #[serde(default = "default_locale")]
    pub site_locale: String,

    #[serde(default)]
    pub author_name: Option<String>,

    #[serde(default)]
    pub designation: Option<String>,

    #[serde(default)]
    pub twitter_username: Option<String>,

    #[serde(default)]
    pub github_username: Option<String>,

    #[serde(default)]
    pub linkedin_username: Option<String>,
}

fn default_language() -> String {
    String::from("en")
}

fn default_locale() -> String {
    String::from("en_US")
}

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

#[derive(Deserialize)]
struct Collections(Vec<String>);
impl Default for Collections {
    fn default() -> Self {
        Collections(vec![String::from("blog"), String::from("projects")])
    }
}

#[derive(Deserialize)]
struct Project {
    site: SiteConfig,

    #[serde(default)]
    content_directory: Option<PathBuf>,

    #[serde(default)]
    collections: Collections,

    #[serde(default)]
    page_size: PageSize,
}

/// The fully-resolved build configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Site-wide metadata.
    pub site: SiteConfig,

    /// The directory containing one sub-directory per collection.
    pub content_directory: PathBuf,

    /// The known collection names, in the order they are built.
    pub collections: Vec<String>,

    /// The number of items per listing page.
    pub page_size: usize,

    /// The directory into which the build output is written.
    pub output_directory: PathBuf,

    /// The number of worker threads used to load documents.
    pub threads: usize,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for a [`PROJECT_FILE`]
    /// and loads the first one found.
    pub fn from_directory(
        dir: &Path,
        output_directory: &Path,
        threads: Option<usize>,
    ) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.is_file() {
            Config::from_project_file(&path, output_directory, threads)
        } else {
            match dir.parent() {
                Some(parent) => {
                    Config::from_directory(parent, output_directory, threads)
                }
                None => Err(Error::NotFound),
            }
        }
    }

    /// Loads the project file at `path`. Relative directories in the file
    /// are resolved against the directory containing it.
    pub fn from_project_file(
        path: &Path,
        output_directory: &Path,
        threads: Option<usize>,
    ) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file)?;
        let project_root = path.parent().unwrap_or_else(|| Path::new("."));
        Config::from_project(project, project_root, output_directory, threads)
    }

    fn from_project(
        project: Project,
        project_root: &Path,
        output_directory: &Path,
        threads: Option<usize>,
    ) -> Result<Config> {
        if project.page_size.0 < 1 {
            return Err(Error::InvalidPageSize);
        }
        if project.collections.0.is_empty() {
            return Err(Error::NoCollections);
        }

        Ok(Config {
            site: project.site,
            content_directory: project_root.join(
                project
                    .content_directory
                    .unwrap_or_else(|| PathBuf::from("content")),
            ),
            collections: project.collections.0,
            page_size: project.page_size.0,
            output_directory: output_directory.to_owned(),
            threads: match threads {
                None => num_cpus::get(),
                Some(threads) => threads,
            },
        })
    }
}

/// The result of loading a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading a [`Config`].
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in the directory or any of its
    /// ancestors.
    NotFound,

    /// Returned when the project file exists but can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid YAML or is missing
    /// required fields.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when `page_size` is zero.
    InvalidPageSize,

    /// Returned when `collections` is an empty list.
    NoCollections,
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::Open { path, err } => {
                write!(f, "Opening project file '{}': {}", path.display(), err)
            }
            Error::DeserializeYaml(err) => {
                write!(f, "Loading configuration: {}", err)
            }
            Error::InvalidPageSize => {
                write!(f, "`page_size` must be at least 1")
            }
            Error::NoCollections => {
                write!(f, "`collections` must name at least one collection")
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound => None,
            Error::Open { path: _, err } => Some(err),
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidPageSize => None,
            Error::NoCollections => None,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}
