//! Ghost export reader.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read Ghost export ({path}): {error}")]
    Read {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("failed to parse Ghost export ({path}): {error}")]
    Parse {
        path: PathBuf,
        error: serde_json::Error,
    },
    #[error("Ghost export has no database section")]
    MissingDatabase,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
}

/// One blog entry as it appears in the export.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Post {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub feature_image: Option<String>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Post {
    pub fn html(&self) -> &str {
        self.html.as_deref().unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct Export {
    db: Vec<Database>,
}

#[derive(Deserialize)]
struct Database {
    data: Data,
}

#[derive(Deserialize)]
struct Data {
    #[serde(default)]
    posts: Vec<Post>,
}

pub fn parse(src: &str, path: &Path) -> Result<Vec<Post>, Error> {
    let export = serde_json::from_str::<Export>(src).map_err(|error| Error::Parse {
        path: path.to_owned(),
        error,
    })?;
    export
        .db
        .into_iter()
        .next()
        .map(|db| db.data.posts)
        .ok_or(Error::MissingDatabase)
}

pub async fn load(path: &Path) -> Result<Vec<Post>, Error> {
    let src = tokio::fs::read_to_string(path)
        .await
        .map_err(|error| Error::Read {
            path: path.to_owned(),
            error,
        })?;
    parse(&src, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_posts_from_first_database() {
        let src = r#"{
            "db": [{
                "data": {
                    "posts": [
                        {
                            "title": "Hello",
                            "slug": "hello",
                            "html": "<p>hi</p>",
                            "published_at": "2020-01-01T00:00:00.000Z",
                            "tags": [{"name": "news"}],
                            "authors": [{"name": "Ann"}],
                            "status": "published",
                            "url": "/hello/"
                        },
                        { "title": "Bare", "slug": "bare", "html": null }
                    ],
                    "tags": []
                }
            }]
        }"#;
        let posts = parse(src, Path::new("export.json")).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].tags, vec![Tag { name: "news".into() }]);
        assert_eq!(posts[0].html(), "<p>hi</p>");
        assert_eq!(posts[1].html(), "");
        assert!(posts[1].authors.is_empty());
    }

    #[test]
    fn empty_database_list_is_an_error() {
        let err = parse(r#"{"db": []}"#, Path::new("export.json")).unwrap_err();
        assert!(matches!(err, Error::MissingDatabase));
    }
}
