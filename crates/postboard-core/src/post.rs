//! This module defines the `Post` struct, the only entity on the board,
//! and the `PostDraft` sent to the server to create or edit one.

use crate::{PostboardError, PostboardResult};
use std::fmt::{Display, Formatter};
use textwrap::core::display_width;
use textwrap::{self, wrap};

/// Width of the text inside a rendered post box.
const CONTENT_WIDTH: usize = 50;

/// Server assigned identifier of a post. The client only ever reads it
/// back from a fetched collection to address updates and deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PostId(u64);

impl PostId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl Display for PostId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PostId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(PostId)
    }
}

/// A post as returned by the collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Post {
    id: PostId,
    pub title: String,
    pub content: String,
}

impl Post {
    /// Assemble a post from stored values. Only the server, which owns
    /// id assignment, should call this.
    pub fn new(id: PostId, title: String, content: String) -> Self {
        Post { id, title, content }
    }

    pub fn id(&self) -> PostId {
        self.id
    }

    /// The label shown above the content, `[ID: <id>] <title>`.
    pub fn heading(&self) -> String {
        format!("[ID: {}] {}", self.id, self.title)
    }

    /// The current values, used to pre-fill the edit fields.
    pub fn to_draft(&self) -> PostDraft {
        PostDraft {
            title: self.title.clone(),
            content: self.content.clone(),
        }
    }
}

/// Body of a create or update request. Carries no ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Both fields must be present before a post can be created.
    pub fn validate(&self) -> PostboardResult<()> {
        verify_title(&self.title)?;
        verify_content(&self.content)?;
        Ok(())
    }
}

fn verify_title(title: &str) -> PostboardResult<()> {
    if title.is_empty() {
        return Err(PostboardError::EmptyTitle.into());
    }
    Ok(())
}

fn verify_content(content: &str) -> PostboardResult<()> {
    if content.is_empty() {
        return Err(PostboardError::EmptyContent.into());
    }
    Ok(())
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:-<54}\n", "")?;
        let heading_config = textwrap::Options::new(CONTENT_WIDTH).break_words(true);
        for line in wrap(&self.heading(), heading_config) {
            let whitespace = CONTENT_WIDTH.saturating_sub(display_width(&line));
            write!(f, "| {}{} |\n", line, " ".repeat(whitespace))?;
        }
        write!(f, "| {:50} |\n", "")?;
        let wrapping_config = textwrap::Options::new(CONTENT_WIDTH).break_words(true);
        for line in wrap(&self.content, wrapping_config) {
            let whitespace = CONTENT_WIDTH.saturating_sub(display_width(&line));
            write!(f, "| {}{} |\n", line, " ".repeat(whitespace))?;
        }
        write!(f, "{:-<54}", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_includes_id_and_title() {
        let post = Post::new(PostId::new(1), "A".into(), "x".into());
        assert_eq!(post.heading(), "[ID: 1] A");
    }

    #[test]
    fn draft_validation_rejects_empty_fields() {
        let err = PostDraft::new("", "body").validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PostboardError>(),
            Some(PostboardError::EmptyTitle)
        ));

        let err = PostDraft::new("title", "").validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PostboardError>(),
            Some(PostboardError::EmptyContent)
        ));

        assert!(PostDraft::new("title", "body").validate().is_ok());
    }

    #[test]
    fn post_deserializes_integer_id() {
        let posts: Vec<Post> =
            serde_json::from_str(r#"[{"id": 7, "title": "T", "content": "C"}]"#).unwrap();
        assert_eq!(posts[0].id(), PostId::new(7));
        assert_eq!(posts[0].title, "T");
    }

    #[test]
    fn post_formatting_using_display() {
        let post = Post::new(
            PostId::new(0),
            String::from("First Post"),
            String::from("This is a demo post with emojis to test formatting 😃😃 and a long tail of words"),
        );
        let rendered = format!("{}", post);
        assert!(rendered.contains("[ID: 0] First Post"));
        for line in rendered.lines() {
            assert!(display_width(line) <= 54, "line too wide: {line}");
        }
    }
}
