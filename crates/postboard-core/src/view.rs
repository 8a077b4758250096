//! The rendered post list and the surfaces that display it.
//!
//! A [`ViewState`] is always derived whole from one fetched collection.
//! Renderers turn it into text; [`HtmlRenderer`] goes through an askama
//! template, so stored content can never inject markup.

use askama::Template;

use crate::{
    post::{Post, PostDraft, PostId},
    PostboardError, PostboardResult,
};

/// Shown instead of an empty container.
pub const NO_POSTS_TEXT: &str = "No posts yet. Write the first one!";
/// Shown when the collection could not be loaded.
pub const LOAD_FAILED_TEXT: &str = "Failed to load posts. Check the backend server.";

/// One rendered post with its edit fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostBlock {
    pub id: PostId,
    pub title: String,
    pub body: String,
    /// Edit fields, pre-filled with the current values.
    pub edit: PostDraft,
}

impl From<&Post> for PostBlock {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id(),
            title: post.title.clone(),
            body: post.content.clone(),
            edit: post.to_draft(),
        }
    }
}

impl PostBlock {
    /// The label shown above the body, `[ID: <id>] <title>`.
    pub fn heading(&self) -> String {
        format!("[ID: {}] {}", self.id, self.title)
    }
}

/// Contents of the post list container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewState {
    /// Nothing rendered yet.
    #[default]
    Blank,
    /// The collection was empty.
    Empty,
    /// The collection could not be loaded.
    LoadFailed,
    Posts(Vec<PostBlock>),
}

impl ViewState {
    /// Render a fetched collection, in the order the server returned it.
    pub fn from_posts(posts: &[Post]) -> Self {
        if posts.is_empty() {
            return Self::Empty;
        }
        Self::Posts(posts.iter().map(PostBlock::from).collect())
    }

    pub fn blocks(&self) -> &[PostBlock] {
        match self {
            Self::Posts(blocks) => blocks,
            _ => &[],
        }
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Self::Empty => Some(NO_POSTS_TEXT),
            Self::LoadFailed => Some(LOAD_FAILED_TEXT),
            _ => None,
        }
    }

    pub fn block(&self, id: PostId) -> Option<&PostBlock> {
        self.blocks().iter().find(|block| block.id == id)
    }

    /// Edit fields of the block for `id`, as currently typed.
    pub fn edit_fields(&self, id: PostId) -> Option<&PostDraft> {
        self.block(id).map(|block| &block.edit)
    }

    pub fn edit_fields_mut(&mut self, id: PostId) -> Option<&mut PostDraft> {
        match self {
            Self::Posts(blocks) => blocks
                .iter_mut()
                .find(|block| block.id == id)
                .map(|block| &mut block.edit),
            _ => None,
        }
    }
}

/// Turns a view into displayable text.
pub trait Render {
    fn render(&self, view: &ViewState) -> PostboardResult<String>;
}

#[derive(Template)]
#[template(path = "post_list.html")]
struct PostListTemplate<'a> {
    /// Empty when the view has posts to show.
    placeholder: &'a str,
    blocks: &'a [PostBlock],
}

/// Renders the container as an HTML fragment. The template escapes
/// every interpolated value.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl Render for HtmlRenderer {
    fn render(&self, view: &ViewState) -> PostboardResult<String> {
        let template = PostListTemplate {
            placeholder: view.placeholder().unwrap_or_default(),
            blocks: view.blocks(),
        };
        let html = template
            .render()
            .map_err(|e| PostboardError::custom_error(format!("Unable to render posts: {e}")))?;
        Ok(html)
    }
}

/// Renders the container as boxed terminal text.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRenderer;

impl Render for TextRenderer {
    fn render(&self, view: &ViewState) -> PostboardResult<String> {
        if let Some(text) = view.placeholder() {
            return Ok(text.to_string());
        }
        Ok(view
            .blocks()
            .iter()
            .map(|block| Post::new(block.id, block.title.clone(), block.body.clone()).to_string())
            .collect::<Vec<String>>()
            .join("\n"))
    }
}

/// Owner of the post list container and of the user facing controls
/// around it: the creation form, notifications and confirmations.
///
/// Every call to [`Surface::replace`] overwrites the container whole.
pub trait Surface {
    fn replace(&mut self, view: ViewState);

    fn view(&self) -> &ViewState;

    fn view_mut(&mut self) -> &mut ViewState;

    /// Current values of the creation form.
    fn draft(&self) -> PostDraft;

    fn clear_draft(&mut self);

    /// Blocking notification.
    fn alert(&mut self, msg: &str);

    /// Blocking yes/no question.
    fn confirm(&mut self, msg: &str) -> bool;
}

/// A surface that keeps everything in memory and answers confirmations
/// with a fixed reply. Useful headless and in tests.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    pub view: ViewState,
    pub draft: PostDraft,
    pub alerts: Vec<String>,
    pub confirmations: Vec<String>,
    pub confirm_reply: bool,
    pub renders: usize,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self {
            view: ViewState::Blank,
            draft: PostDraft::default(),
            alerts: Vec::new(),
            confirmations: Vec::new(),
            confirm_reply: true,
            renders: 0,
        }
    }
}

impl MemorySurface {
    pub fn declining() -> Self {
        Self {
            confirm_reply: false,
            ..Self::default()
        }
    }
}

impl Surface for MemorySurface {
    fn replace(&mut self, view: ViewState) {
        self.view = view;
        self.renders += 1;
    }

    fn view(&self) -> &ViewState {
        &self.view
    }

    fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    fn draft(&self) -> PostDraft {
        self.draft.clone()
    }

    fn clear_draft(&mut self) {
        self.draft = PostDraft::default();
    }

    fn alert(&mut self, msg: &str) {
        self.alerts.push(msg.to_string());
    }

    fn confirm(&mut self, msg: &str) -> bool {
        self.confirmations.push(msg.to_string());
        self.confirm_reply
    }
}
