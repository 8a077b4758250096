//! Welcome to the documentation of Postboard. The board is a list of
//! posts kept by a REST server; this crate holds the client side: the
//! post types, the HTTP access to the server, the rendered view and the
//! [`sync::ListSynchronizer`] that reloads the whole list after every
//! change.
mod error;
pub mod api;
pub mod config;
pub mod handlers;
pub mod post;
pub mod sync;
pub mod view;

pub use error::{PostboardError, PostboardResult};

pub mod constant {
    pub const CONFIG_DIR: &str = ".postboard";
    pub const CONFIG_FILE: &str = "postboard.toml";
    pub const CONFIG_ENV: &str = "POSTBOARDCONF";
    pub const DB_FILE: &str = "postboard.db";
    pub const API_PATH: &str = "/api/posts";
    pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000/api/posts";
}

pub mod prelude {
    pub use crate::api::{HttpPostsApi, PostsApi, WriteStatus};
    pub use crate::config::PostboardConfig;
    pub use crate::handlers::{HandlerRegistry, PostAction};
    pub use crate::post::{Post, PostDraft, PostId};
    pub use crate::sync::{ListSynchronizer, MutationOutcome, RefreshOutcome};
    pub use crate::view::{HtmlRenderer, Render, Surface, TextRenderer, ViewState};
    pub use crate::{PostboardError, PostboardResult};
}
