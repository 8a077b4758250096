//! Keeps the rendered post list in line with the server.
//!
//! Every operation is a single request followed by a full reload of the
//! collection. Nothing is patched locally: after a refresh the view is
//! rebuilt from the fetched posts alone, and the per-post handlers are
//! re-registered from that view.
//!
//! Operations take `&mut self`, so one synchronizer runs them one at a
//! time. Separate synchronizers against the same server are not
//! coordinated; the view of each simply reflects its last refresh.

use std::fmt::Display;

use crate::{
    api::{HttpPostsApi, PostsApi, WriteStatus},
    config::PostboardConfig,
    handlers::{HandlerRegistry, PostAction},
    post::{PostDraft, PostId},
    view::{Surface, ViewState},
    PostboardResult,
};

pub const MISSING_FIELDS_ALERT: &str = "Please enter both a title and content.";

/// Result of a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The view now shows `count` posts (or the empty placeholder).
    Loaded { count: usize },
    /// The view now shows the load failure placeholder.
    Failed { reason: String },
}

/// Result of a create, update or delete. Always terminal: whatever
/// happened, the view has been refreshed unless no request was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied { status: u16 },
    /// The server answered with a non-success status.
    Rejected { status: u16 },
    /// No response arrived.
    Failed { reason: String },
    /// Input was incomplete; no request was sent.
    Invalid,
    /// The user declined the confirmation; no request was sent.
    Declined,
    /// The post is not part of the current view; no request was sent.
    Unbound { id: PostId },
}

impl MutationOutcome {
    pub fn sent_request(&self) -> bool {
        matches!(
            self,
            Self::Applied { .. } | Self::Rejected { .. } | Self::Failed { .. }
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Create,
    Update(PostId),
    Delete(PostId),
}

impl Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mutation::Create => write!(f, "create post"),
            Mutation::Update(id) => write!(f, "update post {id}"),
            Mutation::Delete(id) => write!(f, "delete post {id}"),
        }
    }
}

pub struct ListSynchronizer<A, S> {
    api: A,
    surface: S,
    handlers: HandlerRegistry,
}

impl<S: Surface> ListSynchronizer<HttpPostsApi, S> {
    /// Synchronizer talking HTTP to the endpoint named in `config`.
    pub fn from_config(config: &PostboardConfig, surface: S) -> PostboardResult<Self> {
        Ok(Self::new(HttpPostsApi::new(config)?, surface))
    }
}

impl<A: PostsApi, S: Surface> ListSynchronizer<A, S> {
    pub fn new(api: A, surface: S) -> Self {
        Self {
            api,
            surface,
            handlers: HandlerRegistry::default(),
        }
    }

    /// Initial render. Nothing is shown until this is called.
    pub async fn start(&mut self) -> RefreshOutcome {
        tracing::info!("starting post list");
        self.refresh().await
    }

    /// Fetch the whole collection and replace the view with it.
    pub async fn refresh(&mut self) -> RefreshOutcome {
        let (view, outcome) = match self.api.list().await {
            Ok(posts) => {
                tracing::debug!(count = posts.len(), "fetched posts");
                let count = posts.len();
                (ViewState::from_posts(&posts), RefreshOutcome::Loaded { count })
            }
            Err(e) => {
                tracing::error!(error = %e, "error fetching posts");
                (
                    ViewState::LoadFailed,
                    RefreshOutcome::Failed {
                        reason: e.to_string(),
                    },
                )
            }
        };
        self.handlers = HandlerRegistry::from_view(&view);
        self.surface.replace(view);
        outcome
    }

    /// Create a post, then refresh. Incomplete input is refused before
    /// any request is made.
    pub async fn create(&mut self, draft: PostDraft) -> MutationOutcome {
        if let Err(e) = draft.validate() {
            tracing::debug!(error = %e, "refusing incomplete post");
            self.surface.alert(MISSING_FIELDS_ALERT);
            return MutationOutcome::Invalid;
        }

        let result = self.api.create(&draft).await;
        self.surface.clear_draft();
        self.finish(Mutation::Create, result).await
    }

    /// Create a post from the values in the creation form.
    pub async fn submit_create(&mut self) -> MutationOutcome {
        let draft = self.surface.draft();
        self.create(draft).await
    }

    /// Send new values for post `id`, then refresh. Values are sent as
    /// given, without validation.
    pub async fn update(&mut self, id: PostId, draft: PostDraft) -> MutationOutcome {
        let result = self.api.update(id, &draft).await;
        self.finish(Mutation::Update(id), result).await
    }

    /// Update post `id` with whatever is in its edit fields.
    pub async fn submit_update(&mut self, id: PostId) -> MutationOutcome {
        self.dispatch(id, PostAction::Update).await
    }

    /// Delete post `id` after the user confirms, then refresh.
    pub async fn delete(&mut self, id: PostId) -> MutationOutcome {
        if !self
            .surface
            .confirm(&format!("Do you really want to delete post {id}?"))
        {
            tracing::debug!(%id, "delete declined");
            return MutationOutcome::Declined;
        }

        let result = self.api.delete(id).await;
        self.finish(Mutation::Delete(id), result).await
    }

    /// Run `action` through the handler registered for post `id`.
    pub async fn dispatch(&mut self, id: PostId, action: PostAction) -> MutationOutcome {
        if let Err(e) = self.handlers.resolve(id, action) {
            tracing::warn!(error = %e, ?action, "no handler registered");
            return MutationOutcome::Unbound { id };
        }

        match action {
            PostAction::Update => {
                let draft = self
                    .surface
                    .view()
                    .edit_fields(id)
                    .cloned()
                    .unwrap_or_default();
                self.update(id, draft).await
            }
            PostAction::Delete => self.delete(id).await,
        }
    }

    /// Write status is reported but never stops the refresh.
    async fn finish(
        &mut self,
        mutation: Mutation,
        result: PostboardResult<WriteStatus>,
    ) -> MutationOutcome {
        let outcome = match result {
            Ok(status) if status.is_success() => MutationOutcome::Applied { status: status.0 },
            Ok(status) => {
                tracing::warn!(%mutation, status = status.0, "write rejected by server");
                self.surface.alert(&format!(
                    "Could not {mutation}: server responded with status {}",
                    status.0
                ));
                MutationOutcome::Rejected { status: status.0 }
            }
            Err(e) => {
                tracing::warn!(%mutation, error = %e, "write request failed");
                self.surface.alert(&format!("Could not {mutation}: {e}"));
                MutationOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        self.refresh().await;
        outcome
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        post::Post,
        view::{MemorySurface, LOAD_FAILED_TEXT, NO_POSTS_TEXT},
        PostboardError,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        List,
        Create(PostDraft),
        Update(PostId, PostDraft),
        Delete(PostId),
    }

    /// Records every call and answers from a fixed script.
    struct FakeApi {
        calls: Mutex<Vec<Call>>,
        posts: Mutex<Vec<Post>>,
        list_fails: bool,
        write_status: u16,
        write_fails: bool,
    }

    impl FakeApi {
        fn with_posts(posts: Vec<Post>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                posts: Mutex::new(posts),
                list_fails: false,
                write_status: 200,
                write_fails: false,
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn write(&self, call: Call) -> PostboardResult<WriteStatus> {
            self.calls.lock().unwrap().push(call);
            if self.write_fails {
                return Err(PostboardError::Request {
                    msg: "connection refused".into(),
                }
                .into());
            }
            Ok(WriteStatus(self.write_status))
        }
    }

    #[async_trait]
    impl PostsApi for FakeApi {
        async fn list(&self) -> PostboardResult<Vec<Post>> {
            self.calls.lock().unwrap().push(Call::List);
            if self.list_fails {
                return Err(PostboardError::Status { status: 500 }.into());
            }
            Ok(self.posts.lock().unwrap().clone())
        }

        async fn create(&self, draft: &PostDraft) -> PostboardResult<WriteStatus> {
            self.write(Call::Create(draft.clone()))
        }

        async fn update(&self, id: PostId, draft: &PostDraft) -> PostboardResult<WriteStatus> {
            self.write(Call::Update(id, draft.clone()))
        }

        async fn delete(&self, id: PostId) -> PostboardResult<WriteStatus> {
            self.write(Call::Delete(id))
        }
    }

    fn post(id: u64, title: &str, content: &str) -> Post {
        Post::new(PostId::new(id), title.into(), content.into())
    }

    #[tokio::test]
    async fn refresh_renders_every_post_in_order() {
        let posts = vec![post(2, "B", "y"), post(1, "A", "x")];
        let mut sync = ListSynchronizer::new(FakeApi::with_posts(posts), MemorySurface::default());

        let outcome = sync.refresh().await;

        assert_eq!(outcome, RefreshOutcome::Loaded { count: 2 });
        let blocks = sync.surface().view.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].heading(), "[ID: 2] B");
        assert_eq!(blocks[0].body, "y");
        assert_eq!(blocks[1].heading(), "[ID: 1] A");
        assert_eq!(sync.handlers().len(), 2);
    }

    #[tokio::test]
    async fn single_post_scenario() {
        let api = FakeApi::with_posts(vec![post(1, "A", "x")]);
        let mut sync = ListSynchronizer::new(api, MemorySurface::default());

        sync.start().await;

        let blocks = sync.surface().view.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].heading(), "[ID: 1] A");
        assert_eq!(blocks[0].body, "x");
    }

    #[tokio::test]
    async fn empty_collection_shows_placeholder() {
        let mut sync =
            ListSynchronizer::new(FakeApi::with_posts(vec![]), MemorySurface::default());

        assert_eq!(sync.refresh().await, RefreshOutcome::Loaded { count: 0 });
        assert_eq!(sync.surface().view.placeholder(), Some(NO_POSTS_TEXT));
        assert!(sync.surface().view.blocks().is_empty());
    }

    #[tokio::test]
    async fn failed_load_replaces_previous_view() {
        let mut sync = ListSynchronizer::new(
            FakeApi::with_posts(vec![post(1, "A", "x")]),
            MemorySurface::default(),
        );
        sync.refresh().await;
        assert_eq!(sync.surface().view.blocks().len(), 1);

        sync.api.list_fails = true;
        let outcome = sync.refresh().await;

        assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
        assert_eq!(sync.surface().view.placeholder(), Some(LOAD_FAILED_TEXT));
        assert!(sync.surface().view.blocks().is_empty());
        assert!(sync.handlers().is_empty());
        assert!(sync.surface().alerts.is_empty());
    }

    #[tokio::test]
    async fn create_with_missing_field_sends_nothing() {
        let mut surface = MemorySurface::default();
        surface.draft = PostDraft::new("title only", "");
        let mut sync = ListSynchronizer::new(FakeApi::with_posts(vec![]), surface);

        assert_eq!(sync.submit_create().await, MutationOutcome::Invalid);
        assert_eq!(
            sync.create(PostDraft::new("", "body only")).await,
            MutationOutcome::Invalid
        );

        assert!(sync.api().calls().is_empty());
        assert_eq!(sync.surface().alerts, vec![MISSING_FIELDS_ALERT; 2]);
        assert_eq!(sync.surface().draft, PostDraft::new("title only", ""));
        assert_eq!(sync.surface().renders, 0);
    }

    #[tokio::test]
    async fn create_posts_then_refreshes_and_clears_form() {
        let mut surface = MemorySurface::default();
        surface.draft = PostDraft::new("T", "C");
        let mut sync = ListSynchronizer::new(FakeApi::with_posts(vec![]), surface);

        let outcome = sync.submit_create().await;

        assert_eq!(outcome, MutationOutcome::Applied { status: 200 });
        assert_eq!(
            sync.api().calls(),
            vec![Call::Create(PostDraft::new("T", "C")), Call::List]
        );
        assert_eq!(sync.surface().draft, PostDraft::default());
    }

    #[tokio::test]
    async fn failed_create_still_refreshes_and_clears_form() {
        let mut api = FakeApi::with_posts(vec![]);
        api.write_fails = true;
        let mut surface = MemorySurface::default();
        surface.draft = PostDraft::new("T", "C");
        let mut sync = ListSynchronizer::new(api, surface);

        let outcome = sync.submit_create().await;

        assert!(matches!(outcome, MutationOutcome::Failed { .. }));
        assert!(outcome.sent_request());
        assert_eq!(sync.api().calls().len(), 2);
        assert_eq!(sync.api().calls()[1], Call::List);
        assert_eq!(sync.surface().draft, PostDraft::default());
        assert_eq!(sync.surface().alerts.len(), 1);
    }

    #[tokio::test]
    async fn update_refreshes_even_when_rejected() {
        let mut api = FakeApi::with_posts(vec![post(1, "A", "x")]);
        api.write_status = 500;
        let mut sync = ListSynchronizer::new(api, MemorySurface::default());

        let outcome = sync.update(PostId::new(1), PostDraft::new("", "")).await;

        assert_eq!(outcome, MutationOutcome::Rejected { status: 500 });
        assert_eq!(
            sync.api().calls(),
            vec![
                Call::Update(PostId::new(1), PostDraft::new("", "")),
                Call::List
            ]
        );
        assert_eq!(sync.surface().alerts.len(), 1);
        assert!(sync.surface().alerts[0].contains("update post 1"));
        assert_eq!(sync.surface().view.blocks().len(), 1);
    }

    #[tokio::test]
    async fn submit_update_reads_edit_fields() {
        let api = FakeApi::with_posts(vec![post(1, "A", "x"), post(2, "B", "y")]);
        let mut sync = ListSynchronizer::new(api, MemorySurface::default());
        sync.refresh().await;

        let fields = sync
            .surface_mut()
            .view_mut()
            .edit_fields_mut(PostId::new(2))
            .unwrap();
        fields.title = "B2".into();

        let outcome = sync.submit_update(PostId::new(2)).await;

        assert_eq!(outcome, MutationOutcome::Applied { status: 200 });
        let calls = sync.api().calls();
        assert_eq!(
            calls[1..],
            [
                Call::Update(PostId::new(2), PostDraft::new("B2", "y")),
                Call::List
            ]
        );
    }

    #[tokio::test]
    async fn dispatch_ignores_posts_outside_the_view() {
        let api = FakeApi::with_posts(vec![post(1, "A", "x")]);
        let mut sync = ListSynchronizer::new(api, MemorySurface::default());
        sync.refresh().await;

        let outcome = sync.dispatch(PostId::new(9), PostAction::Delete).await;

        assert_eq!(outcome, MutationOutcome::Unbound { id: PostId::new(9) });
        assert_eq!(sync.api().calls(), vec![Call::List]);
        assert!(sync.surface().confirmations.is_empty());
    }

    #[tokio::test]
    async fn declined_delete_sends_nothing() {
        let api = FakeApi::with_posts(vec![post(1, "A", "x")]);
        let mut sync = ListSynchronizer::new(api, MemorySurface::declining());
        sync.refresh().await;
        let before = sync.surface().view.clone();

        let outcome = sync.delete(PostId::new(1)).await;

        assert_eq!(outcome, MutationOutcome::Declined);
        assert!(!outcome.sent_request());
        assert_eq!(sync.api().calls(), vec![Call::List]);
        assert_eq!(sync.surface().view, before);
        assert_eq!(sync.surface().renders, 1);
        assert!(sync.surface().confirmations[0].contains("post 1"));
    }

    #[tokio::test]
    async fn confirmed_delete_then_refresh() {
        let api = FakeApi::with_posts(vec![post(1, "A", "x")]);
        let mut sync = ListSynchronizer::new(api, MemorySurface::default());

        let outcome = sync.delete(PostId::new(1)).await;

        assert_eq!(outcome, MutationOutcome::Applied { status: 200 });
        assert_eq!(
            sync.api().calls(),
            vec![Call::Delete(PostId::new(1)), Call::List]
        );
        assert!(sync.surface().alerts.is_empty());
    }

    #[tokio::test]
    async fn server_error_on_load_shows_failure_text() {
        let mut server = mockito::Server::new_async().await;
        let list = server
            .mock("GET", "/api/posts")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let base = url::Url::parse(&format!("{}/api/posts", server.url())).unwrap();
        let config = PostboardConfig::default().with_api_base(base);
        let mut sync = ListSynchronizer::from_config(&config, MemorySurface::default()).unwrap();

        let outcome = sync.start().await;

        list.assert_async().await;
        assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
        assert_eq!(sync.surface().view, ViewState::LoadFailed);
        assert_eq!(sync.surface().view.placeholder(), Some(LOAD_FAILED_TEXT));
        assert!(sync.surface().view.blocks().is_empty());
        assert_eq!(sync.surface().renders, 1);
    }
}
