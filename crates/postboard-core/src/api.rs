//! Access to the posts REST collaborator.

use async_trait::async_trait;
use reqwest::{Client, Method};
use url::Url;

use crate::{
    config::PostboardConfig,
    post::{Post, PostDraft, PostId},
    PostboardError, PostboardResult,
};

/// Status line of a write request. The body is never read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteStatus(pub u16);

impl WriteStatus {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }
}

/// The four operations the board needs from the server.
///
/// `list` fails on transport errors, non-success statuses and
/// undecodable bodies alike. Writes only fail when no response arrived.
#[async_trait]
pub trait PostsApi {
    async fn list(&self) -> PostboardResult<Vec<Post>>;
    async fn create(&self, draft: &PostDraft) -> PostboardResult<WriteStatus>;
    async fn update(&self, id: PostId, draft: &PostDraft) -> PostboardResult<WriteStatus>;
    async fn delete(&self, id: PostId) -> PostboardResult<WriteStatus>;
}

/// `PostsApi` over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpPostsApi {
    client: Client,
    base: Url,
}

impl HttpPostsApi {
    pub fn new(config: &PostboardConfig) -> PostboardResult<Self> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PostboardError::config_error(e.to_string()))?;

        Ok(Self {
            client,
            base: config.api_base.clone(),
        })
    }

    /// `<base>/<id>`, regardless of a trailing slash on the base.
    pub fn post_url(&self, id: PostId) -> PostboardResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| PostboardError::config_error(format!("{} cannot be a base", self.base)))?
            .pop_if_empty()
            .push(&id.to_string());
        Ok(url)
    }

    async fn write(
        &self,
        method: Method,
        url: Url,
        draft: Option<&PostDraft>,
    ) -> PostboardResult<WriteStatus> {
        tracing::debug!(%method, %url, "sending write request");
        let mut request = self.client.request(method, url);
        if let Some(draft) = draft {
            request = request.json(draft);
        }
        let response = request.send().await.map_err(PostboardError::from)?;
        Ok(WriteStatus(response.status().as_u16()))
    }
}

#[async_trait]
impl PostsApi for HttpPostsApi {
    async fn list(&self) -> PostboardResult<Vec<Post>> {
        tracing::debug!(url = %self.base, "fetching posts");
        let response = self
            .client
            .get(self.base.clone())
            .send()
            .await
            .map_err(PostboardError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PostboardError::Status {
                status: status.as_u16(),
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(PostboardError::from)?;
        let posts = serde_json::from_slice::<Vec<Post>>(&bytes).map_err(|e| {
            PostboardError::Decode {
                msg: e.to_string(),
            }
        })?;
        Ok(posts)
    }

    async fn create(&self, draft: &PostDraft) -> PostboardResult<WriteStatus> {
        self.write(Method::POST, self.base.clone(), Some(draft)).await
    }

    async fn update(&self, id: PostId, draft: &PostDraft) -> PostboardResult<WriteStatus> {
        self.write(Method::PUT, self.post_url(id)?, Some(draft)).await
    }

    async fn delete(&self, id: PostId) -> PostboardResult<WriteStatus> {
        self.write(Method::DELETE, self.post_url(id)?, None).await
    }
}
