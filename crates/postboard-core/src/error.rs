use thiserror::Error;

pub type PostboardResult<T> = anyhow::Result<T>;

#[derive(Error, Debug)]
pub enum PostboardError {
    /// An empty title was provided for the post.
    #[error("Title cannot be empty")]
    EmptyTitle,
    /// An empty content was provided for the post.
    #[error("Content cannot be empty")]
    EmptyContent,
    /// The server answered with a non-success status.
    #[error("Server responded with status {status}")]
    Status { status: u16 },
    /// The request never produced a response.
    #[error("Request failed: {msg}")]
    Request { msg: String },
    /// The response body could not be decoded.
    #[error("Unable to decode response: {msg}")]
    Decode { msg: String },
    /// No post is registered in the current view with the given ID.
    #[error("Post {id} is not part of the current view")]
    UnknownPost { id: u64 },
    #[error("Config error: {msg}")]
    ConfigError { msg: String },
    /// Custom Error type for errors not covered by the above errors.
    #[error("{msg}")]
    CustomError { msg: String },
}

impl PostboardError {
    pub fn custom_error(msg: String) -> Self {
        Self::CustomError { msg }
    }

    pub fn config_error(msg: String) -> Self {
        Self::ConfigError { msg }
    }
}

impl From<reqwest::Error> for PostboardError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            Self::Decode {
                msg: err.to_string(),
            }
        } else {
            Self::Request {
                msg: err.to_string(),
            }
        }
    }
}
