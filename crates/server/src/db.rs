use postboard_core::{
    constant::DB_FILE,
    post::{Post, PostDraft, PostId},
};
use rand::{thread_rng, Rng};
use sqlite::{Connection, State, Statement};
use std::path::PathBuf;

use crate::ServerError;

pub const POSTS_TABLE: &str = "posts";

pub fn setup_tables(conn: &Connection) -> anyhow::Result<()> {
    let statement = format!(
        "
        CREATE TABLE IF NOT EXISTS {POSTS_TABLE}
        (id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL);
    "
    );

    conn.execute(statement)?;

    Ok(())
}

/// Column names of `table_name`, in declaration order.
pub fn query_table_info(conn: &Connection, table_name: &str) -> anyhow::Result<Vec<String>> {
    let statement = format!("PRAGMA table_info({table_name});");

    let mut stmt = conn.prepare(statement)?;
    let mut columns = Vec::new();
    while let State::Row = stmt.next()? {
        columns.push(stmt.read::<String, _>("name")?);
    }

    Ok(columns)
}

fn parse_post(stmt: &Statement) -> anyhow::Result<Post> {
    let id = stmt.read::<i64, _>("id")?;
    let id = u64::try_from(id)
        .map_err(|_| ServerError::database_error(format!("Negative post ID in Db: {id}")))?;
    Ok(Post::new(
        PostId::new(id),
        stmt.read::<String, _>("title")?,
        stmt.read::<String, _>("content")?,
    ))
}

fn sqlite_id(id: PostId) -> anyhow::Result<i64> {
    i64::try_from(id.get())
        .map_err(|_| ServerError::database_error(format!("Post ID out of range: {id}")).into())
}

/// Insert a new post and return it with the ID sqlite assigned.
pub fn insert_post(conn: &Connection, draft: &PostDraft) -> anyhow::Result<Post> {
    let statement = format!("INSERT INTO {POSTS_TABLE} (title, content) VALUES (?, ?)");

    let mut stmt = conn.prepare(statement)?;
    stmt.bind((1, draft.title.as_str()))?;
    stmt.bind((2, draft.content.as_str()))?;
    while let State::Row = stmt.next()? {}

    let mut stmt = conn.prepare("SELECT last_insert_rowid() AS id")?;
    if let State::Done = stmt.next()? {
        return Err(ServerError::database_error("Unable to read inserted post ID".into()).into());
    }
    let id = stmt.read::<i64, _>("id")?;
    let id = u64::try_from(id)
        .map_err(|_| ServerError::database_error(format!("Negative post ID in Db: {id}")))?;

    Ok(Post::new(
        PostId::new(id),
        draft.title.clone(),
        draft.content.clone(),
    ))
}

/// All posts, oldest first.
pub fn query_posts(conn: &Connection) -> anyhow::Result<Vec<Post>> {
    let statement = format!("SELECT id, title, content FROM {POSTS_TABLE} ORDER BY id;");

    let mut stmt = conn.prepare(statement)?;
    let mut posts = Vec::new();
    while let State::Row = stmt.next()? {
        posts.push(parse_post(&stmt)?);
    }

    Ok(posts)
}

/// `None` when no post has `post_id`, including IDs sqlite cannot store.
pub fn query_post_by_id(conn: &Connection, post_id: PostId) -> anyhow::Result<Option<Post>> {
    let Ok(id) = i64::try_from(post_id.get()) else {
        return Ok(None);
    };
    let statement = format!("SELECT id, title, content FROM {POSTS_TABLE} WHERE id = ?");

    let mut stmt = conn.prepare(statement)?;
    stmt.bind((1, id))?;

    match stmt.next()? {
        State::Row => Ok(Some(parse_post(&stmt)?)),
        State::Done => Ok(None),
    }
}

pub fn update_post_by_id(conn: &Connection, post: &Post) -> anyhow::Result<()> {
    let statement = format!("UPDATE {POSTS_TABLE} SET title = ?, content = ? WHERE id = ?");

    let mut stmt = conn.prepare(statement)?;
    stmt.bind((1, post.title.as_str()))?;
    stmt.bind((2, post.content.as_str()))?;
    stmt.bind((3, sqlite_id(post.id())?))?;
    while let State::Row = stmt.next()? {}

    Ok(())
}

pub fn delete_post_by_id(conn: &Connection, post_id: PostId) -> anyhow::Result<()> {
    let statement = format!("DELETE FROM {POSTS_TABLE} WHERE id = ?");

    let mut stmt = conn.prepare(statement)?;
    stmt.bind((1, sqlite_id(post_id)?))?;
    while let State::Row = stmt.next()? {}

    Ok(())
}

/// path - Can be either a complete file path(with .db suffix) or
///        a directory name which will then be appended with default
///        db name. Without a path, the db lives in the temp directory.
pub fn resolve_db_path(path: Option<PathBuf>) -> PathBuf {
    match path {
        Some(inner_path) => {
            let is_db_file = inner_path
                .extension()
                .map_or(false, |extension| extension == "db");
            if inner_path.is_dir() || !is_db_file {
                inner_path.join(DB_FILE)
            } else {
                inner_path
            }
        }
        None => std::env::temp_dir().join(DB_FILE),
    }
}

/// Open (creating if needed) the db at `path` and make sure the posts
/// table exists.
pub fn setup_db(path: Option<PathBuf>) -> anyhow::Result<(Connection, PathBuf)> {
    let db_path = resolve_db_path(path);
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.try_exists()? {
            tracing::info!(dir = %parent.display(), "creating db directory");
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = sqlite::open(&db_path)?;
    setup_tables(&conn)?;
    tracing::info!(path = %db_path.display(), "db ready");

    Ok((conn, db_path))
}

/// Generates a random db name with four 16-bit fields, such that when generating
/// random numbers, the range of each 16 bit field is 0-65536. Hence,
/// each random db name is `prefix-xxxxx-xxxxx-xxxxx-xxxxx.db`
/// The generated digits are padded with zeroes to ensure standardised
/// length of each field.
pub fn generate_random_db_name() -> String {
    let mut buffer = [0u16; 4];
    thread_rng().fill(&mut buffer);
    let mut result = buffer
        .into_iter()
        .map(|val| format!("{:05}", val))
        .collect::<Vec<String>>()
        .join("-");
    result.insert_str(0, "postboard-");
    result.push_str(".db");
    result
}

pub fn generate_temp_db() -> PathBuf {
    std::env::temp_dir().join(generate_random_db_name())
}
