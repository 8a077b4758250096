use clap::{ArgAction, Parser, Subcommand};
use postboard_core::prelude::*;
use std::io::{BufRead, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(author, version, about, long_about=None)]
struct Cli {
    #[arg(short, long, value_name = "FILE")]
    /// Path to config file; defaults to ~/.postboard/postboard.toml
    config: Option<PathBuf>,

    #[arg(short, long, value_name = "URL")]
    /// The posts endpoint. For ex, http://localhost:5000/api/posts
    api_base: Option<Url>,

    #[arg(long, action = ArgAction::SetTrue)]
    /// Render the post list as HTML instead of text
    html: bool,

    #[command(subcommand)]
    command: BoardCommand,
}

#[derive(Subcommand, Clone, Debug)]
enum BoardCommand {
    /// Show all posts
    List,

    /// Creates a new post with the given `title` and `content`
    NewPost {
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        content: Option<String>,
    },

    /// Edit a post; fields not given keep their current value
    UpdatePost {
        id: PostId,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        content: Option<String>,
    },

    DeletePost {
        id: PostId,
        #[arg(short, long, action = ArgAction::SetTrue)]
        /// Skip the confirmation
        yes: bool,
    },

    /// Interactive session
    Shell,
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Reload the post list
    #[command(alias = "list")]
    Refresh,
    /// Write a new post
    New,
    /// Edit the fields of a post and send them
    Edit { id: PostId },
    /// Delete a post
    Delete { id: PostId },
    #[command(alias = "exit")]
    Quit,
}

/// Prints every render of the post list to stdout and asks questions
/// on the terminal.
struct TerminalSurface {
    view: ViewState,
    draft: PostDraft,
    renderer: Box<dyn Render>,
    assume_yes: bool,
    quiet: bool,
}

impl TerminalSurface {
    fn new(html: bool) -> Self {
        let renderer: Box<dyn Render> = if html {
            Box::new(HtmlRenderer)
        } else {
            Box::new(TextRenderer)
        };
        Self {
            view: ViewState::Blank,
            draft: PostDraft::default(),
            renderer,
            assume_yes: false,
            quiet: false,
        }
    }
}

impl Surface for TerminalSurface {
    fn replace(&mut self, view: ViewState) {
        self.view = view;
        if !self.quiet {
            match self.renderer.render(&self.view) {
                Ok(text) => println!("{text}"),
                Err(e) => tracing::error!(error = %e, "unable to render posts"),
            }
        }
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
        eprintln!("! {msg}");
    }

    fn confirm(&mut self, msg: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        matches!(
            prompt_line(&format!("{msg} [y/N]: ")).ok().flatten().as_deref(),
            Some("y" | "Y" | "yes")
        )
    }
}

/// One line from `input`, without its line ending. `None` once the input
/// is exhausted (Ctrl-d).
fn read_prompt_line(input: &mut impl BufRead) -> std::io::Result<Option<String>> {
    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
}

fn prompt_line(prompt: &str) -> std::io::Result<Option<String>> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    read_prompt_line(&mut std::io::stdin().lock())
}

/// Like [`prompt_line`], but end of input is an error.
fn require_line(prompt: &str) -> std::io::Result<String> {
    prompt_line(prompt)?.ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "input ended")
    })
}

fn prompt_multiline(prompt: &str) -> std::io::Result<String> {
    println!("{prompt}(Press Ctrl-d on new line to end): ");
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf.replace('\n', " ").trim().into())
}

type Board = ListSynchronizer<HttpPostsApi, TerminalSurface>;

fn report(outcome: MutationOutcome) {
    match outcome {
        MutationOutcome::Applied { status } => tracing::debug!(status, "done"),
        MutationOutcome::Unbound { id } => eprintln!("ERROR: no post with ID {id} on the board"),
        other => tracing::debug!(?other, "finished"),
    }
}

/// Put `title`/`content` into the edit fields of post `id`, keeping the
/// pre-filled value for any field not given.
fn fill_edit_fields(board: &mut Board, id: PostId, title: Option<String>, content: Option<String>) {
    if let Some(fields) = board.surface_mut().view_mut().edit_fields_mut(id) {
        if let Some(title) = title {
            fields.title = title;
        }
        if let Some(content) = content {
            fields.content = content;
        }
    }
}

async fn shell(board: &mut Board) -> PostboardResult<()> {
    println!("Commands: refresh, new, edit <id>, delete <id>, quit");
    loop {
        let Some(line) = prompt_line("postboard> ")? else {
            println!();
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }
        let parsed = match ShellLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match parsed.command {
            ShellCommand::Refresh => {
                board.refresh().await;
            }
            ShellCommand::New => {
                let title = require_line("Enter post title: ")?;
                let content = require_line("Enter post content: ")?;
                board.surface_mut().draft = PostDraft::new(title, content);
                report(board.submit_create().await);
            }
            ShellCommand::Edit { id } => {
                let Some(current) = board.surface().view().edit_fields(id).cloned() else {
                    eprintln!("ERROR: no post with ID {id} on the board");
                    continue;
                };
                let title = require_line(&format!("Title [{}]: ", current.title))?;
                let content = require_line(&format!("Content [{}]: ", current.content))?;
                fill_edit_fields(
                    board,
                    id,
                    (!title.is_empty()).then_some(title),
                    (!content.is_empty()).then_some(content),
                );
                report(board.submit_update(id).await);
            }
            ShellCommand::Delete { id } => {
                report(board.dispatch(id, PostAction::Delete).await);
            }
            ShellCommand::Quit => return Ok(()),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = PostboardConfig::load(cli.config)?;
    if let Some(api_base) = cli.api_base {
        config = config.with_api_base(api_base);
    }

    let mut surface = TerminalSurface::new(cli.html);
    // Only the list after the change is shown for one-shot edits.
    surface.quiet = !matches!(cli.command, BoardCommand::List | BoardCommand::Shell);
    let mut board = ListSynchronizer::from_config(&config, surface)?;
    board.start().await;
    board.surface_mut().quiet = false;

    match cli.command {
        BoardCommand::List => {}
        BoardCommand::NewPost { title, content } => {
            let title = match title {
                Some(title) => title,
                None => require_line("Enter post title: ")?,
            };
            let content = match content {
                Some(content) => content,
                None => prompt_multiline("Enter post content")?,
            };
            board.surface_mut().draft = PostDraft::new(title, content);
            report(board.submit_create().await);
        }
        BoardCommand::UpdatePost { id, title, content } => {
            fill_edit_fields(&mut board, id, title, content);
            report(board.submit_update(id).await);
        }
        BoardCommand::DeletePost { id, yes } => {
            board.surface_mut().assume_yes = yes;
            report(board.dispatch(id, PostAction::Delete).await);
        }
        BoardCommand::Shell => shell(&mut board).await?,
    }

    Ok(())
}
