//! services/client/src/cli.rs
//!
//! The command-line surface: argument parsing and the commands that drive
//! the forum core. Each command returns the text to print.

use crate::error::ClientError;
use crate::state::AppState;
use campus_forum_core::article::publish_article;
use campus_forum_core::domain::{
    Article, ArticleId, Comment, CommentId, CommentTarget, FeedKind, NewArticle,
};
use campus_forum_core::error::ForumError;
use campus_forum_core::feed::Feed;
use campus_forum_core::thread::ArticleThread;
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write;

#[derive(Parser, Debug)]
#[command(author, version, about = "Command-line client for the campus forum")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in with a university e-mail address
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Register {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Submit the code from the validation e-mail
    Verify { code: String },
    /// Ask for a temporary password by e-mail
    ForgotPassword { email: String },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// List articles
    Feed {
        #[arg(long, value_enum, default_value_t = Sort::Recent)]
        sort: Sort,
        /// How many pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Search articles by keyword
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// List your own posted, commented, saved or liked articles
    Mine {
        #[arg(value_enum)]
        list: Collection,
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Show an article with its comments
    Show {
        article: i64,
        /// How many pages of comments to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
        /// Also load the replies of every comment
        #[arg(long)]
        replies: bool,
    },
    /// Like or unlike an article
    Like { article: i64 },
    /// Save or unsave an article
    Save { article: i64 },
    /// Publish a new article
    Post {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        /// Only visible to your own school
        #[arg(long)]
        own_school: bool,
        #[arg(long = "course")]
        courses: Vec<String>,
    },
    /// Edit one of your articles
    EditArticle {
        article: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
    },
    /// Delete one of your articles
    DeleteArticle { article: i64 },
    /// Comment on an article
    Comment { article: i64, body: String },
    /// Reply to a comment
    Reply { article: i64, parent: i64, body: String },
    /// Like or unlike a comment (pass --parent for a reply)
    LikeComment {
        article: i64,
        comment: i64,
        #[arg(long)]
        parent: Option<i64>,
    },
    /// Edit one of your comments (pass --parent for a reply)
    EditComment {
        article: i64,
        comment: i64,
        body: String,
        #[arg(long)]
        parent: Option<i64>,
    },
    /// Delete one of your comments (pass --parent for a reply)
    DeleteComment {
        article: i64,
        comment: i64,
        #[arg(long)]
        parent: Option<i64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Sort {
    Recent,
    Hot,
    Preference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Collection {
    Posted,
    Commented,
    Saved,
    Liked,
}

impl From<Sort> for FeedKind {
    fn from(sort: Sort) -> Self {
        match sort {
            Sort::Recent => FeedKind::Recent,
            Sort::Hot => FeedKind::Hot,
            Sort::Preference => FeedKind::Preference,
        }
    }
}

impl From<Collection> for FeedKind {
    fn from(list: Collection) -> Self {
        match list {
            Collection::Posted => FeedKind::Posted,
            Collection::Commented => FeedKind::Commented,
            Collection::Saved => FeedKind::Saved,
            Collection::Liked => FeedKind::Liked,
        }
    }
}

fn target(comment: i64, parent: Option<i64>) -> CommentTarget {
    match parent {
        Some(parent) => CommentTarget::Nested {
            parent: CommentId(parent),
            id: CommentId(comment),
        },
        None => CommentTarget::TopLevel(CommentId(comment)),
    }
}

//=========================================================================================
// Command Execution
//=========================================================================================

/// Runs one command and returns its printable output.
pub async fn run(command: Command, state: &AppState) -> Result<String, ClientError> {
    match command {
        Command::Login { email, password } => {
            let session = state.accounts.login(&email, &password).await?;
            if session.validated {
                Ok(format!("Signed in as user {} ({}).", session.user, session.initial))
            } else {
                Ok("Signed in. Check your inbox and run `forum verify <code>` \
                    to validate the account."
                    .to_string())
            }
        }
        Command::Register { email, password } => {
            state.accounts.register(&email, &password).await?;
            Ok("Account created. A validation code was sent to your inbox.".to_string())
        }
        Command::Verify { code } => {
            state.accounts.confirm_validation(&code).await?;
            Ok("Account validated.".to_string())
        }
        Command::ForgotPassword { email } => {
            state.accounts.forgot_password(&email).await?;
            Ok("A temporary password has been sent.".to_string())
        }
        Command::Logout => {
            state.accounts.logout().await?;
            Ok("Signed out.".to_string())
        }
        Command::Whoami => {
            let session = state.accounts.current().await?;
            Ok(format!(
                "user {} | school {} | {} points | {}",
                session.user,
                session.initial,
                session.points,
                if session.validated { "validated" } else { "not validated" }
            ))
        }
        Command::Feed { sort, pages } => list_feed(state, sort.into(), pages).await,
        Command::Search { query, pages } => list_feed(state, FeedKind::Search(query), pages).await,
        Command::Mine { list, pages } => list_feed(state, list.into(), pages).await,
        Command::Show { article, pages, replies } => {
            let thread = open(state, article).await?;
            for _ in 1..pages {
                if !load_more(thread.load_more_comments().await)? {
                    break;
                }
            }
            if replies {
                let parents: Vec<CommentId> = thread
                    .comments()
                    .threads()
                    .iter()
                    .filter(|t| t.comment.replies_count > 0)
                    .map(|t| t.comment.id)
                    .collect();
                for parent in parents {
                    thread.load_replies(parent).await?;
                }
            }
            Ok(render_thread(&thread))
        }
        Command::Like { article } => {
            let thread = open(state, article).await?;
            let article = thread.toggle_article_like().await?;
            let verb = if article.like_status { "Liked" } else { "Unliked" };
            Ok(format!("{} article {} ({} likes).", verb, article.id, article.likes_count))
        }
        Command::Save { article } => {
            let thread = open(state, article).await?;
            let article = thread.toggle_article_save().await?;
            let verb = if article.save_status { "Saved" } else { "Unsaved" };
            Ok(format!("{} article {}.", verb, article.id))
        }
        Command::Post { title, body, own_school, courses } => {
            let draft = NewArticle {
                title,
                body,
                own_school_only: own_school,
                course_codes: courses,
            };
            let article = publish_article(&state.executor, state.api.as_ref(), draft).await?;
            Ok(format!("Published article {}.", article.id))
        }
        Command::EditArticle { article, title, body } => {
            let thread = open(state, article).await?;
            thread.begin_article_edit()?;
            thread.update_article_edit(&title, &body);
            let article = thread.save_article_edit(&title, &body).await?;
            Ok(format!("Article {} updated.", article.id))
        }
        Command::DeleteArticle { article } => {
            let thread = open(state, article).await?;
            thread.delete_article().await?;
            Ok(format!("Article {} deleted.", article))
        }
        Command::Comment { article, body } => {
            let thread = open(state, article).await?;
            match thread.submit_comment(&body).await? {
                Some(comment) => Ok(format!("Posted comment {}.", comment.id)),
                None => Ok("Nothing to post.".to_string()),
            }
        }
        Command::Reply { article, parent, body } => {
            let thread = open(state, article).await?;
            let parent_target = target(parent, None);
            locate(&thread, parent_target).await?;
            thread.begin_reply(CommentId(parent)).await?;
            thread.update_reply(CommentId(parent), &body)?;
            match thread.submit_reply(CommentId(parent), &body).await? {
                Some(reply) => Ok(format!("Posted reply {} under comment {}.", reply.id, parent)),
                None => Ok("Nothing to post.".to_string()),
            }
        }
        Command::LikeComment { article, comment, parent } => {
            let thread = open(state, article).await?;
            let target = target(comment, parent);
            locate(&thread, target).await?;
            let comment = thread.toggle_comment_like(target).await?;
            let verb = if comment.like_status { "Liked" } else { "Unliked" };
            Ok(format!("{} {} ({} likes).", verb, target, comment.likes_count))
        }
        Command::EditComment { article, comment, body, parent } => {
            let thread = open(state, article).await?;
            let target = target(comment, parent);
            locate(&thread, target).await?;
            thread.begin_comment_edit(target)?;
            thread.update_comment_edit(target, &body)?;
            thread.save_comment_edit(target, &body).await?;
            Ok(format!("Updated {}.", target))
        }
        Command::DeleteComment { article, comment, parent } => {
            let thread = open(state, article).await?;
            let target = target(comment, parent);
            locate(&thread, target).await?;
            thread.delete_comment(target).await?;
            Ok(format!("Deleted {}.", target))
        }
    }
}

async fn open(state: &AppState, article: i64) -> Result<ArticleThread, ClientError> {
    let thread =
        ArticleThread::open(state.executor.clone(), state.api.clone(), ArticleId(article))
            .await?;
    Ok(thread)
}

/// `Ok(false)` once the list is exhausted.
fn load_more(result: Result<usize, ForumError>) -> Result<bool, ClientError> {
    match result {
        Ok(_) => Ok(true),
        Err(ForumError::Exhausted) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Pages through the thread until `target` is loaded.
async fn locate(thread: &ArticleThread, target: CommentTarget) -> Result<(), ClientError> {
    let parent = match target {
        CommentTarget::TopLevel(id) => id,
        CommentTarget::Nested { parent, .. } => parent,
    };
    while thread.thread(parent).is_none() {
        if !load_more(thread.load_more_comments().await)? {
            return Err(ForumError::UnknownComment(CommentTarget::TopLevel(parent)).into());
        }
    }
    if let CommentTarget::Nested { .. } = target {
        thread.load_replies(parent).await?;
        while thread.comment(target).is_none() {
            if !load_more(thread.load_more_replies(parent).await)? {
                return Err(ForumError::UnknownComment(target).into());
            }
        }
    }
    Ok(())
}

async fn list_feed(state: &AppState, kind: FeedKind, pages: usize) -> Result<String, ClientError> {
    let feed = Feed::open(state.executor.clone(), state.api.clone(), kind).await?;
    for _ in 1..pages {
        if !load_more(feed.load_more().await)? {
            break;
        }
    }
    let articles = feed.articles();
    if articles.is_empty() {
        return Ok("No articles.".to_string());
    }
    let mut out = String::new();
    for article in &articles {
        let _ = writeln!(out, "{}", article_line(article));
    }
    if feed.has_more() {
        out.push_str("(more available, use --pages)\n");
    }
    Ok(out)
}

//=========================================================================================
// Rendering
//=========================================================================================

fn article_line(article: &Article) -> String {
    let mut flags = String::new();
    if article.like_status {
        flags.push_str(" [liked]");
    }
    if article.save_status {
        flags.push_str(" [saved]");
    }
    if article.edited && !article.deleted {
        flags.push_str(" [edited]");
    }
    format!(
        "#{:<6} [{}] {}  ({} likes, {} comments, {} views){}",
        article.id,
        article.author.school,
        article.title,
        article.likes_count,
        article.comments_count,
        article.views_count,
        flags
    )
}

fn comment_line(comment: &Comment, indent: usize) -> String {
    let name = if comment.author.display_name.is_empty() {
        format!("user {}", comment.author.user)
    } else {
        comment.author.display_name.clone()
    };
    let mut line = format!(
        "{:indent$}#{} {} [{}] {}  ({} likes",
        "",
        comment.id,
        name,
        comment.author.school,
        comment.body,
        comment.likes_count,
        indent = indent
    );
    if comment.like_status {
        line.push_str(", liked");
    }
    if comment.edited && !comment.deleted {
        line.push_str(", edited");
    }
    line.push(')');
    line
}

fn render_thread(thread: &ArticleThread) -> String {
    let article = thread.article();
    let mut out = String::new();
    let _ = writeln!(out, "{}", article_line(&article));
    let _ = writeln!(out, "{}", article.created_at.format("%Y-%m-%d %H:%M"));
    if !article.course_codes.is_empty() {
        let _ = writeln!(out, "courses: {}", article.course_codes.join(", "));
    }
    let _ = writeln!(out, "\n{}\n", article.body);

    let comments = thread.comments();
    for t in comments.threads() {
        let _ = writeln!(out, "{}", comment_line(&t.comment, 0));
        if t.replies_visible {
            for reply in &t.replies {
                let _ = writeln!(out, "{}", comment_line(reply, 4));
            }
            if comments.next_replies(t.comment.id).is_some() {
                let _ = writeln!(out, "    (more replies)");
            }
        } else if t.comment.replies_count > 0 {
            let _ = writeln!(out, "    ({} replies, use --replies)", t.comment.replies_count);
        }
    }
    if comments.next_page().is_some() {
        out.push_str("(more comments, use --pages)\n");
    }
    out
}
