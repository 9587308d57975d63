//! crates/campus_forum_core/src/comments.rs
//!
//! The comment tree store. Holds the two-level comment hierarchy of one
//! article and exposes the pure transitions the thread controller applies
//! once the network effect of an action is known.
//!
//! Nothing in here talks to the network; every method either succeeds
//! completely or leaves the tree untouched.

use crate::domain::{
    apply_like, Comment, CommentId, CommentTarget, CommentThread, Cursor, Page, DELETED_BODY,
};
use crate::error::{ForumError, ForumResult};
use crate::paging::{merge_unique, CursorTracker, Scope};

impl Comment {
    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    /// Moves `like_status` and `likes_count` together. Returns whether anything changed.
    pub fn set_liked(&mut self, liked: bool) -> bool {
        apply_like(&mut self.like_status, &mut self.likes_count, liked)
    }

    /// Soft-deletes the comment; it keeps its place in the thread.
    pub fn tombstone(&mut self) {
        self.body = DELETED_BODY.to_string();
        self.deleted = true;
        self.edit = None;
    }
}

//=========================================================================================
// The Tree
//=========================================================================================

/// The comment hierarchy of one article plus its pagination cursors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentTree {
    threads: Vec<CommentThread>,
    cursors: CursorTracker,
    next_provisional: i64,
}

impl CommentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from the first page of top-level comments.
    pub fn from_page(page: Page<Comment>) -> Self {
        let mut tree = Self::new();
        tree.replace(page);
        tree
    }

    pub fn threads(&self) -> &[CommentThread] {
        &self.threads
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn thread(&self, id: CommentId) -> Option<&CommentThread> {
        self.threads.iter().find(|t| t.comment.id == id)
    }

    /// Looks up a comment at either level.
    pub fn get(&self, target: CommentTarget) -> Option<&Comment> {
        match target {
            CommentTarget::TopLevel(id) => self.thread(id).map(|t| &t.comment),
            CommentTarget::Nested { parent, id } => self
                .thread(parent)
                .and_then(|t| t.replies.iter().find(|r| r.id == id)),
        }
    }

    pub fn cursors(&self) -> &CursorTracker {
        &self.cursors
    }

    pub fn next_page(&self) -> Option<&Cursor> {
        self.cursors.get(Scope::TopLevel)
    }

    pub fn next_replies(&self, parent: CommentId) -> Option<&Cursor> {
        self.cursors.get(Scope::Replies(parent))
    }

    // --- Page merging ---

    /// Replaces the whole tree with a first page.
    pub fn replace(&mut self, page: Page<Comment>) {
        self.threads.clear();
        self.cursors.clear();
        self.merge_page(page);
    }

    /// Appends the top-level comments of `page` that are not held yet and
    /// records its cursor. Returns how many were added.
    pub fn merge_page(&mut self, page: Page<Comment>) -> usize {
        let incoming = page.items.into_iter().map(CommentThread::new).collect();
        let added = merge_unique(&mut self.threads, incoming, |t| t.comment.id);
        self.cursors.set(Scope::TopLevel, page.next);
        added
    }

    /// Appends a page of replies under `parent`, reveals them and records the
    /// parent's cursor. Returns how many were added.
    pub fn merge_replies(
        &mut self,
        parent: CommentId,
        page: Page<Comment>,
    ) -> ForumResult<usize> {
        let thread = self.thread_mut(parent)?;
        let added = merge_unique(&mut thread.replies, page.items, |r| r.id);
        thread.replies_visible = true;
        self.cursors.set(Scope::Replies(parent), page.next);
        Ok(added)
    }

    pub fn show_replies(&mut self, parent: CommentId) -> ForumResult<()> {
        self.thread_mut(parent)?.replies_visible = true;
        Ok(())
    }

    pub fn hide_replies(&mut self, parent: CommentId) -> ForumResult<()> {
        self.thread_mut(parent)?.replies_visible = false;
        Ok(())
    }

    // --- Creation ---

    /// Puts a confirmed top-level comment at the front of the list.
    pub fn prepend(&mut self, comment: Comment) {
        if self.thread(comment.id).is_none() {
            self.threads.insert(0, CommentThread::new(comment));
        }
    }

    /// Puts a confirmed reply at the front of its parent's replies, reveals
    /// them and closes the parent's reply box.
    pub fn prepend_reply(&mut self, parent: CommentId, reply: Comment) -> ForumResult<()> {
        let thread = self.thread_mut(parent)?;
        if !thread.replies.iter().any(|r| r.id == reply.id) {
            thread.replies.insert(0, reply);
        }
        thread.replies_visible = true;
        thread.reply = None;
        Ok(())
    }

    /// Inserts `comment` under a fresh provisional id ahead of server
    /// confirmation and returns the target it can be found under.
    pub fn insert_provisional(&mut self, mut comment: Comment) -> CommentTarget {
        comment.id = self.provisional_id();
        comment.pending = true;
        let target = CommentTarget::TopLevel(comment.id);
        self.threads.insert(0, CommentThread::new(comment));
        target
    }

    /// Inserts a provisional reply at the front of `parent`'s replies.
    /// Reply visibility is left alone until the reply is confirmed.
    pub fn insert_provisional_reply(
        &mut self,
        parent: CommentId,
        mut reply: Comment,
    ) -> ForumResult<CommentTarget> {
        if self.thread(parent).is_none() {
            return Err(ForumError::UnknownComment(CommentTarget::TopLevel(parent)));
        }
        let id = self.provisional_id();
        let thread = self.thread_mut(parent)?;
        reply.id = id;
        reply.parent = Some(parent);
        reply.pending = true;
        thread.replies.insert(0, reply);
        Ok(CommentTarget::Nested { parent, id })
    }

    /// Swaps a provisional entry for the server's version of it, in place.
    pub fn confirm_provisional(
        &mut self,
        provisional: CommentTarget,
        confirmed: Comment,
    ) -> ForumResult<()> {
        match provisional {
            CommentTarget::TopLevel(id) => {
                let index = self.index_of(id).ok_or(ForumError::UnknownComment(provisional))?;
                if self.thread(confirmed.id).is_some() {
                    // The server's copy arrived through a page load in the meantime.
                    self.threads.remove(index);
                } else {
                    self.threads[index].comment = confirmed;
                }
            }
            CommentTarget::Nested { parent, id } => {
                let thread = self.thread_mut(parent)?;
                let index = thread
                    .replies
                    .iter()
                    .position(|r| r.id == id)
                    .ok_or(ForumError::UnknownComment(provisional))?;
                if thread.replies.iter().any(|r| r.id == confirmed.id) {
                    thread.replies.remove(index);
                } else {
                    thread.replies[index] = confirmed;
                }
                thread.replies_visible = true;
                thread.reply = None;
            }
        }
        Ok(())
    }

    /// Removes a provisional entry after its submission failed. When it was
    /// the latest one handed out, its id is returned to the pool as well, so
    /// a lone failed submission leaves the tree exactly as it was.
    pub fn discard_provisional(&mut self, provisional: CommentTarget) {
        match provisional {
            CommentTarget::TopLevel(id) => self.threads.retain(|t| t.comment.id != id),
            CommentTarget::Nested { parent, id } => {
                if let Ok(thread) = self.thread_mut(parent) {
                    thread.replies.retain(|r| r.id != id);
                }
            }
        }
        if provisional.id() == CommentId(self.next_provisional) {
            self.next_provisional += 1;
        }
    }

    // --- Likes, edits, deletes ---

    /// Sets the like flag of a comment, moving its counter with it.
    pub fn set_liked(&mut self, target: CommentTarget, liked: bool) -> ForumResult<&Comment> {
        let comment = self.comment_mut(target)?;
        comment.set_liked(liked);
        Ok(comment)
    }

    /// Opens the edit buffer seeded with the current body.
    pub fn begin_edit(&mut self, target: CommentTarget) -> ForumResult<()> {
        let comment = self.comment_mut(target)?;
        comment.edit = Some(comment.body.clone());
        Ok(())
    }

    /// Replaces the edit buffer. Ignored when not editing.
    pub fn update_edit(
        &mut self,
        target: CommentTarget,
        value: impl Into<String>,
    ) -> ForumResult<()> {
        if let Some(buffer) = self.comment_mut(target)?.edit.as_mut() {
            *buffer = value.into();
        }
        Ok(())
    }

    pub fn cancel_edit(&mut self, target: CommentTarget) -> ForumResult<()> {
        self.comment_mut(target)?.edit = None;
        Ok(())
    }

    /// Applies a confirmed edit: closes the editor, replaces the body, marks it edited.
    pub fn apply_edit(
        &mut self,
        target: CommentTarget,
        body: impl Into<String>,
    ) -> ForumResult<()> {
        let comment = self.comment_mut(target)?;
        comment.body = body.into();
        comment.edited = true;
        comment.edit = None;
        Ok(())
    }

    /// Soft-deletes a comment. It is never removed from its list.
    pub fn tombstone(&mut self, target: CommentTarget) -> ForumResult<()> {
        self.comment_mut(target)?.tombstone();
        Ok(())
    }

    // --- Reply box ---

    /// Opens an empty reply box under a top-level comment.
    pub fn begin_reply(&mut self, parent: CommentId) -> ForumResult<()> {
        self.thread_mut(parent)?.reply = Some(String::new());
        Ok(())
    }

    /// Replaces the reply buffer. Ignored when the box is closed.
    pub fn update_reply(
        &mut self,
        parent: CommentId,
        value: impl Into<String>,
    ) -> ForumResult<()> {
        if let Some(buffer) = self.thread_mut(parent)?.reply.as_mut() {
            *buffer = value.into();
        }
        Ok(())
    }

    pub fn cancel_reply(&mut self, parent: CommentId) -> ForumResult<()> {
        self.thread_mut(parent)?.reply = None;
        Ok(())
    }

    // --- Lookup helpers ---

    fn provisional_id(&mut self) -> CommentId {
        self.next_provisional -= 1;
        CommentId(self.next_provisional)
    }

    fn index_of(&self, id: CommentId) -> Option<usize> {
        self.threads.iter().position(|t| t.comment.id == id)
    }

    fn thread_mut(&mut self, id: CommentId) -> ForumResult<&mut CommentThread> {
        self.threads
            .iter_mut()
            .find(|t| t.comment.id == id)
            .ok_or(ForumError::UnknownComment(CommentTarget::TopLevel(id)))
    }

    fn comment_mut(&mut self, target: CommentTarget) -> ForumResult<&mut Comment> {
        let found = match target {
            CommentTarget::TopLevel(id) => self
                .threads
                .iter_mut()
                .find(|t| t.comment.id == id)
                .map(|t| &mut t.comment),
            CommentTarget::Nested { parent, id } => self
                .threads
                .iter_mut()
                .find(|t| t.comment.id == parent)
                .and_then(|t| t.replies.iter_mut().find(|r| r.id == id)),
        };
        found.ok_or(ForumError::UnknownComment(target))
    }
}
