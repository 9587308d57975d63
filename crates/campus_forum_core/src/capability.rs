//! crates/campus_forum_core/src/capability.rs
//!
//! Ownership and tombstone checks shared by articles, comments and replies.

use crate::domain::{Article, Comment, UserId};

/// Anything with an author that can be soft-deleted.
pub trait Authored {
    fn author_id(&self) -> UserId;
    fn is_deleted(&self) -> bool;
}

impl Authored for Article {
    fn author_id(&self) -> UserId {
        self.author.user
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

impl Authored for Comment {
    fn author_id(&self) -> UserId {
        self.author.user
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// Whether `viewer` may edit or delete `entity`.
pub fn can_modify<E: Authored + ?Sized>(entity: &E, viewer: Option<UserId>) -> bool {
    viewer == Some(entity.author_id()) && !entity.is_deleted()
}

/// Whether `entity` still accepts likes, saves and replies.
pub fn can_interact<E: Authored + ?Sized>(entity: &E) -> bool {
    !entity.is_deleted()
}
