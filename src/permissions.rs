//! Ownership checks gating the mutation endpoints.

use crate::error::{WebError, WebResult};
use crate::types::{Comment, Task, User};

/// Only the creator of a task may change or delete it.
pub fn ensure_task_owner(task: &Task, user: &User) -> WebResult<()> {
    if task.creator_id != user.id {
        return Err(WebError::forbidden(
            "You do not have permission to modify this task.",
        ));
    }
    Ok(())
}

/// Only the author of a comment may change or delete it.
pub fn ensure_comment_author(comment: &Comment, user: &User) -> WebResult<()> {
    if comment.author_id != user.id {
        return Err(WebError::forbidden("You cannot edit this comment."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::{TaskPriority, TaskStatus};

    fn user(id: i64) -> User {
        User {
            id,
            username: format!("user{}", id),
            password_hash: String::new(),
            date_joined: 0,
        }
    }

    fn task(creator_id: i64) -> Task {
        Task {
            id: 1,
            title: "t".into(),
            description: "d".into(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            creator_id,
            creator: format!("user{}", creator_id),
        }
    }

    #[test]
    fn creator_passes_task_check() {
        assert!(ensure_task_owner(&task(7), &user(7)).is_ok());
    }

    #[test]
    fn other_user_is_forbidden_from_task() {
        let err = ensure_task_owner(&task(7), &user(8)).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn comment_check_compares_author() {
        let comment = Comment {
            id: 3,
            task_id: 1,
            author_id: 2,
            content: "hi".into(),
            created_at: 0,
            media: None,
        };
        assert!(ensure_comment_author(&comment, &user(2)).is_ok());
        assert_eq!(
            ensure_comment_author(&comment, &user(9)).unwrap_err().code,
            ErrorCode::Forbidden
        );
    }
}
