//! Integration tests for the database layer.
//!
//! These tests verify the core database operations using an in-memory SQLite database.
//! Tests are organized by module and functionality.

use std::time::Duration;
use task_tracker::db::{Database, UsernameTaken};
use task_tracker::types::{TaskFilter, TaskInput, TaskPriority, TaskStatus, User};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn make_user(db: &Database, name: &str) -> User {
    db.create_user(name, "password123").expect("Failed to create user")
}

fn input(title: &str, status: TaskStatus, priority: TaskPriority) -> TaskInput {
    TaskInput {
        title: title.to_string(),
        description: format!("{} description", title),
        status,
        priority,
        due_date: None,
    }
}

mod migration_tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let db = setup_db();
        assert_eq!(db.run_migrations().unwrap(), 0);
    }

    #[test]
    fn like_pair_is_unique_at_schema_level() {
        let db = setup_db();
        let user = make_user(&db, "ann");
        let task = db
            .create_task(user.id, &input("t", TaskStatus::Todo, TaskPriority::Low))
            .unwrap();
        let comment = db.add_comment(task.id, user.id, "hi", None).unwrap();

        let result = db.with_conn(|conn| {
            for _ in 0..2 {
                conn.execute(
                    "INSERT INTO likes (comment_id, user_id, created_at) VALUES (?1, ?2, 0)",
                    rusqlite::params![comment.id, user.id],
                )?;
            }
            Ok(())
        });
        assert!(result.is_err());
    }
}

mod user_tests {
    use super::*;

    #[test]
    fn create_user_and_authenticate() {
        let db = setup_db();
        let user = make_user(&db, "alice");

        assert!(user.id > 0);
        assert!(user.date_joined > 0);
        assert_ne!(user.password_hash, "password123");

        let found = db.authenticate("alice", "password123").unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[test]
    fn authenticate_rejects_wrong_password_and_unknown_user() {
        let db = setup_db();
        make_user(&db, "alice");

        assert!(db.authenticate("alice", "password124").unwrap().is_none());
        assert!(db.authenticate("bob", "password123").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let db = setup_db();
        make_user(&db, "alice");

        let err = db.create_user("alice", "another-pass").unwrap_err();
        assert!(err.downcast_ref::<UsernameTaken>().is_some());
        assert_eq!(err.to_string(), "A user with that username already exists.");
    }

    #[test]
    fn get_user_returns_none_for_unknown_id() {
        let db = setup_db();
        assert!(db.get_user(999).unwrap().is_none());
    }
}

mod session_tests {
    use super::*;

    #[test]
    fn session_resolves_to_user_until_deleted() {
        let db = setup_db();
        let user = make_user(&db, "alice");

        let token = db.create_session(user.id, Duration::from_secs(3600)).unwrap();
        let found = db.get_session_user(&token).unwrap();
        assert_eq!(found.map(|u| u.username), Some("alice".to_string()));

        db.delete_session(&token).unwrap();
        assert!(db.get_session_user(&token).unwrap().is_none());
    }

    #[test]
    fn expired_sessions_are_ignored_and_purged() {
        let db = setup_db();
        let user = make_user(&db, "alice");

        let expired = db.create_session(user.id, Duration::ZERO).unwrap();
        let live = db.create_session(user.id, Duration::from_secs(3600)).unwrap();

        assert!(db.get_session_user(&expired).unwrap().is_none());
        assert_eq!(db.purge_expired_sessions().unwrap(), 1);
        assert!(db.get_session_user(&live).unwrap().is_some());
    }

    #[test]
    fn unknown_token_yields_none() {
        let db = setup_db();
        assert!(db.get_session_user("nope").unwrap().is_none());
    }
}

mod task_tests {
    use super::*;

    #[test]
    fn create_task_records_creator() {
        let db = setup_db();
        let user = make_user(&db, "alice");

        let mut fields = input("Write report", TaskStatus::Todo, TaskPriority::High);
        fields.due_date = chrono::NaiveDate::from_ymd_opt(2025, 3, 1);
        let task = db.create_task(user.id, &fields).unwrap();

        assert_eq!(task.title, "Write report");
        assert_eq!(task.creator_id, user.id);
        assert_eq!(task.creator, "alice");
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.due_date, chrono::NaiveDate::from_ymd_opt(2025, 3, 1));

        let fetched = db.get_task(task.id).unwrap().unwrap();
        assert_eq!(fetched, task);
    }

    #[test]
    fn list_tasks_filters_by_status_and_priority() {
        let db = setup_db();
        let user = make_user(&db, "alice");

        let a = db.create_task(user.id, &input("a", TaskStatus::Todo, TaskPriority::High)).unwrap();
        let b = db.create_task(user.id, &input("b", TaskStatus::Done, TaskPriority::High)).unwrap();
        let c = db.create_task(user.id, &input("c", TaskStatus::Todo, TaskPriority::Low)).unwrap();
        let d = db
            .create_task(user.id, &input("d", TaskStatus::InProgress, TaskPriority::Medium))
            .unwrap();

        let ids = |filter: TaskFilter| -> Vec<i64> {
            db.list_tasks(&filter).unwrap().into_iter().map(|t| t.id).collect()
        };

        assert_eq!(ids(TaskFilter::default()), vec![a.id, b.id, c.id, d.id]);
        assert_eq!(
            ids(TaskFilter { status: Some(TaskStatus::Todo), priority: None }),
            vec![a.id, c.id]
        );
        assert_eq!(
            ids(TaskFilter { status: None, priority: Some(TaskPriority::High) }),
            vec![a.id, b.id]
        );
        assert_eq!(
            ids(TaskFilter { status: Some(TaskStatus::Todo), priority: Some(TaskPriority::High) }),
            vec![a.id]
        );
        assert!(ids(TaskFilter { status: Some(TaskStatus::Done), priority: Some(TaskPriority::Low) }).is_empty());
    }

    #[test]
    fn update_task_replaces_fields() {
        let db = setup_db();
        let user = make_user(&db, "alice");
        let task = db.create_task(user.id, &input("old", TaskStatus::Todo, TaskPriority::Low)).unwrap();

        let updated = db
            .update_task(task.id, &input("new", TaskStatus::Done, TaskPriority::High))
            .unwrap();
        assert!(updated);

        let task = db.get_task(task.id).unwrap().unwrap();
        assert_eq!(task.title, "new");
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.priority, TaskPriority::High);
    }

    #[test]
    fn set_status_only_touches_status() {
        let db = setup_db();
        let user = make_user(&db, "alice");
        let task = db.create_task(user.id, &input("t", TaskStatus::Todo, TaskPriority::Low)).unwrap();

        assert!(db.set_task_status(task.id, TaskStatus::InProgress).unwrap());
        let after = db.get_task(task.id).unwrap().unwrap();
        assert_eq!(after.status, TaskStatus::InProgress);
        assert_eq!(after.title, task.title);
        assert_eq!(after.priority, task.priority);

        assert!(!db.set_task_status(12345, TaskStatus::Done).unwrap());
    }

    #[test]
    fn delete_task_cascades_to_comments_and_likes() {
        let db = setup_db();
        let user = make_user(&db, "alice");
        let task = db.create_task(user.id, &input("t", TaskStatus::Todo, TaskPriority::Low)).unwrap();
        let comment = db.add_comment(task.id, user.id, "hello", None).unwrap();
        db.toggle_like(comment.id, user.id).unwrap();

        assert!(db.delete_task(task.id).unwrap());
        assert!(db.get_task(task.id).unwrap().is_none());
        assert!(db.get_comment(comment.id).unwrap().is_none());
        assert_eq!(db.like_count(comment.id).unwrap(), 0);
        assert!(!db.delete_task(task.id).unwrap());
    }

    #[test]
    fn deleting_user_cascades_everywhere() {
        let db = setup_db();
        let alice = make_user(&db, "alice");
        let bob = make_user(&db, "bob");

        let alice_task = db.create_task(alice.id, &input("a", TaskStatus::Todo, TaskPriority::Low)).unwrap();
        let bob_task = db.create_task(bob.id, &input("b", TaskStatus::Todo, TaskPriority::Low)).unwrap();
        let alice_comment = db.add_comment(bob_task.id, alice.id, "from alice", None).unwrap();
        let bob_comment = db.add_comment(bob_task.id, bob.id, "from bob", None).unwrap();
        db.toggle_like(bob_comment.id, alice.id).unwrap();
        let token = db.create_session(alice.id, Duration::from_secs(60)).unwrap();

        assert!(db.delete_user(alice.id).unwrap());

        assert!(db.get_task(alice_task.id).unwrap().is_none());
        assert!(db.get_comment(alice_comment.id).unwrap().is_none());
        assert_eq!(db.like_count(bob_comment.id).unwrap(), 0);
        assert!(db.get_session_user(&token).unwrap().is_none());
        assert!(db.get_task(bob_task.id).unwrap().is_some());
    }
}

mod comment_tests {
    use super::*;

    #[test]
    fn add_comment_requires_existing_task() {
        let db = setup_db();
        let user = make_user(&db, "alice");

        assert!(db.add_comment(42, user.id, "orphan", None).is_err());
    }

    #[test]
    fn list_comments_orders_oldest_first_with_likes() {
        let db = setup_db();
        let alice = make_user(&db, "alice");
        let bob = make_user(&db, "bob");
        let task = db.create_task(alice.id, &input("t", TaskStatus::Todo, TaskPriority::Low)).unwrap();

        let first = db.add_comment(task.id, alice.id, "first", None).unwrap();
        let second = db
            .add_comment(task.id, bob.id, "second", Some("comments_media/abc_pic.png"))
            .unwrap();
        db.toggle_like(first.id, bob.id).unwrap();
        db.toggle_like(first.id, alice.id).unwrap();

        let views = db.list_comments(task.id, Some(bob.id)).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].comment.id, first.id);
        assert_eq!(views[0].author, "alice");
        assert_eq!(views[0].like_count, 2);
        assert!(views[0].liked);
        assert_eq!(views[1].comment.id, second.id);
        assert_eq!(views[1].comment.media.as_deref(), Some("comments_media/abc_pic.png"));
        assert_eq!(views[1].like_count, 0);
        assert!(!views[1].liked);

        let anonymous = db.list_comments(task.id, None).unwrap();
        assert!(anonymous.iter().all(|v| !v.liked));
    }

    #[test]
    fn update_and_delete_comment() {
        let db = setup_db();
        let user = make_user(&db, "alice");
        let task = db.create_task(user.id, &input("t", TaskStatus::Todo, TaskPriority::Low)).unwrap();
        let comment = db.add_comment(task.id, user.id, "draft", None).unwrap();
        db.toggle_like(comment.id, user.id).unwrap();

        assert!(db.update_comment(comment.id, "final").unwrap());
        assert_eq!(db.get_comment(comment.id).unwrap().unwrap().content, "final");

        assert!(db.delete_comment(comment.id).unwrap());
        assert!(db.get_comment(comment.id).unwrap().is_none());
        assert_eq!(db.like_count(comment.id).unwrap(), 0);
    }
}

mod like_tests {
    use super::*;

    #[test]
    fn toggling_twice_returns_to_unliked() {
        let db = setup_db();
        let user = make_user(&db, "alice");
        let task = db.create_task(user.id, &input("t", TaskStatus::Todo, TaskPriority::Low)).unwrap();
        let comment = db.add_comment(task.id, user.id, "c", None).unwrap();

        assert!(db.toggle_like(comment.id, user.id).unwrap());
        assert!(db.has_liked(comment.id, user.id).unwrap());
        assert_eq!(db.like_count(comment.id).unwrap(), 1);

        assert!(!db.toggle_like(comment.id, user.id).unwrap());
        assert!(!db.has_liked(comment.id, user.id).unwrap());
        assert_eq!(db.like_count(comment.id).unwrap(), 0);
    }

    #[test]
    fn likes_are_per_user() {
        let db = setup_db();
        let alice = make_user(&db, "alice");
        let bob = make_user(&db, "bob");
        let task = db.create_task(alice.id, &input("t", TaskStatus::Todo, TaskPriority::Low)).unwrap();
        let comment = db.add_comment(task.id, alice.id, "c", None).unwrap();

        db.toggle_like(comment.id, alice.id).unwrap();
        db.toggle_like(comment.id, bob.id).unwrap();
        db.toggle_like(comment.id, alice.id).unwrap();

        assert!(!db.has_liked(comment.id, alice.id).unwrap());
        assert!(db.has_liked(comment.id, bob.id).unwrap());
        assert_eq!(db.like_count(comment.id).unwrap(), 1);
    }
}
