//! Postgres-backed store tests. They need a reachable database:
//! `DATABASE_URL=postgres://... cargo test --test pg_store_test -- --ignored`

use std::collections::BTreeMap;
use std::env;

use chrono::{Duration, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use interview_coach_backend::{
    database::{pool::run_migrations, EntityStore, Pagination, PgStore},
    error::Error,
    models::{
        conversation::{ConversationStatus, NewConversation},
        feedback::{CategoryScore, FeedbackReport},
        job::NewJob,
        message::NewMessage,
        user::NewUser,
    },
};

async fn setup() -> (PgStore, PgPool) {
    dotenvy::dotenv().ok();
    let url = env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("pool");
    run_migrations(&pool).await.expect("migrations");
    (PgStore::new(pool.clone()), pool)
}

fn unique(prefix: &str) -> String {
    format!(
        "{}-{}",
        prefix,
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

fn report() -> FeedbackReport {
    let mut categories = BTreeMap::new();
    categories.insert(
        "technical".to_string(),
        CategoryScore {
            score: Some(8),
            feedback: Some("Knows indexes".to_string()),
        },
    );
    categories.insert(
        "leadership".to_string(),
        CategoryScore {
            score: None,
            feedback: Some("Not assessed".to_string()),
        },
    );

    FeedbackReport {
        overall_score: Some(8),
        verdict: Some("Hire".to_string()),
        summary: Some("Strong on storage internals".to_string()),
        categories,
        strengths: vec!["Depth".to_string(), "Clarity".to_string()],
        improvements: vec!["Estimation".to_string()],
        recommendation: Some("Next round".to_string()),
    }
}

fn message(conversation_id: i64, role: &str, content: &str) -> NewMessage {
    NewMessage {
        conversation_id,
        role: role.to_string(),
        content: content.to_string(),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn complete_conversation_round_trips_feedback_and_conflicts_on_repeat() {
    let (store, _) = setup().await;
    let conversation = store
        .create_conversation(NewConversation::for_interview("Technical", &unique("ada"), None))
        .await
        .expect("conversation");
    assert_eq!(conversation.status, ConversationStatus::InProgress);

    let expected = report();
    let feedback = store
        .complete_conversation(conversation.id, &expected)
        .await
        .expect("complete");
    assert_eq!(FeedbackReport::from(feedback.clone()), expected);
    assert_eq!(feedback.integrity_note, None);

    let stored = store
        .get_feedback(conversation.id)
        .await
        .expect("get feedback")
        .expect("feedback row");
    assert_eq!(stored, feedback);

    let completed = store
        .get_conversation(conversation.id)
        .await
        .expect("get")
        .expect("conversation row");
    assert_eq!(completed.status, ConversationStatus::Completed);
    assert!(completed.completed_at.expect("completed_at") >= completed.started_at);

    let err = store
        .complete_conversation(conversation.id, &expected)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(
        store.get_feedback(conversation.id).await.expect("get").expect("row"),
        feedback
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn complete_missing_conversation_is_not_found() {
    let (store, _) = setup().await;
    let err = store
        .complete_conversation(i64::MAX, &report())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn messages_with_equal_timestamps_come_back_in_id_order() {
    let (store, pool) = setup().await;
    let conversation = store
        .create_conversation(NewConversation::for_interview("Behavioral", &unique("lin"), None))
        .await
        .expect("conversation");

    let at = Utc::now();
    let earlier = at - Duration::seconds(1);
    for (content, created_at) in [("first", at), ("second", at), ("third", at), ("zeroth", earlier)] {
        sqlx::query(
            "INSERT INTO messages (conversation_id, role, content, created_at) VALUES ($1, 'user', $2, $3)",
        )
        .bind(conversation.id)
        .bind(content)
        .bind(created_at)
        .execute(&pool)
        .await
        .expect("insert message");
    }

    let listed: Vec<String> = store
        .list_messages(conversation.id)
        .await
        .expect("list")
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(listed, vec!["zeroth", "first", "second", "third"]);

    let with_messages = store
        .get_conversation_with_messages(conversation.id)
        .await
        .expect("composite read")
        .expect("conversation row");
    let composite: Vec<&str> = with_messages
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(composite, listed);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn deleting_a_conversation_cascades() {
    let (store, pool) = setup().await;
    let conversation = store
        .create_conversation(NewConversation::for_interview("Technical", &unique("grace"), None))
        .await
        .expect("conversation");
    store
        .create_message(message(conversation.id, "user", "hello"))
        .await
        .expect("message");
    store
        .complete_conversation(conversation.id, &report())
        .await
        .expect("complete");

    assert!(store.delete_conversation(conversation.id).await.expect("delete"));
    assert!(store.list_messages(conversation.id).await.expect("list").is_empty());
    assert!(store.get_feedback(conversation.id).await.expect("get").is_none());

    let orphans: i64 = sqlx::query_scalar(
        "SELECT (SELECT COUNT(*) FROM messages WHERE conversation_id = $1) + (SELECT COUNT(*) FROM feedback WHERE conversation_id = $1)",
    )
    .bind(conversation.id)
    .fetch_one(&pool)
    .await
    .expect("count");
    assert_eq!(orphans, 0);
    assert!(!store.delete_conversation(conversation.id).await.expect("delete again"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn message_constraints_map_to_domain_errors() {
    let (store, _) = setup().await;
    let err = store
        .create_message(message(i64::MAX, "user", "orphan"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let conversation = store
        .create_conversation(NewConversation::for_interview("Technical", &unique("ada"), None))
        .await
        .expect("conversation");
    let err = store
        .create_message(message(conversation.id, "user", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_username_conflicts() {
    let (store, _) = setup().await;
    let user = NewUser {
        username: unique("user"),
        password_hash: "$argon2id$placeholder".to_string(),
        name: Some("Ada".to_string()),
        resume_text: None,
    };
    let created = store.create_user(user.clone()).await.expect("user");
    assert_eq!(
        store.get_user(created.id).await.expect("get").map(|u| u.username),
        Some(user.username.clone())
    );

    let err = store.create_user(user).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn jobs_round_trip_requirements() {
    let (store, _) = setup().await;
    let title = unique("Backend Engineer");
    let created = store
        .create_jobs(vec![
            NewJob {
                title: title.clone(),
                company: "Acme".to_string(),
                location: "Remote".to_string(),
                description: "APIs".to_string(),
                requirements: vec!["Rust".to_string(), "SQL".to_string()],
                match_score: Some(88),
            },
            NewJob {
                title: title.clone(),
                company: "Globex".to_string(),
                location: "Berlin".to_string(),
                description: "On-call".to_string(),
                requirements: vec![],
                match_score: Some(0),
            },
        ])
        .await
        .expect("jobs");
    assert_eq!(created.len(), 2);
    assert!(created[0].id < created[1].id);

    let listed = store
        .list_jobs(Pagination::new(0, i64::MAX))
        .await
        .expect("list");
    let ours: Vec<_> = listed.into_iter().filter(|j| j.title == title).collect();
    assert_eq!(ours, created);
    assert_eq!(ours[0].requirements, vec!["Rust", "SQL"]);
    assert!(ours[1].requirements.is_empty());

    let empty = store
        .list_jobs(Pagination::new(0, 0))
        .await
        .expect("empty page");
    assert!(empty.is_empty());
}
