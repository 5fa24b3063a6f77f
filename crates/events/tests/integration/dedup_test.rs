use super::common::{test_repository, unique_topic};

#[tokio::test]
async fn inserting_the_same_message_id_twice_mirrors_only_once() {
    let repo = test_repository().await;
    let topic = unique_topic("component.updated");
    let payload = serde_json::json!({ "component_id": "c-1", "status": "healthy" });

    let first = repo
        .insert_mirror(&topic, "component.updated", Some("msg-1"), &payload, uuid::Uuid::new_v4())
        .await
        .expect("first insert should succeed");
    assert!(first.is_some(), "first delivery of a message_id must be mirrored");

    let second = repo
        .insert_mirror(&topic, "component.updated", Some("msg-1"), &payload, uuid::Uuid::new_v4())
        .await
        .expect("duplicate insert should not error");
    assert!(second.is_none(), "redelivery of the same (topic, message_id) must be deduplicated");
}

#[tokio::test]
async fn messages_without_a_message_id_are_never_deduplicated() {
    let repo = test_repository().await;
    let topic = unique_topic("heartbeat");
    let payload = serde_json::json!({});

    let first = repo
        .insert_mirror(&topic, "heartbeat", None, &payload, uuid::Uuid::new_v4())
        .await
        .expect("first insert should succeed");
    let second = repo
        .insert_mirror(&topic, "heartbeat", None, &payload, uuid::Uuid::new_v4())
        .await
        .expect("second insert should succeed");

    assert!(first.is_some());
    assert!(second.is_some(), "the partial unique index only applies when message_id is present");
}

#[tokio::test]
async fn dlq_entries_accumulate_without_deduplication() {
    let repo = test_repository().await;
    let topic = unique_topic("failed.job");
    let payload = serde_json::json!({ "attempt": 3 });

    repo.insert_dlq(&topic, "handler panicked", &payload).await.expect("first dlq insert");
    repo.insert_dlq(&topic, "handler panicked", &payload).await.expect("second dlq insert");

    let entries = repo.list_dlq(100, 0).await.expect("list_dlq should succeed");
    let matching = entries.iter().filter(|e| e.original_topic == topic).count();
    assert_eq!(matching, 2, "repeated failures for the same topic must not be collapsed");
}
