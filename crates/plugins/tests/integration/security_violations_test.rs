use super::common::{test_repository, unique_plugin_id};
use taylordash_plugins::security::compute_security_score;

async fn seed_plugin(repo: &taylordash_plugins::PluginRepository, id: &str) {
    repo.upsert(
        id,
        "Test Plugin",
        "1.0.0",
        None,
        None,
        "data",
        "https://example.com/plugin.git",
        None,
        &serde_json::json!({}),
        &[],
        "installed",
        None,
    )
    .await
    .expect("plugin upsert should succeed");
}

#[tokio::test]
async fn recorded_violations_drive_the_persisted_security_score() {
    let repo = test_repository().await;
    let plugin_id = unique_plugin_id("scan-target");
    seed_plugin(&repo, &plugin_id).await;

    repo.insert_violation(&plugin_id, "eval_usage", "dynamic code evaluation", "critical", &serde_json::json!({"file": "index.js", "line": 12}))
        .await
        .expect("violation insert should succeed");
    repo.insert_violation(&plugin_id, "storage_access_undeclared", "local storage access", "medium", &serde_json::json!({"file": "index.js", "line": 40}))
        .await
        .expect("second violation insert should succeed");

    let unresolved = repo.unresolved_violations_by_severity(&plugin_id).await.expect("severity rollup should succeed");
    let by_severity: Vec<(taylordash_plugins::Severity, i64)> = unresolved
        .into_iter()
        .map(|(severity, count)| (severity.parse().expect("stored severity should parse"), count))
        .collect();

    let score = compute_security_score(&by_severity);
    assert_eq!(score, 100 - (40 + 5), "critical + medium penalties should be subtracted from the 100 baseline");

    repo.update_security_score(&plugin_id, score, 2).await.expect("score update should persist");

    let plugin = repo.get(&plugin_id).await.expect("get should succeed").expect("plugin should exist");
    assert_eq!(plugin.security_score, score);
    assert_eq!(plugin.security_violations, 2);

    repo.delete(&plugin_id).await.expect("cleanup delete should succeed");
}

#[tokio::test]
async fn resolved_violations_are_excluded_from_the_unresolved_rollup() {
    let repo = test_repository().await;
    let plugin_id = unique_plugin_id("resolved");
    seed_plugin(&repo, &plugin_id).await;

    let violation = repo
        .insert_violation(&plugin_id, "unsafe_timer_string", "deferred string eval", "medium", &serde_json::json!({}))
        .await
        .expect("violation insert should succeed");

    let before = repo.unresolved_violations_by_severity(&plugin_id).await.expect("rollup should succeed");
    assert_eq!(before.iter().map(|(_, count)| count).sum::<i64>(), 1);

    // No repository method marks a violation resolved (operators do this
    // directly against `plugin_security_violations`); go straight to a
    // second pool to set up the "already resolved" precondition.
    let db = taylordash_core::Database::connect(&super::common::test_database_config())
        .await
        .expect("second pool should connect");
    sqlx::query("UPDATE plugin_security_violations SET resolved = true WHERE id = $1")
        .bind(violation.id)
        .execute(db.pool())
        .await
        .expect("marking the violation resolved should succeed");

    let after = repo.unresolved_violations_by_severity(&plugin_id).await.expect("rollup should succeed");
    assert!(after.iter().map(|(_, count)| count).sum::<i64>() == 0, "resolved violations must not count toward the unresolved rollup");

    repo.delete(&plugin_id).await.expect("cleanup delete should succeed");
}
