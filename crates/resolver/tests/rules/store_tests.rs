use super::*;
use std::time::Duration;

#[tokio::test]
async fn edits_wait_for_active_readers() {
    let store = RuleStore::new(RuleTable::default());
    let guard = store.read().await;

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .add_condition(Condition {
                    key: "comexample".to_string(),
                    ..Condition::default()
                })
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!writer.is_finished());
    assert!(guard.conditions().is_empty());

    drop(guard);
    let replaced = writer.await.expect("writer task should finish");
    assert!(!replaced);
    assert_eq!(store.snapshot().await.conditions().len(), 1);
}

#[tokio::test]
async fn add_and_remove_rules() {
    let store = RuleStore::default();

    assert!(!store
        .add_skip_rule(SkipRule {
            prefix: "com.vendor".to_string(),
            allow: Vec::new(),
        })
        .await);
    assert!(store
        .add_skip_rule(SkipRule {
            prefix: "comvendor".to_string(),
            allow: vec!["comvendorkeep".to_string()],
        })
        .await);
    assert!(!store
        .add_orphan_skip_rule(SkipRule {
            prefix: "steam".to_string(),
            allow: Vec::new(),
        })
        .await);

    let table = store.snapshot().await;
    assert_eq!(table.skip_rules().len(), 1);
    assert!(!table.is_skipped("comvendorkeepdata"));
    assert!(table.is_orphan_skipped("steamapps"));

    assert!(store.remove_skip_rule("comvendor").await.is_some());
    assert!(store.remove_orphan_skip_rule("steam").await.is_some());
    assert!(store.remove_condition("absent").await.is_none());
}
