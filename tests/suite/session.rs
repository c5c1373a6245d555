//! End-to-end session flows against an in-memory MossByte service.

use moss_driver::DriveError;
use moss_todo::TodoError;
use moss_types::{ItemId, ItemState};
use serde_json::json;

use crate::common::{DATABASE_ID, FakeMoss};

#[tokio::test]
async fn first_refresh_creates_the_database() {
    let moss = FakeMoss::empty().await;
    let session = moss.session();

    let items = session.refresh().await.unwrap();

    assert!(items.is_empty());
    assert_eq!(session.database_id(), DATABASE_ID);
    assert_eq!(moss.request_count("POST").await, 1);
    assert_eq!(moss.stored(), Some(json!([{}])));
}

#[tokio::test]
async fn refresh_merges_remote_items_first() {
    let moss = FakeMoss::holding(json!({
        "r1": {"guid": "r1", "value": "from remote  ", "isDone": true, "state": 3}
    }))
    .await;
    let session = moss.session();

    let items = session.refresh().await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].value, "from remote");
    assert!(items[0].is_done);
    assert_eq!(items[0].state, ItemState::Complete);
    assert_eq!(moss.request_count("POST").await, 0);
}

#[tokio::test]
async fn added_item_reaches_the_remote() {
    let moss = FakeMoss::holding(json!({
        "r1": {"guid": "r1", "value": "existing", "isDone": false, "state": 1}
    }))
    .await;
    let session = moss.session();
    session.refresh().await.unwrap();

    let (id, pushed) = session.add_item("buy milk");
    assert_eq!(pushed.await.unwrap(), "success");

    let stored = moss.stored().unwrap();
    assert_eq!(stored["r1"]["value"], "existing");
    assert_eq!(stored[id.as_str()]["value"], "buy milk");
    assert_eq!(stored[id.as_str()]["state"], 1);
}

#[tokio::test]
async fn edits_are_mirrored_remotely() {
    let moss = FakeMoss::holding(json!({
        "a": {"guid": "a", "value": "draft", "isDone": false, "state": 1}
    }))
    .await;
    let session = moss.session();
    session.refresh().await.unwrap();
    let id = ItemId::new("a");

    session.update_item_value(&id, "final").await.unwrap();
    session.toggle_done(&id).await.unwrap();
    session.cycle_state(&id).await.unwrap();

    let stored = moss.stored().unwrap();
    assert_eq!(
        stored["a"],
        json!({"guid": "a", "value": "final", "isDone": true, "state": 2})
    );

    let local = &session.items()[0];
    assert_eq!(local.value, "final");
    assert!(local.is_done);
    assert_eq!(local.state, ItemState::InProgress);
}

#[tokio::test]
async fn removed_item_is_unset_remotely() {
    let moss = FakeMoss::holding(json!({
        "a": {"guid": "a", "value": "one", "isDone": false, "state": 1},
        "b": {"guid": "b", "value": "two", "isDone": false, "state": 1}
    }))
    .await;
    let session = moss.session();
    session.refresh().await.unwrap();

    session.remove_item(&ItemId::new("a")).await.unwrap();

    let stored = moss.stored().unwrap();
    assert!(stored.get("a").is_none());
    assert!(stored.get("b").is_some());
    assert_eq!(session.items().len(), 1);
}

#[tokio::test]
async fn editing_an_unknown_item_makes_no_request() {
    let moss = FakeMoss::holding(json!({})).await;
    let session = moss.session();
    session.refresh().await.unwrap();

    let result = session.cycle_state(&ItemId::new("missing")).await;

    assert!(matches!(
        result,
        Err(DriveError::Factory(TodoError::UnknownItem(_)))
    ));
    assert_eq!(moss.request_count("PATCH").await, 0);
}

#[tokio::test]
async fn concurrent_launches_settle_independently() {
    let moss = FakeMoss::holding(json!({
        "a": {"guid": "a", "value": "one", "isDone": false, "state": 1},
        "b": {"guid": "b", "value": "two", "isDone": false, "state": 1}
    }))
    .await;
    let session = moss.session();
    session.refresh().await.unwrap();

    let toggle = session.toggle_done(&ItemId::new("a"));
    let cycle = session.cycle_state(&ItemId::new("b"));
    let (toggled, cycled) = tokio::join!(toggle, cycle);

    assert_eq!(toggled.unwrap(), "success");
    assert_eq!(cycled.unwrap(), "success");
    let stored = moss.stored().unwrap();
    assert_eq!(stored["a"]["isDone"], true);
    assert_eq!(stored["b"]["state"], 2);
}
