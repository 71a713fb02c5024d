mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{FakeApi, day, item};
use nutrilog_core::dispatcher::{Control, MutationDispatcher};
use nutrilog_core::error::ClientError;
use nutrilog_core::lifecycle::RequestStatus;
use nutrilog_core::models::{LogItem, NewLogItem};
use nutrilog_core::store::{LogStore, MutationOrdering, PageState};

fn setup() -> (Arc<FakeApi>, MutationDispatcher<FakeApi>) {
    let api = Arc::new(FakeApi::new());
    let store = Arc::new(Mutex::new(LogStore::new(day(1))));
    let dispatcher = MutationDispatcher::new(Arc::clone(&api), store);
    (api, dispatcher)
}

fn logged(id: i64, name: &str, quantity_g: f64, calories: f64) -> LogItem {
    item(name, quantity_g, calories).with_id(id)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test]
async fn test_log_items_replaces_with_response() {
    let (api, dispatcher) = setup();
    api.seed_log(day(1), vec![logged(1, "Oats", 130.0, 500.0)]);
    assert_eq!(dispatcher.select_date(day(1)).await, PageState::Ready);

    let rice = NewLogItem {
        name: "Rice".to_string(),
        quantity_g: 150.0,
        calories: 195.0,
        protein: 4.0,
        carbs: 43.0,
        fat: 0.5,
    };
    let response = dispatcher.log_items(day(1), vec![rice]).await.unwrap();

    assert!((response.total_macros.calories - 695.0).abs() < 1e-9);
    assert!(response.food_items.iter().any(|i| i.name == "Rice"));
    assert_eq!(dispatcher.current_log(), Some(response));
    assert_eq!(dispatcher.control_status(Control::LogItems), RequestStatus::Fulfilled);
}

#[tokio::test]
async fn test_delete_last_item_zeroes_totals() {
    let (api, dispatcher) = setup();
    api.seed_log(day(1), vec![logged(7, "Rice", 150.0, 195.0)]);
    dispatcher.select_date(day(1)).await;

    let response = dispatcher.delete_item(day(1), 7).await.unwrap();
    assert!(response.food_items.is_empty());
    assert!(response.total_macros.is_zero());
    assert_eq!(dispatcher.current_log(), Some(response));
}

#[tokio::test(start_paused = true)]
async fn test_date_change_loads_then_ready() {
    let (api, dispatcher) = setup();
    api.seed_log(day(1), vec![logged(1, "Oats", 130.0, 500.0)]);
    dispatcher.select_date(day(1)).await;
    assert_eq!(dispatcher.current_log().unwrap().date, day(1));

    api.delay_next(ms(100));
    let (state, ()) = tokio::join!(dispatcher.select_date(day(2)), async {
        tokio::time::sleep(ms(10)).await;
        assert_eq!(dispatcher.page_state(), PageState::Loading);
        assert!(dispatcher.current_log().is_none());
    });

    assert_eq!(state, PageState::Ready);
    let log = dispatcher.current_log().unwrap();
    assert_eq!(log.date, day(2));
    assert!(log.food_items.is_empty());
}

#[tokio::test]
async fn test_selecting_same_date_does_not_refetch() {
    let (api, dispatcher) = setup();
    dispatcher.select_date(day(1)).await;
    dispatcher.select_date(day(1)).await;
    assert_eq!(api.calls(), vec!["fetch_daily_log"]);
}

#[tokio::test]
async fn test_validation_failure_leaves_log_untouched() {
    let (api, dispatcher) = setup();
    api.seed_log(day(1), vec![logged(1, "Oats", 130.0, 500.0)]);
    dispatcher.select_date(day(1)).await;
    let before = serde_json::to_string(&dispatcher.current_log()).unwrap();

    api.fail_next(ClientError::from_status(
        422,
        r#"{"detail": [{"loc": ["body", "items_to_log"], "msg": "field required", "type": "missing"}]}"#,
    ));
    let err = dispatcher
        .log_items(day(1), vec![item("Dal", 200.0, 230.0)])
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(err.reason(), "field required");
    let after = serde_json::to_string(&dispatcher.current_log()).unwrap();
    assert_eq!(before, after);
    assert_eq!(dispatcher.page_state(), PageState::Error);
    assert_eq!(dispatcher.control_status(Control::LogItems), RequestStatus::Rejected);
    assert_eq!(dispatcher.control_error(Control::LogItems), Some(err));
}

#[tokio::test]
async fn test_invalid_payload_is_rejected_before_any_request() {
    let (api, dispatcher) = setup();
    dispatcher.select_date(day(1)).await;

    let err = dispatcher.log_items(day(1), vec![]).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));

    let mut negative = item("Ghee", 10.0, 90.0);
    negative.fat = -1.0;
    let err = dispatcher.update_item(day(1), 3, negative).await.unwrap_err();
    assert_eq!(err.reason(), "fat must not be negative");
    assert_eq!(
        dispatcher.control_status(Control::UpdateItem(3)),
        RequestStatus::Rejected
    );

    assert_eq!(api.calls(), vec!["fetch_daily_log"]);
}

#[tokio::test]
async fn test_update_is_idempotent() {
    let (api, dispatcher) = setup();
    api.seed_log(
        day(1),
        vec![logged(4, "Rice", 150.0, 195.0), logged(5, "Dal", 200.0, 230.0)],
    );
    dispatcher.select_date(day(1)).await;

    let fields = item("Rice", 200.0, 260.0);
    let first = dispatcher.update_item(day(1), 4, fields.clone()).await.unwrap();
    let second = dispatcher.update_item(day(1), 4, fields).await.unwrap();

    assert_eq!(first, second);
    assert!((first.item(4).unwrap().quantity_g - 200.0).abs() < f64::EPSILON);
    assert!((first.total_macros.calories - 490.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_missing_item_is_transport_error() {
    let (_api, dispatcher) = setup();
    dispatcher.select_date(day(1)).await;
    let err = dispatcher.delete_item(day(1), 99).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(err.reason().contains("404"));
    assert_eq!(dispatcher.page_state(), PageState::Error);
}

#[tokio::test(start_paused = true)]
async fn test_mutation_marks_only_its_control_pending() {
    let (api, dispatcher) = setup();
    api.seed_log(day(1), vec![logged(7, "Rice", 150.0, 195.0)]);
    dispatcher.select_date(day(1)).await;

    api.delay_next(ms(100));
    let (result, ()) = tokio::join!(dispatcher.delete_item(day(1), 7), async {
        tokio::time::sleep(ms(10)).await;
        assert_eq!(
            dispatcher.control_status(Control::DeleteItem(7)),
            RequestStatus::Pending
        );
        assert_eq!(dispatcher.control_status(Control::LogItems), RequestStatus::Idle);
        assert_eq!(dispatcher.page_state(), PageState::Ready);
        // Pessimistic: nothing removed until the response lands
        assert_eq!(dispatcher.current_log().unwrap().food_items.len(), 1);
    });

    assert!(result.is_ok());
    assert_eq!(
        dispatcher.control_status(Control::DeleteItem(7)),
        RequestStatus::Fulfilled
    );
}

#[tokio::test(start_paused = true)]
async fn test_last_response_wins_by_default() {
    let (api, dispatcher) = setup();
    dispatcher.select_date(day(1)).await;

    // First request answers last; its body predates the second mutation.
    api.delay_next(ms(200));
    api.delay_next(ms(10));
    let (first, second) = tokio::join!(
        dispatcher.log_items(day(1), vec![item("Rice", 150.0, 195.0)]),
        dispatcher.log_items(day(1), vec![item("Dal", 200.0, 230.0)]),
    );

    assert_eq!(first.unwrap().food_items.len(), 1);
    assert_eq!(second.unwrap().food_items.len(), 2);
    let resident = dispatcher.current_log().unwrap();
    assert_eq!(resident.food_items.len(), 1);
    assert_eq!(resident.food_items[0].name, "Rice");
}

#[tokio::test(start_paused = true)]
async fn test_latest_issued_wins_drops_older_response() {
    let api = Arc::new(FakeApi::new());
    let store = Arc::new(Mutex::new(LogStore::new(day(1))));
    let dispatcher = MutationDispatcher::new(Arc::clone(&api), store)
        .with_ordering(MutationOrdering::LatestIssuedWins);
    dispatcher.select_date(day(1)).await;

    api.delay_next(ms(200));
    api.delay_next(ms(10));
    let (first, second) = tokio::join!(
        dispatcher.log_items(day(1), vec![item("Rice", 150.0, 195.0)]),
        dispatcher.log_items(day(1), vec![item("Dal", 200.0, 230.0)]),
    );

    assert!(first.is_ok());
    let second = second.unwrap();
    assert_eq!(dispatcher.current_log(), Some(second));
    assert_eq!(dispatcher.control_status(Control::LogItems), RequestStatus::Fulfilled);
}

#[tokio::test(start_paused = true)]
async fn test_latest_issued_wins_drops_fetch_started_before_mutation() {
    let api = Arc::new(FakeApi::new());
    api.seed_log(day(1), vec![logged(1, "Oats", 130.0, 500.0)]);
    let store = Arc::new(Mutex::new(LogStore::new(day(1))));
    let dispatcher = MutationDispatcher::new(Arc::clone(&api), store)
        .with_ordering(MutationOrdering::LatestIssuedWins);

    api.delay_next(ms(200));
    let (state, response) = tokio::join!(dispatcher.select_date(day(1)), async {
        tokio::time::sleep(ms(10)).await;
        let response = dispatcher
            .log_items(day(1), vec![item("Rice", 150.0, 195.0)])
            .await;
        // Fetch still outstanding, but the mutation's log is resident
        assert_eq!(dispatcher.page_state(), PageState::Ready);
        response
    });

    let response = response.unwrap();
    assert!((response.total_macros.calories - 695.0).abs() < 1e-9);
    assert_eq!(state, PageState::Ready);
    assert_eq!(dispatcher.current_log(), Some(response));
    let store = dispatcher.store();
    assert_eq!(store.lock().unwrap().fetch_status(), RequestStatus::Fulfilled);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_resolving_last_wins_by_default() {
    let (api, dispatcher) = setup();
    api.seed_log(day(1), vec![logged(1, "Oats", 130.0, 500.0)]);

    api.delay_next(ms(200));
    let (state, response) = tokio::join!(dispatcher.select_date(day(1)), async {
        tokio::time::sleep(ms(10)).await;
        dispatcher
            .log_items(day(1), vec![item("Rice", 150.0, 195.0)])
            .await
    });

    assert_eq!(response.unwrap().food_items.len(), 2);
    assert_eq!(state, PageState::Ready);
    let resident = dispatcher.current_log().unwrap();
    assert_eq!(resident.food_items.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_response_for_previous_date_is_dropped() {
    let (api, dispatcher) = setup();
    api.seed_log(day(1), vec![logged(1, "Oats", 130.0, 500.0)]);
    dispatcher.select_date(day(1)).await;

    api.delay_next(ms(100));
    let (result, state) = tokio::join!(
        dispatcher.log_items(day(1), vec![item("Rice", 150.0, 195.0)]),
        async {
            tokio::time::sleep(ms(10)).await;
            dispatcher.select_date(day(2)).await
        },
    );

    assert_eq!(result.unwrap().date, day(1));
    assert_eq!(state, PageState::Ready);
    let resident = dispatcher.current_log().unwrap();
    assert_eq!(resident.date, day(2));
    assert!(resident.food_items.is_empty());
}

#[tokio::test]
async fn test_replay_plan_appends_plan_items() {
    let (api, dispatcher) = setup();
    api.seed_log(day(1), vec![logged(1, "Oats", 130.0, 500.0)]);
    api.seed_plan(
        3,
        "Thali",
        vec![item("Rice", 150.0, 195.0), item("Dal", 200.0, 230.0)],
    );
    dispatcher.select_date(day(1)).await;

    let response = dispatcher.replay_plan(day(1), 3).await.unwrap();
    assert_eq!(response.food_items.len(), 3);
    assert!((response.total_macros.calories - 925.0).abs() < 1e-9);
    // Replayed items get fresh ids
    assert!(response.food_items.iter().all(|i| i.log_item_id >= 1));
    assert_eq!(response.item(2).unwrap().name, "Rice");
    assert_eq!(dispatcher.current_log(), api.server_log(day(1)));
}

#[tokio::test]
async fn test_fetch_failure_then_retry() {
    let (api, dispatcher) = setup();
    api.fail_next(ClientError::Transport("connection refused".to_string()));
    assert_eq!(dispatcher.select_date(day(1)).await, PageState::Error);
    assert!(dispatcher.current_log().is_none());

    assert_eq!(dispatcher.select_date(day(1)).await, PageState::Ready);
}
