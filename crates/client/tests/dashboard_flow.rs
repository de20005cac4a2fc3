//! Integration tests for the `Dashboard` controller.
//!
//! Every test drives the controller against the in-memory backend from
//! `common`, a recording presenter and a scripted confirmation prompt.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use common::{harness, harness_with, ts_ago};
use shelfwatch_client::api::UploadFile;
use shelfwatch_client::dashboard::{
    DashboardError, DashboardOptions, FEEDBACK_ERROR_MESSAGE, FEEDBACK_SUCCESS_MESSAGE,
    NO_EVENTS_MESSAGE, UPLOAD_COMPLETE_MESSAGE,
};
use shelfwatch_client::events::DashboardEvent;
use shelfwatch_core::error::CoreError;
use shelfwatch_core::event::Feedback;
use shelfwatch_core::gate::{Decision, GateState, GatedAction};
use shelfwatch_core::pagination::PageBounds;
use shelfwatch_core::state::RefreshOutcome;
use shelfwatch_core::view::{TableView, NO_DETECTION_EVENTS, NO_VISIBLE_EVENTS};

fn page_body(rows: &[(i64, String)], total: u64) -> String {
    let rows: Vec<String> = rows
        .iter()
        .map(|(id, ts)| format!(r#"{{"id":{id},"device_id":"cam-1","timestamp":"{ts}","nestle_count":1}}"#))
        .collect();
    format!(
        r#"{{"data":[{}],"pagination":{{"total":{total}}}}}"#,
        rows.join(",")
    )
}

const UPLOAD_99: &str =
    r#"{"id":99,"total_nestle":2,"total_competitor":1,"nestle_products":{"X":2},"competitor_products":{"Y":1},"labeled_image":"static/results/99.jpg"}"#;

fn upload_file() -> Option<UploadFile> {
    Some(UploadFile::new("shelf.jpg", vec![0xFF, 0xD8, 0xFF]))
}

// ---------------------------------------------------------------------------
// Test: new unreviewed head is merged, hidden and subtracted from the total
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_head_is_hidden_and_uncounted() {
    let h = harness(&[]);
    h.backend.set_page(
        1,
        &format!(
            r#"{{"data":[{{"id":1,"timestamp":"{}"}}],"pagination":{{"total":1}}}}"#,
            ts_ago(30)
        ),
    );
    h.backend
        .set_detail(1, r#"{"products":{"nestle_products":{"X":4}}}"#);

    h.dashboard.initialize().await.unwrap();

    let snapshot = h.dashboard.snapshot().await;
    assert_eq!(snapshot.total_events, 0);
    assert_eq!(snapshot.table, TableView::Empty(NO_VISIBLE_EVENTS));
    assert_eq!(snapshot.bounds, PageBounds { start: 0, end: 0 });
    assert_eq!(snapshot.caption, "No events found");

    // The merged record itself carries the product count.
    let h2 = harness(&[]);
    h2.backend.set_page(
        1,
        &format!(
            r#"{{"data":[{{"id":1,"timestamp":"{}"}}],"pagination":{{"total":1}}}}"#,
            ts_ago(3600)
        ),
    );
    h2.backend
        .set_detail(1, r#"{"products":{"nestle_products":{"X":4}}}"#);
    h2.dashboard.initialize().await.unwrap();
    match h2.dashboard.snapshot().await.table {
        TableView::Rows(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].nestle_count, 4);
            assert_eq!(rows[0].nestle_percent, 100);
        }
        other => panic!("Expected Rows, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test: empty backend shows the no-events state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_backend_shows_no_detection_events() {
    let h = harness(&[]);
    h.dashboard.initialize().await.unwrap();

    let snapshot = h.presenter.last_snapshot().unwrap();
    assert_eq!(snapshot.table, TableView::Empty(NO_DETECTION_EVENTS));
    assert!(!snapshot.can_next);
    assert!(!snapshot.can_prev);
}

// ---------------------------------------------------------------------------
// Test: detail failure degrades one row without failing the page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_detail_degrades_to_summary_row() {
    let h = harness(&[]);
    let old = ts_ago(3600);
    h.backend.set_page(
        1,
        &page_body(&[(3, ts_ago(10)), (2, old.clone()), (1, old)], 3),
    );
    h.backend
        .set_detail(2, r#"{"nestle_count":7,"iqi_score":88}"#);
    // No detail for ids 1 and 3: the fake answers 404.

    h.dashboard.initialize().await.unwrap();

    let snapshot = h.dashboard.snapshot().await;
    // The fresh head has no detail, so it is shown and counted.
    assert_eq!(snapshot.total_events, 3);
    match snapshot.table {
        TableView::Rows(rows) => {
            assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2, 1]);
            assert_eq!(rows[0].nestle_count, 1);
            assert_eq!(rows[1].nestle_count, 7);
            assert_eq!(rows[2].nestle_count, 1);
            assert_eq!(rows[2].iqi_score, 0.0);
        }
        other => panic!("Expected Rows, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test: list failure shows an inline error and keeps existing state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_failure_keeps_existing_state() {
    let h = harness(&[]);
    let old = ts_ago(3600);
    h.backend.set_page(1, &page_body(&[(5, old)], 1));
    h.dashboard.initialize().await.unwrap();

    h.backend.fail_list(true);
    let err = h.dashboard.refresh_events().await.unwrap_err();
    assert_matches!(err, DashboardError::Api(_));

    let snapshot = h.dashboard.snapshot().await;
    assert_matches!(snapshot.table, TableView::Error(ref msg) if msg.starts_with("Error loading detection events"));
    assert_eq!(snapshot.total_events, 1);

    h.backend.fail_list(false);
    h.dashboard.refresh_events().await.unwrap();
    assert_matches!(h.dashboard.snapshot().await.table, TableView::Rows(_));
}

// ---------------------------------------------------------------------------
// Test: malformed list body is a failure, not an empty page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_list_is_rejected() {
    let h = harness(&[]);
    h.backend
        .set_page(1, r#"{"data":[{"id":1,"timestamp":"not a time"}]}"#);

    let err = h.dashboard.initialize().await.unwrap_err();
    assert_matches!(err, DashboardError::Api(ref e) if e.kind() == shelfwatch_client::api::FailureKind::MalformedResponse);
}

// ---------------------------------------------------------------------------
// Test: back-to-back refreshes with identical data are idempotent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn identical_refreshes_are_idempotent() {
    let h = harness(&[]);
    let old = ts_ago(3600);
    h.backend
        .set_page(1, &page_body(&[(3, old.clone()), (2, old.clone()), (1, old)], 3));

    h.dashboard.refresh_events().await.unwrap();
    let first = h.dashboard.snapshot().await;
    h.dashboard.refresh_events().await.unwrap();
    let second = h.dashboard.snapshot().await;

    assert_eq!(first.table, second.table);
    assert_eq!(first.total_events, second.total_events);
}

// ---------------------------------------------------------------------------
// Test: a superseded refresh is discarded
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stale_refresh_is_discarded() {
    let h = harness(&[]);
    let old = ts_ago(3600);
    h.backend
        .queue_page(Duration::from_millis(150), &page_body(&[(1, old.clone())], 1));
    h.backend.queue_page(Duration::ZERO, &page_body(&[(2, old)], 1));

    let dashboard = h.dashboard.clone();
    let (slow, fast) = tokio::join!(h.dashboard.refresh_events(), async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        dashboard.refresh_events().await
    });

    assert_eq!(slow.unwrap(), RefreshOutcome::Stale);
    assert_matches!(fast.unwrap(), RefreshOutcome::Applied(_));
    match h.dashboard.snapshot().await.table {
        TableView::Rows(rows) => assert_eq!(rows[0].id, 2),
        other => panic!("Expected Rows, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test: pagination moves and refetches
// ---------------------------------------------------------------------------

#[tokio::test]
async fn paging_fetches_requested_page() {
    let options = DashboardOptions {
        page_size: 2,
        ..Default::default()
    };
    let h = harness_with(&[], options);
    let old = ts_ago(3600);
    h.backend
        .set_page(1, &page_body(&[(5, old.clone()), (4, old.clone())], 5));
    h.backend
        .set_page(2, &page_body(&[(3, old.clone()), (2, old.clone())], 5));
    h.backend.set_page(3, &page_body(&[(1, old)], 5));

    h.dashboard.initialize().await.unwrap();
    assert!(!h.dashboard.prev_page().await.unwrap());
    assert!(h.dashboard.next_page().await.unwrap());
    assert!(h.dashboard.next_page().await.unwrap());
    assert!(!h.dashboard.next_page().await.unwrap());

    let snapshot = h.dashboard.snapshot().await;
    assert_eq!(snapshot.current_page, 3);
    assert_eq!(snapshot.bounds, PageBounds { start: 5, end: 5 });
    assert_eq!(snapshot.caption, "Showing 5 to 5 of 5 events");

    let calls = h.backend.list_calls.lock().unwrap().clone();
    assert_eq!(calls, vec![(1, 2), (2, 2), (3, 2)]);
}

// ---------------------------------------------------------------------------
// Test: shrinking total resets to page 1 and refetches once
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shrinking_total_returns_to_first_page() {
    let options = DashboardOptions {
        page_size: 2,
        ..Default::default()
    };
    let h = harness_with(&[], options);
    let old = ts_ago(3600);
    h.backend
        .set_page(1, &page_body(&[(5, old.clone()), (4, old.clone())], 5));
    h.backend
        .set_page(2, &page_body(&[(3, old.clone()), (2, old.clone())], 5));
    h.dashboard.initialize().await.unwrap();
    h.dashboard.next_page().await.unwrap();

    // Events were deleted: page 2 is now past the end.
    h.backend.set_page(2, &page_body(&[], 2));
    h.backend
        .set_page(1, &page_body(&[(5, old.clone()), (4, old)], 2));
    h.dashboard.refresh_events().await.unwrap();

    let snapshot = h.dashboard.snapshot().await;
    assert_eq!(snapshot.current_page, 1);
    assert_eq!(snapshot.total_events, 2);
    let calls = h.backend.list_calls.lock().unwrap().clone();
    assert_eq!(calls.last(), Some(&(1, 2)));
    assert_eq!(calls.len(), 4);
}

// ---------------------------------------------------------------------------
// Test: upload arms the gate; feedback on the head releases it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_then_feedback_round_trip() {
    let h = harness(&[]);
    h.backend.set_upload(Some(UPLOAD_99));
    h.dashboard.initialize().await.unwrap();

    let mut input = upload_file();
    let report = h.dashboard.upload(&mut input).await.unwrap();
    assert!(input.is_none());
    assert_eq!(report.record.id, 99);
    assert_eq!(report.record.nestle_count, 2);
    assert_eq!(report.record.competitor_count, 1);
    assert_eq!(report.record.feedback, None);
    assert_eq!(h.dashboard.gate_state().await, GateState::PendingReview);
    assert!(h.presenter.messages().contains(&UPLOAD_COMPLETE_MESSAGE.to_string()));

    // The canonical refresh now reports the uploaded event.
    h.backend
        .set_detail(99, r#"{"nestle_count":2,"competitor_count":1}"#);
    h.backend.set_page(
        1,
        &format!(
            r#"{{"data":[{{"id":99,"device_id":"web_upload","timestamp":"{}","nestle_count":2,"competitor_count":1}}],"pagination":{{"total":1}}}}"#,
            ts_ago(5)
        ),
    );
    h.dashboard.refresh_events().await.unwrap();
    assert_eq!(h.dashboard.snapshot().await.total_events, 0);

    let id = h.dashboard.submit_feedback(Feedback::Approved).await.unwrap();
    assert_eq!(id, 99);
    assert_eq!(h.dashboard.gate_state().await, GateState::Idle);
    assert_eq!(
        h.backend.feedback_calls.lock().unwrap().clone(),
        vec![(99, Feedback::Approved)]
    );
    assert!(h.presenter.messages().contains(&FEEDBACK_SUCCESS_MESSAGE.to_string()));

    let snapshot = h.dashboard.snapshot().await;
    assert_eq!(snapshot.total_events, 1);
    match snapshot.table {
        TableView::Rows(rows) => assert_eq!(rows[0].feedback, Some(Feedback::Approved)),
        other => panic!("Expected Rows, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test: upload from a later page returns to page 1 and reviews the upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_from_later_page_reviews_uploaded_event() {
    let options = DashboardOptions {
        page_size: 2,
        ..Default::default()
    };
    let h = harness_with(&[], options);
    let old = ts_ago(3600);
    h.backend
        .set_page(1, &page_body(&[(5, old.clone()), (4, old.clone())], 5));
    h.backend
        .set_page(2, &page_body(&[(3, old.clone()), (2, old.clone())], 5));
    h.backend.set_upload(Some(UPLOAD_99));
    h.dashboard.initialize().await.unwrap();
    h.dashboard.next_page().await.unwrap();
    assert_eq!(h.dashboard.snapshot().await.current_page, 2);

    // Once the upload lands the backend lists it first on page 1.
    h.backend
        .set_page(1, &page_body(&[(99, ts_ago(5)), (5, old)], 6));
    h.backend
        .set_detail(99, r#"{"nestle_count":2,"competitor_count":1}"#);
    let mut input = upload_file();
    h.dashboard.upload(&mut input).await.unwrap();

    let snapshot = h.dashboard.snapshot().await;
    assert_eq!(snapshot.current_page, 1);
    assert_eq!(snapshot.total_events, 5);
    let calls = h.backend.list_calls.lock().unwrap().clone();
    assert_eq!(calls.last(), Some(&(1, 2)));

    let id = h.dashboard.submit_feedback(Feedback::Approved).await.unwrap();
    assert_eq!(id, 99);
    assert_eq!(
        h.backend.feedback_calls.lock().unwrap().clone(),
        vec![(99, Feedback::Approved)]
    );
    assert_eq!(h.dashboard.gate_state().await, GateState::Idle);
}

// ---------------------------------------------------------------------------
// Test: missing summary does not block the events table
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_summary_does_not_block_initialize() {
    let h = harness(&[]);
    h.backend.set_summary(None);
    h.backend
        .set_page(1, &page_body(&[(1, ts_ago(3600))], 1));

    h.dashboard.initialize().await.unwrap();

    let snapshot = h.dashboard.snapshot().await;
    assert!(snapshot.summary.is_none());
    assert_eq!(snapshot.total_events, 1);
}

// ---------------------------------------------------------------------------
// Test: declined prompt clears the input and changes nothing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn declined_prompt_cancels_second_upload() {
    let h = harness(&[Decision::Cancel]);
    h.backend.set_upload(Some(UPLOAD_99));
    h.dashboard.initialize().await.unwrap();

    let mut first = upload_file();
    h.dashboard.upload(&mut first).await.unwrap();
    let before = h.dashboard.snapshot().await;

    let mut second = upload_file();
    let err = h.dashboard.upload(&mut second).await.unwrap_err();
    assert_matches!(err, DashboardError::Cancelled);
    assert!(second.is_none());
    assert_eq!(h.prompt.asked.lock().unwrap().clone(), vec![GatedAction::Upload]);
    assert_eq!(h.backend.upload_calls.lock().unwrap().len(), 1);
    assert_eq!(h.dashboard.gate_state().await, GateState::PendingReview);
    assert_eq!(h.dashboard.snapshot().await, before);
}

// ---------------------------------------------------------------------------
// Test: confirmed prompt abandons the review and uploads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn confirmed_prompt_abandons_review() {
    let h = harness(&[Decision::Proceed]);
    h.backend.set_upload(Some(UPLOAD_99));

    let mut first = upload_file();
    h.dashboard.upload(&mut first).await.unwrap();
    let mut second = upload_file();
    h.dashboard.upload(&mut second).await.unwrap();

    assert_eq!(h.prompt.times_asked(), 1);
    assert_eq!(h.backend.upload_calls.lock().unwrap().len(), 2);
    // The second upload armed the gate again.
    assert_eq!(h.dashboard.gate_state().await, GateState::PendingReview);
}

// ---------------------------------------------------------------------------
// Test: upload failure leaves the gate unchanged
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_upload_leaves_gate_idle() {
    let h = harness(&[]);
    let mut input = upload_file();
    let err = h.dashboard.upload(&mut input).await.unwrap_err();

    assert_matches!(err, DashboardError::Api(_));
    assert_eq!(h.dashboard.gate_state().await, GateState::Idle);
    assert!(h
        .presenter
        .messages()
        .iter()
        .any(|m| m.starts_with("Error processing image")));
}

// ---------------------------------------------------------------------------
// Test: upload without a file is rejected
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let h = harness(&[]);
    let mut input = None;
    let err = h.dashboard.upload(&mut input).await.unwrap_err();
    assert_matches!(err, DashboardError::Core(CoreError::Validation(_)));
    assert!(h.backend.upload_calls.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: feedback failure keeps the review pending
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_feedback_keeps_review_pending() {
    let h = harness(&[]);
    h.backend.set_upload(Some(UPLOAD_99));
    h.backend.set_page(1, &page_body(&[(99, ts_ago(5))], 1));
    let mut input = upload_file();
    h.dashboard.upload(&mut input).await.unwrap();

    h.backend.fail_feedback(true);
    let err = h
        .dashboard
        .submit_feedback(Feedback::NeedsImprovement)
        .await
        .unwrap_err();
    assert_matches!(err, DashboardError::Api(_));
    assert_eq!(h.dashboard.gate_state().await, GateState::PendingReview);
    assert!(h.presenter.messages().contains(&FEEDBACK_ERROR_MESSAGE.to_string()));
}

// ---------------------------------------------------------------------------
// Test: feedback with no events is rejected locally
// ---------------------------------------------------------------------------

#[tokio::test]
async fn feedback_without_events_is_rejected() {
    let h = harness(&[]);
    let err = h.dashboard.submit_feedback(Feedback::Approved).await.unwrap_err();
    assert_matches!(err, DashboardError::Core(CoreError::NoEvents));
    assert!(h.backend.feedback_calls.lock().unwrap().is_empty());
    assert!(h.presenter.messages().contains(&NO_EVENTS_MESSAGE.to_string()));
}

// ---------------------------------------------------------------------------
// Test: navigation is gated like upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn navigation_requires_confirmation_while_pending() {
    let h = harness(&[Decision::Cancel, Decision::Proceed]);
    assert_eq!(h.dashboard.navigate_away().await, Decision::Proceed);
    assert_eq!(h.prompt.times_asked(), 0);

    h.backend.set_upload(Some(UPLOAD_99));
    let mut input = upload_file();
    h.dashboard.upload(&mut input).await.unwrap();

    assert_eq!(h.dashboard.navigate_away().await, Decision::Cancel);
    assert!(h.dashboard.review_required().await);
    assert_eq!(h.dashboard.navigate_away().await, Decision::Proceed);
    assert!(!h.dashboard.review_required().await);
    assert_eq!(h.prompt.times_asked(), 2);
}

// ---------------------------------------------------------------------------
// Test: upload adds to the day's bucket
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_updates_daily_bucket() {
    let h = harness(&[]);
    h.backend.set_upload(Some(
        r#"{"id":7,"nestle_products":{"X":3},"competitor_products":{"Y":2},"date":"2025-02-20"}"#,
    ));
    // Summary stays unavailable so the optimistic bucket is what remains.
    let mut input = upload_file();
    h.dashboard.upload(&mut input).await.unwrap();

    let summary = h.dashboard.snapshot().await.summary.unwrap();
    let daily = summary.daily_data.unwrap();
    assert_eq!(daily.dates, vec!["2025-02-20".to_string()]);
    assert_eq!(daily.nestle_values, vec![3]);
    assert_eq!(daily.competitor_values, vec![2]);
}

// ---------------------------------------------------------------------------
// Test: summary failure keeps previous summary
// ---------------------------------------------------------------------------

#[tokio::test]
async fn summary_failure_keeps_previous_data() {
    let h = harness(&[]);
    h.backend.set_summary(Some(
        r#"{"daily_data":{"dates":["2025-02-19"],"nestle_values":[4],"competitor_values":[1]},"top_products":[]}"#,
    ));
    h.dashboard.refresh_summary().await.unwrap();

    h.backend.set_summary(None);
    assert!(h.dashboard.refresh_summary().await.is_err());

    let summary = h.dashboard.snapshot().await.summary.unwrap();
    assert_eq!(summary.daily_data.unwrap().nestle_values, vec![4]);
}

// ---------------------------------------------------------------------------
// Test: poll refreshes events only on page 1
// ---------------------------------------------------------------------------

#[tokio::test]
async fn poll_refetches_events_only_on_first_page() {
    let options = DashboardOptions {
        page_size: 1,
        ..Default::default()
    };
    let h = harness_with(&[], options);
    let old = ts_ago(3600);
    h.backend.set_summary(Some("{}"));
    h.backend.set_page(1, &page_body(&[(2, old.clone())], 2));
    h.backend.set_page(2, &page_body(&[(1, old)], 2));
    h.dashboard.initialize().await.unwrap();

    h.dashboard.poll_tick().await.unwrap();
    assert_eq!(h.backend.list_calls.lock().unwrap().len(), 2);

    h.dashboard.next_page().await.unwrap();
    h.dashboard.poll_tick().await.unwrap();
    assert_eq!(h.backend.list_calls.lock().unwrap().len(), 3);
}

// ---------------------------------------------------------------------------
// Test: event detail view writes counts back into the collection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn event_detail_updates_collection_counts() {
    let h = harness(&[]);
    h.backend.set_page(1, &page_body(&[(8, ts_ago(3600))], 1));
    h.dashboard.initialize().await.unwrap();

    h.backend.set_detail(
        8,
        r#"{"products":{"nestle_products":{"KitKat":6},"competitor_products":[{},{}]},"iqi_score":65}"#,
    );
    let view = h.dashboard.view_event_details(8).await.unwrap();
    assert_eq!((view.nestle_count, view.competitor_count), (6, 2));
    assert_eq!(h.presenter.details.lock().unwrap().len(), 1);

    match h.dashboard.snapshot().await.table {
        TableView::Rows(rows) => {
            assert_eq!(rows[0].nestle_count, 6);
            assert_eq!(rows[0].competitor_count, 2);
        }
        other => panic!("Expected Rows, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test: lookup failures notify the user
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lookup_failures_are_notified() {
    let h = harness(&[]);
    assert!(h.dashboard.view_event_details(404).await.is_err());
    assert!(h.dashboard.all_products().await.is_err());

    let messages = h.presenter.messages();
    assert!(messages.contains(&"Error loading event details".to_string()));
    assert!(messages.contains(&"Error loading product data".to_string()));

    h.backend
        .set_products(Some(r#"[{"name":"KitKat","count":12}]"#));
    let products = h.dashboard.all_products().await.unwrap();
    assert_eq!(products[0].name, "KitKat");
}

// ---------------------------------------------------------------------------
// Test: controller events are broadcast
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_broadcasts_gate_change() {
    let h = harness(&[]);
    let mut rx = h.dashboard.subscribe();
    h.backend.set_upload(Some(UPLOAD_99));
    let mut input = upload_file();
    h.dashboard.upload(&mut input).await.unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event);
    }
    assert!(seen.contains(&DashboardEvent::UploadCompleted { event_id: 99 }));
    assert!(seen.contains(&DashboardEvent::GateChanged {
        state: GateState::PendingReview
    }));
}
