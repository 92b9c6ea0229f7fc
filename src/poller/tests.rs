use std::str::FromStr;

use mockall::predicate::*;
use teloxide::types::ChatId;

use super::*;
use crate::{
    messaging::{MessagingError, MockMessagingService},
    subscription::{PollKind, StopTarget, SubscriptionKey},
    transit::{ArrivalEstimate, Direction, MockTransitGateway, NearbyBus},
};

const CHAT_ID: ChatId = ChatId(123);
const TARGET_SEQUENCE: u32 = 20;
const THRESHOLD: u32 = 5;

fn target() -> StopTarget {
    StopTarget::from_str("Taipei 672 1 博仁醫院").unwrap()
}

fn subscription() -> Subscription {
    Subscription {
        key: SubscriptionKey::new(CHAT_ID, PollKind::Arrival, target()),
        terminus: Some("大鵬新城".to_string()),
    }
}

fn estimate(stop_status: i32, estimate_time: Option<i64>) -> ArrivalEstimate {
    ArrivalEstimate { stop_status, estimate_time, ..Default::default() }
}

fn buses(sequences: &[u32]) -> Vec<NearbyBus> {
    sequences
        .iter()
        .map(|&stop_sequence| NearbyBus { stop_sequence, ..Default::default() })
        .collect()
}

fn arrival_gateway(result: ArrivalEstimate) -> MockTransitGateway {
    let mut mock_gateway = MockTransitGateway::new();
    mock_gateway
        .expect_find_arrival_estimate()
        .with(eq("Taipei"), eq("672"), eq(Direction::Return), eq("博仁醫院"))
        .times(1)
        .returning(move |_, _, _, _| Ok(result.clone()));
    mock_gateway
}

fn proximity_gateway(sequences: &'static [u32]) -> MockTransitGateway {
    let mut mock_gateway = MockTransitGateway::new();
    mock_gateway
        .expect_find_nearby_buses()
        .with(eq("Taipei"), eq("672"), eq(Direction::Return))
        .times(1)
        .returning(move |_, _, _| Ok(buses(sequences)));
    mock_gateway
}

#[test]
fn test_classify_arrival_now_below_one_minute() {
    assert_eq!(classify_arrival(0), Alert::ArrivingNow);
    assert_eq!(classify_arrival(45), Alert::ArrivingNow);
    assert_eq!(classify_arrival(59), Alert::ArrivingNow);
    assert_eq!(classify_arrival(-30), Alert::ArrivingNow);
}

#[test]
fn test_classify_arrival_minutes_floor() {
    assert_eq!(classify_arrival(60), Alert::ArrivingIn { minutes: 1 });
    assert_eq!(classify_arrival(200), Alert::ArrivingIn { minutes: 3 });
    assert_eq!(classify_arrival(359), Alert::ArrivingIn { minutes: 5 });
}

#[test]
fn test_classify_arrival_far_uses_same_variant() {
    assert_eq!(classify_arrival(360), Alert::ArrivingIn { minutes: 6 });
    assert_eq!(classify_arrival(1800), Alert::ArrivingIn { minutes: 30 });
}

#[test]
fn test_stops_away_picks_closest_approaching_bus() {
    assert_eq!(stops_away(20, [10, 17, 19]), Some(1));
    assert_eq!(stops_away(20, [10, 12]), Some(8));
}

#[test]
fn test_stops_away_ignores_buses_at_or_past_target() {
    assert_eq!(stops_away(20, [20, 25, 3]), Some(17));
    assert_eq!(stops_away(20, [20, 21]), None);
    assert_eq!(stops_away(20, std::iter::empty()), None);
}

#[tokio::test]
async fn test_arrival_check_now() {
    let check = ArrivalCheck::new(Arc::new(arrival_gateway(estimate(0, Some(45)))), target());

    assert_eq!(check.check().await.unwrap(), Some(Alert::ArrivingNow));
}

#[tokio::test]
async fn test_arrival_check_minutes() {
    let check = ArrivalCheck::new(Arc::new(arrival_gateway(estimate(0, Some(200)))), target());

    assert_eq!(check.check().await.unwrap(), Some(Alert::ArrivingIn { minutes: 3 }));
}

#[tokio::test]
async fn test_arrival_check_abnormal_status_reports_nothing() {
    let check = ArrivalCheck::new(Arc::new(arrival_gateway(estimate(1, None))), target());

    assert_eq!(check.check().await.unwrap(), None);
}

#[tokio::test]
async fn test_arrival_check_propagates_query_error() {
    let mut mock_gateway = MockTransitGateway::new();
    mock_gateway
        .expect_find_arrival_estimate()
        .times(1)
        .returning(|_, _, _, _| Err(TransitError::Unauthorized));
    let check = ArrivalCheck::new(Arc::new(mock_gateway), target());

    let result = check.check().await;

    assert!(matches!(result, Err(PollerError::Transit(TransitError::Unauthorized))));
}

#[tokio::test]
async fn test_proximity_check_close_bus_alerts() {
    let check = ProximityCheck::new(
        Arc::new(proximity_gateway(&[10, 17, 19])),
        target(),
        TARGET_SEQUENCE,
        THRESHOLD,
    );

    assert_eq!(check.check().await.unwrap(), Some(Alert::StopsAway { stops: 1 }));
}

#[tokio::test]
async fn test_proximity_check_far_bus_reports_nothing() {
    let check = ProximityCheck::new(
        Arc::new(proximity_gateway(&[10, 12])),
        target(),
        TARGET_SEQUENCE,
        THRESHOLD,
    );

    assert_eq!(check.check().await.unwrap(), None);
}

#[tokio::test]
async fn test_proximity_check_threshold_is_exclusive() {
    let check = ProximityCheck::new(
        Arc::new(proximity_gateway(&[15])),
        target(),
        TARGET_SEQUENCE,
        THRESHOLD,
    );

    assert_eq!(check.check().await.unwrap(), None);
}

#[tokio::test]
async fn test_proximity_check_no_approaching_bus() {
    let check = ProximityCheck::new(
        Arc::new(proximity_gateway(&[21, 30])),
        target(),
        TARGET_SEQUENCE,
        THRESHOLD,
    );

    assert_eq!(check.check().await.unwrap(), None);
}

#[tokio::test]
async fn test_tick_sends_alert() {
    let mut mock_strategy = MockTickStrategy::new();
    let mut mock_messaging = MockMessagingService::new();

    mock_strategy.expect_check().times(1).returning(|| Ok(Some(Alert::ArrivingIn { minutes: 3 })));
    mock_messaging
        .expect_send_alert_msg()
        .withf(|chat_id, sub, alert| {
            *chat_id == CHAT_ID
                && *sub == subscription()
                && *alert == Alert::ArrivingIn { minutes: 3 }
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let job = RecurringSubscription::new(
        subscription(),
        Arc::new(mock_strategy),
        Arc::new(mock_messaging),
    );

    job.tick().await;
}

#[tokio::test]
async fn test_tick_without_alert_sends_nothing() {
    let mut mock_strategy = MockTickStrategy::new();
    let mut mock_messaging = MockMessagingService::new();

    mock_strategy.expect_check().times(1).returning(|| Ok(None));
    mock_messaging.expect_send_alert_msg().times(0);

    let job = RecurringSubscription::new(
        subscription(),
        Arc::new(mock_strategy),
        Arc::new(mock_messaging),
    );

    job.tick().await;
}

#[tokio::test]
async fn test_tick_swallows_query_error() {
    let mut mock_strategy = MockTickStrategy::new();
    let mut mock_messaging = MockMessagingService::new();

    mock_strategy
        .expect_check()
        .times(1)
        .returning(|| Err(PollerError::Transit(TransitError::NotFound)));
    mock_messaging.expect_send_alert_msg().times(0);

    let job = RecurringSubscription::new(
        subscription(),
        Arc::new(mock_strategy),
        Arc::new(mock_messaging),
    );

    job.tick().await;
}

#[tokio::test]
async fn test_tick_swallows_send_failure() {
    let mut mock_strategy = MockTickStrategy::new();
    let mut mock_messaging = MockMessagingService::new();

    mock_strategy.expect_check().times(1).returning(|| Ok(Some(Alert::ArrivingNow)));
    mock_messaging.expect_send_alert_msg().times(1).returning(|_, _, _| {
        Err(MessagingError::TeloxideRequest(teloxide::RequestError::Io(
            std::io::Error::other("connection reset").into(),
        )))
    });

    let job = RecurringSubscription::new(
        subscription(),
        Arc::new(mock_strategy),
        Arc::new(mock_messaging),
    );

    job.tick().await;
}

#[tokio::test(start_paused = true)]
async fn test_run_ticks_every_period_until_cancelled() {
    let mut mock_strategy = MockTickStrategy::new();

    // Ticks at 60s and 120s; nothing at start-up.
    mock_strategy.expect_check().times(2).returning(|| Ok(None));

    let job = RecurringSubscription::new(
        subscription(),
        Arc::new(mock_strategy),
        Arc::new(MockMessagingService::new()),
    );
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(job.run(Duration::from_secs(60), cancel.clone()));

    tokio::time::sleep(Duration::from_secs(121)).await;
    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_run_keeps_ticking_after_failures() {
    let mut mock_strategy = MockTickStrategy::new();

    mock_strategy
        .expect_check()
        .times(3)
        .returning(|| Err(PollerError::Transit(TransitError::NotFound)));

    let job = RecurringSubscription::new(
        subscription(),
        Arc::new(mock_strategy),
        Arc::new(MockMessagingService::new()),
    );
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(job.run(Duration::from_secs(60), cancel.clone()));

    tokio::time::sleep(Duration::from_secs(181)).await;
    cancel.cancel();
    handle.await.unwrap();
}
