//! Observer delivery through the scheduler
//!
//! Failing, slow and disconnected observers must never affect scheduler
//! results, and each observer sees its events in commit order.

mod common;

use common::{request, scheduler_with, FailingObserver, RecordingObserver, SlowObserver};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tarmac::notifications::{
    EventStreamObserver, FlightEvent, LoggingObserver, Notifier, NotifierConfig,
};
use tarmac::scheduler::{Category, LockPolicy, RunwayScheduler};

fn scheduler_with_notifier(config: NotifierConfig) -> RunwayScheduler {
    RunwayScheduler::new(LockPolicy::default(), Notifier::new(config))
}

#[tokio::test]
async fn test_failing_observer_is_isolated() {
    let scheduler = scheduler_with(&[("R1", Category::A)]).await;
    request(&scheduler, "F1", Category::A).await;
    request(&scheduler, "F2", Category::A).await;

    let healthy = RecordingObserver::new();
    scheduler.subscribe("F2", "AL1", Arc::new(FailingObserver)).await.unwrap();
    scheduler.subscribe("F2", "AL1", healthy.clone()).await.unwrap();

    scheduler.issue_departure().await.unwrap();
    scheduler.issue_departure().await.unwrap();
    scheduler.notifier().wait_idle().await;

    assert_eq!(
        healthy.kinds(),
        vec!["assigned", "position_updated", "departed", "tracking_ended"]
    );

    let stats = scheduler.notifier().stats();
    assert_eq!(stats.failed, 4);
    assert_eq!(stats.delivered, 4);
    assert_eq!(stats.pending, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_observer_does_not_block_scheduler() {
    let scheduler = scheduler_with_notifier(
        NotifierConfig::default().with_delivery_timeout(Duration::from_millis(50)),
    );
    scheduler.create_runway("R1", Category::A).await.unwrap();
    for i in 0..5 {
        request(&scheduler, &format!("F{i}"), Category::A).await;
    }
    scheduler
        .subscribe(
            "F4",
            "AL1",
            Arc::new(SlowObserver {
                delay: Duration::from_secs(5),
            }),
        )
        .await
        .unwrap();

    let started = Instant::now();
    for _ in 0..5 {
        scheduler.issue_departure().await.unwrap();
    }
    assert!(started.elapsed() < Duration::from_secs(1));

    // Every delivery times out instead of hanging
    scheduler.notifier().wait_idle().await;
    let stats = scheduler.notifier().stats();
    assert!(stats.failed >= 1);
    assert_eq!(stats.pending, 0);
}

#[tokio::test]
async fn test_events_arrive_in_commit_order() {
    let scheduler = scheduler_with(&[("R1", Category::A)]).await;
    for i in 0..10 {
        request(&scheduler, &format!("F{i}"), Category::A).await;
    }

    let observer = RecordingObserver::new();
    scheduler.subscribe("F9", "AL1", observer.clone()).await.unwrap();

    for _ in 0..10 {
        scheduler.issue_departure().await.unwrap();
    }
    scheduler.notifier().wait_idle().await;

    let events = observer.events();
    assert_eq!(events.len(), 12);

    let positions: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            FlightEvent::Assigned { flights_ahead, .. }
            | FlightEvent::PositionUpdated { flights_ahead, .. } => Some(*flights_ahead),
            _ => None,
        })
        .collect();
    assert_eq!(positions, (0..=9).rev().collect::<Vec<_>>());
    assert!(matches!(events[10], FlightEvent::Departed { .. }));
    assert!(events[11].is_terminal());
}

#[tokio::test]
async fn test_event_stream_observer_ends_with_tracking_ended() {
    let scheduler = scheduler_with(&[("R1", Category::C)]).await;
    request(&scheduler, "F1", Category::D).await;

    let (observer, mut rx) = EventStreamObserver::channel("stream");
    scheduler.subscribe("F1", "AL1", Arc::new(observer)).await.unwrap();
    scheduler.issue_departure().await.unwrap();

    let mut kinds = Vec::new();
    while let Some(event) = rx.recv().await {
        kinds.push(event.as_str());
    }
    assert_eq!(kinds, vec!["assigned", "departed", "tracking_ended"]);
}

#[tokio::test]
async fn test_dropped_stream_counts_as_failure() {
    let scheduler = scheduler_with(&[("R1", Category::A)]).await;
    request(&scheduler, "F1", Category::A).await;

    let (observer, rx) = EventStreamObserver::channel("gone");
    drop(rx);
    scheduler.subscribe("F1", "AL1", Arc::new(observer)).await.unwrap();
    scheduler.issue_departure().await.unwrap();
    scheduler.notifier().wait_idle().await;

    let stats = scheduler.notifier().stats();
    assert_eq!(stats.failed, 3);
    assert_eq!(stats.delivered, 0);
}

#[tokio::test]
async fn test_logging_observer_accepts_everything() {
    let scheduler = scheduler_with(&[("R1", Category::A)]).await;
    request(&scheduler, "F1", Category::A).await;

    scheduler
        .subscribe("F1", "AL1", Arc::new(LoggingObserver::new("tower")))
        .await
        .unwrap();
    scheduler.issue_departure().await.unwrap();
    scheduler.notifier().wait_idle().await;

    let stats = scheduler.notifier().stats();
    assert_eq!(stats.delivered, 3);
    assert_eq!(stats.failed, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_observers_bounded_concurrency() {
    let scheduler = Arc::new(scheduler_with_notifier(
        NotifierConfig::default().with_max_concurrent_deliveries(2),
    ));
    scheduler.create_runway("R1", Category::A).await.unwrap();
    request(&scheduler, "F1", Category::A).await;

    let observers: Vec<_> = (0..20).map(|_| RecordingObserver::new()).collect();
    for observer in &observers {
        scheduler.subscribe("F1", "AL1", observer.clone()).await.unwrap();
    }
    scheduler.issue_departure().await.unwrap();
    scheduler.notifier().wait_idle().await;

    for observer in &observers {
        assert_eq!(observer.kinds(), vec!["assigned", "departed", "tracking_ended"]);
    }
    assert_eq!(scheduler.notifier().stats().delivered, 60);
}
