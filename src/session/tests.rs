use super::{ConsumerSession, Directive, MessageHandler, SessionError, SessionManager, SessionState, SessionStatus};
use crate::broker::{Broker, ConsumerSettings, MemoryBroker, RawMessage};
use crate::types::GroupId;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

const TOPIC: &str = "fake-data";

#[derive(Default)]
struct RecordingHandler {
    payloads: Vec<Vec<u8>>,
    stop_after: Option<usize>,
    subscribed: bool
}

#[async_trait]
impl MessageHandler for RecordingHandler {
    async fn on_subscribed(&mut self) {
        self.subscribed = true;
    }

    async fn on_message(&mut self, message: RawMessage) -> Directive {
        self.payloads.extend(message.payload);

        match self.stop_after {
            Some(limit) if self.payloads.len() >= limit => Directive::Stop,
            _ => Directive::Continue
        }
    }
}

fn create_manager(broker: &MemoryBroker) -> SessionManager<MemoryBroker> {
    SessionManager::new(Arc::new(broker.clone()), "test-client")
}

#[tokio::test]
async fn test_stop_directive_ends_session_and_disconnects_once() -> Result<()> {
    let broker = MemoryBroker::new("localhost:9092");
    let manager = create_manager(&broker);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(async move {
        let mut handler = RecordingHandler { stop_after: Some(2), ..Default::default() };
        let report = manager.run(TOPIC, GroupId::generate("test"), &cancel, &mut handler).await;
        (report, handler)
    });

    broker.wait_for_subscribers(TOPIC, 1).await;
    broker.publish(TOPIC, "one");
    broker.publish(TOPIC, "two");
    broker.publish(TOPIC, "three");

    let (report, handler) = handle.await?;

    assert_eq!(report.status, SessionStatus::Stopped);
    assert!(report.error.is_none());
    assert!(handler.subscribed);
    assert_eq!(handler.payloads, vec![b"one".to_vec(), b"two".to_vec()]);
    assert_eq!(broker.disconnects(), 1);
    assert_eq!(broker.subscribers(TOPIC), 0);

    Ok(())
}

#[tokio::test]
async fn test_cancellation_while_waiting_for_records_disconnects_once() -> Result<()> {
    let broker = MemoryBroker::new("localhost:9092");
    let manager = create_manager(&broker);
    let cancel = CancellationToken::new();

    let token = cancel.clone();
    let handle = tokio::spawn(async move {
        let mut handler = RecordingHandler::default();
        manager.run(TOPIC, GroupId::generate("test"), &token, &mut handler).await
    });

    broker.wait_for_subscribers(TOPIC, 1).await;
    cancel.cancel();

    let report = handle.await?;

    assert_eq!(report.status, SessionStatus::Cancelled);
    assert_eq!(broker.disconnects(), 1);

    Ok(())
}

#[tokio::test]
async fn test_session_cancelled_before_start_never_connects() -> Result<()> {
    let broker = MemoryBroker::new("localhost:9092");
    let manager = create_manager(&broker);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut handler = RecordingHandler::default();
    let report = manager.run(TOPIC, GroupId::generate("test"), &cancel, &mut handler).await;

    assert_eq!(report.status, SessionStatus::Cancelled);
    assert_eq!(broker.connects(), 0);
    assert_eq!(broker.disconnects(), 1);
    assert!(!handler.subscribed);

    Ok(())
}

#[tokio::test]
async fn test_connect_failure_is_reported_and_still_disconnects_once() -> Result<()> {
    let broker = MemoryBroker::new("localhost:9092");
    broker.set_reachable(false);
    let manager = create_manager(&broker);

    let mut handler = RecordingHandler::default();
    let report = manager.run(TOPIC, GroupId::generate("test"), &CancellationToken::new(), &mut handler).await;

    assert_eq!(report.status, SessionStatus::Failed);
    assert!(matches!(report.error, Some(SessionError::Connect(_))));
    assert!(report.is_broker_unavailable());
    assert_eq!(broker.disconnects(), 1);

    Ok(())
}

#[tokio::test]
async fn test_subscribe_failure_is_reported_as_broker_unavailable() -> Result<()> {
    let broker = MemoryBroker::new("localhost:9092");
    broker.reject_subscriptions(true);
    let manager = create_manager(&broker);

    let mut handler = RecordingHandler::default();
    let report = manager.run(TOPIC, GroupId::generate("test"), &CancellationToken::new(), &mut handler).await;

    assert!(matches!(report.error, Some(SessionError::Subscribe { .. })));
    assert!(report.is_broker_unavailable());
    assert_eq!(broker.disconnects(), 1);

    Ok(())
}

#[tokio::test]
async fn test_runtime_failure_ends_session_after_delivered_records() -> Result<()> {
    let broker = MemoryBroker::new("localhost:9092");
    let manager = create_manager(&broker);

    let handle = tokio::spawn(async move {
        let mut handler = RecordingHandler::default();
        let report = manager.run(TOPIC, GroupId::generate("test"), &CancellationToken::new(), &mut handler).await;
        (report, handler)
    });

    broker.wait_for_subscribers(TOPIC, 1).await;
    broker.publish(TOPIC, "delivered");
    broker.publish_failure(TOPIC, "leader not available");

    let (report, handler) = handle.await?;

    assert_eq!(report.status, SessionStatus::Failed);
    assert!(matches!(report.error, Some(SessionError::Runtime(_))));
    assert!(!report.is_broker_unavailable());
    assert_eq!(handler.payloads.len(), 1);
    assert_eq!(broker.disconnects(), 1);

    Ok(())
}

#[tokio::test]
async fn test_disconnect_failure_is_recorded_not_raised() -> Result<()> {
    let broker = MemoryBroker::new("localhost:9092");
    broker.fail_disconnects(true);
    let manager = create_manager(&broker);

    let handle = tokio::spawn(async move {
        let mut handler = RecordingHandler { stop_after: Some(1), ..Default::default() };
        manager.run(TOPIC, GroupId::generate("test"), &CancellationToken::new(), &mut handler).await
    });

    broker.wait_for_subscribers(TOPIC, 1).await;
    broker.publish(TOPIC, "only");

    let report = handle.await?;

    assert_eq!(report.status, SessionStatus::Stopped);
    assert!(report.error.is_none());
    assert!(report.disconnect_error.is_some());
    assert_eq!(broker.disconnects(), 1);

    Ok(())
}

#[tokio::test]
async fn test_consumer_session_rejects_out_of_order_transitions() -> Result<()> {
    let broker = MemoryBroker::new("localhost:9092");
    let consumer = broker.create_consumer(&ConsumerSettings {
        client_id: "test-client".to_string(),
        group_id: GroupId::generate("test"),
        from_beginning: false
    })?;
    let mut session = ConsumerSession::new(consumer, GroupId::generate("test"));

    let result = session.subscribe(TOPIC).await;

    assert!(matches!(result, Err(SessionError::InvalidTransition { from: SessionState::Created, .. })));
    assert_eq!(session.state(), SessionState::Created);

    session.connect().await?;
    session.subscribe(TOPIC).await?;

    assert_eq!(session.state(), SessionState::Subscribed);

    Ok(())
}

#[tokio::test]
async fn test_consumer_session_closes_exactly_once() -> Result<()> {
    let broker = MemoryBroker::new("localhost:9092");
    let consumer = broker.create_consumer(&ConsumerSettings {
        client_id: "test-client".to_string(),
        group_id: GroupId::generate("test"),
        from_beginning: false
    })?;
    let mut session = ConsumerSession::new(consumer, GroupId::generate("test"));
    session.connect().await?;

    assert!(session.close().await.is_none());
    assert!(session.close().await.is_none());
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(broker.disconnects(), 1);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_sessions_are_isolated() -> Result<()> {
    let broker = MemoryBroker::new("localhost:9092");
    let cancel = CancellationToken::new();

    let handles: Vec<_> = (0..2).map(|_| {
        let manager = create_manager(&broker);
        let token = cancel.clone();
        tokio::spawn(async move {
            let mut handler = RecordingHandler { stop_after: Some(1), ..Default::default() };
            let report = manager.run(TOPIC, GroupId::generate("test"), &token, &mut handler).await;
            (report, handler)
        })
    }).collect();

    broker.wait_for_subscribers(TOPIC, 2).await;
    broker.publish(TOPIC, "shared");

    for handle in handles {
        let (report, handler) = handle.await?;
        assert_eq!(report.status, SessionStatus::Stopped);
        assert_eq!(handler.payloads, vec![b"shared".to_vec()]);
    }

    assert_eq!(broker.consumers_created(), 2);
    assert_eq!(broker.distinct_group_ids(), 2);
    assert_eq!(broker.disconnects(), 2);

    Ok(())
}
