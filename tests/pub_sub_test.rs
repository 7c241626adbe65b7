use std::{
    sync::Arc,
    time::Duration,
};

use anyhow::Result;
use tokio::sync::mpsc::unbounded_channel;
use wamp_router::{
    core::{
        id::Id,
        types::{
            Dictionary,
            List,
            Value,
        },
        uri::Uri,
    },
    message::message::{
        HelloMessage,
        Message,
        PublishMessage,
        SubscribeMessage,
        UnsubscribeMessage,
        WelcomeMessage,
    },
    peer::{
        local_pipe,
        LocalPeer,
        Peer,
    },
    router::{
        RealmConfig,
        Router,
        StandardRealm,
    },
};

mod common;

const REALM: &str = "com.example.realm";

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

const NO_TRAFFIC_TIMEOUT: Duration = Duration::from_millis(100);

async fn start_router() -> Result<Arc<Router>> {
    let router = Arc::new(Router::default());
    let uri = Uri::try_from(REALM)?;
    router
        .register_realm(
            uri.clone(),
            Arc::new(StandardRealm::new(RealmConfig {
                name: "test".to_owned(),
                uri,
            })),
        )
        .await?;
    Ok(router)
}

async fn join_realm(router: &Arc<Router>) -> (LocalPeer, WelcomeMessage) {
    let (client, server) = local_pipe();
    let accepting = router.clone();
    tokio::spawn(async move { accepting.accept(Arc::new(server)).await });
    client
        .send(Message::Hello(HelloMessage {
            realm: Uri::try_from(REALM).unwrap(),
            details: Dictionary::default(),
        }))
        .await
        .unwrap();
    let welcome = match client.receive_timeout(RECV_TIMEOUT).await.unwrap() {
        Message::Welcome(welcome) => welcome,
        message => panic!("expected WELCOME, received {}", message.message_name()),
    };
    (client, welcome)
}

async fn subscribe(client: &LocalPeer, request: u64, topic: &str) -> Id {
    client
        .send(Message::Subscribe(SubscribeMessage {
            request: Id::try_from(request).unwrap(),
            options: Dictionary::default(),
            topic: Uri::try_from(topic).unwrap(),
        }))
        .await
        .unwrap();
    match client.receive_timeout(RECV_TIMEOUT).await.unwrap() {
        Message::Subscribed(subscribed) => {
            assert_eq!(subscribed.request, Id::try_from(request).unwrap());
            subscribed.subscription
        }
        message => panic!("expected SUBSCRIBED, received {}", message.message_name()),
    }
}

fn publish(request: u64, topic: &str, arguments: List, options: Dictionary) -> Message {
    Message::Publish(PublishMessage {
        request: Id::try_from(request).unwrap(),
        options,
        topic: Uri::try_from(topic).unwrap(),
        arguments,
        arguments_keyword: Dictionary::default(),
    })
}

#[tokio::test]
async fn subscriber_receives_published_events() {
    common::setup_test_environment();

    let router = start_router().await.unwrap();
    let (subscriber, _) = join_realm(&router).await;
    let (publisher, _) = join_realm(&router).await;

    let subscription = subscribe(&subscriber, 1, "com.example.topic1").await;

    publisher
        .send(publish(
            9,
            "com.example.topic1",
            List::from_iter([Value::Integer(42)]),
            Dictionary::default(),
        ))
        .await
        .unwrap();

    assert_matches::assert_matches!(
        subscriber.receive_timeout(RECV_TIMEOUT).await,
        Ok(Message::Event(event)) => {
            assert_eq!(event.subscription, subscription);
            assert_ne!(u64::from(event.publication), 0);
            pretty_assertions::assert_eq!(
                event.arguments,
                List::from_iter([Value::Integer(42)])
            );
        }
    );
    // The publisher is not subscribed, so it hears nothing back.
    assert_matches::assert_matches!(
        publisher.receive_timeout(NO_TRAFFIC_TIMEOUT).await,
        Err(_)
    );
}

#[tokio::test]
async fn acknowledged_publish_confirms_to_publisher() {
    common::setup_test_environment();

    let router = start_router().await.unwrap();
    let (subscriber, _) = join_realm(&router).await;
    let (publisher, _) = join_realm(&router).await;

    subscribe(&subscriber, 1, "com.example.topic1").await;

    publisher
        .send(publish(
            9,
            "com.example.topic1",
            List::from_iter([Value::from("hi")]),
            Dictionary::from_iter([("acknowledge".to_owned(), Value::Bool(true))]),
        ))
        .await
        .unwrap();

    assert_matches::assert_matches!(
        publisher.receive_timeout(RECV_TIMEOUT).await,
        Ok(Message::Published(published)) => {
            assert_eq!(published.request, Id::try_from(9).unwrap());
        }
    );
    assert_matches::assert_matches!(
        subscriber.receive_timeout(RECV_TIMEOUT).await,
        Ok(Message::Event(event)) => {
            pretty_assertions::assert_eq!(
                event.arguments,
                List::from_iter([Value::from("hi")])
            );
        }
    );
}

#[tokio::test]
async fn unsubscribing_stops_delivery() {
    common::setup_test_environment();

    let router = start_router().await.unwrap();
    let (subscriber, _) = join_realm(&router).await;
    let (publisher, _) = join_realm(&router).await;

    let subscription = subscribe(&subscriber, 1, "com.example.topic1").await;

    subscriber
        .send(Message::Unsubscribe(UnsubscribeMessage {
            request: Id::try_from(2).unwrap(),
            subscription: subscription,
        }))
        .await
        .unwrap();
    assert_matches::assert_matches!(
        subscriber.receive_timeout(RECV_TIMEOUT).await,
        Ok(Message::Unsubscribed(unsubscribed)) => {
            assert_eq!(unsubscribed.request, Id::try_from(2).unwrap());
        }
    );

    publisher
        .send(publish(
            9,
            "com.example.topic1",
            List::default(),
            Dictionary::default(),
        ))
        .await
        .unwrap();
    assert_matches::assert_matches!(
        subscriber.receive_timeout(NO_TRAFFIC_TIMEOUT).await,
        Err(_)
    );

    // Unsubscribing again names a subscription that no longer exists.
    subscriber
        .send(Message::Unsubscribe(UnsubscribeMessage {
            request: Id::try_from(3).unwrap(),
            subscription: subscription,
        }))
        .await
        .unwrap();
    assert_matches::assert_matches!(
        subscriber.receive_timeout(RECV_TIMEOUT).await,
        Ok(Message::Error(error)) => {
            assert_eq!(error.request_type, 34);
            assert_eq!(error.request, Id::try_from(3).unwrap());
            assert_eq!(error.error.as_ref(), "wamp.error.no_such_subscription");
        }
    );
}

#[tokio::test]
async fn disconnecting_cleans_up_subscriptions() {
    common::setup_test_environment();

    let router = start_router().await.unwrap();
    let (close_tx, mut close_rx) = unbounded_channel();
    router
        .add_session_close_callback(Arc::new(move |id, _, _| {
            close_tx.send(id).ok();
        }))
        .await;

    let (subscriber, welcome) = join_realm(&router).await;
    let (publisher, _) = join_realm(&router).await;

    subscribe(&subscriber, 1, "com.example.topic1").await;
    subscribe(&subscriber, 2, "com.example.topic2").await;

    subscriber.close().await.unwrap();
    let closed = tokio::time::timeout(RECV_TIMEOUT, close_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(closed, welcome.id);

    // The topic's subscriber set is empty again; the publish completes and
    // acknowledges without a single delivery.
    publisher
        .send(publish(
            9,
            "com.example.topic1",
            List::default(),
            Dictionary::from_iter([("acknowledge".to_owned(), Value::Bool(true))]),
        ))
        .await
        .unwrap();
    assert_matches::assert_matches!(
        publisher.receive_timeout(RECV_TIMEOUT).await,
        Ok(Message::Published(_))
    );
}

#[tokio::test]
async fn publisher_does_not_receive_its_own_event() {
    common::setup_test_environment();

    let router = start_router().await.unwrap();
    let (client, _) = join_realm(&router).await;

    subscribe(&client, 1, "com.example.topic1").await;

    client
        .send(publish(
            9,
            "com.example.topic1",
            List::from_iter([Value::Integer(7)]),
            Dictionary::from_iter([("acknowledge".to_owned(), Value::Bool(true))]),
        ))
        .await
        .unwrap();

    // The acknowledgement arrives without any EVENT queued ahead of it.
    assert_matches::assert_matches!(
        client.receive_timeout(RECV_TIMEOUT).await,
        Ok(Message::Published(_))
    );
    assert_matches::assert_matches!(
        client.receive_timeout(NO_TRAFFIC_TIMEOUT).await,
        Err(_)
    );
}

#[tokio::test]
async fn mismatched_options_skip_only_that_subscriber() {
    common::setup_test_environment();

    let router = start_router().await.unwrap();
    let (exact, _) = join_realm(&router).await;
    let (open, _) = join_realm(&router).await;
    let (publisher, _) = join_realm(&router).await;

    exact
        .send(Message::Subscribe(SubscribeMessage {
            request: Id::try_from(1).unwrap(),
            options: Dictionary::from_iter([("match".to_owned(), Value::from("exact"))]),
            topic: Uri::try_from("com.example.topic1").unwrap(),
        }))
        .await
        .unwrap();
    assert_matches::assert_matches!(
        exact.receive_timeout(RECV_TIMEOUT).await,
        Ok(Message::Subscribed(_))
    );
    subscribe(&open, 1, "com.example.topic1").await;

    publisher
        .send(publish(
            9,
            "com.example.topic1",
            List::default(),
            Dictionary::from_iter([("match".to_owned(), Value::from("prefix"))]),
        ))
        .await
        .unwrap();

    assert_matches::assert_matches!(
        open.receive_timeout(RECV_TIMEOUT).await,
        Ok(Message::Event(_))
    );
    assert_matches::assert_matches!(
        exact.receive_timeout(NO_TRAFFIC_TIMEOUT).await,
        Err(_)
    );
}
