use async_trait::async_trait;
use log::{
    debug,
    error,
};
use tokio::sync::RwLock;

use crate::{
    core::{
        error::InteractionError,
        hash::{
            HashMap,
            HashSet,
        },
        id::{
            Id,
            IdAllocator,
            RandomIdAllocator,
        },
        types::{
            Dictionary,
            Value,
        },
        uri::Uri,
    },
    message::{
        common::error_for_request,
        message::{
            EventMessage,
            Message,
            PublishMessage,
            PublishedMessage,
            SubscribeMessage,
            SubscribedMessage,
            UnsubscribeMessage,
            UnsubscribedMessage,
        },
    },
    router::session::SessionHandle,
};

/// The pub/sub subsystem of a realm: routes EVENTs from publishers to
/// subscribers.
///
/// All operations are safe to call concurrently from every session loop in
/// the realm. None of them fail to the caller; per-subscriber delivery
/// failures are logged and isolated.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Publishes a message to all subscribers of the topic.
    async fn publish(&self, publisher: &SessionHandle, message: PublishMessage);
    /// Subscribes the session to a topic.
    async fn subscribe(&self, subscriber: &SessionHandle, message: SubscribeMessage);
    /// Removes a single subscription.
    async fn unsubscribe(&self, subscriber: &SessionHandle, message: UnsubscribeMessage);
    /// Removes all subscriptions held by the session.
    async fn remove_subscriber(&self, subscriber: &SessionHandle);
}

/// The subscription registry.
///
/// The four maps form one unit: a subscription ID registered for a topic is
/// present in `routes` and `options` under that topic, in `subscriptions`,
/// and in its session's `sessions` entry, or in none of them. Topic and
/// session entries are pruned as soon as they empty out.
#[derive(Default)]
struct RoutingTables {
    routes: HashMap<Uri, HashMap<Id, SessionHandle>>,
    options: HashMap<Uri, HashMap<Id, Dictionary>>,
    subscriptions: HashMap<Id, Uri>,
    sessions: HashMap<Id, HashSet<Id>>,
}

/// Broker that routes events on byte-exact topic URIs.
pub struct StandardBroker {
    tables: RwLock<RoutingTables>,
    id_allocator: Box<dyn IdAllocator>,
}

impl StandardBroker {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(RoutingTables::default()),
            id_allocator: Box::new(RandomIdAllocator::default()),
        }
    }
}

impl Default for StandardBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for StandardBroker {
    /// Sends the published event to every subscriber of the topic, except the
    /// publisher itself.
    ///
    /// A subscriber is skipped when any option key present on both sides of
    /// the match carries different values. If `acknowledge` is literally
    /// `true` in the publish options, the publisher receives a PUBLISHED
    /// confirmation after the fanout.
    ///
    /// The registry read lock is held across the sends. Subscriber sets are
    /// expected to stay small; snapshotting the route under the lock and
    /// sending afterwards would also work if that assumption breaks down.
    async fn publish(&self, publisher: &SessionHandle, message: PublishMessage) {
        let publication = self.id_allocator.generate_id().await;
        {
            let tables = self.tables.read().await;
            if let Some(route) = tables.routes.get(&message.topic) {
                'subscriber: for (&id, subscriber) in route {
                    if subscriber.id() == publisher.id() {
                        continue;
                    }

                    if let Some(subscriber_options) = tables
                        .options
                        .get(&message.topic)
                        .and_then(|options| options.get(&id))
                    {
                        for (option, publish_value) in &message.options {
                            if subscriber_options
                                .get(option)
                                .is_some_and(|subscribe_value| subscribe_value != publish_value)
                            {
                                continue 'subscriber;
                            }
                        }
                    }

                    let event = Message::Event(EventMessage {
                        subscription: id,
                        publication,
                        details: Dictionary::default(),
                        arguments: message.arguments.clone(),
                        arguments_keyword: message.arguments_keyword.clone(),
                    });
                    if let Err(err) = subscriber.send(event).await {
                        error!(
                            "Failed to send EVENT to session {}: {err}",
                            subscriber.id()
                        );
                    }
                }
            }
        }

        if matches!(
            message.options.get("acknowledge"),
            Some(Value::Bool(true))
        ) {
            if let Err(err) = publisher
                .send(Message::Published(PublishedMessage {
                    request: message.request,
                    publication,
                }))
                .await
            {
                error!(
                    "Failed to send PUBLISHED to session {}: {err}",
                    publisher.id()
                );
            }
        }
    }

    async fn subscribe(&self, subscriber: &SessionHandle, message: SubscribeMessage) {
        let id = self.id_allocator.generate_id().await;

        {
            let mut tables = self.tables.write().await;
            tables
                .routes
                .entry(message.topic.clone())
                .or_default()
                .insert(id, subscriber.clone());
            tables
                .options
                .entry(message.topic.clone())
                .or_default()
                .insert(id, message.options);
            tables.subscriptions.insert(id, message.topic);
            tables
                .sessions
                .entry(subscriber.id())
                .or_default()
                .insert(id);
        }

        if let Err(err) = subscriber
            .send(Message::Subscribed(SubscribedMessage {
                request: message.request,
                subscription: id,
            }))
            .await
        {
            error!(
                "Failed to send SUBSCRIBED to session {}: {err}",
                subscriber.id()
            );
        }
    }

    /// Removes the subscription named by the request.
    ///
    /// The registry checks only that the subscription ID exists: any session
    /// holding the ID may remove it, whether or not it created it.
    async fn unsubscribe(&self, subscriber: &SessionHandle, message: UnsubscribeMessage) {
        let subscription = message.subscription;

        let known = {
            let mut tables = self.tables.write().await;
            match tables.subscriptions.remove(&subscription) {
                None => false,
                Some(topic) => {
                    match tables.routes.get_mut(&topic) {
                        None => error!("Unable to find routes for topic {topic}"),
                        Some(route) => {
                            if route.remove(&subscription).is_none() {
                                error!(
                                    "No {topic} route exists for subscription {subscription}"
                                );
                            }
                            if route.is_empty() {
                                tables.routes.remove(&topic);
                            }
                        }
                    }

                    match tables.options.get_mut(&topic) {
                        None => error!("Unable to find options for topic {topic}"),
                        Some(options) => {
                            if options.remove(&subscription).is_none() {
                                error!(
                                    "No {topic} options exist for subscription {subscription}"
                                );
                            }
                            if options.is_empty() {
                                tables.options.remove(&topic);
                            }
                        }
                    }

                    match tables.sessions.get_mut(&subscriber.id()) {
                        None => error!(
                            "Unable to find subscriptions of session {}",
                            subscriber.id()
                        ),
                        Some(subscriptions) => {
                            if !subscriptions.remove(&subscription) {
                                error!(
                                    "Session {} does not hold subscription {subscription}",
                                    subscriber.id()
                                );
                            }
                            if subscriptions.is_empty() {
                                tables.sessions.remove(&subscriber.id());
                            }
                        }
                    }

                    true
                }
            }
        };

        let response = if known {
            Message::Unsubscribed(UnsubscribedMessage {
                request: message.request,
            })
        } else {
            debug!("No such subscription {subscription}");
            error_for_request(
                &Message::Unsubscribe(message),
                &InteractionError::NoSuchSubscription.into(),
            )
        };
        if let Err(err) = subscriber.send(response).await {
            error!(
                "Failed to respond to UNSUBSCRIBE from session {}: {err}",
                subscriber.id()
            );
        }
    }

    /// Drops every subscription held by the session, tolerating entries that
    /// are already gone.
    async fn remove_subscriber(&self, subscriber: &SessionHandle) {
        let mut tables = self.tables.write().await;
        let subscriptions = match tables.sessions.remove(&subscriber.id()) {
            Some(subscriptions) => subscriptions,
            None => return,
        };
        for id in subscriptions {
            let topic = match tables.subscriptions.remove(&id) {
                Some(topic) => topic,
                None => continue,
            };
            if let Some(route) = tables.routes.get_mut(&topic) {
                route.remove(&id);
                if route.is_empty() {
                    tables.routes.remove(&topic);
                }
            }
            if let Some(options) = tables.options.get_mut(&topic) {
                options.remove(&id);
                if options.is_empty() {
                    tables.options.remove(&topic);
                }
            }
        }
    }
}
