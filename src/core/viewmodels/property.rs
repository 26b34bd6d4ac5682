use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Change notification handle for a [`Property`].
pub struct PropertySubscriber {
    receiver: broadcast::Receiver<()>,
}

// Not Clone: every consumer calls Property::subscribe() for its own receiver.

impl PropertySubscriber {
    /// Waits for the next published change. Returns `false` once the property
    /// has been dropped and no further changes can arrive.
    pub async fn wait_for_change(&mut self) -> bool {
        match self.receiver.recv().await {
            Ok(_) => true,
            // Lagging only means several changes were coalesced
            Err(broadcast::error::RecvError::Lagged(_)) => true,
            Err(broadcast::error::RecvError::Closed) => false,
        }
    }

    pub fn try_recv(&mut self) -> bool {
        match self.receiver.try_recv() {
            Ok(_) => true,
            Err(broadcast::error::TryRecvError::Empty) => false,
            Err(broadcast::error::TryRecvError::Lagged(_)) => true,
            Err(broadcast::error::TryRecvError::Closed) => false,
        }
    }
}

/// Observable value container. Writers replace the whole value in one step,
/// so readers always see a complete value, never a partially updated one.
pub struct Property<T: Clone + Send + Sync> {
    watch_sender: Arc<watch::Sender<T>>,
    watch_receiver: watch::Receiver<T>,
    broadcast_sender: broadcast::Sender<()>,
    name: String,
}

impl<T: Clone + Send + Sync> Property<T> {
    pub fn new(initial_value: T, name: impl Into<String>) -> Self {
        let (watch_sender, watch_receiver) = watch::channel(initial_value);
        let (broadcast_sender, _) = broadcast::channel(64);
        Self {
            watch_sender: Arc::new(watch_sender),
            watch_receiver,
            broadcast_sender,
            name: name.into(),
        }
    }

    pub fn get(&self) -> T {
        self.watch_receiver.borrow().clone()
    }

    pub fn set(&self, new_value: T) {
        self.watch_sender.send_replace(new_value);
        let _ = self.broadcast_sender.send(());
    }

    pub fn subscribe(&self) -> PropertySubscriber {
        PropertySubscriber {
            receiver: self.broadcast_sender.subscribe(),
        }
    }

    /// A `watch` receiver for consumers that want `changed().await` semantics.
    pub fn watch(&self) -> watch::Receiver<T> {
        self.watch_receiver.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: Clone + Send + Sync + PartialEq> Property<T> {
    /// Publishes `new_value` only when it differs from the current value.
    /// Returns whether a change was published.
    pub fn set_if_changed(&self, new_value: T) -> bool {
        if *self.watch_receiver.borrow() == new_value {
            return false;
        }
        self.set(new_value);
        true
    }
}

impl<T: Clone + Send + Sync> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            watch_sender: self.watch_sender.clone(),
            watch_receiver: self.watch_receiver.clone(),
            broadcast_sender: self.broadcast_sender.clone(),
            name: self.name.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + Debug> Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Property({} = {:?})", self.name, self.get())
    }
}
