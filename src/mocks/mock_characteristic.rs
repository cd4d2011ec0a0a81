// This file is only compiled during tests

use std::collections::VecDeque;

use crate::characteristic::{Characteristic, LinkError};

/// Records every value and notification instead of talking to a radio.
///
/// Clients are numbered from 1 in the order they subscribe.
#[derive(Debug, Default)]
pub struct MockCharacteristic {
    value: Option<String>,
    history: Vec<String>,
    notifications: Vec<(u32, String)>,
    pending_writes: VecDeque<String>,
    last_client: u32,
    pending_subscriber: Option<u32>,
    subscriber: Option<u32>,
    fail_notify: bool,
}

impl MockCharacteristic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `notify` call fail, as if the link dropped.
    pub fn failing_notify() -> Self {
        Self {
            fail_notify: true,
            ..Self::default()
        }
    }

    /// Queues a value as if a remote client had written it.
    pub fn client_write(&mut self, value: &str) {
        self.pending_writes.push_back(value.to_string());
    }

    /// Queues a subscription from a new client and returns its number.
    pub fn client_subscribe(&mut self) -> u32 {
        self.last_client += 1;
        self.pending_subscriber = Some(self.last_client);
        self.last_client
    }

    pub fn subscriber(&self) -> Option<u32> {
        self.subscriber
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Every delivered notification as `(client, value)`.
    pub fn notifications(&self) -> &[(u32, String)] {
        &self.notifications
    }

    /// Values delivered to one client, in order.
    pub fn sent_to(&self, client: u32) -> Vec<&str> {
        self.notifications
            .iter()
            .filter(|(id, _)| *id == client)
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

impl Characteristic for MockCharacteristic {
    fn set_value(&mut self, value: &str) -> Result<(), LinkError> {
        self.value = Some(value.to_string());
        self.history.push(value.to_string());
        Ok(())
    }

    fn has_value(&self) -> bool {
        self.value.is_some()
    }

    fn notify(&mut self) -> Result<(), LinkError> {
        if self.fail_notify {
            return Err(LinkError::Disconnected);
        }
        if let (Some(client), Some(value)) = (self.subscriber, &self.value) {
            self.notifications.push((client, value.clone()));
        }
        Ok(())
    }

    fn accept_subscriber(&mut self) -> bool {
        match self.pending_subscriber.take() {
            Some(client) => {
                self.subscriber = Some(client);
                true
            }
            None => false,
        }
    }

    fn take_written(&mut self) -> Option<String> {
        self.pending_writes.pop_front()
    }
}
