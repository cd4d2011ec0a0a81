/// Failures reported by the wireless stack.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[cfg(feature = "ble")]
    #[error("bluetooth error: {0}")]
    Bluetooth(#[from] bluer::Error),

    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("subscriber disconnected")]
    Disconnected,
}

/// The one wireless value this device exposes.
///
/// Single writer: only the telemetry loop calls `set_value` and `notify`. Remote clients read
/// the latest value and may subscribe to change notifications. At most one subscriber is
/// tracked; a new subscription replaces the previous one.
pub trait Characteristic {
    /// Replaces the value remote clients read.
    fn set_value(&mut self, value: &str) -> Result<(), LinkError>;

    /// Whether a value has been set since startup.
    fn has_value(&self) -> bool;

    /// Pushes the current value to the subscriber. A no-op without one.
    fn notify(&mut self) -> Result<(), LinkError>;

    /// Installs a subscription that arrived since the last call, replacing the current
    /// subscriber. Returns `false` when nothing new arrived.
    fn accept_subscriber(&mut self) -> bool {
        false
    }

    /// Most recent value written by a remote client, if the characteristic is writable.
    fn take_written(&mut self) -> Option<String> {
        None
    }

    fn publish(&mut self, value: &str) -> Result<(), LinkError> {
        self.set_value(value)?;
        self.notify()
    }

    /// Accepts a pending subscription and sends it the last published value, so a client
    /// that subscribes between cycles does not wait for the next successful one.
    ///
    /// Returns whether a new subscriber was accepted.
    fn on_subscribe(&mut self) -> Result<bool, LinkError> {
        if !self.accept_subscriber() {
            return Ok(false);
        }
        if self.has_value() {
            self.notify()?;
        }
        Ok(true)
    }
}
