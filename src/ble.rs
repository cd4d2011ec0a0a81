//! BlueZ peripheral exposing the heading characteristic.
//!
//! The GATT callbacks run on a private tokio runtime; the telemetry loop stays synchronous and
//! only blocks on that runtime for the short write and notify calls. A subscription is only
//! queued by its callback and takes effect when the loop calls `on_subscribe`.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use bluer::Uuid;
use bluer::adv::{Advertisement, AdvertisementHandle, Type};
use bluer::gatt::local::{
    Application, ApplicationHandle, Characteristic as GattCharacteristic, CharacteristicNotifier,
    CharacteristicNotify, CharacteristicNotifyMethod, CharacteristicRead, CharacteristicWrite,
    CharacteristicWriteMethod, Service,
};
use futures::FutureExt;
use log::info;
use tokio::runtime::Runtime;
use tokio::sync::Mutex;

use crate::characteristic::{Characteristic, LinkError};
use crate::config::{
    ADV_APPEARANCE, ADV_MAX_INTERVAL, ADV_MIN_INTERVAL, CHARACTERISTIC_UUID, SERVICE_UUID,
};

/// Converts an advertising interval in 0.625 ms units to a duration.
pub fn adv_interval(units: u16) -> Duration {
    Duration::from_micros(units as u64 * 625)
}

#[derive(Clone, Debug)]
pub struct GattOptions {
    pub name: String,
    /// Accept writes from clients. Only the heartbeat demo enables this.
    pub writable: bool,
}

impl GattOptions {
    pub fn read_notify(name: &str) -> Self {
        Self {
            name: name.to_string(),
            writable: false,
        }
    }

    pub fn writable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            writable: true,
        }
    }
}

type Shared<T> = Arc<Mutex<T>>;

pub struct GattServer {
    value: Shared<Vec<u8>>,
    pending: Shared<Option<CharacteristicNotifier>>,
    subscriber: Option<CharacteristicNotifier>,
    written: Shared<Option<Vec<u8>>>,
    _app: ApplicationHandle,
    _adv: AdvertisementHandle,
    _session: bluer::Session,
    // Dropped last: the handles above unregister through it.
    runtime: Runtime,
}

impl GattServer {
    /// Powers the default adapter, registers the service and starts advertising.
    pub fn start(options: GattOptions) -> Result<Self, LinkError> {
        let runtime = Runtime::new()?;
        let value: Shared<Vec<u8>> = Arc::default();
        let pending: Shared<Option<CharacteristicNotifier>> = Arc::default();
        let written: Shared<Option<Vec<u8>>> = Arc::default();

        let app = application(&options, &value, &pending, &written);
        let (session, app, adv) = runtime.block_on(async {
            let session = bluer::Session::new().await?;
            let adapter = session.default_adapter().await?;
            adapter.set_powered(true).await?;
            info!(
                "Bluetooth adapter {} ({})",
                adapter.name(),
                adapter.address().await?
            );

            let app = adapter.serve_gatt_application(app).await?;
            let adv = adapter.advertise(advertisement(&options.name)).await?;
            Ok::<_, LinkError>((session, app, adv))
        })?;

        info!("Advertising as {:?}", options.name);
        Ok(Self {
            value,
            pending,
            subscriber: None,
            written,
            _app: app,
            _adv: adv,
            _session: session,
            runtime,
        })
    }
}

/// Service UUID, name and fixed interval only; nothing is placed in a scan response.
fn advertisement(name: &str) -> Advertisement {
    Advertisement {
        advertisement_type: Type::Peripheral,
        service_uuids: BTreeSet::from([Uuid::from_u128(SERVICE_UUID)]),
        local_name: Some(name.to_string()),
        discoverable: Some(true),
        appearance: Some(ADV_APPEARANCE),
        min_interval: Some(adv_interval(ADV_MIN_INTERVAL)),
        max_interval: Some(adv_interval(ADV_MAX_INTERVAL)),
        ..Default::default()
    }
}

fn application(
    options: &GattOptions,
    value: &Shared<Vec<u8>>,
    pending: &Shared<Option<CharacteristicNotifier>>,
    written: &Shared<Option<Vec<u8>>>,
) -> Application {
    let read_value = value.clone();
    let pending = pending.clone();

    let write = options.writable.then(|| {
        let written = written.clone();
        CharacteristicWrite {
            write: true,
            write_without_response: true,
            method: CharacteristicWriteMethod::Fun(Box::new(move |new_value, _req| {
                let written = written.clone();
                async move {
                    *written.lock().await = Some(new_value);
                    Ok(())
                }
                .boxed()
            })),
            ..Default::default()
        }
    });

    Application {
        services: vec![Service {
            uuid: Uuid::from_u128(SERVICE_UUID),
            primary: true,
            characteristics: vec![GattCharacteristic {
                uuid: Uuid::from_u128(CHARACTERISTIC_UUID),
                read: Some(CharacteristicRead {
                    read: true,
                    fun: Box::new(move |_req| {
                        let value = read_value.clone();
                        async move { Ok(value.lock().await.clone()) }.boxed()
                    }),
                    ..Default::default()
                }),
                write,
                notify: Some(CharacteristicNotify {
                    notify: true,
                    method: CharacteristicNotifyMethod::Fun(Box::new(move |notifier| {
                        let pending = pending.clone();
                        async move {
                            *pending.lock().await = Some(notifier);
                        }
                        .boxed()
                    })),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    }
}

impl Characteristic for GattServer {
    fn set_value(&mut self, value: &str) -> Result<(), LinkError> {
        let bytes = value.as_bytes().to_vec();
        self.runtime.block_on(async {
            *self.value.lock().await = bytes;
        });
        Ok(())
    }

    fn has_value(&self) -> bool {
        self.runtime
            .block_on(async { !self.value.lock().await.is_empty() })
    }

    fn notify(&mut self) -> Result<(), LinkError> {
        let Self {
            runtime,
            value,
            subscriber,
            ..
        } = self;
        let Some(notifier) = subscriber.as_mut() else {
            return Ok(());
        };
        if notifier.is_stopped() {
            info!("Client unsubscribed");
            *subscriber = None;
            return Ok(());
        }

        let result = runtime.block_on(async {
            let current = value.lock().await.clone();
            notifier.notify(current).await
        });
        if let Err(e) = result {
            *subscriber = None;
            return Err(LinkError::from(e));
        }
        Ok(())
    }

    fn accept_subscriber(&mut self) -> bool {
        let Some(notifier) = self
            .runtime
            .block_on(async { self.pending.lock().await.take() })
        else {
            return false;
        };
        self.subscriber = Some(notifier);
        true
    }

    fn take_written(&mut self) -> Option<String> {
        let bytes = self
            .runtime
            .block_on(async { self.written.lock().await.take() })?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adv_interval_units() {
        assert_eq!(adv_interval(ADV_MIN_INTERVAL), Duration::from_millis(20));
        assert_eq!(adv_interval(ADV_MAX_INTERVAL), Duration::from_millis(40));
    }

    #[test]
    fn test_advertisement_fields() {
        let adv = advertisement("ESP32_Compass");
        assert_eq!(adv.appearance, Some(0x0000));
        assert_eq!(adv.local_name.as_deref(), Some("ESP32_Compass"));
        assert!(adv.service_uuids.contains(&Uuid::from_u128(SERVICE_UUID)));
    }
}
