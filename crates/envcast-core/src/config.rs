//! BLE identity of the broadcaster.

use serde::{Deserialize, Serialize};

/// Name and UUIDs the device advertises under.
///
/// The defaults are the identity already-paired receivers subscribe to;
/// change them only together with the peer apps.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct BleConfig<'a> {
    pub local_name: &'a str,
    pub service_uuid: &'a str,
    pub characteristic_uuid: &'a str,
}

impl Default for BleConfig<'_> {
    fn default() -> Self {
        Self {
            local_name: "Envcast Env.Sensor",
            service_uuid: "133fe8d4-5197-4675-9d76-d9bbf2450bb4",
            characteristic_uuid: "0fc10cb8-0518-40dd-b5c3-c4637815de40",
        }
    }
}
