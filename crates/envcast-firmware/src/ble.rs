//! BLE notify plumbing.
//!
//! The bridge hands payloads to [`BleTransmitter`], which is a non-blocking
//! push into a static channel. A dedicated task owns the trouble-host stack:
//! it advertises, accepts one connection at a time, and forwards each queued
//! payload as a GATT notification. Nothing feeds back to the bridge; a
//! payload with no subscribed peer is simply dropped, which is the
//! connectionless contract the receivers expect.

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};
use trouble_host::prelude::*;

use envcast_core::codec::Payload;
use envcast_core::config::BleConfig;
use envcast_core::transmit::Transmitter;

/// Payloads waiting for the radio. At ~30 Hz a reading is superseded in
/// 33 ms, so when the queue is full the freshest thing to do is drop.
static PAYLOADS: Channel<CriticalSectionRawMutex, Payload, 4> = Channel::new();

/// Max concurrent connections the host stack reserves resources for.
const CONNECTIONS_MAX: usize = 1;

/// One L2CAP channel (ATT) per connection.
const L2CAP_CHANNELS_MAX: usize = 2;

/// `Transmitter` half, handed to the bridge.
pub struct BleTransmitter;

impl Transmitter for BleTransmitter {
    async fn publish(&mut self, payload: Payload) {
        // Non-blocking by contract; a full queue means the radio is behind
        // and this reading would be stale before it ever left the antenna.
        let _ = PAYLOADS.try_send(payload);
    }
}

#[gatt_server]
struct Server {
    env: EnvService,
}

/// Environmental readings service. UUIDs match [`BleConfig::default`]; they
/// are the pairing surface of the already-deployed receiver apps.
#[gatt_service(uuid = "133fe8d4-5197-4675-9d76-d9bbf2450bb4")]
struct EnvService {
    /// 4-byte reading payload, see `envcast_core::codec`.
    #[characteristic(uuid = "0fc10cb8-0518-40dd-b5c3-c4637815de40", read, notify)]
    reading: [u8; 4],
}

/// Run the BLE side forever: advertise, serve one peer, advertise again.
pub async fn run<C: Controller>(controller: C, config: BleConfig<'static>) {
    let address = Address::random([0xE4, 0x5C, 0x1A, 0x05, 0xC0, 0xFF]);
    let mut resources: HostResources<DefaultPacketPool, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX> =
        HostResources::new();
    let stack = trouble_host::new(controller, &mut resources).set_random_address(address);
    let Host {
        mut peripheral,
        runner,
        ..
    } = stack.build();

    let server = Server::new_with_config(GapConfig::Peripheral(PeripheralConfig {
        name: config.local_name,
        appearance: &appearance::sensor::GENERIC_SENSOR,
    }))
    .expect("GATT attribute table");

    let serve = async {
        loop {
            match advertise(config.local_name, &mut peripheral, &server).await {
                Ok(conn) => {
                    info!("peer connected");
                    serve_connection(&server, &conn).await;
                    info!("peer disconnected");
                }
                Err(e) => {
                    warn!("advertise failed: {:?}", e);
                }
            }
        }
    };

    select(run_host(runner), serve).await;
}

/// Drive the host stack; it only returns on a controller failure.
async fn run_host<C: Controller, P: PacketPool>(mut runner: Runner<'_, C, P>) {
    if let Err(e) = runner.run().await {
        warn!("BLE host stopped: {:?}", e);
    }
}

/// Start advertising and wait for the next central to connect.
async fn advertise<'a, 'b, C: Controller>(
    name: &str,
    peripheral: &mut Peripheral<'a, C, DefaultPacketPool>,
    server: &'b Server<'_>,
) -> Result<GattConnection<'a, 'b, DefaultPacketPool>, BleHostError<C::Error>> {
    let mut adv_data = [0; 31];
    let len = AdStructure::encode_slice(
        &[
            AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
            AdStructure::CompleteLocalName(name.as_bytes()),
        ],
        &mut adv_data[..],
    )?;

    let advertiser = peripheral
        .advertise(
            &Default::default(),
            Advertisement::ConnectableScannableUndirected {
                adv_data: &adv_data[..len],
                scan_data: &[],
            },
        )
        .await?;

    info!("advertising started");
    let conn = advertiser.accept().await?.with_attribute_server(server)?;
    Ok(conn)
}

/// Pump GATT traffic and queued payloads until the peer goes away.
async fn serve_connection(
    server: &Server<'_>,
    conn: &GattConnection<'_, '_, DefaultPacketPool>,
) {
    let reading = &server.env.reading;
    loop {
        match select(conn.next(), PAYLOADS.receive()).await {
            Either::First(event) => match event {
                GattConnectionEvent::Disconnected { reason } => {
                    info!("disconnected: {:?}", reason);
                    break;
                }
                GattConnectionEvent::Gatt { event } => {
                    // Reads of the characteristic get the last written value.
                    match event.accept() {
                        Ok(reply) => reply.send().await,
                        Err(e) => warn!("GATT event rejected: {:?}", e),
                    }
                }
                _ => {}
            },
            Either::Second(payload) => {
                // Best-effort: a peer that never enabled notifications only
                // costs us the write into the attribute table.
                if let Err(e) = reading.notify(conn, &payload).await {
                    warn!("notify failed: {:?}", e);
                }
            }
        }
    }
}
