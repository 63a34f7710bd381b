//! Transmitter port.

use crate::codec::Payload;

/// Port for the wireless notify channel.
///
/// Connectionless, best-effort delivery: `publish` completes whether or not
/// a peer is subscribed, there is no delivery feedback, and the bridge never
/// retries. One-time transport setup (service registration, advertising)
/// happens in the composition root before the loop starts.
pub trait Transmitter {
    /// Hand one payload to the radio.
    fn publish(&mut self, payload: Payload) -> impl Future<Output = ()>;
}
