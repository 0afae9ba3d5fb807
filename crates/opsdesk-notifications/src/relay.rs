use tracing::debug;

use crate::channels::{RelayChannel, RelayMessage};
use crate::router::{encode_click_url, route};
use crate::types::NotificationEvent;

/// Background half of the relay channel.
///
/// Runs independently of any surface, intercepts pushes, and forwards copies
/// to every open surface over the [`RelayChannel`]. It also turns clicks on
/// the notifications it rendered into a URL the surface can decode.
pub struct RelayWorker {
    port: RelayChannel,
}

impl RelayWorker {
    pub fn new(port: RelayChannel) -> Self {
        Self { port }
    }

    /// Forward an intercepted push; returns how many surfaces received it.
    pub fn forward_push(&self, event: NotificationEvent) -> usize {
        let delivered = self.port.post(RelayMessage::push(event));
        debug!(surfaces = delivered, "Relayed push to open surfaces");
        delivered
    }

    /// Handle activation of a worker-rendered notification.
    ///
    /// Returns the click URL; the surface decodes it with the same semantics
    /// as the primary router.
    pub fn notification_clicked(&self, event: &NotificationEvent) -> String {
        let url = encode_click_url(&route(event));
        let delivered = self.port.post(RelayMessage::NotificationClick { url: url.clone() });
        debug!(url = %url, surfaces = delivered, "Relayed notification click");
        url
    }
}
