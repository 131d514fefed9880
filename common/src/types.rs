//! Defines common types that many crates can depend on
pub mod amount;
pub mod asset;
pub mod fee;
pub mod filter;
pub mod offer;
pub mod rates;

use tokio::sync::watch::{
    Receiver as WatchReceiver, Sender as WatchSender, channel as watch_channel,
};

/// A type alias for an empty channel used to signal cancellation to workers
pub type CancelChannel = WatchReceiver<()>;

/// Create a new cancel channel
pub fn new_cancel_channel() -> (WatchSender<()>, CancelChannel) {
    watch_channel(())
}
