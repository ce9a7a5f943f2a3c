use crate::dispatch::{self, Config};
use crate::error::LogError;
use crate::layer::BridgeLayer;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Install a [`Registry`] combined with [`BridgeLayer`] as the global
/// default `tracing` subscriber.
///
/// **Effects**
///
/// Every `tracing` event in the process is rendered and routed by the
/// process-wide dispatch, next to records emitted through
/// [`crate::Logger`].
///
/// **Returns**
/// - `Err(..)` if a global subscriber was already installed.
pub fn init_tracing_bridge() -> Result<(), SetGlobalDefaultError> {
    let subscriber = Registry::default().with(BridgeLayer::global());
    tracing::subscriber::set_global_default(subscriber)
}

/// Replace the process-wide configuration with [`Config::from_env`].
pub fn init_from_env() -> Result<(), LogError> {
    let config = Config::from_env()?;
    dispatch::global().set_config(config);
    Ok(())
}
