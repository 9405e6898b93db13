//! Prober Layer
//!
//! The capability to run one ICMP probe sequence against one target.
//!
//! - [`Pinger`]: A reusable handle bound to one endpoint
//! - [`PingerFactory`]: Resolves an endpoint and creates its handle
//! - [`IcmpPingerFactory`] / [`IcmpPinger`]: `surge-ping` implementation

mod icmp;
mod traits;

pub use icmp::{IcmpPinger, IcmpPingerFactory};
pub use traits::{
    DEFAULT_COUNT, DEFAULT_INTERVAL, DEFAULT_TIMEOUT, MAX_COUNT, Pinger, PingerFactory, PingerSettings,
    ProbeError, Statistics,
};
