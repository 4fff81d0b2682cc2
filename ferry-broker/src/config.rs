use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Policy knobs for the signaling endpoint.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Cadence of keep-alive pings on the write loop.
    pub ping_interval: Duration,
    /// A connection that stays silent (no frame, no pong) this long is dropped.
    pub read_timeout: Duration,
    /// Outbound queue length per connection; overflowing it closes the connection.
    pub outbound_capacity: usize,
}

impl BrokerConfig {
    pub const DEFAULT_PORT: u16 = 37851;

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: Self::DEFAULT_PORT,
            ping_interval: Duration::from_secs(54),
            read_timeout: Duration::from_secs(60),
            outbound_capacity: 256,
        }
    }
}
