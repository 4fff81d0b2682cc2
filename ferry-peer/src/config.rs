use std::time::Duration;

pub const DEFAULT_STUN_URL: &str = "stun:175.24.2.28:3478";
pub const DEFAULT_TURN_URLS: [&str; 2] = [
    "turn:175.24.2.28:3478?transport=udp",
    "turn:175.24.2.28:3478?transport=tcp",
];
pub const DEFAULT_TURN_USERNAME: &str = "demo";
pub const DEFAULT_TURN_CREDENTIAL: &str = "demo123";
pub const DEFAULT_SIGNALING_URL: &str = "ws://175.24.2.28:37851/ws";

/// Largest payload chunk put into one channel message.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;
/// Hard ceiling of the transport's message size.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024;

/// One STUN or TURN server entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceServer {
    pub urls: Vec<String>,
    pub username: String,
    pub credential: String,
}

impl IceServer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: String::new(),
            credential: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServer>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::from_flags(None, None)
    }
}

impl TransportConfig {
    /// Builds the ICE server list from optional `--stun` / `--turn` values.
    ///
    /// A missing value falls back to the public default for that kind of
    /// server. User-supplied addresses get their `stun:` / `turn:` scheme
    /// added when it is absent.
    pub fn from_flags(stun: Option<&str>, turn: Option<&str>) -> Self {
        let stun = match stun.map(str::trim).filter(|s| !s.is_empty()) {
            Some(addr) => IceServer::new(with_scheme("stun:", addr)),
            None => IceServer::new(DEFAULT_STUN_URL),
        };
        let turn = match turn.map(str::trim).filter(|s| !s.is_empty()) {
            Some(addr) => IceServer::new(with_scheme("turn:", addr)),
            None => IceServer {
                urls: DEFAULT_TURN_URLS.iter().map(|u| u.to_string()).collect(),
                username: DEFAULT_TURN_USERNAME.to_owned(),
                credential: DEFAULT_TURN_CREDENTIAL.to_owned(),
            },
        };
        Self {
            ice_servers: vec![stun, turn],
        }
    }

    /// No ICE servers at all; host candidates only.
    pub fn local_only() -> Self {
        Self {
            ice_servers: Vec::new(),
        }
    }
}

fn with_scheme(scheme: &str, addr: &str) -> String {
    if addr.starts_with(scheme) {
        addr.to_owned()
    } else {
        format!("{scheme}{addr}")
    }
}

/// Upper bounds for every wait in a transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Confirmation of `create_room` / `join_room`.
    pub room_join: Duration,
    /// A receiver showing up in a freshly created room.
    pub peer_join: Duration,
    /// The counterpart's session description.
    pub remote_description: Duration,
    /// Local candidate gathering. Expiry is not fatal.
    pub gathering: Duration,
    pub connectivity: Duration,
    pub channel_open: Duration,
    /// Channel open to transfer done.
    pub transfer: Duration,
    /// The receiver's acknowledgment. Expiry is only a warning.
    pub ack: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            room_join: Duration::from_secs(5),
            peer_join: Duration::from_secs(5 * 60),
            remote_description: Duration::from_secs(5 * 60),
            gathering: Duration::from_secs(10),
            connectivity: Duration::from_secs(60),
            channel_open: Duration::from_secs(30),
            transfer: Duration::from_secs(30 * 60),
            ack: Duration::from_secs(5 * 60),
        }
    }
}

/// How session descriptions travel between the peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeMode {
    /// Through a signaling broker. `room_id` defaults to the file id.
    Broker {
        url: String,
        room_id: Option<String>,
    },
    /// Copy-paste by a human.
    Manual,
}

impl Default for ExchangeMode {
    fn default() -> Self {
        ExchangeMode::Broker {
            url: DEFAULT_SIGNALING_URL.to_owned(),
            room_id: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PeerConfig {
    pub transport: TransportConfig,
    pub timeouts: Timeouts,
    pub chunk_size: ChunkSize,
    pub exchange: ExchangeMode,
}

/// A chunk size clamped to `1..=MAX_CHUNK_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSize(usize);

impl ChunkSize {
    pub fn new(size: usize) -> Self {
        Self(size.clamp(1, MAX_CHUNK_SIZE))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self(DEFAULT_CHUNK_SIZE)
    }
}
