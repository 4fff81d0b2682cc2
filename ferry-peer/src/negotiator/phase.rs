use std::fmt;

/// Where a negotiation stands.
///
/// The sender moves through `Idle`, `LocalDescriptionCreated`,
/// `LocalDescriptionSent`, `RemoteDescriptionApplied`,
/// `ConnectivityEstablished` and `ChannelOpen`. The receiver goes `Idle`,
/// `Joined`, `RemoteDescriptionReceived`, `LocalDescriptionCreated`,
/// `LocalDescriptionSent`, `ConnectivityEstablished`, `ChannelOpen`. Both end
/// in one of the terminal phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Joined,
    RemoteDescriptionReceived,
    LocalDescriptionCreated,
    LocalDescriptionSent,
    RemoteDescriptionApplied,
    ConnectivityEstablished,
    ChannelOpen,
    Completed,
    Failed,
    TimedOut,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed | Phase::TimedOut)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Joined => "joined",
            Phase::RemoteDescriptionReceived => "remote-description-received",
            Phase::LocalDescriptionCreated => "local-description-created",
            Phase::LocalDescriptionSent => "local-description-sent",
            Phase::RemoteDescriptionApplied => "remote-description-applied",
            Phase::ConnectivityEstablished => "connectivity-established",
            Phase::ChannelOpen => "channel-open",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
            Phase::TimedOut => "timed-out",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a negotiation was waiting for when a timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    RoomJoin,
    PeerJoin,
    DescriptionSend,
    RemoteDescription,
    Connectivity,
    ChannelOpen,
}

impl fmt::Display for Wait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Wait::RoomJoin => "room confirmation",
            Wait::PeerJoin => "a peer to join",
            Wait::DescriptionSend => "the description to be sent",
            Wait::RemoteDescription => "the remote description",
            Wait::Connectivity => "connectivity",
            Wait::ChannelOpen => "the data channel to open",
        };
        f.write_str(s)
    }
}
