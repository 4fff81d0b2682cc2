use crate::config::Timeouts;
use crate::error::{ExchangeError, NegotiationError, TransportError};
use crate::exchange::DescriptionExchange;
use crate::negotiator::{Phase, Wait};
use crate::transport::{
    ConnectivityState, DataChannel, EventKind, EventQueue, PeerTransport, TransportEvent,
};
use ferry_core::{ClientRole, DescriptionKind, SessionDescription};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

/// Result of a successful negotiation.
pub struct Negotiated {
    pub channel: Arc<dyn DataChannel>,
    /// File id the sender announced alongside its offer.
    pub file_id: Option<String>,
}

/// Drives one peer from nothing to an open data channel.
///
/// Every wait is bounded by its entry in [`Timeouts`], and a fatal
/// connectivity report from the transport aborts whatever is being waited
/// on. Transport events that arrive early for a later phase are deferred
/// rather than dropped.
pub struct Negotiator<'a> {
    role: ClientRole,
    transport: &'a dyn PeerTransport,
    events: EventQueue,
    timeouts: Timeouts,
    phase: Phase,
    history: Vec<Phase>,
    started: Instant,
}

impl<'a> Negotiator<'a> {
    pub fn new(
        role: ClientRole,
        transport: &'a dyn PeerTransport,
        events: EventQueue,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            role,
            transport,
            events,
            timeouts,
            phase: Phase::Idle,
            history: vec![Phase::Idle],
            started: Instant::now(),
        }
    }

    pub fn role(&self) -> ClientRole {
        self.role
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Every phase entered so far, oldest first.
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    /// Event stream for the transfer once the channel is open.
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    pub fn complete(&mut self) {
        self.enter(Phase::Completed);
    }

    pub fn fail(&mut self) {
        self.enter(Phase::Failed);
    }

    /// Runs the handshake for this peer's role up to `ChannelOpen`.
    pub async fn run(
        &mut self,
        exchange: &mut dyn DescriptionExchange,
    ) -> Result<Negotiated, NegotiationError> {
        self.started = Instant::now();
        info!("Starting negotiation as {}", self.role);

        let result = match self.role {
            ClientRole::Sender => self.drive_sender(exchange).await,
            ClientRole::Receiver => self.drive_receiver(exchange).await,
        };

        match &result {
            Ok(_) => info!("Data channel ready after {:?}", self.elapsed()),
            Err(e) => {
                error!("Negotiation failed: {}", e);
                self.enter(if e.is_timeout() {
                    Phase::TimedOut
                } else {
                    Phase::Failed
                });
            }
        }
        result
    }

    async fn drive_sender(
        &mut self,
        exchange: &mut dyn DescriptionExchange,
    ) -> Result<Negotiated, NegotiationError> {
        let t = self.timeouts;

        self.transport
            .create_offer()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.enter(Phase::LocalDescriptionCreated);
        let blob = self.local_blob().await?;

        self.guarded(Wait::RoomJoin, t.room_join, exchange.open(ClientRole::Sender))
            .await?;
        self.guarded(Wait::PeerJoin, t.peer_join, exchange.wait_for_peer())
            .await?;
        self.guarded(
            Wait::DescriptionSend,
            t.room_join,
            exchange.send_description(&blob),
        )
        .await?;
        self.enter(Phase::LocalDescriptionSent);

        let remote = self
            .guarded(
                Wait::RemoteDescription,
                t.remote_description,
                exchange.receive_description(),
            )
            .await?;
        self.apply_remote(&remote.blob, DescriptionKind::Answer)
            .await?;
        self.enter(Phase::RemoteDescriptionApplied);

        self.await_connectivity().await?;
        let channel = self.await_channel().await?;
        Ok(Negotiated {
            channel,
            file_id: None,
        })
    }

    async fn drive_receiver(
        &mut self,
        exchange: &mut dyn DescriptionExchange,
    ) -> Result<Negotiated, NegotiationError> {
        let t = self.timeouts;

        self.guarded(Wait::RoomJoin, t.room_join, exchange.open(ClientRole::Receiver))
            .await?;
        self.enter(Phase::Joined);

        let remote = self
            .guarded(
                Wait::RemoteDescription,
                t.remote_description,
                exchange.receive_description(),
            )
            .await?;
        self.enter(Phase::RemoteDescriptionReceived);
        self.apply_remote(&remote.blob, DescriptionKind::Offer)
            .await?;

        self.transport
            .create_answer()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.enter(Phase::LocalDescriptionCreated);
        let blob = self.local_blob().await?;

        self.guarded(
            Wait::DescriptionSend,
            t.room_join,
            exchange.send_description(&blob),
        )
        .await?;
        self.enter(Phase::LocalDescriptionSent);

        self.await_connectivity().await?;
        let channel = self.await_channel().await?;
        Ok(Negotiated {
            channel,
            file_id: remote.file_id,
        })
    }

    /// Waits for gathering to settle, then encodes the local description.
    ///
    /// Gathering that outlasts its timeout is not an error: the description
    /// is sent with whatever candidates it has.
    async fn local_blob(&mut self) -> Result<String, NegotiationError> {
        let limit = self.timeouts.gathering;
        let deadline = sleep(limit);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    warn!("Candidate gathering still running after {:?}, proceeding", limit);
                    break;
                }
                event = self.events.recv() => match event {
                    Some(TransportEvent::GatheringComplete) => break,
                    other => self.absorb(other)?,
                },
            }
        }

        let desc = self
            .transport
            .local_description()
            .await
            .ok_or_else(|| self.transport_error(TransportError::NoLocalDescription))?;
        desc.encode()
            .map_err(|source| NegotiationError::InvalidDescription {
                phase: self.phase,
                after: self.elapsed(),
                source,
            })
    }

    async fn apply_remote(
        &mut self,
        blob: &str,
        expected: DescriptionKind,
    ) -> Result<(), NegotiationError> {
        let desc = SessionDescription::decode(blob).map_err(|source| {
            NegotiationError::InvalidDescription {
                phase: self.phase,
                after: self.elapsed(),
                source,
            }
        })?;
        if desc.kind != expected {
            return Err(NegotiationError::UnexpectedDescription {
                phase: self.phase,
                after: self.elapsed(),
                expected,
                actual: desc.kind,
            });
        }
        self.transport
            .set_remote_description(desc)
            .await
            .map_err(|e| self.transport_error(e))
    }

    async fn await_connectivity(&mut self) -> Result<(), NegotiationError> {
        // An already open channel implies connectivity.
        let settled = self.events.take_deferred(EventKind::Connectivity).is_some()
            || self.events.has_deferred(EventKind::ChannelOpen);

        if !settled {
            let deadline = sleep(self.timeouts.connectivity);
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    _ = &mut deadline => return Err(self.timed_out(Wait::Connectivity)),
                    event = self.events.recv() => match event {
                        Some(TransportEvent::Connectivity(ConnectivityState::Connected)) => break,
                        Some(event @ TransportEvent::ChannelOpen(_)) => {
                            self.events.defer(event);
                            break;
                        }
                        other => self.absorb(other)?,
                    },
                }
            }
        }

        self.enter(Phase::ConnectivityEstablished);
        Ok(())
    }

    async fn await_channel(&mut self) -> Result<Arc<dyn DataChannel>, NegotiationError> {
        let channel = match self.events.take_deferred(EventKind::ChannelOpen) {
            Some(TransportEvent::ChannelOpen(channel)) => channel,
            _ => {
                let deadline = sleep(self.timeouts.channel_open);
                tokio::pin!(deadline);
                loop {
                    tokio::select! {
                        _ = &mut deadline => return Err(self.timed_out(Wait::ChannelOpen)),
                        event = self.events.recv() => match event {
                            Some(TransportEvent::ChannelOpen(channel)) => break channel,
                            Some(TransportEvent::ChannelClosed) => {
                                return Err(self.connectivity_failed(ConnectivityState::Closed));
                            }
                            other => self.absorb(other)?,
                        },
                    }
                }
            }
        };

        self.enter(Phase::ChannelOpen);
        Ok(channel)
    }

    /// Runs an exchange step under `limit` while still watching the
    /// transport, so a connectivity failure pre-empts the wait.
    async fn guarded<T>(
        &mut self,
        waiting_for: Wait,
        limit: Duration,
        step: impl Future<Output = Result<T, ExchangeError>>,
    ) -> Result<T, NegotiationError> {
        let deadline = sleep(limit);
        tokio::pin!(deadline);
        tokio::pin!(step);

        loop {
            tokio::select! {
                result = &mut step => {
                    return result.map_err(|source| NegotiationError::Exchange {
                        phase: self.phase,
                        after: self.elapsed(),
                        source,
                    });
                }
                _ = &mut deadline => return Err(self.timed_out(waiting_for)),
                event = self.events.recv() => self.absorb(event)?,
            }
        }
    }

    /// Handles an event that is not the one currently awaited.
    fn absorb(&mut self, event: Option<TransportEvent>) -> Result<(), NegotiationError> {
        match event {
            None => Err(NegotiationError::EventsClosed {
                phase: self.phase,
                after: self.elapsed(),
            }),
            Some(TransportEvent::Connectivity(state)) if state.is_fatal() => {
                Err(self.connectivity_failed(state))
            }
            Some(
                event @ (TransportEvent::Connectivity(ConnectivityState::Connected)
                | TransportEvent::ChannelOpen(_)
                | TransportEvent::Message(_)
                | TransportEvent::ChannelClosed),
            ) => {
                self.events.defer(event);
                Ok(())
            }
            Some(event) => {
                debug!("Ignoring {:?} in phase {}", event, self.phase);
                Ok(())
            }
        }
    }

    fn enter(&mut self, phase: Phase) {
        info!("Negotiation {} -> {} ({:?})", self.phase, phase, self.elapsed());
        self.phase = phase;
        self.history.push(phase);
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn timed_out(&self, waiting_for: Wait) -> NegotiationError {
        NegotiationError::TimedOut {
            phase: self.phase,
            waiting_for,
            after: self.elapsed(),
        }
    }

    fn connectivity_failed(&self, state: ConnectivityState) -> NegotiationError {
        NegotiationError::ConnectivityFailed {
            phase: self.phase,
            state,
            after: self.elapsed(),
        }
    }

    fn transport_error(&self, source: TransportError) -> NegotiationError {
        NegotiationError::Transport {
            phase: self.phase,
            after: self.elapsed(),
            source,
        }
    }
}
