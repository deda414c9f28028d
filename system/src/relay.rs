use crate::{ConnectionId, DeliveryError, EventSink, RoomEvent, RoomKey, RoomSummary};
use std::collections::{HashMap, HashSet};
use std::num::Wrapping;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("connection {0} is not connected")]
    UnknownConnection(ConnectionId),
}

struct Session<S> {
    sink: S,
    room_key: Option<RoomKey>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub dropped: usize,
    /// Recipients whose sink is gone. They should be disconnected.
    pub closed: Vec<ConnectionId>,
}

/// Room membership plus fan-out.
///
/// A room entry exists iff at least one session is in it. The owner is
/// expected to serialize all calls (e.g. by owning the relay in a single task).
pub struct Relay<S> {
    connection_id_source: Wrapping<ConnectionId>,
    sessions: HashMap<ConnectionId, Session<S>>,
    rooms: HashMap<RoomKey, HashSet<ConnectionId>>,
}

impl<S: EventSink> Relay<S> {
    pub fn new() -> Self {
        Self {
            connection_id_source: Wrapping(0),
            sessions: HashMap::new(),
            rooms: HashMap::new(),
        }
    }

    pub fn connect(&mut self, sink: S) -> ConnectionId {
        let connection_id = self.new_connection_id();
        self.sessions.insert(
            connection_id,
            Session {
                sink,
                room_key: None,
            },
        );
        log::debug!("Connection {} connected", connection_id);
        connection_id
    }

    /// Moves the connection into `room_key`, returning the room it left.
    pub fn join_room(
        &mut self,
        connection_id: &ConnectionId,
        room_key: RoomKey,
    ) -> Result<Option<RoomKey>, RelayError> {
        match self.sessions.get(connection_id) {
            None => return Err(RelayError::UnknownConnection(*connection_id)),
            Some(session) if session.room_key.as_ref() == Some(&room_key) => return Ok(None),
            Some(_) => {}
        }

        let previous = self.leave_room(connection_id);
        self.rooms
            .entry(room_key.clone())
            .or_insert_with(HashSet::new)
            .insert(*connection_id);
        log::info!("Connection {} joined room {}", connection_id, room_key);
        if let Some(session) = self.sessions.get_mut(connection_id) {
            session.room_key = Some(room_key);
        }
        Ok(previous)
    }

    pub fn leave_room(&mut self, connection_id: &ConnectionId) -> Option<RoomKey> {
        let room_key = self.sessions.get_mut(connection_id)?.room_key.take()?;
        if let Some(members) = self.rooms.get_mut(&room_key) {
            members.remove(connection_id);
            if members.is_empty() {
                self.rooms.remove(&room_key);
                log::debug!("Room {} is empty, discarded", room_key);
            }
        }
        log::info!("Connection {} left room {}", connection_id, room_key);
        Some(room_key)
    }

    /// Forwards `event` to every other member of the sender's room.
    pub fn dispatch(&mut self, from: &ConnectionId, event: &RoomEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        let room_key = match self.sessions.get(from).and_then(|s| s.room_key.clone()) {
            Some(room_key) => room_key,
            None => {
                log::debug!("Dropped {} from {}: not in a room", event.kind.as_str(), from);
                return report;
            }
        };
        let members = match self.rooms.get(&room_key) {
            Some(members) => members,
            None => return report,
        };

        for connection_id in members.iter().filter(|c| *c != from) {
            let session = match self.sessions.get_mut(connection_id) {
                Some(session) => session,
                None => continue,
            };
            match session.sink.try_deliver(event) {
                Ok(()) => report.delivered += 1,
                Err(DeliveryError::Full) => report.dropped += 1,
                Err(DeliveryError::Closed) => {
                    report.dropped += 1;
                    report.closed.push(*connection_id);
                }
            }
        }

        log::debug!(
            "{} in room {} by {}: delivered {}, dropped {}",
            event.kind.as_str(),
            room_key,
            from,
            report.delivered,
            report.dropped
        );
        report
    }

    /// Leaves the current room and forgets the connection.
    pub fn disconnect(&mut self, connection_id: &ConnectionId) -> bool {
        self.leave_room(connection_id);
        let removed = self.sessions.remove(connection_id).is_some();
        if removed {
            log::info!("Connection {} disconnected", connection_id);
        }
        removed
    }

    pub fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        self.sessions.contains_key(connection_id)
    }

    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<&RoomKey> {
        self.sessions
            .get(connection_id)
            .and_then(|s| s.room_key.as_ref())
    }

    pub fn members(&self, room_key: &RoomKey) -> Vec<ConnectionId> {
        let mut members: Vec<ConnectionId> = self
            .rooms
            .get(room_key)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default();
        members.sort_unstable();
        members
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn room_summaries(&self) -> Vec<RoomSummary> {
        let mut summaries: Vec<RoomSummary> = self
            .rooms
            .iter()
            .map(|(room_key, members)| RoomSummary {
                room_key: room_key.clone(),
                members: members.len(),
            })
            .collect();
        summaries.sort_by(|a, b| a.room_key.cmp(&b.room_key));
        summaries
    }

    fn new_connection_id(&mut self) -> ConnectionId {
        loop {
            self.connection_id_source += Wrapping(1);
            if !self.sessions.contains_key(&self.connection_id_source.0) {
                break self.connection_id_source.0;
            }
        }
    }
}

impl<S: EventSink> Default for Relay<S> {
    fn default() -> Self {
        Self::new()
    }
}
