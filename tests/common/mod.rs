//! Common test utilities
//!
//! This module provides a reference sequencer and a small in-memory network
//! so integration tests can drive several sessions against one server.

use notesync_core::operation::apply_all;
use notesync_core::transform::sequence;
use notesync_core::{transform, Broadcast, JoinSnapshot, Operation, Outbound, Revision, Session};
use ropey::Rope;
use std::collections::VecDeque;

/// Minimal server: assigns revisions and transforms late submissions
pub struct Sequencer {
    text: Rope,
    /// Committed parts per revision; index 0 holds revision 1
    history: Vec<Vec<Operation>>,
}

impl Sequencer {
    pub fn new(text: &str) -> Self {
        Self {
            text: Rope::from_str(text),
            history: Vec::new(),
        }
    }

    pub fn revision(&self) -> Revision {
        self.history.len() as Revision
    }

    pub fn text(&self) -> String {
        self.text.to_string()
    }

    pub fn snapshot(&self) -> JoinSnapshot {
        JoinSnapshot::new(self.text(), self.revision())
    }

    /// Accept a submission, transforming it past everything committed since
    /// the revision it was generated against
    pub fn submit(&mut self, outbound: Outbound) -> Broadcast {
        let mut parts = vec![outbound.operation];
        for committed in &self.history[outbound.revision as usize..] {
            for applied in committed {
                parts = parts
                    .iter()
                    .flat_map(|part| transform(part, applied))
                    .collect();
            }
        }

        let parts = sequence(parts);
        apply_all(&mut self.text, &parts).expect("sequencer received an invalid operation");
        self.history.push(parts.clone());

        Broadcast::with_operations(outbound.from, parts, self.revision())
    }
}

/// One participant plus its links to the sequencer
pub struct Client {
    pub session: Session,
    /// Submissions on their way to the sequencer
    pub uplink: VecDeque<Outbound>,
    /// Broadcasts on their way to this client
    pub downlink: VecDeque<Broadcast>,
}

/// A sequencer with clients attached, delivering messages on demand
pub struct Network {
    pub server: Sequencer,
    pub clients: Vec<Client>,
}

impl Network {
    pub fn new(text: &str, actors: &[&str]) -> Self {
        let server = Sequencer::new(text);
        let clients = actors
            .iter()
            .map(|actor| Client {
                session: Session::join(actor.to_string(), &server.snapshot()),
                uplink: VecDeque::new(),
                downlink: VecDeque::new(),
            })
            .collect();

        Self { server, clients }
    }

    pub fn insert(&mut self, client: usize, position: usize, text: &str) {
        let Client { session, uplink, .. } = &mut self.clients[client];
        session
            .insert(position, text, |out| uplink.push_back(out))
            .unwrap();
    }

    pub fn delete(&mut self, client: usize, position: usize, len: usize) {
        let Client { session, uplink, .. } = &mut self.clients[client];
        session
            .delete(position, len, |out| uplink.push_back(out))
            .unwrap();
    }

    /// Deliver the oldest submission of `client` to the sequencer
    pub fn deliver_uplink(&mut self, client: usize) -> bool {
        let Some(outbound) = self.clients[client].uplink.pop_front() else {
            return false;
        };

        let broadcast = self.server.submit(outbound);
        for peer in &mut self.clients {
            peer.downlink.push_back(broadcast.clone());
        }
        true
    }

    /// Deliver the oldest broadcast waiting for `client`
    pub fn deliver_downlink(&mut self, client: usize) -> bool {
        let Client {
            session,
            uplink,
            downlink,
        } = &mut self.clients[client];
        let Some(broadcast) = downlink.pop_front() else {
            return false;
        };

        session
            .receive(broadcast, |out| uplink.push_back(out))
            .unwrap();
        true
    }

    /// Deliver everything until the network is quiet
    pub fn settle(&mut self) {
        loop {
            let mut progressed = false;
            for client in 0..self.clients.len() {
                progressed |= self.deliver_uplink(client);
                while self.deliver_downlink(client) {
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.clients.iter().map(|c| c.session.text()).collect()
    }
}
