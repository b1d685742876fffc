use bytes::Bytes;
use tcpmsg_actions::ActionMessage;

use crate::connection::Origin;

/// One discrete message received from a peer.
///
/// The payload convention is `<action-identifier>[ <body>]`: everything up
/// to the first ASCII space is the action identifier, the rest is the body.
/// The whole payload stays available to handlers untouched, so a payload
/// that does not follow the convention is still deliverable as raw bytes.
#[derive(Debug, Clone)]
pub struct Message {
    origin: Origin,
    payload: Bytes,
}

impl Message {
    pub(crate) fn new(origin: Origin, payload: Bytes) -> Self {
        Self { origin, payload }
    }

    /// The connection this message arrived on.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The full payload, identifier included.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// The leading action identifier, if the payload carries a usable one.
    ///
    /// `None` for an empty payload or when the leading token is not valid
    /// UTF-8; such messages dispatch as unmatched rather than failing.
    pub fn action(&self) -> Option<&str> {
        action_token(&self.payload)
    }

    /// Everything after the separating space; empty when the payload is
    /// only an identifier.
    pub fn body(&self) -> Bytes {
        match self.payload.iter().position(|&b| b == b' ') {
            Some(split) => self.payload.slice(split + 1..),
            None => Bytes::new(),
        }
    }

    /// The body as text, when it is valid UTF-8.
    pub fn body_utf8(&self) -> Option<&str> {
        let split = self
            .payload
            .iter()
            .position(|&b| b == b' ')
            .map(|split| split + 1)
            .unwrap_or(self.payload.len());
        std::str::from_utf8(&self.payload[split..]).ok()
    }
}

impl ActionMessage for Message {
    fn action(&self) -> Option<&str> {
        Message::action(self)
    }
}

fn action_token(payload: &[u8]) -> Option<&str> {
    let end = payload
        .iter()
        .position(|&b| b == b' ')
        .unwrap_or(payload.len());
    let token = std::str::from_utf8(&payload[..end]).ok()?;
    (!token.is_empty()).then_some(token)
}

/// Compose the wire payload for an action and body.
pub(crate) fn compose(action: &str, body: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(action.len() + 1 + body.len());
    payload.extend_from_slice(action.as_bytes());
    if !body.is_empty() {
        payload.push(b' ');
        payload.extend_from_slice(body);
    }
    payload
}
