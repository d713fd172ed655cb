use log::debug;

use crate::request::Request;
use crate::response::StubResponse;
use crate::stub::{MatchContext, Stub};

/// The ordered, mutable collection of stubs owned by a server.
///
/// Registration order is match priority: the first stub registered is the first one
/// tried against every incoming request.
pub(crate) struct StubRegistry {
    stubs: Vec<Stub>,
}

impl StubRegistry {
    pub(crate) fn new() -> Self {
        Self { stubs: Vec::new() }
    }

    pub(crate) fn register(&mut self, stub: Stub) {
        self.stubs.push(stub);
    }

    pub(crate) fn clear(&mut self) {
        self.stubs.clear();
    }

    /// Walk the stubs in registration order and return the canned response of the first
    /// whole match, if any.
    ///
    /// Matching is read-only; pattern parameters captured along the way live in a fresh
    /// per-request context for each candidate stub, so concurrent requests never observe
    /// each other's captures.
    pub(crate) fn find_response(&self, request: &Request) -> Option<StubResponse> {
        debug!("Handling request.");
        for stub in &self.stubs {
            let mut ctx = MatchContext::new();
            if stub.matches(request, &mut ctx) {
                return Some(stub.response());
            }
        }
        None
    }
}
