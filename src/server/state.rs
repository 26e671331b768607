use crate::server::gateway::postgres::PgGateway;

/// Shared per-worker state. Collaborators are injected here instead of
/// living in ambient globals.
#[derive(Clone)]
pub(crate) struct AppState {
    gateway: PgGateway,
}

impl AppState {
    pub fn new(gateway: PgGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &PgGateway {
        &self.gateway
    }
}
