use std::sync::Arc;
use std::time::Duration;

use crate::repository::{AccessRepository, CheckinRepository, TicketRepository};
use crate::services::auth::AuthResolver;
use crate::services::identity::IdentityProvider;
use crate::services::token::TokenCodec;
use crate::utils::clock::Clock;

/// Dependencies shared by every request, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<TokenCodec>,
    pub auth: Arc<AuthResolver>,
    pub tickets: Arc<dyn TicketRepository>,
    pub checkins: Arc<dyn CheckinRepository>,
    pub clock: Arc<dyn Clock>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Wires a single store that backs every repository trait.
    pub fn new<S>(
        codec: TokenCodec,
        identity: Arc<dyn IdentityProvider>,
        store: S,
        clock: Arc<dyn Clock>,
        request_timeout: Duration,
    ) -> Self
    where
        S: AccessRepository + TicketRepository + CheckinRepository + Clone + 'static,
    {
        let access: Arc<dyn AccessRepository> = Arc::new(store.clone());
        Self {
            codec: Arc::new(codec),
            auth: Arc::new(AuthResolver::new(identity, access)),
            tickets: Arc::new(store.clone()),
            checkins: Arc::new(store),
            clock,
            request_timeout,
        }
    }
}
