//! Wire domain services to either the Diesel repositories or the in-memory
//! store, depending on whether a database pool is configured.

use std::sync::Arc;

use mockable::DefaultClock;
use roadguard::domain::expiration::ExpirationSweeper;
use roadguard::domain::ports::{
    AlertEventPublisher, AlertRepository, ContributorRepository, NotificationRepository,
    SosRepository, VoteRepository,
};
use roadguard::domain::{
    AlertService, BroadcastService, NotificationService, SosService, VoteService,
};
use roadguard::inbound::http::state::HttpState;
use roadguard::outbound::memory::InMemoryStore;
use roadguard::outbound::persistence::{
    DieselAlertRepository, DieselContributorRepository, DieselNotificationRepository,
    DieselSosRepository, DieselVoteRepository,
};

use super::ServerConfig;

/// Everything the server needs from the domain layer.
pub(crate) struct DomainPorts {
    pub(crate) http: HttpState,
    pub(crate) sweeper: Arc<ExpirationSweeper>,
}

/// Build services over one repository set.
///
/// The alert service backs both the command and query ports.
fn build_ports<A, V, C, S, N>(
    alerts: Arc<A>,
    votes: Arc<V>,
    contributors: Arc<C>,
    sos: Arc<S>,
    notifications: Arc<N>,
    publisher: Arc<dyn AlertEventPublisher>,
) -> DomainPorts
where
    A: AlertRepository + 'static,
    V: VoteRepository + 'static,
    C: ContributorRepository + 'static,
    S: SosRepository + 'static,
    N: NotificationRepository + 'static,
{
    let clock = Arc::new(DefaultClock);
    let alert_service = Arc::new(AlertService::new(
        alerts.clone(),
        votes.clone(),
        contributors,
        publisher.clone(),
        clock.clone(),
    ));
    let vote_service = Arc::new(VoteService::new(
        alerts.clone(),
        votes,
        publisher.clone(),
        clock.clone(),
    ));
    let sos_service = Arc::new(SosService::new(sos, publisher.clone(), clock.clone()));
    let broadcast_service = Arc::new(BroadcastService::new(
        notifications.clone(),
        publisher.clone(),
        clock.clone(),
    ));
    let inbox = Arc::new(NotificationService::new(notifications));
    let sweeper = Arc::new(ExpirationSweeper::new(alerts, publisher, clock));

    DomainPorts {
        http: HttpState {
            alerts: alert_service.clone(),
            alert_query: alert_service,
            votes: vote_service,
            sos: sos_service,
            broadcast: broadcast_service,
            notifications: inbox,
        },
        sweeper,
    }
}

/// Choose the repository set from `config` and build the services on it.
pub(crate) fn build_domain_ports(
    config: &ServerConfig,
    publisher: Arc<dyn AlertEventPublisher>,
) -> DomainPorts {
    match &config.db_pool {
        Some(pool) => build_ports(
            Arc::new(DieselAlertRepository::new(pool.clone())),
            Arc::new(DieselVoteRepository::new(pool.clone())),
            Arc::new(DieselContributorRepository::new(pool.clone())),
            Arc::new(DieselSosRepository::new(pool.clone())),
            Arc::new(DieselNotificationRepository::new(pool.clone())),
            publisher,
        ),
        None => {
            let store = Arc::new(InMemoryStore::new());
            build_ports(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                store,
                publisher,
            )
        }
    }
}
