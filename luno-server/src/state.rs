use std::sync::Arc;

use crate::clock::MonotonicClock;
use crate::content::ContentStore;
use crate::db::Database;
use crate::feed::FeedComposer;
use crate::graph::SocialGraph;
use crate::identity::AccountService;
use crate::media::MediaStore;
use crate::messaging::{ConnectionRegistry, MessagingRelay};
use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub accounts: AccountService,
    pub media: Arc<dyn MediaStore>,
    pub relay: MessagingRelay,
    pub clock: Arc<MonotonicClock>,
}

impl AppState {
    pub fn new(db: Database, session_manager: SessionManager, media: Arc<dyn MediaStore>) -> Self {
        let clock = Arc::new(MonotonicClock::new());
        let accounts = AccountService::new(db.clone(), session_manager.clone(), clock.clone());
        let relay = MessagingRelay::new(
            db.pool.clone(),
            Arc::new(accounts.clone()),
            ConnectionRegistry::new(),
            clock.clone(),
        );

        Self {
            db,
            session_manager,
            accounts,
            media,
            relay,
            clock,
        }
    }

    pub fn graph(&self) -> SocialGraph {
        SocialGraph::new(self.db.pool.clone(), self.clock.clone())
    }

    pub fn content(&self) -> ContentStore {
        ContentStore::new(self.db.pool.clone(), self.clock.clone())
    }

    pub fn feed(&self) -> FeedComposer {
        FeedComposer::new(self.db.pool.clone())
    }
}
