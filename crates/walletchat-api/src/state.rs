use std::sync::Arc;

use walletchat_db::Database;
use walletchat_inbox::DefaultCommunity;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub default_community: DefaultCommunity,
}
