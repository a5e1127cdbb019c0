use tracing::info;

use super::{DataService, Fetched};
use crate::error::Result;
use crate::models::{active_notices, DDayItem, Member, Notice};

pub const MEMBERS_KEY: &str = "members";
pub const DDAYS_KEY: &str = "ddays";
pub const NOTICES_KEY: &str = "notices";

impl DataService {
    /// Member list. `force` skips the fresh window (explicit reloads).
    pub async fn members(&self, force: bool) -> Result<Fetched<Vec<Member>>> {
        let fetched = self
            .cached(MEMBERS_KEY, self.policy.members_fresh(), force, || self.store.fetch_members())
            .await?;
        info!(count = fetched.data.len(), source = ?fetched.source, "Members loaded");
        Ok(fetched)
    }

    pub async fn ddays(&self, force: bool) -> Result<Fetched<Vec<DDayItem>>> {
        self.cached(DDAYS_KEY, self.policy.ddays_fresh(), force, || self.store.fetch_ddays())
            .await
    }

    pub async fn notices(&self, force: bool) -> Result<Fetched<Vec<Notice>>> {
        self.cached(NOTICES_KEY, self.policy.notices_fresh(), force, || self.store.fetch_notices())
            .await
    }

    /// Notices for the banner: active entries only.
    pub async fn active_notices(&self) -> Result<Vec<Notice>> {
        let fetched = self.notices(false).await?;
        Ok(active_notices(&fetched.data))
    }
}
