//! Sites of the network.
//!
//! Site visibility is an integer code. Positive codes are public, zero and
//! negative codes hide the site.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::{
    push, reconcile, remove, EnabledFlag, IncrementalProvisioner, IndexMode, ProvisionOutcome,
};
use crate::errors::ProvisionError;
use crate::events::{
    EventKind, LifecycleEvent, LifecycleSubscriber, BLOG_NAME_OPTION, VISIBILITY_OPTION,
};
use crate::provisionable::{Provisionable, ProvisionableSite};
use crate::runtime::NativeRuntime;
use cc_search_repository::types::{Site, SiteId};
use cc_search_repository::SearchIndexClient;

const SUBSCRIPTIONS: &[EventKind] = &[
    EventKind::SiteInitialized,
    EventKind::SiteUpdated,
    EventKind::SiteOptionUpdated,
    EventKind::SiteDeleted,
    EventKind::SiteSpammed,
    EventKind::SiteUnspammed,
];

pub struct SitesProvisioner {
    client: Arc<SearchIndexClient>,
    runtime: NativeRuntime,
    enabled: EnabledFlag,
}

impl SitesProvisioner {
    pub fn new(client: Arc<SearchIndexClient>, runtime: NativeRuntime) -> Self {
        Self {
            client,
            runtime,
            enabled: EnabledFlag::new(true),
        }
    }

    fn provisionable(&self, site: Site) -> ProvisionableSite {
        ProvisionableSite::new(site, self.runtime.clone())
    }

    fn lookup(&self, site_id: SiteId) -> Result<Option<Site>, ProvisionError> {
        Ok(self.runtime.source.site(site_id)?)
    }

    /// Handle a newly initialized site. A new site has no document yet, so a
    /// fresh document is always created.
    #[instrument(skip(self, site), fields(site_id = site.id, domain = %site.domain))]
    pub async fn provision_new_site(&self, site: &Site) -> Result<ProvisionOutcome, ProvisionError> {
        if !self.is_enabled() {
            return Ok(ProvisionOutcome::Disabled);
        }
        let mut provisionable = self.provisionable(site.clone());
        let eligible = provisionable.is_eligible()?;
        reconcile(&self.client, &mut provisionable, eligible, IndexMode::Index).await
    }

    #[instrument(skip(self, site), fields(site_id = site.id, domain = %site.domain))]
    pub async fn provision_updated_site(
        &self,
        site: &Site,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        if !self.is_enabled() {
            return Ok(ProvisionOutcome::Disabled);
        }
        let mut provisionable = self.provisionable(site.clone());
        let eligible = provisionable.is_eligible()?;
        reconcile(&self.client, &mut provisionable, eligible, IndexMode::IndexOrUpdate).await
    }

    /// Re-provision a site after its title option changed.
    #[instrument(skip(self))]
    pub async fn provision_updated_site_on_option_change(
        &self,
        site_id: SiteId,
        option: &str,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        if !self.is_enabled() {
            return Ok(ProvisionOutcome::Disabled);
        }
        let Some(site) = self.lookup(site_id)? else {
            warn!("Site not found, skipping");
            return Ok(ProvisionOutcome::Skipped);
        };
        self.provision_updated_site(&site).await
    }

    /// Apply a visibility option change on `site_id`.
    ///
    /// `new_value` decides: a positive code indexes or updates the site, any
    /// other value removes it if indexed. Non-numeric values count as `0`.
    #[instrument(skip(self))]
    pub async fn provision_site_visibility_change(
        &self,
        site_id: SiteId,
        old_value: &str,
        new_value: &str,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        if !self.is_enabled() {
            return Ok(ProvisionOutcome::Disabled);
        }
        let Some(mut site) = self.lookup(site_id)? else {
            warn!("Site not found, skipping");
            return Ok(ProvisionOutcome::Skipped);
        };
        let visibility = Site::parse_visibility(new_value);
        info!(domain = %site.domain, visibility, "Site visibility changed");
        site.visibility = visibility;

        let mut provisionable = self.provisionable(site);
        if ProvisionableSite::is_visible(visibility) {
            push(&self.client, &mut provisionable, IndexMode::IndexOrUpdate).await
        } else {
            remove(&self.client, &mut provisionable).await
        }
    }

    #[instrument(skip(self, site), fields(site_id = site.id, domain = %site.domain))]
    pub async fn provision_deleted_site(
        &self,
        site: &Site,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        if !self.is_enabled() {
            return Ok(ProvisionOutcome::Disabled);
        }
        let mut provisionable = self.provisionable(site.clone());
        remove(&self.client, &mut provisionable).await
    }

    /// Remove a spammed site's document if it has one.
    #[instrument(skip(self))]
    pub async fn provision_site_spammed(
        &self,
        site_id: SiteId,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        if !self.is_enabled() {
            return Ok(ProvisionOutcome::Disabled);
        }
        let Some(site) = self.lookup(site_id)? else {
            warn!("Spammed site not found, skipping");
            return Ok(ProvisionOutcome::Skipped);
        };
        let mut provisionable = self.provisionable(site);
        remove(&self.client, &mut provisionable).await
    }

    /// Restore an unspammed site.
    ///
    /// Updates the existing document when the site still has a search ID,
    /// creates a fresh one otherwise. Hidden sites are left out.
    #[instrument(skip(self))]
    pub async fn provision_site_unspammed(
        &self,
        site_id: SiteId,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        if !self.is_enabled() {
            return Ok(ProvisionOutcome::Disabled);
        }
        let Some(site) = self.lookup(site_id)? else {
            warn!("Unspammed site not found, skipping");
            return Ok(ProvisionOutcome::Skipped);
        };
        if !ProvisionableSite::is_visible(site.visibility) {
            debug!(visibility = site.visibility, "Unspammed site is hidden, skipping");
            return Ok(ProvisionOutcome::Skipped);
        }

        let mut provisionable = self.provisionable(site);
        let mode = if provisionable.search_id()?.is_empty() {
            IndexMode::Index
        } else {
            IndexMode::IndexOrUpdate
        };
        push(&self.client, &mut provisionable, mode).await
    }
}

impl IncrementalProvisioner for SitesProvisioner {
    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn enable(&self) {
        self.enabled.set(true);
    }

    fn disable(&self) {
        self.enabled.set(false);
    }
}

#[async_trait]
impl LifecycleSubscriber for SitesProvisioner {
    fn name(&self) -> &str {
        "sites"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        SUBSCRIPTIONS
    }

    async fn handle(&self, event: &LifecycleEvent) -> Result<(), ProvisionError> {
        match event {
            LifecycleEvent::SiteInitialized { site } => {
                self.provision_new_site(site).await?;
            }
            LifecycleEvent::SiteUpdated { site } => {
                self.provision_updated_site(site).await?;
            }
            LifecycleEvent::SiteOptionUpdated {
                site_id,
                option,
                old_value,
                new_value,
            } => match option.as_str() {
                BLOG_NAME_OPTION => {
                    self.provision_updated_site_on_option_change(*site_id, option)
                        .await?;
                }
                VISIBILITY_OPTION => {
                    self.provision_site_visibility_change(*site_id, old_value, new_value)
                        .await?;
                }
                _ => {}
            },
            LifecycleEvent::SiteDeleted { site } => {
                self.provision_deleted_site(site).await?;
            }
            LifecycleEvent::SiteSpammed { site_id } => {
                self.provision_site_spammed(*site_id).await?;
            }
            LifecycleEvent::SiteUnspammed { site_id } => {
                self.provision_site_unspammed(*site_id).await?;
            }
            _ => {}
        }
        Ok(())
    }
}
