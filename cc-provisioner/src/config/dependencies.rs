//! Dependency initialization and wiring for the provisioner.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::ProvisionerConfig;
use crate::ProvisionerAppError;
use cc_provisioning::events::{DEFAULT_PRIORITY, SITE_INIT_PRIORITY};
use cc_provisioning::{
    BulkProvisioner, DiscussionsProvisioner, EventBus, GroupsProvisioner, IncrementalProvisioner,
    NativeRuntime, PostsProvisioner, ProfilesProvisioner, SitesProvisioner,
};
use cc_search_repository::{CcSearchProvider, InMemoryIndex, InMemoryNetwork, SearchIndexClient};

/// Build the index client.
///
/// # Arguments
///
/// * `config` - Provisioner settings
/// * `dry_run` - Use an in-memory index instead of cc-search
///
/// # Returns
///
/// * `Ok(Arc<SearchIndexClient>)` - Client ready to use
/// * `Err(ProvisionerAppError)` - If the cc-search client cannot be created
pub fn build_search_client(
    config: &ProvisionerConfig,
    dry_run: bool,
) -> Result<Arc<SearchIndexClient>, ProvisionerAppError> {
    let client = if dry_run {
        info!("Dry run, documents go to an in-memory index");
        SearchIndexClient::with_config(Box::new(InMemoryIndex::new()), config.search_index())
    } else {
        let provider = CcSearchProvider::new(&config.cc_search()).map_err(|e| {
            ProvisionerAppError::config(format!("Failed to create cc-search client: {}", e))
        })?;
        SearchIndexClient::with_config(Box::new(provider), config.search_index())
    };
    Ok(Arc::new(client))
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub network: Arc<InMemoryNetwork>,
    pub client: Arc<SearchIndexClient>,
    pub bus: EventBus,
    pub bulk: BulkProvisioner,
    /// Documents go to an in-memory index, so search IDs are not real.
    pub dry_run: bool,
}

impl Dependencies {
    /// Initialize all dependencies from settings and a network snapshot.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(ProvisionerAppError)` - If the snapshot cannot be read or the client cannot be built
    pub fn new(
        config: &ProvisionerConfig,
        snapshot: &Path,
        dry_run: bool,
    ) -> Result<Self, ProvisionerAppError> {
        info!(
            cc_search_url = %config.cc_search_url,
            snapshot = %snapshot.display(),
            dry_run,
            "Initializing dependencies"
        );

        let network = Arc::new(InMemoryNetwork::load(snapshot)?);
        let client = build_search_client(config, dry_run)?;
        Ok(Self {
            dry_run,
            ..Self::from_parts(config, network, client)
        })
    }

    /// Wire provisioners, bus and bulk job over an existing network and client.
    pub fn from_parts(
        config: &ProvisionerConfig,
        network: Arc<InMemoryNetwork>,
        client: Arc<SearchIndexClient>,
    ) -> Self {
        let runtime = NativeRuntime::from_backend(network.clone());

        let posts = PostsProvisioner::new(client.clone(), runtime.clone())
            .with_post_types(config.post_types.clone());
        let discussions = DiscussionsProvisioner::new(client.clone(), runtime.clone());
        let groups = GroupsProvisioner::new(client.clone(), runtime.clone());
        let profiles = ProfilesProvisioner::new(client.clone(), runtime.clone());
        let sites = SitesProvisioner::new(client.clone(), runtime.clone());

        let switches: [(&str, bool, &dyn IncrementalProvisioner); 5] = [
            ("posts", config.provision_posts, &posts),
            ("discussions", config.provision_discussions, &discussions),
            ("groups", config.provision_groups, &groups),
            ("profiles", config.provision_profiles, &profiles),
            ("sites", config.provision_sites, &sites),
        ];
        for (name, enabled, provisioner) in switches {
            if !enabled {
                info!(provisioner = name, "Provisioner disabled");
                provisioner.disable();
            }
        }

        let mut bus = EventBus::new();
        bus.subscribe(Arc::new(posts), DEFAULT_PRIORITY);
        bus.subscribe(Arc::new(discussions), DEFAULT_PRIORITY);
        bus.subscribe(Arc::new(groups), DEFAULT_PRIORITY);
        bus.subscribe(Arc::new(profiles), DEFAULT_PRIORITY);
        bus.subscribe(Arc::new(sites), SITE_INIT_PRIORITY);

        let bulk = BulkProvisioner::new(client.clone(), runtime)
            .with_post_types(config.post_types.clone());

        info!(subscribers = bus.len(), "Dependencies ready");

        Self {
            network,
            client,
            bus,
            bulk,
            dry_run: false,
        }
    }

    /// Write the network, including updated search IDs, back to `path`.
    ///
    /// A dry run never writes: its search IDs come from the in-memory index
    /// and would replace the real ones.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The snapshot was written
    /// * `Ok(false)` - Dry run, `path` left untouched
    /// * `Err(ProvisionerAppError)` - If the snapshot cannot be written
    pub fn save_snapshot(&self, path: &Path) -> Result<bool, ProvisionerAppError> {
        if self.dry_run {
            info!(snapshot = %path.display(), "Dry run, snapshot left unchanged");
            return Ok(false);
        }
        self.network.save(path)?;
        info!(snapshot = %path.display(), "Snapshot saved");
        Ok(true)
    }
}
