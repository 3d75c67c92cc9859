use panelerp_infra::InMemoryRoleCatalogStore;

/// Shared state behind every handler.
#[derive(Debug)]
pub struct AppServices {
    pub roles: InMemoryRoleCatalogStore,
}

impl AppServices {
    pub fn new(roles: InMemoryRoleCatalogStore) -> Self {
        Self { roles }
    }
}

impl Default for AppServices {
    fn default() -> Self {
        Self::new(InMemoryRoleCatalogStore::default())
    }
}
