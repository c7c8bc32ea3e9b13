//! Entry point for reading and writing resources.

use std::sync::Arc;

use tracing::debug;

use crate::atom::{self, AtomRecord};
use crate::collection::Collection;
use crate::config::ClientConfig;
use crate::entity::{self, Entity};
use crate::error::{Result, SplunkError};
use crate::kind::ResourceKind;
use crate::path;
use crate::reconcile;
use crate::transport::{HttpTransport, Transport};
use crate::value::{self, Attributes};

const DEFAULT_PAGE_SIZE: usize = 100;

/// Handle on a Splunk server.
///
/// Cheap to clone; entities and collections share its transport.
#[derive(Clone)]
pub struct Service {
    transport: Arc<dyn Transport>,
    page_size: usize,
}

impl Service {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Connect over HTTP with the given settings.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(transport).with_page_size(config.page_size))
    }

    /// Entries requested per page by [`enumerate`](Self::enumerate).
    ///
    /// 0 asks the server for every entry in one response.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Read every member of a collection.
    ///
    /// `collection_path` may carry a query (`data/indexes?search=main`);
    /// it is sent with every page request but is not part of member paths.
    pub async fn enumerate(&self, collection_path: &str) -> Result<Collection> {
        let records = self.fetch_all(collection_path).await?;
        debug!(
            collection = %collection_path,
            entries = records.len().saturating_sub(1),
            "enumerated"
        );
        let base = collection_path
            .split_once('?')
            .map_or(collection_path, |(base, _)| base);
        Collection::build(records, base, &self.transport)
    }

    /// Read one resource by path.
    ///
    /// The kind is inferred from the parent collection and is only
    /// specialised for the collections in [`ResourceKind::collection_path`];
    /// anything else is [`ResourceKind::Generic`]. Use
    /// [`get_as`](Self::get_as) to keep a known kind.
    pub async fn get(&self, entity_path: &str) -> Result<Entity> {
        self.get_as(entity_path, ResourceKind::from_entity_path(entity_path))
            .await
    }

    /// Read one resource by path as the given kind.
    pub async fn get_as(&self, entity_path: &str, kind: ResourceKind) -> Result<Entity> {
        let record = entity::fetch_entry(self.transport.as_ref(), entity_path).await?;
        let name = path::last_segment(entity_path);
        if name.is_empty() {
            return Err(SplunkError::NotFound(entity_path.to_string()));
        }

        Ok(Entity::from_record(
            record,
            name,
            entity_path.trim_end_matches('/').to_string(),
            kind,
            Arc::clone(&self.transport),
        ))
    }

    /// Create a resource named `name` under a collection.
    ///
    /// The kind's required fields must all be present in `initial`;
    /// nothing is sent otherwise.
    pub async fn create(
        &self,
        collection_path: &str,
        name: &str,
        kind: ResourceKind,
        initial: impl Into<Attributes>,
    ) -> Result<Entity> {
        let initial = initial.into();
        reconcile::require_all(kind.descriptor(), &initial)?;

        let mut form = vec![("name".to_string(), name.to_string())];
        form.extend(value::form_fields(&initial)?);

        debug!(collection = %collection_path, name = %name, kind = %kind, "creating");
        let body = self.transport.submit(collection_path, &form).await?;

        let entity_path = path::join(collection_path, name);
        let record = match entity::entry_from_body(&body)? {
            Some(record) => record,
            None => entity::fetch_entry(self.transport.as_ref(), &entity_path).await?,
        };

        Ok(Entity::from_record(
            record,
            name.to_string(),
            entity_path,
            kind,
            Arc::clone(&self.transport),
        ))
    }

    /// Delete a resource by path.
    pub async fn remove(&self, entity_path: &str) -> Result<()> {
        debug!(path = %entity_path, "removing");
        self.transport.delete(entity_path).await
    }

    /// Fetch a collection feed page by page and stitch the pages together:
    /// one header record followed by every entry.
    async fn fetch_all(&self, collection_path: &str) -> Result<Vec<AtomRecord>> {
        let separator = if collection_path.contains('?') { '&' } else { '?' };
        let mut records: Vec<AtomRecord> = Vec::new();
        let mut offset = 0usize;

        loop {
            let page_path = format!(
                "{collection_path}{separator}count={}&offset={offset}",
                self.page_size
            );
            let response = self.transport.fetch(&page_path).await?;
            let mut page = atom::parse_feed(&response.body)?;

            let entries = page.split_off(1);
            let total = page.first().and_then(AtomRecord::total_results);
            if records.is_empty() {
                records.append(&mut page);
            }

            let received = entries.len();
            records.extend(entries);
            offset += received;

            let done = self.page_size == 0
                || received == 0
                || total.is_none_or(|total| offset >= total);
            if done {
                return Ok(records);
            }
            debug!(collection = %collection_path, offset, total = ?total, "fetching next page");
        }
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}
