//! Name-keyed collections of entities.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::atom::AtomRecord;
use crate::entity::Entity;
use crate::error::{Result, SplunkError};
use crate::kind::ResourceKind;
use crate::path;
use crate::transport::Transport;

/// The members of one collection endpoint, in feed order.
///
/// Names are unique. When a feed repeats a name the later entry wins but
/// keeps the position of the first.
#[derive(Debug, Clone)]
pub struct Collection {
    path: String,
    kind: ResourceKind,
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
}

impl Collection {
    /// Build a collection from converted feed records.
    ///
    /// Record 0 is the feed header and is skipped. Every member's name is
    /// derived from its entry id relative to `collection_path`; an id
    /// outside the collection is a parse error.
    pub fn build(
        records: Vec<AtomRecord>,
        collection_path: &str,
        transport: &Arc<dyn Transport>,
    ) -> Result<Self> {
        let kind = ResourceKind::from_collection_path(collection_path);
        let base = collection_path.trim_end_matches('/');
        let mut entities: Vec<Entity> = Vec::with_capacity(records.len().saturating_sub(1));
        let mut index = HashMap::new();

        for record in records.into_iter().skip(1) {
            let segment = path::member_segment(&record.id, collection_path)
                .map(str::to_string)
                .ok_or_else(|| {
                    SplunkError::Parse(format!(
                        "entry id `{}` is not a member of `{collection_path}`",
                        record.id
                    ))
                })?;
            let name = path::last_segment(&segment);
            let entity_path = format!("{base}/{segment}");
            let entity = Entity::from_record(
                record,
                name.clone(),
                entity_path,
                kind,
                Arc::clone(transport),
            );

            match index.get(&name) {
                Some(&position) => {
                    debug!(collection = %collection_path, name = %name, "duplicate entry, keeping the later one");
                    entities[position] = entity;
                }
                None => {
                    index.insert(name, entities.len());
                    entities.push(entity);
                }
            }
        }

        Ok(Self {
            path: collection_path.to_string(),
            kind,
            entities,
            index,
        })
    }

    /// The collection path the members were read from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The kind every member was built with.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.index.get(name).map(|&i| &self.entities[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.index.get(name).map(|&i| &mut self.entities[i])
    }

    /// Member names in feed order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(Entity::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entity)> {
        self.entities.iter().map(|e| (e.name(), e))
    }

    pub fn values(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn into_entities(self) -> Vec<Entity> {
        self.entities
    }
}

impl IntoIterator for Collection {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}
