//! A single server-side resource.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::atom::{self, AtomRecord};
use crate::attributes::AttributeCache;
use crate::error::{Result, SplunkError};
use crate::kind::{FieldType, KindDescriptor, ResourceKind, TypedValue};
use crate::reconcile::{self, UpdateOutcome, UpdatePlan};
use crate::transport::Transport;
use crate::value::{self, Attributes, Value};

/// A resource addressed by path, with cached attributes and staged edits.
///
/// Reads never touch the network. Edits are staged with [`set`](Self::set)
/// and sent by [`update`](Self::update) or [`update_with`](Self::update_with);
/// a failed update leaves both the committed attributes and the staged
/// edits as they were.
#[derive(Clone)]
pub struct Entity {
    name: String,
    path: String,
    kind: ResourceKind,
    descriptor: &'static KindDescriptor,
    title: Option<String>,
    cache: AttributeCache,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Entity {
    /// Build an entity from a converted feed entry.
    pub(crate) fn from_record(
        record: AtomRecord,
        name: String,
        path: String,
        kind: ResourceKind,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            name,
            path,
            kind,
            descriptor: kind.descriptor(),
            title: record.title,
            cache: AttributeCache::new(record.fields),
            transport,
        }
    }

    /// The decoded resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path requests for this resource go to.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn descriptor(&self) -> &'static KindDescriptor {
        self.descriptor
    }

    /// The entry title from the last representation.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The attribute cache.
    pub fn attributes(&self) -> &AttributeCache {
        &self.cache
    }

    /// Look up a key, failing with `NotFound` if it is neither staged nor
    /// committed.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.cache.get(key)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.cache.get_or(key, default)
    }

    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.cache.lookup(key)
    }

    /// Stage an edit.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.cache.set(key, value);
    }

    pub fn is_dirty(&self) -> bool {
        self.cache.is_dirty()
    }

    /// Drop staged edits.
    pub fn discard(&mut self) {
        self.cache.discard();
    }

    /// Read a scalar as text. Lists and maps are rejected.
    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.lookup(key) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(Some)
                .ok_or_else(|| invalid(key, FieldType::String)),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.coerce_with(key, FieldType::Integer, Value::to_int)
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.coerce_with(key, FieldType::Boolean, Value::to_bool)
    }

    /// Read a list, splitting comma-delimited scalars.
    pub fn get_string_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        self.coerce_with(key, FieldType::StringList, Value::to_string_list)
    }

    /// Read a field coerced by the kind's field table.
    ///
    /// Fields outside the table come back as [`TypedValue::Raw`].
    pub fn typed(&self, key: &str) -> Result<Option<TypedValue>> {
        let Some(value) = self.lookup(key) else {
            return Ok(None);
        };
        match self.descriptor.field(key) {
            Some(spec) => spec.ty.coerce(key, value).map(Some),
            None => Ok(Some(TypedValue::Raw(value.clone()))),
        }
    }

    fn coerce_with<T>(
        &self,
        key: &str,
        ty: FieldType,
        coerce: impl Fn(&Value) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.lookup(key) {
            None => Ok(None),
            Some(value) => coerce(value).map(Some).ok_or_else(|| invalid(key, ty)),
        }
    }

    /// Re-read the committed attributes from the server.
    ///
    /// Staged edits are kept.
    pub async fn refresh(&mut self) -> Result<()> {
        let record = fetch_entry(self.transport.as_ref(), &self.path).await?;
        debug!(path = %self.path, fields = record.fields.len(), "refreshed");
        self.title = record.title;
        self.cache.refresh(record.fields);
        Ok(())
    }

    /// Send staged edits.
    ///
    /// Required fields the edits do not cover are filled in from the
    /// committed attributes. With nothing staged no request is made.
    pub async fn update(&mut self) -> Result<UpdateOutcome> {
        match reconcile::incremental(self.descriptor, &self.cache)? {
            UpdatePlan::Unchanged => {
                debug!(path = %self.path, "no staged edits, skipping update");
                Ok(UpdateOutcome::Unchanged)
            }
            UpdatePlan::Submit(fields) => {
                self.submit(fields).await?;
                Ok(UpdateOutcome::Submitted)
            }
        }
    }

    /// Send an explicit set of fields.
    ///
    /// Required fields missing from `args` are filled in from staged edits,
    /// then committed attributes. Other staged edits are not sent, and are
    /// cleared once the update succeeds.
    pub async fn update_with(&mut self, args: impl Into<Attributes>) -> Result<UpdateOutcome> {
        let fields = reconcile::full_replace(self.descriptor, &self.cache, args.into())?;
        self.submit(fields).await?;
        Ok(UpdateOutcome::Submitted)
    }

    /// Delete the resource on the server.
    pub async fn remove(self) -> Result<()> {
        debug!(path = %self.path, "removing");
        self.transport.delete(&self.path).await
    }

    async fn submit(&mut self, fields: Attributes) -> Result<()> {
        let form = value::form_fields(&fields)?;
        debug!(path = %self.path, kind = %self.kind, fields = form.len(), "submitting update");

        let body = self.transport.submit(&self.path, &form).await?;
        let record = match entry_from_body(&body)? {
            Some(record) => record,
            None => {
                debug!(path = %self.path, "update response had no entry, re-fetching");
                fetch_entry(self.transport.as_ref(), &self.path).await?
            }
        };

        self.title = record.title;
        self.cache.commit(record.fields);
        Ok(())
    }
}

fn invalid(key: &str, ty: FieldType) -> SplunkError {
    SplunkError::InvalidValue {
        key: key.to_string(),
        expected: ty.expected(),
    }
}

/// Fetch a resource and return its first entry.
pub(crate) async fn fetch_entry(transport: &dyn Transport, path: &str) -> Result<AtomRecord> {
    let response = transport.fetch(path).await?;
    if let Some(content_type) = &response.content_type {
        if !content_type.contains("xml") {
            warn!(path = %path, content_type = %content_type, "unexpected content type");
        }
    }
    atom::parse_feed(&response.body)?
        .into_iter()
        .nth(1)
        .ok_or_else(|| SplunkError::NotFound(path.to_string()))
}

/// The first entry of a POST response, if it carried a feed with one.
pub(crate) fn entry_from_body(body: &[u8]) -> Result<Option<AtomRecord>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(atom::parse_feed(body)?.into_iter().nth(1))
}
