//! Update planning.
//!
//! Splunk rejects an update that omits any of a kind's required fields,
//! even when the caller only means to change something else. Planning
//! decides what to submit before any request is made:
//!
//! - a full replace sends the caller's arguments, backfilling required
//!   fields from pending edits, then committed attributes;
//! - an incremental update sends the pending edits, backfilling required
//!   fields from committed attributes.
//!
//! A required field that cannot be backfilled fails the update with
//! [`SplunkError::MissingRequiredField`] and nothing is sent.

use crate::attributes::AttributeCache;
use crate::error::{Result, SplunkError};
use crate::kind::KindDescriptor;
use crate::value::{Attributes, Value};

/// What an incremental update should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdatePlan {
    /// Submit these fields.
    Submit(Attributes),
    /// Nothing is staged; make no request.
    Unchanged,
}

/// Result of a successful update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Fields were submitted and the cache now mirrors the server.
    Submitted,
    /// Nothing was staged, so no request was made.
    Unchanged,
}

/// Plan a full-replace update from explicit arguments.
pub fn full_replace(
    descriptor: &KindDescriptor,
    cache: &AttributeCache,
    mut args: Attributes,
) -> Result<Attributes> {
    for &field in descriptor.required_fields {
        if args.contains_key(field) {
            continue;
        }
        let value = cache
            .pending()
            .get(field)
            .or_else(|| cache.committed().get(field))
            .ok_or_else(|| missing(descriptor, field))?;
        args.insert(field.to_string(), value.clone());
    }
    Ok(args)
}

/// Plan an incremental update from the cache's pending edits.
pub fn incremental(descriptor: &KindDescriptor, cache: &AttributeCache) -> Result<UpdatePlan> {
    if !cache.is_dirty() {
        return Ok(UpdatePlan::Unchanged);
    }

    let mut fields = cache.pending().clone();
    for &field in descriptor.required_fields {
        if fields.contains_key(field) {
            continue;
        }
        let value: &Value = cache
            .committed()
            .get(field)
            .ok_or_else(|| missing(descriptor, field))?;
        fields.insert(field.to_string(), value.clone());
    }
    Ok(UpdatePlan::Submit(fields))
}

/// Check that a create carries every required field.
pub fn require_all(descriptor: &KindDescriptor, fields: &Attributes) -> Result<()> {
    match descriptor
        .required_fields
        .iter()
        .find(|field| !fields.contains_key(**field))
    {
        Some(field) => Err(missing(descriptor, field)),
        None => Ok(()),
    }
}

fn missing(descriptor: &KindDescriptor, field: &str) -> SplunkError {
    SplunkError::MissingRequiredField {
        kind: descriptor.kind.to_string(),
        field: field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::kind::ResourceKind;
    use crate::value::Args;

    fn committed_wmi() -> AttributeCache {
        AttributeCache::new(
            Args::new()
                .add("classes", "Win32_Service")
                .add("interval", "60")
                .add("lookup_host", "winbox")
                .add("server", "winbox")
                .into_attributes(),
        )
    }

    #[test]
    fn test_incremental_backfills_required_from_committed() {
        let mut cache = committed_wmi();
        cache.set("server", "otherbox");

        let plan = incremental(ResourceKind::WindowsWmi.descriptor(), &cache).unwrap();
        assert_eq!(
            plan,
            UpdatePlan::Submit(
                Args::new()
                    .add("classes", "Win32_Service")
                    .add("interval", "60")
                    .add("lookup_host", "winbox")
                    .add("server", "otherbox")
                    .into_attributes()
            )
        );
    }

    #[test]
    fn test_incremental_prefers_pending_required_value() {
        let mut cache = committed_wmi();
        cache.set("interval", 30);

        let UpdatePlan::Submit(fields) =
            incremental(ResourceKind::WindowsWmi.descriptor(), &cache).unwrap()
        else {
            panic!("expected a submission");
        };
        assert_eq!(fields["interval"], Value::from("30"));
    }

    #[test]
    fn test_incremental_without_edits_is_unchanged() {
        let cache = committed_wmi();
        let plan = incremental(ResourceKind::WindowsWmi.descriptor(), &cache).unwrap();
        assert_eq!(plan, UpdatePlan::Unchanged);
    }

    #[test]
    fn test_incremental_generic_sends_only_pending() {
        let mut cache = AttributeCache::new(Args::new().add("index", "main").into_attributes());
        cache.set("sourcetype", "syslog");

        let plan = incremental(ResourceKind::Generic.descriptor(), &cache).unwrap();
        assert_eq!(
            plan,
            UpdatePlan::Submit(Args::new().add("sourcetype", "syslog").into_attributes())
        );
    }

    #[test]
    fn test_incremental_missing_required_field() {
        let mut cache = AttributeCache::new(Args::new().add("hive", "HKEY_USERS").into_attributes());
        cache.set("index", "main");

        let err = incremental(ResourceKind::WindowsRegistry.descriptor(), &cache).unwrap_err();
        assert!(matches!(
            err,
            SplunkError::MissingRequiredField { ref kind, ref field }
                if kind == "registry" && field == "baseline"
        ));
    }

    #[test]
    fn test_full_replace_backfills_pending_then_committed() {
        let mut cache = committed_wmi();
        cache.set("lookup_host", "pendinghost");

        let fields = full_replace(
            ResourceKind::WindowsWmi.descriptor(),
            &cache,
            Args::new().add("interval", 5).into_attributes(),
        )
        .unwrap();

        assert_eq!(
            fields,
            Args::new()
                .add("classes", "Win32_Service")
                .add("interval", "5")
                .add("lookup_host", "pendinghost")
                .into_attributes()
        );
    }

    #[test]
    fn test_full_replace_missing_required_field() {
        let cache = AttributeCache::new(Args::new().add("object", "Processor").into_attributes());
        let err = full_replace(
            ResourceKind::WindowsPerfmon.descriptor(),
            &cache,
            Attributes::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SplunkError::MissingRequiredField { ref field, .. } if field == "interval"
        ));
    }

    #[test]
    fn test_require_all() {
        let descriptor = ResourceKind::WindowsPerfmon.descriptor();
        assert!(
            require_all(
                descriptor,
                &Args::new()
                    .add("interval", 10)
                    .add("object", "Processor")
                    .into_attributes()
            )
            .is_ok()
        );
        assert!(require_all(descriptor, &Args::new().add("interval", 10).into_attributes()).is_err());
        assert!(require_all(ResourceKind::Tcp.descriptor(), &Attributes::new()).is_ok());
    }
}
