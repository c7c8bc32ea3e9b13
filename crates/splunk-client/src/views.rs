//! Typed views over entities of a known kind.
//!
//! Each view wraps an [`Entity`] and adds named accessors for the kind's
//! fields. Reads go through the same pending-then-committed lookup as
//! [`Entity::get`] and coerce the raw text; writes stage an edit. The field
//! tables declared here back the kind descriptors in [`crate::kind`].
//!
//! ```no_run
//! # async fn demo(service: splunk_client::Service) -> splunk_client::Result<()> {
//! use splunk_client::WindowsWmiInput;
//!
//! let entity = service.get("data/inputs/win-wmi-collections/cpu").await?;
//! let mut wmi = WindowsWmiInput::try_from(entity)?;
//! wmi.set_interval(120);
//! wmi.update().await?;
//! # Ok(())
//! # }
//! ```

use std::ops::{Deref, DerefMut};

use crate::entity::Entity;
use crate::error::{Result, SplunkError};
use crate::kind::{FieldSpec, FieldType, ResourceKind};
use crate::value::Value;

macro_rules! field_type {
    (str) => {
        FieldType::String
    };
    (int) => {
        FieldType::Integer
    };
    (bool) => {
        FieldType::Boolean
    };
    (list) => {
        FieldType::StringList
    };
}

macro_rules! field_get {
    ($entity:expr, str, $field:literal) => {
        $entity.get_str($field)
    };
    ($entity:expr, int, $field:literal) => {
        $entity.get_int($field)
    };
    ($entity:expr, bool, $field:literal) => {
        $entity.get_bool($field)
    };
    ($entity:expr, list, $field:literal) => {
        $entity.get_string_list($field)
    };
}

macro_rules! field_ret {
    (str) => { Option<&str> };
    (int) => { Option<i64> };
    (bool) => { Option<bool> };
    (list) => { Option<Vec<String>> };
}

macro_rules! field_arg {
    (str) => { impl Into<String> };
    (int) => { i64 };
    (bool) => { bool };
    (list) => { Vec<String> };
}

macro_rules! field_value {
    (str, $value:ident) => {
        Value::Scalar($value.into())
    };
    ($ty:ident, $value:ident) => {
        Value::from($value)
    };
}

/// Declare a view type, its field table and its accessors.
///
/// Each field reads `getter / setter : type => "wire_name"`; omitting the
/// setter makes the field read-only.
macro_rules! typed_view {
    (
        $(#[$meta:meta])*
        $view:ident for $kind:ident {
            required: [$($required:literal),* $(,)?],
            fields: {
                $(
                    $(#[$field_meta:meta])*
                    $getter:ident $(/ $setter:ident)? : $ty:ident => $field:literal
                ),* $(,)?
            }
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $view(Entity);

        impl $view {
            /// Fields the server requires on every create and update.
            pub const REQUIRED: &'static [&'static str] = &[$($required),*];

            /// Typed field table for this kind.
            pub const FIELDS: &'static [FieldSpec] = &[
                $(FieldSpec { name: $field, ty: field_type!($ty) }),*
            ];

            /// Unwrap the underlying entity.
            pub fn into_inner(self) -> Entity {
                self.0
            }

            $(
                $(#[$field_meta])*
                pub fn $getter(&self) -> Result<field_ret!($ty)> {
                    field_get!(self.0, $ty, $field)
                }

                $(
                    pub fn $setter(&mut self, value: field_arg!($ty)) {
                        self.0.set($field, field_value!($ty, value));
                    }
                )?
            )*
        }

        impl TryFrom<Entity> for $view {
            type Error = SplunkError;

            fn try_from(entity: Entity) -> Result<Self> {
                if entity.kind() == ResourceKind::$kind {
                    Ok(Self(entity))
                } else {
                    Err(SplunkError::KindMismatch {
                        expected: ResourceKind::$kind.tag(),
                        actual: entity.kind().to_string(),
                    })
                }
            }
        }

        impl From<$view> for Entity {
            fn from(view: $view) -> Self {
                view.0
            }
        }

        impl Deref for $view {
            type Target = Entity;

            fn deref(&self) -> &Entity {
                &self.0
            }
        }

        impl DerefMut for $view {
            fn deref_mut(&mut self) -> &mut Entity {
                &mut self.0
            }
        }
    };
}

typed_view! {
    /// An index (`data/indexes`).
    Index for Index {
        required: [],
        fields: {
            assure_utf8 / set_assure_utf8: bool => "assureUTF8",
            cold_path / set_cold_path: str => "coldPath",
            cold_to_frozen_dir / set_cold_to_frozen_dir: str => "coldToFrozenDir",
            /// Current on-disk size; maintained by the server.
            current_db_size_mb: int => "currentDBSizeMB",
            disabled: bool => "disabled",
            frozen_time_period_in_secs / set_frozen_time_period_in_secs: int => "frozenTimePeriodInSecs",
            home_path / set_home_path: str => "homePath",
            max_data_size / set_max_data_size: str => "maxDataSize",
            max_hot_buckets / set_max_hot_buckets: int => "maxHotBuckets",
            max_time: str => "maxTime",
            max_total_data_size_mb / set_max_total_data_size_mb: int => "maxTotalDataSizeMB",
            max_warm_db_count / set_max_warm_db_count: int => "maxWarmDBCount",
            min_time: str => "minTime",
            thawed_path / set_thawed_path: str => "thawedPath",
            total_event_count: int => "totalEventCount",
        }
    }
}

typed_view! {
    /// A file or directory monitor input.
    MonitorInput for Monitor {
        required: [],
        fields: {
            blacklist / set_blacklist: str => "blacklist",
            check_index / set_check_index: str => "check-index",
            check_path / set_check_path: bool => "check-path",
            crc_salt / set_crc_salt: str => "crcSalt",
            disabled: bool => "disabled",
            file_count: int => "filecount",
            follow_tail / set_follow_tail: bool => "followTail",
            host / set_host: str => "host",
            host_regex / set_host_regex: str => "host_regex",
            host_segment / set_host_segment: str => "host_segment",
            ignore_older_than / set_ignore_older_than: str => "ignoreOlderThan",
            index / set_index: str => "index",
            queue: str => "queue",
            rcvbuf: int => "rcvbuf",
            recursive / set_recursive: bool => "recursive",
            /// Source override applied to events from this input.
            rename_source / set_rename_source: str => "rename-source",
            source: str => "source",
            sourcetype / set_sourcetype: str => "sourcetype",
            time_before_close / set_time_before_close: int => "time_before_close",
            whitelist / set_whitelist: str => "whitelist",
        }
    }
}

typed_view! {
    /// A scripted input.
    ScriptInput for Script {
        required: [],
        fields: {
            disabled: bool => "disabled",
            group: str => "group",
            host / set_host: str => "host",
            index / set_index: str => "index",
            interval / set_interval: int => "interval",
            pass_auth / set_pass_auth: str => "passAuth",
            rcvbuf: int => "rcvbuf",
            rename_source / set_rename_source: str => "rename-source",
            source: str => "source",
            sourcetype / set_sourcetype: str => "sourcetype",
        }
    }
}

typed_view! {
    /// A raw TCP input.
    TcpInput for Tcp {
        required: [],
        fields: {
            connection_host / set_connection_host: str => "connection_host",
            disabled: bool => "disabled",
            group: str => "group",
            host / set_host: str => "host",
            index / set_index: str => "index",
            queue / set_queue: str => "queue",
            rcvbuf: int => "rcvbuf",
            restrict_to_host / set_restrict_to_host: str => "restrictToHost",
            source / set_source: str => "source",
            sourcetype / set_sourcetype: str => "sourcetype",
            ssl / set_ssl: bool => "SSL",
        }
    }
}

typed_view! {
    /// A cooked (Splunk-to-Splunk) TCP input.
    TcpSplunkInput for TcpSplunk {
        required: [],
        fields: {
            connection_host / set_connection_host: str => "connection_host",
            disabled: bool => "disabled",
            group: str => "group",
            host / set_host: str => "host",
            index: str => "index",
            queue: str => "queue",
            rcvbuf: int => "rcvbuf",
            source: str => "source",
            sourcetype: str => "sourcetype",
            ssl / set_ssl: bool => "SSL",
        }
    }
}

typed_view! {
    /// A UDP input.
    UdpInput for Udp {
        required: [],
        fields: {
            connection_host / set_connection_host: str => "connection_host",
            disabled: bool => "disabled",
            group: str => "group",
            host / set_host: str => "host",
            index / set_index: str => "index",
            no_appending_timestamp / set_no_appending_timestamp: bool => "no_appending_timestamp",
            no_priority_stripping / set_no_priority_stripping: bool => "no_priority_stripping",
            queue / set_queue: str => "queue",
            rcvbuf: int => "rcvbuf",
            source / set_source: str => "source",
            sourcetype / set_sourcetype: str => "sourcetype",
        }
    }
}

typed_view! {
    /// An Active Directory monitor input.
    WindowsActiveDirectoryInput for WindowsActiveDirectory {
        required: [],
        fields: {
            disabled: bool => "disabled",
            index / set_index: str => "index",
            monitor_subtree / set_monitor_subtree: bool => "monitorSubtree",
            starting_node / set_starting_node: str => "startingNode",
            target_dc / set_target_dc: str => "targetDc",
        }
    }
}

typed_view! {
    /// A Windows event log collection input.
    WindowsEventLogInput for WindowsEventLog {
        required: ["lookup_host"],
        fields: {
            disabled: bool => "disabled",
            hosts / set_hosts: list => "hosts",
            index / set_index: str => "index",
            /// The collection's local name as the server reports it.
            local_name: str => "name",
            logs / set_logs: list => "logs",
            lookup_host / set_lookup_host: str => "lookup_host",
        }
    }
}

typed_view! {
    /// A Windows performance monitor input.
    WindowsPerfmonInput for WindowsPerfmon {
        required: ["interval", "object"],
        fields: {
            counters / set_counters: list => "counters",
            disabled: bool => "disabled",
            index / set_index: str => "index",
            instances / set_instances: list => "instances",
            interval / set_interval: int => "interval",
            object / set_object: str => "object",
        }
    }
}

typed_view! {
    /// A Windows registry monitor input.
    WindowsRegistryInput for WindowsRegistry {
        required: ["baseline", "hive", "proc", "type"],
        fields: {
            baseline / set_baseline: bool => "baseline",
            disabled: bool => "disabled",
            hive / set_hive: str => "hive",
            index / set_index: str => "index",
            monitor_subnodes / set_monitor_subnodes: bool => "monitorSubnodes",
            /// Regex matching the processes to watch.
            process / set_process: str => "proc",
            /// Regex matching the registry event types to watch.
            registry_type / set_registry_type: str => "type",
        }
    }
}

typed_view! {
    /// A Windows WMI collection input.
    WindowsWmiInput for WindowsWmi {
        required: ["classes", "interval", "lookup_host"],
        fields: {
            classes / set_classes: str => "classes",
            disabled: bool => "disabled",
            fields / set_fields: list => "fields",
            index / set_index: str => "index",
            instances / set_instances: list => "instances",
            interval / set_interval: int => "interval",
            local_name: str => "name",
            lookup_host / set_lookup_host: str => "lookup_host",
            servers / set_servers: str => "server",
            wql / set_wql: str => "wql",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::atom::AtomRecord;
    use crate::transport::{FetchResponse, Transport};
    use crate::value::Attributes;

    struct Offline;

    #[async_trait]
    impl Transport for Offline {
        async fn fetch(&self, path: &str) -> Result<FetchResponse> {
            Err(SplunkError::NotFound(path.to_string()))
        }

        async fn submit(&self, path: &str, _form: &[(String, String)]) -> Result<Vec<u8>> {
            Err(SplunkError::NotFound(path.to_string()))
        }

        async fn delete(&self, path: &str) -> Result<()> {
            Err(SplunkError::NotFound(path.to_string()))
        }
    }

    fn entity(kind: ResourceKind, fields: &[(&str, Value)]) -> Entity {
        let fields: Attributes = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let record = AtomRecord {
            id: "https://localhost:8089/services/data/inputs/x/probe".to_string(),
            title: Some("probe".to_string()),
            fields,
            ..AtomRecord::default()
        };
        Entity::from_record(
            record,
            "probe".to_string(),
            "data/inputs/x/probe".to_string(),
            kind,
            Arc::new(Offline),
        )
    }

    #[test]
    fn test_typed_getters_coerce() {
        let wmi = WindowsWmiInput::try_from(entity(
            ResourceKind::WindowsWmi,
            &[
                ("interval", Value::from("60")),
                ("fields", Value::from("Name,Handle")),
                ("disabled", Value::from("0")),
                ("server", Value::from("winbox")),
            ],
        ))
        .unwrap();

        assert_eq!(wmi.interval().unwrap(), Some(60));
        assert_eq!(
            wmi.fields().unwrap(),
            Some(vec!["Name".to_string(), "Handle".to_string()])
        );
        assert_eq!(wmi.disabled().unwrap(), Some(false));
        assert_eq!(wmi.servers().unwrap(), Some("winbox"));
        assert_eq!(wmi.wql().unwrap(), None);
    }

    #[test]
    fn test_setters_stage_edits() {
        let mut registry = WindowsRegistryInput::try_from(entity(
            ResourceKind::WindowsRegistry,
            &[("hive", Value::from("HKEY_USERS"))],
        ))
        .unwrap();

        registry.set_process("explorer.exe");
        registry.set_baseline(true);

        assert!(registry.is_dirty());
        assert_eq!(registry.process().unwrap(), Some("explorer.exe"));
        assert_eq!(registry.baseline().unwrap(), Some(true));
        assert_eq!(
            registry.attributes().pending().get("proc"),
            Some(&Value::from("explorer.exe"))
        );
    }

    #[test]
    fn test_bad_text_is_invalid_value() {
        let perfmon = WindowsPerfmonInput::try_from(entity(
            ResourceKind::WindowsPerfmon,
            &[("interval", Value::from("often"))],
        ))
        .unwrap();

        let err = perfmon.interval().unwrap_err();
        assert!(matches!(
            err,
            SplunkError::InvalidValue { ref key, expected: "an integer" } if key == "interval"
        ));
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        let err = TcpInput::try_from(entity(ResourceKind::Udp, &[])).unwrap_err();
        assert!(matches!(
            err,
            SplunkError::KindMismatch { expected: "tcp", ref actual } if actual == "udp"
        ));
    }

    #[test]
    fn test_view_round_trips_entity() {
        let tcp = TcpInput::try_from(entity(ResourceKind::Tcp, &[])).unwrap();
        let entity: Entity = tcp.into();
        assert_eq!(entity.kind(), ResourceKind::Tcp);
        assert_eq!(entity.name(), "probe");
    }
}
