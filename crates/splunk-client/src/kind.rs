//! Resource kinds and their static descriptors.
//!
//! Every entity carries a [`ResourceKind`] chosen when it is constructed.
//! The kind selects a [`KindDescriptor`]: the fields the server requires on
//! every create and update, and the typed field table used to coerce raw
//! attribute text. Kinds this client does not specialise resolve to
//! [`ResourceKind::Generic`], which only offers raw `get`/`set`.

use std::fmt;

use crate::error::{Result, SplunkError};
use crate::path;
use crate::value::Value;
use crate::views::{
    Index, MonitorInput, ScriptInput, TcpInput, TcpSplunkInput, UdpInput,
    WindowsActiveDirectoryInput, WindowsEventLogInput, WindowsPerfmonInput, WindowsRegistryInput,
    WindowsWmiInput,
};

/// Discriminator for a resource's typed view and required-field policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Index,
    Monitor,
    Script,
    Tcp,
    TcpSplunk,
    Udp,
    WindowsActiveDirectory,
    WindowsEventLog,
    WindowsPerfmon,
    WindowsRegistry,
    WindowsWmi,
    /// Any kind without a specialised descriptor.
    Generic,
}

/// All kinds with a specialised descriptor.
const SPECIALISED: [ResourceKind; 11] = [
    ResourceKind::Index,
    ResourceKind::Monitor,
    ResourceKind::Script,
    ResourceKind::Tcp,
    ResourceKind::TcpSplunk,
    ResourceKind::Udp,
    ResourceKind::WindowsActiveDirectory,
    ResourceKind::WindowsEventLog,
    ResourceKind::WindowsPerfmon,
    ResourceKind::WindowsRegistry,
    ResourceKind::WindowsWmi,
];

impl ResourceKind {
    /// Short tag naming the kind.
    pub fn tag(self) -> &'static str {
        match self {
            ResourceKind::Index => "index",
            ResourceKind::Monitor => "monitor",
            ResourceKind::Script => "script",
            ResourceKind::Tcp => "tcp",
            ResourceKind::TcpSplunk => "splunktcp",
            ResourceKind::Udp => "udp",
            ResourceKind::WindowsActiveDirectory => "ad",
            ResourceKind::WindowsEventLog => "win-event-log-collections",
            ResourceKind::WindowsPerfmon => "win-perfmon",
            ResourceKind::WindowsRegistry => "registry",
            ResourceKind::WindowsWmi => "win-wmi-collections",
            ResourceKind::Generic => "generic",
        }
    }

    /// Resolve a tag; unknown tags fall back to [`ResourceKind::Generic`].
    pub fn from_tag(tag: &str) -> Self {
        SPECIALISED
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .unwrap_or(ResourceKind::Generic)
    }

    /// The endpoint-relative collection this kind lives under.
    pub fn collection_path(self) -> Option<&'static str> {
        match self {
            ResourceKind::Index => Some("data/indexes"),
            ResourceKind::Monitor => Some("data/inputs/monitor"),
            ResourceKind::Script => Some("data/inputs/script"),
            ResourceKind::Tcp => Some("data/inputs/tcp/raw"),
            ResourceKind::TcpSplunk => Some("data/inputs/tcp/cooked"),
            ResourceKind::Udp => Some("data/inputs/udp"),
            ResourceKind::WindowsActiveDirectory => Some("data/inputs/ad"),
            ResourceKind::WindowsEventLog => Some("data/inputs/win-event-log-collections"),
            ResourceKind::WindowsPerfmon => Some("data/inputs/win-perfmon"),
            ResourceKind::WindowsRegistry => Some("data/inputs/registry"),
            ResourceKind::WindowsWmi => Some("data/inputs/win-wmi-collections"),
            ResourceKind::Generic => None,
        }
    }

    /// Resolve the kind of a collection's members from the collection path.
    ///
    /// Accepts bare, `/services/` and namespaced paths as well as full URLs.
    pub fn from_collection_path(collection_path: &str) -> Self {
        let relative = path::relative(collection_path);
        SPECIALISED
            .into_iter()
            .find(|kind| kind.collection_path() == Some(relative))
            .unwrap_or(ResourceKind::Generic)
    }

    /// Resolve the kind of a single resource from its path.
    pub fn from_entity_path(entity_path: &str) -> Self {
        Self::from_collection_path(path::parent(entity_path))
    }

    /// The static descriptor for this kind.
    pub fn descriptor(self) -> &'static KindDescriptor {
        match self {
            ResourceKind::Index => &INDEX,
            ResourceKind::Monitor => &MONITOR,
            ResourceKind::Script => &SCRIPT,
            ResourceKind::Tcp => &TCP,
            ResourceKind::TcpSplunk => &TCP_SPLUNK,
            ResourceKind::Udp => &UDP,
            ResourceKind::WindowsActiveDirectory => &WINDOWS_ACTIVE_DIRECTORY,
            ResourceKind::WindowsEventLog => &WINDOWS_EVENT_LOG,
            ResourceKind::WindowsPerfmon => &WINDOWS_PERFMON,
            ResourceKind::WindowsRegistry => &WINDOWS_REGISTRY,
            ResourceKind::WindowsWmi => &WINDOWS_WMI,
            ResourceKind::Generic => &GENERIC,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Coercion applied to a raw attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Boolean,
    /// A list, or a comma-delimited scalar.
    StringList,
}

impl FieldType {
    /// Coerce a raw value, naming `key` in the error on failure.
    pub fn coerce(self, key: &str, value: &Value) -> Result<TypedValue> {
        let coerced = match self {
            FieldType::String => value.as_str().map(|s| TypedValue::String(s.to_string())),
            FieldType::Integer => value.to_int().map(TypedValue::Integer),
            FieldType::Boolean => value.to_bool().map(TypedValue::Boolean),
            FieldType::StringList => value.to_string_list().map(TypedValue::StringList),
        };
        coerced.ok_or_else(|| SplunkError::InvalidValue {
            key: key.to_string(),
            expected: self.expected(),
        })
    }

    pub(crate) fn expected(self) -> &'static str {
        match self {
            FieldType::String => "a string",
            FieldType::Integer => "an integer",
            FieldType::Boolean => "a boolean",
            FieldType::StringList => "a string list",
        }
    }
}

/// One entry in a kind's typed field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

/// A coerced attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    StringList(Vec<String>),
    /// A field outside the kind's table, returned untouched.
    Raw(Value),
}

/// Required fields and typed field table for one kind.
#[derive(Debug, PartialEq, Eq)]
pub struct KindDescriptor {
    pub kind: ResourceKind,
    pub required_fields: &'static [&'static str],
    pub fields: &'static [FieldSpec],
}

impl KindDescriptor {
    /// Look up a field in the typed table.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required_fields.contains(&name)
    }
}

static INDEX: KindDescriptor = KindDescriptor {
    kind: ResourceKind::Index,
    required_fields: Index::REQUIRED,
    fields: Index::FIELDS,
};

static MONITOR: KindDescriptor = KindDescriptor {
    kind: ResourceKind::Monitor,
    required_fields: MonitorInput::REQUIRED,
    fields: MonitorInput::FIELDS,
};

static SCRIPT: KindDescriptor = KindDescriptor {
    kind: ResourceKind::Script,
    required_fields: ScriptInput::REQUIRED,
    fields: ScriptInput::FIELDS,
};

static TCP: KindDescriptor = KindDescriptor {
    kind: ResourceKind::Tcp,
    required_fields: TcpInput::REQUIRED,
    fields: TcpInput::FIELDS,
};

static TCP_SPLUNK: KindDescriptor = KindDescriptor {
    kind: ResourceKind::TcpSplunk,
    required_fields: TcpSplunkInput::REQUIRED,
    fields: TcpSplunkInput::FIELDS,
};

static UDP: KindDescriptor = KindDescriptor {
    kind: ResourceKind::Udp,
    required_fields: UdpInput::REQUIRED,
    fields: UdpInput::FIELDS,
};

static WINDOWS_ACTIVE_DIRECTORY: KindDescriptor = KindDescriptor {
    kind: ResourceKind::WindowsActiveDirectory,
    required_fields: WindowsActiveDirectoryInput::REQUIRED,
    fields: WindowsActiveDirectoryInput::FIELDS,
};

static WINDOWS_EVENT_LOG: KindDescriptor = KindDescriptor {
    kind: ResourceKind::WindowsEventLog,
    required_fields: WindowsEventLogInput::REQUIRED,
    fields: WindowsEventLogInput::FIELDS,
};

static WINDOWS_PERFMON: KindDescriptor = KindDescriptor {
    kind: ResourceKind::WindowsPerfmon,
    required_fields: WindowsPerfmonInput::REQUIRED,
    fields: WindowsPerfmonInput::FIELDS,
};

static WINDOWS_REGISTRY: KindDescriptor = KindDescriptor {
    kind: ResourceKind::WindowsRegistry,
    required_fields: WindowsRegistryInput::REQUIRED,
    fields: WindowsRegistryInput::FIELDS,
};

static WINDOWS_WMI: KindDescriptor = KindDescriptor {
    kind: ResourceKind::WindowsWmi,
    required_fields: WindowsWmiInput::REQUIRED,
    fields: WindowsWmiInput::FIELDS,
};

static GENERIC: KindDescriptor = KindDescriptor {
    kind: ResourceKind::Generic,
    required_fields: &[],
    fields: &[],
};
