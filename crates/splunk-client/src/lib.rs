//! Entity client for the Splunk management REST API.
//!
//! Splunk exposes its configuration (inputs, indexes and similar objects)
//! as Atom feeds. This crate reads those feeds into local [`Entity`] values,
//! each backed by a two-layer [`AttributeCache`]: what the server last
//! returned, plus edits that have not been sent yet.
//!
//! ## Features
//!
//! - **Atom conversion**: buffered feeds to ordered attribute records
//! - **Attribute cache**: committed state with a pending overlay
//! - **Update reconciliation**: required fields are backfilled before any
//!   update is sent, and an update that cannot satisfy them is refused
//! - **Typed views**: per-kind accessors such as [`WindowsWmiInput`]
//! - **HTTP transport**: reqwest-backed [`HttpTransport`], or any other
//!   [`Transport`] implementation
//!
//! ```no_run
//! use splunk_client::{ClientConfig, Credentials, Service};
//!
//! # async fn demo() -> splunk_client::Result<()> {
//! let config = ClientConfig::new("https://localhost:8089")
//!     .with_credentials(Credentials::Token { token: "...".into() });
//! let service = Service::from_config(&config)?;
//!
//! let inputs = service.enumerate("data/inputs/tcp/raw").await?;
//! for (name, input) in inputs.iter() {
//!     println!("{name}: {:?}", input.get_str("index")?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod atom;
mod attributes;
mod collection;
mod config;
mod entity;
mod error;
mod kind;
pub mod path;
pub mod reconcile;
mod service;
mod transport;
mod value;
mod views;

pub use atom::AtomRecord;
pub use attributes::AttributeCache;
pub use collection::Collection;
pub use config::{ClientConfig, Credentials};
pub use entity::Entity;
pub use error::{Result, SplunkError, TransportError};
pub use kind::{FieldSpec, FieldType, KindDescriptor, ResourceKind, TypedValue};
pub use reconcile::UpdateOutcome;
pub use service::Service;
pub use transport::{FetchResponse, HttpTransport, Transport};
pub use value::{Args, Attributes, Value};
pub use views::{
    Index, MonitorInput, ScriptInput, TcpInput, TcpSplunkInput, UdpInput,
    WindowsActiveDirectoryInput, WindowsEventLogInput, WindowsPerfmonInput, WindowsRegistryInput,
    WindowsWmiInput,
};
