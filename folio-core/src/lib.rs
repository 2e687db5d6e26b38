#![warn(missing_docs)]
//! # folio-core
//!
//! Core types for the folio offline caching proxy.
//!
//! The proxy sits between a manga-reading web client and the network. Every
//! outgoing request is classified into a [`RoutingClass`], resolved to a
//! [`CacheKey`] and answered either from a partitioned cache store or from the
//! network. This crate holds the vocabulary shared by all of that:
//!
//! - **Intercepted traffic** ([`ProxyRequest`], [`ProxyResponse`], [`Outcome`])
//! - **Stored data** ([`CacheEntry`], [`CacheKey`])
//! - **Classification tags** ([`RoutingClass`], [`TrustedHost`])
//! - **Capabilities** injected into the proxy ([`Upstream`], [`Clock`])
//!
//! ## Feature Flags
//!
//! - `test-helpers` - Enable [`ManualClock`](clock::ManualClock) for deterministic TTL tests
//!

pub mod class;
pub mod clock;
pub mod context;
pub mod entry;
pub mod key;
pub mod request;
pub mod response;
pub mod upstream;

pub use class::{RoutingClass, TrustedHost};
pub use clock::{Clock, SystemClock};
pub use context::CacheStatus;
pub use entry::{CacheEntry, FETCHED_AT_HEADER};
pub use key::CacheKey;
pub use request::{Credentials, ProxyRequest, RequestMode};
pub use response::{Outcome, ProxyResponse};
#[doc(hidden)]
pub use smol_str::SmolStr;
pub use upstream::{Upstream, UpstreamError};

/// Raw byte data type used for response bodies.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
