//! # banter-core
//!
//! Connection registry and message routing for the Banter chat room.
//!
//! This crate provides the stateful heart of the service:
//!
//! - **Registry** - Nickname-keyed connection handles and the ordered roster
//! - **Router** - Decides the destination(s) of each inbound event
//! - **ClientHandle** - Per-connection send capability
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Connection │────▶│   Router    │────▶│  Registry   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐
//!                     │  Delivery   │
//!                     └─────────────┘
//! ```
//!
//! The router mutates the registry and returns a list of [`Delivery`]
//! values; the transport adapter performs the actual sends. This keeps the
//! routing logic testable without a live transport.
//!
//! [`Delivery`]: router::Delivery

pub mod handle;
pub mod registry;
pub mod router;

pub use handle::ClientHandle;
pub use registry::{Registry, RegistryError};
pub use router::{ConnectionState, Delivery, JoinOutcome, RouteError};
