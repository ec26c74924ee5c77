//! Shared startup plumbing for the service binaries in this crate. Each
//! binary is a thin `main.rs`: parse args, build the one service's state,
//! serve. Nothing here is part of any service's public contract.

pub mod telemetry;
