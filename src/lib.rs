//! flap-filter: interface update flap damping
//!
//! A library that sits between a source of network interface link and
//! address notifications and its consumers, holding back address removals
//! that are immediately undone so transient flaps never reach them.

pub mod config;
pub mod filter;
pub mod replay;
pub mod time;
pub mod update;
