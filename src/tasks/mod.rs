//! Background Tasks Module
//!
//! Contains the tasks that run alongside the cache.
//!
//! # Tasks
//! - TTL Expiry: one-shot timer per TTL entry that removes it on firing

mod expiry;

pub(crate) use expiry::spawn_expiry_timer;
