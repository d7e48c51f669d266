//! Persistence: the append-only audit journal

pub mod journal;
