//! Operators invoked by the scheduler: scanning, diffing, transfer, backup,
//! directory locking and the missing-submission check

pub mod backup;
pub mod diff;
pub mod lock;
pub mod missing;
pub mod naming;
pub mod notify;
pub mod scan;
pub mod transfer;
