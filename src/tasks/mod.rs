//! Background Tasks Module
//!
//! Contains the timer tasks that drive cache expiry.
//!
//! # Tasks
//! - Expiry: evicts one prefetched response once its cache window elapses

mod expiry;

pub use expiry::spawn_expiry_timer;
