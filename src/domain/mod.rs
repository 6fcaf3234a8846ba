//! Domain types and the ports to external collaborators.

pub mod auth;
pub mod fraud;
pub mod payment;
pub mod ports;
pub mod token;
