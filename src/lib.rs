//! Support Desk - conversation and ticket coordination core
//!
//! Domain-scoped chat conversations answered by a text generator, support
//! tickets with SLA deadlines and automatic escalation, and per-domain FAQ
//! suggestions, exposed over a JSON HTTP API.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
