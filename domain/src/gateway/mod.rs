//! Clients for the systems the broker talks to.

pub mod dingtalk;
