//! Identity provider implementations.

pub mod dingtalk;
