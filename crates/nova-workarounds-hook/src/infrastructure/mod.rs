//! Infrastructure layer for the hook.
//!
//! Contains the adapters behind the application traits: file-system storage
//! for `nova.conf`, the unit state, and the operator options, plus service
//! control through `systemctl`.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `nova_workarounds_core`, but MUST NOT be imported by the `application`
//! layer.

pub mod service;
pub mod storage;
