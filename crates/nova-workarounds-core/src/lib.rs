//! # nova-workarounds-core
//!
//! Pure domain logic for the nova-workarounds hook: the line-preserving
//! INI document model, the `[workarounds]` section merge, the managed
//! settings and their boolean normalisation, and the unit state that the
//! hook persists between invocations.
//!
//! This crate performs no I/O.  Reading and writing `nova.conf`, restarting
//! `nova-compute`, and storing the unit state all live in
//! `nova-workarounds-hook`.
//!
//! # How the merge works (for beginners)
//!
//! `nova.conf` is an INI-style file:
//!
//! ```text
//! [DEFAULT]
//! debug = false
//!
//! [workarounds]
//! disable_rootwrap = false
//!
//! [libvirt]
//! virt_type = kvm
//! ```
//!
//! The hook owns exactly two keys in `[workarounds]`.  Merging rewrites the
//! section body so that those two keys appear once each, at the end of the
//! body, with the requested values.  Every other line of the section keeps
//! its text and order, the blank lines before `[libvirt]` are kept, and
//! nothing outside the section changes.

pub mod domain;

pub use domain::config::HookConfig;
pub use domain::document::ConfigDocument;
pub use domain::section::{find_section, merge_section, ManagedSetting, SectionSpan};
pub use domain::settings::{
    apply_workarounds, OptionError, OptionValue, WorkaroundOptions, WorkaroundSettings,
    KEY_SKIP_AT_STARTUP, KEY_SKIP_ON_DEST, WORKAROUNDS_SECTION,
};
pub use domain::state::{UnitRecord, UnitState, UnitStatus, WorkloadStatus};
