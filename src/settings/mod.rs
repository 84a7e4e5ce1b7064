//! Program settings: how logging is filtered and where it goes, and how
//! config files are found and read.
//!
//! Your starting point should probably be
//! [`Settings::load_from_default_path_or_defaults`].
//!
//! # Internals
//! A settings file is first deserialized into unvalidated ("unresolved")
//! tables, which are then resolved against the [`SettingsOrigin`] they were
//! loaded from. Resolution is where level filters are checked and relative
//! paths are anchored: a path in a settings file is relative to the
//! directory that file lives in, a path in the built-in defaults is relative
//! to the current directory.
//!
//! Every field has a default, so a settings file only needs to contain the
//! values it wants to change, and no settings file is needed at all.

mod origin;
mod structure;
mod traits;

pub use origin::{SettingsOrigin, DEFAULT_SETTINGS_FILE_PATH};
pub use structure::*;
