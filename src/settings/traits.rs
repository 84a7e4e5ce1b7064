use miette::Result;

use super::origin::SettingsOrigin;

/// A deserialized settings table that still has to be checked, and whose
/// relative paths still have to be anchored to where the settings came from.
pub(crate) trait ResolvableSettings {
    type Resolved;

    fn resolve(self, origin: &SettingsOrigin) -> Result<Self::Resolved>;
}
