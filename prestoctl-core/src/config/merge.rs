//! Overlay user overrides on computed defaults
//!
//! Property sets merge key by key; flag lists are replaced whole. The two
//! combine operations are kept separate on purpose and tested on their own.

use super::bundle::{ConfigBundle, ConfigPayload, FlagList, PropertySet};
use tracing::{debug, warn};

/// Key-wise merge: override keys win, missing keys fall back to the
/// default, extra override keys pass through unchanged.
pub fn merge_properties(defaults: &PropertySet, overrides: &PropertySet) -> PropertySet {
    let mut merged = defaults.clone();
    for (key, value) in overrides.iter() {
        merged.insert(key, value);
    }
    merged
}

/// Whole-value replacement: a non-empty override replaces the defaults,
/// an empty one keeps them. Never interleaves.
pub fn replace_flags(defaults: &FlagList, overrides: &FlagList) -> FlagList {
    if overrides.is_empty() {
        defaults.clone()
    } else {
        overrides.clone()
    }
}

/// Merge an optional override bundle over the defaults.
///
/// Only files present in `defaults` make it into the result. An override
/// whose payload kind differs from the default replaces it as-is and is
/// left for the validator to reject.
pub fn merge(defaults: &ConfigBundle, overrides: Option<&ConfigBundle>) -> ConfigBundle {
    let Some(overrides) = overrides else {
        return defaults.clone();
    };

    for name in overrides.file_names().filter(|n| !defaults.contains(n)) {
        warn!("ignoring override for unknown configuration file {}", name);
    }

    let mut merged = ConfigBundle::new();
    for name in defaults.file_names() {
        let Some(default) = defaults.get(name) else { continue };
        let payload = match (default, overrides.get(name)) {
            (_, None) => default.clone(),
            (ConfigPayload::Properties(d), Some(ConfigPayload::Properties(o))) => {
                ConfigPayload::Properties(merge_properties(d, o))
            }
            (ConfigPayload::Flags(d), Some(ConfigPayload::Flags(o))) => {
                ConfigPayload::Flags(replace_flags(d, o))
            }
            (_, Some(other)) => {
                debug!("override for {} is a {}, keeping it verbatim", name, other.kind());
                other.clone()
            }
        };
        merged.insert(name, payload);
    }
    merged
}
