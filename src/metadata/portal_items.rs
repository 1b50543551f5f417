use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use url::Url;

use super::errors::ManifestError;

/// An item hosted by a portal, together with the filename its data is
/// expected to land under before anything has been downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalItem {
    pub identifier: String,
    pub filename: String,
}

/// Items to download, grouped by the portal that hosts them.
///
/// Portals are kept in URL order; items keep the order of the manifest.
#[derive(Debug, Clone, Default)]
pub struct PortalItems {
    pub portals: Vec<(Url, Vec<PortalItem>)>,
}

impl PortalItems {
    pub fn iter(&self) -> impl Iterator<Item = (&Url, &PortalItem)> {
        self.portals
            .iter()
            .flat_map(|(portal, items)| items.iter().map(move |item| (portal, item)))
    }

    pub fn len(&self) -> usize {
        self.portals.iter().map(|(_, items)| items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn load_portal_items(path: &Path) -> Result<PortalItems, ManifestError> {
    let raw: BTreeMap<String, Vec<PortalItem>> =
        plist::from_file(path).map_err(|source| ManifestError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    let mut portals = Vec::with_capacity(raw.len());
    for (url, items) in raw {
        let portal = Url::parse(&url).map_err(|source| ManifestError::InvalidPortalUrl {
            path: path.to_path_buf(),
            url: url.clone(),
            source,
        })?;
        portals.push((portal, items));
    }
    Ok(PortalItems { portals })
}
