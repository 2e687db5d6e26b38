//! Versioned partition naming.
//!
//! Exactly three logical partitions are live at any time: static assets,
//! images and dynamic content. Each physical partition name carries the
//! deployment's version suffix, so bumping the version supersedes all three at
//! once and the old names can be recognised and evicted on activation.
//!
//! ```
//! use folio_backend::{PartitionKind, Partitions};
//!
//! let partitions = Partitions::new("v3");
//! assert_eq!(partitions.name(PartitionKind::Images), "images-v3");
//! assert!(partitions.is_current("static-v3"));
//! assert!(!partitions.is_current("static-v2"));
//! ```

use smol_str::{SmolStr, format_smolstr};

/// The three logical partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKind {
    /// App shell documents, scripts, styles and icons.
    Static,
    /// Covers and CDN image renditions.
    Images,
    /// Catalogue data and other same-origin content.
    Dynamic,
}

impl PartitionKind {
    /// All kinds, in the order they are created at install.
    pub const ALL: [PartitionKind; 3] = [
        PartitionKind::Static,
        PartitionKind::Images,
        PartitionKind::Dynamic,
    ];

    /// Name prefix of this kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PartitionKind::Static => "static",
            PartitionKind::Images => "images",
            PartitionKind::Dynamic => "dynamic",
        }
    }
}

/// The current version triple of partition names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitions {
    static_assets: SmolStr,
    images: SmolStr,
    dynamic: SmolStr,
}

impl Partitions {
    /// Builds the triple for a version suffix.
    pub fn new(version: &str) -> Self {
        Partitions {
            static_assets: format_smolstr!("{}-{}", PartitionKind::Static.as_str(), version),
            images: format_smolstr!("{}-{}", PartitionKind::Images.as_str(), version),
            dynamic: format_smolstr!("{}-{}", PartitionKind::Dynamic.as_str(), version),
        }
    }

    /// Physical name of a logical partition.
    pub fn name(&self, kind: PartitionKind) -> &str {
        match kind {
            PartitionKind::Static => &self.static_assets,
            PartitionKind::Images => &self.images,
            PartitionKind::Dynamic => &self.dynamic,
        }
    }

    /// `true` if `name` belongs to the current version triple.
    pub fn is_current(&self, name: &str) -> bool {
        PartitionKind::ALL
            .iter()
            .any(|kind| self.name(*kind) == name)
    }

    /// Names from `existing` that belong to a superseded version.
    pub fn superseded<I, S>(&self, existing: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        existing
            .into_iter()
            .map(Into::into)
            .filter(|name| !self.is_current(name))
            .collect()
    }
}
