//! Shopify catalog audit types.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Catalog resource types that carry required metafields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Product,
    Collection,
    Page,
}

/// How a resource type decides that a node is visible to shoppers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// The connection's search query only returns visible nodes.
    ServerFilter(&'static str),
    /// The node is visible when `publishedAt` is non-null.
    PublishedAt,
}

impl ResourceType {
    /// All built-in types, in report order.
    pub const ALL: [Self; 3] = [Self::Product, Self::Collection, Self::Page];

    /// Label used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "PRODUCT",
            Self::Collection => "COLLECTION",
            Self::Page => "PAGE",
        }
    }

    /// Root connection in the Admin API.
    #[must_use]
    pub const fn connection(self) -> &'static str {
        match self {
            Self::Product => "products",
            Self::Collection => "collections",
            Self::Page => "pages",
        }
    }

    /// Sort key pinning a stable traversal order.
    ///
    /// The `pages` connection is walked in its default order.
    #[must_use]
    pub const fn sort_key(self) -> Option<&'static str> {
        match self {
            Self::Product | Self::Collection => Some("ID"),
            Self::Page => None,
        }
    }

    #[must_use]
    pub const fn visibility(self) -> Visibility {
        match self {
            Self::Product => Visibility::ServerFilter("status:ACTIVE AND published_status:published"),
            Self::Collection => Visibility::ServerFilter("published_status:published"),
            Self::Page => Visibility::PublishedAt,
        }
    }

    /// Status label stamped on every record of this type.
    #[must_use]
    pub const fn status(self) -> &'static str {
        match self {
            Self::Product => "Activo",
            Self::Collection => "Publicada",
            Self::Page => "Visible",
        }
    }

    /// Human description of which nodes are audited, for the email body.
    #[must_use]
    pub const fn audience(self) -> &'static str {
        match self {
            Self::Product => "Productos (Activos y publicados)",
            Self::Collection => "Colecciones (Publicadas)",
            Self::Page => "Páginas (Visibles)",
        }
    }

    /// Environment variable overriding this type's requirements.
    #[must_use]
    pub const fn requirements_env(self) -> &'static str {
        match self {
            Self::Product => "REQUIRED_PRODUCT_METAFIELDS",
            Self::Collection => "REQUIRED_COLLECTION_METAFIELDS",
            Self::Page => "REQUIRED_PAGE_METAFIELDS",
        }
    }

    /// Requirements audited when no override is configured.
    #[must_use]
    pub const fn default_requirements(self) -> &'static str {
        match self {
            Self::Product => "custom.newsection",
            Self::Collection => "custom.coleccion",
            Self::Page => "custom.familia",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort rank of a status label; higher sorts first.
#[must_use]
pub fn status_rank(status: &str) -> u8 {
    match status {
        "Activo" => 3,
        "Visible" => 2,
        "Publicada" => 1,
        _ => 0,
    }
}

/// A visible resource lacking at least one required metafield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingRecord {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Visibility label for the type (`Activo`, `Visible`, `Publicada`).
    pub status: String,
    /// Admin API global ID.
    pub id: String,
    pub handle: String,
    pub title: String,
    /// `namespace.key` of each missing metafield, in requirement order.
    pub missing: Vec<String>,
}

/// Per-type record counts for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCounts {
    /// Products missing a required metafield.
    pub products: usize,
    /// Collections missing a required metafield.
    pub collections: usize,
    /// Pages missing a required metafield.
    pub pages: usize,
}

impl TypeCounts {
    /// Record `count` findings for `resource_type`.
    pub const fn set(&mut self, resource_type: ResourceType, count: usize) {
        match resource_type {
            ResourceType::Product => self.products = count,
            ResourceType::Collection => self.collections = count,
            ResourceType::Page => self.pages = count,
        }
    }

    #[must_use]
    pub const fn get(&self, resource_type: ResourceType) -> usize {
        match resource_type {
            ResourceType::Product => self.products,
            ResourceType::Collection => self.collections,
            ResourceType::Page => self.pages,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.products + self.collections + self.pages
    }
}

/// What the notifier needs to announce a finished report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    /// Spreadsheet to attach.
    pub report_path: PathBuf,
    /// Records across all types.
    pub total: usize,
    pub counts: TypeCounts,
}

/// Outcome of a successful scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Records written to the report.
    pub missing_count: usize,
    /// Where the report was written.
    pub report_file_path: String,
}
