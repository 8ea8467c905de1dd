//! Remote implementations of the provider traits.
//!
//! Endpoints (relative to the client's base URL):
//! - `GET effective-links?item_sku=`
//! - `GET effective-cascade?item_sku=`
//! - `GET template?template_id=&axis=color|size`

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use stockgrid_core::cascade::{
    LinkScope, OptionLink, OptionRef, OptionType, ScopedSettings, SettingsMap,
};
use stockgrid_core::error::CoreError;
use stockgrid_core::options::OptionAxis;
use stockgrid_core::store::{CascadeSource, LinkSource, TemplateSource};
use stockgrid_core::templates::Template;
use stockgrid_core::types::DbId;

use crate::client::RemoteClient;
use crate::error::RemoteError;

pub const EFFECTIVE_LINKS_PATH: &str = "effective-links";
pub const EFFECTIVE_CASCADE_PATH: &str = "effective-cascade";
pub const TEMPLATE_PATH: &str = "template";

/// A 404 from a per-SKU endpoint means the SKU does not exist there.
fn sku_error(sku: &str, err: RemoteError) -> CoreError {
    match err {
        RemoteError::NotFound { .. } => CoreError::not_found("Item", sku),
        other => other.into(),
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LinksData {
    #[serde(default)]
    links: Vec<WireLink>,
}

#[derive(Debug, Deserialize)]
struct WireLink {
    option_type: OptionType,
    option_id: DbId,
    #[serde(default)]
    option_label: Option<String>,
    /// `"sku"` for a link on the item itself, `"category"` when inherited.
    applies_to_type: String,
    #[serde(default)]
    category_id: Option<DbId>,
}

impl WireLink {
    fn into_link(self, sku: &str) -> OptionLink {
        let scope = if self.applies_to_type == "sku" {
            LinkScope::Explicit
        } else {
            LinkScope::Inherited
        };
        OptionLink {
            sku: sku.to_string(),
            option_ref: OptionRef {
                option_type: self.option_type,
                option_id: self.option_id,
            },
            scope,
            category_id: match scope {
                LinkScope::Explicit => None,
                LinkScope::Inherited => self.category_id,
            },
            label: self.option_label,
        }
    }
}

pub struct RemoteLinkSource {
    client: RemoteClient,
}

impl RemoteLinkSource {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LinkSource for RemoteLinkSource {
    async fn effective_links(&self, sku: &str) -> Result<Vec<OptionLink>, CoreError> {
        let data: LinksData = self
            .client
            .get(EFFECTIVE_LINKS_PATH, &[("item_sku", sku)])
            .await
            .map_err(|err| sku_error(sku, err))?;
        tracing::debug!(sku = %sku, links = data.links.len(), "Fetched remote option links");
        Ok(data.links.into_iter().map(|l| l.into_link(sku)).collect())
    }
}

// ---------------------------------------------------------------------------
// Cascade settings
// ---------------------------------------------------------------------------

/// The remote resolves one winning scope per SKU.
#[derive(Debug, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
enum CascadeData {
    Sku {
        #[serde(default)]
        settings: Option<Value>,
    },
    Category {
        category_id: DbId,
        #[serde(default)]
        settings: Option<Value>,
    },
    Default,
}

fn settings_object(value: Option<Value>) -> SettingsMap {
    match value {
        Some(Value::Object(map)) => map.into_iter().collect(),
        _ => SettingsMap::new(),
    }
}

/// Cascade settings served by the remote `effective-cascade` endpoint
/// instead of the local settings table.
pub struct RemoteCascadeSource {
    client: RemoteClient,
}

impl RemoteCascadeSource {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CascadeSource for RemoteCascadeSource {
    async fn scoped_settings(&self, sku: &str) -> Result<ScopedSettings, CoreError> {
        let data: CascadeData = self
            .client
            .get(EFFECTIVE_CASCADE_PATH, &[("item_sku", sku)])
            .await
            .map_err(|err| sku_error(sku, err))?;
        Ok(match data {
            CascadeData::Sku { settings } => ScopedSettings {
                explicit: Some(settings_object(settings)),
                category: None,
            },
            CascadeData::Category {
                category_id,
                settings,
            } => ScopedSettings {
                explicit: None,
                category: Some((category_id, settings_object(settings))),
            },
            CascadeData::Default => ScopedSettings::default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TemplateData {
    #[serde(default)]
    template: Option<Template>,
}

pub struct RemoteTemplateSource {
    client: RemoteClient,
}

impl RemoteTemplateSource {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TemplateSource for RemoteTemplateSource {
    async fn fetch_template(
        &self,
        template_id: &str,
        axis: OptionAxis,
    ) -> Result<Option<Template>, CoreError> {
        let result = self
            .client
            .get::<TemplateData>(
                TEMPLATE_PATH,
                &[("template_id", template_id), ("axis", axis.as_str())],
            )
            .await;
        match result {
            Ok(data) => Ok(data.template),
            Err(RemoteError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
