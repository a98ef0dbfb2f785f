//! Icon source images
//!
//! An `ImageSource` produces raw encoded bytes; decoding happens in the
//! pipeline so that every source is validated the same way. Sources are
//! tried in priority order and the first one that decodes wins.

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Raster catalog: material icon PNGs
pub const DEFAULT_ICON_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/google/material-design-icons/master/png/";

/// Vector catalog: material icon Android vector drawables
pub const DEFAULT_FOREGROUND_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/google/material-design-icons/master/android/";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Catalog keys and their material icon (category, name)
const CATALOG: &[(&str, &str, &str)] = &[
    ("phone", "communication", "phone"),
    ("globe", "social", "public"),
    ("shop", "action", "shopping_cart"),
    ("chat", "communication", "chat"),
    ("home", "action", "home"),
    ("star", "toggle", "star"),
];

#[derive(Debug, Error)]
pub enum IconError {
    #[error("no inline icon data")]
    EmptyInline,

    #[error("inline data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unknown icon choice '{0}'")]
    UnknownChoice(String),

    #[error("invalid catalog URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog returned HTTP {0}")]
    Status(u16),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("asset is {0} bytes, below the minimum")]
    TooSmall(u64),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Anything that can produce an encoded icon image
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Short name used in reports, e.g. `inline` or `catalog:phone`
    fn name(&self) -> &str;

    /// Load the encoded bytes
    async fn load(&self) -> Result<Vec<u8>, IconError>;

    /// Whether the image was supplied by the user rather than picked from a
    /// catalog. User images also become the adaptive foreground layer.
    fn is_inline(&self) -> bool {
        false
    }
}

/// Base64 image data passed in the configuration
pub struct InlineSource {
    data: String,
}

impl InlineSource {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl ImageSource for InlineSource {
    fn name(&self) -> &str {
        "inline"
    }

    async fn load(&self) -> Result<Vec<u8>, IconError> {
        decode_inline(&self.data)
    }

    fn is_inline(&self) -> bool {
        true
    }
}

/// Decode inline base64, accepting a `data:` URL prefix, embedded
/// whitespace, missing padding and the URL-safe alphabet.
pub fn decode_inline(data: &str) -> Result<Vec<u8>, IconError> {
    let payload = match data.trim().strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, b64)| b64).unwrap_or(rest),
        None => data,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(IconError::EmptyInline);
    }

    match STANDARD.decode(&compact) {
        Ok(bytes) => Ok(bytes),
        Err(err) => [STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
            .iter()
            .find_map(|engine| engine.decode(&compact).ok())
            .ok_or(IconError::Base64(err)),
    }
}

/// Which artifact a catalog serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    /// 192 px PNG
    Raster,
    /// Android vector drawable XML
    Vector,
}

/// Icon looked up by key in a remote catalog
pub struct CatalogSource {
    client: reqwest::Client,
    base_url: String,
    key: String,
    kind: CatalogKind,
    name: String,
}

impl CatalogSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, key: &str, kind: CatalogKind) -> Self {
        let key = key.trim().to_lowercase();
        let name = match kind {
            CatalogKind::Raster => format!("catalog:{}", key),
            CatalogKind::Vector => format!("foreground:{}", key),
        };
        Self {
            client,
            base_url: base_url.into(),
            key,
            kind,
            name,
        }
    }

    /// Catalog-relative path of the icon, or `None` for an unknown key
    pub fn relative_path(&self) -> Option<String> {
        let (_, category, icon) = CATALOG.iter().find(|(k, _, _)| *k == self.key)?;
        Some(match self.kind {
            CatalogKind::Raster => format!(
                "{category}/{icon}/materialicons/48dp/2x/baseline_{icon}_black_48dp.png",
                category = category,
                icon = icon
            ),
            CatalogKind::Vector => format!(
                "{category}/{icon}/materialicons/black/res/drawable/baseline_{icon}_24.xml",
                category = category,
                icon = icon
            ),
        })
    }

    pub fn url(&self) -> Result<Url, IconError> {
        let path = self
            .relative_path()
            .ok_or_else(|| IconError::UnknownChoice(self.key.clone()))?;
        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Url::parse(&base)?.join(&path)?)
    }
}

#[async_trait]
impl ImageSource for CatalogSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Vec<u8>, IconError> {
        let url = self.url()?;
        tracing::debug!("Fetching icon from {}", url);

        let response = self
            .client
            .get(url)
            .header("User-Agent", concat!("apkforge/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IconError::Status(response.status().as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Shared HTTP client for catalog fetches
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(FETCH_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Where catalog icons are fetched from
#[derive(Debug, Clone)]
pub struct CatalogUrls {
    pub icons: String,
    pub foregrounds: String,
}

impl Default for CatalogUrls {
    fn default() -> Self {
        Self {
            icons: DEFAULT_ICON_CATALOG_URL.to_string(),
            foregrounds: DEFAULT_FOREGROUND_CATALOG_URL.to_string(),
        }
    }
}

/// Image sources in priority order plus the adaptive foreground source
pub struct IconSources {
    pub images: Vec<Box<dyn ImageSource>>,
    pub foreground: Option<Box<dyn ImageSource>>,
}

impl IconSources {
    /// Inline data first (if any), then the catalog entry for `choice`
    pub fn resolve(inline: Option<&str>, choice: &str, urls: &CatalogUrls) -> Self {
        let client = http_client();
        let mut images: Vec<Box<dyn ImageSource>> = Vec::new();
        if let Some(data) = inline {
            images.push(Box::new(InlineSource::new(data)));
        }
        images.push(Box::new(CatalogSource::new(
            client.clone(),
            urls.icons.as_str(),
            choice,
            CatalogKind::Raster,
        )));
        let foreground = CatalogSource::new(client, urls.foregrounds.as_str(), choice, CatalogKind::Vector);
        Self {
            images,
            foreground: Some(Box::new(foreground)),
        }
    }

    /// No sources at all; icons are left untouched
    pub fn none() -> Self {
        Self {
            images: Vec::new(),
            foreground: None,
        }
    }
}
