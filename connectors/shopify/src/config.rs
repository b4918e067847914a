//! Shopify audit configuration.
//!
//! Values come from the process environment (after `.env` is loaded by the
//! binary). Loading goes through a lookup function so tests can supply their
//! own variables without touching the real environment.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AuditError, AuditResult};
use crate::metafields::{AliasedMetafields, MetafieldRequirement};
use crate::types::ResourceType;

const DEFAULT_API_VERSION: &str = "2024-07";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_CRON: &str = "0 0 9 * * Mon";
const DEFAULT_TIMEZONE: &str = "Europe/Madrid";
const DEFAULT_PORT: u16 = 3000;

/// Full service configuration.
#[derive(Debug, Clone, Default)]
pub struct AuditConfig {
    pub shopify: ShopifyConfig,
    pub requirements: RequirementsConfig,
    pub smtp: SmtpConfig,
    pub report: ReportConfig,
    pub schedule: ScheduleConfig,
    pub server: ServerConfig,
    pub log_format: LogFormat,
}

/// Admin API access.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shop domain, e.g. `my-store.myshopify.com`
    pub shop: Option<String>,

    /// Admin API access token
    pub access_token: Option<String>,

    /// Admin API version (default: 2024-07)
    pub api_version: String,

    /// Full endpoint override (default: derived from shop and version)
    pub api_url: Option<String>,

    /// Per-request timeout (default: 30s)
    pub timeout: Duration,
}

impl fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("shop", &self.shop)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            shop: None,
            access_token: None,
            api_version: DEFAULT_API_VERSION.into(),
            api_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ShopifyConfig {
    /// Shop domain and token, or a config error naming what is missing.
    pub fn credentials(&self) -> AuditResult<(&str, &str)> {
        match (non_empty(self.shop.as_deref()), non_empty(self.access_token.as_deref())) {
            (Some(shop), Some(token)) => Ok((shop, token)),
            _ => Err(AuditError::config(
                "SHOPIFY_SHOP and SHOPIFY_ADMIN_TOKEN must be set",
            )),
        }
    }

    /// GraphQL Admin API endpoint.
    pub fn endpoint(&self) -> AuditResult<String> {
        if let Some(url) = non_empty(self.api_url.as_deref()) {
            return Ok(url.to_string());
        }
        let (shop, _) = self.credentials()?;
        let shop = shop
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        Ok(format!(
            "https://{shop}/admin/api/{}/graphql.json",
            self.api_version
        ))
    }
}

/// Required metafields per resource type, as `namespace.key` lists.
///
/// An empty list disables the type.
#[derive(Debug, Clone)]
pub struct RequirementsConfig {
    /// Requirements for products
    pub product: String,
    /// Requirements for collections
    pub collection: String,
    /// Requirements for pages
    pub page: String,
}

impl Default for RequirementsConfig {
    fn default() -> Self {
        Self {
            product: ResourceType::Product.default_requirements().into(),
            collection: ResourceType::Collection.default_requirements().into(),
            page: ResourceType::Page.default_requirements().into(),
        }
    }
}

impl RequirementsConfig {
    #[must_use]
    pub fn raw(&self, resource_type: ResourceType) -> &str {
        match resource_type {
            ResourceType::Product => &self.product,
            ResourceType::Collection => &self.collection,
            ResourceType::Page => &self.page,
        }
    }

    /// Parsed, aliased requirements for one type.
    pub fn metafields(&self, resource_type: ResourceType) -> AuditResult<AliasedMetafields> {
        AliasedMetafields::new(MetafieldRequirement::parse_list(self.raw(resource_type))?)
    }
}

/// SMTP delivery settings.
#[derive(Clone)]
pub struct SmtpConfig {
    /// Relay host
    pub host: Option<String>,

    /// STARTTLS submission port (default: 587)
    pub port: u16,

    /// Login user; also the default sender
    pub username: Option<String>,

    /// Login password
    pub password: Option<String>,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_SMTP_PORT,
            username: None,
            password: None,
        }
    }
}

/// Report output and distribution.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Directory the spreadsheet is written to (default: system temp dir)
    pub dir: PathBuf,

    /// Sender address (default: SMTP username)
    pub from: Option<String>,

    /// Recipient addresses
    pub recipients: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir(),
            from: None,
            recipients: Vec::new(),
        }
    }
}

/// Weekly trigger settings.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Cron expression with a seconds field (default: Mondays 09:00)
    pub cron: String,

    /// IANA time zone (default: Europe/Madrid)
    pub timezone: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: DEFAULT_CRON.into(),
            timezone: DEFAULT_TIMEZONE.into(),
        }
    }
}

impl ScheduleConfig {
    /// Parsed time zone.
    pub fn tz(&self) -> AuditResult<chrono_tz::Tz> {
        self.timezone
            .parse()
            .map_err(|_| AuditError::config(format!("unknown time zone `{}`", self.timezone)))
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port (default: 3000)
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl AuditConfig {
    /// Load from the process environment.
    pub fn from_env() -> AuditResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    ///
    /// Shopify credentials and SMTP settings may be absent here; they are
    /// checked by the components that need them.
    pub fn from_lookup<F>(lookup: F) -> AuditResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string());
        let mut config = Self::default();

        config.shopify.shop = get("SHOPIFY_SHOP");
        config.shopify.access_token = get("SHOPIFY_ADMIN_TOKEN");
        if let Some(version) = non_empty(get("SHOPIFY_API_VERSION").as_deref()) {
            config.shopify.api_version = version.to_string();
        }
        config.shopify.api_url = get("SHOPIFY_API_URL");
        if let Some(secs) = parse_number::<u64>("HTTP_TIMEOUT_SECS", get("HTTP_TIMEOUT_SECS"))? {
            config.shopify.timeout = Duration::from_secs(secs);
        }

        for resource_type in ResourceType::ALL {
            // An empty value is meaningful: it disables the type.
            if let Some(raw) = get(resource_type.requirements_env()) {
                match resource_type {
                    ResourceType::Product => config.requirements.product = raw,
                    ResourceType::Collection => config.requirements.collection = raw,
                    ResourceType::Page => config.requirements.page = raw,
                }
            }
            config.requirements.metafields(resource_type)?;
        }

        config.smtp.host = get("SMTP_HOST").filter(|v| !v.is_empty());
        if let Some(port) = parse_number::<u16>("SMTP_PORT", get("SMTP_PORT"))? {
            config.smtp.port = port;
        }
        config.smtp.username = get("SMTP_USER").filter(|v| !v.is_empty());
        config.smtp.password = lookup("SMTP_PASS").filter(|v| !v.is_empty());

        if let Some(dir) = non_empty(get("REPORT_DIR").as_deref()) {
            config.report.dir = PathBuf::from(dir);
        }
        config.report.from = get("REPORT_FROM_EMAIL");
        config.report.recipients = split_list(get("REPORT_TO_EMAIL").as_deref().unwrap_or(""));

        if let Some(timezone) = non_empty(get("TIMEZONE").as_deref()) {
            config.schedule.timezone = timezone.to_string();
        }
        if let Some(cron) = non_empty(get("SCAN_SCHEDULE").as_deref()) {
            config.schedule.cron = cron.to_string();
        }
        config.schedule.tz()?;

        if let Some(port) = parse_number::<u16>("PORT", get("PORT"))? {
            config.server.port = port;
        }

        config.log_format = match get("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase) {
            None => LogFormat::Pretty,
            Some(format) => match format.as_str() {
                "" | "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                other => {
                    return Err(AuditError::config(format!(
                        "LOG_FORMAT must be `pretty` or `json`, got `{other}`"
                    )));
                }
            },
        };

        Ok(config)
    }
}

/// Split a comma-separated list, trimming entries and dropping blanks.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(name: &str, value: Option<String>) -> AuditResult<Option<T>> {
    match non_empty(value.as_deref()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AuditError::config(format!("{name} must be a number, got `{raw}`"))),
    }
}
