//! Configuration management and the product registry
//!
//! The registry maps vendor -> product -> advisory page locations and parser
//! selection. It is loaded once at process start and never mutated; every
//! request resolves against this read-only view.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::application::errors::ConfigurationError;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub registry: Registry,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds applied at the client level.
    pub timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Registry of supported vendors and their products
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    pub vendors: BTreeMap<String, VendorConfig>,
}

/// Vendor-level configuration; values here act as defaults that
/// product-level entries may shadow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    pub display_name: String,
    /// Default parser key for products that do not declare their own.
    pub parser: Option<String>,
    pub search_url: Option<String>,
    pub cve_api_url: Option<String>,
    pub products: BTreeMap<String, ProductConfig>,
}

/// Product-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    pub display_name: Option<String>,
    pub parser: Option<String>,
    pub supported_versions: Vec<String>,
    /// Advisory page URLs keyed by base version, with an optional "all"
    /// fallback entry shared by every version.
    pub urls: BTreeMap<String, String>,
    /// Auxiliary endpoint resolving release dates, where the advisory page
    /// itself does not carry them.
    pub date_url: Option<String>,
    pub search_url: Option<String>,
    pub cve_api_url: Option<String>,
}

impl Registry {
    /// Look up a vendor entry by its lowercase key
    pub fn vendor(&self, vendor: &str) -> Option<&VendorConfig> {
        self.vendors.get(&vendor.to_lowercase())
    }

    /// Build the layered view over one (vendor, product) pair
    pub fn scope(&self, vendor: &str, product: &str) -> Option<ProductScope> {
        let vendor_cfg = self.vendor(vendor)?;
        let product_key = product.to_lowercase();
        let product_cfg = vendor_cfg.products.get(&product_key)?;
        Some(ProductScope {
            product_key,
            vendor_display: vendor_cfg.display_name.clone(),
            vendor_parser: vendor_cfg.parser.clone(),
            vendor_search_url: vendor_cfg.search_url.clone(),
            vendor_cve_api_url: vendor_cfg.cve_api_url.clone(),
            product: product_cfg.clone(),
        })
    }

    /// Enforce the registry invariant: every declared supported version must
    /// resolve to a URL (exact entry or the "all" fallback), and every
    /// product must resolve to a parser key at some level.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (vendor_key, vendor) in &self.vendors {
            for (product_key, product) in &vendor.products {
                if product.parser.is_none() && vendor.parser.is_none() {
                    return Err(ConfigurationError::Invalid {
                        message: format!(
                            "no parser configured for '{}/{}'",
                            vendor_key, product_key
                        ),
                    });
                }
                for version in &product.supported_versions {
                    if !product.urls.contains_key(version) && !product.urls.contains_key("all") {
                        return Err(ConfigurationError::Invalid {
                            message: format!(
                                "no URL configured for '{}/{}' version {}",
                                vendor_key, product_key, version
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Layered view over one product: product-level values shadow vendor-level
/// defaults, which shadow hardcoded fallbacks. Lookups are explicit per
/// field; there is no implicit attribute fallback.
#[derive(Debug, Clone)]
pub struct ProductScope {
    product_key: String,
    vendor_display: String,
    vendor_parser: Option<String>,
    vendor_search_url: Option<String>,
    vendor_cve_api_url: Option<String>,
    product: ProductConfig,
}

impl ProductScope {
    /// Human-readable product name: the product override shadows the
    /// vendor display name.
    pub fn display_name(&self) -> &str {
        self.product
            .display_name
            .as_deref()
            .unwrap_or(&self.vendor_display)
    }

    /// Vendor display name as reported in canonical records
    pub fn vendor_display(&self) -> &str {
        &self.vendor_display
    }

    /// Parser key: product override, then vendor default
    pub fn parser_key(&self) -> Option<&str> {
        self.product
            .parser
            .as_deref()
            .or(self.vendor_parser.as_deref())
    }

    /// Declared supported versions for the product
    pub fn supported_versions(&self) -> &[String] {
        &self.product.supported_versions
    }

    /// Advisory URL for a base version, falling back to the "all" entry
    pub fn url_for(&self, base_version: &str) -> Result<String, ConfigurationError> {
        self.product
            .urls
            .get(base_version)
            .or_else(|| self.product.urls.get("all"))
            .cloned()
            .ok_or_else(|| ConfigurationError::MissingUrl {
                product: self.product_key.clone(),
                version: base_version.to_string(),
            })
    }

    pub fn date_url(&self) -> Option<&str> {
        self.product.date_url.as_deref()
    }

    pub fn search_url(&self) -> Option<&str> {
        self.product
            .search_url
            .as_deref()
            .or(self.vendor_search_url.as_deref())
    }

    pub fn cve_api_url(&self) -> Option<&str> {
        self.product
            .cve_api_url
            .as_deref()
            .or(self.vendor_cve_api_url.as_deref())
    }
}

fn string_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn versions(list: &[&str]) -> Vec<String> {
    list.iter().map(|v| v.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        let mut vendors = BTreeMap::new();

        let mut ibm_products = BTreeMap::new();
        ibm_products.insert(
            "mq".to_string(),
            ProductConfig {
                display_name: Some("IBM MQ".to_string()),
                parser: Some("ibm_mq_fix_list".to_string()),
                supported_versions: versions(&["9.1", "9.2", "9.3", "9.4"]),
                urls: string_map(&[
                    (
                        "9.1",
                        "https://www.ibm.com/support/pages/fix-list-ibm-mq-version-9.1-lts",
                    ),
                    (
                        "9.2",
                        "https://www.ibm.com/support/pages/fix-list-ibm-mq-version-9.2-lts",
                    ),
                    (
                        "9.3",
                        "https://www.ibm.com/support/pages/fix-list-ibm-mq-version-9.3-lts",
                    ),
                    (
                        "9.4",
                        "https://www.ibm.com/support/pages/fix-list-ibm-mq-version-9.4-lts",
                    ),
                ]),
                date_url: None,
                search_url: None,
                cve_api_url: None,
            },
        );
        ibm_products.insert(
            "websphere".to_string(),
            ProductConfig {
                display_name: Some("IBM WebSphere Application Server".to_string()),
                parser: Some("websphere_fix_list".to_string()),
                supported_versions: versions(&["8.5", "9.0"]),
                urls: string_map(&[
                    (
                        "8.5",
                        "https://www.ibm.com/support/pages/fix-list-ibm-websphere-application-server-v85",
                    ),
                    (
                        "9.0",
                        "https://www.ibm.com/support/pages/fix-list-ibm-websphere-application-server-v90",
                    ),
                ]),
                date_url: None,
                search_url: None,
                cve_api_url: None,
            },
        );
        vendors.insert(
            "ibm".to_string(),
            VendorConfig {
                display_name: "IBM".to_string(),
                parser: None,
                search_url: None,
                cve_api_url: None,
                products: ibm_products,
            },
        );

        let mut apache_products = BTreeMap::new();
        apache_products.insert(
            "tomcat".to_string(),
            ProductConfig {
                display_name: Some("Apache Tomcat".to_string()),
                parser: None,
                supported_versions: versions(&["9", "10", "11"]),
                urls: string_map(&[
                    ("9", "https://tomcat.apache.org/security-9.html"),
                    ("10", "https://tomcat.apache.org/security-10.html"),
                    ("11", "https://tomcat.apache.org/security-11.html"),
                ]),
                date_url: None,
                search_url: None,
                cve_api_url: None,
            },
        );
        vendors.insert(
            "apache".to_string(),
            VendorConfig {
                display_name: "Apache".to_string(),
                parser: Some("tomcat_security_page".to_string()),
                search_url: None,
                cve_api_url: None,
                products: apache_products,
            },
        );

        let mut oracle_products = BTreeMap::new();
        oracle_products.insert(
            "oracle database".to_string(),
            ProductConfig {
                display_name: Some("Oracle Database Server".to_string()),
                parser: None,
                supported_versions: versions(&["19", "21", "23"]),
                urls: string_map(&[("all", "https://www.oracle.com/security-alerts")]),
                date_url: None,
                search_url: None,
                cve_api_url: None,
            },
        );
        oracle_products.insert(
            "oracle java se".to_string(),
            ProductConfig {
                display_name: Some("Oracle Java SE".to_string()),
                parser: None,
                supported_versions: versions(&["8", "11", "17", "21"]),
                urls: string_map(&[("all", "https://www.oracle.com/security-alerts")]),
                date_url: None,
                search_url: None,
                cve_api_url: None,
            },
        );
        vendors.insert(
            "oracle".to_string(),
            VendorConfig {
                display_name: "Oracle".to_string(),
                parser: Some("cpu_risk_matrix".to_string()),
                search_url: None,
                cve_api_url: None,
                products: oracle_products,
            },
        );

        let mut mariadb_products = BTreeMap::new();
        mariadb_products.insert(
            "server".to_string(),
            ProductConfig {
                display_name: Some("MariaDB Server".to_string()),
                parser: None,
                supported_versions: versions(&["10.6", "10.11", "11.4"]),
                urls: string_map(&[("all", "https://mariadb.com/kb/en/security/")]),
                date_url: Some("https://downloads.mariadb.org/rest-api/mariadb/".to_string()),
                search_url: None,
                cve_api_url: None,
            },
        );
        vendors.insert(
            "mariadb".to_string(),
            VendorConfig {
                display_name: "MariaDB".to_string(),
                parser: Some("release_notes".to_string()),
                search_url: None,
                cve_api_url: Some("https://cveawg.mitre.org/api/cve/".to_string()),
                products: mariadb_products,
            },
        );

        let mut redhat_products = BTreeMap::new();
        redhat_products.insert(
            "eap".to_string(),
            ProductConfig {
                display_name: Some("JBoss Enterprise Application Platform".to_string()),
                parser: None,
                supported_versions: versions(&["7.4", "8.0"]),
                urls: string_map(&[("all", "https://access.redhat.com/hydra/rest/search/kcs")]),
                date_url: None,
                search_url: None,
                cve_api_url: None,
            },
        );
        vendors.insert(
            "redhat".to_string(),
            VendorConfig {
                display_name: "Red Hat".to_string(),
                parser: Some("errata_feed".to_string()),
                search_url: Some("https://access.redhat.com/hydra/rest/search/kcs".to_string()),
                cve_api_url: Some(
                    "https://access.redhat.com/hydra/rest/securitydata/cve.json".to_string(),
                ),
                products: redhat_products,
            },
        );

        Self {
            registry: Registry { vendors },
            http: HttpConfig { timeout_seconds: 15 },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("ADVISORA").separator("__"));

        // Override with environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        builder.build()?.try_deserialize()
    }
}
