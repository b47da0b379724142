use url::Url;

/// Allow-list of external hostnames, parsed from a comma-separated setting.
/// A URL is trusted iff its hostname equals a listed domain exactly or is a
/// strict subdomain of one. Anything that fails to parse is never trusted.
#[derive(Debug, Clone)]
pub struct TrustedDomains {
    domains: Vec<String>,
}

impl TrustedDomains {
    pub fn from_csv(raw: &str) -> Self {
        let domains = raw
            .split(',')
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        Self { domains }
    }

    pub fn is_trusted(&self, url_str: &str) -> bool {
        let Ok(url) = Url::parse(url_str) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };

        self.domains
            .iter()
            .any(|d| host == d || host.ends_with(&format!(".{}", d)))
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
