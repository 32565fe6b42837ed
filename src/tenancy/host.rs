use crate::config::AppConfig;

const LOOPBACK_MARKERS: [&str; 3] = ["localhost", "127.0.0.1", "::1"];

/// How a request host maps onto tenants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostClass {
    /// Local development; the tenant comes from the user's memberships
    Development,
    /// A configured base domain, with the leftmost label when the host has
    /// at least three labels
    BaseDomain { subdomain: Option<String> },
    /// Anything else is a tenant's own domain
    Custom(String),
    /// No usable host header
    Missing,
}

/// Lowercase, strip the port and any trailing dot
pub fn normalize_host(raw: &str) -> String {
    let raw = raw.trim();
    let without_port = if let Some(rest) = raw.strip_prefix('[') {
        // [::1]:3000
        rest.split(']').next().unwrap_or(rest)
    } else if raw.matches(':').count() == 1 {
        raw.split(':').next().unwrap_or(raw)
    } else {
        raw
    };
    without_port.trim_end_matches('.').to_ascii_lowercase()
}

pub fn classify_host(raw: &str, config: &AppConfig) -> HostClass {
    let host = normalize_host(raw);

    if config.environment.is_development()
        || config.tenancy.force_localhost
        || LOOPBACK_MARKERS.iter().any(|marker| host.contains(marker))
    {
        return HostClass::Development;
    }

    if host.is_empty() {
        return HostClass::Missing;
    }

    for base in &config.tenancy.base_domains {
        if host == *base {
            return HostClass::BaseDomain { subdomain: None };
        }
        let under_base = host
            .strip_suffix(base.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'));
        if under_base {
            let labels: Vec<&str> = host.split('.').collect();
            let subdomain = (labels.len() >= 3)
                .then(|| labels[0].to_string())
                .filter(|label| !label.is_empty());
            return HostClass::BaseDomain { subdomain };
        }
    }

    HostClass::Custom(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    fn production(base_domains: &[&str]) -> AppConfig {
        let mut config = AppConfig::from_lookup(|key| match key {
            "APP_ENV" => Some("production".to_string()),
            _ => None,
        });
        config.tenancy.base_domains = base_domains.iter().map(|d| d.to_string()).collect();
        config
    }

    #[test]
    fn normalizes_ports_case_and_trailing_dot() {
        assert_eq!(normalize_host("Acme.Example.COM:443"), "acme.example.com");
        assert_eq!(normalize_host("example.com."), "example.com");
        assert_eq!(normalize_host("[::1]:3000"), "::1");
        assert_eq!(normalize_host("::1"), "::1");
        assert_eq!(normalize_host(""), "");
    }

    #[test]
    fn subdomain_of_base_domain() {
        let config = production(&["example.com"]);
        assert_eq!(
            classify_host("acme.example.com:8080", &config),
            HostClass::BaseDomain { subdomain: Some("acme".to_string()) }
        );
        assert_eq!(
            classify_host("a.b.example.com", &config),
            HostClass::BaseDomain { subdomain: Some("a".to_string()) }
        );
    }

    #[test]
    fn bare_base_domain_has_no_subdomain() {
        let config = production(&["example.com"]);
        assert_eq!(classify_host("example.com", &config), HostClass::BaseDomain { subdomain: None });
    }

    #[test]
    fn base_domain_match_respects_label_boundary() {
        let config = production(&["example.com"]);
        assert_eq!(
            classify_host("notexample.com", &config),
            HostClass::Custom("notexample.com".to_string())
        );
    }

    #[test]
    fn unknown_host_is_custom_domain() {
        let config = production(&["example.com"]);
        assert_eq!(
            classify_host("Billing.Acme.io", &config),
            HostClass::Custom("billing.acme.io".to_string())
        );
    }

    #[test]
    fn loopback_hosts_are_development_everywhere() {
        let config = production(&["example.com"]);
        for host in ["localhost:3000", "127.0.0.1", "[::1]:8080", "acme.localhost"] {
            assert_eq!(classify_host(host, &config), HostClass::Development, "{}", host);
        }
    }

    #[test]
    fn development_environment_and_force_flag() {
        let mut config = production(&["example.com"]);
        config.tenancy.force_localhost = true;
        assert_eq!(classify_host("acme.example.com", &config), HostClass::Development);

        config.tenancy.force_localhost = false;
        config.environment = Environment::Development;
        assert_eq!(classify_host("acme.example.com", &config), HostClass::Development);
    }

    #[test]
    fn empty_host_is_missing() {
        let config = production(&["example.com"]);
        assert_eq!(classify_host("", &config), HostClass::Missing);
    }
}
