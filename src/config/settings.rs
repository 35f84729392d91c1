use crate::cli::Cli;

/// TTL applied to the new record when `-ttl` is not given.
pub const DEFAULT_TTL: u32 = 60;

pub const DEFAULT_ENDPOINT: &str = "https://dns.googleapis.com/dns/v1";

/// Everything a single update needs, fixed once the command line is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub project: String,
    pub managed_zone: String,
    pub record_name: String,
    pub ip_addr: String,
    pub ttl: u32,
    pub api_endpoint: String,
}

impl Settings {
    pub fn new(project: &str, managed_zone: &str, record_name: &str, ip_addr: &str) -> Self {
        Self {
            project: project.to_string(),
            managed_zone: managed_zone.to_string(),
            record_name: record_name.to_string(),
            ip_addr: ip_addr.to_string(),
            ttl: DEFAULT_TTL,
            api_endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_api_endpoint(mut self, endpoint: &str) -> Self {
        self.api_endpoint = endpoint.to_string();
        self
    }
}

impl From<Cli> for Settings {
    fn from(cli: Cli) -> Self {
        Self {
            project: cli.project,
            managed_zone: cli.managed_zone,
            record_name: cli.record_name,
            ip_addr: cli.ip_addr,
            ttl: cli.ttl,
            api_endpoint: cli.api_endpoint,
        }
    }
}
