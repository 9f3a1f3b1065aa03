use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Runtime environment the resolver shapes paths for.
///
/// Resolved once at startup and injected; resolution never re-derives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }

    /// The opposite environment, used when generating cross-environment fallbacks.
    pub fn other(self) -> Self {
        match self {
            Environment::Development => Environment::Production,
            Environment::Production => Environment::Development,
        }
    }

    /// Derive the environment from a host name.
    ///
    /// Loopback hosts, `*.local` and `*.localhost` are development; anything
    /// else is production. Intended for the startup collaborator that injects
    /// the environment, not for per-call use.
    pub fn from_host(host: &str) -> Self {
        let host = host.trim().to_lowercase();
        if host.starts_with("[::1]") || host == "::1" {
            return Environment::Development;
        }
        let bare = host.split(':').next().unwrap_or_default();
        let is_dev = matches!(bare, "localhost" | "127.0.0.1" | "0.0.0.0")
            || bare.ends_with(".local")
            || bare.ends_with(".localhost");
        if is_dev {
            Environment::Development
        } else {
            Environment::Production
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" | "local" => Ok(Environment::Development),
            _ => Err(anyhow::anyhow!("Invalid environment: {}", s)),
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}
