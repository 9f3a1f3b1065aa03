use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Durable cache tier backends
///
/// The durable tier outlives a single process. `Memory` keeps records in a
/// quota-bounded map (tests, one-shot tools); `File` persists one record per key
/// under a cache directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurableBackend {
    #[default]
    Memory,
    File,
}

impl FromStr for DurableBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(DurableBackend::Memory),
            "file" | "fs" => Ok(DurableBackend::File),
            _ => Err(anyhow::anyhow!("Invalid durable backend: {}", s)),
        }
    }
}

impl Display for DurableBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DurableBackend::Memory => write!(f, "memory"),
            DurableBackend::File => write!(f, "file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("MEMORY".parse::<DurableBackend>().unwrap(), DurableBackend::Memory);
        assert_eq!(" fs ".parse::<DurableBackend>().unwrap(), DurableBackend::File);
        assert!("s3".parse::<DurableBackend>().is_err());
    }
}
