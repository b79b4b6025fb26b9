//! Configuration of the aggregates: which histograms are materialized,
//! whether exemplars are attached and which buckets to use.
use crate::Role;
use anyhow::Context as _;
use std::path::Path;

/// Default latency buckets in seconds.
pub const DEFAULT_BUCKETS: [f64; 14] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

/// Error in the aggregates configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// No histogram buckets configured.
    #[error("histogram buckets are empty")]
    EmptyBuckets,
    /// Bucket bound is NaN or infinite.
    #[error("histogram bucket {index} is not finite")]
    NonFiniteBucket {
        /// Position of the offending bound.
        index: usize,
    },
    /// Bucket bounds are not strictly increasing.
    #[error("histogram bucket {index} is not greater than the previous one")]
    UnsortedBuckets {
        /// Position of the offending bound.
        index: usize,
    },
    /// Exemplars requested from a registry which cannot store them.
    #[error("{role} aggregates do not support exemplars")]
    ExemplarsUnsupported {
        /// Role of the aggregates.
        role: Role,
    },
}

/// Configuration of the aggregates of a single role.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoleConfig {
    /// Materialize the handled latency histogram.
    pub handling_time_histogram: bool,
    /// Materialize the message receive latency histogram.
    pub stream_recv_histogram: bool,
    /// Materialize the message send latency histogram.
    pub stream_send_histogram: bool,
    /// Attach exemplars to the handled counter and histogram.
    pub exemplars: bool,
    /// Histogram bucket upper bounds in seconds.
    pub buckets: Vec<f64>,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            handling_time_histogram: false,
            stream_recv_histogram: false,
            stream_send_histogram: false,
            exemplars: false,
            buckets: DEFAULT_BUCKETS.to_vec(),
        }
    }
}

impl RoleConfig {
    /// Configuration with every histogram enabled.
    pub fn all_histograms() -> Self {
        Self {
            handling_time_histogram: true,
            stream_recv_histogram: true,
            stream_send_histogram: true,
            ..Self::default()
        }
    }

    /// Checks that the buckets are non-empty, finite and strictly increasing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buckets.is_empty() {
            return Err(ConfigError::EmptyBuckets);
        }
        for (index, b) in self.buckets.iter().enumerate() {
            if !b.is_finite() {
                return Err(ConfigError::NonFiniteBucket { index });
            }
            if index > 0 && self.buckets[index - 1] >= *b {
                return Err(ConfigError::UnsortedBuckets { index });
            }
        }
        Ok(())
    }
}

/// Configuration of the aggregates of both roles.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Server side aggregates.
    pub server: RoleConfig,
    /// Client side aggregates.
    pub client: RoleConfig,
}

impl MetricsConfig {
    /// Configuration of the `role` aggregates.
    pub fn role(&self, role: Role) -> &RoleConfig {
        match role {
            Role::Client => &self.client,
            Role::Server => &self.server,
        }
    }

    /// Validates the configuration of both roles.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server.validate().context("server")?;
        self.client.validate().context("client")?;
        Ok(())
    }

    /// Decodes and validates a JSON configuration.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let mut d = serde_json::Deserializer::from_str(json);
        let cfg: Self = serde::Deserialize::deserialize(&mut d)?;
        d.end()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads a JSON configuration from `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("invalid config {}", path.display()))
    }
}
