//! Service and method names of a call.

/// Label value used when a method path cannot be split.
pub const UNKNOWN: &str = "unknown";

/// `(service, method)` pair derived from a fully-qualified method path
/// of the form `/service/method`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodIdentity {
    /// Fully-qualified service name, e.g. `my.package.Service`.
    pub service: String,
    /// Method name, e.g. `MyMethod`.
    pub method: String,
}

impl MethodIdentity {
    /// Identity used for malformed paths.
    pub fn unknown() -> Self {
        Self {
            service: UNKNOWN.into(),
            method: UNKNOWN.into(),
        }
    }

    /// Splits `full_method` into service and method names.
    /// Never fails: a path without a separator yields `unknown` for both
    /// names, and an empty name on either side of the separator is replaced
    /// with `unknown`, so that label values are never empty.
    pub fn parse(full_method: &str) -> Self {
        let name = full_method.strip_prefix('/').unwrap_or(full_method);
        let Some((service, method)) = name.split_once('/') else {
            tracing::debug!(full_method, "malformed method path");
            return Self::unknown();
        };
        let or_unknown = |s: &str| if s.is_empty() { UNKNOWN } else { s }.to_owned();
        Self {
            service: or_unknown(service),
            method: or_unknown(method),
        }
    }
}
