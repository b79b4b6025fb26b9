//! Label sets identifying a call's series.
use crate::{Code, MethodIdentity, RpcType};
use vise::EncodeLabelSet;

/// Labels shared by all per-call series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct CallLabels {
    /// Shape of the call.
    pub grpc_type: RpcType,
    /// Service name.
    pub grpc_service: String,
    /// Method name.
    pub grpc_method: String,
}

impl CallLabels {
    /// Labels of a call with the given shape and identity.
    pub fn new(rpc_type: RpcType, identity: MethodIdentity) -> Self {
        Self {
            grpc_type: rpc_type,
            grpc_service: identity.service,
            grpc_method: identity.method,
        }
    }

    /// Attaches the outcome of the call.
    pub fn with_code(&self, code: Code) -> HandledLabels {
        HandledLabels {
            grpc_type: self.grpc_type,
            grpc_service: self.grpc_service.clone(),
            grpc_method: self.grpc_method.clone(),
            grpc_code: code,
        }
    }
}

/// Labels of the handled counter: call labels plus the status code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct HandledLabels {
    /// Shape of the call.
    pub grpc_type: RpcType,
    /// Service name.
    pub grpc_service: String,
    /// Method name.
    pub grpc_method: String,
    /// Outcome of the call.
    pub grpc_code: Code,
}

