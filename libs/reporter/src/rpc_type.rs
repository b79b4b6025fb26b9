//! Shape of an RPC call.
use std::fmt;
use vise::EncodeLabelValue;

/// Shape of a call, as declared by the method descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue)]
#[metrics(rename_all = "snake_case")]
pub enum RpcType {
    /// Single request, single response.
    Unary,
    /// Stream of requests, single response.
    ClientStream,
    /// Single request, stream of responses.
    ServerStream,
    /// Streams in both directions.
    BidiStream,
}

impl RpcType {
    /// All call shapes.
    pub const ALL: [Self; 4] = [
        Self::Unary,
        Self::ClientStream,
        Self::ServerStream,
        Self::BidiStream,
    ];

    /// Derives the call shape from the streaming flags of a method descriptor.
    pub fn from_streaming(client_streams: bool, server_streams: bool) -> Self {
        match (client_streams, server_streams) {
            (false, false) => Self::Unary,
            (true, false) => Self::ClientStream,
            (false, true) => Self::ServerStream,
            (true, true) => Self::BidiStream,
        }
    }

    /// Label value of the call shape.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unary => "unary",
            Self::ClientStream => "client_stream",
            Self::ServerStream => "server_stream",
            Self::BidiStream => "bidi_stream",
        }
    }
}

impl fmt::Display for RpcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
