// Adapters layer: concrete implementations of the domain ports against real processes, HTTP, DNS and AWS.

pub mod apigateway;
pub mod dns;
pub mod http;
pub mod shell;

pub use apigateway::ApiGatewayLookup;
pub use dns::HickoryDnsProbe;
pub use http::ReqwestProbe;
pub use shell::TokioCommandRunner;
