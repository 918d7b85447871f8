pub mod dashboard;
pub mod dns;
pub mod docs;
pub mod endpoint;
pub mod error;
pub mod router;
pub mod service_registry;

pub use dashboard::Dashboard;
pub use docs::{DocAggregator, DocsFlavor};
pub use endpoint::{EndpointResolver, FrontEndChoice, TargetLocator};
pub use error::{GatewayError, GatewayResult};
pub use router::{ProxyRequest, ProxyRouter};
pub use service_registry::ServiceRegistry;
