//! Network client, token session, and the cache-first home/search flow.

pub mod auth;
pub mod client;
pub mod connectivity;
pub mod decoder;
pub mod endpoint;
pub mod home;
pub mod loader;
pub mod logging;
pub mod models;
pub mod search;
pub mod transport;

pub use auth::{
    AuthSessionManager, HttpTokenRefresher, SessionEvent, SessionSignal, TokenGrant,
    TokenRefresher,
};
pub use client::NetworkClient;
pub use connectivity::ConnectivityMonitor;
pub use decoder::ResponseDecoder;
pub use endpoint::{Endpoint, HttpMethod, ResolvedRequest};
pub use home::{HomeEndpoint, HomeService};
pub use loader::{CacheFirstLoader, DataOrigin, LoadState, RemoteSource};
pub use models::{HomeResponse, HomeSection, ShopModel};
pub use search::{SearchState, ShopSearch};
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError};
