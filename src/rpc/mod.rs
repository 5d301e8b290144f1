//! XML-RPC plumbing between [`crate::UnoClient`] and unoserver.
//!
//! The client only needs one capability: "call this procedure with these
//! positional parameters and give me the result". That capability is the
//! [`Transport`] trait. [`HttpTransport`] implements it over HTTP; tests
//! substitute a stub that records calls and returns scripted values.
//!
//! ## Data Flow
//!
//! ```text
//! Vec<Value> ──▶ codec::encode_call ──▶ POST text/xml ──▶ codec::decode_response ──▶ Value
//! ```
//!
//! 1. [`value`]: the XML-RPC data model, including `<nil/>` for absent params
//! 2. [`codec`]: methodCall serialisation and methodResponse parsing
//! 3. [`http`]: the reqwest-backed transport

pub mod codec;
pub mod http;
pub mod value;

pub use http::HttpTransport;
pub use value::Value;

use crate::error::Result;
use async_trait::async_trait;

/// Performs a named remote call with positional parameters.
///
/// Implementations must surface remote faults and transport failures as
/// [`crate::UnoError`] transport variants and must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        (**self).call(method, params).await
    }
}
