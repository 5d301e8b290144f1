//! # unoclient
//!
//! Client for [unoserver](https://github.com/unoconv/unoserver), the
//! LibreOffice-backed document conversion service, over its XML-RPC
//! interface.
//!
//! The library does no conversion itself. It marshals the parameters of the
//! three remote procedures (`info`, `convert`, `compare`), performs the call
//! and moves the documents:
//!
//! ```text
//! ConvertOptions ──▶ UnoClient ──▶ Transport (XML-RPC over HTTP) ──▶ unoserver
//!                      │
//!                      ├─ local mode:  send file paths, server does the I/O
//!                      └─ remote mode: read inputs, send bytes, write output
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use unoclient::{ClientConfig, ConvertOptions, Location, UnoClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = "localhost";
//!     let config = ClientConfig::builder()
//!         .endpoint(format!("http://{host}:2003"))
//!         .build()?;
//!     let client = UnoClient::new(&config)?;
//!
//!     let opts = ConvertOptions::builder()
//!         .local(Location::Auto.resolve(host))
//!         .build();
//!     client.convert_file("/tmp/hello.txt", "/tmp/hello.pdf", &opts).await?;
//!
//!     println!("{}", client.info().await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `unoconv` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! unoclient = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod info;
pub mod options;
pub mod output;
pub mod rpc;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::UnoClient;
pub use config::{ClientConfig, ClientConfigBuilder, Endpoint, Location, Protocol};
pub use error::{Result, UnoError};
pub use info::ServiceInfo;
pub use options::{derive_file_type, split_filter_options, ConvertOptions, ConvertOptionsBuilder};
pub use rpc::{HttpTransport, Transport, Value};
pub use tokio_util::sync::CancellationToken;
