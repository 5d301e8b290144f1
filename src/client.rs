//! The unoserver client: `info`, `convert` and `compare`.
//!
//! Each operation issues exactly one remote call. The parameter lists below
//! are positional and fixed by unoserver's XML-RPC interface; reordering or
//! dropping any of them breaks compatibility.
//!
//! ```text
//! convert(inpath, indata, outpath, convert_to, filtername,
//!         filter_options, update_index, infiltername)
//! compare(oldpath, olddata, newpath, newdata, outpath, filetype)
//! ```
//!
//! Every optional parameter that is absent goes out as `<nil/>`.
//!
//! ## Byte entries vs. path entries
//!
//! [`UnoClient::convert`] and [`UnoClient::compare`] take and return bytes
//! and always send content inline. [`UnoClient::convert_file`] and
//! [`UnoClient::compare_file`] take paths and honour
//! [`ConvertOptions::local`]:
//!
//! * **local**: the paths themselves are sent; unoserver reads and writes
//!   the files. This process touches no file.
//! * **remote**: inputs are read here, sent inline, and the returned bytes
//!   are written to the output path once the whole response has arrived.

use crate::config::ClientConfig;
use crate::error::{Result, UnoError};
use crate::info::ServiceInfo;
use crate::options::{derive_file_type, ConvertOptions};
use crate::output::{read_input, write_output};
use crate::rpc::{HttpTransport, Transport, Value};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Client for one unoserver endpoint.
///
/// Generic over the [`Transport`] so tests can swap in a stub; the default
/// is [`HttpTransport`].
///
/// # Example
/// ```rust,no_run
/// use unoclient::{ClientConfig, ConvertOptions, UnoClient};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::builder()
///     .endpoint("http://10.0.0.7:2003")
///     .build()?;
/// let client = UnoClient::new(&config)?;
///
/// // Remote server: the document is uploaded and the PDF written here.
/// client
///     .convert_file("report.docx", "report.pdf", &ConvertOptions::default())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct UnoClient<T = HttpTransport> {
    transport: T,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl UnoClient<HttpTransport> {
    /// Create an HTTP client from a validated configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self {
            transport,
            timeout: config.timeout,
            cancel: None,
        })
    }

    /// Create an HTTP client for `endpoint` with default settings.
    pub fn connect(endpoint: impl Into<String>) -> Result<Self> {
        let config = ClientConfig::builder().endpoint(endpoint).build()?;
        Self::new(&config)
    }
}

impl<T: Transport> UnoClient<T> {
    /// Create a client over an arbitrary transport.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            timeout: None,
            cancel: None,
        }
    }

    /// Fail any call that has not completed within `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Abort in-flight calls when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Ask unoserver for its versions and available filters.
    pub async fn info(&self) -> Result<ServiceInfo> {
        let value = self.call("info", Vec::new()).await?;
        ServiceInfo::from_value(&value)
    }

    /// Convert a document held in memory; returns the converted bytes.
    ///
    /// Content is always sent inline regardless of `opts.local`, and
    /// `opts.convert_to` is sent as given (there is no output name to derive
    /// it from).
    pub async fn convert(&self, input: &[u8], opts: &ConvertOptions) -> Result<Vec<u8>> {
        info!("Converting {} bytes in memory", input.len());
        let params = convert_params(
            None,
            Some(input.to_vec()),
            None,
            opts.convert_to.clone(),
            opts,
        );
        let value = self.call("convert", params).await?;
        payload("convert", value)
    }

    /// Convert the file at `input` into `output`.
    ///
    /// When `opts.convert_to` is unset it is derived from `output`'s
    /// extension.
    pub async fn convert_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        opts: &ConvertOptions,
    ) -> Result<()> {
        let (input, output) = (input.as_ref(), output.as_ref());
        require_path("input", input)?;
        require_path("output", output)?;

        let convert_to = opts
            .convert_to
            .clone()
            .or_else(|| derive_file_type(output));

        info!(
            "Converting {} --> {} ({} mode)",
            input.display(),
            output.display(),
            mode(opts)
        );

        if opts.local {
            let params = convert_params(
                Some(path_param(input)?),
                None,
                Some(path_param(output)?),
                convert_to,
                opts,
            );
            let value = self.call("convert", params).await?;
            discard_local_payload("convert", value);
            return Ok(());
        }

        let data = read_input(input).await?;
        let params = convert_params(None, Some(data), None, convert_to, opts);
        let value = self.call("convert", params).await?;
        let result = payload("convert", value)?;
        write_output(output, result).await
    }

    /// Compare two documents held in memory; returns the comparison result.
    ///
    /// Both documents are always sent inline, and `opts.file_type` is sent
    /// as given.
    pub async fn compare(&self, old: &[u8], new: &[u8], opts: &ConvertOptions) -> Result<Vec<u8>> {
        info!(
            "Comparing {} bytes against {} bytes in memory",
            old.len(),
            new.len()
        );
        let params = compare_params(
            None,
            Some(old.to_vec()),
            None,
            Some(new.to_vec()),
            None,
            opts.file_type.clone(),
        );
        let value = self.call("compare", params).await?;
        payload("compare", value)
    }

    /// Compare the files `old` and `new`, writing the result to `output`.
    ///
    /// When `opts.file_type` is unset it is derived from `output`'s
    /// extension.
    pub async fn compare_file(
        &self,
        old: impl AsRef<Path>,
        new: impl AsRef<Path>,
        output: impl AsRef<Path>,
        opts: &ConvertOptions,
    ) -> Result<()> {
        let (old, new, output) = (old.as_ref(), new.as_ref(), output.as_ref());
        require_path("old", old)?;
        require_path("new", new)?;
        require_path("output", output)?;

        let file_type = opts.file_type.clone().or_else(|| derive_file_type(output));

        info!(
            "Comparing '{}' '{}' --> {} ({} mode)",
            old.display(),
            new.display(),
            output.display(),
            mode(opts)
        );

        if opts.local {
            let params = compare_params(
                Some(path_param(old)?),
                None,
                Some(path_param(new)?),
                None,
                Some(path_param(output)?),
                file_type,
            );
            let value = self.call("compare", params).await?;
            discard_local_payload("compare", value);
            return Ok(());
        }

        let old_data = read_input(old).await?;
        let new_data = read_input(new).await?;
        let params = compare_params(None, Some(old_data), None, Some(new_data), None, file_type);
        let value = self.call("compare", params).await?;
        let result = payload("compare", value)?;
        write_output(output, result).await
    }

    /// Perform one remote call under the configured deadline and
    /// cancellation token.
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        debug!("Calling '{}' with {} params", method, params.len());

        let deadline = async {
            match self.timeout {
                Some(limit) => {
                    match tokio::time::timeout(limit, self.transport.call(method, params)).await {
                        Ok(result) => result,
                        Err(_) => Err(UnoError::Timeout {
                            method: method.to_string(),
                            elapsed_ms: limit.as_millis() as u64,
                        }),
                    }
                }
                None => self.transport.call(method, params).await,
            }
        };

        let result = match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(UnoError::Cancelled {
                    method: method.to_string(),
                }),
                r = deadline => r,
            },
            None => deadline.await,
        };

        match &result {
            Ok(_) => info!("'{}' completed", method),
            Err(e) => debug!("'{}' failed: {}", method, e),
        }
        result
    }
}

// ── Parameter assembly ───────────────────────────────────────────────────

fn convert_params(
    in_path: Option<String>,
    in_data: Option<Vec<u8>>,
    out_path: Option<String>,
    convert_to: Option<String>,
    opts: &ConvertOptions,
) -> Vec<Value> {
    vec![
        in_path.into(),
        in_data.into(),
        out_path.into(),
        convert_to.into(),
        opts.filter_name.clone().into(),
        opts.filter_options.as_slice().into(),
        opts.update_index.into(),
        opts.in_filter_name.clone().into(),
    ]
}

fn compare_params(
    old_path: Option<String>,
    old_data: Option<Vec<u8>>,
    new_path: Option<String>,
    new_data: Option<Vec<u8>>,
    out_path: Option<String>,
    file_type: Option<String>,
) -> Vec<Value> {
    vec![
        old_path.into(),
        old_data.into(),
        new_path.into(),
        new_data.into(),
        out_path.into(),
        file_type.into(),
    ]
}

/// Extract the document bytes from a `convert`/`compare` result.
fn payload(method: &str, value: Value) -> Result<Vec<u8>> {
    match value {
        Value::Base64(bytes) => Ok(bytes),
        Value::Nil => Ok(Vec::new()),
        Value::String(s) => Ok(s.into_bytes()),
        other => Err(UnoError::protocol(
            method,
            format!("expected base64 payload, got {}", other.type_name()),
        )),
    }
}

fn discard_local_payload(method: &str, value: Value) {
    if !value.is_nil() {
        debug!(
            "'{}' returned a {} payload in local mode; ignoring it",
            method,
            value.type_name()
        );
    }
}

fn require_path(what: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(UnoError::InvalidConfig(format!(
            "The {what} path must not be empty"
        )));
    }
    Ok(())
}

fn path_param(path: &Path) -> Result<String> {
    path.to_str().map(str::to_string).ok_or_else(|| {
        UnoError::InvalidConfig(format!(
            "Path '{}' is not valid UTF-8 and cannot be sent to unoserver",
            path.display()
        ))
    })
}

fn mode(opts: &ConvertOptions) -> &'static str {
    if opts.local {
        "local"
    } else {
        "remote"
    }
}
