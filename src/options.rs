//! Per-call options for `convert` and `compare`.
//!
//! A fresh [`ConvertOptions`] is built for every invocation, either as a
//! plain struct literal or through [`ConvertOptionsBuilder`]. Builder
//! setters run in call order and overwrite earlier values, except for
//! filter options which accumulate.
//!
//! unoserver distinguishes an omitted parameter from an empty one, so every
//! optional string is an `Option<String>`; `None` is sent as `<nil/>`. The
//! builder maps an empty string to `None` so a host layer can forward raw
//! flag values without checking them first.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options for a single conversion or comparison.
///
/// # Example
/// ```rust
/// use unoclient::ConvertOptions;
///
/// let opts = ConvertOptions::builder()
///     .convert_to("pdf")
///     .filter_option("PageRange=1-2")
///     .filter_name("")          // empty means "let the server pick"
///     .build();
///
/// assert_eq!(opts.convert_to.as_deref(), Some("pdf"));
/// assert_eq!(opts.filter_name, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Exchange documents by path (the server shares our filesystem).
    pub local: bool,

    /// Target file type/extension, e.g. `pdf`.
    ///
    /// When `None`, the path-based entry derives it from the output file's
    /// extension; the byte-based entry sends it as absent.
    pub convert_to: Option<String>,

    /// Export filter, e.g. `writer_pdf_Export`. `None` lets the server choose.
    pub filter_name: Option<String>,

    /// Import filter, e.g. `writer8`. `None` auto-detects.
    pub in_filter_name: Option<String>,

    /// Export filter tuning in `name` or `name=value` form. Order is kept.
    pub filter_options: Vec<String>,

    /// Refresh document indexes (TOC etc.) before converting. Can be slow.
    pub update_index: bool,

    /// Comparison result file type/extension. Derived like `convert_to`.
    pub file_type: Option<String>,
}

impl ConvertOptions {
    /// Create a new builder for `ConvertOptions`.
    pub fn builder() -> ConvertOptionsBuilder {
        ConvertOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for [`ConvertOptions`].
#[derive(Debug)]
pub struct ConvertOptionsBuilder {
    options: ConvertOptions,
}

impl ConvertOptionsBuilder {
    pub fn local(mut self, local: bool) -> Self {
        self.options.local = local;
        self
    }

    pub fn convert_to(mut self, to: impl Into<String>) -> Self {
        self.options.convert_to = non_empty(to.into());
        self
    }

    pub fn filter_name(mut self, name: impl Into<String>) -> Self {
        self.options.filter_name = non_empty(name.into());
        self
    }

    pub fn in_filter_name(mut self, name: impl Into<String>) -> Self {
        self.options.in_filter_name = non_empty(name.into());
        self
    }

    /// Append one filter option.
    pub fn filter_option(mut self, opt: impl Into<String>) -> Self {
        self.options.filter_options.push(opt.into());
        self
    }

    /// Append several filter options, preserving their order.
    pub fn filter_options<I, S>(mut self, opts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options
            .filter_options
            .extend(opts.into_iter().map(Into::into));
        self
    }

    pub fn update_index(mut self, v: bool) -> Self {
        self.options.update_index = v;
        self
    }

    pub fn file_type(mut self, ft: impl Into<String>) -> Self {
        self.options.file_type = non_empty(ft.into());
        self
    }

    pub fn build(self) -> ConvertOptions {
        self.options
    }
}

/// Map the empty string to `None`.
pub(crate) fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Split a comma-separated filter option list, dropping empty fields.
///
/// `"a=1,,b"` → `["a=1", "b"]`.
pub fn split_filter_options(s: &str) -> Vec<String> {
    s.split(',')
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// File type implied by an output path: the text after the last `.` of the
/// file name, or `None` when there is no extension.
///
/// Only the final path component is inspected, so a dot in a directory name
/// does not count. A leading dot counts (`.pdf` → `pdf`).
pub fn derive_file_type(output: &Path) -> Option<String> {
    let name = output.file_name()?.to_string_lossy();
    let (_, ext) = name.rsplit_once('.')?;
    non_empty(ext.to_string())
}
