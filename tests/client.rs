//! Integration tests for `UnoClient` against an in-process stub transport.
//!
//! The stub records every call (method + positional params) and answers with
//! a scripted responder, so these tests pin down the exact parameter contract
//! unoserver expects and the local/remote file handling around it.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use unoclient::{
    CancellationToken, ConvertOptions, ServiceInfo, Transport, UnoClient, UnoError, Value,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

type Responder = Box<dyn Fn(&str, &[Value]) -> Result<Value, UnoError> + Send + Sync>;

struct StubTransport {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    respond: Responder,
    delay: Option<Duration>,
}

impl StubTransport {
    fn new(respond: impl Fn(&str, &[Value]) -> Result<Value, UnoError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
            delay: None,
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(|_, _| Ok(Value::Nil)),
            delay: Some(delay),
        })
    }

    /// Echoes the inline input back, as a server converting text to text would.
    fn echo() -> Arc<Self> {
        Self::new(|method, params| match method {
            "convert" => Ok(params[1].clone()),
            "compare" => match (&params[1], &params[3]) {
                (Value::Base64(old), Value::Base64(new)) => {
                    Ok(Value::Base64([old.as_slice(), b"|", new.as_slice()].concat()))
                }
                _ => Ok(Value::Nil),
            },
            other => panic!("unexpected method {other}"),
        })
    }

    fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    fn only_call(&self) -> (String, Vec<Value>) {
        let calls = self.calls();
        assert_eq!(calls.len(), 1, "expected exactly one remote call");
        calls.into_iter().next().unwrap()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, UnoError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.respond)(method, &params)
    }
}

fn client(stub: &Arc<StubTransport>) -> UnoClient<Arc<StubTransport>> {
    UnoClient::with_transport(Arc::clone(stub))
}

fn remote() -> ConvertOptions {
    ConvertOptions::default()
}

fn local() -> ConvertOptions {
    ConvertOptions::builder().local(true).build()
}

fn s(v: &str) -> Value {
    Value::String(v.to_string())
}

fn path_str(p: &Path) -> String {
    p.to_str().unwrap().to_string()
}

fn sample_info() -> Value {
    let filters = |pairs: &[(&str, &str)]| {
        Value::Struct(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), s(v)))
                .collect::<BTreeMap<_, _>>(),
        )
    };
    let mut m = BTreeMap::new();
    m.insert("api".to_string(), s("3"));
    m.insert("unoserver".to_string(), s("3.2"));
    m.insert(
        "import_filters".to_string(),
        filters(&[("writer8", "Writer"), ("Text", "Text"), ("calc8", "Calc")]),
    );
    m.insert(
        "export_filters".to_string(),
        filters(&[("writer_pdf_Export", "PDF"), ("HTML (StarWriter)", "HTML")]),
    );
    Value::Struct(m)
}

// ── convert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn convert_file_remote_round_trips_through_echo() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.pdf");
    std::fs::write(&input, b"hello unoserver").unwrap();

    let stub = StubTransport::echo();
    client(&stub)
        .convert_file(&input, &output, &remote())
        .await
        .expect("conversion should succeed");

    assert_eq!(std::fs::read(&output).unwrap(), b"hello unoserver");

    let (method, params) = stub.only_call();
    assert_eq!(method, "convert");
    assert_eq!(
        params,
        vec![
            Value::Nil,
            Value::Base64(b"hello unoserver".to_vec()),
            Value::Nil,
            s("pdf"),
            Value::Nil,
            Value::Array(vec![]),
            Value::Bool(false),
            Value::Nil,
        ]
    );
}

#[tokio::test]
async fn convert_bytes_returns_recorded_output_and_never_derives_type() {
    let stub = StubTransport::new(|_, _| Ok(Value::Base64(b"%PDF-1.7 reference".to_vec())));
    let out = client(&stub)
        .convert(b"plain text", &local())
        .await
        .unwrap();
    assert_eq!(out, b"%PDF-1.7 reference");

    let (_, params) = stub.only_call();
    // Inline even though local was requested.
    assert_eq!(params[0], Value::Nil);
    assert_eq!(params[1], Value::Base64(b"plain text".to_vec()));
    assert_eq!(params[2], Value::Nil);
    assert_eq!(params[3], Value::Nil);
}

#[tokio::test]
async fn convert_bytes_sends_explicit_convert_to() {
    let stub = StubTransport::new(|_, _| Ok(Value::Base64(Vec::new())));
    let opts = ConvertOptions::builder().convert_to("docx").build();
    client(&stub).convert(b"x", &opts).await.unwrap();
    assert_eq!(stub.only_call().1[3], s("docx"));
}

#[tokio::test]
async fn convert_passes_every_option_in_position() {
    let stub = StubTransport::new(|_, _| Ok(Value::Nil));
    let opts = ConvertOptions::builder()
        .convert_to("pdf")
        .filter_name("writer_pdf_Export")
        .in_filter_name("Text (encoded)")
        .filter_option("PageRange=2-3")
        .filter_options(["Quality=80", "ExportNotes"])
        .update_index(true)
        .build();

    client(&stub).convert(b"doc", &opts).await.unwrap();

    let (_, params) = stub.only_call();
    assert_eq!(params.len(), 8);
    assert_eq!(params[3], s("pdf"));
    assert_eq!(params[4], s("writer_pdf_Export"));
    assert_eq!(
        params[5],
        Value::Array(vec![s("PageRange=2-3"), s("Quality=80"), s("ExportNotes")])
    );
    assert_eq!(params[6], Value::Bool(true));
    assert_eq!(params[7], s("Text (encoded)"));
}

#[tokio::test]
async fn convert_file_explicit_type_wins_over_extension() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.odt");
    std::fs::write(&input, b"odt").unwrap();

    let stub = StubTransport::echo();
    let opts = ConvertOptions::builder().convert_to("docx").build();
    client(&stub)
        .convert_file(&input, dir.path().join("out.pdf"), &opts)
        .await
        .unwrap();
    assert_eq!(stub.only_call().1[3], s("docx"));
}

#[tokio::test]
async fn convert_file_without_extension_sends_nil_type() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.odt");
    std::fs::write(&input, b"odt").unwrap();

    let stub = StubTransport::echo();
    client(&stub)
        .convert_file(&input, dir.path().join("result"), &remote())
        .await
        .unwrap();
    assert_eq!(stub.only_call().1[3], Value::Nil);
}

#[tokio::test]
async fn convert_file_local_sends_paths_and_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    // Neither file exists: any local read would fail, any write would show up.
    let input = dir.path().join("server-side/in.docx");
    let output = dir.path().join("server-side/out.pdf");

    let stub = StubTransport::new(|_, _| Ok(Value::Nil));
    client(&stub)
        .convert_file(&input, &output, &local())
        .await
        .expect("local conversion should not read the input");

    assert!(!output.exists());
    assert!(!dir.path().join("server-side").exists());

    let (_, params) = stub.only_call();
    assert_eq!(params[0], s(&path_str(&input)));
    assert_eq!(params[1], Value::Nil);
    assert_eq!(params[2], s(&path_str(&output)));
    assert_eq!(params[3], s("pdf"));
}

#[tokio::test]
async fn convert_file_local_ignores_returned_payload() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.pdf");

    let stub = StubTransport::new(|_, _| Ok(Value::Base64(b"unexpected".to_vec())));
    client(&stub)
        .convert_file(dir.path().join("in.docx"), &output, &local())
        .await
        .unwrap();
    assert!(!output.exists());
}

#[tokio::test]
async fn convert_file_remote_failure_leaves_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let fresh = dir.path().join("fresh.pdf");
    let existing = dir.path().join("existing.pdf");
    std::fs::write(&input, b"text").unwrap();
    std::fs::write(&existing, b"previous result").unwrap();

    let stub = StubTransport::new(|method, _| {
        Err(UnoError::Fault {
            method: method.to_string(),
            code: 1,
            message: "RuntimeError: Could not find an export filter".into(),
        })
    });
    let c = client(&stub);

    let err = c.convert_file(&input, &fresh, &remote()).await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("Could not find an export filter"));
    assert!(!fresh.exists());

    let err = c
        .convert_file(&input, &existing, &remote())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Could not find an export filter"));
    assert_eq!(std::fs::read(&existing).unwrap(), b"previous result");

    // Only the input and the pre-existing output remain.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[tokio::test]
async fn convert_file_missing_input_fails_before_calling() {
    let dir = tempfile::tempdir().unwrap();
    let stub = StubTransport::echo();

    let err = client(&stub)
        .convert_file(dir.path().join("nope.docx"), dir.path().join("out.pdf"), &remote())
        .await
        .unwrap_err();

    assert!(matches!(err, UnoError::ReadFailed { .. }));
    assert!(err.to_string().contains("nope.docx"));
    assert!(stub.calls().is_empty());
}

#[tokio::test]
async fn convert_file_rejects_empty_paths() {
    let stub = StubTransport::echo();
    let err = client(&stub)
        .convert_file("", "out.pdf", &remote())
        .await
        .unwrap_err();
    assert!(matches!(err, UnoError::InvalidConfig(_)));
    assert!(stub.calls().is_empty());
}

// ── compare ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn compare_file_remote_reads_both_and_writes_result() {
    let dir = tempfile::tempdir().unwrap();
    let old = dir.path().join("v1.odt");
    let new = dir.path().join("v2.odt");
    let out = dir.path().join("diff.odt");
    std::fs::write(&old, b"one").unwrap();
    std::fs::write(&new, b"two").unwrap();

    let stub = StubTransport::echo();
    client(&stub)
        .compare_file(&old, &new, &out, &remote())
        .await
        .unwrap();

    assert_eq!(std::fs::read(&out).unwrap(), b"one|two");

    let (method, params) = stub.only_call();
    assert_eq!(method, "compare");
    assert_eq!(
        params,
        vec![
            Value::Nil,
            Value::Base64(b"one".to_vec()),
            Value::Nil,
            Value::Base64(b"two".to_vec()),
            Value::Nil,
            s("odt"),
        ]
    );
}

#[tokio::test]
async fn compare_file_local_sends_paths() {
    let stub = StubTransport::new(|_, _| Ok(Value::Nil));
    let opts = ConvertOptions::builder().local(true).file_type("pdf").build();
    client(&stub)
        .compare_file("/srv/a.docx", "/srv/b.docx", "/srv/diff.odt", &opts)
        .await
        .unwrap();

    assert_eq!(
        stub.only_call().1,
        vec![
            s("/srv/a.docx"),
            Value::Nil,
            s("/srv/b.docx"),
            Value::Nil,
            s("/srv/diff.odt"),
            s("pdf"),
        ]
    );
}

#[tokio::test]
async fn compare_bytes_is_inline_and_keeps_file_type_absent() {
    let stub = StubTransport::echo();
    let out = client(&stub)
        .compare(b"left", b"right", &local())
        .await
        .unwrap();
    assert_eq!(out, b"left|right");
    assert_eq!(stub.only_call().1[5], Value::Nil);
}

#[tokio::test]
async fn compare_file_missing_new_document_fails_before_calling() {
    let dir = tempfile::tempdir().unwrap();
    let old = dir.path().join("v1.odt");
    std::fs::write(&old, b"one").unwrap();

    let stub = StubTransport::echo();
    let err = client(&stub)
        .compare_file(&old, dir.path().join("v2.odt"), dir.path().join("d.pdf"), &remote())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("v2.odt"));
    assert!(stub.calls().is_empty());
    assert!(!dir.path().join("d.pdf").exists());
}

// ── info ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn info_is_stable_and_sorted() {
    let stub = StubTransport::new(|method, params| {
        assert_eq!(method, "info");
        assert!(params.is_empty());
        Ok(sample_info())
    });
    let c = client(&stub);

    let first: ServiceInfo = c.info().await.unwrap();
    let second = c.info().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.unoserver, "3.2");

    let text = first.to_string();
    let keys: Vec<String> = text
        .lines()
        .filter(|l| l.starts_with("    "))
        .map(|l| l.split(':').next().unwrap().trim().to_string())
        .collect();
    let (imports, exports) = keys.split_at(3);
    assert!(imports.windows(2).all(|w| w[0] < w[1]), "{imports:?}");
    assert!(exports.windows(2).all(|w| w[0] < w[1]), "{exports:?}");
}

#[tokio::test]
async fn info_propagates_transport_error() {
    let stub = StubTransport::new(|_, _| {
        Err(UnoError::Connection {
            endpoint: "http://localhost:2003".into(),
            reason: "connection refused".into(),
        })
    });
    let err = client(&stub).info().await.unwrap_err();
    assert!(err.to_string().contains("connection refused"));
}

// ── deadline & cancellation ──────────────────────────────────────────────────

#[tokio::test]
async fn timeout_fails_call_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.pdf");
    std::fs::write(&input, b"slow").unwrap();

    let stub = StubTransport::slow(Duration::from_secs(30));
    let c = client(&stub).with_timeout(Duration::from_millis(50));

    let err = c.convert_file(&input, &output, &remote()).await.unwrap_err();
    assert!(matches!(err, UnoError::Timeout { .. }), "got {err:?}");
    assert!(err.is_transport());
    assert!(!output.exists());
}

#[tokio::test]
async fn cancellation_aborts_in_flight_call() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.pdf");
    std::fs::write(&input, b"slow").unwrap();

    let token = CancellationToken::new();
    let stub = StubTransport::slow(Duration::from_secs(30));
    let c = client(&stub).with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let err = c.convert_file(&input, &output, &remote()).await.unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, UnoError::Cancelled { .. }), "got {err:?}");
    assert!(!output.exists());
}

#[tokio::test]
async fn already_cancelled_token_fails_immediately() {
    let token = CancellationToken::new();
    token.cancel();
    let stub = StubTransport::slow(Duration::from_secs(30));
    let err = client(&stub)
        .with_cancellation(token)
        .info()
        .await
        .unwrap_err();
    assert!(matches!(err, UnoError::Cancelled { .. }));
}

// ── construction ─────────────────────────────────────────────────────────────

#[test]
fn connect_rejects_empty_endpoint() {
    assert!(matches!(
        UnoClient::connect(""),
        Err(UnoError::InvalidConfig(_))
    ));
}
