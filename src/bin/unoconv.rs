//! CLI binary for unoclient.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ClientConfig` / `ConvertOptions`, handles the `-` stdin/stdout
//! convention and prints results.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::EnvFilter;
use unoclient::config::{DEFAULT_HOST, DEFAULT_PORT};
use unoclient::{
    split_filter_options, CancellationToken, ClientConfig, ConvertOptions, Endpoint, Location,
    Protocol, UnoClient,
};

/// Path value meaning stdin (for inputs) or stdout (for the output).
const STDIO: &str = "-";

/// Exit status after Ctrl-C (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Show server version and filters
  unoconv info

  # Convert, output type taken from the extension
  unoconv convert report.docx report.pdf

  # Convert stdin to stdout (needs --convert-to)
  cat report.docx | unoconv convert --convert-to pdf - - > report.pdf

  # Export filter with options
  unoconv convert --filter writer_pdf_Export --filter-options PageRange=1-2,Quality=90 a.odt a.pdf

  # Compare two revisions on a remote server
  unoconv --host docs.internal --location remote compare v1.docx v2.docx diff.pdf

HOST LOCATION:
  local   files are sent as paths; unoserver must see the same filesystem
  remote  files are sent as binary data; this process reads and writes them
  auto    local if --host is exactly 127.0.0.1 or localhost, else remote

ENVIRONMENT VARIABLES:
  UNOSERVER_HOST     Default for --host
  UNOSERVER_PORT     Default for --port
  UNOSERVER_TIMEOUT  Default for --timeout
  RUST_LOG           Override the log filter (e.g. unoclient=trace)
"#;

/// Convert and compare documents with a unoserver instance.
#[derive(Parser, Debug)]
#[command(
    name = "unoconv",
    version,
    about = "Convert and compare documents with a unoserver instance",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// The host the server runs on.
    #[arg(long, global = true, env = "UNOSERVER_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// The port used by the server.
    #[arg(long, global = true, env = "UNOSERVER_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// The protocol used by the server.
    #[arg(long, global = true, value_enum, default_value = "http")]
    protocol: ProtocolArg,

    /// How files are handed to the server: auto, local or remote.
    #[arg(
        long,
        visible_alias = "host-location",
        global = true,
        value_enum,
        default_value = "auto"
    )]
    location: LocationArg,

    /// Give up on the server after this many seconds.
    #[arg(long, global = true, env = "UNOSERVER_TIMEOUT")]
    timeout: Option<u64>,

    /// Print the debug log.
    #[arg(long, global = true)]
    debug: bool,

    /// Do not print information messages.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print unoserver information.
    Info {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Convert document <INFILE> to <OUTFILE>.
    Convert {
        /// Input document, or - for stdin.
        infile: String,

        /// Output document, or - for stdout.
        outfile: String,

        /// The file type/extension of the output file (ex: pdf).
        #[arg(long)]
        convert_to: Option<String>,

        /// The LibreOffice input filter to use (ex: writer8).
        #[arg(long)]
        input_filter: Option<String>,

        /// The export filter to use when converting.
        #[arg(long, visible_alias = "filter")]
        output_filter: Option<String>,

        /// Options for the export filter, in name[=value] format.
        /// Comma separated list for multiple options; may be repeated.
        #[arg(long, visible_alias = "filter-option")]
        filter_options: Vec<String>,

        /// Update the indexes before conversion. Can be time consuming.
        #[arg(long)]
        update_index: bool,
    },

    /// Compare documents <OLDFILE> and <NEWFILE>, writing <OUTFILE>.
    Compare {
        /// Original document, or - for stdin.
        oldfile: String,

        /// Modified document, or - for stdin.
        newfile: String,

        /// Comparison result, or - for stdout.
        outfile: String,

        /// The file type/extension of the result file (ex: pdf).
        #[arg(long)]
        file_type: Option<String>,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ProtocolArg {
    Http,
    Https,
}

impl From<ProtocolArg> for Protocol {
    fn from(v: ProtocolArg) -> Self {
        match v {
            ProtocolArg::Http => Protocol::Http,
            ProtocolArg::Https => Protocol::Https,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LocationArg {
    Auto,
    Local,
    Remote,
}

impl From<LocationArg> for Location {
    fn from(v: LocationArg) -> Self {
        match v {
            LocationArg::Auto => Location::Auto,
            LocationArg::Local => Location::Local,
            LocationArg::Remote => Location::Remote,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Logs go to stderr so `-` output on stdout stays a clean document.
    let filter = if cli.debug {
        "debug,unoclient=trace"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build client ─────────────────────────────────────────────────────
    let endpoint = Endpoint {
        protocol: cli.protocol.into(),
        host: cli.host.clone(),
        port: cli.port,
    };
    let config = ClientConfig::builder()
        .endpoint(endpoint.to_string())
        .timeout_secs(cli.timeout)
        .build()
        .context("Invalid configuration")?;

    // Ctrl-C cancels the in-flight call and abandons any stdin read or
    // output write; the process then exits with the conventional 130.
    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let client = UnoClient::new(&config)
        .context("Failed to create client")?
        .with_cancellation(cancel.clone());

    let local = Location::from(cli.location).resolve(&cli.host);
    tracing::debug!("endpoint {} ({} files)", endpoint, if local { "local" } else { "remote" });

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = run(&cli, &client, local) => Some(result),
    };
    match outcome {
        Some(result) => result,
        None => {
            eprintln!("Interrupted.");
            std::process::exit(EXIT_INTERRUPTED);
        }
    }
}

async fn run(cli: &Cli, client: &UnoClient, local: bool) -> Result<()> {
    match &cli.command {
        Command::Info { json } => {
            let info = client.info().await.context("info failed")?;
            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&info).context("Failed to serialize info")?
                );
            } else {
                print!("{info}");
            }
        }

        Command::Convert {
            infile,
            outfile,
            convert_to,
            input_filter,
            output_filter,
            filter_options,
            update_index,
        } => {
            let opts = ConvertOptions::builder()
                .local(local)
                .convert_to(convert_to.clone().unwrap_or_default())
                .in_filter_name(input_filter.clone().unwrap_or_default())
                .filter_name(output_filter.clone().unwrap_or_default())
                .filter_options(filter_options.iter().flat_map(|s| split_filter_options(s)))
                .update_index(*update_index)
                .build();

            if outfile == STDIO && opts.convert_to.is_none() {
                bail!("Missing --convert-to option: it is required when writing to stdout");
            }

            let status = Status::start(cli.quiet, format!("Convert {infile} --> {outfile}"));
            if infile == STDIO || outfile == STDIO {
                let input = read_source(infile).await?;
                let output = client
                    .convert(&input, &opts)
                    .await
                    .context("Conversion failed")?;
                write_sink(outfile, output).await?;
            } else {
                client
                    .convert_file(infile, outfile, &opts)
                    .await
                    .context("Conversion failed")?;
            }
            status.finish();
        }

        Command::Compare {
            oldfile,
            newfile,
            outfile,
            file_type,
        } => {
            let opts = ConvertOptions::builder()
                .local(local)
                .file_type(file_type.clone().unwrap_or_default())
                .build();

            if oldfile == STDIO && newfile == STDIO {
                bail!("Only one of <OLDFILE> and <NEWFILE> can be read from stdin");
            }

            let status = Status::start(
                cli.quiet,
                format!("Compare '{oldfile}' '{newfile}' --> {outfile}"),
            );
            if oldfile == STDIO || newfile == STDIO || outfile == STDIO {
                let old = read_source(oldfile).await?;
                let new = read_source(newfile).await?;
                let output = client
                    .compare(&old, &new, &opts)
                    .await
                    .context("Comparison failed")?;
                write_sink(outfile, output).await?;
            } else {
                client
                    .compare_file(oldfile, newfile, outfile, &opts)
                    .await
                    .context("Comparison failed")?;
            }
            status.finish();
        }
    }

    Ok(())
}

/// Read a whole input document, `-` meaning stdin.
async fn read_source(name: &str) -> Result<Vec<u8>> {
    if name == STDIO {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    Ok(unoclient::output::read_input(Path::new(name)).await?)
}

/// Write a whole output document, `-` meaning stdout.
async fn write_sink(name: &str, data: Vec<u8>) -> Result<()> {
    if name == STDIO {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(&data)
            .await
            .context("Failed to write to stdout")?;
        stdout.flush().await.context("Failed to write to stdout")?;
        return Ok(());
    }
    Ok(unoclient::output::write_output(Path::new(name), data).await?)
}

/// "Convert a --> b ... OK." line on stderr, with a spinner while waiting.
struct Status {
    bar: Option<ProgressBar>,
    message: String,
}

impl Status {
    fn start(quiet: bool, message: String) -> Self {
        if quiet {
            return Self { bar: None, message };
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(format!("{message} ..."));
        bar.enable_steady_tick(Duration::from_millis(80));

        Self {
            bar: Some(bar),
            message,
        }
    }

    fn finish(mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
            eprintln!("{} ... OK.", self.message);
        }
    }
}

impl Drop for Status {
    fn drop(&mut self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
