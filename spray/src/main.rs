use anyhow::{Context, Result};
use baseline::{Baseline, Collector, Comparator, HashScope, RawResponse, DEFAULT_DISTANCE, PROBE_KEYS};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
#[cfg(feature = "probe")]
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
#[cfg(feature = "probe")]
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
#[cfg(feature = "probe")]
mod probe;
#[cfg(feature = "probe")]
mod transport;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat { Text, Json, Jsonl, Csv }

impl OutputFormat {
    fn from_name(s: &str) -> Self {
        match s { "json" => OutputFormat::Json, "jsonl" => OutputFormat::Jsonl, "csv" => OutputFormat::Csv, _ => OutputFormat::Text }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ScopeArg { Raw, Body }

impl From<ScopeArg> for HashScope {
    fn from(s: ScopeArg) -> Self {
        match s { ScopeArg::Raw => HashScope::Raw, ScopeArg::Body => HashScope::Body }
    }
}

#[derive(Debug, Parser)]
#[command(name = "spray", version, about = "Response baselining and soft-404 aware content discovery")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./spray.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Collect and print signals for raw HTTP responses saved to files
    Inspect {
        files: Vec<PathBuf>,
        /// URL the responses were fetched from (defaults to the file path)
        #[arg(long)]
        url: Option<String>,
        /// Extra fields to print, comma separated (e.g. title,md5,simhash)
        #[arg(long, value_delimiter = ',')]
        probes: Vec<String>,
        #[arg(long, value_enum)]
        scope: Option<ScopeArg>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Compare a candidate response file against a reference response file
    Compare {
        base: PathBuf,
        candidate: PathBuf,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        url: Option<String>,
        /// Fuzzy distance threshold
        #[arg(long)]
        distance: Option<u32>,
        #[arg(long, value_enum)]
        scope: Option<ScopeArg>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Spray words at a target and report responses that differ from its default page
    #[cfg(feature = "probe")]
    Probe {
        /// Base URL, e.g. https://example.com/
        url: String,
        /// Candidate word (repeatable)
        #[arg(long)]
        word: Vec<String>,
        /// File with newline-delimited words (comments with # and blanks ignored)
        #[arg(long, value_name = "FILE")]
        wordlist: Option<PathBuf>,
        /// path or host
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long)]
        concurrency: Option<usize>,
        /// Max concurrent signal collections
        #[arg(long)]
        collect_concurrency: Option<usize>,
        /// Status codes dropped before collection, comma separated
        #[arg(long, value_delimiter = ',')]
        black_status: Vec<u16>,
        /// Bodies larger than this many bytes are not collected (0 = no limit)
        #[arg(long)]
        max_body: Option<usize>,
        #[arg(long)]
        distance: Option<u32>,
        #[arg(long, value_enum)]
        scope: Option<ScopeArg>,
        /// Also print fuzzy duplicates
        #[arg(long)]
        fuzzy: bool,
        #[arg(long, value_delimiter = ',')]
        probes: Vec<String>,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

/// Writes baselines to stdout in the selected format.
struct Printer {
    format: OutputFormat,
    probes: Vec<String>,
    csv: Option<csv::Writer<std::io::Stdout>>,
    json: Vec<String>,
}

impl Printer {
    fn new(format: OutputFormat, probes: Vec<String>) -> Result<Self> {
        for p in &probes {
            if !PROBE_KEYS.contains(&p.as_str()) {
                tracing::warn!(probe = %p, "unknown probe key, it will print empty");
            }
        }
        let csv = match format {
            OutputFormat::Csv => {
                let mut w = csv::Writer::from_writer(std::io::stdout());
                let mut header = vec!["url", "host", "status", "length"];
                header.extend(probes.iter().map(|s| s.as_str()));
                w.write_record(&header)?;
                Some(w)
            }
            _ => None,
        };
        Ok(Printer { format, probes, csv, json: Vec::new() })
    }

    fn print(&mut self, bl: &Baseline) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                let probes: Vec<&str> = self.probes.iter().map(|s| s.as_str()).collect();
                println!("{}", bl.format(&probes));
            }
            OutputFormat::Jsonl => println!("{}", bl.jsonify()),
            OutputFormat::Json => self.json.push(bl.jsonify()),
            OutputFormat::Csv => {
                if let Some(w) = self.csv.as_mut() {
                    let mut row = vec![bl.url.clone(), bl.host.clone(), bl.status.to_string(), bl.body_length.to_string()];
                    row.extend(self.probes.iter().map(|p| bl.get(p)));
                    w.write_record(&row)?;
                }
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        if let Some(mut w) = self.csv.take() {
            w.flush()?;
        }
        if self.format == OutputFormat::Json {
            println!("[{}]", self.json.join(","));
        }
        Ok(())
    }
}

fn read_baseline(path: &Path, url: Option<&str>, collector: &Collector) -> Result<Baseline> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let resp = RawResponse::parse(&bytes).with_context(|| format!("parsing {}", path.display()))?;
    let url = url.map(str::to_string).unwrap_or_else(|| path.display().to_string());
    let mut bl = Baseline::new(&url, "", &resp);
    bl.collect_with(collector);
    Ok(bl)
}

#[cfg(feature = "probe")]
fn read_words(words: Vec<String>, file: Option<&Path>) -> Result<Vec<String>> {
    let mut out = words;
    if let Some(path) = file {
        let fh = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
        for line in BufReader::new(fh).lines() {
            let line = line?;
            let w = line.trim();
            if w.is_empty() || w.starts_with('#') { continue; }
            out.push(w.to_string());
        }
    }
    Ok(out)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let loaded_cfg = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    match cli.command {
        Commands::Version => {
            println!("spray {} (core {})", env!("CARGO_PKG_VERSION"), spray_core::version());
        }
        Commands::Inspect { files, url, probes, scope, format } => {
            let scope = scope.map(HashScope::from).or(loaded_cfg.hash_scope()).unwrap_or_default();
            let collector = Collector::with_scope(scope);
            let mut printer = Printer::new(format, probes)?;
            for f in &files {
                let bl = read_baseline(f, url.as_deref(), &collector)?;
                printer.print(&bl)?;
            }
            printer.finish()?;
        }
        Commands::Compare { base, candidate, base_url, url, distance, scope, format } => {
            let scope = scope.map(HashScope::from).or(loaded_cfg.hash_scope()).unwrap_or_default();
            let collector = Collector::with_scope(scope);
            let cmp = Comparator::new(distance.or(loaded_cfg.distance()).unwrap_or(DEFAULT_DISTANCE));
            let base = read_baseline(&base, base_url.as_deref(), &collector)?;
            let cand = read_baseline(&candidate, url.as_deref(), &collector)?;
            let verdict = cmp.compare(&base, &cand);
            let fuzzy = cmp.fuzzy_compare(&base, &cand);
            let sig = |bl: &Baseline| bl.hashes().and_then(|h| h.signature());
            let dist = match (sig(&base), sig(&cand)) {
                (Some(a), Some(b)) => Some(a.distance(&b)),
                _ => None,
            };
            match format {
                OutputFormat::Text | OutputFormat::Csv => {
                    println!("{}", base);
                    println!("{}", cand);
                    let d = dist.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
                    println!("verdict: {:?}, fuzzy: {} (distance {} < {})", verdict, fuzzy, d, cmp.distance());
                }
                OutputFormat::Json | OutputFormat::Jsonl => {
                    let obj = serde_json::json!({
                        "base": base.url,
                        "candidate": cand.url,
                        "verdict": verdict,
                        "fuzzy": fuzzy,
                        "distance": dist,
                        "threshold": cmp.distance(),
                    });
                    println!("{}", serde_json::to_string(&obj)?);
                }
            }
        }
        #[cfg(feature = "probe")]
        Commands::Probe { url, word, wordlist, mut mode, mut timeout_ms, mut concurrency, mut collect_concurrency, mut black_status, mut max_body, distance, scope, fuzzy, mut probes, mut format } => {
            if let Some(p) = &loaded_cfg.probe {
                if mode.is_none() { mode = p.mode.clone(); }
                if timeout_ms.is_none() { timeout_ms = p.timeout_ms; }
                if concurrency.is_none() { concurrency = p.concurrency; }
                if collect_concurrency.is_none() { collect_concurrency = p.collect_concurrency; }
                if max_body.is_none() { max_body = p.max_body; }
                if black_status.is_empty() { black_status = p.black_status.clone().unwrap_or_default(); }
                if probes.is_empty() { probes = p.probes.clone().unwrap_or_default(); }
                if format.is_none() { format = p.format.as_deref().map(OutputFormat::from_name); }
            }
            let mode: spray_core::SprayMod = mode.as_deref().unwrap_or("path").parse()?;
            let words = read_words(word, wordlist.as_deref())?;
            if words.is_empty() {
                return Err(anyhow::anyhow!("no words given (use --word or --wordlist)"));
            }
            let user_agent = loaded_cfg.probe.as_ref().and_then(|p| p.user_agent.clone())
                .unwrap_or_else(|| format!("spray/{}", env!("CARGO_PKG_VERSION")));
            let transport = transport::Transport::new(&transport::TransportOptions {
                timeout_ms: timeout_ms.unwrap_or(5000),
                user_agent,
                client: mode.client_type(),
                max_body: max_body.unwrap_or(0),
            })?;
            let opts = probe::ProbeOptions {
                base_url: url,
                mode,
                concurrency: concurrency.unwrap_or(20),
                collect_concurrency: collect_concurrency.unwrap_or(4),
                max_body: max_body.unwrap_or(0),
                black_status,
            };
            let scope = scope.map(HashScope::from).or(loaded_cfg.hash_scope()).unwrap_or_default();
            let collector = Arc::new(Collector::with_scope(scope));
            let cmp = Comparator::new(distance.or(loaded_cfg.distance()).unwrap_or(DEFAULT_DISTANCE));
            let mut printer = Printer::new(format.unwrap_or(OutputFormat::Text), probes)?;

            let rt = tokio::runtime::Runtime::new()?;
            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<probe::Classified>();
            let summary = rt.block_on(async move {
                let scan = tokio::spawn(probe::run(opts, words, transport, cmp, collector, tx));
                while let Some(class) = rx.recv().await {
                    match class.outcome() {
                        probe::Outcome::Finding => printer.print(class.baseline())?,
                        probe::Outcome::Fuzzy if fuzzy => printer.print(class.baseline())?,
                        _ => {}
                    }
                }
                printer.finish()?;
                scan.await?
            })?;
            tracing::info!(?summary, "done");
        }
    }
    Ok(())
}
