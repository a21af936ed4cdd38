//! Sprays candidate words at a target and classifies every response against
//! a reference baseline fetched for a random, non-existent candidate.

use crate::transport::{failure_reason, Transport};
use anyhow::{anyhow, Result};
use baseline::{Baseline, Collector, Comparator, RawResponse, Response, Verdict};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use spray_core::{CollectGate, SprayMod};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub base_url: String,
    pub mode: SprayMod,
    pub concurrency: usize,
    pub collect_concurrency: usize,
    pub max_body: usize,
    pub black_status: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Finding,
    Fuzzy,
    Dropped,
    Failed,
}

/// A baseline together with what the scan decided about it.
#[derive(Debug, Clone)]
pub enum Classified {
    Finding(Baseline),
    Fuzzy(Baseline),
    Dropped(Baseline),
}

impl Classified {
    pub fn outcome(&self) -> Outcome {
        match self {
            Classified::Finding(_) => Outcome::Finding,
            Classified::Fuzzy(_) => Outcome::Fuzzy,
            Classified::Dropped(bl) if bl.error.is_some() => Outcome::Failed,
            Classified::Dropped(_) => Outcome::Dropped,
        }
    }

    pub fn baseline(&self) -> &Baseline {
        match self {
            Classified::Finding(bl) | Classified::Fuzzy(bl) | Classified::Dropped(bl) => bl,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSummary {
    pub sent: usize,
    pub findings: usize,
    pub fuzzy: usize,
    pub dropped: usize,
    pub failed: usize,
}

impl ProbeSummary {
    pub fn record(&mut self, o: Outcome) {
        self.sent += 1;
        match o {
            Outcome::Finding => self.findings += 1,
            Outcome::Fuzzy => self.fuzzy += 1,
            Outcome::Dropped => self.dropped += 1,
            Outcome::Failed => self.failed += 1,
        }
    }
}

/// Target for one word as (url, host). Host mode keeps the url fixed and
/// sprays `<word>.<target host>` into the Host header.
pub fn candidate(base_url: &str, mode: SprayMod, word: &str) -> (String, String) {
    let base = base_url.trim_end_matches('/');
    match mode {
        SprayMod::Host => {
            let authority = base.split_once("://").map(|(_, rest)| rest).unwrap_or(base);
            let host = authority.split(['/', ':']).next().unwrap_or_default();
            (format!("{}/", base), format!("{}.{}", word, host))
        }
        _ => (format!("{}/{}", base, word.trim_start_matches('/')), String::new()),
    }
}

/// Cheap gate ahead of `collect`: blocked statuses and oversized bodies
/// become invalid baselines and are never hashed. A declared length over
/// the limit counts even when the transport skipped the body.
pub fn admit<R: Response>(url: &str, host: &str, resp: &R, black_status: &[u16], max_body: usize) -> Baseline {
    if max_body > 0 && resp.body().len().max(resp.content_length()) > max_body {
        Baseline::invalid(url, host, resp, "body-too-large")
    } else if black_status.contains(&resp.status_code()) {
        Baseline::invalid(url, host, resp, "bad-status")
    } else {
        Baseline::new(url, host, resp)
    }
}

/// Classifies a collected candidate against the reference.
pub fn classify(reference: &Baseline, mut bl: Baseline, cmp: &Comparator) -> Classified {
    if !bl.is_valid {
        return Classified::Dropped(bl);
    }
    match cmp.compare(reference, &bl) {
        Verdict::Identical => Classified::Dropped(bl),
        Verdict::Ambiguous if cmp.fuzzy_compare(reference, &bl) => {
            bl.is_fuzzy = true;
            Classified::Fuzzy(bl)
        }
        Verdict::Ambiguous | Verdict::Different => Classified::Finding(bl),
    }
}

fn random_word() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

async fn fetch(transport: &Transport, url: &str, host: &str) -> (Result<RawResponse, reqwest::Error>, u64) {
    let start = Instant::now();
    let host_opt = if host.is_empty() { None } else { Some(host) };
    let r = transport.fetch(url, host_opt).await;
    (r, start.elapsed().as_millis() as u64)
}

/// Runs the scan; classified baselines are sent on `tx` as they complete.
pub async fn run(
    opts: ProbeOptions,
    words: Vec<String>,
    transport: Transport,
    comparator: Comparator,
    collector: Arc<Collector>,
    tx: mpsc::UnboundedSender<Classified>,
) -> Result<ProbeSummary> {
    let (ref_url, ref_host) = candidate(&opts.base_url, opts.mode, &random_word());
    let (resp, spent) = fetch(&transport, &ref_url, &ref_host).await;
    let resp = resp.map_err(|e| anyhow!("reference request to {} failed: {}", ref_url, e))?;
    let mut reference = Baseline::new(&ref_url, &ref_host, &resp).with_spent(spent);
    reference.collect_with(&collector);
    info!(url = %reference.url, status = reference.status, length = reference.body_length, "reference baseline");
    // published read-only to every worker
    let reference = Arc::new(reference);

    let sem = Arc::new(Semaphore::new(opts.concurrency.max(1)));
    let gate = CollectGate::new(opts.collect_concurrency);
    let mut handles = Vec::with_capacity(words.len());
    for w in words {
        let permit = sem.clone().acquire_owned().await?;
        let (url, host) = candidate(&opts.base_url, opts.mode, &w);
        let transport = transport.clone();
        let reference = reference.clone();
        let collector = collector.clone();
        let gate = gate.clone();
        let opts = opts.clone();
        let tx = tx.clone();
        handles.push(tokio::spawn(async move {
            let (resp, spent) = fetch(&transport, &url, &host).await;
            drop(permit);
            let mut bl = match resp {
                Ok(r) => admit(&url, &host, &r, &opts.black_status, opts.max_body),
                Err(e) => Baseline::failed(&url, &host, failure_reason(&e), e.to_string()),
            }
            .with_spent(spent);
            if bl.is_valid {
                // hashing is CPU bound; keep it off the I/O workers
                let _slot = gate.acquire().await;
                bl = tokio::task::spawn_blocking(move || {
                    bl.collect_with(&collector);
                    bl
                })
                .await?;
            }
            let class = classify(&reference, bl, &comparator);
            let outcome = class.outcome();
            debug!(url = %url, outcome = ?outcome, "classified");
            let _ = tx.send(class);
            Ok::<_, anyhow::Error>(outcome)
        }));
    }

    let mut summary = ProbeSummary::default();
    for h in handles {
        summary.record(h.await??);
    }
    info!(
        sent = summary.sent,
        findings = summary.findings,
        fuzzy = summary.fuzzy,
        failed = summary.failed,
        "probe finished"
    );
    Ok(summary)
}
