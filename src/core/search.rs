//! Concurrent signing-key search.
//!
//! Streams candidate secrets from a source (a single explicit key or a
//! newline-delimited wordlist of unbounded size) and checks each one
//! against a token's existing signature. Workers pull candidates from a
//! shared cursor, so every candidate is attempted exactly once and the
//! wordlist is never materialized in memory. The first match cancels
//! the rest cooperatively.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::core::codec::DecodedToken;
use crate::core::keys::KeyMaterial;
use crate::core::signer::{self, Algorithm};
use crate::error::JwtProbeError;

/// How a search run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// A candidate validated the signature.
    Found,
    /// Every candidate was attempted; none matched.
    Exhausted,
    /// The timeout elapsed before the candidates ran out.
    Cancelled,
}

/// The outcome of a key search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub status: SearchStatus,
    /// The matching candidate, present iff `status == Found`.
    pub matched_key: Option<String>,
    /// How many candidates were actually attempted.
    pub attempts: u64,
}

/// Where candidate keys come from. Exactly one source per search:
/// a single explicit key is the degenerate one-element case of the
/// same streaming path, not a separate implementation.
#[derive(Debug, Clone)]
pub enum CandidateSource {
    /// One explicit candidate key.
    Single(String),
    /// A newline-delimited wordlist file, one candidate per line.
    /// Lines are used verbatim apart from trailing newline removal;
    /// empty lines are legitimate candidates (the empty secret).
    Wordlist(PathBuf),
}

impl CandidateSource {
    /// Open the source as a forward-only lazy iterator of candidates.
    fn open(&self) -> Result<Box<dyn Iterator<Item = io::Result<String>> + Send>, JwtProbeError> {
        match self {
            CandidateSource::Single(key) => Ok(Box::new(std::iter::once(Ok(key.clone())))),
            CandidateSource::Wordlist(path) => {
                let file = File::open(path).map_err(|e| JwtProbeError::CandidateSourceError {
                    origin: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                Ok(Box::new(BufReader::new(file).lines()))
            }
        }
    }

    /// Description used in error messages.
    fn describe(&self) -> String {
        match self {
            CandidateSource::Single(_) => "single key".to_string(),
            CandidateSource::Wordlist(path) => path.display().to_string(),
        }
    }
}

/// Search the candidate source for a key validating the token's signature.
///
/// Spawns `concurrency` workers (minimum 1) that pull candidates from a
/// shared cursor and call `verify` independently. The first worker to
/// find a match signals cancellation; in-flight verifications finish
/// but their results are discarded. Candidate order across workers is
/// not file order, but `Exhausted` is only reported once every
/// candidate was attempted.
///
/// # Errors
///
/// `KeyShapeMismatch` up front when `alg` is not an HMAC-family
/// algorithm (candidates are secret bytes, nothing else can match), and
/// `CandidateSourceError` when the wordlist fails mid-stream, which is
/// fatal to the run rather than a false `Exhausted`.
pub fn search(
    decoded: &DecodedToken,
    alg: Algorithm,
    source: &CandidateSource,
    concurrency: usize,
    timeout: Duration,
) -> Result<SearchResult, JwtProbeError> {
    if !alg.is_symmetric() {
        return Err(JwtProbeError::KeyShapeMismatch {
            algorithm: alg.name().to_string(),
            expected: "a symmetric secret".to_string(),
            supplied: "a key search over secret candidates".to_string(),
        });
    }

    let cursor = Mutex::new(source.open()?);
    let stop = AtomicBool::new(false);
    let timed_out = AtomicBool::new(false);
    let attempts = AtomicU64::new(0);
    let found: Mutex<Option<String>> = Mutex::new(None);
    let stream_error: Mutex<Option<io::Error>> = Mutex::new(None);

    // None when the timeout is effectively unbounded
    let deadline = Instant::now().checked_add(timeout);
    let workers = concurrency.max(1);

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                run_worker(
                    decoded,
                    alg,
                    &cursor,
                    &stop,
                    &timed_out,
                    &attempts,
                    &found,
                    &stream_error,
                    deadline,
                );
            });
        }
    });

    if let Some(e) = stream_error.into_inner().unwrap_or(None) {
        return Err(JwtProbeError::CandidateSourceError {
            origin: source.describe(),
            reason: e.to_string(),
        });
    }

    let matched_key = found.into_inner().unwrap_or(None);
    let attempts = attempts.load(Ordering::Relaxed);
    let status = if matched_key.is_some() {
        SearchStatus::Found
    } else if timed_out.load(Ordering::Relaxed) {
        SearchStatus::Cancelled
    } else {
        SearchStatus::Exhausted
    };

    Ok(SearchResult {
        status,
        matched_key,
        attempts,
    })
}

/// One worker: pull, verify, repeat until stopped or out of candidates.
#[allow(clippy::too_many_arguments)]
fn run_worker(
    decoded: &DecodedToken,
    alg: Algorithm,
    cursor: &Mutex<Box<dyn Iterator<Item = io::Result<String>> + Send>>,
    stop: &AtomicBool,
    timed_out: &AtomicBool,
    attempts: &AtomicU64,
    found: &Mutex<Option<String>>,
    stream_error: &Mutex<Option<io::Error>>,
    deadline: Option<Instant>,
) {
    loop {
        // Cooperative cancellation, checked between candidates
        if stop.load(Ordering::Relaxed) {
            return;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            timed_out.store(true, Ordering::Relaxed);
            stop.store(true, Ordering::Relaxed);
            return;
        }

        // Hold the cursor lock only while pulling, never across a verify
        let next = match cursor.lock() {
            Ok(mut iter) => iter.next(),
            Err(_) => return,
        };

        match next {
            None => return,
            Some(Err(e)) => {
                if let Ok(mut slot) = stream_error.lock() {
                    slot.get_or_insert(e);
                }
                stop.store(true, Ordering::Relaxed);
                return;
            }
            Some(Ok(candidate)) => {
                attempts.fetch_add(1, Ordering::Relaxed);
                let key = KeyMaterial::Symmetric(candidate.as_bytes().to_vec());
                if matches!(signer::verify(decoded, alg, &key), Ok(true)) {
                    if let Ok(mut slot) = found.lock() {
                        // First match wins; later matches are discarded
                        slot.get_or_insert(candidate);
                    }
                    stop.store(true, Ordering::Relaxed);
                    return;
                }
            }
        }
    }
}
