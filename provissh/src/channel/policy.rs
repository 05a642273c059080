//! Completion policies for unframed responses.
//!
//! The remote never sends an end-of-response marker, so deciding that a
//! command has finished is a heuristic. Each heuristic is a
//! [`CompletionPolicy`]; the executor composes them with [`FirstOf`] so a
//! device with different quirks only needs a different policy, not a
//! different executor.

use regex::bytes::Regex;
use serde::Serialize;

/// Why a collection loop declared the response complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// A prompt-like marker appeared in the transcript tail.
    Prompt,

    /// The channel stayed silent for the configured idle window.
    Idle,

    /// The cycle budget ran out before any other signal fired.
    CycleBudget,
}

impl std::fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prompt => write!(f, "prompt"),
            Self::Idle => write!(f, "idle"),
            Self::CycleBudget => write!(f, "cycle_budget"),
        }
    }
}

/// Decides, once per read cycle, whether the accumulated transcript
/// constitutes a complete response.
pub trait CompletionPolicy: Send {
    /// Inspect the transcript and the current run of silent cycles.
    fn check(&mut self, transcript: &[u8], idle_cycles: u32) -> Option<CompletionReason>;
}

/// Complete once the channel has been silent for `threshold` consecutive
/// read cycles. The universal backstop: works on any device, at the cost
/// of the idle window in latency.
#[derive(Debug, Clone, Copy)]
pub struct IdleWindow {
    threshold: u32,
}

impl IdleWindow {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }
}

impl CompletionPolicy for IdleWindow {
    fn check(&mut self, _transcript: &[u8], idle_cycles: u32) -> Option<CompletionReason> {
        (idle_cycles >= self.threshold).then_some(CompletionReason::Idle)
    }
}

/// Number of bytes from the end of the transcript searched for markers.
///
/// Prompts only ever appear at the tail; bounding the scan keeps the
/// check O(1) in output size even for multi-megabyte responses.
const MARKER_SEARCH_DEPTH: usize = 512;

/// Vendor token accepted in a prompt line alongside the device address.
const VENDOR_TOKEN: &str = "crestron";

/// Complete as soon as a prompt-like line is visible: a line containing
/// `>` together with either the device's own address or the vendor token
/// (case-insensitive).
///
/// This is a heuristic, not an identity check — a renamed device may omit
/// its address from the prompt, in which case only the vendor token or
/// the idle backstop fires.
#[derive(Debug, Clone)]
pub struct PromptMarker {
    host_lower: String,
    search_depth: usize,
}

impl PromptMarker {
    /// Marker for the device at `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host_lower: host.into().to_ascii_lowercase(),
            search_depth: MARKER_SEARCH_DEPTH,
        }
    }
}

impl CompletionPolicy for PromptMarker {
    fn check(&mut self, transcript: &[u8], _idle_cycles: u32) -> Option<CompletionReason> {
        let start = transcript.len().saturating_sub(self.search_depth);
        let tail = String::from_utf8_lossy(&transcript[start..]);

        for line in tail.lines() {
            if !line.contains('>') {
                continue;
            }
            let lower = line.to_ascii_lowercase();
            if lower.contains(&self.host_lower) || lower.contains(VENDOR_TOKEN) {
                return Some(CompletionReason::Prompt);
            }
        }
        None
    }
}

/// Complete when a caller-supplied pattern matches the transcript tail.
///
/// For devices with a stable, known prompt this replaces the
/// address/vendor heuristic outright.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    pattern: Regex,
    search_depth: usize,
}

impl PatternMatch {
    pub fn new(pattern: Regex) -> Self {
        Self {
            pattern,
            search_depth: MARKER_SEARCH_DEPTH,
        }
    }
}

impl CompletionPolicy for PatternMatch {
    fn check(&mut self, transcript: &[u8], _idle_cycles: u32) -> Option<CompletionReason> {
        let start = transcript.len().saturating_sub(self.search_depth);
        self.pattern
            .is_match(&transcript[start..])
            .then_some(CompletionReason::Prompt)
    }
}

/// Composite: complete on whichever member policy fires first, in order.
pub struct FirstOf {
    policies: Vec<Box<dyn CompletionPolicy>>,
}

impl FirstOf {
    pub fn new(policies: Vec<Box<dyn CompletionPolicy>>) -> Self {
        Self { policies }
    }
}

impl CompletionPolicy for FirstOf {
    fn check(&mut self, transcript: &[u8], idle_cycles: u32) -> Option<CompletionReason> {
        self.policies
            .iter_mut()
            .find_map(|p| p.check(transcript, idle_cycles))
    }
}
