//! Line scanner for the streamed job protocol of the image services.
//!
//! The services stream progress text and finish with either
//! `[true] <https url>` (the result is ready at that URL) or `[false]`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ServiceError;

static READY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[true\]\s*(https?://\S+)").expect("valid ready pattern"));

const FAILED_MARKER: &str = "[false]";

/// Terminal signal of a streamed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    Ready(String),
    Failed,
}

impl StreamSignal {
    pub fn into_url(self) -> Result<String, ServiceError> {
        match self {
            Self::Ready(url) => Ok(url),
            Self::Failed => Err(ServiceError::StreamFailed),
        }
    }
}

/// Accumulates stream chunks and inspects complete lines only, so a URL
/// split across chunks is never read half-received.
#[derive(Debug, Default)]
pub struct SignalScanner {
    pending: Vec<u8>,
}

impl SignalScanner {
    /// Feed one chunk. Returns the first signal found in a completed line.
    pub fn push(&mut self, chunk: &[u8]) -> Option<StreamSignal> {
        self.pending.extend_from_slice(chunk);

        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            if let Some(signal) = scan_line(&String::from_utf8_lossy(&line)) {
                return Some(signal);
            }
        }
        None
    }

    /// End of stream: inspect whatever is left without a trailing newline.
    pub fn finish(mut self) -> Option<StreamSignal> {
        let rest = std::mem::take(&mut self.pending);
        scan_line(&String::from_utf8_lossy(&rest))
    }
}

fn scan_line(line: &str) -> Option<StreamSignal> {
    if let Some(caps) = READY_PATTERN.captures(line) {
        return Some(StreamSignal::Ready(caps[1].to_string()));
    }
    line.contains(FAILED_MARKER).then_some(StreamSignal::Failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_signal() {
        let mut scanner = SignalScanner::default();
        assert_eq!(scanner.push(b"progress 10%\n"), None);
        assert_eq!(
            scanner.push(b"[true] https://cdn.example/job/1\n"),
            Some(StreamSignal::Ready("https://cdn.example/job/1".into()))
        );
    }

    #[test]
    fn test_url_split_across_chunks() {
        let mut scanner = SignalScanner::default();
        assert_eq!(scanner.push(b"[true] https://cdn.exa"), None);
        assert_eq!(
            scanner.push(b"mple/job/2\n"),
            Some(StreamSignal::Ready("https://cdn.example/job/2".into()))
        );
    }

    #[test]
    fn test_failed_signal() {
        let mut scanner = SignalScanner::default();
        assert_eq!(scanner.push(b"[false] quota\n"), Some(StreamSignal::Failed));
        assert!(StreamSignal::Failed.into_url().is_err());
    }

    #[test]
    fn test_signal_without_trailing_newline() {
        let mut scanner = SignalScanner::default();
        assert_eq!(scanner.push(b"working...\n[true] https://x/y"), None);
        assert_eq!(scanner.finish(), Some(StreamSignal::Ready("https://x/y".into())));
    }

    #[test]
    fn test_no_signal() {
        let mut scanner = SignalScanner::default();
        scanner.push(b"just text\n");
        assert_eq!(scanner.finish(), None);
    }
}
