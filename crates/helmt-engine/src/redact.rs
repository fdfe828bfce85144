//! Secret masking for logged command lines
//!
//! Every command line and every piece of captured stderr passes through a
//! [`Redactor`] before it is printed, logged or stored in an error. A secret
//! never survives redaction, whatever its position or number of occurrences.

use std::fmt;

/// Replacement for each secret occurrence
pub const MASK: &str = "*****";

/// Used when masking alone would still leave a secret visible
pub const WITHHELD: &str = "[command line withheld]";

/// Masks registered secret values in text
#[derive(Clone, Default)]
pub struct Redactor {
    /// Longest first, so a secret containing another is masked whole
    secrets: Vec<String>,
}

impl Redactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret, builder style
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.add(secret);
        self
    }

    /// Register a secret; empty strings are ignored
    pub fn add(&mut self, secret: impl Into<String>) {
        let secret = secret.into();
        if secret.is_empty() || self.secrets.contains(&secret) {
            return;
        }
        self.secrets.push(secret);
        self.secrets.sort_by(|a, b| b.len().cmp(&a.len()));
    }

    /// Register every secret known to `other`
    pub fn merge(&mut self, other: &Redactor) {
        for secret in &other.secrets {
            self.add(secret.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Mask every occurrence of every secret in a single line
    pub fn redact(&self, text: &str) -> String {
        self.redact_with(text, WITHHELD)
    }

    /// Mask every occurrence of every secret
    ///
    /// If a secret still shows after masking, `placeholder` is returned
    /// instead, or an empty string when the placeholder itself contains one.
    pub fn redact_with(&self, text: &str, placeholder: &str) -> String {
        let masked = self.mask(text);
        if !self.leaks(&masked) {
            masked
        } else if !self.leaks(placeholder) {
            placeholder.to_string()
        } else {
            String::new()
        }
    }

    /// Mask multi-line output, withholding only the lines that would still
    /// show a secret
    ///
    /// Line endings are preserved. Falls back to [`Redactor::redact_with`]
    /// on the whole text when that is not enough, e.g. for a secret that
    /// spans lines.
    pub fn redact_lines(&self, text: &str, placeholder: &str) -> String {
        let masked = self.mask(text);
        if !self.leaks(&masked) {
            return masked;
        }

        let mut out = String::with_capacity(masked.len());
        for line in masked.split_inclusive('\n') {
            let (body, end) = match line.strip_suffix('\n') {
                Some(body) => (body, "\n"),
                None => (line, ""),
            };
            out.push_str(if self.leaks(body) { placeholder } else { body });
            out.push_str(end);
        }

        if self.leaks(&out) {
            self.redact_with(text, placeholder)
        } else {
            out
        }
    }

    // A secret containing '*' can reappear around a mask, so callers check
    // the result with `leaks`
    fn mask(&self, text: &str) -> String {
        let mut masked = text.to_string();
        for secret in &self.secrets {
            if masked.contains(secret.as_str()) {
                masked = masked.replace(secret.as_str(), MASK);
            }
        }
        masked
    }

    fn leaks(&self, text: &str) -> bool {
        self.secrets.iter().any(|s| text.contains(s.as_str()))
    }
}

impl fmt::Debug for Redactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Redactor")
            .field("secrets", &self.secrets.len())
            .finish()
    }
}
