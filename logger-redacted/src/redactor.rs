use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
    // Colombian mobiles (3xx) and geographic landlines (60x), optional +57
    static ref PHONE_REGEX: Regex =
        Regex::new(r"(?:\+57[\s-]?)?\b(?:3\d{2}|60\d)[\s-]?\d{3}[\s-]?\d{4}\b").unwrap();
    // CC 1032456789, TI-99010112345, NIT: 900123456
    static ref TYPED_DOCUMENT_REGEX: Regex =
        Regex::new(r"(?i)\b(CC|TI|CE|RC|PA|NIT|PEP)([\s.:#-]*)(\d{5,12})\b").unwrap();
    // documento_paciente=1032456789, "numeroDocumento":"1032456789"
    static ref DOCUMENT_FIELD_REGEX: Regex =
        Regex::new(r#"(?i)\b(\w*documento\w*)(["']?\s*[=:]\s*["']?)(\d{5,12})\b"#).unwrap();
}

/// PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_documents: bool,
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_phones: true,
            redact_documents: true,
            hash_for_correlation: false,
            custom_patterns: Vec::new(),
        }
    }
}

impl RedactionConfig {
    pub fn with_hash_for_correlation(mut self, enabled: bool) -> Self {
        self.hash_for_correlation = enabled;
        self
    }

    pub fn with_custom_pattern(mut self, pattern: Regex, replacement: impl Into<String>) -> Self {
        self.custom_patterns.push((pattern, replacement.into()));
        self
    }
}

/// PII redactor for log messages
#[derive(Debug, Clone)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        // Documents go first: a bare 10 digit document starting with 3 also looks like a mobile
        if self.config.redact_documents {
            result = self.redact_documents(&result);
        }

        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }

        if self.config.redact_phones {
            result = self.redact_phones(&result);
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    fn redact_documents(&self, text: &str) -> String {
        let replace = |caps: &Captures| {
            let digits = caps.get(3).map_or("", |m| m.as_str());
            let prefix = caps.get(1).map_or("", |m| m.as_str());
            let separator = caps.get(2).map_or("", |m| m.as_str());
            if self.config.hash_for_correlation {
                format!("{prefix}{separator}DOC[{}]", self.hash_value(digits))
            } else {
                format!("{prefix}{separator}{}", mask_keep_tail(digits, 3))
            }
        };

        let typed = TYPED_DOCUMENT_REGEX.replace_all(text, replace);
        DOCUMENT_FIELD_REGEX.replace_all(&typed, replace).to_string()
    }

    fn redact_emails(&self, text: &str) -> String {
        EMAIL_REGEX
            .replace_all(text, |caps: &Captures| {
                let email = caps.get(0).map_or("", |m| m.as_str());
                if self.config.hash_for_correlation {
                    return format!("EMAIL[{}]", self.hash_value(email));
                }
                match email.split_once('@') {
                    Some((user, domain)) => format!(
                        "{}***@{}***",
                        user.chars().next().unwrap_or('*'),
                        domain.chars().next().unwrap_or('*')
                    ),
                    None => "***@***".to_string(),
                }
            })
            .to_string()
    }

    fn redact_phones(&self, text: &str) -> String {
        PHONE_REGEX
            .replace_all(text, |caps: &Captures| {
                let phone = caps.get(0).map_or("", |m| m.as_str());
                if self.config.hash_for_correlation {
                    format!("PHONE[{}]", self.hash_value(phone))
                } else {
                    "*** *** ****".to_string()
                }
            })
            .to_string()
    }

    fn hash_value(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        let result = hasher.finalize();
        general_purpose::STANDARD.encode(result.get(..8).unwrap_or_default())
    }
}

impl Default for PiiRedactor {
    fn default() -> Self {
        Self::new(RedactionConfig::default())
    }
}

/// Replace every character but the last `keep` with `*`
pub fn mask_keep_tail(value: &str, keep: usize) -> String {
    let len = value.chars().count();
    let hidden = len.saturating_sub(keep);
    value
        .chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { '*' } else { c })
        .collect()
}
