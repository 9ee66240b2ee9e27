use std::io::{self, Write};
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::LoggerConfig;
use crate::redactor::{PiiRedactor, RedactionConfig};

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter '{directive}': {message}")]
    InvalidFilter { directive: String, message: String },

    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Wraps a [`MakeWriter`] so that every formatted event is redacted before it is written.
///
/// The fmt layer renders a whole event into one buffer and hands it over in a
/// single `write`, so redacting per call sees complete lines.
#[derive(Clone)]
pub struct RedactingMakeWriter<M> {
    inner: M,
    redactor: Option<Arc<PiiRedactor>>,
}

impl<M> RedactingMakeWriter<M> {
    pub fn new(inner: M, redactor: Option<PiiRedactor>) -> Self {
        Self {
            inner,
            redactor: redactor.map(Arc::new),
        }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
            redactor: self.redactor.clone(),
        }
    }
}

pub struct RedactingWriter<W> {
    inner: W,
    redactor: Option<Arc<PiiRedactor>>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &self.redactor {
            Some(redactor) => {
                let text = String::from_utf8_lossy(buf);
                self.inner.write_all(redactor.redact(&text).as_bytes())?;
                // The caller's bytes were consumed even if the redacted form differs in length
                Ok(buf.len())
            }
            None => self.inner.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Build the redactor described by `config`, or `None` when redaction is off
pub fn redactor_for(config: &LoggerConfig) -> Option<PiiRedactor> {
    config.redaction_enabled.then(|| {
        PiiRedactor::new(RedactionConfig::default().with_hash_for_correlation(config.hash_for_correlation))
    })
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Output goes to stderr so
/// that command output on stdout stays machine readable.
pub fn init_logging(config: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| LoggerError::InvalidFilter {
            directive: config.level.clone(),
            message: e.to_string(),
        })?,
    };

    let writer = RedactingMakeWriter::new(io::stderr, redactor_for(config));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_events_are_redacted() {
        let buffer = SharedBuffer::default();
        let sink = buffer.clone();
        let writer = RedactingMakeWriter::new(move || sink.clone(), Some(PiiRedactor::default()));
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(documento_paciente = "1032456789", "Paciente CC 52123456 sin correo ana@ips.co");
        });

        let output = buffer.contents();
        assert!(output.contains("*******789"));
        assert!(output.contains("CC *****456"));
        assert!(output.contains("a***@i***"));
        assert!(!output.contains("1032456789"));
    }

    #[test]
    fn test_redaction_can_be_disabled() {
        let config = LoggerConfig {
            redaction_enabled: false,
            ..LoggerConfig::default()
        };
        assert!(redactor_for(&config).is_none());

        let buffer = SharedBuffer::default();
        let sink = buffer.clone();
        let make_writer = RedactingMakeWriter::new(move || sink.clone(), None);
        let mut writer = make_writer.make_writer();
        writer.write_all(b"CC 1032456789").unwrap();
        assert_eq!(buffer.contents(), "CC 1032456789");
    }
}
