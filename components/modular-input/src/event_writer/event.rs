// Local crates
use crate::{
    error::{ModularInputError, Result},
    helpers::xml::{write_event, write_text_element},
};

// External crates
use chrono::{DateTime, Utc};
use quick_xml::{
    Writer,
    events::{BytesEnd, BytesStart, Event as XmlEvent},
};
use std::fmt;
use std::io::Write;

/// One data record to emit in streaming mode.
///
/// Only `data` is required. Every other field is written only when set.
/// `unbroken` and `done` frame multi-part events: a record split across
/// several events sets `unbroken` on each part and `done` on the last one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    /// Event body. Required and non-empty.
    pub data: String,
    /// Input stanza the event belongs to.
    pub stanza: Option<String>,
    /// Where the data came from, e.g. a file path.
    pub source: Option<String>,
    /// Format of the data.
    pub sourcetype: Option<String>,
    /// Destination index.
    pub index: Option<String>,
    /// Originating host.
    pub host: Option<String>,
    /// Seconds since the Unix epoch.
    pub time: Option<f64>,
    /// Part of a multi-part record.
    pub unbroken: bool,
    /// Last part of a multi-part record.
    pub done: bool,
}

impl Event {
    /// Event carrying `data` and nothing else.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    /// Set the stanza.
    pub fn with_stanza(mut self, stanza: impl Into<String>) -> Self {
        self.stanza = Some(stanza.into());
        self
    }

    /// Set the source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the sourcetype.
    pub fn with_sourcetype(mut self, sourcetype: impl Into<String>) -> Self {
        self.sourcetype = Some(sourcetype.into());
        self
    }

    /// Set the index.
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Set the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set `time` in seconds since the Unix epoch.
    pub fn with_time(mut self, epoch_seconds: f64) -> Self {
        self.time = Some(epoch_seconds);
        self
    }

    /// Set `time` from a UTC timestamp, keeping millisecond precision.
    pub fn with_datetime(self, timestamp: DateTime<Utc>) -> Self {
        self.with_time(timestamp.timestamp_millis() as f64 / 1000.0)
    }

    /// Mark as part of a multi-part record.
    pub fn unbroken(mut self, unbroken: bool) -> Self {
        self.unbroken = unbroken;
        self
    }

    /// Mark as the last part of a multi-part record.
    pub fn done(mut self, done: bool) -> Self {
        self.done = done;
        self
    }

    /// Reject events that cannot be written.
    pub fn validate(&self) -> Result<()> {
        if self.data.is_empty() {
            return Err(ModularInputError::InvalidEvent(
                "events must have at least the data field set".to_string(),
            ));
        }
        if let Some(time) = self.time {
            if !time.is_finite() {
                return Err(ModularInputError::InvalidEvent(format!(
                    "event time must be finite, got {time}"
                )));
            }
        }
        Ok(())
    }

    /// Write this event's `<event>` element.
    pub(crate) fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        self.validate()?;

        let mut start = BytesStart::new("event");
        if self.unbroken {
            start.push_attribute(("unbroken", "1"));
        }
        if self.done {
            start.push_attribute(("done", "1"));
        }
        write_event(writer, XmlEvent::Start(start))?;

        write_text_element(writer, "data", &self.data)?;
        let optional = [
            ("stanza", &self.stanza),
            ("source", &self.source),
            ("sourcetype", &self.sourcetype),
            ("index", &self.index),
            ("host", &self.host),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                write_text_element(writer, name, value)?;
            }
        }
        if let Some(time) = self.time {
            write_text_element(writer, "time", &format_time(time))?;
        }

        write_event(writer, XmlEvent::End(BytesEnd::new("event")))
    }
}

/// Epoch seconds with millisecond precision, e.g. `1372187084.000`.
pub fn format_time(epoch_seconds: f64) -> String {
    format!("{epoch_seconds:.3}")
}

/// Severity prefix of a protocol log line on standard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// `DEBUG`
    Debug,
    /// `INFO`
    Info,
    /// `WARN`
    Warn,
    /// `ERROR`
    Error,
    /// `FATAL`
    Fatal,
}

impl Severity {
    /// Prefix written before the message.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
