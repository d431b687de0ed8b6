// Local crates
use crate::{
    error::{ModularInputError, Result},
    event_writer::event::{Event, Severity},
};

// External crates
use quick_xml::Writer;
use std::io::{self, Stderr, Stdout, Write};
use tracing::instrument;

const STREAM_OPEN: &[u8] = b"<stream>";
const STREAM_CLOSE: &[u8] = b"</stream>";

/// Owns the output and error sinks of one script invocation.
///
/// Events are appended to a `<stream>` document on the output sink. The
/// opening tag is written lazily before the first event and the closing tag
/// exactly once by [`EventWriter::close`], which also opens the stream if no
/// event was written so the document is well-formed either way.
///
/// Log lines go straight to the error sink as `SEVERITY message\n`.
#[derive(Debug)]
pub struct EventWriter<W: Write, E: Write> {
    out: W,
    err: E,
    header_written: bool,
    closed: bool,
}

impl EventWriter<Stdout, Stderr> {
    /// Writer bound to the process's standard output and error.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<W: Write, E: Write> EventWriter<W, E> {
    /// Writer over arbitrary sinks.
    pub fn new(out: W, err: E) -> Self {
        Self {
            out,
            err,
            header_written: false,
            closed: false,
        }
    }

    /// Append one `<event>` to the stream and flush the output sink.
    #[instrument(
        name = "modular_input_event_writer::write_event",
        target = "event_writer::event_writer::EventWriter",
        skip_all,
        level = "trace"
    )]
    pub fn write_event(&mut self, event: &Event) -> Result<()> {
        if self.closed {
            return Err(ModularInputError::Write(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "event stream already closed",
            )));
        }

        let mut writer = Writer::new(Vec::new());
        event.write_xml(&mut writer)?;

        if !self.header_written {
            tracing::trace!("Opening event stream document");
            self.out.write_all(STREAM_OPEN)?;
            self.header_written = true;
        }
        self.out.write_all(&writer.into_inner())?;
        self.out.flush()?;

        tracing::trace!(
            stanza = ?event.stanza,
            data_len = event.data.len(),
            "Event written to output sink"
        );
        Ok(())
    }

    /// Write one `SEVERITY message` line to the error sink, unbuffered.
    pub fn log(&mut self, severity: Severity, message: &str) -> Result<()> {
        tracing::debug!(%severity, log_message = message, "Protocol log line written to error sink");
        writeln!(self.err, "{severity} {message}")?;
        self.err.flush()?;
        Ok(())
    }

    /// Write a complete XML document (scheme or error) to the output sink.
    pub fn write_xml_document(&mut self, document: &str) -> Result<()> {
        self.out.write_all(document.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    /// Finish the event stream. Writes `</stream>` exactly once; further
    /// calls are no-ops.
    #[instrument(
        name = "modular_input_event_writer::close",
        target = "event_writer::event_writer::EventWriter",
        skip_all,
        level = "trace"
    )]
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if !self.header_written {
            self.out.write_all(STREAM_OPEN)?;
            self.header_written = true;
        }
        self.out.write_all(STREAM_CLOSE)?;
        self.out.flush()?;
        self.closed = true;
        tracing::trace!("Event stream document closed");
        Ok(())
    }

    /// Whether `</stream>` has been written.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The output sink, e.g. to inspect an in-memory buffer.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// The error sink.
    pub fn error_output(&self) -> &E {
        &self.err
    }

    /// Give back both sinks.
    pub fn into_inner(self) -> (W, E) {
        (self.out, self.err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedSink;

    impl Write for ClosedSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn invalid_event_writes_nothing() {
        let mut ew = EventWriter::new(Vec::new(), Vec::new());
        assert!(ew.write_event(&Event::default()).is_err());
        assert!(ew.output().is_empty());
    }

    #[test]
    fn closed_sink_surfaces_write_error() {
        let mut ew = EventWriter::new(ClosedSink, Vec::new());
        assert!(matches!(
            ew.write_event(&Event::new("x")),
            Err(ModularInputError::Write(_))
        ));
    }

    #[test]
    fn write_after_close_is_rejected() {
        let mut ew = EventWriter::new(Vec::new(), Vec::new());
        ew.close().unwrap();
        assert!(ew.is_closed());
        assert!(matches!(
            ew.write_event(&Event::new("late")),
            Err(ModularInputError::Write(_))
        ));
        assert_eq!(ew.output().as_slice(), b"<stream></stream>");
    }
}
