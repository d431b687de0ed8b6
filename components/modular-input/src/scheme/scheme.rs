// Local crates
use crate::{
    error::{ModularInputError, Result},
    helpers::xml::{write_event, write_text_element},
    scheme::argument::{Argument, bool_str},
};

// External crates
use quick_xml::{
    Writer,
    events::{BytesEnd, BytesStart, Event},
};
use std::collections::HashSet;
use std::fmt;
use tracing::instrument;

/// How the orchestrator should interpret the script's standard output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StreamingMode {
    /// Plain text, one event per line.
    Simple,
    /// `<stream>` of `<event>` elements.
    #[default]
    Xml,
}

impl StreamingMode {
    /// Wire name used inside `<streaming_mode>`.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamingMode::Simple => "simple",
            StreamingMode::Xml => "xml",
        }
    }
}

impl fmt::Display for StreamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared configuration surface of a modular input type, advertised to the
/// orchestrator in `--scheme` mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheme {
    /// Identifies the input type. Must be non-empty.
    pub title: String,
    /// Help text for the input type.
    pub description: Option<String>,
    /// Whether the orchestrator calls `--validate-arguments`.
    pub use_external_validation: bool,
    /// Whether one process serves every stanza.
    pub use_single_instance: bool,
    /// How stdout is interpreted.
    pub streaming_mode: StreamingMode,
    /// Arguments in declaration order. Names must be unique.
    pub arguments: Vec<Argument>,
}

impl Scheme {
    /// Scheme with external validation on, single instance off and XML streaming.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            use_external_validation: true,
            use_single_instance: false,
            streaming_mode: StreamingMode::default(),
            arguments: Vec::new(),
        }
    }

    /// Set the help text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether the orchestrator calls `--validate-arguments`.
    pub fn use_external_validation(mut self, enabled: bool) -> Self {
        self.use_external_validation = enabled;
        self
    }

    /// Whether one process serves every stanza.
    pub fn use_single_instance(mut self, enabled: bool) -> Self {
        self.use_single_instance = enabled;
        self
    }

    /// Set how stdout is interpreted.
    pub fn with_streaming_mode(mut self, mode: StreamingMode) -> Self {
        self.streaming_mode = mode;
        self
    }

    /// Builder form of [`Scheme::add_argument`].
    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.add_argument(argument);
        self
    }

    /// Append an argument. Declaration order is preserved in the output.
    pub fn add_argument(&mut self, argument: Argument) {
        self.arguments.push(argument);
    }

    /// Check the scheme invariants: non-empty title, unique argument names.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ModularInputError::InvalidScheme(
                "scheme title must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for argument in &self.arguments {
            if !seen.insert(argument.name.as_str()) {
                return Err(ModularInputError::InvalidScheme(format!(
                    "duplicate argument name {:?}",
                    argument.name
                )));
            }
        }
        Ok(())
    }

    /// Serialize to the introspection document rooted at `<scheme>`.
    #[instrument(
        name = "modular_input_scheme::to_xml",
        target = "scheme::scheme::Scheme",
        skip_all,
        level = "debug"
    )]
    pub fn to_xml(&self) -> Result<String> {
        self.validate()?;

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        write_event(&mut writer, Event::Start(BytesStart::new("scheme")))?;
        write_text_element(&mut writer, "title", &self.title)?;
        if let Some(description) = &self.description {
            write_text_element(&mut writer, "description", description)?;
        }
        write_text_element(
            &mut writer,
            "use_external_validation",
            bool_str(self.use_external_validation),
        )?;
        write_text_element(
            &mut writer,
            "use_single_instance",
            bool_str(self.use_single_instance),
        )?;
        write_text_element(&mut writer, "streaming_mode", self.streaming_mode.as_str())?;

        write_event(&mut writer, Event::Start(BytesStart::new("endpoint")))?;
        write_event(&mut writer, Event::Start(BytesStart::new("args")))?;
        for argument in &self.arguments {
            argument.write_xml(&mut writer)?;
        }
        write_event(&mut writer, Event::End(BytesEnd::new("args")))?;
        write_event(&mut writer, Event::End(BytesEnd::new("endpoint")))?;
        write_event(&mut writer, Event::End(BytesEnd::new("scheme")))?;

        tracing::debug!(
            scheme_title = %self.title,
            argument_count = self.arguments.len(),
            "Serialized scheme to introspection XML"
        );

        String::from_utf8(writer.into_inner()).map_err(|e| {
            ModularInputError::InvalidScheme(format!("scheme XML is not UTF-8: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_scheme_uses_protocol_defaults() {
        let scheme = Scheme::new("abcd");
        assert!(scheme.use_external_validation);
        assert!(!scheme.use_single_instance);
        assert_eq!(scheme.streaming_mode, StreamingMode::Xml);
        assert!(scheme.arguments.is_empty());
    }

    #[test]
    fn empty_title_is_rejected() {
        let err = Scheme::new("  ").to_xml().unwrap_err();
        assert!(matches!(err, ModularInputError::InvalidScheme(_)));
    }

    #[test]
    fn duplicate_argument_names_are_rejected() {
        let scheme = Scheme::new("abcd")
            .with_argument(Argument::new("a"))
            .with_argument(Argument::new("a"));
        assert!(matches!(
            scheme.to_xml(),
            Err(ModularInputError::InvalidScheme(msg)) if msg.contains("\"a\"")
        ));
    }

    #[test]
    fn unset_description_is_omitted() {
        let xml = Scheme::new("abcd").to_xml().unwrap();
        assert!(!xml.contains("<description>"));
        assert!(xml.contains("<title>abcd</title>"));
        assert!(xml.contains("<streaming_mode>xml</streaming_mode>"));
    }
}
