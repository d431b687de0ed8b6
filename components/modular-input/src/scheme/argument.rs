// Local crates
use crate::{error::Result, helpers::xml::{write_event, write_text_element}};

// External crates
use quick_xml::{
    Writer,
    events::{BytesEnd, BytesStart, Event},
};
use std::fmt;
use std::io::Write;

/// Value type the orchestrator enforces for an argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DataType {
    /// `boolean`
    Boolean,
    /// `number`
    Number,
    /// `string`
    #[default]
    String,
}

impl DataType {
    /// Wire name used inside `<data_type>`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Number => "number",
            DataType::String => "string",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configurable parameter of a modular input type.
///
/// Built by the scheme hook and read-only once serialized. Optional fields
/// left as `None` produce no element at all in the introspection document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// Unique key within the scheme.
    pub name: String,
    /// Display label.
    pub title: Option<String>,
    /// Help text.
    pub description: Option<String>,
    /// Validation expression, forwarded verbatim to the orchestrator.
    pub validation: Option<String>,
    /// Value type enforced by the orchestrator.
    pub data_type: DataType,
    /// Must be set when the input is created.
    pub required_on_create: bool,
    /// Must be set when the input is edited.
    pub required_on_edit: bool,
}

impl Argument {
    /// Create an argument with every optional field unset.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            validation: None,
            data_type: DataType::default(),
            required_on_create: false,
            required_on_edit: false,
        }
    }

    /// Set the display label.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the help text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the validation expression.
    pub fn with_validation(mut self, validation: impl Into<String>) -> Self {
        self.validation = Some(validation.into());
        self
    }

    /// Set the value type.
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Require the argument when the input is created.
    pub fn required_on_create(mut self, required: bool) -> Self {
        self.required_on_create = required;
        self
    }

    /// Require the argument when the input is edited.
    pub fn required_on_edit(mut self, required: bool) -> Self {
        self.required_on_edit = required;
        self
    }

    /// Append this argument's `<arg>` element to an open `<args>` block.
    pub(crate) fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let start = BytesStart::new("arg").with_attributes([("name", self.name.as_str())]);
        write_event(writer, Event::Start(start))?;

        if let Some(title) = &self.title {
            write_text_element(writer, "title", title)?;
        }
        if let Some(description) = &self.description {
            write_text_element(writer, "description", description)?;
        }
        if let Some(validation) = &self.validation {
            write_text_element(writer, "validation", validation)?;
        }
        write_text_element(writer, "data_type", self.data_type.as_str())?;
        write_text_element(
            writer,
            "required_on_create",
            bool_str(self.required_on_create),
        )?;
        write_text_element(writer, "required_on_edit", bool_str(self.required_on_edit))?;

        write_event(writer, Event::End(BytesEnd::new("arg")))
    }
}

pub(crate) fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
