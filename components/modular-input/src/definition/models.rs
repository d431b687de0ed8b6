// External crates
use serde::Serialize;
use std::collections::BTreeMap;

// Metadata element names the orchestrator sends with every definition.
/// `<server_host>`
pub const SERVER_HOST: &str = "server_host";
/// `<server_uri>`
pub const SERVER_URI: &str = "server_uri";
/// `<checkpoint_dir>`
pub const CHECKPOINT_DIR: &str = "checkpoint_dir";
/// `<session_key>`
pub const SESSION_KEY: &str = "session_key";

/// Top-level scalar elements of a definition document, keyed by element name.
///
/// The four well-known keys have typed accessors; anything else the
/// orchestrator adds is kept so newer hosts stay readable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata(pub BTreeMap<String, String>);

impl Metadata {
    /// Any metadata element by name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Host name of the orchestrator.
    pub fn server_host(&self) -> Option<&str> {
        self.get(SERVER_HOST)
    }

    /// Management endpoint of the orchestrator.
    pub fn server_uri(&self) -> Option<&str> {
        self.get(SERVER_URI)
    }

    /// Directory the script may use for persistent state.
    pub fn checkpoint_dir(&self) -> Option<&str> {
        self.get(CHECKPOINT_DIR)
    }

    /// Session token for calls back into the orchestrator.
    pub fn session_key(&self) -> Option<&str> {
        self.get(SESSION_KEY)
    }
}

/// A parameter value: `<param>` carries one string, `<param_list>` several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// One `<param>` value.
    Single(String),
    /// `<param_list>` values in document order.
    List(Vec<String>),
}

/// Parameter name to value mapping for one stanza.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Parameters(pub BTreeMap<String, ParamValue>);

impl Parameters {
    /// Single value of a parameter, or the first entry of a list parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.0.get(name)? {
            ParamValue::Single(value) => Some(value),
            ParamValue::List(values) => values.first().map(String::as_str),
        }
    }

    /// Every value of a parameter; a single value becomes a one-item list.
    pub fn get_list(&self, name: &str) -> Vec<&str> {
        match self.0.get(name) {
            Some(ParamValue::Single(value)) => vec![value.as_str()],
            Some(ParamValue::List(values)) => values.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }

    /// Whether the parameter was sent at all.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameter was sent.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}

/// Configuration for every stanza the script should stream, read from
/// standard input in streaming mode. Immutable after parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InputDefinition {
    /// Top-level scalar elements.
    pub metadata: Metadata,
    /// Stanza name to its parameters.
    pub inputs: BTreeMap<String, Parameters>,
}

impl InputDefinition {
    /// Parameters of one stanza.
    pub fn stanza(&self, name: &str) -> Option<&Parameters> {
        self.inputs.get(name)
    }
}

/// The single configuration under validation in `--validate-arguments` mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationDefinition {
    /// Top-level scalar elements.
    pub metadata: Metadata,
    /// Name of the item being validated, when the orchestrator supplies one.
    pub name: Option<String>,
    /// Parameters of the item.
    pub parameters: Parameters,
}
