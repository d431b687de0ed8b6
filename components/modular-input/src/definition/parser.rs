// Local crates
use crate::{
    definition::models::{InputDefinition, Metadata, ParamValue, Parameters, ValidationDefinition},
    error::{ModularInputError, Result},
    helpers::xml::XmlNode,
};

// External crates
use std::collections::BTreeMap;
use tracing::instrument;

impl InputDefinition {
    /// Parse the streaming-mode document:
    ///
    /// ```xml
    /// <input>
    ///   <server_host>..</server_host> ...
    ///   <configuration>
    ///     <stanza name="..."><param name="...">value</param></stanza>
    ///   </configuration>
    /// </input>
    /// ```
    ///
    /// Unknown elements are ignored.
    #[instrument(
        name = "modular_input_definition::parse_input",
        target = "definition::parser::InputDefinition",
        skip_all,
        level = "debug"
    )]
    pub fn parse(document: &str) -> Result<Self> {
        let root = XmlNode::parse(document)?;

        let mut inputs = BTreeMap::new();
        for configuration in root.children_named("configuration") {
            for stanza in configuration.children_named("stanza") {
                let name = required_name(stanza)?;
                inputs.insert(name.to_string(), parse_parameters(stanza)?);
            }
        }

        tracing::debug!(
            root = %root.name,
            stanza_count = inputs.len(),
            "Parsed input definition"
        );

        Ok(InputDefinition {
            metadata: parse_metadata(&root, &["configuration"]),
            inputs,
        })
    }
}

impl ValidationDefinition {
    /// Parse the validate-arguments document:
    ///
    /// ```xml
    /// <items>
    ///   <server_host>..</server_host> ...
    ///   <item name="..."><param name="...">value</param></item>
    /// </items>
    /// ```
    ///
    /// A `<configuration><stanza>` block is accepted in place of `<item>`.
    #[instrument(
        name = "modular_input_definition::parse_validation",
        target = "definition::parser::ValidationDefinition",
        skip_all,
        level = "debug"
    )]
    pub fn parse(document: &str) -> Result<Self> {
        let root = XmlNode::parse(document)?;

        let item = root.child("item").or_else(|| {
            root.child("configuration")
                .and_then(|configuration| configuration.child("stanza"))
        });

        let (name, parameters) = match item {
            Some(item) => (
                item.attribute("name").map(str::to_string),
                parse_parameters(item)?,
            ),
            None => (None, Parameters::default()),
        };

        tracing::debug!(
            root = %root.name,
            item = ?name,
            parameter_count = parameters.len(),
            "Parsed validation definition"
        );

        Ok(ValidationDefinition {
            metadata: parse_metadata(&root, &["item", "configuration"]),
            name,
            parameters,
        })
    }
}

/// Top-level leaf elements become metadata; structural blocks are skipped.
fn parse_metadata(root: &XmlNode, structural: &[&str]) -> Metadata {
    Metadata(
        root.children
            .iter()
            .filter(|node| node.children.is_empty() && !structural.contains(&node.name.as_str()))
            .map(|node| (node.name.clone(), node.text.clone()))
            .collect(),
    )
}

fn parse_parameters(parent: &XmlNode) -> Result<Parameters> {
    let mut parameters = BTreeMap::new();

    for node in &parent.children {
        match node.name.as_str() {
            "param" => {
                let name = required_name(node)?;
                parameters.insert(name.to_string(), ParamValue::Single(node.text.clone()));
            }
            "param_list" => {
                let name = required_name(node)?;
                let values = node
                    .children_named("value")
                    .map(|value| value.text.clone())
                    .collect();
                parameters.insert(name.to_string(), ParamValue::List(values));
            }
            _ => {}
        }
    }

    Ok(Parameters(parameters))
}

fn required_name(node: &XmlNode) -> Result<&str> {
    node.attribute("name").ok_or_else(|| {
        ModularInputError::parse(format!("<{}> is missing its name attribute", node.name))
    })
}
