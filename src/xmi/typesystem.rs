//! UIMA type system descriptor of this component
//!
//! The descriptor is the schema counterpart of the XMI documents: it declares
//! the types and features the component reads and writes so the orchestrator
//! can merge them into the pipeline's type system.

use std::collections::HashSet;
use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

use crate::cas::types;

const RESOURCE_SPECIFIER_NAMESPACE: &str = "http://uima.apache.org/resourceSpecifier";

/// Errors while building or writing a descriptor
#[derive(Error, Debug)]
pub enum TypeSystemError {
    #[error("type '{0}' is declared more than once")]
    DuplicateType(String),

    #[error("feature '{feature}' is declared more than once on type '{type_name}'")]
    DuplicateFeature { type_name: String, feature: String },

    #[error("failed to write type system descriptor: {0}")]
    Write(#[from] std::io::Error),

    #[error("type system descriptor is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDescription {
    pub name: String,
    pub description: String,
    pub range_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescription {
    pub name: String,
    pub description: String,
    pub supertype: String,
    pub features: Vec<FeatureDescription>,
}

impl TypeDescription {
    fn annotation(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            supertype: types::ANNOTATION.to_string(),
            features: Vec::new(),
        }
    }

    fn string_feature(mut self, name: &str, description: &str) -> Self {
        self.features.push(FeatureDescription {
            name: name.to_string(),
            description: description.to_string(),
            range_type: types::STRING.to_string(),
        });
        self
    }
}

/// A set of type declarations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSystemDescription {
    pub name: String,
    pub types: Vec<TypeDescription>,
}

impl TypeSystemDescription {
    /// Types read and written by this component
    pub fn component() -> Result<Self, TypeSystemError> {
        Self::new(
            env!("CARGO_PKG_NAME"),
            vec![
                TypeDescription::annotation(types::TOKEN, "Token of the segmented text"),
                TypeDescription::annotation(types::SENTENCE, "Sentence of the segmented text"),
                TypeDescription::annotation(types::TIMEX3, "TIMEX3 time expression")
                    .string_feature("timexId", "Id of the expression within the document")
                    .string_feature("timexType", "DATE, TIME, DURATION or SET")
                    .string_feature("timexValue", "Normalized TIMEX3 value")
                    .string_feature("timexQuant", "Quantifier of a SET")
                    .string_feature("timexFreq", "Frequency of a SET")
                    .string_feature("timexMod", "Modifier such as START, MID or END")
                    .string_feature("foundByRule", "Name of the rule that matched"),
                TypeDescription::annotation(types::TIME, "Time annotation")
                    .string_feature("value", "Type of the time expression")
                    .string_feature("identifier", "Normalized value of the time expression"),
            ],
        )
    }

    /// Build a descriptor, rejecting duplicate types and features
    pub fn new(name: impl Into<String>, types: Vec<TypeDescription>) -> Result<Self, TypeSystemError> {
        let mut type_names = HashSet::new();
        for description in &types {
            if !type_names.insert(description.name.as_str()) {
                return Err(TypeSystemError::DuplicateType(description.name.clone()));
            }
            let mut features = HashSet::new();
            for feature in &description.features {
                if !features.insert(feature.name.as_str()) {
                    return Err(TypeSystemError::DuplicateFeature {
                        type_name: description.name.clone(),
                        feature: feature.name.clone(),
                    });
                }
            }
        }

        Ok(Self {
            name: name.into(),
            types,
        })
    }

    /// Serialize as a UIMA `typeSystemDescription` XML document
    pub fn to_xml(&self) -> Result<String, TypeSystemError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("typeSystemDescription");
        root.push_attribute(("xmlns", RESOURCE_SPECIFIER_NAMESPACE));
        writer.write_event(Event::Start(root))?;
        text_element(&mut writer, "name", &self.name)?;
        text_element(&mut writer, "version", env!("CARGO_PKG_VERSION"))?;

        writer.write_event(Event::Start(BytesStart::new("types")))?;
        for description in &self.types {
            writer.write_event(Event::Start(BytesStart::new("typeDescription")))?;
            text_element(&mut writer, "name", &description.name)?;
            text_element(&mut writer, "description", &description.description)?;
            text_element(&mut writer, "supertypeName", &description.supertype)?;

            if !description.features.is_empty() {
                writer.write_event(Event::Start(BytesStart::new("features")))?;
                for feature in &description.features {
                    writer.write_event(Event::Start(BytesStart::new("featureDescription")))?;
                    text_element(&mut writer, "name", &feature.name)?;
                    text_element(&mut writer, "description", &feature.description)?;
                    text_element(&mut writer, "rangeTypeName", &feature.range_type)?;
                    writer.write_event(Event::End(BytesEnd::new("featureDescription")))?;
                }
                writer.write_event(Event::End(BytesEnd::new("features")))?;
            }

            writer.write_event(Event::End(BytesEnd::new("typeDescription")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("types")))?;
        writer.write_event(Event::End(BytesEnd::new("typeSystemDescription")))?;

        Ok(String::from_utf8(writer.into_inner())?)
    }
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> std::io::Result<()> {
    if text.is_empty() {
        return writer.write_event(Event::Empty(BytesStart::new(name)));
    }
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_descriptor() {
        let descriptor = TypeSystemDescription::component().unwrap();
        let names: Vec<_> = descriptor.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![types::TOKEN, types::SENTENCE, types::TIMEX3, types::TIME]
        );
    }

    #[test]
    fn test_to_xml() {
        let xml = TypeSystemDescription::component().unwrap().to_xml().unwrap();

        assert!(xml.contains(r#"<typeSystemDescription xmlns="http://uima.apache.org/resourceSpecifier">"#));
        assert!(xml.contains("<name>org.texttechnologylab.annotation.type.Time</name>"));
        assert!(xml.contains("<name>timexValue</name>"));
        assert!(xml.contains("<rangeTypeName>uima.cas.String</rangeTypeName>"));
        assert!(xml.contains("<supertypeName>uima.tcas.Annotation</supertypeName>"));
    }

    #[test]
    fn test_duplicate_type_is_rejected() {
        let token = TypeDescription::annotation(types::TOKEN, "");
        let err = TypeSystemDescription::new("broken", vec![token.clone(), token]).unwrap_err();
        assert!(matches!(err, TypeSystemError::DuplicateType(name) if name == types::TOKEN));
    }

    #[test]
    fn test_duplicate_feature_is_rejected() {
        let time = TypeDescription::annotation(types::TIME, "")
            .string_feature("value", "")
            .string_feature("value", "");
        let err = TypeSystemDescription::new("broken", vec![time]).unwrap_err();
        assert!(matches!(err, TypeSystemError::DuplicateFeature { .. }));
    }
}
