//! `TextImagerDocumentation` schema served by `/v1/documentation`

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::Language;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextImagerCapability {
    /// ISO 639-1 codes of the supported languages
    pub supported_languages: Vec<String>,

    /// Same input always yields the same output
    pub reproducible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextImagerDocumentation {
    pub annotator_name: String,
    pub version: String,
    pub implementation_lang: Option<String>,
    pub meta: Option<HashMap<String, String>>,
    pub docker_container_id: Option<String>,
    pub parameters: Option<HashMap<String, String>>,
    pub capability: TextImagerCapability,

    /// Type system descriptor XML, if available
    pub implementation_specific: Option<String>,
}

impl Default for TextImagerDocumentation {
    fn default() -> Self {
        Self {
            annotator_name: env!("CARGO_PKG_NAME").into(),
            version: env!("CARGO_PKG_VERSION").into(),
            implementation_lang: Some(format!("Rust {}", env!("CARGO_PKG_RUST_VERSION"))),
            meta: None,
            docker_container_id: None,
            parameters: None,
            capability: TextImagerCapability {
                supported_languages: Language::ALL
                    .iter()
                    .map(|language| language.code().to_string())
                    .collect(),
                reproducible: true,
            },
            implementation_specific: None,
        }
    }
}
