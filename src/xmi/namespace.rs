//! Mapping between UIMA type names and XMI namespaces
//!
//! UIMA derives one namespace per Java package: `a.b.c.Local` is written as
//! element `Local` in namespace `http:///a/b/c.ecore`, with the last package
//! segment as prefix (`c`, then `c2`, `c3`, ... on collisions).

use super::error::{CodecError, CodecResult};

pub const XMI_NAMESPACE: &str = "http://www.omg.org/XMI";
pub const XMI_PREFIX: &str = "xmi";

const URI_SCHEME: &str = "http:///";
const URI_SUFFIX: &str = ".ecore";

/// Namespace URI for the package of a type
pub fn namespace_uri(type_name: &str) -> String {
    let package = type_name.rsplit_once('.').map_or("", |(package, _)| package);
    format!("{URI_SCHEME}{}{URI_SUFFIX}", package.replace('.', "/"))
}

/// Type name for an element in a namespace
///
/// Namespaces that do not follow the UIMA scheme yield `None`.
pub fn type_name(uri: &str, local: &str) -> Option<String> {
    let package = uri.strip_prefix(URI_SCHEME)?.strip_suffix(URI_SUFFIX)?;
    if package.is_empty() {
        return None;
    }
    Some(format!("{}.{local}", package.replace('/', ".")))
}

/// Ordered `xmlns:` declarations of an XMI document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespaces {
    declarations: Vec<(String, String)>,
}

impl Namespaces {
    /// Collect `xmlns:prefix="uri"` declarations from root attributes
    pub fn from_attributes<'a>(attributes: impl IntoIterator<Item = &'a (String, String)>) -> Self {
        let declarations = attributes
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix("xmlns:")
                    .map(|prefix| (prefix.to_string(), value.clone()))
            })
            .collect();
        Self { declarations }
    }

    pub fn declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }

    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Resolve a qualified element name to `(namespace uri, local name)`
    pub fn resolve<'a>(&'a self, qname: &'a str) -> CodecResult<(&'a str, &'a str)> {
        match qname.split_once(':') {
            Some((prefix, local)) => self
                .uri(prefix)
                .map(|uri| (uri, local))
                .ok_or_else(|| CodecError::UnknownPrefix(prefix.to_string())),
            None => Ok(("", qname)),
        }
    }

    /// Resolve a qualified element name to a UIMA type name
    pub fn resolve_type(&self, qname: &str) -> CodecResult<Option<String>> {
        let (uri, local) = self.resolve(qname)?;
        Ok(type_name(uri, local))
    }

    /// Bind `prefix` to `uri` unless the prefix is already taken
    pub fn ensure(&mut self, prefix: &str, uri: &str) {
        if self.uri(prefix).is_none() {
            self.declarations.push((prefix.to_string(), uri.to_string()));
        }
    }

    /// Qualified element name for a type, declaring its namespace if needed
    pub fn qualified_name(&mut self, type_name: &str) -> String {
        let uri = namespace_uri(type_name);
        let local = type_name.rsplit('.').next().unwrap_or(type_name);

        if let Some((prefix, _)) = self.declarations.iter().find(|(_, u)| *u == uri) {
            return format!("{prefix}:{local}");
        }

        let package = type_name.rsplit_once('.').map_or("", |(package, _)| package);
        let base = match package.rsplit('.').next() {
            Some(segment) if !segment.is_empty() => segment,
            _ => "noNamespace",
        };

        let mut prefix = base.to_string();
        let mut suffix = 2;
        while self.uri(&prefix).is_some() {
            prefix = format!("{base}{suffix}");
            suffix += 1;
        }

        self.declarations.push((prefix.clone(), uri));
        format!("{prefix}:{local}")
    }
}
