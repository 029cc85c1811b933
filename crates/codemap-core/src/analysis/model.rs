//! Analysis document models.
//!
//! Mirrors the JSON emitted by the external analyzer. Every field other than
//! a file's path is optional on the wire: absent or `null` values become
//! empty strings, empty lists or `false`, never a parse error.

use serde::{Deserialize, Deserializer, Serialize};

/// Return types that carry no information worth linking.
const RETURN_TYPE_SENTINELS: &[&str] = &["", "void", "any"];

/// A complete analysis of one codebase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analysis {
    #[serde(alias = "Files", deserialize_with = "null_as_default")]
    pub files: Vec<SourceFile>,
}

/// One analyzed source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceFile {
    #[serde(alias = "Path", deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(alias = "Language", deserialize_with = "null_as_default")]
    pub language: String,
    /// Analyzer-reported problem. Informational only.
    #[serde(alias = "Error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(alias = "Classes", deserialize_with = "null_as_default")]
    pub classes: Vec<ClassDef>,
    #[serde(alias = "Functions", deserialize_with = "null_as_default")]
    pub functions: Vec<FunctionDef>,
    #[serde(alias = "Imports", deserialize_with = "null_as_default")]
    pub imports: Vec<ImportDef>,
}

/// A class declared in a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassDef {
    #[serde(alias = "Name", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(alias = "IsExported", alias = "is_exported", deserialize_with = "null_as_default")]
    pub is_exported: bool,
    #[serde(alias = "Properties", deserialize_with = "null_as_default")]
    pub properties: Vec<String>,
    #[serde(alias = "Methods", deserialize_with = "null_as_default")]
    pub methods: Vec<String>,
}

/// A function or method declared in a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FunctionDef {
    #[serde(alias = "Name", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(alias = "IsExported", alias = "is_exported", deserialize_with = "null_as_default")]
    pub is_exported: bool,
    #[serde(alias = "IsMethodOf", alias = "is_method_of", skip_serializing_if = "Option::is_none")]
    pub is_method_of: Option<String>,
    #[serde(alias = "Params", deserialize_with = "null_as_default")]
    pub params: Vec<String>,
    #[serde(alias = "ReturnTypes", alias = "return_types", deserialize_with = "null_as_default")]
    pub return_types: Vec<String>,
    #[serde(alias = "Calls", deserialize_with = "null_as_default")]
    pub calls: Vec<String>,
}

/// A raw, unresolved import statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportDef {
    pub source: String,
}

impl SourceFile {
    /// The analyzer error, if one was reported.
    pub fn analyzer_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.trim().is_empty())
    }

    /// Find a function declared in this file by name.
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Whether this file declares a class with the given name.
    pub fn has_class(&self, name: &str) -> bool {
        self.classes.iter().any(|c| c.name == name)
    }
}

impl FunctionDef {
    /// The owning class name, treating an empty string as unset.
    pub fn method_of(&self) -> Option<&str> {
        self.is_method_of.as_deref().filter(|c| !c.is_empty())
    }

    /// Return types worth a RETURNS edge, with `void`/`any`/empty dropped.
    pub fn linked_return_types(&self) -> impl Iterator<Item = &str> {
        self.return_types
            .iter()
            .map(String::as_str)
            .filter(|rt| !RETURN_TYPE_SENTINELS.contains(rt))
    }
}

impl ImportDef {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }
}

impl<'de> Deserialize<'de> for ImportDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Some analyzers emit bare strings, others `{ "source": ... }`.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawImport {
            Bare(String),
            Record {
                #[serde(default, alias = "Source")]
                source: Option<String>,
            },
        }

        let source = match Option::<RawImport>::deserialize(deserializer)? {
            Some(RawImport::Bare(s)) => s,
            Some(RawImport::Record { source }) => source.unwrap_or_default(),
            None => String::new(),
        };
        Ok(ImportDef { source })
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
