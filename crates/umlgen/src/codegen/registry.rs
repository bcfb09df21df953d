//! Language-keyed table of code generators
//!
//! The registry is an ordinary value: build it, register generators, and
//! pass it to the generation manager.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::{CodeGenerator, CSharpGenerator, JavaGenerator, PhpGenerator, PythonGenerator, TypeScriptGenerator};
use crate::core::{Result, UmlGenError};

/// Generators keyed by lowercase language name, plus alias lookups
#[derive(Default, Clone)]
pub struct GeneratorRegistry {
    generators: BTreeMap<String, Arc<dyn CodeGenerator>>,
    aliases: BTreeMap<String, String>,
}

impl GeneratorRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in generators
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(JavaGenerator::new());
        registry.register(TypeScriptGenerator::new());
        registry.register(PythonGenerator::new());
        registry.register(CSharpGenerator::new());
        registry.register(PhpGenerator::new());
        registry
    }

    /// Register a generator under its language key and aliases, replacing
    /// any generator already registered for them
    pub fn register(&mut self, generator: impl CodeGenerator + 'static) {
        let key = generator.language().to_lowercase();
        for alias in generator.aliases() {
            self.aliases.insert(alias.to_lowercase(), key.clone());
        }
        debug!(language = %key, aliases = ?generator.aliases(), "Registered generator");
        self.generators.insert(key, Arc::new(generator));
    }

    /// Look up a generator by language key or alias, case-insensitively
    pub fn resolve(&self, language: &str) -> Result<Arc<dyn CodeGenerator>> {
        let wanted = language.trim().to_lowercase();
        let key = self.aliases.get(&wanted).unwrap_or(&wanted);
        self.generators
            .get(key)
            .cloned()
            .ok_or_else(|| UmlGenError::UnsupportedLanguage {
                language: language.to_string(),
                available: self.languages().join(", "),
            })
    }

    /// Registered language keys, sorted
    pub fn languages(&self) -> Vec<String> {
        self.generators.keys().cloned().collect()
    }

    /// Aliases resolving to `language`
    pub fn aliases_of(&self, language: &str) -> Vec<String> {
        let language = language.to_lowercase();
        self.aliases
            .iter()
            .filter(|(_, key)| **key == language)
            .map(|(alias, _)| alias.clone())
            .collect()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("languages", &self.languages())
            .field("aliases", &self.aliases)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_aliases() {
        let registry = GeneratorRegistry::with_defaults();
        assert_eq!(registry.languages(), vec!["csharp", "java", "php", "python", "typescript"]);
        assert_eq!(registry.resolve("Java").unwrap().language(), "java");
        assert_eq!(registry.resolve("spring-boot").unwrap().language(), "java");
        assert_eq!(registry.resolve("TS").unwrap().language(), "typescript");
        assert_eq!(registry.resolve("django").unwrap().language(), "python");
        assert_eq!(registry.resolve("efcore").unwrap().language(), "csharp");
        assert_eq!(registry.resolve("laravel").unwrap().language(), "php");
        assert_eq!(registry.aliases_of("python"), vec!["django"]);
    }

    #[test]
    fn test_unsupported_language() {
        let registry = GeneratorRegistry::with_defaults();
        let err = registry.resolve("cobol").err().unwrap();
        assert!(matches!(err, UmlGenError::UnsupportedLanguage { .. }));
        assert!(err.to_string().contains("java"));

        assert!(GeneratorRegistry::new().resolve("java").is_err());
    }
}
