//! Extension registry
//!
//! Collects one entry point per generated type, across both passes, in
//! discovery order. Assembled into a single unit at the end of the run.

use serde::Serialize;

use crate::assembler::{assemble, AssemblyOptions};
use crate::config::GeneratorConfig;
use crate::generator::{in_namespace, indent, split_qualified, DeclarationFragment, Role};
use crate::identity::TypeKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionEntry {
    pub key: TypeKey,
    pub display_name: String,
    pub role: Role,
    pub text: String,
}

/// Entry summary for run reports
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub display_name: String,
    pub role: Role,
}

#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    entries: Vec<ExtensionEntry>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, fragment: &DeclarationFragment) {
        self.entries.push(ExtensionEntry {
            key: fragment.key.clone(),
            display_name: fragment.display_name.clone(),
            role: fragment.role,
            text: fragment.extension.clone(),
        });
    }

    pub fn entries(&self) -> &[ExtensionEntry] {
        &self.entries
    }

    pub fn summaries(&self) -> Vec<EntrySummary> {
        self.entries
            .iter()
            .map(|e| EntrySummary {
                display_name: e.display_name.clone(),
                role: e.role,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The combined extension unit, `None` when nothing was registered
    pub fn assemble(&self, config: &GeneratorConfig) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }

        let (ns, class_name) = split_qualified(&config.extension_type);
        let members: Vec<&str> = self.entries.iter().map(|e| e.text.as_str()).collect();
        let class = format!(
            "internal static partial class {}\n{{\n{}\n}}",
            class_name,
            indent(&members.join("\n\n"), 1)
        );

        assemble(&[in_namespace(ns, &class)], &AssemblyOptions::from(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(name: &str, role: Role) -> DeclarationFragment {
        DeclarationFragment {
            key: TypeKey::new(name, 0),
            display_name: name.to_string(),
            role,
            declaration: String::new(),
            extension: format!("public static void {}Entry() {{ }}", name.replace('.', "_")),
        }
    }

    #[test]
    fn empty_registry_assembles_nothing() {
        let registry = ExtensionRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.assemble(&GeneratorConfig::default()).is_none());
    }

    #[test]
    fn entries_keep_discovery_order() {
        let mut registry = ExtensionRegistry::new();
        registry.register(&fragment("Demo.B", Role::Instance));
        registry.register(&fragment("Demo.A", Role::Instance));
        registry.register(&fragment("Demo.A", Role::Static));

        let order: Vec<(&str, Role)> = registry
            .entries()
            .iter()
            .map(|e| (e.display_name.as_str(), e.role))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Demo.B", Role::Instance),
                ("Demo.A", Role::Instance),
                ("Demo.A", Role::Static)
            ]
        );
    }

    #[test]
    fn combined_unit_wraps_all_entries_once() {
        let mut registry = ExtensionRegistry::new();
        registry.register(&fragment("Demo.A", Role::Instance));
        registry.register(&fragment("Demo.B", Role::Static));

        let text = registry.assemble(&GeneratorConfig::default()).unwrap();
        assert_eq!(text.matches("partial class ObservableEventsExtensions").count(), 1);
        assert!(text.contains("namespace ReactiveMarbles.ObservableEvents"));
        assert!(text.contains("Demo_AEntry"));
        assert!(text.contains("Demo_BEntry"));
        assert!(text.find("Demo_AEntry") < text.find("Demo_BEntry"));
    }
}
