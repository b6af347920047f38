//! Static event wrappers

use std::collections::HashSet;
use std::sync::Arc;

use tracing::trace;

use super::{
    cref, in_namespace, indent, observable_property, qualify, source_type, type_param_list,
    wrapper_name, DeclarationFragment, EventGenerator, Role,
};
use crate::symbols::{Resolver, TypeDescriptor};

/// Wraps the static events of a type
///
/// A forced wrapper for a type without static events of its own forwards
/// the static events of its ancestors; C# static members are not reachable
/// through a derived wrapper, so each one is re-exposed against the type
/// that declares it.
pub struct StaticEventGenerator<'a> {
    resolver: &'a dyn Resolver,
}

impl<'a> StaticEventGenerator<'a> {
    pub fn new(resolver: &'a dyn Resolver) -> Self {
        Self { resolver }
    }

    /// Properties for the static events declared on `declared`'s ancestors,
    /// nearest first. A name already taken by a nearer ancestor is skipped.
    fn inherited_members(&self, declared: &TypeDescriptor) -> Vec<String> {
        let ancestors = self.resolver.ancestors(declared);
        let mut taken: HashSet<&str> = HashSet::new();
        let mut members = Vec::new();

        for ancestor in &ancestors {
            let target = qualify(&ancestor.instantiated_name());
            for event in ancestor.decl().static_events() {
                if taken.insert(event.name.as_str()) {
                    members.push(observable_property(ancestor.decl(), event, &target));
                }
            }
        }
        members
    }
}

/// Entry-point name, injective over qualified name + arity
///
/// `_` -> `__`, `.` -> `_p`, arity -> `_a<N>`. Every `_` in the output starts
/// a two-character token, so distinct types never share an entry point.
fn entry_point_name(ty: &TypeDescriptor) -> String {
    let mut name = String::with_capacity(ty.name().len() + 16);
    for c in ty.name().chars() {
        match c {
            '_' => name.push_str("__"),
            '.' => name.push_str("_p"),
            c => name.push(c),
        }
    }
    if ty.arity() > 0 {
        name.push_str(&format!("_a{}", ty.arity()));
    }
    name.push_str("StaticEvents");
    name
}

impl EventGenerator for StaticEventGenerator<'_> {
    fn role(&self) -> Role {
        Role::Static
    }

    fn generate(&self, ty: &TypeDescriptor, always_generate: bool) -> Option<DeclarationFragment> {
        let decl = ty.decl();
        let has_own = decl.static_events().next().is_some();
        if !has_own && !always_generate {
            trace!(ty = %ty, "no static events");
            return None;
        }

        let wrapper = wrapper_name(decl, Role::Static);
        let params = type_param_list(decl);
        let source = source_type(decl);

        let members: Vec<String> = if has_own {
            decl.static_events()
                .map(|event| observable_property(decl, event, &source))
                .collect()
        } else {
            let declared = TypeDescriptor::declared(Arc::clone(ty.decl_arc()));
            self.inherited_members(&declared)
        };

        let body = if members.is_empty() {
            format!(
                "/// <summary>\n/// Wraps the static events of <see cref=\"{}\"/> as observables.\n/// </summary>\npublic sealed class {}{}\n{{\n}}",
                cref(decl),
                wrapper,
                params
            )
        } else {
            format!(
                "/// <summary>\n/// Wraps the static events of <see cref=\"{}\"/> as observables.\n/// </summary>\npublic sealed class {}{}\n{{\n{}\n}}",
                cref(decl),
                wrapper,
                params,
                indent(&members.join("\n\n"), 1)
            )
        };

        let ns = decl
            .namespace()
            .map(|ns| format!("{}.", ns))
            .unwrap_or_default();
        let extension = format!(
            r#"/// <summary>
/// Gets observables for the static events of <see cref="{cref}"/>.
/// </summary>
/// <returns>The observable wrapper.</returns>
public static global::{ns}{wrapper}{params} {entry}{params}() => new();"#,
            cref = cref(decl),
            ns = ns,
            wrapper = wrapper,
            params = params,
            entry = entry_point_name(ty),
        );

        Some(DeclarationFragment {
            key: ty.key(),
            display_name: ty.display_name(),
            role: Role::Static,
            declaration: in_namespace(decl.namespace(), &body),
            extension,
        })
    }
}
