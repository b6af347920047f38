//! Instance event wrappers

use std::sync::Arc;

use tracing::trace;

use super::{
    cref, in_namespace, indent, observable_property, qualified_wrapper, source_type,
    type_param_list, wrapper_name, DeclarationFragment, EventGenerator, Role,
};
use crate::symbols::{Resolver, TypeDescriptor};

/// Wraps an instance so each of its events becomes an `IObservable<T>`
///
/// A wrapper derives from the wrapper of the nearest ancestor declaring
/// instance events, so inherited events are reachable without repeating
/// them.
pub struct InstanceEventGenerator<'a> {
    resolver: &'a dyn Resolver,
}

impl<'a> InstanceEventGenerator<'a> {
    pub fn new(resolver: &'a dyn Resolver) -> Self {
        Self { resolver }
    }

    /// Nearest ancestor with instance events, over the declared parameters
    fn base_wrapper(&self, declared: &TypeDescriptor) -> Option<String> {
        self.resolver
            .ancestors(declared)
            .into_iter()
            .find(|a| a.decl().instance_events().next().is_some())
            .map(|a| qualified_wrapper(&a, Role::Instance))
    }
}

impl EventGenerator for InstanceEventGenerator<'_> {
    fn role(&self) -> Role {
        Role::Instance
    }

    fn generate(&self, ty: &TypeDescriptor, always_generate: bool) -> Option<DeclarationFragment> {
        let decl = ty.decl();
        let has_own = decl.instance_events().next().is_some();
        if !has_own && !always_generate {
            trace!(ty = %ty, "no instance events");
            return None;
        }

        // Wrappers are generic over the declaration, whichever
        // instantiation reached us first.
        let declared = TypeDescriptor::declared(Arc::clone(ty.decl_arc()));
        let base = self.base_wrapper(&declared);
        let wrapper = wrapper_name(decl, Role::Instance);
        let params = type_param_list(decl);
        let source = source_type(decl);

        let mut body = String::new();
        body.push_str(&format!(
            "/// <summary>\n/// Wraps the events of <see cref=\"{}\"/> as observables.\n/// </summary>\n",
            cref(decl)
        ));
        match &base {
            Some(base) => body.push_str(&format!("public class {}{} : {}\n{{\n", wrapper, params, base)),
            None => body.push_str(&format!("public class {}{}\n{{\n", wrapper, params)),
        }

        let mut members = vec![format!("private readonly {} _data;", source)];
        let chain = if base.is_some() { "\n    : base(data)" } else { "" };
        members.push(format!(
            r#"/// <summary>
/// Initializes a new instance of the <see cref="{wrapper}{cref_params}"/> class.
/// </summary>
/// <param name="data">The instance to wrap.</param>
public {wrapper}({source} data){chain}
{{
    _data = data;
}}"#,
            wrapper = wrapper,
            cref_params = params.replace('<', "{").replace('>', "}"),
            source = source,
            chain = chain,
        ));
        for event in decl.instance_events() {
            members.push(observable_property(decl, event, "_data"));
        }

        body.push_str(&indent(&members.join("\n\n"), 1));
        body.push_str("\n}");

        let extension = format!(
            r#"/// <summary>
/// Gets observables for the events of <see cref="{cref}"/>.
/// </summary>
/// <param name="item">The instance whose events are wrapped.</param>
/// <returns>The observable wrapper.</returns>
public static {wrapper_type} Events{params}(this {source} item) => new(item);"#,
            cref = cref(decl),
            wrapper_type = qualified_wrapper(&declared, Role::Instance),
            params = params,
            source = source,
        );

        Some(DeclarationFragment {
            key: ty.key(),
            display_name: ty.display_name(),
            role: Role::Instance,
            declaration: in_namespace(decl.namespace(), &body),
            extension,
        })
    }
}
