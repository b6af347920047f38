//! Generator capability
//!
//! A generator turns one visited type into a declaration fragment, or
//! declines with `None`. The walker never looks inside a fragment; it only
//! routes it to the assembler and the extension registry.
//!
//! Two variants exist, one per pass:
//! - `InstanceEventGenerator`: wrapper around an instance, inherits the
//!   wrapper of the nearest event-bearing ancestor
//! - `StaticEventGenerator`: wrapper around the static events of a type

mod instance;
mod static_events;

pub use instance::InstanceEventGenerator;
pub use static_events::StaticEventGenerator;

use std::fmt;

use serde::Serialize;

use crate::config::GeneratorConfig;
use crate::identity::TypeKey;
use crate::symbols::{EventDecl, TypeDecl, TypeDescriptor, TypeRef};

/// Which pass a generator (and its output) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    Instance,
    Static,
}

impl Role {
    /// Tag used in artifact names (`-InstanceEvents`, `-StaticEvents`)
    pub fn tag(self) -> &'static str {
        match self {
            Role::Instance => "Instance",
            Role::Static => "Static",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Generated content for exactly one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationFragment {
    pub key: TypeKey,
    /// Declared display name of the source type (`Demo.Box<T>`)
    pub display_name: String,
    pub role: Role,
    /// The wrapper declaration, namespace included
    pub declaration: String,
    /// Entry-point member for the combined extension unit
    pub extension: String,
}

pub trait EventGenerator {
    fn role(&self) -> Role;

    /// Produce the wrapper for `ty`, or `None` when there is nothing to wrap
    fn generate(&self, ty: &TypeDescriptor, always_generate: bool) -> Option<DeclarationFragment>;
}

// ============================================================================
// FIXED TEXT
// ============================================================================

/// Declarations every run emits before looking at any candidate
pub fn preamble(config: &GeneratorConfig) -> String {
    let (ext_ns, ext_name) = split_qualified(&config.extension_type);
    let (attr_ns, attr_name) = split_qualified(&config.static_attribute);

    let extensions = format!(
        r#"/// <summary>
/// Entry points for the generated observable event wrappers.
/// </summary>
internal static partial class {ext_name}
{{
    /// <summary>
    /// Fallback for types without generated wrappers.
    /// </summary>
    /// <typeparam name="T">The type of the event host.</typeparam>
    /// <param name="eventHost">The instance whose events are requested.</param>
    /// <returns>An empty wrapper.</returns>
    public static global::{ext_ns_dot}NullEvents Events<T>(this T eventHost) => default;
}}

/// <summary>
/// Returned for types that have no generated wrapper.
/// </summary>
internal readonly struct NullEvents
{{
}}"#,
        ext_name = ext_name,
        ext_ns_dot = ext_ns.map(|ns| format!("{}.", ns)).unwrap_or_default(),
    );

    let attribute = format!(
        r#"/// <summary>
/// Requests observable wrappers for the static events of a type.
/// </summary>
[global::System.AttributeUsage(global::System.AttributeTargets.Assembly, AllowMultiple = true)]
internal sealed class {attr_name} : global::System.Attribute
{{
    /// <summary>
    /// Initializes a new instance of the <see cref="{attr_name}"/> class.
    /// </summary>
    /// <param name="type">The type whose static events are wrapped.</param>
    public {attr_name}(global::System.Type type) => Type = type;

    /// <summary>
    /// Gets the type whose static events are wrapped.
    /// </summary>
    public global::System.Type Type {{ get; }}
}}"#,
        attr_name = attr_name,
    );

    if ext_ns == attr_ns {
        in_namespace(ext_ns, &format!("{}\n\n{}", extensions, attribute))
    } else {
        format!(
            "{}\n\n{}",
            in_namespace(ext_ns, &extensions),
            in_namespace(attr_ns, &attribute)
        )
    }
}

// ============================================================================
// RENDERING HELPERS
// ============================================================================

pub(crate) fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.rsplit_once('.') {
        Some((ns, simple)) => (Some(ns), simple),
        None => (None, name),
    }
}

/// Prefix every dotted name in a type reference with `global::`
pub(crate) fn qualify(text: &str) -> String {
    match TypeRef::parse(text) {
        Ok(r) => qualify_ref(&r),
        Err(_) => text.to_string(),
    }
}

fn qualify_ref(r: &TypeRef) -> String {
    let name = if r.name.contains('.') {
        format!("global::{}", r.name)
    } else {
        r.name.clone()
    };
    if r.args.is_empty() {
        return name;
    }
    let args: Vec<String> = r.args.iter().map(qualify_ref).collect();
    format!("{}<{}>", name, args.join(", "))
}

/// `<T, U>` or empty
pub(crate) fn type_param_list(decl: &TypeDecl) -> String {
    if decl.type_params.is_empty() {
        return String::new();
    }
    let params: Vec<&str> = decl.type_params.iter().map(|p| p.as_ref()).collect();
    format!("<{}>", params.join(", "))
}

/// Documentation reference form, `global::Demo.Box{T}`
pub(crate) fn cref(decl: &TypeDecl) -> String {
    let params = type_param_list(decl).replace('<', "{").replace('>', "}");
    format!("global::{}{}", decl.name, params)
}

/// Fully qualified source type over its own parameters, `global::Demo.Box<T>`
pub(crate) fn source_type(decl: &TypeDecl) -> String {
    format!("global::{}{}", decl.name, type_param_list(decl))
}

pub(crate) fn wrapper_name(decl: &TypeDecl, role: Role) -> String {
    match role {
        Role::Instance => format!("Rx{}Events", decl.simple_name()),
        Role::Static => format!("Rx{}StaticEvents", decl.simple_name()),
    }
}

/// Fully qualified wrapper of `ty`, carrying `ty`'s type arguments
pub(crate) fn qualified_wrapper(ty: &TypeDescriptor, role: Role) -> String {
    let decl = ty.decl();
    let ns = decl
        .namespace()
        .map(|ns| format!("{}.", ns))
        .unwrap_or_default();
    let args: Vec<String> = ty.type_args().iter().map(|a| qualify(a)).collect();
    let args = if args.is_empty() {
        String::new()
    } else {
        format!("<{}>", args.join(", "))
    };
    format!("global::{}{}{}", ns, wrapper_name(decl, role), args)
}

/// Wrap `body` in a namespace block (no block for the global namespace)
pub(crate) fn in_namespace(ns: Option<&str>, body: &str) -> String {
    match ns {
        Some(ns) => format!("namespace {}\n{{\n{}\n}}", ns, indent(body, 1)),
        None => body.to_string(),
    }
}

pub(crate) fn indent(text: &str, levels: usize) -> String {
    let pad = "    ".repeat(levels);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_event_handler(handler: &str) -> bool {
    let name = TypeRef::parse(handler)
        .map(|r| r.name)
        .unwrap_or_else(|_| handler.to_string());
    name.ends_with("EventHandler")
}

/// One `IObservable<T>` property forwarding `event` declared on `owner`
///
/// `target` is the expression events are attached to: the wrapped instance
/// field or the qualified source type for static events.
pub(crate) fn observable_property(owner: &TypeDecl, event: &EventDecl, target: &str) -> String {
    let handler = qualify(&event.handler);
    let sender_style = is_event_handler(&event.handler);
    let (payload, conversion) = match &event.args {
        Some(args) if sender_style => (qualify(args), "h => (sender, e) => h(e)".to_string()),
        Some(args) => (qualify(args), "h => e => h(e)".to_string()),
        None if sender_style => (
            "global::System.Reactive.Unit".to_string(),
            "h => (sender, e) => h(global::System.Reactive.Unit.Default)".to_string(),
        ),
        None => (
            "global::System.Reactive.Unit".to_string(),
            "h => () => h(global::System.Reactive.Unit.Default)".to_string(),
        ),
    };

    format!(
        r#"/// <summary>
/// Gets an observable which signals when the <see cref="{cref}.{name}"/> event triggers.
/// </summary>
public global::System.IObservable<{payload}> {name} => global::System.Reactive.Linq.Observable.FromEvent<{handler}, {payload}>({conversion}, x => {target}.{name} += x, x => {target}.{name} -= x);"#,
        cref = cref(owner),
        name = event.name,
        payload = payload,
        handler = handler,
        conversion = conversion,
        target = target,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn decl(name: &str, params: &[&str]) -> TypeDecl {
        TypeDecl {
            name: name.into(),
            type_params: params.iter().map(|p| Arc::from(*p)).collect(),
            is_static: false,
            base: None,
            events: Vec::new(),
        }
    }

    #[test]
    fn qualify_prefixes_dotted_names_only() {
        assert_eq!(qualify("System.EventArgs"), "global::System.EventArgs");
        assert_eq!(qualify("int"), "int");
        assert_eq!(
            qualify("System.EventHandler<Demo.Args<T>>"),
            "global::System.EventHandler<global::Demo.Args<T>>"
        );
    }

    #[test]
    fn names_for_generic_declarations() {
        let boxed = decl("Demo.Box", &["T", "U"]);
        assert_eq!(type_param_list(&boxed), "<T, U>");
        assert_eq!(cref(&boxed), "global::Demo.Box{T, U}");
        assert_eq!(source_type(&boxed), "global::Demo.Box<T, U>");
        assert_eq!(wrapper_name(&boxed, Role::Instance), "RxBoxEvents");
        assert_eq!(wrapper_name(&boxed, Role::Static), "RxBoxStaticEvents");
    }

    #[test]
    fn qualified_wrapper_carries_arguments() {
        let boxed = Arc::new(decl("Demo.Box", &["T"]));
        let ty = TypeDescriptor::new(boxed, vec!["Demo.Item".into()]);
        assert_eq!(
            qualified_wrapper(&ty, Role::Instance),
            "global::Demo.RxBoxEvents<global::Demo.Item>"
        );
    }

    #[test]
    fn global_namespace_has_no_block() {
        assert_eq!(in_namespace(None, "class A {}"), "class A {}");
        assert_eq!(
            in_namespace(Some("Demo"), "class A\n{\n}"),
            "namespace Demo\n{\n    class A\n    {\n    }\n}"
        );
    }

    #[test]
    fn property_for_sender_style_handler() {
        let owner = decl("Demo.Bar", &[]);
        let event = EventDecl {
            name: "Changed".to_string(),
            handler: "System.EventHandler".to_string(),
            args: Some("System.EventArgs".to_string()),
            is_static: false,
        };
        let text = observable_property(&owner, &event, "_data");
        assert!(text.contains("global::System.IObservable<global::System.EventArgs> Changed"));
        assert!(text.contains("h => (sender, e) => h(e)"));
        assert!(text.contains("x => _data.Changed += x"));
        assert!(text.contains("cref=\"global::Demo.Bar.Changed\""));
    }

    #[test]
    fn property_for_parameterless_delegate() {
        let owner = decl("Demo.Clock", &[]);
        let event = EventDecl {
            name: "Tick".to_string(),
            handler: "System.Action".to_string(),
            args: None,
            is_static: true,
        };
        let text = observable_property(&owner, &event, "global::Demo.Clock");
        assert!(text.contains("IObservable<global::System.Reactive.Unit> Tick"));
        assert!(text.contains("h => () => h(global::System.Reactive.Unit.Default)"));
    }

    #[test]
    fn preamble_declares_well_known_types() {
        let text = preamble(&GeneratorConfig::default());
        assert!(text.starts_with("namespace ReactiveMarbles.ObservableEvents\n{"));
        assert!(text.contains("internal static partial class ObservableEventsExtensions"));
        assert!(text.contains("internal sealed class GenerateStaticEventObservablesAttribute"));
    }
}
