//! End-to-end pipeline tests
//!
//! Each test loads a snapshot, runs the whole pipeline into memory and checks
//! the artifact set, the extension unit and the diagnostics.

use obsgen::assembler::{AUTO_GENERATED_MARKER, EXTENSIONS_ARTIFACT, PREAMBLE_ARTIFACT};
use obsgen::{Compilation, Diagnostic, GeneratorConfig, MemorySink, Pipeline, RunReport};

struct Outcome {
    sink: MemorySink,
    report: RunReport,
    diagnostics: Vec<Diagnostic>,
}

fn run(yaml: &str) -> Outcome {
    run_with_config(yaml, &GeneratorConfig::default())
}

fn run_with_config(yaml: &str, config: &GeneratorConfig) -> Outcome {
    let compilation = Compilation::from_yaml(yaml, config).unwrap();
    let mut sink = MemorySink::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let report = Pipeline::new(config)
        .run(&compilation, compilation.candidates(), &mut sink, &mut diagnostics)
        .unwrap();
    Outcome {
        sink,
        report,
        diagnostics,
    }
}

// ============================================================================
// Inheritance chains
// ============================================================================

const INHERITED_YAML: &str = r#"
types:
  - name: Bar
    events:
      - { name: Changed, handler: System.EventHandler, args: System.EventArgs }
  - name: Foo
    base: Bar
candidates:
  instance:
    - { type_args: [Foo], location: { file: App.cs, line: 4, column: 9 } }
"#;

#[test]
fn root_without_own_events_inherits_wrapper() {
    let outcome = run(INHERITED_YAML);

    assert_eq!(
        outcome.sink.names(),
        vec![
            PREAMBLE_ARTIFACT,
            "SourceClassFoo-InstanceEvents.SourceGenerated.cs",
            "SourceClassBar-InstanceEvents.SourceGenerated.cs",
            EXTENSIONS_ARTIFACT,
        ]
    );
    assert!(outcome.diagnostics.is_empty());

    let foo = outcome
        .sink
        .get("SourceClassFoo-InstanceEvents.SourceGenerated.cs")
        .unwrap();
    assert!(foo.text.starts_with(AUTO_GENERATED_MARKER));
    assert!(foo.text.contains("RxFooEvents"));
    assert!(foo.text.contains("RxBarEvents"));
}

#[test]
fn extension_unit_lists_every_generated_type() {
    let outcome = run(INHERITED_YAML);

    let names: Vec<&str> = outcome
        .report
        .extensions
        .iter()
        .map(|e| e.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["Foo", "Bar"]);

    let extensions = outcome.sink.get(EXTENSIONS_ARTIFACT).unwrap();
    assert_eq!(
        extensions.text.matches("partial class ObservableEventsExtensions").count(),
        1
    );
    assert!(extensions.text.contains("RxFooEvents Events("));
    assert!(extensions.text.contains("RxBarEvents Events("));
}

#[test]
fn hierarchy_without_events_warns_once() {
    let outcome = run(
        r#"
types:
  - name: Root
  - name: Leaf
    base: Root
candidates:
  instance:
    - { type_args: [Leaf], location: { file: Program.cs, line: 12, column: 5 } }
"#,
    );

    assert_eq!(outcome.sink.names(), vec![PREAMBLE_ARTIFACT]);
    assert_eq!(outcome.diagnostics.len(), 1);

    let warning = &outcome.diagnostics[0];
    assert_eq!(warning.code, "RXM001");
    assert_eq!(
        warning.message,
        "Type 'Leaf' has no events and does not inherit any events."
    );
    assert_eq!(warning.location.file, "Program.cs");
    assert_eq!(warning.location.line, 12);
    assert_eq!(outcome.report.warning_count(), 1);
}

#[test]
fn shared_ancestor_is_emitted_once() {
    let outcome = run(
        r#"
types:
  - name: Common
    events:
      - { name: Disposed, handler: System.EventHandler, args: System.EventArgs }
  - name: A
    base: Common
  - name: B
    base: Common
candidates:
  instance:
    - { type_args: [A] }
    - { type_args: [B] }
"#,
    );

    assert_eq!(outcome.report.extensions.len(), 3);
    let common = outcome
        .sink
        .names()
        .into_iter()
        .filter(|n| n.contains("Common"))
        .count();
    assert_eq!(common, 1);
    assert_eq!(
        outcome.sink.names().iter().filter(|n| **n == EXTENSIONS_ARTIFACT).count(),
        1
    );
    assert!(outcome.diagnostics.is_empty());
}

// ============================================================================
// Instance and static passes
// ============================================================================

#[test]
fn both_passes_generate_for_the_same_type() {
    let outcome = run(
        r#"
types:
  - name: Shared
    events:
      - { name: Changed, handler: System.EventHandler, args: System.EventArgs }
      - { name: Created, handler: System.EventHandler, args: System.EventArgs, static: true }
candidates:
  instance:
    - { type_args: [Shared] }
  static:
    - { argument: "typeof(Shared)" }
"#,
    );

    assert_eq!(
        outcome.sink.names(),
        vec![
            PREAMBLE_ARTIFACT,
            "SourceClassShared-InstanceEvents.SourceGenerated.cs",
            "SourceClassShared-StaticEvents.SourceGenerated.cs",
            EXTENSIONS_ARTIFACT,
        ]
    );
    assert_eq!(outcome.report.extensions.len(), 2);
}

#[test]
fn static_root_without_any_events_warns() {
    let outcome = run(
        r#"
types:
  - name: Demo.Plain
candidates:
  static:
    - { argument: Demo.Plain, location: { file: Widgets.cs, line: 2 } }
"#,
    );

    assert_eq!(outcome.sink.names(), vec![PREAMBLE_ARTIFACT]);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].message.contains("'Demo.Plain'"));
}

#[test]
fn static_root_with_only_instance_events_gets_empty_wrapper() {
    let outcome = run(
        r#"
types:
  - name: Demo.Widget
    events:
      - { name: Clicked, handler: System.EventHandler, args: System.EventArgs }
candidates:
  static:
    - { argument: Demo.Widget }
"#,
    );

    let widget = outcome
        .sink
        .get("SourceClassDemo.Widget-StaticEvents.SourceGenerated.cs")
        .unwrap();
    assert!(widget.text.contains("public sealed class RxWidgetStaticEvents"));
    assert!(!widget.text.contains("IObservable"));
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn static_root_inheriting_static_events_gets_a_wrapper() {
    let outcome = run(
        r#"
types:
  - name: Demo.Base
    events:
      - { name: Tick, handler: System.Action, static: true }
  - name: Demo.Derived
    base: Demo.Base
candidates:
  static:
    - { argument: "typeof(Demo.Derived)" }
"#,
    );

    assert_eq!(
        outcome.sink.names(),
        vec![
            PREAMBLE_ARTIFACT,
            "SourceClassDemo.Derived-StaticEvents.SourceGenerated.cs",
            "SourceClassDemo.Base-StaticEvents.SourceGenerated.cs",
            EXTENSIONS_ARTIFACT,
        ]
    );
    assert!(outcome.diagnostics.is_empty());

    let derived = outcome
        .sink
        .get("SourceClassDemo.Derived-StaticEvents.SourceGenerated.cs")
        .unwrap();
    assert!(derived.text.contains("x => global::Demo.Base.Tick += x"));

    let extensions = outcome.sink.get(EXTENSIONS_ARTIFACT).unwrap();
    assert!(extensions.text.contains("Demo_pDerivedStaticEvents()"));
    assert!(extensions.text.contains("Demo_pBaseStaticEvents()"));
}

#[test]
fn static_entry_points_stay_distinct() {
    let outcome = run(
        r#"
types:
  - name: Demo.Clock
    events:
      - { name: Tick, handler: System.Action, static: true }
  - name: Demo_Clock
    events:
      - { name: Tick, handler: System.Action, static: true }
candidates:
  static:
    - { argument: Demo.Clock }
    - { argument: Demo_Clock }
"#,
    );

    let extensions = outcome.sink.get(EXTENSIONS_ARTIFACT).unwrap();
    assert_eq!(extensions.text.matches(" Demo_pClockStaticEvents()").count(), 1);
    assert_eq!(extensions.text.matches(" Demo__ClockStaticEvents()").count(), 1);
    assert_eq!(outcome.report.extensions.len(), 2);
}

#[test]
fn generic_roots_get_brace_names() {
    let outcome = run(
        r#"
types:
  - name: Demo.Box
    type_params: [T, U]
    events:
      - { name: Filled, handler: "System.Action<T>", args: T }
candidates:
  instance:
    - { type_args: ["Demo.Box<int, string>"] }
    - { type_args: ["Demo.Box<string, int>"] }
"#,
    );

    let generated: Vec<&str> = outcome
        .sink
        .names()
        .into_iter()
        .filter(|n| n.starts_with("SourceClass"))
        .collect();
    assert_eq!(
        generated,
        vec!["SourceClassDemo.Box{T,U}-InstanceEvents.SourceGenerated.cs"]
    );
    assert!(outcome.diagnostics.is_empty());
}

// ============================================================================
// Run-level properties
// ============================================================================

#[test]
fn repeated_runs_are_identical() {
    let first = run(INHERITED_YAML);
    let second = run(INHERITED_YAML);

    assert_eq!(first.sink.artifacts(), second.sink.artifacts());
}

#[test]
fn nothing_to_generate_leaves_only_the_preamble() {
    let outcome = run(
        r#"
types:
  - name: Demo.Bar
    events:
      - { name: Changed, handler: System.EventHandler, args: System.EventArgs }
"#,
    );

    assert_eq!(outcome.sink.names(), vec![PREAMBLE_ARTIFACT]);
    assert!(outcome.report.extensions.is_empty());
    assert!(outcome.report.roots.is_empty());
}

#[test]
fn unrelated_candidates_are_ignored_silently() {
    let outcome = run(
        r#"
types:
  - name: Demo.Bar
    events:
      - { name: Changed, handler: System.EventHandler, args: System.EventArgs }
  - name: Demo.Other
    static: true
candidates:
  instance:
    - { container: Demo.Other, type_args: [Demo.Bar] }
    - { type_args: [Demo.Missing] }
"#,
    );

    assert_eq!(outcome.sink.names(), vec![PREAMBLE_ARTIFACT]);
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn nullable_context_follows_config() {
    let config = GeneratorConfig::from_yaml("nullable_context: false\n").unwrap();
    let outcome = run_with_config(INHERITED_YAML, &config);

    for artifact in outcome.sink.artifacts() {
        assert!(!artifact.text.contains("#nullable enable"), "{}", artifact.name);
    }

    let default = run(INHERITED_YAML);
    let bar = default
        .sink
        .get("SourceClassBar-InstanceEvents.SourceGenerated.cs")
        .unwrap();
    assert!(bar.text.contains("#nullable enable"));
}
