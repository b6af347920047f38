//! Diagnostics reported to the host
//!
//! The only diagnostic the core raises is the advisory "no events" warning,
//! once per requested root whose whole ancestor chain produced nothing.

use std::fmt;

use serde::Serialize;

use crate::symbols::Location;

/// Code of the "no events found" warning
pub const NO_EVENTS_FOUND: &str = "RXM001";

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
}

impl Diagnostic {
    /// Warning for a root with no events on itself or any ancestor
    pub fn no_events_found(display_name: &str, location: &Location) -> Self {
        Self {
            code: NO_EVENTS_FOUND,
            severity: Severity::Warning,
            message: format!(
                "Type '{}' has no events and does not inherit any events.",
                display_name
            ),
            location: location.clone(),
        }
    }
}

/// `App.cs(3,9): warning RXM001: ...`
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {}: {}",
            self.location, self.severity, self.code, self.message
        )
    }
}

/// Receiver of diagnostics
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards every diagnostic immediately and keeps a copy
pub struct Recorder<'a> {
    inner: &'a mut dyn DiagnosticSink,
    recorded: Vec<Diagnostic>,
}

impl<'a> Recorder<'a> {
    pub fn new(inner: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            inner,
            recorded: Vec::new(),
        }
    }

    pub fn recorded(&self) -> &[Diagnostic] {
        &self.recorded
    }

    pub fn into_recorded(self) -> Vec<Diagnostic> {
        self.recorded
    }
}

impl DiagnosticSink for Recorder<'_> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.recorded.push(diagnostic.clone());
        self.inner.report(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_events_warning_names_the_type() {
        let location = Location {
            file: "App.cs".to_string(),
            line: 3,
            column: 9,
        };
        let diagnostic = Diagnostic::no_events_found("Demo.Leaf", &location);

        assert_eq!(diagnostic.code, NO_EVENTS_FOUND);
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!(
            diagnostic.to_string(),
            "App.cs(3,9): warning RXM001: Type 'Demo.Leaf' has no events and does not inherit any events."
        );
    }

    #[test]
    fn vec_collects_reports() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.report(Diagnostic::no_events_found("A", &Location::default()));
        sink.report(Diagnostic::no_events_found("B", &Location::default()));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn recorder_forwards_as_it_records() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let mut recorder = Recorder::new(&mut sink);
        recorder.report(Diagnostic::no_events_found("A", &Location::default()));
        assert_eq!(recorder.recorded().len(), 1);

        let recorded = recorder.into_recorded();
        assert_eq!(recorded, sink);
    }
}
