//! Structured validation failures
//!
//! A [`Diagnostic`] carries a primary location (a register or one of its
//! fields), a message, and one [`Note`] per contributing bit range, so a host
//! can render multi-note errors the way compilers do.

use std::fmt;

use crate::bit_range::BitRange;

/// Where a diagnostic points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Register(String),
    Field { register: String, field: String },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Register(register) => write!(f, "{register}"),
            Location::Field { register, field } => write!(f, "{register}.{field}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    OutOfBounds,
    ZeroWidthBitRange,
    OverlappingBitRanges,
    EmptyField,
    DuplicateFieldName,
}

/// Supporting detail attached to a diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// The bit range this note is about, when there is one
    pub range: Option<BitRange>,
    pub message: String,
    /// Overlapping sub-ranges of `range`, merged into continuous runs
    pub subranges: Vec<BitRange>,
}

impl Note {
    pub fn new(range: Option<BitRange>, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
            subranges: Vec::new(),
        }
    }

    pub fn with_subranges(mut self, subranges: Vec<BitRange>) -> Self {
        self.subranges = subranges;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: Location,
    pub kind: DiagnosticKind,
    pub message: String,
    pub notes: Vec<Note>,
}

impl Diagnostic {
    pub fn new(location: Location, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            location,
            kind,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn with_notes(mut self, notes: Vec<Note>) -> Self {
        self.notes = notes;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: error: {}", self.location, self.message)?;
        for note in &self.notes {
            write!(f, "\n    note: {}", note.message)?;
        }
        Ok(())
    }
}

/// Every diagnostic produced for one register layout
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("register '{register}' failed validation with {} diagnostic(s)", .diagnostics.len())]
pub struct ValidationError {
    pub register: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationError {
    /// Diagnostics of one kind, in emission order
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    /// Full multi-line rendering of every diagnostic
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (index, diagnostic) in self.diagnostics.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&diagnostic.to_string());
        }
        out
    }
}

/// Join items as `'a'`, `'a' and 'b'`, or `'a', 'b', and 'c'`
pub(crate) fn quoted_list<T: fmt::Display>(items: &[T]) -> String {
    list(items.iter().map(|item| format!("'{item}'")).collect())
}

pub(crate) fn list(items: Vec<String>) -> String {
    match items.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

/// `""` or `"s"` depending on `count`
pub(crate) fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
