//! Run log shown to the operator.
//!
//! Every pipeline step reports progress through [`RunLog`]. The indent level
//! is purely visual nesting (a step and its outcome), not a severity filter.
//! Unknown errors get their own channel so the orchestrator can distinguish
//! recognized failures from crashes in the report.

/// Visual nesting level of a report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    /// No indent; announces a step.
    Top,
    /// Small indent; outcome of a step.
    First,
    /// Medium indent; detail below an outcome.
    Second,
}

impl Indent {
    fn pad(self) -> &'static str {
        match self {
            Indent::Top => "",
            Indent::First => "  ",
            Indent::Second => "    ",
        }
    }
}

/// Sink for run progress lines.
///
/// Implementations must be callable from the worker thread while other
/// threads hold a reference (the GUI/console owner).
pub trait RunLog: Send + Sync {
    /// Log a progress line.
    fn info(&self, message: &str, indent: Indent);

    /// Log a recognized failure with a human-readable reason.
    fn error(&self, message: &str, indent: Indent);

    /// Log an unrecognized error with full diagnostic detail.
    fn unknown_error(&self, err: &anyhow::Error);
}

/// Formats a report line the way the console log prints it.
pub fn format_line(message: &str, indent: Indent) -> String {
    format!("{}>{message}", indent.pad())
}

/// Run log writing prompted lines to stdout/stderr.
#[derive(Debug, Default)]
pub struct ConsoleLog;

impl RunLog for ConsoleLog {
    fn info(&self, message: &str, indent: Indent) {
        println!("{}", format_line(message, indent));
    }

    fn error(&self, message: &str, indent: Indent) {
        eprintln!("{}", format_line(message, indent));
    }

    fn unknown_error(&self, err: &anyhow::Error) {
        eprintln!("{}", format_line("An unknown error occurred:", Indent::Top));
        // `{:#}` renders the whole context chain on one line.
        eprintln!("{err:#}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_prompted_and_indented() {
        assert_eq!(format_line("Starting...", Indent::Top), ">Starting...");
        assert_eq!(format_line("Done.", Indent::First), "  >Done.");
        assert_eq!(format_line("Detail.", Indent::Second), "    >Detail.");
    }
}
