//! Library cross-reference issues.
//!
//! Mismatches between a physical library and a timing library are not
//! fatal. They are collected as [`LibraryIssue`]s and logged as they are found.

use std::fmt::Display;

use arcstr::ArcStr;
use diagnostics::{Diagnostic, Severity};
use serde::{Deserialize, Serialize};

/// An issue found while cross-referencing libraries.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct LibraryIssue {
    cause: Cause,
    severity: Severity,
}

/// The cause of a [`LibraryIssue`].
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Cause {
    /// A physical master terminal has no port on the linked timing cell.
    MissingTimingPort {
        /// The timing library containing the linked cell.
        library: ArcStr,
        /// The cell name.
        cell: ArcStr,
        /// The physical port name.
        port: ArcStr,
    },
    /// A timing cell port has no terminal on the physical master.
    MissingPhysicalPort {
        /// The timing library containing the cell.
        library: ArcStr,
        /// The cell name.
        cell: ArcStr,
        /// The timing port name.
        port: ArcStr,
    },
    /// A bus bit repeats the index of another bit of the same bus.
    ///
    /// The repeated bit is left as a scalar port.
    DuplicateBusBit {
        /// The cell name.
        cell: ArcStr,
        /// The repeated bit port name.
        port: ArcStr,
    },
}

impl LibraryIssue {
    /// Creates a new library issue from the given cause and severity.
    pub(crate) fn new(cause: Cause, severity: Severity) -> Self {
        Self { cause, severity }
    }

    /// Gets the underlying cause of this issue.
    #[inline]
    pub fn cause(&self) -> &Cause {
        &self.cause
    }

    /// Creates a new library issue and logs it immediately.
    ///
    /// The log level will be selected according to the given severity.
    pub(crate) fn new_and_log(cause: Cause, severity: Severity) -> Self {
        let result = Self::new(cause, severity);
        result.log();
        result
    }
}

impl Diagnostic for LibraryIssue {
    fn severity(&self) -> Severity {
        self.severity
    }

    fn help(&self) -> Option<Box<dyn Display>> {
        Some(Box::new(match self.cause {
            Cause::MissingTimingPort { .. } => {
                "check that the timing library matches the physical library"
            }
            Cause::MissingPhysicalPort { .. } => {
                "check that the physical library matches the timing library"
            }
            Cause::DuplicateBusBit { .. } => "rename one of the bits so each index appears once",
        }))
    }
}

impl Display for LibraryIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cause)
    }
}

impl Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTimingPort {
                library,
                cell,
                port,
            } => write!(
                f,
                "missing timing port: physical macro `{}` pin `{}` missing from timing cell in `{}`",
                cell, port, library
            ),
            Self::MissingPhysicalPort {
                library,
                cell,
                port,
            } => write!(
                f,
                "missing physical port: timing cell `{}` pin `{}` from `{}` missing from physical macro",
                cell, port, library
            ),
            Self::DuplicateBusBit { cell, port } => write!(
                f,
                "duplicate bus bit: cell `{}` pin `{}` repeats an index of its bus",
                cell, port
            ),
        }
    }
}
