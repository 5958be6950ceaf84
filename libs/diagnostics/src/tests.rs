use test_log::test;

use crate::*;

#[derive(Debug, Clone)]
pub struct MissingPort {
    port: &'static str,
    severity: Severity,
}

impl Display for MissingPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: port `{}` not found", self.severity, self.port)
    }
}

impl Diagnostic for MissingPort {
    fn severity(&self) -> Severity {
        self.severity
    }
}

fn issue(port: &'static str, severity: Severity) -> MissingPort {
    MissingPort { port, severity }
}

#[test]
fn issue_set_counters() {
    let mut issues = IssueSet::new();
    issues.add(issue("a", Severity::Info));
    assert_eq!(issues.num_errors(), 0);
    assert_eq!(issues.num_warnings(), 0);
    assert!(!issues.has_warning());
    issues.add_and_log(issue("b", Severity::Warning));
    assert_eq!(issues.num_warnings(), 1);
    assert!(!issues.has_error());
    issues.add_and_log(issue("c", Severity::Error));
    assert_eq!(issues.num_errors(), 1);
    assert!(issues.has_error());
    assert_eq!(issues.len(), 3);

    issues.clear();
    assert!(issues.is_empty());
    assert_eq!(issues.num_warnings(), 0);
    assert_eq!(issues.num_errors(), 0);
}

#[test]
fn extend_counts_each_issue() {
    let mut issues = IssueSet::new();
    issues.extend([
        issue("a", Severity::Warning),
        issue("b", Severity::Warning),
        issue("c", Severity::Info),
    ]);
    assert_eq!(issues.num_warnings(), 2);
    let warned: Vec<_> = issues
        .with_severity(Severity::Warning)
        .map(|issue| issue.port)
        .collect();
    assert_eq!(warned, ["a", "b"]);
}

#[test]
fn display_lists_issues_in_order() {
    let mut issues = IssueSet::new();
    issues.add(issue("a", Severity::Warning));
    issues.add(issue("b", Severity::Error));
    assert_eq!(
        issues.to_string(),
        "warning: port `a` not found\nerror: port `b` not found\n"
    );
}

#[test]
fn severity_levels() {
    assert_eq!(Severity::default(), Severity::Warning);
    assert!(Severity::Info < Severity::Error);
}

#[test]
fn default_help_is_none() {
    assert!(issue("a", Severity::Warning).help().is_none());
}
