//! The startup report confirming that `user`, `pass` and `code` were resolved.

use std::io::{self, Write};

use crate::config::SecretTriple;

pub const SEPARATOR: &str = "========================================";
pub const TITLE: &str = "Vault Connection Test";
pub const SUCCESS: &str = "Successfully retrieved secrets from Vault!";

/// Renders the nine line report. Values are substituted verbatim.
pub fn render_report(secrets: &SecretTriple) -> String {
    let lines = [
        SEPARATOR.to_string(),
        TITLE.to_string(),
        SEPARATOR.to_string(),
        format!("Username: {}", secrets.user),
        format!("Password: {}", secrets.pass),
        format!("Code: {}", secrets.code),
        SEPARATOR.to_string(),
        SUCCESS.to_string(),
        SEPARATOR.to_string(),
    ];
    let mut report = lines.join("\n");
    report.push('\n');
    report
}

/// Renders first, then writes the report in one call.
pub fn write_report<W: Write>(out: &mut W, secrets: &SecretTriple) -> io::Result<()> {
    out.write_all(render_report(secrets).as_bytes())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::{render_report, write_report, SEPARATOR};
    use crate::config::SecretTriple;

    fn lines(report: &str) -> Vec<&str> {
        report.lines().collect()
    }

    #[test]
    fn separator_is_forty_equals_signs() {
        assert_eq!(SEPARATOR.len(), 40);
        assert!(SEPARATOR.chars().all(|c| c == '='));
    }

    #[test]
    fn renders_exact_template() {
        let report = render_report(&SecretTriple::new("alice", "s3cr3t", "123456"));
        let expected = "\
========================================
Vault Connection Test
========================================
Username: alice
Password: s3cr3t
Code: 123456
========================================
Successfully retrieved secrets from Vault!
========================================
";
        assert_eq!(report, expected);
    }

    #[test]
    fn empty_values_keep_their_lines() {
        let report = render_report(&SecretTriple::new("", "", ""));
        let lines = lines(&report);
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[3], "Username: ");
        assert_eq!(lines[4], "Password: ");
        assert_eq!(lines[5], "Code: ");
    }

    #[test]
    fn special_characters_pass_through_verbatim() {
        let triple = SecretTriple::new("ünïcødé user", "p@ss=word: \"quoted\" \\", "%s {} $HOME");
        let report = render_report(&triple);
        let lines = lines(&report);
        assert_eq!(lines[3], "Username: ünïcødé user");
        assert_eq!(lines[4], "Password: p@ss=word: \"quoted\" \\");
        assert_eq!(lines[5], "Code: %s {} $HOME");
    }

    #[test]
    fn rendering_is_idempotent() {
        let triple = SecretTriple::new("alice", "s3cr3t", "123456");
        assert_eq!(render_report(&triple), render_report(&triple));

        let mut first = Vec::new();
        let mut second = Vec::new();
        write_report(&mut first, &triple).unwrap();
        write_report(&mut second, &triple).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, render_report(&triple).into_bytes());
    }
}
