use std::{collections::HashSet, sync::LazyLock};

use regex::{Regex, RegexBuilder};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-z]{2,}")
        .case_insensitive(true)
        .build()
        .expect("valid regex")
});

/// Unique addresses in order of first appearance. Duplicates are exact
/// matches, so `A@x.fr` and `a@x.fr` are both kept.
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|email| seen.insert(*email))
        .map(str::to_string)
        .collect()
}

pub fn to_csv(emails: &[String]) -> String {
    let mut out = String::from("email\n");
    for email in emails {
        if email.contains([',', '"']) {
            out.push('"');
            out.push_str(&email.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(email);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_unique_addresses_in_order() {
        let text = "Contact: bob@example.com, alice@test.FR; encore bob@example.com.";
        assert_eq!(
            extract_emails(text),
            vec!["bob@example.com".to_string(), "alice@test.FR".to_string()]
        );
    }

    #[test]
    fn ignores_text_without_addresses() {
        assert!(extract_emails("rien ici @ nulle part").is_empty());
    }

    #[test]
    fn csv_has_header_and_quotes_special_values() {
        let emails = vec!["a@b.fr".to_string(), "\"x\"@b.fr".to_string()];
        assert_eq!(to_csv(&emails), "email\na@b.fr\n\"\"\"x\"\"@b.fr\"\n");
    }
}
