//! Default query lists for the form under test

use super::Query;

/// Text entry candidates, most specific first
pub fn input_queries() -> Vec<Query> {
    vec![
        Query::new("text input", r#"input[type="text"]:visible"#),
        Query::new("textarea", "textarea:visible"),
        Query::new(
            "input",
            r#"input:not([type="hidden"]):not([type="password"]):not([type="checkbox"]):not([type="radio"]):visible"#,
        ),
    ]
}

/// Submit control candidates: labelled buttons in the given order, then
/// generic submit-typed controls
pub fn submit_queries(labels: &[String]) -> Vec<Query> {
    let mut queries: Vec<Query> = labels
        .iter()
        .map(|label| {
            Query::new(
                format!("button '{}'", label),
                format!(r#"button:has-text("{}"):visible"#, label.replace('"', r#"\""#)),
            )
        })
        .collect();

    queries.push(Query::new("submit input", r#"input[type="submit"]:visible"#));
    queries.push(Query::new("submit button", r#"button[type="submit"]:visible"#));
    queries
}

/// On-screen error indicators; the label is the selector as configured
pub fn error_queries(selectors: &[String]) -> Vec<Query> {
    selectors
        .iter()
        .map(|selector| Query::new(selector.as_str(), format!("{}:visible", selector)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_priority() {
        let queries = input_queries();
        assert_eq!(queries.len(), 3);
        assert!(queries[0].selector.starts_with(r#"input[type="text"]"#));
        assert!(queries[1].selector.starts_with("textarea"));
        assert!(queries[2].selector.contains(r#":not([type="password"])"#));
    }

    #[test]
    fn test_submit_labels_come_first() {
        let labels = vec!["送信".to_string(), "保存".to_string()];
        let queries = submit_queries(&labels);
        assert_eq!(queries.len(), 4);
        assert_eq!(queries[0].selector, r#"button:has-text("送信"):visible"#);
        assert_eq!(queries[1].label, "button '保存'");
        assert_eq!(queries[3].selector, r#"button[type="submit"]:visible"#);
    }

    #[test]
    fn test_label_quotes_are_escaped() {
        let queries = submit_queries(&[r#"Say "hi""#.to_string()]);
        assert_eq!(queries[0].selector, r#"button:has-text("Say \"hi\""):visible"#);
    }

    #[test]
    fn test_error_queries_keep_configured_label() {
        let queries = error_queries(&[".error".to_string(), "[role=\"alert\"]".to_string()]);
        assert_eq!(queries[0].label, ".error");
        assert_eq!(queries[1].selector, "[role=\"alert\"]:visible");
    }
}
