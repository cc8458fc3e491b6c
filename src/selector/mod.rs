//! Selector resolution
//!
//! Forms differ in markup, so elements are located through an ordered list of
//! candidate queries. The first query whose first match is visible wins.

mod queries;

pub use queries::{error_queries, input_queries, submit_queries};

use crate::browser::BrowserDriver;
use crate::core::Result;

/// A candidate element query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Human-readable name used in step details
    pub label: String,
    /// Playwright locator
    pub selector: String,
}

impl Query {
    pub fn new(label: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            selector: selector.into(),
        }
    }

    /// Locator for the first match in document order
    pub fn first(&self) -> String {
        nth(&self.selector, 0)
    }
}

/// Locator for the `index`-th match of `selector`
pub fn nth(selector: &str, index: usize) -> String {
    format!("{} >> nth={}", selector, index)
}

/// A resolved element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Query that produced the match
    pub query: Query,
    /// Locator pinned to the first match
    pub locator: String,
}

/// Evaluate `queries` in order and return the first visible match
///
/// Errors from the driver abort the resolution; callers decide how to record
/// them.
pub async fn resolve<D>(driver: &D, queries: &[Query]) -> Result<Option<Match>>
where
    D: BrowserDriver + ?Sized,
{
    for query in queries {
        if driver.count(&query.selector).await? == 0 {
            continue;
        }
        let locator = query.first();
        if driver.is_visible(&locator).await? {
            tracing::debug!(label = %query.label, selector = %query.selector, "resolved");
            return Ok(Some(Match {
                query: query.clone(),
                locator,
            }));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{LoadBehavior, ScriptedBrowser, ScriptedElement, ScriptedPage};

    fn queries() -> Vec<Query> {
        vec![
            Query::new("primary", "#primary"),
            Query::new("secondary", ".secondary"),
            Query::new("fallback", "input"),
        ]
    }

    #[tokio::test]
    async fn test_first_visible_query_wins() {
        let driver = ScriptedBrowser::new(
            ScriptedPage::new("t")
                .with(".secondary", ScriptedElement::visible())
                .with("input", ScriptedElement::visible()),
        );

        let found = resolve(&driver, &queries()).await.unwrap().unwrap();
        assert_eq!(found.query.label, "secondary");
        assert_eq!(found.locator, ".secondary >> nth=0");
    }

    #[tokio::test]
    async fn test_hidden_first_match_falls_through() {
        // The second .secondary is visible, but only the first match counts
        let driver = ScriptedBrowser::new(
            ScriptedPage::new("t")
                .with(".secondary", ScriptedElement::hidden())
                .with(".secondary", ScriptedElement::visible())
                .with("input", ScriptedElement::visible()),
        );

        let found = resolve(&driver, &queries()).await.unwrap().unwrap();
        assert_eq!(found.query.label, "fallback");
    }

    #[tokio::test]
    async fn test_none_found() {
        let driver = ScriptedBrowser::new(
            ScriptedPage::new("t")
                .with("#primary", ScriptedElement::hidden())
                .load(LoadBehavior::Ready),
        );
        assert!(resolve(&driver, &queries()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_driver_error_aborts_resolution() {
        let driver = ScriptedBrowser::new(
            ScriptedPage::new("t")
                .query_error("#primary", "Execution context was destroyed")
                .with("input", ScriptedElement::visible()),
        );

        let err = tokio_test::assert_err!(resolve(&driver, &queries()).await);
        assert!(err.to_string().contains("Execution context was destroyed"));
    }

    #[test]
    fn test_empty_query_list() {
        let driver = ScriptedBrowser::new(ScriptedPage::new("t"));
        let found = tokio_test::assert_ok!(tokio_test::block_on(resolve(&driver, &[])));
        assert!(found.is_none());
    }

    #[test]
    fn test_nth_locator() {
        assert_eq!(nth("button:visible", 3), "button:visible >> nth=3");
        assert_eq!(Query::new("x", "textarea").first(), "textarea >> nth=0");
    }
}
