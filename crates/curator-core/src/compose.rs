//! Digest composition.
//!
//! A [`DigestComposer`] turns a [`DigestPlan`] into a subject and a body.
//! [`TemplateComposer`] renders Markdown without any external service and is
//! the composer the daemon wires by default.

use std::fmt::Write as _;

use curator_types::Quote;

use crate::error::CuratorError;
use crate::plan::{CategoryPlan, CuratorPlan, DigestPlan};

/// Theme used when nothing better is known.
pub const DEFAULT_THEME: &str = "emerging patterns";

/// A rendered digest ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedDigest {
    pub subject: String,
    pub body: String,
    /// Theme recorded in history for curator digests
    pub theme: String,
}

/// Turns a plan into prose.
pub trait DigestComposer: Send + Sync {
    fn compose(&self, plan: &DigestPlan) -> Result<ComposedDigest, CuratorError>;
}

/// Markdown templates.
#[derive(Debug, Clone)]
pub struct TemplateComposer {
    theme: String,
    author: String,
    tension: String,
}

impl Default for TemplateComposer {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            author: "your reading".to_string(),
            tension: "These quotes surface an interesting tension in your recent reading."
                .to_string(),
        }
    }
}

impl TemplateComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the curator theme.
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    fn compose_curator(&self, plan: &CuratorPlan) -> ComposedDigest {
        let subject = format!("Worth revisiting: {} on {}", self.author, self.theme);

        let mut body = String::new();
        let _ = writeln!(body, "# Curator's Pick\n");
        let _ = writeln!(body, "_{}_\n", self.theme);
        push_quote(&mut body, &plan.anchor);

        if !plan.recent.is_empty() {
            let heading = if plan.has_old_anchor {
                "Your recent reading picks up this thread"
            } else {
                "More from this thread"
            };
            let _ = writeln!(body, "## {heading}\n");
            for quote in &plan.recent {
                push_quote(&mut body, quote);
            }
        }

        let _ = writeln!(body, "---\n");
        let _ = writeln!(body, "{}", self.tension);
        let _ = writeln!(
            body,
            "\n_{} quotes from {} articles share this theme._",
            plan.cluster_quote_ids.len(),
            plan.article_count
        );

        ComposedDigest {
            subject,
            body,
            theme: self.theme.clone(),
        }
    }

    fn compose_category(&self, plan: &CategoryPlan) -> ComposedDigest {
        let name = &plan.category.name;
        let subject = format!("Category Digest: {name}");

        let mut body = String::new();
        let _ = writeln!(body, "# Category Digest\n");
        let _ = writeln!(body, "## {name}\n");
        if let Some(description) = plan.category.description.as_deref() {
            let _ = writeln!(body, "_{description}_\n");
        }
        let _ = writeln!(
            body,
            "Here are quotes from your library that match this category:\n"
        );
        for matched in &plan.quotes {
            push_quote(&mut body, &matched.quote);
        }
        let _ = writeln!(
            body,
            "---\n\n_{} quotes from {} articles._",
            plan.quotes.len(),
            plan.article_count
        );

        ComposedDigest {
            subject,
            body,
            theme: name.clone(),
        }
    }
}

fn push_quote(body: &mut String, quote: &Quote) {
    let _ = writeln!(body, "> {}", quote.text.trim());
    let _ = writeln!(
        body,
        "> ({}: {})\n",
        quote.article.display_title(),
        quote.article.display_url()
    );
}

impl DigestComposer for TemplateComposer {
    fn compose(&self, plan: &DigestPlan) -> Result<ComposedDigest, CuratorError> {
        Ok(match plan {
            DigestPlan::Curator(plan) => self.compose_curator(plan),
            DigestPlan::Category(plan) => self.compose_category(plan),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::MatchedQuote;
    use chrono::Utc;
    use curator_types::{ArticleMeta, Category};

    fn quote(id: &str, text: &str) -> Quote {
        Quote::new(id, "a1", text, Some(vec![1.0]), Utc::now()).with_article(ArticleMeta {
            title: Some("On Reading".to_string()),
            url: Some("https://example.com/reading".to_string()),
            domain: None,
        })
    }

    #[test]
    fn test_curator_digest() {
        let plan = DigestPlan::Curator(CuratorPlan {
            anchor: quote("q1", "Old idea"),
            recent: vec![quote("q2", "New echo")],
            cluster_quote_ids: vec!["q1".into(), "q2".into()],
            article_count: 1,
            has_old_anchor: true,
        });

        let digest = TemplateComposer::new().compose(&plan).unwrap();
        assert_eq!(
            digest.subject,
            "Worth revisiting: your reading on emerging patterns"
        );
        assert_eq!(digest.theme, DEFAULT_THEME);
        assert!(digest.body.contains("> Old idea"));
        assert!(digest.body.contains("> New echo"));
        assert!(digest.body.contains("On Reading: https://example.com/reading"));
        assert!(digest.body.contains("picks up this thread"));
    }

    #[test]
    fn test_custom_theme() {
        let plan = DigestPlan::Curator(CuratorPlan {
            anchor: quote("q1", "Old idea"),
            recent: vec![],
            cluster_quote_ids: vec!["q1".into()],
            article_count: 1,
            has_old_anchor: false,
        });
        let digest = TemplateComposer::new()
            .with_theme("assessment authenticity")
            .compose(&plan)
            .unwrap();
        assert!(digest.subject.ends_with("on assessment authenticity"));
    }

    #[test]
    fn test_category_digest() {
        let category = Category::new("AI Ethics", Some("moral questions".into()), None);
        let plan = DigestPlan::Category(CategoryPlan::new(
            category,
            vec![MatchedQuote {
                quote: quote("q9", "Machines and duty"),
                similarity: 0.8,
            }],
        ));

        let digest = TemplateComposer::new().compose(&plan).unwrap();
        assert_eq!(digest.subject, "Category Digest: AI Ethics");
        assert!(digest.body.contains("_moral questions_"));
        assert!(digest.body.contains("> Machines and duty"));
        assert!(digest.body.contains("1 quotes from 1 articles"));
    }
}
