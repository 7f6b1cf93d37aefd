//! Pure text helpers that shape a generated deliverable for each service.

use regex::Regex;
use std::sync::LazyLock;

pub const LINKEDIN_LIMIT: usize = 1300;
pub const FACEBOOK_LIMIT: usize = 2000;
pub const TWITTER_LIMIT: usize = 280;

pub const DEFAULT_RECIPIENT: &str = "test@example.com";
pub const DEFAULT_SUBJECT: &str = "AI Generated Email Campaign";
pub const DEFAULT_BLOG_TITLE: &str = "Generated Blog Post";
pub const DEFAULT_BLOG_SLUG: &str = "generated-blog-post";

static SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Subject:\s*(.+)").expect("subject pattern is valid"));

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("address pattern is valid")
});

/// First `limit` characters of `text`.
pub fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Pull a subject line and recipient addresses out of generated text.
///
/// The subject line is removed from the body when present. With no
/// address in the text the message goes to the placeholder recipient.
pub fn parse_email(content: &str) -> EmailMessage {
    let subject_match = SUBJECT.captures(content);

    let subject = subject_match
        .as_ref()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());

    let mut to: Vec<String> = ADDRESS
        .find_iter(content)
        .map(|m| m.as_str().to_string())
        .collect();
    if to.is_empty() {
        to.push(DEFAULT_RECIPIENT.to_string());
    }

    let text_body = match subject_match.as_ref().and_then(|caps| caps.get(0)) {
        Some(line) => content.replacen(line.as_str(), "", 1).trim().to_string(),
        None => content.to_string(),
    };
    let html_body = to_html(&text_body);

    EmailMessage {
        to,
        subject,
        text_body,
        html_body,
    }
}

/// Wrap plain text in a simple HTML email layout. Blank lines become
/// paragraph breaks, single newlines become `<br>`.
pub fn to_html(text: &str) -> String {
    let body = text.replace("\n\n", "</p><p>").replace('\n', "<br>");
    format!(
        r#"<html>
  <body style="font-family: Arial, sans-serif; line-height: 1.6; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background-color: #f4f4f4; padding: 20px; border-radius: 10px;">
      <p>{}</p>
    </div>
    <footer style="text-align: center; padding: 20px; color: #666; font-size: 12px;">
      <p>Sent by your AI Email Campaign Agent</p>
    </footer>
  </body>
</html>"#,
        body
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlogPost {
    pub title: String,
    pub slug: String,
    pub content: String,
}

/// First non-blank line is the title; the slug is derived from it.
pub fn parse_blog(content: &str) -> BlogPost {
    let title = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .filter(|line| !line.is_empty())
        .unwrap_or_else(|| DEFAULT_BLOG_TITLE.to_string());

    BlogPost {
        slug: slugify(&title),
        title,
        content: content.to_string(),
    }
}

/// Lowercase ASCII alphanumeric runs joined by `-`.
pub fn slugify(title: &str) -> String {
    let slug = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        DEFAULT_BLOG_SLUG.to_string()
    } else {
        slug
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub name: String,
    /// Minor currency units.
    pub price: u64,
    pub description: String,
}

pub fn parse_product(content: &str) -> Product {
    Product {
        name: "Generated Product".to_string(),
        price: 1999,
        description: content.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lead {
    pub email: String,
    pub name: String,
    pub notes: String,
}

/// Uses the first address in the text, if any.
pub fn parse_lead(content: &str) -> Lead {
    let email = ADDRESS
        .find(content)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "lead@example.com".to_string());
    Lead {
        email,
        name: "Generated Lead".to_string(),
        notes: content.to_string(),
    }
}
