use ammonia::Builder;
use comrak::{markdown_to_html, Options};
use std::collections::HashSet;

/// Render raw Markdown (workout notes, comment text) to sanitized HTML.
///
/// Uses comrak for GFM-compatible parsing (autolink, strikethrough, tables)
/// and ammonia for XSS-safe HTML sanitization.
pub fn render_markdown(raw: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.render.unsafe_ = true; // let comrak emit raw HTML; ammonia will sanitize

    let html = markdown_to_html(raw, &options);
    sanitize_html(&html)
}

fn sanitize_html(html: &str) -> String {
    let extra_tags: HashSet<&str> = [
        "pre",
        "code",
        "blockquote",
        "hr",
        "table",
        "thead",
        "tbody",
        "tr",
        "th",
        "td",
        "del",
        "s",
    ]
    .iter()
    .copied()
    .collect();

    let url_schemes: HashSet<&str> = ["http", "https", "mailto"].iter().copied().collect();

    let mut builder = Builder::default();
    builder.add_tags(&extra_tags);

    builder.add_tag_attributes("a", &["href", "title"]);
    builder.add_tag_attributes("code", &["class"]);
    builder.add_tag_attributes("td", &["align"]);
    builder.add_tag_attributes("th", &["align"]);

    builder.url_schemes(url_schemes);
    builder.link_rel(Some("noopener noreferrer"));

    builder.clean(html).to_string()
}

/// Extract `@username` mentions from comment text.
///
/// Usernames are alphanumeric plus underscore, 3-30 characters; anything
/// else terminates the mention. Duplicates are collapsed, order preserved.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if c != '@' {
            continue;
        }
        // Mentions start at the beginning of the text or after a non-word char.
        if idx > 0 {
            let prev = text[..idx].chars().next_back().unwrap();
            if prev.is_alphanumeric() || prev == '_' {
                continue;
            }
        }

        let rest = &text[idx + 1..];
        let end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_alphanumeric() && *c != '_')
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let candidate = &rest[..end];

        if (3..=30).contains(&candidate.len())
            && !mentions.iter().any(|m| m == candidate)
        {
            mentions.push(candidate.to_string());
        }
    }

    mentions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_markdown_rendering() {
        let html = render_markdown("This is **bold** and *italic*.");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
    }

    #[test]
    fn xss_script_tag_removed() {
        let html = render_markdown("<script>alert('xss')</script>");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("alert"));
    }

    #[test]
    fn xss_javascript_url_removed() {
        let html = render_markdown("[click](javascript:alert(1))");
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn autolink() {
        let html = render_markdown("Ran here: https://example.com/route");
        assert!(html.contains("<a href=\"https://example.com/route\""));
    }

    #[test]
    fn extracts_single_mention() {
        assert_eq!(extract_mentions("nice run @alice!"), vec!["alice"]);
    }

    #[test]
    fn extracts_multiple_mentions_in_order() {
        assert_eq!(
            extract_mentions("@bob and @alice, well done"),
            vec!["bob", "alice"]
        );
    }

    #[test]
    fn collapses_duplicate_mentions() {
        assert_eq!(extract_mentions("@sam @sam @sam"), vec!["sam"]);
    }

    #[test]
    fn ignores_emails() {
        assert!(extract_mentions("mail me at user@example.com").is_empty());
    }

    #[test]
    fn ignores_too_short_and_too_long() {
        assert!(extract_mentions("@ab").is_empty());
        let long = format!("@{}", "a".repeat(31));
        assert!(extract_mentions(&long).is_empty());
    }

    #[test]
    fn mention_stops_at_punctuation() {
        assert_eq!(extract_mentions("thanks @coach_42."), vec!["coach_42"]);
    }
}
