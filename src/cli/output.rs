// Human-readable and JSON rendering for CLI listings

use crate::filter::PostfixToken;
use crate::models::{News, Tag};
use crate::query::Page;
use serde::Serialize;
use std::io::IsTerminal;

const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Truncate to `width` characters, marking the cut with "..."
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn id_cell(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string())
}

/// Postfix token stream, one token per line
pub fn format_postfix(tokens: &[PostfixToken]) -> String {
    tokens
        .iter()
        .map(|token| token.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_news_table(news: &[News], is_tty: bool) -> String {
    if news.is_empty() {
        return "No news found.".to_string();
    }

    let mut lines = Vec::new();
    let header = format!(
        "{:<6} {:<40} {:<10} {:<12} {:<12}",
        "ID", "Subject", "Published", "From", "To"
    );
    lines.push(bold_if_tty(&header, is_tty));
    lines.push("-".repeat(84));

    for item in news {
        lines.push(format!(
            "{:<6} {:<40} {:<10} {:<12} {:<12}",
            id_cell(item.id),
            truncate(&item.subject, 40),
            if item.published { "yes" } else { "no" },
            item.visible_from.as_deref().unwrap_or(""),
            item.visible_to.as_deref().unwrap_or(""),
        ));
    }
    lines.join("\n")
}

pub fn format_tag_table(tags: &[Tag], is_tty: bool) -> String {
    if tags.is_empty() {
        return "No tags found.".to_string();
    }

    let mut lines = Vec::new();
    let header = format!("{:<6} {:<24} {:<40}", "ID", "Name", "Description");
    lines.push(bold_if_tty(&header, is_tty));
    lines.push("-".repeat(72));

    for tag in tags {
        lines.push(format!(
            "{:<6} {:<24} {:<40}",
            id_cell(tag.id),
            truncate(&tag.name, 24),
            truncate(tag.description.as_deref().unwrap_or(""), 40),
        ));
    }
    lines.join("\n")
}

/// "Page 2 of 4 (10 total)"
pub fn format_page_footer<T>(page: &Page<T>) -> String {
    format!(
        "Page {} of {} ({} total)",
        page.number + 1,
        page.total_pages().max(1),
        page.total_elements
    )
}

/// Page as JSON, including the derived page count
pub fn page_json<T: Serialize>(page: &Page<T>) -> serde_json::Result<serde_json::Value> {
    Ok(serde_json::json!({
        "content": serde_json::to_value(&page.content)?,
        "number": page.number,
        "size": page.size,
        "totalElements": page.total_elements,
        "totalPages": page.total_pages(),
        "last": page.is_last(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parse_filter;
    use crate::query::Pageable;

    #[test]
    fn test_format_postfix() {
        let tokens = parse_filter("a:1 OR b:2 AND c:3");
        let text = format_postfix(&tokens);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("a "));
        assert_eq!(lines[3], "AND");
        assert_eq!(lines[4], "OR");
    }

    #[test]
    fn test_empty_tables() {
        assert_eq!(format_news_table(&[], false), "No news found.");
        assert_eq!(format_tag_table(&[], false), "No tags found.");
    }

    #[test]
    fn test_news_table_plain() {
        let mut news = News::new("Premiere".to_string(), "text".to_string());
        news.id = Some(3);
        news.published = true;
        let table = format_news_table(&[news], false);
        assert!(table.starts_with("ID"));
        assert!(!table.contains(ANSI_BOLD));
        assert!(table.contains("Premiere"));
        assert!(table.contains("yes"));
    }

    #[test]
    fn test_header_bold_on_tty() {
        let mut tag = Tag::new("musical".to_string());
        tag.id = Some(1);
        let table = format_tag_table(&[tag], true);
        assert!(table.starts_with(ANSI_BOLD));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long subject line", 10), "a very ...");
    }

    #[test]
    fn test_page_footer_and_json() {
        let page = Page::from_lazy(vec![1, 2, 3], &Pageable::of(1, 3), || Ok(10)).unwrap();
        assert_eq!(format_page_footer(&page), "Page 2 of 4 (10 total)");

        let json = page_json(&page).unwrap();
        assert_eq!(json["totalElements"], 10);
        assert_eq!(json["totalPages"], 4);
        assert_eq!(json["last"], false);
        assert_eq!(json["content"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_empty_page_footer() {
        let page: Page<i32> = Page::from_lazy(vec![], &Pageable::of(0, 5), || Ok(0)).unwrap();
        assert_eq!(format_page_footer(&page), "Page 1 of 1 (0 total)");
    }
}
