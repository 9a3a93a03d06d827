//! Message rendering for draw notifications.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

/// Subject used when none is configured.
pub const DEFAULT_SUBJECT: &str = "Secret Santa Draw";

/// Closing line of every message.
pub const CLOSING_LINE: &str = "MERRY CHRISTMAS!";

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</p\s*>|</div\s*>|</li\s*>").unwrap());
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<li[^>]*>").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Content options shared by every message in a run.
#[derive(Debug, Clone, Default)]
pub struct MessageOptions {
    pub subject: Option<String>,
    /// Group label, e.g. "Team".
    pub group: Option<String>,
    /// Free-text instructions. May contain simple HTML markup.
    pub instructions: Option<String>,
    /// Directory for failure artifacts.
    pub failure_dir: Option<PathBuf>,
}

impl MessageOptions {
    pub fn subject(&self) -> &str {
        non_blank(&self.subject).unwrap_or(DEFAULT_SUBJECT)
    }

    pub fn group(&self) -> Option<&str> {
        non_blank(&self.group)
    }

    pub fn instructions(&self) -> Option<&str> {
        non_blank(&self.instructions)
    }
}

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub text: String,
    /// Rich variant, present only when requested.
    pub html: Option<String>,
}

/// Render the message telling `participant` who they drew.
pub fn render(
    options: &MessageOptions,
    participant: &str,
    giftee: &str,
    rich: bool,
) -> RenderedMessage {
    let group = options.group();
    let instructions = options.instructions();

    let mut paragraphs = vec![format!("Hi {participant},"), giftee_line(group, giftee)];
    if let Some(text) = instructions.map(markup_to_text).filter(|t| !t.is_empty()) {
        paragraphs.push(text);
    }
    paragraphs.push(CLOSING_LINE.to_string());

    let html = rich.then(|| render_html(participant, group, giftee, instructions));

    RenderedMessage {
        subject: options.subject().to_string(),
        text: paragraphs.join("\n\n"),
        html,
    }
}

fn giftee_line(group: Option<&str>, giftee: &str) -> String {
    match group {
        Some(group) => format!("You are the {group} Secret Santa for: {giftee}!"),
        None => format!("You are the Secret Santa for: {giftee}!"),
    }
}

fn render_html(
    participant: &str,
    group: Option<&str>,
    giftee: &str,
    instructions: Option<&str>,
) -> String {
    let role = match group {
        Some(group) => format!("the {} Secret Santa", escape_html(group)),
        None => "the Secret Santa".to_string(),
    };

    let mut html = format!(
        "<p>Hi {},</p>\n<p>You are {role} for: <b>{}</b>!</p>\n",
        escape_html(participant),
        escape_html(giftee),
    );
    if let Some(instructions) = instructions {
        html.push_str(&format!("<p>{instructions}</p>\n"));
    }
    html.push_str(&format!("<p>{CLOSING_LINE}</p>"));
    html
}

/// Convert simple instruction markup to plain text.
pub fn markup_to_text(markup: &str) -> String {
    let text = LINE_BREAK.replace_all(markup, "\n");
    let text = LIST_ITEM.replace_all(&text, "- ");
    let text = TAG.replace_all(&text, "");
    let text = decode_entities(&text);

    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

fn decode_entities(text: &str) -> String {
    // &amp; last so "&amp;lt;" stays "&lt;".
    text.replace("&emsp;", "    ")
        .replace("&ensp;", "  ")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(group: Option<&str>, instructions: Option<&str>) -> MessageOptions {
        MessageOptions {
            subject: None,
            group: group.map(String::from),
            instructions: instructions.map(String::from),
            failure_dir: None,
        }
    }

    // ── Subject ─────────────────────────────────────────────────────

    #[test]
    fn subject_defaults() {
        assert_eq!(MessageOptions::default().subject(), "Secret Santa Draw");
        let blank = MessageOptions {
            subject: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(blank.subject(), "Secret Santa Draw");
    }

    #[test]
    fn subject_override() {
        let opts = MessageOptions {
            subject: Some("SECRET SANTA".into()),
            ..Default::default()
        };
        assert_eq!(render(&opts, "Jesse", "Derek", false).subject, "SECRET SANTA");
    }

    // ── Plain text ──────────────────────────────────────────────────

    #[test]
    fn minimal_message() {
        let msg = render(&options(None, None), "Jesse", "Derek", false);
        assert_eq!(
            msg.text,
            "Hi Jesse,\n\nYou are the Secret Santa for: Derek!\n\nMERRY CHRISTMAS!"
        );
        assert_eq!(msg.html, None);
    }

    #[test]
    fn group_and_instructions() {
        let msg = render(
            &options(Some("Team"), Some("&emsp;Price range: $15-20<br>&emsp;Exchange date: ")),
            "Angela",
            "Will",
            false,
        );
        assert_eq!(
            msg.text,
            "Hi Angela,\n\nYou are the Team Secret Santa for: Will!\n\n    Price range: $15-20\n    Exchange date:\n\nMERRY CHRISTMAS!"
        );
    }

    #[test]
    fn blank_optional_parts_leave_no_gaps() {
        let msg = render(&options(Some(" "), Some("<br>")), "Jesse", "Derek", false);
        assert!(!msg.text.contains("\n\n\n"));
        assert!(msg.text.contains("You are the Secret Santa for: Derek!"));
    }

    // ── HTML ────────────────────────────────────────────────────────

    #[test]
    fn rich_variant_keeps_markup_and_escapes_names() {
        let msg = render(
            &options(Some("R&D"), Some("<b>Budget</b>: $20")),
            "Tom <admin>",
            "Ann",
            true,
        );
        let html = msg.html.unwrap();
        assert!(html.contains("Hi Tom &lt;admin&gt;,"));
        assert!(html.contains("the R&amp;D Secret Santa"));
        assert!(html.contains("<b>Ann</b>"));
        assert!(html.contains("<p><b>Budget</b>: $20</p>"));
        assert!(html.ends_with("<p>MERRY CHRISTMAS!</p>"));
        assert!(msg.text.contains("Budget: $20"));
    }

    #[test]
    fn rich_variant_without_instructions() {
        let html = render(&options(None, None), "Jesse", "Derek", true)
            .html
            .unwrap();
        assert_eq!(html.matches("<p>").count(), 3);
    }

    // ── Markup conversion ───────────────────────────────────────────

    #[test]
    fn markup_line_breaks_and_tags() {
        assert_eq!(markup_to_text("a<br>b<BR/>c<br />d"), "a\nb\nc\nd");
        assert_eq!(markup_to_text("<p>one</p><p>two</p>"), "one\ntwo");
        assert_eq!(markup_to_text("<i>x</i> &amp; <b>y</b>"), "x & y");
    }

    #[test]
    fn markup_list_items() {
        assert_eq!(
            markup_to_text("<ul><li>Socks</li><li>Mugs</li></ul>"),
            "- Socks\n- Mugs"
        );
    }

    #[test]
    fn markup_entities_decode_once() {
        assert_eq!(markup_to_text("&amp;lt;"), "&lt;");
        assert_eq!(markup_to_text("1 &lt; 2"), "1 < 2");
    }

    #[test]
    fn escape_html_basic() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
