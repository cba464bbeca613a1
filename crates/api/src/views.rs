//! Minimal HTML pages for the moderator.
//!
//! Every interpolated value goes through [`escape`]; the only raw HTML
//! inserted is the diff table body produced by the wiki itself.

use axum::response::Html;
use suggestor_core::edit::{EditRecord, EditState, PendingEdit};
use suggestor_wiki::RenderedDiff;

use crate::config::ServerConfig;

const TITLE: &str = "Suggestor";

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(heading: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{TITLE} - {heading}</title></head>\n\
         <body>\n<h1>{heading}</h1>\n{body}\n</body>\n</html>\n",
        heading = escape(heading),
    ))
}

/// Landing page with the login state.
///
/// `username` is best-effort: a valid session whose name lookup failed
/// still shows as logged in.
pub fn root(config: &ServerConfig, logged_in: bool, username: Option<&str>) -> Html<String> {
    let status = match (logged_in, username) {
        (true, Some(name)) => format!(
            "<p>Logged in as <strong>{}</strong>. <a href=\"{}\">Log out</a></p>",
            escape(name),
            escape(&config.url_for("/logout"))
        ),
        (true, None) => format!(
            "<p>Logged in. <a href=\"{}\">Log out</a></p>",
            escape(&config.url_for("/logout"))
        ),
        (false, _) => format!(
            "<p>Not logged in. <a href=\"{}\">Log in</a></p>",
            escape(&config.url_for("/initiate"))
        ),
    };
    let body = format!(
        "{status}\n<p><a href=\"{}\">Pending edits</a></p>",
        escape(&config.url_for("/pending"))
    );
    layout(TITLE, &body)
}

/// Table of queued edits, in the order given (most recent first).
pub fn pending(config: &ServerConfig, edits: &[PendingEdit]) -> Html<String> {
    if edits.is_empty() {
        return layout("Pending edits", "<p>No edits in the queue.</p>");
    }

    let rows: String = edits
        .iter()
        .map(|edit| {
            let approved = match edit.state {
                EditState::Approved => "yes",
                EditState::Pending => "no",
            };
            let actions = match edit.state {
                EditState::Pending => format!(
                    "<a href=\"{}\">diff</a> <a href=\"{}\">approve</a>",
                    escape(&format!("{}?uid={}", config.url_for("/diff"), edit.id)),
                    escape(&format!("{}?uid={}", config.url_for("/approve"), edit.id)),
                ),
                EditState::Approved => format!(
                    "<a href=\"{}\">diff</a>",
                    escape(&format!("{}?uid={}", config.url_for("/diff"), edit.id)),
                ),
            };
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                edit.id,
                escape(&edit.host),
                escape(edit.page_name.as_deref().unwrap_or("")),
                escape(&edit.summary),
                approved,
                actions,
            )
        })
        .collect();

    let body = format!(
        "<table>\n<tr><th>ID</th><th>Wiki</th><th>Page</th><th>Summary</th><th>Approved</th><th></th></tr>\n{rows}</table>"
    );
    layout("Pending edits", &body)
}

/// Diff of one edit against its base revision.
pub fn diff(config: &ServerConfig, edit: &EditRecord, diff: &RenderedDiff) -> Html<String> {
    let approve = if edit.is_approved() {
        "<p>Already approved.</p>".to_string()
    } else {
        format!(
            "<p><a href=\"{}\">Approve</a></p>",
            escape(&format!("{}?uid={}", config.url_for("/approve"), edit.id))
        )
    };
    let body = format!(
        "<h2>{}</h2>\n<p>Summary: {}</p>\n<table class=\"diff\">\n{}\n</table>\n{approve}\n<p><a href=\"{}\">Back</a></p>",
        escape(&diff.title),
        escape(&edit.summary),
        diff.body,
        escape(&config.url_for("/pending")),
    );
    layout(&format!("Edit {}", edit.id), &body)
}
