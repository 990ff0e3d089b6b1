use crate::fs::{DirEntry, DirectoryView};
use crate::types::FsError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt::Write;

/// Entries requested from the directory per round
const LISTING_BATCH: i64 = 100;

/// Render a directory as an HTML link list
pub async fn render_listing(mut dir: DirectoryView) -> Result<Response, FsError> {
    let mut html = String::from(
        "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
    );

    let mut count = 0;
    loop {
        let (entries, done) = dir.list_entries(LISTING_BATCH).await?;
        count += entries.len();
        for entry in &entries {
            push_entry(&mut html, entry);
        }
        if done {
            break;
        }
    }
    html.push_str("</pre>\n");
    dir.close();

    tracing::debug!("Listed {} entries under {:?}", count, dir.prefix());

    Ok((
        StatusCode::OK,
        [("content-type", "text/html; charset=utf-8")],
        html,
    )
        .into_response())
}

fn push_entry(html: &mut String, entry: &DirEntry) {
    let mut name = entry.name.clone();
    if entry.is_dir {
        name.push('/');
    }
    let _ = writeln!(html, "<a href=\"{}\">{}</a>", encode_path(&name), escape_html(&name));
}

/// Percent-encode each path segment, keeping the separators
pub(super) fn encode_path(name: &str) -> String {
    name.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Escape `&`, `<`, `>`, `"` and `'` for HTML text and attributes
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
