//! HTML directory listings.

use http::Method;

use crate::exclude::Exclude;
use crate::fs::{File, FileInfo};
use crate::path;
use crate::reject::Rejection;
use crate::reply::{self, Response};

const HTML_ESCAPES: [(char, &str); 5] = [
    ('&', "&amp;"),
    ('<', "&lt;"),
    ('>', "&gt;"),
    // "&#34;" is shorter than "&quot;".
    ('"', "&#34;"),
    // "&#39;" is shorter than "&apos;", and apos was not in HTML until HTML5.
    ('\'', "&#39;"),
];

/// Escape text for use inside HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match HTML_ESCAPES.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }
    out
}

/// Render the visible children of a directory, sorted by name.
pub fn render(mut entries: Vec<FileInfo>, exclude: &Exclude) -> String {
    entries.retain(|e| !exclude.is_match(e.name()));
    entries.sort_by(|a, b| a.name().cmp(b.name()));

    let mut page = String::from("<pre>\n");
    for entry in &entries {
        let mut name = entry.name().to_owned();
        if entry.is_dir() {
            name.push('/');
        }
        let href = path::relative_ref(path::encode(&name));
        page.push_str("<a href=\"");
        page.push_str(&href);
        page.push_str("\">");
        page.push_str(&escape_html(&name));
        page.push_str("</a>\n");
    }
    page.push_str("</pre>\n");
    page
}

/// List an open directory.
///
/// A failure to read the directory is logged and reported as an internal
/// error, without further detail.
pub async fn dir_list<F: File>(
    method: &Method,
    dir: &mut F,
    exclude: &Exclude,
) -> Result<Response, Rejection> {
    let entries = match dir.read_dir().await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::error!("error reading directory: {}", err);
            return Err(Rejection::Internal);
        }
    };
    Ok(reply::html(method, render(entries, exclude)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> FileInfo {
        FileInfo::new(name, 1, None, false)
    }

    fn dir(name: &str) -> FileInfo {
        FileInfo::new(name, 0, None, true)
    }

    #[test]
    fn escapes_five_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&#34;x&#34;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn sorted_by_bytes() {
        let page = render(
            vec![file("b.txt"), file("B.txt"), dir("a"), file("_z")],
            &Exclude::none(),
        );
        assert_eq!(
            page,
            "<pre>\n\
             <a href=\"B.txt\">B.txt</a>\n\
             <a href=\"_z\">_z</a>\n\
             <a href=\"a/\">a/</a>\n\
             <a href=\"b.txt\">b.txt</a>\n\
             </pre>\n"
        );
    }

    #[test]
    fn excluded_entries_are_hidden() {
        let page = render(
            vec![dir(".git"), dir(".idea"), file(".gitignore"), file("main.rs")],
            &Exclude::default_hidden(),
        );
        assert!(!page.contains(".git"));
        assert!(!page.contains(".idea"));
        assert!(page.contains("main.rs"));
    }

    #[test]
    fn href_and_text_encoding() {
        let page = render(vec![file("a&<b>.txt")], &Exclude::none());
        assert!(page.contains("<a href=\"a&%3Cb%3E.txt\">a&amp;&lt;b&gt;.txt</a>"));

        let page = render(vec![file("q?#.txt")], &Exclude::none());
        assert!(page.contains("href=\"q%3F%23.txt\""));

        let page = render(vec![dir("c:d")], &Exclude::none());
        assert!(page.contains("<a href=\"./c:d/\">c:d/</a>"));
    }

    #[test]
    fn empty_dir() {
        assert_eq!(render(Vec::new(), &Exclude::none()), "<pre>\n</pre>\n");
    }
}
