// src/importer/index.rs
//! Index page listing every stored profile by source

use super::registry::Registry;
use axum::{extract::State, response::Html};
use std::fmt::Write;
use std::sync::Arc;

/// GET /
pub async fn index_page(State(registry): State<Arc<Registry>>) -> Html<String> {
    Html(render_index(&registry))
}

/// Render the overview page: one heading per source, one link per profile
pub fn render_index(registry: &Registry) -> String {
    let mut body = String::new();
    for (source, profiles) in registry.sources() {
        let _ = writeln!(body, "\t<h1>{}</h1>", escape_html(source));
        for profile in profiles {
            let _ = writeln!(
                body,
                "\t<a href=\"{}\">{}</a></br>",
                profile.link(),
                escape_html(&profile.name)
            );
        }
    }
    if registry.is_empty() {
        body.push_str("\t<p>No profiles stored yet.</p>\n");
    }

    format!(
        "<html>\n<head>\n\t<title>Profiles</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        body
    )
}

/// Escape text for use in HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_index() {
        let registry = Registry::build(
            "profiles",
            &["profiles/h1/10:00:00.pb.gz", "profiles/h1/10:00:30.pb.gz", "profiles/h2/09:00:00.pb.gz"],
        );
        let page = render_index(&registry);

        let h1 = page.find("<h1>h1</h1>").unwrap();
        let h2 = page.find("<h1>h2</h1>").unwrap();
        assert!(h1 < h2);
        assert!(page.contains("<a href=\"/0\">10:00:00.pb.gz</a>"));
        assert!(page.contains("<a href=\"/1\">10:00:30.pb.gz</a>"));
        assert!(page.contains("<a href=\"/2\">09:00:00.pb.gz</a>"));
        assert!(page.find("/0\"").unwrap() < page.find("/1\"").unwrap());
    }

    #[test]
    fn test_render_empty_index() {
        let page = render_index(&Registry::default());
        assert!(page.contains("No profiles stored yet."));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c'"), "a&lt;b&gt;&amp;&#34;c&#39;");
        assert_eq!(escape_html("10:00:00.pb.gz"), "10:00:00.pb.gz");
    }
}
