use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};

lazy_static! {
    static ref DOI_PATTERN: Regex =
        Regex::new(r"(10\.\d{4,9}/[-._;()/:a-zA-Z0-9]+)").expect("valid DOI pattern");
}

/// Meta tags publishers use to announce an article's DOI.
const DOI_META_SELECTORS: &[&str] = &[
    "meta[name='citation_doi']",
    "meta[name='dc.identifier']",
    "meta[name='DC.identifier']",
    "meta[name='DC.Identifier']",
    "meta[name='prism.doi']",
    "meta[property='citation_doi']",
];

/// First DOI found anywhere in the text.
pub fn extract_doi(text: &str) -> Option<String> {
    DOI_PATTERN
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_end_matches(['.', ';', ':']).to_string())
}

/// DOI of the article an HTML landing page describes.
///
/// Metadata in meta tags and JSON-LD is preferred over the first DOI-looking
/// string in the page, which is often a reference rather than the article.
pub fn extract_doi_from_html(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    meta_doi(&document)
        .or_else(|| jsonld_doi(&document))
        .or_else(|| extract_doi(html))
}

fn meta_doi(document: &Html) -> Option<String> {
    DOI_META_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .flat_map(|selector| {
            document
                .select(&selector)
                .filter_map(|el| el.value().attr("content"))
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .find_map(|content| extract_doi(&content))
}

fn jsonld_doi(document: &Html) -> Option<String> {
    let script_selector = Selector::parse("script[type='application/ld+json']").ok()?;
    for script in document.select(&script_selector) {
        let Ok(json) = serde_json::from_str::<serde_json::Value>(script.text().collect::<String>().trim()) else {
            continue;
        };
        let nodes = match &json {
            serde_json::Value::Array(arr) => arr.iter().collect::<Vec<_>>(),
            other => vec![other],
        };
        for node in nodes {
            for key in ["doi", "identifier", "sameAs", "@id", "url"] {
                if let Some(doi) = node.get(key).and_then(value_doi) {
                    return Some(doi);
                }
            }
        }
    }
    None
}

fn value_doi(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => extract_doi(s),
        serde_json::Value::Array(arr) => arr.iter().find_map(value_doi),
        serde_json::Value::Object(obj) => obj.get("value").and_then(value_doi),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_doi_from_links() {
        assert_eq!(
            extract_doi("https://doi.org/10.1167/jov.21.3.1").as_deref(),
            Some("10.1167/jov.21.3.1")
        );
        assert_eq!(
            extract_doi("https://www.sciencedirect.com/science/article/pii/S0042-6989(99)00163-7").as_deref(),
            None
        );
        assert_eq!(
            extract_doi("see doi:10.1016/S0042-6989(99)00163-7.").as_deref(),
            Some("10.1016/S0042-6989(99)00163-7")
        );
        assert_eq!(extract_doi("https://example.com/paper/123"), None);
        assert_eq!(extract_doi(""), None);
    }

    #[test]
    fn test_extract_doi_prefers_meta_tags() {
        let html = r#"
            <html><head>
                <meta name="citation_doi" content="10.3758/s13428-020-01345-6">
            </head><body>
                <p>Cited: https://doi.org/10.1037/0096-1523.1.1.1</p>
            </body></html>
        "#;
        assert_eq!(extract_doi_from_html(html).as_deref(), Some("10.3758/s13428-020-01345-6"));
    }

    #[test]
    fn test_extract_doi_from_jsonld() {
        let html = r#"
            <html><head>
                <script type="application/ld+json">
                    {"@type": "ScholarlyArticle", "sameAs": ["https://doi.org/10.1111/cogs.12345"]}
                </script>
            </head><body><p>Reference 10.9999/other.1</p></body></html>
        "#;
        assert_eq!(extract_doi_from_html(html).as_deref(), Some("10.1111/cogs.12345"));
    }

    #[test]
    fn test_extract_doi_falls_back_to_page_text() {
        let html = "<html><body><a href=\"https://doi.org/10.1016/j.visres.2019.01.001\">doi</a></body></html>";
        assert_eq!(extract_doi_from_html(html).as_deref(), Some("10.1016/j.visres.2019.01.001"));
        assert_eq!(extract_doi_from_html("<html><body>nothing</body></html>"), None);
    }
}
