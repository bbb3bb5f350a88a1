//! The few content-store predicates the pipeline needs.

/// Summary fields projected in listing queries.
const SUMMARY_FIELDS: [&str; 3] = ["title", "subtitle", "author"];

/// `[[at(document.type,"<type>")]]`
pub(crate) fn document_type(document_type: &str) -> String {
    at("document.type", document_type)
}

/// `[[at(my.<type>.uid,"<slug>")]]`
pub(crate) fn uid(document_type: &str, slug: &str) -> String {
    at(&format!("my.{document_type}.uid"), slug)
}

/// Comma-separated `fetch` projection, e.g. `posts.title,posts.subtitle,posts.author`.
pub(crate) fn summary_fields(document_type: &str) -> String {
    SUMMARY_FIELDS
        .iter()
        .map(|field| format!("{document_type}.{field}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn at(path: &str, value: &str) -> String {
    format!("[[at({path},\"{}\")]]", escape(value))
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
