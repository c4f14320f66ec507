use serde::Serialize;
use tera::Tera;

/// Template name for generated directory listings
pub const LISTING_TEMPLATE: &str = "listing.html";

const LISTING_SOURCE: &str = r#"<!DOCTYPE HTML>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Directory listing for {{ path }}</title>
</head>
<body>
<h1>Directory listing for {{ path }}</h1>
<hr>
<ul>
{% for entry in entries %}<li><a href="{{ entry.href | safe }}">{{ entry.name }}</a></li>
{% endfor %}</ul>
<hr>
</body>
</html>
"#;

/// One row of a directory listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListingEntry {
    /// Text shown to the user (HTML-escaped by the template)
    pub name: String,
    /// Percent-encoded relative link
    pub href: String,
}

/// Initialize the Tera template engine
pub fn init_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(LISTING_TEMPLATE, LISTING_SOURCE)?;
    Ok(tera)
}

/// Render the listing page for `path` (the decoded request path).
pub fn render_listing(
    tera: &Tera,
    path: &str,
    entries: &[ListingEntry],
) -> Result<String, tera::Error> {
    let mut context = tera::Context::new();
    context.insert("path", path);
    context.insert("entries", entries);
    tera.render(LISTING_TEMPLATE, &context)
}
