//! Extractors for the XML documents returned by the build-service API.
//!
//! Only two facts are ever needed: project names in a search result and
//! whether a package directory listing carries a `<linkinfo>` element.

use std::sync::OnceLock;

use regex::Regex;

static PROJECT_RE: OnceLock<Regex> = OnceLock::new();
static LINKINFO_RE: OnceLock<Regex> = OnceLock::new();

fn project_re() -> &'static Regex {
    PROJECT_RE.get_or_init(|| {
        Regex::new(r#"<project\s[^>]*?\bname\s*=\s*["']([^"']+)["']"#).expect("valid regex")
    })
}

fn linkinfo_re() -> &'static Regex {
    LINKINFO_RE.get_or_init(|| Regex::new(r"<linkinfo[\s/>]").expect("valid regex"))
}

/// `name` attributes of every `<project>` element in a search collection.
pub fn project_names(xml: &str) -> Vec<String> {
    project_re()
        .captures_iter(xml)
        .map(|c| unescape(&c[1]))
        .collect()
}

/// True when a package file listing says the package links to another one.
pub fn has_linkinfo(xml: &str) -> bool {
    linkinfo_re().is_match(xml)
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
