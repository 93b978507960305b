//! Plain-text views of parsed HTML.

use crate::consts;
use scraper::{ElementRef, Html, Node};

/// Text content of `element`, skipping the subtrees of any element named in
/// `skip`. Every run of whitespace collapses to a single space, so adjacent
/// blocks come out separated by exactly one space.
pub(crate) fn text_of(element: ElementRef<'_>, skip: &[&str]) -> String {
    let mut words = Vec::new();
    collect(element, skip, &mut words);
    words.join(" ")
}

fn collect<'a>(element: ElementRef<'a>, skip: &[&str], words: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(child) = ElementRef::wrap(child) {
            if !skip.contains(&child.value().name()) {
                collect(child, skip, words);
            }
        } else if let Node::Text(text) = child.value() {
            words.extend(text.split_whitespace());
        }
    }
}

/// Text of an HTML fragment, such as a JSON-LD `description` holding markup.
pub fn strip_html(fragment: &str) -> String {
    if !fragment.contains('<') && !fragment.contains('&') {
        return fragment.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    let parsed = Html::parse_fragment(fragment);
    text_of(parsed.root_element(), consts::NON_RENDERED)
}

/// Drops a trailing site-name suffix (`" - Jobup"`, `" | ACME"`, …) from a page title.
pub fn clean_title(title: &str) -> String {
    consts::TITLE_SUFFIX_REGEX.replace(title.trim(), "").trim().to_string()
}

/// Folds typographic apostrophes into ASCII ones for keyword matching.
pub(crate) fn fold_apostrophes(text: &str) -> String {
    text.replace('’', "'")
}
