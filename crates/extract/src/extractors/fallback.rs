//! Last-resort sources, used only for fields every other source left empty.

use super::Extractor;
use crate::consts::{MAX_TARGETED_CHARS, MAX_VISIBLE_CHARS};
use crate::record::Field;
use crate::text::clean_title;
use crate::{Document, Record};

/// Description from the largest generic content container.
#[derive(Debug, Clone, Copy)]
pub struct TargetedContainer {
    pub max_chars: usize,
}
impl Default for TargetedContainer {
    fn default() -> Self {
        Self { max_chars: MAX_TARGETED_CHARS }
    }
}
impl Extractor for TargetedContainer {
    fn name(&self) -> &'static str {
        "targeted-container"
    }

    fn extract(&self, document: &Document, record: &mut Record) {
        if record.has(Field::Description) {
            return;
        }
        if let Some(text) = document.targeted_text(self.max_chars) {
            record.set_if_absent(Field::Description, text);
        }
    }
}

/// Description from the whole page's visible text.
#[derive(Debug, Clone, Copy)]
pub struct VisibleText {
    pub max_chars: usize,
}
impl Default for VisibleText {
    fn default() -> Self {
        Self { max_chars: MAX_VISIBLE_CHARS }
    }
}
impl Extractor for VisibleText {
    fn name(&self) -> &'static str {
        "visible-text"
    }

    fn extract(&self, document: &Document, record: &mut Record) {
        if !record.has(Field::Description) {
            record.set_if_absent(Field::Description, document.visible_text(self.max_chars));
        }
    }
}

/// Title from `<title>`, without its site-name suffix.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageTitle;
impl Extractor for PageTitle {
    fn name(&self) -> &'static str {
        "page-title"
    }

    fn extract(&self, document: &Document, record: &mut Record) {
        if let Some(title) = document.title() {
            record.set_if_absent(Field::Title, clean_title(title));
        }
    }
}
