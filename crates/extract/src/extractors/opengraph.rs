use super::Extractor;
use crate::record::Field;
use crate::{Document, Record};

/// `og:title` fills the title and `og:site_name` the source. `og:description`
/// is only staged: it tends to be marketing copy rather than the posting.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGraph;

impl Extractor for OpenGraph {
    fn name(&self) -> &'static str {
        "opengraph"
    }

    fn extract(&self, document: &Document, record: &mut Record) {
        for meta in document.metas() {
            match meta.key.as_str() {
                "og:title" => {
                    record.set_if_absent(Field::Title, &meta.content);
                },
                "og:site_name" => {
                    record.set_if_absent(Field::Source, &meta.content);
                },
                "og:description" => {
                    record.stage_og_description(&meta.content);
                },
                _ => {},
            }
        }
    }
}
