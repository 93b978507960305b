//! Site-specific extraction strategies.
//!
//! Some job boards render a complete posting without any `JobPosting` markup.
//! A [`SiteHeuristic`] knows how to read one such site; the
//! [`HeuristicRegistry`] picks the strategies that apply to a domain so the
//! pipeline itself never hard-codes a site.

mod section;

use crate::{Document, Record};
use std::sync::Arc;

pub use self::section::{Label, Landmarks, SectionHeuristic};

pub trait SiteHeuristic {
    fn name(&self) -> &str;

    /// `domain` is lower-case and has no leading `www.`.
    fn matches(&self, domain: &str) -> bool;

    fn extract(&self, document: &Document, record: &mut Record);
}

pub type HeuristicHandle = Arc<dyn SiteHeuristic + Send + Sync>;

#[derive(Clone, Default)]
pub struct HeuristicRegistry {
    heuristics: Vec<HeuristicHandle>,
}

impl HeuristicRegistry {
    /// A registry with no strategies at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The strategies shipped with this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        match SectionHeuristic::new("jobup", ["jobup.ch"], Landmarks::jobup()) {
            Ok(jobup) => registry.register(Arc::new(jobup)),
            Err(err) => tracing::error!(error = ?err, "Built-in site heuristic failed to compile; skipping"),
        }
        registry
    }

    pub fn register(&mut self, heuristic: HeuristicHandle) {
        self.heuristics.push(heuristic);
    }

    pub fn with(mut self, heuristic: HeuristicHandle) -> Self {
        self.register(heuristic);
        self
    }

    pub fn matching<'a>(&'a self, domain: &'a str) -> impl Iterator<Item = &'a HeuristicHandle> + 'a {
        self.heuristics.iter().filter(move |heuristic| heuristic.matches(domain))
    }

    /// Runs every strategy matching `domain`, in registration order. Returns
    /// how many ran.
    pub fn apply(&self, domain: &str, document: &Document, record: &mut Record) -> usize {
        let mut applied = 0;
        for heuristic in self.matching(domain) {
            tracing::debug!(heuristic = heuristic.name(), domain, "Applying site heuristic");
            heuristic.extract(document, record);
            applied += 1;
        }
        applied
    }
}

impl std::fmt::Debug for HeuristicRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.heuristics.iter().map(|heuristic| heuristic.name())).finish()
    }
}
