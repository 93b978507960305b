use super::SiteHeuristic;
use crate::error::{ErrorKind, Result};
use crate::record::Field;
use crate::text::fold_apostrophes;
use crate::truncate::{char_len, truncate_chars};
use crate::{Document, Record};
use regex::Regex;
use tracing::instrument;

/// A `label: value` pair of a posting's summary section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    /// Record field the value fills; `None` for labels that are only stripped
    /// from the description.
    pub field: Option<Field>,
}
impl Label {
    pub fn new(text: impl Into<String>, field: Option<Field>) -> Self {
        Self { text: text.into(), field }
    }
}

/// The fixed strings a [`SectionHeuristic`] navigates a page by.
///
/// Landmarks are matched against the page's flattened text. Any whitespace in
/// a landmark matches any run of whitespace, and an ASCII apostrophe also
/// matches a typographic one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landmarks {
    /// Heading that opens the posting's detail block.
    pub detail_marker: String,
    /// Heading of the summary section; without it the page is not a detail page.
    pub info_marker: String,
    pub labels: Vec<Label>,
    /// Section headings that end a label's value.
    pub headings: Vec<String>,
    /// Text after which nothing belongs to the description.
    pub end_markers: Vec<String>,
    /// Buttons and badges interleaved with the title and company.
    pub noise: Vec<String>,
    /// Legal-entity suffixes, matched as whole words.
    pub company_suffixes: Vec<String>,
    pub organisation_prefixes: Vec<String>,
    /// Words betraying a listing or category title rather than a posting's.
    pub seo_words: Vec<String>,
    /// How many words of the header are considered for the title and company.
    pub header_words: usize,
    pub min_description_chars: usize,
    pub max_description_chars: usize,
}

impl Landmarks {
    /// French-language detail pages of jobup.ch.
    pub fn jobup() -> Self {
        Self {
            detail_marker: "Détails de l'annonce d'emploi".to_string(),
            info_marker: "Infos sur l'emploi".to_string(),
            labels: vec![
                Label::new("Date de publication", None),
                Label::new("Taux d'activité", None),
                Label::new("Type de contrat", Some(Field::ContractType)),
                Label::new("Lieu de travail", Some(Field::Location)),
            ],
            headings: strings(&["Nous recherchons", "Missions", "Profil", "Conditions", "À propos"]),
            end_markers: strings(&[
                "À propos de l'entreprise",
                "Catégories:",
                "Ouvrir dans un nouvel onglet",
                "Signaler cette offre",
            ]),
            noise: strings(&[
                "Postuler",
                "Sauvegarder",
                "Signaler cette offre d'emploi",
                "Ouvrir dans un nouvel onglet",
                "Candidature simplifiée",
                "Nouveau",
                "Mis en avant",
            ]),
            company_suffixes: strings(&[
                "SA", "AG", "Sàrl", "SÀRL", "SARL", "sàrl", "GmbH", "Ltd", "Ltd.", "Inc", "Inc.", "LLC", "Co.", "S.A.", "S.A",
            ]),
            organisation_prefixes: strings(&["Ville de", "Canton de", "Fondation", "Association", "Groupe"]),
            seo_words: strings(&["offres d'emploi", "catégorie"]),
            header_words: 30,
            min_description_chars: 200,
            max_description_chars: 8000,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// Reads detail pages laid out as: a detail heading, the title and company,
/// a summary section of `label: value` pairs, then the free-text description
/// up to an end marker.
#[derive(Debug)]
pub struct SectionHeuristic {
    name: String,
    domains: Vec<String>,
    landmarks: Landmarks,
    detail_marker: Regex,
    info_marker: Regex,
    end_marker: Option<Regex>,
    noise: Option<Regex>,
    organisation: Option<Regex>,
    /// One pattern per label with `span`, `value` and `stop` groups.
    labels: Vec<(Option<Field>, Regex)>,
}

impl SectionHeuristic {
    pub fn new(
        name: impl Into<String>,
        domains: impl IntoIterator<Item = impl Into<String>>,
        landmarks: Landmarks,
    ) -> Result<Self> {
        let name = name.into();
        let compile = |pattern: String| -> Result<Regex> {
            match Regex::new(&pattern) {
                Ok(regex) => Ok(regex),
                Err(err) => exn::bail!(ErrorKind::InvalidLandmarks {
                    heuristic: name.clone(),
                    reason: err.to_string(),
                }),
            }
        };
        let mut labels = Vec::with_capacity(landmarks.labels.len());
        for label in &landmarks.labels {
            let stops: Vec<String> = landmarks
                .labels
                .iter()
                .filter(|other| other.text != label.text)
                .map(|other| format!(r"{}\s*:", landmark(&other.text)))
                .chain(landmarks.headings.iter().map(|heading| landmark(heading)))
                .collect();
            let stop = match stops.is_empty() {
                true => "$".to_string(),
                false => format!(r"\s+(?:{})", stops.join("|")),
            };
            let pattern = format!(r"(?P<span>{}\s*:\s*(?P<value>.+?))(?P<stop>{stop})", landmark(&label.text));
            labels.push((label.field, compile(pattern)?));
        }
        Ok(Self {
            detail_marker: compile(landmark(&landmarks.detail_marker))?,
            info_marker: compile(landmark(&landmarks.info_marker))?,
            end_marker: alternation(&landmarks.end_markers, false).map(compile).transpose()?,
            noise: alternation(&landmarks.noise, true).map(compile).transpose()?,
            organisation: alternation(&landmarks.organisation_prefixes, true).map(compile).transpose()?,
            labels,
            domains: domains.into_iter().map(|domain| domain.into().to_lowercase()).collect(),
            landmarks,
            name,
        })
    }

    /// Header text between the detail marker and the summary section, without
    /// buttons and badges, cut to the configured number of words.
    fn header(&self, raw: &str) -> String {
        let cleaned = match &self.noise {
            Some(noise) => noise.replace_all(raw, " "),
            None => raw.into(),
        };
        cleaned.split_whitespace().take(self.landmarks.header_words).collect::<Vec<_>>().join(" ")
    }

    /// Splits the header into `(title, company)`.
    ///
    /// The company ends at the first legal-entity suffix and starts at most
    /// three words earlier, spreading backwards over capitalised words only.
    /// Whatever precedes the company is the title. Failing a suffix, a known
    /// organisation prefix starts the company. Failing both, the whole header
    /// is the title.
    fn split_header(&self, header: &str) -> (Option<String>, Option<String>) {
        let words: Vec<&str> = header.split_whitespace().collect();
        let suffix = words
            .iter()
            .skip(1)
            .position(|word| self.landmarks.company_suffixes.iter().any(|suffix| suffix == word.trim_end_matches(',')))
            .map(|position| position + 1);
        if let Some(end) = suffix {
            let mut begin = end - 1;
            while begin > 0 && end - begin < 3 && starts_uppercase(words[begin - 1]) {
                begin -= 1;
            }
            if begin == 0 && end >= 2 {
                begin = 1;
            }
            let company = words[begin..=end].join(" ");
            let title = words[..begin].join(" ");
            return (non_empty(title), non_empty(company.trim_end_matches(',').to_string()));
        }
        if let Some(organisation) = self.organisation.as_ref().and_then(|pattern| pattern.find(header)) {
            let title = header[..organisation.start()].trim().to_string();
            let company = header[organisation.start()..].trim().to_string();
            return (non_empty(title), non_empty(company));
        }
        (non_empty(header.trim().to_string()), None)
    }

    fn description(&self, body: &str) -> Option<String> {
        let body = match self.end_marker.as_ref().and_then(|pattern| pattern.find(body)) {
            Some(end) => &body[..end.start()],
            None => body,
        };
        let mut text = body.to_string();
        for (_, pattern) in &self.labels {
            text = pattern.replace_all(&text, "$stop").into_owned();
        }
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        (char_len(&text) > self.landmarks.min_description_chars)
            .then(|| truncate_chars(&text, self.landmarks.max_description_chars).to_string())
    }

    fn looks_like_seo(&self, title: &str) -> bool {
        let title = fold_apostrophes(title).to_lowercase();
        self.landmarks.seo_words.iter().any(|word| title.contains(&fold_apostrophes(word).to_lowercase()))
    }
}

impl SiteHeuristic for SectionHeuristic {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, domain: &str) -> bool {
        self.domains.iter().any(|candidate| candidate == domain)
    }

    #[instrument(skip_all, fields(heuristic = %self.name))]
    fn extract(&self, document: &Document, record: &mut Record) {
        let text = document.full_text();
        let Some(marker) = self.detail_marker.find(&text) else {
            tracing::trace!("Detail marker not found");
            return;
        };
        let detail = &text[marker.start()..];
        let Some(info) = self.info_marker.find(detail) else {
            tracing::debug!("Detail marker without summary section; probably a listing");
            return;
        };

        for (field, pattern) in &self.labels {
            if let Some(field) = field
                && !record.has(*field)
                && let Some(value) = pattern.captures(detail).and_then(|captures| captures.name("value"))
            {
                record.set_if_absent(*field, value.as_str());
            }
        }

        let header = self.header(detail.get(marker.len()..info.start()).unwrap_or_default());
        let (title, company) = self.split_header(&header);
        if let Some(title) = title.filter(|title| !self.looks_like_seo(title)) {
            // A listing-style title from an earlier source is worse than none.
            record.replace_if_richer(Field::Title, title, |_, current| self.looks_like_seo(current));
        }
        if let Some(company) = company {
            record.set_if_absent(Field::Company, company);
        }
        if !record.has(Field::Description)
            && let Some(description) = self.description(&detail[info.end()..])
        {
            record.set_if_absent(Field::Description, description);
        }

        let plausible_title = record.get(Field::Title).is_some_and(|title| !self.looks_like_seo(title));
        let substantial = record
            .get(Field::Description)
            .is_some_and(|description| char_len(description) > self.landmarks.min_description_chars);
        if plausible_title && substantial {
            record.mark_detail();
        }
    }
}

/// Regex source matching `text` literally, up to whitespace and apostrophes.
fn landmark(text: &str) -> String {
    regex::escape(text.trim()).replace('\'', "['’]").replace(' ', r"\s+")
}

fn alternation(items: &[String], whole_words: bool) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let branches = items.iter().map(|item| landmark(item)).collect::<Vec<_>>().join("|");
    Some(match whole_words {
        true => format!(r"\b(?:{branches})\b"),
        false => format!("(?:{branches})"),
    })
}

fn starts_uppercase(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const MISSIONS: &str = "Vous concevez et maintenez les services de paiement utilisés par nos clients en Suisse \
        romande. Vous participez aux revues de code, accompagnez les profils juniors et contribuez à \
        l'amélioration continue de notre plateforme cloud ainsi qu'à la qualité de nos livraisons.";

    fn detail_page(title: &str) -> String {
        format!(
            r#"<html><head><title>Offres d'emploi - jobup.ch</title></head><body>
            <header><a>Connexion</a><button>Postuler</button></header>
            <main>
              <h2>Détails de l'annonce d'emploi</h2>
              <span>Nouveau</span><span>Candidature simplifiée</span>
              <h1>{title}</h1>
              <a>Acme Solutions SA</a>
              <button>Postuler</button><button>Sauvegarder</button>
              <h3>Infos sur l’emploi</h3>
              <ul>
                <li>Date de publication : 3 mars 2025</li>
                <li>Taux d’activité : 80 – 100%</li>
                <li>Type de contrat : Durée indéterminée</li>
                <li>Lieu de travail : Lausanne</li>
              </ul>
              <h3>Nous recherchons</h3><p>{MISSIONS}</p>
              <h3>Profil</h3><p>Master en informatique.</p>
              <h3>À propos de l’entreprise</h3><p>Acme est une entreprise familiale.</p>
            </main>
            <footer>Signaler cette offre d'emploi</footer>
            </body></html>"#
        )
    }

    fn jobup() -> SectionHeuristic {
        SectionHeuristic::new("jobup", ["jobup.ch"], Landmarks::jobup()).unwrap()
    }

    #[test]
    fn reads_a_detail_page() {
        let mut record = Record::new();
        jobup().extract(&Document::parse(&detail_page("Ingénieur logiciel senior")), &mut record);
        assert_eq!(record.get(Field::Title), Some("Ingénieur logiciel senior"));
        assert_eq!(record.get(Field::Company), Some("Acme Solutions SA"));
        assert_eq!(record.get(Field::Location), Some("Lausanne"));
        assert_eq!(record.get(Field::ContractType), Some("Durée indéterminée"));
        let description = record.get(Field::Description).unwrap();
        assert!(description.starts_with("Nous recherchons Vous concevez"), "{description}");
        assert!(description.ends_with("Profil Master en informatique."), "{description}");
        assert!(!description.contains("Lieu de travail"));
        assert!(!description.contains("Date de publication"));
        assert!(!description.contains("entreprise familiale"));
        assert!(record.has_detail());
    }

    #[test]
    fn listing_without_summary_section_is_ignored() {
        let html = "<main><h2>Détails de l'annonce d'emploi</h2><p>Ingénieur</p><p>Comptable</p></main>";
        let mut record = Record::new();
        jobup().extract(&Document::parse(html), &mut record);
        assert_eq!(record, Record::new());
    }

    #[test]
    fn keeps_higher_priority_values() {
        let mut record = Record::new();
        record.set_if_absent(Field::Title, "Ingénieur (JSON-LD)");
        record.set_if_absent(Field::Location, "Genève");
        jobup().extract(&Document::parse(&detail_page("Ingénieur logiciel senior")), &mut record);
        assert_eq!(record.get(Field::Title), Some("Ingénieur (JSON-LD)"));
        assert_eq!(record.get(Field::Location), Some("Genève"));
        assert_eq!(record.get(Field::ContractType), Some("Durée indéterminée"));
    }

    #[test]
    fn replaces_a_listing_style_title() {
        let mut record = Record::new();
        record.set_if_absent(Field::Title, "Offres d'emploi Ingénieur à Lausanne");
        jobup().extract(&Document::parse(&detail_page("Ingénieur logiciel senior")), &mut record);
        assert_eq!(record.get(Field::Title), Some("Ingénieur logiciel senior"));
        assert!(record.has_detail());
    }

    #[test]
    fn overrides_a_listing_style_opengraph_title() {
        let html = detail_page("Ingénieur logiciel senior").replacen(
            "<head>",
            r#"<head><meta property="og:title" content="Offres d’emploi Informatique à Lausanne">"#,
            1,
        );
        let document = Document::parse(&html);
        let mut record = Record::new();
        crate::probe(&document, &mut record);
        assert_eq!(record.get(Field::Title), Some("Offres d’emploi Informatique à Lausanne"));
        jobup().extract(&document, &mut record);
        assert_eq!(record.get(Field::Title), Some("Ingénieur logiciel senior"));
        assert!(record.has_detail());
    }

    #[test]
    fn seo_title_is_not_a_detail_page() {
        let mut record = Record::new();
        jobup().extract(&Document::parse(&detail_page("Catégorie Informatique")), &mut record);
        assert!(!record.has(Field::Title));
        assert!(record.has(Field::Description));
        assert!(!record.has_detail());
    }

    #[test]
    fn short_description_is_not_a_detail_page() {
        let html = "<main>Détails de l'annonce d'emploi Comptable Fiduciaire Dupont Sàrl Infos sur l'emploi \
                    Lieu de travail : Sion Nous recherchons Un comptable.</main>";
        let mut record = Record::new();
        jobup().extract(&Document::parse(html), &mut record);
        assert_eq!(record.get(Field::Title), Some("Comptable"));
        assert_eq!(record.get(Field::Company), Some("Fiduciaire Dupont Sàrl"));
        assert_eq!(record.get(Field::Location), Some("Sion"));
        assert!(!record.has(Field::Description));
        assert!(!record.has_detail());
    }

    #[rstest]
    #[case("Ingénieur logiciel Acme Solutions SA", Some("Ingénieur logiciel"), Some("Acme Solutions SA"))]
    #[case("Comptable Nestlé S.A. Vevey", Some("Comptable"), Some("Nestlé S.A."))]
    #[case("Responsable RH Big Blue Data Systems AG", Some("Responsable RH Big"), Some("Blue Data Systems AG"))]
    #[case("Ingénieur Acme SA", Some("Ingénieur"), Some("Acme SA"))]
    #[case("Acme SA", None, Some("Acme SA"))]
    #[case("Bibliothécaire Ville de Lausanne", Some("Bibliothécaire"), Some("Ville de Lausanne"))]
    #[case("Éducateur social Fondation Les Oliviers", Some("Éducateur social"), Some("Fondation Les Oliviers"))]
    #[case("Vendeur en magasin", Some("Vendeur en magasin"), None)]
    #[case("", None, None)]
    fn splits_title_and_company(#[case] header: &str, #[case] title: Option<&str>, #[case] company: Option<&str>) {
        let (found_title, found_company) = jobup().split_header(header);
        assert_eq!(found_title.as_deref(), title);
        assert_eq!(found_company.as_deref(), company);
    }

    #[test]
    fn header_drops_noise_and_long_tails() {
        let heuristic = jobup();
        assert_eq!(heuristic.header(" Nouveau Mis en avant Comptable  Postuler Sauvegarder "), "Comptable");
        let long = (0..40).map(|i| format!("mot{i}")).collect::<Vec<_>>().join(" ");
        assert_eq!(heuristic.header(&long).split_whitespace().count(), 30);
    }

    #[test]
    fn matches_exact_domains_only() {
        let heuristic = jobup();
        assert!(heuristic.matches("jobup.ch"));
        assert!(!heuristic.matches("jobs.ch"));
    }

    #[test]
    fn empty_landmark_lists_still_compile() {
        let landmarks = Landmarks {
            labels: vec![Label::new("Lieu", Some(Field::Location))],
            headings: Vec::new(),
            end_markers: Vec::new(),
            noise: Vec::new(),
            organisation_prefixes: Vec::new(),
            ..Landmarks::jobup()
        };
        let heuristic = SectionHeuristic::new("bare", ["example.org"], landmarks).unwrap();
        let mut record = Record::new();
        let html = "<p>Détails de l'annonce d'emploi Poste Infos sur l'emploi Lieu : Berne</p>";
        heuristic.extract(&Document::parse(html), &mut record);
        assert_eq!(record.get(Field::Location), Some("Berne"));
    }
}
