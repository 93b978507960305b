use jobimport_fetch::MockFetcher;
use jobimport_fetch::Renderer;
use jobimport_fetch::error::ErrorKind as FetchErrorKind;
use jobimport_pipeline::error::ErrorKind;
use jobimport_pipeline::{Field, FileDumpWriter, Importer, Mode, Record};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const JOBUP_URL: &str = "https://www.jobup.ch/fr/emplois/detail/8a3f/";

const JOBUP_SHELL: &str = r#"<html><head><title>Offres d'emploi | jobup.ch</title>
    <meta property="og:description" content="Trouvez votre emploi parmi des milliers d'annonces">
    </head><body><div id="app"></div></body></html>"#;

const JOBUP_DETAIL: &str = r#"<html><head><title>Offres d'emploi - jobup.ch</title></head><body>
    <header><a>Connexion</a></header>
    <main>
      <h2>Détails de l'annonce d'emploi</h2>
      <h1>Développeuse backend</h1>
      <a>Helvetia Paiements SA</a>
      <button>Postuler</button>
      <h3>Infos sur l'emploi</h3>
      <ul>
        <li>Type de contrat : Durée indéterminée</li>
        <li>Lieu de travail : Genève</li>
      </ul>
      <h3>Nous recherchons</h3>
      <p>Vous concevez et maintenez les services de paiement utilisés par nos clients en Suisse romande.
         Vous participez aux revues de code, accompagnez les profils juniors et contribuez à l'amélioration
         continue de notre plateforme ainsi qu'à la qualité de nos livraisons.</p>
      <h3>À propos de l'entreprise</h3><p>Une entreprise familiale.</p>
    </main>
    </body></html>"#;

struct Harness {
    dumps: TempDir,
    fetcher: Arc<MockFetcher>,
    renderer: Option<Arc<MockFetcher>>,
}

impl Harness {
    fn new(fetcher: MockFetcher) -> Self {
        Self {
            dumps: tempfile::tempdir().unwrap(),
            fetcher: Arc::new(fetcher),
            renderer: None,
        }
    }

    fn with_renderer(mut self, renderer: MockFetcher) -> Self {
        self.renderer = Some(Arc::new(renderer.named("mock-browser")));
        self
    }

    fn importer(&self) -> Importer {
        let renderer = match &self.renderer {
            Some(renderer) => Renderer::Available(renderer.clone()),
            None => Renderer::Unavailable("not installed".to_string()),
        };
        Importer::new(self.fetcher.clone(), Arc::new(FileDumpWriter::new(self.dumps.path())))
            .with_renderer(renderer)
            .with_browser_domains(["jobup.ch"])
    }

    fn dump_count(&self) -> usize {
        match std::fs::read_dir(self.dumps.path()) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    fn rendered(&self) -> usize {
        self.renderer.as_ref().map_or(0, |renderer| renderer.requests().len())
    }
}

fn job_posting(fields: &str) -> String {
    format!(r#"<script type="application/ld+json">{{"@type": "JobPosting", {fields}}}</script>"#)
}

fn assert_dump_exists(record: &Record, dumps: &Path) {
    let path = record.dump_path().expect("dump path");
    assert!(path.starts_with(dumps), "{} outside {}", path.display(), dumps.display());
    assert!(path.is_file());
}

#[tokio::test]
async fn json_ld_posting_is_imported() {
    let html = job_posting(r#""title": "Ingénieur Logiciel", "hiringOrganization": {"name": "Acme SA"}"#);
    let harness = Harness::new(MockFetcher::with_pages([("https://example.com/offre/1", html)]));
    let record = harness.importer().import("https://example.com/offre/1", Mode::Auto).await.unwrap();
    assert_eq!(record.get(Field::Title), Some("Ingénieur Logiciel"));
    assert_eq!(record.get(Field::Company), Some("Acme SA"));
    assert!(record.has_jobposting());
    assert_eq!(record.to_map()["_has_jobposting"], "true");
    assert_dump_exists(&record, harness.dumps.path());
}

#[tokio::test]
async fn marketing_listing_is_rejected_with_a_dump() {
    let html = r#"<html><head><title>Emplois - résultats de recherche</title>
        <meta property="og:description" content="Trouvez votre emploi idéal, postulez maintenant sur JobSite">
        </head><body><p>Résultats</p></body></html>"#;
    let harness = Harness::new(MockFetcher::with_pages([("https://jobsite.example/emplois", html)]));
    let err = harness.importer().import("https://jobsite.example/emplois", Mode::Auto).await.unwrap_err();
    let ErrorKind::UnsupportedPage(Some(path)) = &*err else {
        panic!("expected an unsupported page with a dump, got {:?}", &*err);
    };
    assert!(path.is_file());
    let kind: &ErrorKind = &err;
    assert!(kind.to_string().contains(&path.display().to_string()));
    let dump = std::fs::read_to_string(path).unwrap();
    assert!(dump.contains("og:description: Trouvez votre emploi idéal, postulez maintenant sur JobSite"));
    assert!(dump.contains("Title: Emplois - résultats de recherche"));
}

#[tokio::test]
async fn soft_block_without_browser_fallback_is_a_fetch_error() {
    let fetcher = MockFetcher::default().failing("https://example.com/offre/2", FetchErrorKind::Blocked(403));
    let harness = Harness::new(fetcher);
    let err = harness.importer().import("https://example.com/offre/2", Mode::Auto).await.unwrap_err();
    let kind: &ErrorKind = &err;
    assert!(matches!(kind, ErrorKind::Fetch(_)));
    assert!(kind.to_string().contains("403"), "{kind}");
    assert!(kind.suggests_browser());
    assert_eq!(harness.dump_count(), 0);
}

#[tokio::test]
async fn identical_html_yields_identical_records() {
    let html = format!(
        r#"<title>Comptable - Fiduciaire</title><meta property="og:site_name" content="Fiduciaire">{}"#,
        job_posting(r#""title": "Comptable", "employmentType": "FULL_TIME", "description": "<p>Tenue des comptes</p>""#)
    );
    let harness = Harness::new(MockFetcher::with_pages([("https://example.com/offre/3", html)]));
    let importer = harness.importer();
    let first = importer.import("https://example.com/offre/3", Mode::Auto).await.unwrap();
    let second = importer.import("https://example.com/offre/3", Mode::Auto).await.unwrap();
    assert_eq!(first.prefill(), second.prefill());
    assert_eq!(first.has_jobposting(), second.has_jobposting());
    assert_eq!(first.has_detail(), second.has_detail());
    assert_eq!(first.og_description(), second.og_description());
}

#[tokio::test]
async fn opengraph_title_outranks_json_ld() {
    let html = format!(
        r#"<meta property="og:title" content="Titre OpenGraph">{}"#,
        job_posting(r#""title": "Titre JSON-LD", "hiringOrganization": {"name": "Acme SA"}"#)
    );
    let harness = Harness::new(MockFetcher::with_pages([("https://example.com/offre/4", html)]));
    let record = harness.importer().import("https://example.com/offre/4", Mode::Auto).await.unwrap();
    assert_eq!(record.get(Field::Title), Some("Titre OpenGraph"));
    assert_eq!(record.get(Field::Company), Some("Acme SA"));
}

#[tokio::test]
async fn richer_json_ld_description_wins() {
    let short = "c".repeat(50);
    let long = "l".repeat(500);
    for (first, second) in [(&short, &long), (&long, &short)] {
        let html = format!(
            "{}{}",
            job_posting(&format!(r#""description": "{first}""#)),
            job_posting(&format!(r#""description": "{second}""#))
        );
        let harness = Harness::new(MockFetcher::with_pages([("https://example.com/offre/5", html)]));
        let record = harness.importer().import("https://example.com/offre/5", Mode::Auto).await.unwrap();
        assert_eq!(record.get(Field::Description), Some(long.as_str()));
    }
}

#[tokio::test]
async fn malformed_json_ld_is_tolerated() {
    let html = r#"<head><meta property="og:title" content="Cuisinier"></head>
        <script type="application/ld+json">{"@type": "JobPosting", "title": </script>
        <body><p>Brigade de cinq personnes.</p></body>"#;
    let harness = Harness::new(MockFetcher::with_pages([("https://example.com/offre/6", html)]));
    let record = harness.importer().import("https://example.com/offre/6", Mode::Auto).await.unwrap();
    assert_eq!(record.get(Field::Title), Some("Cuisinier"));
    assert_eq!(record.get(Field::Description), Some("Brigade de cinq personnes."));
    assert!(!record.has_jobposting());
}

#[tokio::test]
async fn shell_on_browser_domain_is_rendered() {
    let harness = Harness::new(MockFetcher::with_pages([(JOBUP_URL, JOBUP_SHELL)]))
        .with_renderer(MockFetcher::with_pages([(JOBUP_URL, JOBUP_DETAIL)]));
    let record = harness.importer().import(JOBUP_URL, Mode::Auto).await.unwrap();
    assert_eq!(harness.fetcher.requests().len(), 1);
    assert_eq!(harness.rendered(), 1);
    assert!(record.has_detail());
    assert_eq!(record.get(Field::Title), Some("Développeuse backend"));
    assert_eq!(record.get(Field::Company), Some("Helvetia Paiements SA"));
    assert_eq!(record.get(Field::Location), Some("Genève"));
    assert_eq!(record.get(Field::ContractType), Some("Durée indéterminée"));
    assert!(record.get(Field::Description).unwrap().starts_with("Nous recherchons Vous concevez"));
}

#[tokio::test]
async fn shell_elsewhere_is_not_rendered() {
    let url = "https://emplois.example.org/liste";
    let harness = Harness::new(MockFetcher::with_pages([(url, JOBUP_SHELL)]))
        .with_renderer(MockFetcher::with_pages([(url, JOBUP_DETAIL)]));
    let err = harness.importer().import(url, Mode::Auto).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::UnsupportedPage(Some(_))));
    assert_eq!(harness.rendered(), 0);
}

#[tokio::test]
async fn detail_page_on_browser_domain_is_not_rendered() {
    let html = job_posting(r#""title": "Infirmier""#);
    let harness = Harness::new(MockFetcher::with_pages([(JOBUP_URL, html)]))
        .with_renderer(MockFetcher::with_pages([(JOBUP_URL, JOBUP_DETAIL)]));
    let record = harness.importer().import(JOBUP_URL, Mode::Auto).await.unwrap();
    assert_eq!(record.get(Field::Title), Some("Infirmier"));
    assert_eq!(harness.rendered(), 0);
}

#[tokio::test]
async fn failed_static_fetch_falls_back_to_browser() {
    let harness = Harness::new(MockFetcher::default().failing(JOBUP_URL, FetchErrorKind::Blocked(429)))
        .with_renderer(MockFetcher::with_pages([(JOBUP_URL, JOBUP_DETAIL)]));
    let record = harness.importer().import(JOBUP_URL, Mode::Auto).await.unwrap();
    assert!(record.has_detail());
    assert_eq!(harness.rendered(), 1);
}

#[tokio::test]
async fn failed_render_after_failed_fetch_reports_the_fetch() {
    let harness = Harness::new(MockFetcher::default().failing(JOBUP_URL, FetchErrorKind::Blocked(403)))
        .with_renderer(MockFetcher::default().failing(JOBUP_URL, FetchErrorKind::ChromeTimeout(30500)));
    let err = harness.importer().import(JOBUP_URL, Mode::Auto).await.unwrap_err();
    let kind: &ErrorKind = &err;
    assert!(matches!(kind, ErrorKind::Fetch(message) if message.contains("403")), "{kind}");
    assert_eq!(harness.dump_count(), 0);
}

#[tokio::test]
async fn failed_render_after_probe_keeps_the_static_page() {
    let harness = Harness::new(MockFetcher::with_pages([(JOBUP_URL, JOBUP_SHELL)]))
        .with_renderer(MockFetcher::default().failing(JOBUP_URL, FetchErrorKind::EmptyRender));
    let err = harness.importer().import(JOBUP_URL, Mode::Auto).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::UnsupportedPage(Some(_))));
    assert_eq!(harness.rendered(), 1);
    assert_eq!(harness.dump_count(), 1);
}

#[tokio::test]
async fn unavailable_renderer_never_escalates() {
    let harness = Harness::new(MockFetcher::default().failing(JOBUP_URL, FetchErrorKind::Blocked(403)));
    let err = harness.importer().import(JOBUP_URL, Mode::Auto).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::Fetch(_)));
}

#[tokio::test]
async fn browser_mode_skips_the_static_fetch() {
    let harness =
        Harness::new(MockFetcher::default()).with_renderer(MockFetcher::with_pages([(JOBUP_URL, JOBUP_DETAIL)]));
    let record = harness.importer().import(JOBUP_URL, Mode::Browser).await.unwrap();
    assert!(harness.fetcher.requests().is_empty());
    assert_eq!(harness.rendered(), 1);
    assert_eq!(record.get(Field::SourceUrl), Some(JOBUP_URL));
    assert!(record.has_detail());
}

#[tokio::test]
async fn browser_mode_reports_where_the_render_ended() {
    let short = "https://jobup.ch/j/8a3f";
    let harness = Harness::new(MockFetcher::default())
        .with_renderer(MockFetcher::default().redirected(short, JOBUP_URL, JOBUP_DETAIL));
    let record = harness.importer().import(short, Mode::Browser).await.unwrap();
    assert_eq!(record.get(Field::Url), Some(short));
    assert_eq!(record.get(Field::SourceUrl), Some(JOBUP_URL));
    assert_eq!(record.get(Field::SourceSite), Some("www.jobup.ch"));
    assert!(record.has_detail());
}

#[tokio::test]
async fn failed_browser_mode_is_a_render_error() {
    let harness = Harness::new(MockFetcher::default())
        .with_renderer(MockFetcher::default().failing(JOBUP_URL, FetchErrorKind::ChromeFailed("exited before the page loaded".into())));
    let err = harness.importer().import(JOBUP_URL, Mode::Browser).await.unwrap_err();
    let kind: &ErrorKind = &err;
    assert!(matches!(kind, ErrorKind::Render(message) if message.contains("exited before the page loaded")), "{kind}");
    assert!(!kind.suggests_browser());
}
