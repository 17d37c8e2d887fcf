//! HTML rendering with handlebars
//!
//! The page templates are embedded at compile time. Handlers build a view
//! model and hand it to [`Renderer`]; all text is HTML-escaped by handlebars
//! except the chart JSON, which is produced by `serde_json` from fixed labels.

use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;

use crate::geo::{regions, LocationSpec};
use crate::pipeline::QueryReport;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.hbs");
const LOGIN_TEMPLATE: &str = include_str!("../../templates/login.hbs");
const NOT_LOGGED_IN_TEMPLATE: &str = include_str!("../../templates/not_logged_in.hbs");

/// Shown when a query returns no posts
pub const NO_RESULTS_NOTICE: &str = "Could not retrieve any tweets";

/// Page renderer
pub struct Renderer {
    handlebars: Handlebars<'static>,
}

impl Renderer {
    /// Create a renderer with the embedded templates
    pub fn new() -> Result<Self, TemplateError> {
        let mut handlebars = Handlebars::new();
        handlebars.register_template_string("index", INDEX_TEMPLATE)?;
        handlebars.register_template_string("login", LOGIN_TEMPLATE)?;
        handlebars.register_template_string("not_logged_in", NOT_LOGGED_IN_TEMPLATE)?;
        Ok(Self { handlebars })
    }

    pub fn index(&self, view: &IndexView) -> Result<String, RenderError> {
        self.handlebars.render("index", view)
    }

    pub fn login(&self, error: Option<&str>) -> Result<String, RenderError> {
        self.handlebars
            .render("login", &serde_json::json!({ "error": error }))
    }

    pub fn not_logged_in(&self) -> Result<String, RenderError> {
        self.handlebars
            .render("not_logged_in", &serde_json::json!({}))
    }
}

// ============================================================================
// View models
// ============================================================================

/// Values echoed back into the search form
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormValues {
    pub search_word: String,
    pub date: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionOption {
    pub code: &'static str,
    pub name: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateView {
    pub name: &'static str,
    pub positive: String,
    pub negative: String,
    pub neutral: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SliceView {
    pub category: &'static str,
    pub value: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostRow {
    pub text: String,
    pub handle: String,
    pub location: String,
    pub svm: &'static str,
    pub logistic: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub search_term: String,
    pub location: String,
    pub total: usize,
    pub skipped: usize,
    pub primary_name: &'static str,
    pub aggregates: Vec<AggregateView>,
    pub slices: Vec<SliceView>,
    pub chart_json: String,
    pub posts: Vec<PostRow>,
}

impl ReportView {
    pub fn from_report(report: &QueryReport) -> Self {
        let aggregate_view = |name, aggregate: &crate::pipeline::Aggregate| AggregateView {
            name,
            positive: format!("{:.1}", aggregate.positive_pct),
            negative: format!("{:.1}", aggregate.negative_pct),
            neutral: format!("{:.1}", aggregate.neutral_pct),
        };

        Self {
            search_term: report.search_term.clone(),
            location: report.location.clone(),
            total: report.posts.len(),
            skipped: report.skipped,
            primary_name: report.primary.display_name(),
            aggregates: vec![
                aggregate_view("Linear SVM", &report.svm),
                aggregate_view("Logistic Regression", &report.logistic),
            ],
            slices: report
                .chart
                .slices
                .iter()
                .map(|slice| SliceView {
                    category: slice.category.as_str(),
                    value: format!("{:.1}", slice.value),
                    color: slice.color,
                })
                .collect(),
            chart_json: report.chart.plotly_json(),
            posts: report
                .posts
                .iter()
                .map(|analyzed| PostRow {
                    text: analyzed.post.text.clone(),
                    handle: analyzed.post.author_handle.clone(),
                    location: analyzed.post.author_location.clone().unwrap_or_default(),
                    svm: analyzed.svm.as_str(),
                    logistic: analyzed.logistic.as_str(),
                })
                .collect(),
        }
    }
}

/// Everything the main page shows
#[derive(Debug, Clone, Serialize)]
pub struct IndexView {
    pub username: String,
    pub regions: Vec<RegionOption>,
    pub form: FormValues,
    pub report: Option<ReportView>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

impl IndexView {
    /// Empty search page for `username`
    pub fn new(username: impl Into<String>, form: FormValues) -> Self {
        let selected = match LocationSpec::parse(&form.location) {
            Ok(LocationSpec::Region(region)) => Some(region.code),
            _ => None,
        };

        Self {
            username: username.into(),
            regions: regions()
                .iter()
                .map(|region| RegionOption {
                    code: region.code,
                    name: region.name,
                    selected: Some(region.code) == selected,
                })
                .collect(),
            form,
            report: None,
            notice: None,
            error: None,
        }
    }

    pub fn with_report(mut self, report: &QueryReport) -> Self {
        self.report = Some(ReportView::from_report(report));
        self
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_register() {
        assert!(Renderer::new().is_ok());
    }

    #[test]
    fn test_index_escapes_username() {
        let renderer = Renderer::new().unwrap();
        let view = IndexView::new("<b>eve</b>", FormValues::default());
        let html = renderer.index(&view).unwrap();
        assert!(html.contains("&lt;b&gt;eve&lt;/b&gt;"));
        assert!(!html.contains("<b>eve</b>"));
    }

    #[test]
    fn test_selected_region() {
        let form = FormValues {
            location: "ireland".to_string(),
            ..FormValues::default()
        };
        let view = IndexView::new("alice", form);
        let selected: Vec<_> = view.regions.iter().filter(|r| r.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].code, "IE");
    }

    #[test]
    fn test_notice_rendered() {
        let renderer = Renderer::new().unwrap();
        let view = IndexView::new("alice", FormValues::default()).with_notice(NO_RESULTS_NOTICE);
        let html = renderer.index(&view).unwrap();
        assert!(html.contains(NO_RESULTS_NOTICE));
        assert!(!html.contains("Plotly.newPlot"));
    }

    #[test]
    fn test_login_and_not_logged_in_pages() {
        let renderer = Renderer::new().unwrap();
        assert!(renderer.login(None).unwrap().contains("name=\"username\""));
        assert!(renderer.login(Some("Username required")).unwrap().contains("Username required"));
        assert!(renderer.not_logged_in().unwrap().contains("href=\"/login\""));
    }
}
