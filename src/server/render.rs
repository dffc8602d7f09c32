use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::commands::ActionOutcome;
use crate::models::UsageReport;
use crate::utils::{escape_html, format_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Html,
    Json,
}

impl ResponseFormat {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => ResponseFormat::Json,
            _ => ResponseFormat::Html,
        }
    }
}

/// Report fields plus the figures derived from them.
#[derive(Debug, Clone, Serialize)]
pub struct UsageView {
    pub individual_count: u64,
    pub media_count: u64,
    pub database_size_mb: f64,
    pub media_directory_size_mb: f64,
    pub root_directory_size_mb: f64,
    pub other_files_mb: f64,
    pub total_server_mb: f64,
    pub generated_at: DateTime<Utc>,
}

impl From<&UsageReport> for UsageView {
    fn from(report: &UsageReport) -> Self {
        Self {
            individual_count: report.individual_count,
            media_count: report.media_count,
            database_size_mb: report.database_size_mb,
            media_directory_size_mb: report.media_directory_size_mb,
            root_directory_size_mb: report.root_directory_size_mb,
            other_files_mb: report.other_files_mb(),
            total_server_mb: report.total_server_mb(),
            generated_at: Utc::now(),
        }
    }
}

pub fn respond(outcome: ActionOutcome, format: ResponseFormat, precision: usize) -> Response {
    match (outcome, format) {
        (ActionOutcome::Report { report, .. }, ResponseFormat::Json) => {
            Json(UsageView::from(&report)).into_response()
        }
        (ActionOutcome::Report { title, report }, ResponseFormat::Html) => {
            Html(usage_page(&title, &report, precision)).into_response()
        }
        (ActionOutcome::Forbidden, _) => (
            StatusCode::FORBIDDEN,
            Html(message_page(
                "Access denied",
                "You do not have permission to view this page.",
            )),
        )
            .into_response(),
        (ActionOutcome::NotFound, _) => (
            StatusCode::NOT_FOUND,
            Html(message_page(
                "Not found",
                "The page you requested does not exist.",
            )),
        )
            .into_response(),
        (ActionOutcome::Unavailable { .. }, ResponseFormat::Json) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "usage unavailable" })),
        )
            .into_response(),
        (ActionOutcome::Unavailable { title, .. }, ResponseFormat::Html) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(message_page(&title, "Server usage is currently unavailable.")),
        )
            .into_response(),
    }
}

pub fn usage_page(title: &str, report: &UsageReport, precision: usize) -> String {
    let mb = |v: f64| format_number(v, precision);
    let lines = [
        format!("{} Individuals", format_number(report.individual_count as f64, 0)),
        format!("{} Media objects", format_number(report.media_count as f64, 0)),
        format!("Your database size is currently {} MB", mb(report.database_size_mb)),
        format!("Your media files are currently using {} MB", mb(report.media_directory_size_mb)),
        format!(
            "Your files excluding media items are currently using {} MB",
            mb(report.other_files_mb())
        ),
        format!("Total server space used is therefore {} MB", mb(report.total_server_mb())),
    ];

    let items: String = lines
        .iter()
        .map(|line| format!("\t\t\t\t\t<li>{}</li>\n", escape_html(line)))
        .collect();

    let body = format!(
        "\t\t<ol class=\"breadcrumb small\">\n\
         \t\t\t<li><a href=\"/admin\">Control panel</a></li>\n\
         \t\t\t<li><a href=\"/admin/modules\">Module administration</a></li>\n\
         \t\t\t<li class=\"active\">{title}</li>\n\
         \t\t</ol>\n\
         \t\t<div class=\"row\">\n\
         \t\t\t<div class=\"col-sm-8 col-xs-12\">\n\
         \t\t\t\t<h3>All trees</h3>\n\
         \t\t\t\t<ul class=\"server_stats\">\n\
         {items}\
         \t\t\t\t</ul>\n\
         \t\t\t</div>\n\
         \t\t</div>\n",
        title = escape_html(title),
        items = items,
    );
    document(title, &body)
}

fn message_page(title: &str, message: &str) -> String {
    let body = format!(
        "\t\t<h2>{}</h2>\n\t\t<p class=\"alert alert-warning\">{}</p>\n",
        escape_html(title),
        escape_html(message)
    );
    document(title, &body)
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n\t<head>\n\t\t<meta charset=\"utf-8\">\n\
         \t\t<title>{}</title>\n\t</head>\n\t<body>\n{}\t</body>\n</html>\n",
        escape_html(title),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> UsageReport {
        UsageReport {
            individual_count: 12_345,
            media_count: 678,
            database_size_mb: 3.0,
            media_directory_size_mb: 4.0,
            root_directory_size_mb: 10.0,
        }
    }

    #[test]
    fn page_lists_every_figure() {
        let page = usage_page("Server usage", &report(), 0);
        assert!(page.contains("<li>12,345 Individuals</li>"));
        assert!(page.contains("<li>678 Media objects</li>"));
        assert!(page.contains("Your database size is currently 3 MB"));
        assert!(page.contains("Your media files are currently using 4 MB"));
        assert!(page.contains("Your files excluding media items are currently using 6 MB"));
        assert!(page.contains("Total server space used is therefore 13 MB"));
        assert!(page.contains("<li class=\"active\">Server usage</li>"));
    }

    #[test]
    fn precision_applies_to_sizes_only() {
        let page = usage_page("Server usage", &report(), 2);
        assert!(page.contains("12,345 Individuals"));
        assert!(page.contains("currently 3.00 MB"));
    }

    #[test]
    fn json_view_includes_derived_figures() {
        let view = UsageView::from(&report());
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["other_files_mb"], 6.0);
        assert_eq!(value["total_server_mb"], 13.0);
        assert_eq!(value["individual_count"], 12_345);
    }

    #[test]
    fn format_parsing() {
        assert_eq!(ResponseFormat::parse(Some("JSON")), ResponseFormat::Json);
        assert_eq!(ResponseFormat::parse(Some("html")), ResponseFormat::Html);
        assert_eq!(ResponseFormat::parse(None), ResponseFormat::Html);
    }

    #[test]
    fn unavailable_never_shows_figures() {
        let response = respond(
            ActionOutcome::Unavailable {
                title: "Server usage".to_string(),
                reason: "database size failed".to_string(),
            },
            ResponseFormat::Html,
            0,
        );
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
