//! Textual report of URL records and their latest analysis
//!
//! One block per URL: status, the latest analysis result, and its links
//! with internal/external flag and probed status code.

use crate::model::UNREACHABLE_STATUS;
use crate::service::UrlResults;

/// Formats a report covering every given URL
pub fn format_report(results: &[UrlResults]) -> String {
    let mut out = String::new();
    out.push_str("# Url-Insight Report\n\n");

    if results.is_empty() {
        out.push_str("No URLs stored.\n");
        return out;
    }

    for entry in results {
        out.push_str(&format_url_report(entry));
        out.push('\n');
    }
    out
}

/// Formats the report block of one URL
pub fn format_url_report(results: &UrlResults) -> String {
    let record = &results.record;
    let mut out = String::new();

    out.push_str(&format!("## [{}] {}\n\n", record.id, record.original_url));
    out.push_str(&format!("- **Status**: {}\n", record.status));
    out.push_str(&format!("- **Updated**: {}\n", record.updated_at));
    out.push_str(&format!("- **Analyses**: {}\n", results.analyses.len()));

    let Some(latest) = results.latest() else {
        out.push_str("\nNo analysis stored.\n");
        return out;
    };

    let result = &latest.result;
    let headings = result.headings;
    out.push_str(&format!("- **HTML version**: {}\n", result.html_version));
    out.push_str(&format!("- **Title**: {}\n", result.title));
    out.push_str(&format!(
        "- **Headings**: h1={} h2={} h3={} h4={} h5={} h6={}\n",
        headings.h1, headings.h2, headings.h3, headings.h4, headings.h5, headings.h6
    ));
    out.push_str(&format!(
        "- **Login form**: {}\n",
        if result.has_login_form { "yes" } else { "no" }
    ));

    let links = results.latest_links();
    let external = links.iter().filter(|l| l.link.is_external).count();
    let broken = links.iter().filter(|l| l.link.is_broken()).count();
    out.push_str(&format!(
        "- **Links**: {} ({} internal, {} external, {} broken)\n",
        links.len(),
        links.len() - external,
        external,
        broken
    ));

    if !links.is_empty() {
        out.push_str("\n| Link | Kind | Status |\n");
        out.push_str("|------|------|--------|\n");
        for stored in links {
            let link = &stored.link;
            let status = if link.status_code == UNREACHABLE_STATUS {
                "unreachable".to_string()
            } else {
                link.status_code.to_string()
            };
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                link.href,
                if link.is_external { "external" } else { "internal" },
                status
            ));
        }
    }

    out
}
