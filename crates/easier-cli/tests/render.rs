use easier_cli::config::EasierConfig;
use easier_cli::render;
use easier_client::session::Session;
use easier_core::aggregate::{SortDirection, SortState};
use easier_core::dashboard::{UsageDashboard, UsageTable};
use easier_core::models::document::RetrievedPassage;
use easier_core::models::image::ImageDescription;
use easier_core::models::role::Role;
use easier_core::models::synthetic_user::SyntheticUser;
use easier_core::models::topic::{Article, TopicSummary};
use easier_core::models::usage::{UsageField, UsageRecord};

fn record(username: &str, feature: &str, input: u64, output: u64) -> UsageRecord {
    UsageRecord {
        username: username.to_string(),
        feature: feature.to_string(),
        input_tokens: input,
        output_tokens: output,
        total_tokens: input + output,
        timestamp: "2025-03-01T10:00:00".to_string(),
    }
}

#[test]
fn table_pads_columns() {
    let out = render::table(
        &["name", "n"],
        &[
            vec!["alice".to_string(), "1".to_string()],
            vec!["bo".to_string(), "20".to_string()],
        ],
    );
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "name   n");
    assert_eq!(lines[1], "-----  --");
    assert_eq!(lines[2], "alice  1");
    assert_eq!(lines[3], "bo     20");
}

#[test]
fn empty_table_says_none() {
    let out = render::table(&["feature"], &[]);
    assert!(out.ends_with("(none)\n"));
}

#[test]
fn usage_report_lists_all_sections() {
    let mut dashboard = UsageDashboard::new(vec![
        record("alice", "pdf", 10, 5),
        record("bob", "image", 3, 4),
        record("alice", "image", 1, 1),
    ]);
    dashboard.set_sort(
        UsageTable::ByFeature,
        SortState::new(UsageField::TotalTokens, SortDirection::Desc),
    );

    let out = render::usage_report(
        &dashboard.report(),
        render::UsageSorts {
            by_feature: dashboard.sort_state(UsageTable::ByFeature),
            ..Default::default()
        },
    );

    assert!(out.contains("Token usage (unsorted)"));
    assert!(out.contains("Total: input 14, output 10, total 24"));
    assert!(out.contains("By feature (total_tokens:desc)"));
    let pdf = out.find("\npdf").unwrap();
    let image = out.find("\nimage").unwrap();
    assert!(pdf < image, "pdf (15) sorts above image (9):\n{out}");
    assert!(out.contains("By user (unsorted)"));
}

#[test]
fn empty_usage_report_shows_zero_totals() {
    let report = UsageDashboard::default().report();
    let out = render::usage_report(&report, render::UsageSorts::default());
    assert!(out.contains("Total: input 0, output 0, total 0"));
    assert_eq!(out.matches("(none)").count(), 3);
}

#[test]
fn passages_show_scores_when_present() {
    let out = render::passages(&[
        RetrievedPassage {
            document: Some("Revenue grew.".to_string()),
            similarity: Some(0.8123),
            ..Default::default()
        },
        RetrievedPassage {
            answer: Some("Costs were flat.".to_string()),
            ..Default::default()
        },
    ]);
    assert_eq!(out, "1. [0.812] Revenue grew.\n2. Costs were flat.\n");
    assert_eq!(render::passages(&[]), "No passages matched.\n");
}

#[test]
fn structured_description_lists_fields() {
    let description = ImageDescription {
        hero_text: Some("Build faster".to_string()),
        color_palette: Some(vec!["#000".to_string(), "#fff".to_string()]),
        ..Default::default()
    };
    let out = render::image_description(&description);
    assert!(out.contains("Hero text: Build faster"));
    assert!(out.contains("Color palette: #000, #fff"));
    assert!(!out.contains("Tokens"));

    let empty = render::image_description(&ImageDescription::default());
    assert_eq!(empty, "The service returned no description.\n");
}

#[test]
fn topic_summary_lists_articles() {
    let summary = TopicSummary {
        articles: vec![Article {
            title: "Async in depth".to_string(),
            summary: "Futures are lazy.".to_string(),
            reference_link: "https://example.com/async".to_string(),
        }],
        ..Default::default()
    };
    let out = render::topic_summary(&summary);
    assert_eq!(
        out,
        "1. Async in depth\nFutures are lazy.\nSource: https://example.com/async\n"
    );
    assert_eq!(
        render::topic_summary(&TopicSummary::default()),
        "No articles found.\n"
    );
}

#[test]
fn synthetic_users_fill_gaps() {
    let row = SyntheticUser {
        firstname: Some("Ada".to_string()),
        salary: Some(serde_json::json!(1234.5)),
        ..Default::default()
    }
    .to_row();
    let out = render::synthetic_users(&[row]);
    assert!(out.contains("Ada"));
    assert!(out.contains("$1234.50"));
    assert_eq!(out.matches("N/A").count(), 3);
}

#[test]
fn users_failure_includes_raw_response() {
    let out = render::users_failure("Failed to parse JSON", Some("garbage"));
    assert!(out.contains("could not generate users: Failed to parse JSON"));
    assert!(out.contains("Raw response:\ngarbage"));
}

#[test]
fn whoami_reports_identity() {
    let now = jiff::Timestamp::from_second(0).unwrap();
    assert_eq!(render::whoami(&Session::anonymous(), now), "Not signed in.\n");
    assert_eq!(
        render::whoami(&Session::signed_in("opaque", "root", Role::Admin), now),
        "root (admin)\n"
    );
}

#[test]
fn config_notes_overridden_url() {
    let config = EasierConfig::default();
    let out = render::config(&config, "http://override:1");
    assert!(out.contains("api_url              http://override:1"));
    assert!(out.contains("(config file has http://127.0.0.1:8000)"));
    assert!(out.contains("timeout_secs         none"));
}
