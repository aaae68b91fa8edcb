mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{json_body, TestApp};
use ragdesk::models::Role;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize)]
struct FaqBody {
    id: Uuid,
    question: String,
    answer: String,
    tags: Vec<String>,
    department: Option<String>,
    created_by: String,
    references: Vec<String>,
}

#[derive(Deserialize)]
struct FaqList {
    faqs: Vec<FaqBody>,
    total: usize,
}

#[derive(Deserialize)]
struct SuggestionBody {
    id: Uuid,
    question: String,
    suggested_answer: String,
    status: String,
}

#[derive(Deserialize)]
struct SuggestionList {
    suggestions: Vec<SuggestionBody>,
    total: usize,
}

#[tokio::test]
async fn created_faq_is_listed_first() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.token_for("editor@company.com", Role::User).await?;
    let it = app.department_id("IT").await?;

    let response = app
        .post_json(
            "/api/faqs",
            &json!({
                "question": "프린터 드라이버는 어디서 받나요?",
                "answer": "사내 포털 자료실에서 내려받을 수 있습니다.",
                "tags": "IT, 프린터,",
                "department_id": it,
                "references": "프린터 설치 가이드.pdf",
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: FaqBody = json_body(response).await?;
    assert_eq!(created.tags, vec!["IT", "프린터"]);
    assert_eq!(created.department.as_deref(), Some("IT"));
    assert_eq!(created.created_by, "editor");
    assert_eq!(created.references, vec!["프린터 설치 가이드.pdf"]);

    let list: FaqList = json_body(app.get("/api/faqs", Some(&token)).await?).await?;
    assert_eq!(list.total, 4);
    assert_eq!(list.faqs[0].id, created.id);
    assert_eq!(list.faqs[1].question, "연차는 어떻게 신청하나요?");

    let search: FaqList = json_body(
        app.get("/api/faqs?query=vpn", Some(&token)).await?,
    )
    .await?;
    assert_eq!(search.total, 1);
    assert_eq!(search.faqs[0].question, "VPN 접속이 안 될 때는 어떻게 하나요?");
    Ok(())
}

#[tokio::test]
async fn create_requires_tags_and_known_department() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.token_for("editor@company.com", Role::User).await?;
    let it = app.department_id("IT").await?;

    let no_tags = app
        .post_json(
            "/api/faqs",
            &json!({ "question": "q", "answer": "a", "tags": " , ", "department_id": it }),
            Some(&token),
        )
        .await?;
    assert_eq!(no_tags.status(), StatusCode::BAD_REQUEST);

    let unknown = app
        .post_json(
            "/api/faqs",
            &json!({
                "question": "q",
                "answer": "a",
                "tags": "x",
                "department_id": Uuid::new_v4(),
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn update_changes_only_given_fields_and_delete_needs_confirm() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.token_for("editor@company.com", Role::User).await?;
    let list: FaqList = json_body(app.get("/api/faqs", Some(&token)).await?).await?;
    let target = &list.faqs[0];

    let response = app
        .patch_json(
            &format!("/api/faqs/{}", target.id),
            &json!({ "answer": "인사팀에 문의하세요.", "tags": "HR, 연차" }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: FaqBody = json_body(response).await?;
    assert_eq!(updated.question, target.question);
    assert_eq!(updated.answer, "인사팀에 문의하세요.");
    assert_eq!(updated.tags, vec!["HR", "연차"]);

    let blank = app
        .patch_json(
            &format!("/api/faqs/{}", target.id),
            &json!({ "question": "   " }),
            Some(&token),
        )
        .await?;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let unconfirmed = app
        .delete(&format!("/api/faqs/{}", target.id), Some(&token))
        .await?;
    assert_eq!(unconfirmed.status(), StatusCode::BAD_REQUEST);

    let deleted = app
        .delete(&format!("/api/faqs/{}?confirm=true", target.id), Some(&token))
        .await?;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let list: FaqList = json_body(app.get("/api/faqs", Some(&token)).await?).await?;
    assert_eq!(list.total, 2);
    assert!(list.faqs.iter().all(|faq| faq.id != target.id));
    Ok(())
}

#[tokio::test]
async fn deleting_an_unknown_faq_changes_nothing() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.token_for("editor@company.com", Role::User).await?;

    let deleted = app
        .delete(
            &format!("/api/faqs/{}?confirm=true", Uuid::new_v4()),
            Some(&token),
        )
        .await?;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let list: FaqList = json_body(app.get("/api/faqs", Some(&token)).await?).await?;
    assert_eq!(list.total, 3);
    Ok(())
}

#[tokio::test]
async fn approving_a_suggestion_publishes_a_faq() -> Result<()> {
    let app = TestApp::new().await?;
    let user = app.token_for("staff@company.com", Role::User).await?;
    let admin = app.token_for("lead@company.com", Role::Admin).await?;
    let hr = app.department_id("HR").await?;

    let pending: SuggestionList =
        json_body(app.get("/api/faq-suggestions", Some(&admin)).await?).await?;
    assert_eq!(pending.total, 3);
    let suggestion = &pending.suggestions[0];
    assert_eq!(suggestion.status, "pending");

    let forbidden = app
        .post_json(
            &format!("/api/faq-suggestions/{}/approve", suggestion.id),
            &json!({ "department_id": hr, "tags": "HR" }),
            Some(&user),
        )
        .await?;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let untagged = app
        .post_json(
            &format!("/api/faq-suggestions/{}/approve", suggestion.id),
            &json!({ "department_id": hr }),
            Some(&admin),
        )
        .await?;
    assert_eq!(untagged.status(), StatusCode::BAD_REQUEST);

    let approved = app
        .post_json(
            &format!("/api/faq-suggestions/{}/approve", suggestion.id),
            &json!({ "department_id": hr, "tags": "HR, 제도" }),
            Some(&admin),
        )
        .await?;
    assert_eq!(approved.status(), StatusCode::CREATED);
    let faq: FaqBody = json_body(approved).await?;
    assert_eq!(faq.question, suggestion.question);
    assert_eq!(faq.answer, suggestion.suggested_answer);
    assert_eq!(faq.created_by, "lead");

    let faqs: FaqList = json_body(app.get("/api/faqs", Some(&admin)).await?).await?;
    assert_eq!(faqs.faqs[0].id, faq.id);

    let twice = app
        .post_json(
            &format!("/api/faq-suggestions/{}/approve", suggestion.id),
            &json!({ "department_id": hr, "tags": "HR" }),
            Some(&admin),
        )
        .await?;
    assert_eq!(twice.status(), StatusCode::CONFLICT);

    let pending: SuggestionList =
        json_body(app.get("/api/faq-suggestions", Some(&admin)).await?).await?;
    assert_eq!(pending.total, 2);
    Ok(())
}

#[tokio::test]
async fn rejected_suggestion_leaves_the_queue() -> Result<()> {
    let app = TestApp::new().await?;
    let admin = app.token_for("lead@company.com", Role::Admin).await?;

    let pending: SuggestionList =
        json_body(app.get("/api/faq-suggestions", Some(&admin)).await?).await?;
    let target = pending.suggestions[1].id;

    let rejected = app
        .post_empty(&format!("/api/faq-suggestions/{target}/reject"), Some(&admin))
        .await?;
    assert_eq!(rejected.status(), StatusCode::OK);
    let rejected: SuggestionBody = json_body(rejected).await?;
    assert_eq!(rejected.status, "rejected");

    let pending: SuggestionList =
        json_body(app.get("/api/faq-suggestions", Some(&admin)).await?).await?;
    assert_eq!(pending.total, 2);
    assert!(pending.suggestions.iter().all(|s| s.id != target));

    let faqs: FaqList = json_body(app.get("/api/faqs", Some(&admin)).await?).await?;
    assert_eq!(faqs.total, 3);
    Ok(())
}
