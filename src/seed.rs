//! Start-up data: the demo fixtures shown by the dashboard and the bootstrap
//! administrator account.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;
use uuid::Uuid;

use crate::catalog::{
    Catalog, CatalogError, CatalogResult, EntityCollection, NewDepartment, NewUser, Placement,
    ProfileChanges,
};
use crate::dashboard::{DailyCount, DashboardStats, DocumentCount, TypeCount};
use crate::models::{
    AccessLevel, ChatLog, Document, DocumentStatus, Faq, FaqSuggestion, Feedback, ResponseType,
    Role, SuggestionStatus,
};

fn date(year: i32, month: u32, day: u32) -> CatalogResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| CatalogError::invalid(format!("invalid fixture date {year}-{month}-{day}")))
}

fn timestamp(raw: &str) -> CatalogResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map_err(|err| CatalogError::invalid(format!("invalid fixture timestamp {raw}: {err}")))
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Loads the demo organization into an empty catalog.
pub fn seed_fixtures(catalog: &mut Catalog) -> CatalogResult<()> {
    let mut department = |name: &str, parent_id: Option<Uuid>| {
        catalog
            .add_department(NewDepartment {
                name: name.to_string(),
                parent_id,
            })
            .map(|department| department.id)
    };
    let management = department("경영지원", None)?;
    let it = department("IT", Some(management))?;
    let hr = department("HR", Some(management))?;
    let finance = department("재무", Some(management))?;
    department("마케팅", None)?;

    catalog.register_user(NewUser {
        email: "admin@company.com".into(),
        name: "김관리".into(),
        nickname: Some("관리자".into()),
        department_id: Some(it),
        position: "팀장".into(),
        role: Role::Master,
        password_hash: None,
    })?;
    let regular = catalog.register_user(NewUser {
        email: "user@company.com".into(),
        name: "이사용".into(),
        nickname: Some("사용자1".into()),
        department_id: Some(hr),
        position: "사원".into(),
        role: Role::User,
        password_hash: None,
    })?;

    let document = |name: &str,
                    file_type: &str,
                    size: u64,
                    upload_date: NaiveDate,
                    uploaded_by: &str,
                    department_id: Uuid,
                    tag_values: &[&str],
                    access_level: AccessLevel,
                    status: DocumentStatus| Document {
        id: Uuid::new_v4(),
        name: name.into(),
        file_type: file_type.into(),
        size,
        upload_date,
        uploaded_by: uploaded_by.into(),
        department_id: Some(department_id),
        tags: tags(tag_values),
        access_level,
        status,
        content_type: None,
        checksum: None,
        storage_key: None,
    };
    catalog.documents = EntityCollection::with_items(
        Placement::Tail,
        vec![
            document(
                "직원 복지 가이드.pdf",
                "pdf",
                2_048_576,
                date(2024, 11, 1)?,
                "김관리",
                hr,
                &["HR", "복지", "가이드"],
                AccessLevel::Public,
                DocumentStatus::Approved,
            ),
            document(
                "IT 보안 정책.docx",
                "docx",
                1_024_000,
                date(2024, 11, 2)?,
                "김관리",
                it,
                &["IT", "보안", "정책"],
                AccessLevel::Department,
                DocumentStatus::Approved,
            ),
            document(
                "2024년 예산 계획.xlsx",
                "xlsx",
                3_145_728,
                date(2024, 11, 3)?,
                "박재무",
                finance,
                &["재무", "예산", "2024"],
                AccessLevel::Admin,
                DocumentStatus::Pending,
            ),
            document(
                "신입사원 온보딩 매뉴얼.pdf",
                "pdf",
                4_194_304,
                date(2024, 10, 28)?,
                "이인사",
                hr,
                &["HR", "온보딩", "교육"],
                AccessLevel::Public,
                DocumentStatus::Approved,
            ),
        ],
    );

    let faq = |question: &str,
               answer: &str,
               tag_values: &[&str],
               department_id: Uuid,
               created_at: NaiveDate,
               created_by: &str| Faq {
        id: Uuid::new_v4(),
        question: question.into(),
        answer: answer.into(),
        tags: tags(tag_values),
        department_id,
        created_at,
        created_by: created_by.into(),
        references: Vec::new(),
    };
    catalog.faqs = EntityCollection::with_items(
        Placement::Head,
        vec![
            faq(
                "연차는 어떻게 신청하나요?",
                "사내 포털의 전자결재 시스템에서 \"휴가신청\" 메뉴를 선택하여 신청할 수 있습니다.",
                &["HR", "휴가", "연차"],
                hr,
                date(2024, 10, 15)?,
                "이인사",
            ),
            faq(
                "VPN 접속이 안 될 때는 어떻게 하나요?",
                "IT 헬프데스크(내선 1234)로 연락하시거나, support@company.com으로 문의해 주세요.",
                &["IT", "VPN", "기술지원"],
                it,
                date(2024, 10, 20)?,
                "김기술",
            ),
            faq(
                "출장비는 어떻게 정산하나요?",
                "출장 종료 후 7일 이내에 영수증과 함께 경비정산 시스템에 등록하시면 됩니다.",
                &["재무", "출장", "정산"],
                finance,
                date(2024, 10, 25)?,
                "박재무",
            ),
        ],
    );

    // Two of the askers are not console accounts; they only appear in the logs.
    let newcomer = Uuid::new_v4();
    let employee = Uuid::new_v4();
    let log = |user_id: Uuid,
               user_name: &str,
               question: &str,
               answer: &str,
               response_type: ResponseType,
               response_time: f64,
               at: NaiveDateTime,
               referenced: &[&str]| ChatLog {
        id: Uuid::new_v4(),
        user_id,
        user_name: user_name.into(),
        question: question.into(),
        answer: answer.into(),
        response_type,
        response_time,
        timestamp: at,
        feedback: Some(Feedback::Positive),
        referenced_documents: tags(referenced),
    };
    catalog.chat_logs = EntityCollection::with_items(
        Placement::Tail,
        vec![
            log(
                regular.id,
                "이사용",
                "연차 신청 방법이 궁금합니다",
                "사내 포털의 전자결재 시스템에서 \"휴가신청\" 메뉴를 선택하여 신청할 수 있습니다.",
                ResponseType::Faq,
                1.2,
                timestamp("2024-11-05 09:15:30")?,
                &["직원 복지 가이드.pdf"],
            ),
            log(
                regular.id,
                "이사용",
                "VPN이 연결되지 않아요",
                "IT 헬프데스크(내선 1234)로 연락하시거나, support@company.com으로 문의해 주세요.",
                ResponseType::Faq,
                0.8,
                timestamp("2024-11-05 10:30:15")?,
                &["IT 보안 정책.docx"],
            ),
            log(
                newcomer,
                "박신입",
                "안녕하세요!",
                "안녕하세요! 무엇을 도와드릴까요?",
                ResponseType::SmallTalk,
                0.3,
                timestamp("2024-11-05 11:45:22")?,
                &[],
            ),
            log(
                employee,
                "최직원",
                "ROI가 무엇인가요?",
                "ROI(Return on Investment)는 투자 대비 수익률을 의미하며, 투자로 인한 이익을 투자 비용으로 나눈 값입니다.",
                ResponseType::TermDefinition,
                1.5,
                timestamp("2024-11-05 14:20:18")?,
                &[],
            ),
        ],
    );

    let suggestion = |question: &str, frequency: u32, suggested_answer: &str| FaqSuggestion {
        id: Uuid::new_v4(),
        question: question.into(),
        frequency,
        suggested_answer: suggested_answer.into(),
        status: SuggestionStatus::Pending,
    };
    catalog.suggestions = EntityCollection::with_items(
        Placement::Tail,
        vec![
            suggestion(
                "재택근무 신청은 어떻게 하나요?",
                15,
                "근무 3일 전까지 팀장 승인을 받아 시스템에 등록하시면 됩니다.",
            ),
            suggestion(
                "사내 카페 운영시간은?",
                12,
                "평일 오전 8시부터 오후 6시까지 운영됩니다.",
            ),
            suggestion(
                "명함 제작 신청 방법은?",
                8,
                "총무팀에 이메일로 신청하시면 됩니다. (필요정보: 이름, 부서, 직급, 연락처)",
            ),
        ],
    );

    catalog.stats = fixture_stats();

    info!(
        departments = catalog.departments.len(),
        users = catalog.users.len(),
        documents = catalog.documents.len(),
        faqs = catalog.faqs.len(),
        "fixtures loaded"
    );
    Ok(())
}

pub fn fixture_stats() -> DashboardStats {
    let daily = [
        ("10/30", 45),
        ("10/31", 52),
        ("11/01", 48),
        ("11/02", 38),
        ("11/03", 42),
        ("11/04", 55),
        ("11/05", 61),
    ];
    let types = [("FAQ", 580), ("용어정의", 320), ("스몰톡", 347)];
    let top = [
        ("직원 복지 가이드.pdf", 145),
        ("IT 보안 정책.docx", 98),
        ("신입사원 온보딩 매뉴얼.pdf", 87),
        ("출장비 정산 가이드.pdf", 72),
        ("재택근무 규정.pdf", 65),
    ];

    DashboardStats {
        total_queries: 1247,
        success_rate: 94.5,
        avg_response_time: 1.3,
        user_satisfaction: 4.2,
        daily_queries: daily
            .iter()
            .map(|(date, count)| DailyCount {
                date: date.to_string(),
                count: *count,
            })
            .collect(),
        response_types: types
            .iter()
            .map(|(response_type, count)| TypeCount {
                response_type: response_type.to_string(),
                count: *count,
            })
            .collect(),
        top_documents: top
            .iter()
            .map(|(name, count)| DocumentCount {
                name: name.to_string(),
                count: *count,
            })
            .collect(),
    }
}

/// Gives the bootstrap account its password, creating the account as a
/// Super Master when the fixtures did not provide one.
pub fn install_bootstrap_admin(
    catalog: &mut Catalog,
    email: &str,
    password_hash: &str,
) -> CatalogResult<Uuid> {
    if let Some(existing) = catalog.find_user_by_email(email).map(|user| user.id) {
        catalog.update_profile(
            existing,
            ProfileChanges {
                password_hash: Some(password_hash.to_string()),
                ..ProfileChanges::default()
            },
        )?;
        return Ok(existing);
    }

    let user = catalog.register_user(NewUser {
        email: email.to_string(),
        name: "관리자".into(),
        nickname: None,
        department_id: None,
        position: "관리자".into(),
        role: Role::SuperMaster,
        password_hash: Some(password_hash.to_string()),
    })?;
    Ok(user.id)
}
