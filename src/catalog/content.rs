use chrono::Utc;
use uuid::Uuid;

use super::{Catalog, CatalogError, CatalogResult, TextQuery};
use crate::models::{
    AccessLevel, ChatLog, Document, DocumentStatus, Faq, FaqSuggestion, ResponseType,
    SuggestionStatus,
};
use crate::utils::text::non_blank;

#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub query: TextQuery,
    pub status: Option<DocumentStatus>,
}

impl DocumentFilter {
    pub fn matches(&self, document: &Document) -> bool {
        self.query.matches(document)
            && self
                .status
                .map_or(true, |status| document.status == status)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub query: TextQuery,
    pub response_type: Option<ResponseType>,
}

impl LogFilter {
    pub fn matches(&self, log: &ChatLog) -> bool {
        self.query.matches(log)
            && self
                .response_type
                .map_or(true, |response_type| log.response_type == response_type)
    }
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub name: String,
    pub file_type: String,
    pub size: u64,
    pub uploaded_by: String,
    pub department_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub access_level: AccessLevel,
    pub content_type: Option<String>,
    pub checksum: Option<String>,
    pub storage_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewFaq {
    pub question: String,
    pub answer: String,
    pub tags: Vec<String>,
    pub department_id: Uuid,
    pub created_by: String,
    pub references: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FaqChanges {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub tags: Option<Vec<String>>,
    pub department_id: Option<Uuid>,
    pub references: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct SuggestionApproval {
    pub department_id: Uuid,
    pub answer: Option<String>,
    pub tags: Vec<String>,
    pub approved_by: String,
}

impl Catalog {
    pub fn list_documents(&self, filter: &DocumentFilter) -> Vec<Document> {
        self.documents.list(|document| filter.matches(document))
    }

    pub fn add_document(&mut self, new_document: NewDocument) -> CatalogResult<Document> {
        let name = non_blank(&new_document.name)
            .ok_or_else(|| CatalogError::invalid("document name must not be empty"))?;
        if let Some(department_id) = new_document.department_id {
            if !self.departments.contains(department_id) {
                return Err(CatalogError::NotFound("department"));
            }
        }

        let upload_date = Utc::now().date_naive();
        let document = self.documents.add(|id| Document {
            id,
            name,
            file_type: new_document.file_type,
            size: new_document.size,
            upload_date,
            uploaded_by: new_document.uploaded_by,
            department_id: new_document.department_id,
            tags: new_document.tags,
            access_level: new_document.access_level,
            status: DocumentStatus::Pending,
            content_type: new_document.content_type,
            checksum: new_document.checksum,
            storage_key: new_document.storage_key,
        });
        Ok(document.clone())
    }

    /// Moves a pending document to `decision`. Reviewed documents stay as they are.
    pub fn review_document(
        &mut self,
        document_id: Uuid,
        decision: DocumentStatus,
    ) -> CatalogResult<Document> {
        if decision == DocumentStatus::Pending {
            return Err(CatalogError::invalid("a review must approve or reject"));
        }
        let document = self
            .documents
            .get(document_id)
            .ok_or(CatalogError::NotFound("document"))?;
        if document.status != DocumentStatus::Pending {
            return Err(CatalogError::conflict(format!(
                "document has already been {}",
                document.status.as_str()
            )));
        }

        self.documents
            .update(document_id, |document| document.status = decision)
            .cloned()
            .ok_or(CatalogError::NotFound("document"))
    }

    pub fn remove_document(&mut self, document_id: Uuid) -> Option<Document> {
        self.documents.remove(document_id)
    }

    pub fn list_faqs(&self, query: &TextQuery) -> Vec<Faq> {
        self.faqs.search(query)
    }

    pub fn add_faq(&mut self, new_faq: NewFaq) -> CatalogResult<Faq> {
        let question = non_blank(&new_faq.question)
            .ok_or_else(|| CatalogError::invalid("question must not be empty"))?;
        let answer = non_blank(&new_faq.answer)
            .ok_or_else(|| CatalogError::invalid("answer must not be empty"))?;
        if new_faq.tags.is_empty() {
            return Err(CatalogError::invalid("at least one tag is required"));
        }
        if !self.departments.contains(new_faq.department_id) {
            return Err(CatalogError::NotFound("department"));
        }

        let created_at = Utc::now().date_naive();
        let faq = self.faqs.add(|id| Faq {
            id,
            question,
            answer,
            tags: new_faq.tags,
            department_id: new_faq.department_id,
            created_at,
            created_by: new_faq.created_by,
            references: new_faq.references,
        });
        Ok(faq.clone())
    }

    pub fn update_faq(&mut self, faq_id: Uuid, changes: FaqChanges) -> CatalogResult<Faq> {
        if !self.faqs.contains(faq_id) {
            return Err(CatalogError::NotFound("faq"));
        }

        let question = changes
            .question
            .as_deref()
            .map(|value| {
                non_blank(value).ok_or_else(|| CatalogError::invalid("question must not be empty"))
            })
            .transpose()?;
        let answer = changes
            .answer
            .as_deref()
            .map(|value| {
                non_blank(value).ok_or_else(|| CatalogError::invalid("answer must not be empty"))
            })
            .transpose()?;
        if changes.tags.as_ref().is_some_and(Vec::is_empty) {
            return Err(CatalogError::invalid("at least one tag is required"));
        }
        if let Some(department_id) = changes.department_id {
            if !self.departments.contains(department_id) {
                return Err(CatalogError::NotFound("department"));
            }
        }

        self.faqs
            .update(faq_id, |faq| {
                if let Some(question) = question {
                    faq.question = question;
                }
                if let Some(answer) = answer {
                    faq.answer = answer;
                }
                if let Some(tags) = changes.tags {
                    faq.tags = tags;
                }
                if let Some(department_id) = changes.department_id {
                    faq.department_id = department_id;
                }
                if let Some(references) = changes.references {
                    faq.references = references;
                }
            })
            .cloned()
            .ok_or(CatalogError::NotFound("faq"))
    }

    pub fn remove_faq(&mut self, faq_id: Uuid) -> Option<Faq> {
        self.faqs.remove(faq_id)
    }

    pub fn pending_suggestions(&self) -> Vec<FaqSuggestion> {
        self.suggestions
            .list(|suggestion| suggestion.status == SuggestionStatus::Pending)
    }

    /// Turns a pending suggestion into a published FAQ.
    pub fn approve_suggestion(
        &mut self,
        suggestion_id: Uuid,
        approval: SuggestionApproval,
    ) -> CatalogResult<Faq> {
        let suggestion = self.pending_suggestion(suggestion_id)?.clone();
        let answer = approval
            .answer
            .as_deref()
            .and_then(non_blank)
            .unwrap_or(suggestion.suggested_answer);

        let faq = self.add_faq(NewFaq {
            question: suggestion.question,
            answer,
            tags: approval.tags,
            department_id: approval.department_id,
            created_by: approval.approved_by,
            references: Vec::new(),
        })?;

        self.suggestions.update(suggestion_id, |suggestion| {
            suggestion.status = SuggestionStatus::Approved
        });
        Ok(faq)
    }

    pub fn reject_suggestion(&mut self, suggestion_id: Uuid) -> CatalogResult<FaqSuggestion> {
        self.pending_suggestion(suggestion_id)?;
        self.suggestions
            .update(suggestion_id, |suggestion| {
                suggestion.status = SuggestionStatus::Rejected
            })
            .cloned()
            .ok_or(CatalogError::NotFound("suggestion"))
    }

    fn pending_suggestion(&self, suggestion_id: Uuid) -> CatalogResult<&FaqSuggestion> {
        let suggestion = self
            .suggestions
            .get(suggestion_id)
            .ok_or(CatalogError::NotFound("suggestion"))?;
        if suggestion.status != SuggestionStatus::Pending {
            return Err(CatalogError::conflict("suggestion has already been reviewed"));
        }
        Ok(suggestion)
    }

    pub fn list_chat_logs(&self, filter: &LogFilter) -> Vec<ChatLog> {
        self.chat_logs.list(|log| filter.matches(log))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::catalog_with_departments;
    use super::super::{EntityCollection, Placement};
    use super::*;
    use crate::utils::text::split_list;

    fn faq(question: &str, tags: &str, department_id: Uuid) -> NewFaq {
        NewFaq {
            question: question.to_string(),
            answer: "...".to_string(),
            tags: split_list(tags),
            department_id,
            created_by: "김관리".to_string(),
            references: Vec::new(),
        }
    }

    fn document(name: &str, tags: &[&str]) -> NewDocument {
        NewDocument {
            name: name.to_string(),
            file_type: "pdf".to_string(),
            size: 1024,
            uploaded_by: "김관리".to_string(),
            department_id: None,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            access_level: AccessLevel::Public,
            content_type: Some("application/pdf".to_string()),
            checksum: None,
            storage_key: None,
        }
    }

    #[test]
    fn new_faq_is_prepended() {
        let (mut catalog, ids) = catalog_with_departments(&["HR"]);
        catalog
            .add_faq(faq("연차는 어떻게 신청하나요?", "HR,휴가", ids[0]))
            .unwrap();

        let added = catalog.add_faq(faq("원격근무?", "HR,원격", ids[0])).unwrap();
        let all = catalog.list_faqs(&TextQuery::default());

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].question, "원격근무?");
        assert_eq!(all[0].id, added.id);
        assert_eq!(added.tags, vec!["HR", "원격"]);
    }

    #[test]
    fn faq_search_covers_question_answer_and_tags() {
        let (mut catalog, ids) = catalog_with_departments(&["IT"]);
        catalog.add_faq(faq("VPN 접속 오류", "IT,VPN", ids[0])).unwrap();
        catalog.add_faq(faq("출장비 정산", "재무", ids[0])).unwrap();

        assert_eq!(catalog.list_faqs(&TextQuery::new(Some("vpn"))).len(), 1);
        assert_eq!(catalog.list_faqs(&TextQuery::new(Some("재무"))).len(), 1);
        assert_eq!(catalog.list_faqs(&TextQuery::new(Some("..."))).len(), 2);
    }

    #[test]
    fn faq_requires_tags_and_known_department() {
        let (mut catalog, ids) = catalog_with_departments(&["IT"]);
        assert!(matches!(
            catalog.add_faq(faq("질문", " , ", ids[0])).unwrap_err(),
            CatalogError::Invalid(_)
        ));
        assert_eq!(
            catalog.add_faq(faq("질문", "IT", Uuid::new_v4())).unwrap_err(),
            CatalogError::NotFound("department")
        );
        assert!(catalog.faqs.is_empty());
    }

    #[test]
    fn update_faq_validates_before_writing() {
        let (mut catalog, ids) = catalog_with_departments(&["IT"]);
        let created = catalog.add_faq(faq("질문", "IT", ids[0])).unwrap();

        let err = catalog
            .update_faq(
                created.id,
                FaqChanges {
                    question: Some("새 질문".into()),
                    answer: Some("   ".into()),
                    ..FaqChanges::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
        assert_eq!(catalog.faqs.get(created.id).unwrap().question, "질문");

        let updated = catalog
            .update_faq(
                created.id,
                FaqChanges {
                    question: Some("새 질문".into()),
                    references: Some(vec!["가이드.pdf".into()]),
                    ..FaqChanges::default()
                },
            )
            .unwrap();
        assert_eq!(updated.question, "새 질문");
        assert_eq!(updated.references, vec!["가이드.pdf"]);
    }

    #[test]
    fn documents_append_and_filter_by_status_and_text() {
        let mut catalog = Catalog::new(Uuid::new_v4());
        let first = catalog.add_document(document("보안 정책.docx", &["IT"])).unwrap();
        let second = catalog.add_document(document("예산 계획.xlsx", &["재무"])).unwrap();
        catalog
            .review_document(first.id, DocumentStatus::Approved)
            .unwrap();

        let all = catalog.list_documents(&DocumentFilter::default());
        assert_eq!(all.last().map(|d| d.id), Some(second.id));

        let pending = catalog.list_documents(&DocumentFilter {
            query: TextQuery::default(),
            status: Some(DocumentStatus::Pending),
        });
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.id);

        let by_tag = catalog.list_documents(&DocumentFilter {
            query: TextQuery::new(Some("it")),
            status: Some(DocumentStatus::Approved),
        });
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].id, first.id);
    }

    #[test]
    fn only_pending_documents_can_be_reviewed() {
        let mut catalog = Catalog::new(Uuid::new_v4());
        let created = catalog.add_document(document("a.pdf", &[])).unwrap();
        assert_eq!(created.status, DocumentStatus::Pending);

        catalog
            .review_document(created.id, DocumentStatus::Rejected)
            .unwrap();
        assert!(matches!(
            catalog
                .review_document(created.id, DocumentStatus::Approved)
                .unwrap_err(),
            CatalogError::Conflict(_)
        ));
        assert!(matches!(
            catalog
                .review_document(Uuid::new_v4(), DocumentStatus::Approved)
                .unwrap_err(),
            CatalogError::NotFound("document")
        ));
    }

    #[test]
    fn approving_a_suggestion_publishes_an_faq() {
        let (mut catalog, ids) = catalog_with_departments(&["HR"]);
        let suggestion_id = Uuid::new_v4();
        catalog.suggestions = EntityCollection::with_items(
            Placement::Tail,
            vec![FaqSuggestion {
                id: suggestion_id,
                question: "재택근무 신청은 어떻게 하나요?".into(),
                frequency: 15,
                suggested_answer: "팀장 승인 후 등록".into(),
                status: SuggestionStatus::Pending,
            }],
        );

        let faq = catalog
            .approve_suggestion(
                suggestion_id,
                SuggestionApproval {
                    department_id: ids[0],
                    answer: None,
                    tags: vec!["HR".into()],
                    approved_by: "김관리".into(),
                },
            )
            .unwrap();

        assert_eq!(faq.answer, "팀장 승인 후 등록");
        assert!(catalog.pending_suggestions().is_empty());
        assert_eq!(catalog.list_faqs(&TextQuery::default())[0].id, faq.id);
        assert!(matches!(
            catalog.reject_suggestion(suggestion_id).unwrap_err(),
            CatalogError::Conflict(_)
        ));
    }

    #[test]
    fn failed_approval_keeps_suggestion_pending() {
        let mut catalog = Catalog::new(Uuid::new_v4());
        let suggestion_id = Uuid::new_v4();
        catalog.suggestions = EntityCollection::with_items(
            Placement::Tail,
            vec![FaqSuggestion {
                id: suggestion_id,
                question: "사내 카페 운영시간은?".into(),
                frequency: 12,
                suggested_answer: "08:00 - 18:00".into(),
                status: SuggestionStatus::Pending,
            }],
        );

        let err = catalog
            .approve_suggestion(
                suggestion_id,
                SuggestionApproval {
                    department_id: Uuid::new_v4(),
                    answer: None,
                    tags: vec!["총무".into()],
                    approved_by: "김관리".into(),
                },
            )
            .unwrap_err();
        assert_eq!(err, CatalogError::NotFound("department"));
        assert_eq!(catalog.pending_suggestions().len(), 1);
    }
}
