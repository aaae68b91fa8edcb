use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ErrorKind;

/// Administrative level of a console user, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    Admin,
    Master,
    #[serde(rename = "Super Master")]
    SuperMaster,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
            Role::Master => "Master",
            Role::SuperMaster => "Super Master",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "User" => Some(Role::User),
            "Admin" => Some(Role::Admin),
            "Master" => Some(Role::Master),
            "Super Master" | "SuperMaster" => Some(Role::SuperMaster),
            _ => None,
        }
    }

    /// Roles that can be handed out through an invitation.
    pub fn is_invitable(self) -> bool {
        self != Role::SuperMaster
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub nickname: Option<String>,
    pub department_id: Option<Uuid>,
    pub position: String,
    pub role: Role,
    pub profile_image: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub organization_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Public,
    Department,
    Admin,
}

impl AccessLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Some(AccessLevel::Public),
            "department" => Some(AccessLevel::Department),
            "admin" => Some(AccessLevel::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Approved,
    Rejected,
}

impl DocumentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(DocumentStatus::Pending),
            "approved" => Some(DocumentStatus::Approved),
            "rejected" => Some(DocumentStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub file_type: String,
    pub size: u64,
    pub upload_date: NaiveDate,
    pub uploaded_by: String,
    pub department_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub access_level: AccessLevel,
    pub status: DocumentStatus,
    pub content_type: Option<String>,
    pub checksum: Option<String>,
    pub storage_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Faq {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub tags: Vec<String>,
    pub department_id: Uuid,
    pub created_at: NaiveDate,
    pub created_by: String,
    pub references: Vec<String>,
}

/// How the chatbot classified the answer it gave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseType {
    #[serde(rename = "FAQ")]
    Faq,
    TermDefinition,
    SmallTalk,
}

impl ResponseType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ResponseType::Faq => "FAQ",
            ResponseType::TermDefinition => "TermDefinition",
            ResponseType::SmallTalk => "SmallTalk",
        }
    }

    /// Accepts the wire names as well as the Korean labels used by the chatbot UI.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "FAQ" | "faq" => Some(ResponseType::Faq),
            "TermDefinition" | "용어정의" => Some(ResponseType::TermDefinition),
            "SmallTalk" | "스몰톡" => Some(ResponseType::SmallTalk),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Positive,
    Negative,
}

impl Feedback {
    pub const fn as_str(self) -> &'static str {
        match self {
            Feedback::Positive => "positive",
            Feedback::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub question: String,
    pub answer: String,
    pub response_type: ResponseType,
    pub response_time: f64,
    pub timestamp: NaiveDateTime,
    pub feedback: Option<Feedback>,
    pub referenced_documents: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize)]
pub struct FaqSuggestion {
    pub id: Uuid,
    pub question: String,
    pub frequency: u32,
    pub suggested_answer: String,
    pub status: SuggestionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct Invitation {
    pub id: Uuid,
    pub email: String,
    pub department_id: Uuid,
    pub position: String,
    pub role: Role,
    pub invited_by: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminActivity {
    pub id: Uuid,
    pub actor: String,
    pub action: String,
    pub subject: String,
    pub timestamp: NaiveDateTime,
}

/// A request that failed on the server side.
#[derive(Debug, Clone, Serialize)]
pub struct SystemError {
    pub id: Uuid,
    pub status: u16,
    pub kind: ErrorKind,
    pub method: String,
    pub path: String,
    pub message: String,
    pub timestamp: NaiveDateTime,
}
