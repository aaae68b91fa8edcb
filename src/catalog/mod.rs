//! In-memory state layer of the admin console.
//!
//! Every collection the console manages lives in one [`Catalog`]. The catalog
//! is mutated only through `&mut self` methods, so callers hold the state
//! write lock for the whole of each operation and every invariant is checked
//! against a consistent view.

mod collection;
mod content;
mod departments;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::dashboard::DashboardStats;
use crate::error::ErrorKind;
use crate::models::{
    AdminActivity, ChatLog, Department, Document, Faq, FaqSuggestion, Invitation, Role,
    SystemError, User,
};
use crate::utils::text::{looks_like_email, non_blank};

pub use collection::{Entity, EntityCollection, Placement, TextQuery};
pub use content::{DocumentFilter, FaqChanges, LogFilter, NewDocument, NewFaq, SuggestionApproval};
pub use departments::{DepartmentChanges, NewDepartment, OrgChartNode};

pub const ERROR_FEED_CAPACITY: usize = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Conflict(String),
}

impl CatalogError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CatalogError::Invalid(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        CatalogError::Conflict(message.into())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub nickname: Option<String>,
    pub department_id: Option<Uuid>,
    pub position: String,
    pub role: Role,
    pub password_hash: Option<String>,
}

/// Self-service profile edit. Nested options distinguish "leave as is" from "clear".
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub nickname: Option<Option<String>>,
    pub profile_image: Option<Option<String>>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub email: String,
    pub department_id: Uuid,
    pub position: String,
    pub role: Role,
    pub invited_by: String,
}

pub struct Catalog {
    organization_id: Uuid,
    pub users: EntityCollection<User>,
    pub departments: EntityCollection<Department>,
    pub documents: EntityCollection<Document>,
    pub faqs: EntityCollection<Faq>,
    pub chat_logs: EntityCollection<ChatLog>,
    pub suggestions: EntityCollection<FaqSuggestion>,
    pub invitations: EntityCollection<Invitation>,
    pub activity: EntityCollection<AdminActivity>,
    pub errors: EntityCollection<SystemError>,
    pub stats: DashboardStats,
}

impl Catalog {
    pub fn new(organization_id: Uuid) -> Self {
        Self {
            organization_id,
            users: EntityCollection::new(Placement::Tail),
            departments: EntityCollection::new(Placement::Tail),
            documents: EntityCollection::new(Placement::Tail),
            faqs: EntityCollection::new(Placement::Head),
            chat_logs: EntityCollection::new(Placement::Tail),
            suggestions: EntityCollection::new(Placement::Tail),
            invitations: EntityCollection::new(Placement::Tail),
            activity: EntityCollection::new(Placement::Head),
            errors: EntityCollection::new(Placement::Head),
            stats: DashboardStats::default(),
        }
    }

    pub fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    pub fn user(&self, id: Uuid) -> Option<&User> {
        self.users.get(id)
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<&User> {
        let email = email.trim();
        self.users.find(|user| user.email.eq_ignore_ascii_case(email))
    }

    pub fn department_name(&self, department_id: Option<Uuid>) -> Option<String> {
        department_id
            .and_then(|id| self.departments.get(id))
            .map(|department| department.name.clone())
    }

    pub fn register_user(&mut self, new_user: NewUser) -> CatalogResult<User> {
        let email = new_user.email.trim().to_string();
        if !looks_like_email(&email) {
            return Err(CatalogError::invalid("email must be a valid address"));
        }
        if self.find_user_by_email(&email).is_some() {
            return Err(CatalogError::conflict("an account with this email already exists"));
        }
        let name = non_blank(&new_user.name)
            .ok_or_else(|| CatalogError::invalid("name must not be empty"))?;
        if let Some(department_id) = new_user.department_id {
            if !self.departments.contains(department_id) {
                return Err(CatalogError::NotFound("department"));
            }
        }

        let user = self.users.add(|id| User {
            id,
            email,
            name,
            nickname: new_user.nickname.as_deref().and_then(non_blank),
            department_id: new_user.department_id,
            position: new_user.position.trim().to_string(),
            role: new_user.role,
            profile_image: None,
            password_hash: new_user.password_hash,
        });
        Ok(user.clone())
    }

    pub fn update_profile(
        &mut self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> CatalogResult<User> {
        if !self.users.contains(user_id) {
            return Err(CatalogError::NotFound("user"));
        }
        let name = changes
            .name
            .as_deref()
            .map(|raw| {
                non_blank(raw).ok_or_else(|| CatalogError::invalid("name must not be empty"))
            })
            .transpose()?;

        self.users
            .update(user_id, |user| {
                if let Some(name) = name {
                    user.name = name;
                }
                if let Some(nickname) = changes.nickname {
                    user.nickname = nickname.as_deref().and_then(non_blank);
                }
                if let Some(profile_image) = changes.profile_image {
                    user.profile_image = profile_image.as_deref().and_then(non_blank);
                }
                if let Some(password_hash) = changes.password_hash {
                    user.password_hash = Some(password_hash);
                }
            })
            .cloned()
            .ok_or(CatalogError::NotFound("user"))
    }

    pub fn invite(&mut self, invitation: NewInvitation) -> CatalogResult<Invitation> {
        let email = invitation.email.trim().to_string();
        if !looks_like_email(&email) {
            return Err(CatalogError::invalid("email must be a valid address"));
        }
        if !invitation.role.is_invitable() {
            return Err(CatalogError::invalid(format!(
                "role {} cannot be granted through an invitation",
                invitation.role
            )));
        }
        let position = non_blank(&invitation.position)
            .ok_or_else(|| CatalogError::invalid("position must not be empty"))?;
        if !self.departments.contains(invitation.department_id) {
            return Err(CatalogError::NotFound("department"));
        }
        if self.find_user_by_email(&email).is_some() {
            return Err(CatalogError::conflict("an account with this email already exists"));
        }
        if self.open_invitation(&email).is_some() {
            return Err(CatalogError::conflict("this email has already been invited"));
        }

        let created_at = Utc::now().naive_utc();
        let invitation = self.invitations.add(|id| Invitation {
            id,
            email,
            department_id: invitation.department_id,
            position,
            role: invitation.role,
            invited_by: invitation.invited_by,
            created_at,
        });
        Ok(invitation.clone())
    }

    pub fn open_invitation(&self, email: &str) -> Option<&Invitation> {
        let email = email.trim();
        self.invitations.find(|invitation| invitation.email.eq_ignore_ascii_case(email))
    }

    /// Removes and returns the open invitation for `email`.
    pub fn take_invitation(&mut self, email: &str) -> Option<Invitation> {
        let id = self.open_invitation(email)?.id;
        self.invitations.remove(id)
    }

    pub fn record_activity(
        &mut self,
        actor: impl Into<String>,
        action: impl Into<String>,
        subject: impl Into<String>,
    ) {
        let timestamp = Utc::now().naive_utc();
        let (actor, action, subject) = (actor.into(), action.into(), subject.into());
        self.activity.add(|id| AdminActivity {
            id,
            actor,
            action,
            subject,
            timestamp,
        });
    }

    /// Adds a failed request to the error feed, dropping the oldest entries
    /// beyond [`ERROR_FEED_CAPACITY`].
    pub fn record_error(
        &mut self,
        status: u16,
        kind: ErrorKind,
        method: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        let timestamp = Utc::now().naive_utc();
        let (method, path, message) = (method.into(), path.into(), message.into());
        self.errors.add(|id| SystemError {
            id,
            status,
            kind,
            method,
            path,
            message,
            timestamp,
        });
        while self.errors.len() > ERROR_FEED_CAPACITY {
            let Some(oldest) = self.errors.iter().last().map(|error| error.id) else {
                break;
            };
            self.errors.remove(oldest);
        }
    }
}

impl Entity for User {
    fn id(&self) -> Uuid {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str()]
    }
}

impl Entity for Department {
    fn id(&self) -> Uuid {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

impl Entity for Document {
    fn id(&self) -> Uuid {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }
}

impl Entity for Faq {
    fn id(&self) -> Uuid {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.question.as_str(), self.answer.as_str()];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }
}

impl Entity for ChatLog {
    fn id(&self) -> Uuid {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.question.as_str(), self.answer.as_str()]
    }
}

impl Entity for FaqSuggestion {
    fn id(&self) -> Uuid {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.question.as_str(), self.suggested_answer.as_str()]
    }
}

impl Entity for Invitation {
    fn id(&self) -> Uuid {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.email.as_str(), self.position.as_str()]
    }
}

impl Entity for SystemError {
    fn id(&self) -> Uuid {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.path.as_str(), self.message.as_str()]
    }
}

impl Entity for AdminActivity {
    fn id(&self) -> Uuid {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.actor.as_str(), self.action.as_str(), self.subject.as_str()]
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn catalog_with_departments(names: &[&str]) -> (Catalog, Vec<Uuid>) {
        let mut catalog = Catalog::new(Uuid::new_v4());
        let ids = names
            .iter()
            .map(|name| {
                catalog
                    .add_department(NewDepartment {
                        name: name.to_string(),
                        parent_id: None,
                    })
                    .map(|department| department.id)
                    .unwrap()
            })
            .collect();
        (catalog, ids)
    }

    pub fn user(email: &str, department_id: Option<Uuid>) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            nickname: None,
            department_id,
            position: "사원".to_string(),
            role: Role::User,
            password_hash: None,
        }
    }
}
