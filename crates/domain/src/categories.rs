use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::categories::CategoryRepository;

const MAX_NAME_LENGTH: usize = 256;
const MAX_ID_LENGTH: usize = 128;

/// A node of a user's category forest.
///
/// `parent_id` is derived from the containment edge, it is not a stored
/// property. `children` is only populated when a whole tree is read.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    #[serde(rename = "uuid")]
    pub id: String,
    pub name: String,
    #[serde(
        rename = "parent_uuid",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Category>,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, parent_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Depth-first search through this node and its descendants.
    pub fn find(&self, category_id: &str) -> Option<&Category> {
        if self.id == category_id {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find(category_id))
    }
}

#[derive(Clone, Debug)]
pub struct CategoryCreate {
    pub name: String,
    pub user_id: String,
    pub parent_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CategoryUpdate {
    pub category_id: String,
    pub name: String,
    pub user_id: String,
}

#[derive(Clone, Debug)]
pub struct CategoryDelete {
    pub category_id: String,
    pub user_id: String,
}

/// Whether the service checks that a parent or target category belongs to
/// the requesting user.
///
/// `Unchecked` keeps the historical behaviour: any existing category can be
/// used as a parent, renamed or deleted by any caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OwnershipPolicy {
    #[default]
    Unchecked,
    Enforced,
}

impl OwnershipPolicy {
    pub fn from_flag(enforce: bool) -> Self {
        if enforce {
            Self::Enforced
        } else {
            Self::Unchecked
        }
    }
}

#[derive(Clone)]
pub struct CategoryService {
    repository: Arc<dyn CategoryRepository>,
    ownership: OwnershipPolicy,
}

impl CategoryService {
    pub fn new(repository: Arc<dyn CategoryRepository>) -> Self {
        Self {
            repository,
            ownership: OwnershipPolicy::default(),
        }
    }

    pub fn with_ownership_policy(mut self, ownership: OwnershipPolicy) -> Self {
        self.ownership = ownership;
        self
    }

    pub fn ownership_policy(&self) -> OwnershipPolicy {
        self.ownership
    }

    pub async fn get_categories(&self, user_id: &str) -> DomainResult<Vec<Category>> {
        let user_id = required_id("user_uuid", user_id)?;
        if !self.repository.user_exists(&user_id).await? {
            return Err(DomainError::UserNotFound);
        }
        self.repository.find_user_categories(&user_id).await
    }

    pub async fn create_category(&self, input: CategoryCreate) -> DomainResult<Category> {
        let input = validate_category_create(&input)?;
        match input.parent_id.as_deref() {
            None => {
                tracing::debug!(
                    user_id = %input.user_id,
                    "no parent category; creating root category"
                );
                self.repository
                    .create_root(&input.name, &input.user_id)
                    .await
            }
            Some(parent_id) => {
                if !self.repository.category_exists(parent_id).await? {
                    return Err(DomainError::CategoryNotFound);
                }
                self.ensure_owned_by(parent_id, &input.user_id).await?;
                tracing::debug!(parent_id, "parent category present; creating sub category");
                self.repository.create_child(&input.name, parent_id).await
            }
        }
    }

    pub async fn update_category(&self, input: CategoryUpdate) -> DomainResult<()> {
        let input = validate_category_update(&input)?;
        if !self.repository.category_exists(&input.category_id).await? {
            return Err(DomainError::CategoryNotFound);
        }
        self.ensure_owned_by(&input.category_id, &input.user_id)
            .await?;
        let matched = self
            .repository
            .rename(&input.category_id, &input.name)
            .await?;
        if !matched {
            tracing::warn!(
                category_id = %input.category_id,
                "category disappeared between existence check and rename"
            );
            return Err(DomainError::CategoryNotFound);
        }
        Ok(())
    }

    pub async fn delete_category(&self, input: CategoryDelete) -> DomainResult<()> {
        let input = validate_category_delete(&input)?;
        if !self.repository.category_exists(&input.category_id).await? {
            return Err(DomainError::CategoryNotFound);
        }
        self.ensure_owned_by(&input.category_id, &input.user_id)
            .await?;
        let removed = self.repository.delete_subtree(&input.category_id).await?;
        if removed == 0 {
            tracing::warn!(
                category_id = %input.category_id,
                "category disappeared between existence check and delete"
            );
            return Err(DomainError::CategoryNotFound);
        }
        tracing::debug!(category_id = %input.category_id, removed, "category subtree deleted");
        Ok(())
    }

    async fn ensure_owned_by(&self, category_id: &str, user_id: &str) -> DomainResult<()> {
        if self.ownership == OwnershipPolicy::Unchecked {
            return Ok(());
        }
        match self.repository.owner_of(category_id).await? {
            Some(owner) if owner == user_id => Ok(()),
            _ => Err(DomainError::CategoryNotFound),
        }
    }
}

fn required_id(field: &str, value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(field, format!("{field} is required")));
    }
    if value.chars().count() > MAX_ID_LENGTH {
        return Err(DomainError::validation(
            field,
            format!("{field} exceeds max length of {MAX_ID_LENGTH}"),
        ));
    }
    Ok(value.to_string())
}

fn required_name(value: &str) -> Result<String, DomainError> {
    let name = value.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name", "name is required"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::validation(
            "name",
            format!("name exceeds max length of {MAX_NAME_LENGTH}"),
        ));
    }
    Ok(name.to_string())
}

fn validate_category_create(input: &CategoryCreate) -> Result<CategoryCreate, DomainError> {
    let parent_id = match input.parent_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(parent_id) => Some(required_id("parent_uuid", parent_id)?),
    };
    Ok(CategoryCreate {
        name: required_name(&input.name)?,
        user_id: required_id("user_uuid", &input.user_id)?,
        parent_id,
    })
}

fn validate_category_update(input: &CategoryUpdate) -> Result<CategoryUpdate, DomainError> {
    Ok(CategoryUpdate {
        category_id: required_id("uuid", &input.category_id)?,
        name: required_name(&input.name)?,
        user_id: required_id("user_uuid", &input.user_id)?,
    })
}

fn validate_category_delete(input: &CategoryDelete) -> Result<CategoryDelete, DomainError> {
    Ok(CategoryDelete {
        category_id: required_id("uuid", &input.category_id)?,
        user_id: required_id("user_uuid", &input.user_id)?,
    })
}
