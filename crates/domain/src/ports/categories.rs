use crate::DomainResult;
use crate::categories::Category;
use crate::ports::BoxFuture;

/// Persistence contract for the category forest.
///
/// Implementations report backend failures as `DomainError::Store` and never
/// raise not-found errors themselves; existence rules live in the service.
#[allow(clippy::needless_pass_by_value)]
pub trait CategoryRepository: Send + Sync {
    /// Every tree owned by `user_id`; empty when the user owns nothing.
    fn find_user_categories(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Category>>>;

    /// True when at least one root category is owned by `user_id`.
    fn user_exists(&self, user_id: &str) -> BoxFuture<'_, DomainResult<bool>>;

    fn category_exists(&self, category_id: &str) -> BoxFuture<'_, DomainResult<bool>>;

    /// Creates the user node if needed and attaches a new root category to it.
    fn create_root(&self, name: &str, user_id: &str) -> BoxFuture<'_, DomainResult<Category>>;

    /// Attaches a new category under `parent_id`. An absent parent is a store
    /// error, never a fabricated category.
    fn create_child(&self, name: &str, parent_id: &str)
    -> BoxFuture<'_, DomainResult<Category>>;

    /// Returns whether a category matched. Absent ids are a no-op.
    fn rename(&self, category_id: &str, name: &str) -> BoxFuture<'_, DomainResult<bool>>;

    /// Removes the category, all descendants and every incident edge.
    /// Returns the number of categories removed; absent ids remove nothing.
    fn delete_subtree(&self, category_id: &str) -> BoxFuture<'_, DomainResult<usize>>;

    /// The user owning the root above `category_id`, if any.
    fn owner_of(&self, category_id: &str) -> BoxFuture<'_, DomainResult<Option<String>>>;
}
