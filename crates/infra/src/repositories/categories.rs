use std::collections::HashSet;
use std::sync::Arc;

use arbor_domain::DomainResult;
use arbor_domain::categories::Category;
use arbor_domain::forest::{CategoryEdge, assemble_edges};
use arbor_domain::ports::BoxFuture;
use arbor_domain::ports::categories::CategoryRepository;
use arbor_domain::ports::graph::{GraphQuery, GraphStore, StoreError, decode_rows};
use serde::Deserialize;

// Graph layout:
//   user:<user_id>            { user_id }
//   category:<category_id>    { category_id, name }
//   OWN   edge  user     -> root category
//   CHILD edge  category -> child category
// Every caller-supplied value travels as a bound `$parameter`.

const ROOT_CATEGORIES: &str = "SELECT out.category_id AS id, out.name AS name \
     FROM OWN WHERE in = type::thing('user', $user_id)";

const CHILD_CATEGORIES: &str = "SELECT in.category_id AS parent_id, out.category_id AS id, \
     out.name AS name FROM CHILD WHERE in.category_id IN $parent_ids";

const COUNT_OWNED_ROOTS: &str = "SELECT count() AS total FROM OWN \
     WHERE in = type::thing('user', $user_id) GROUP ALL";

const FIND_CATEGORY: &str =
    "SELECT category_id FROM category WHERE category_id = $category_id LIMIT 1";

const CREATE_ROOT: &str = "BEGIN TRANSACTION;\n\
     LET $category_id = <string> rand::uuid::v7();\n\
     UPSERT type::thing('user', $user_id) SET user_id = $user_id;\n\
     CREATE type::thing('category', $category_id) SET category_id = $category_id, name = $name;\n\
     CREATE OWN SET in = type::thing('user', $user_id), out = type::thing('category', $category_id);\n\
     SELECT category_id AS id, name FROM category WHERE category_id = $category_id;\n\
     COMMIT TRANSACTION;";

// The FOR body only runs when the parent matched, so an absent parent leaves
// the final SELECT empty instead of creating a detached node.
const CREATE_CHILD: &str = "BEGIN TRANSACTION;\n\
     LET $category_id = <string> rand::uuid::v7();\n\
     FOR $parent IN (SELECT VALUE id FROM category WHERE category_id = $parent_id LIMIT 1) {\n\
         CREATE type::thing('category', $category_id) SET category_id = $category_id, name = $name;\n\
         CREATE CHILD SET in = $parent, out = type::thing('category', $category_id);\n\
     };\n\
     SELECT category_id AS id, name FROM category WHERE category_id = $category_id;\n\
     COMMIT TRANSACTION;";

const RENAME: &str =
    "UPDATE category SET name = $name WHERE category_id = $category_id RETURN category_id";

// Returns projected columns only; record ids do not decode as plain JSON.
const DELETE_SUBTREE: &str = "BEGIN TRANSACTION;\n\
     LET $doomed = (SELECT category_id FROM category WHERE category_id IN $ids);\n\
     DELETE CHILD WHERE in.category_id IN $ids OR out.category_id IN $ids;\n\
     DELETE OWN WHERE out.category_id IN $ids;\n\
     DELETE category WHERE category_id IN $ids;\n\
     SELECT category_id FROM $doomed;\n\
     COMMIT TRANSACTION;";

const PARENT_OF: &str = "SELECT in.category_id AS parent_id FROM CHILD \
     WHERE out.category_id = $category_id LIMIT 1";

const OWNER_OF: &str =
    "SELECT in.user_id AS user_id FROM OWN WHERE out.category_id = $category_id LIMIT 1";

#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

#[derive(Debug, Deserialize)]
struct CreatedRow {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ParentRow {
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwnerRow {
    user_id: Option<String>,
}

/// Hierarchy repository speaking SurrealQL through any [`GraphStore`].
#[derive(Clone)]
pub struct GraphCategoryRepository {
    store: Arc<dyn GraphStore>,
}

impl GraphCategoryRepository {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Breadth-first walk below `start`, one query per depth level.
    /// `start` rows are included as given.
    async fn descend(
        store: &dyn GraphStore,
        start: Vec<CategoryEdge>,
    ) -> Result<Vec<CategoryEdge>, StoreError> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut edges = Vec::new();
        let mut frontier = Vec::new();
        for edge in start {
            if visited.insert(edge.id.clone()) {
                frontier.push(edge.id.clone());
                edges.push(edge);
            }
        }

        while !frontier.is_empty() {
            let query = GraphQuery::new(CHILD_CATEGORIES).bind("parent_ids", frontier);
            let rows = store.execute(query).await?;
            let children: Vec<CategoryEdge> = decode_rows(rows, "category")?;
            frontier = Vec::new();
            for child in children {
                if visited.insert(child.id.clone()) {
                    frontier.push(child.id.clone());
                    edges.push(child);
                }
            }
        }
        Ok(edges)
    }

    async fn parent_of(
        store: &dyn GraphStore,
        category_id: &str,
    ) -> Result<Option<String>, StoreError> {
        let query = GraphQuery::new(PARENT_OF).bind("category_id", category_id);
        let rows: Vec<ParentRow> = decode_rows(store.execute(query).await?, "parent")?;
        Ok(rows.into_iter().next().and_then(|row| row.parent_id))
    }

    fn created(
        rows: Vec<CreatedRow>,
        parent_id: Option<String>,
        op: &'static str,
    ) -> DomainResult<Category> {
        let row = rows.into_iter().next().ok_or(StoreError::EmptyResult(op))?;
        Ok(Category::new(row.id, row.name, parent_id))
    }
}

impl CategoryRepository for GraphCategoryRepository {
    fn find_user_categories(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Category>>> {
        let store = self.store.clone();
        let user_id = user_id.to_string();
        Box::pin(async move {
            let query = GraphQuery::new(ROOT_CATEGORIES).bind("user_id", user_id);
            let roots: Vec<CategoryEdge> = decode_rows(store.execute(query).await?, "category")?;
            let roots = roots
                .into_iter()
                .map(|root| CategoryEdge {
                    parent_id: None,
                    ..root
                })
                .collect();
            let edges = Self::descend(store.as_ref(), roots).await?;
            Ok(assemble_edges(edges))
        })
    }

    fn user_exists(&self, user_id: &str) -> BoxFuture<'_, DomainResult<bool>> {
        let store = self.store.clone();
        let user_id = user_id.to_string();
        Box::pin(async move {
            let query = GraphQuery::new(COUNT_OWNED_ROOTS).bind("user_id", user_id);
            let rows: Vec<CountRow> = decode_rows(store.execute(query).await?, "count")?;
            Ok(rows.first().is_some_and(|row| row.total > 0))
        })
    }

    fn category_exists(&self, category_id: &str) -> BoxFuture<'_, DomainResult<bool>> {
        let store = self.store.clone();
        let category_id = category_id.to_string();
        Box::pin(async move {
            let query = GraphQuery::new(FIND_CATEGORY).bind("category_id", category_id);
            Ok(!store.execute(query).await?.is_empty())
        })
    }

    fn create_root(&self, name: &str, user_id: &str) -> BoxFuture<'_, DomainResult<Category>> {
        let store = self.store.clone();
        let name = name.to_string();
        let user_id = user_id.to_string();
        Box::pin(async move {
            let query = GraphQuery::new(CREATE_ROOT)
                .bind("user_id", user_id)
                .bind("name", name);
            let rows = decode_rows(store.execute(query).await?, "category")?;
            Self::created(rows, None, "create root category")
        })
    }

    fn create_child(
        &self,
        name: &str,
        parent_id: &str,
    ) -> BoxFuture<'_, DomainResult<Category>> {
        let store = self.store.clone();
        let name = name.to_string();
        let parent_id = parent_id.to_string();
        Box::pin(async move {
            let query = GraphQuery::new(CREATE_CHILD)
                .bind("parent_id", parent_id.clone())
                .bind("name", name);
            let rows = decode_rows(store.execute(query).await?, "category")?;
            Self::created(rows, Some(parent_id), "create child category")
        })
    }

    fn rename(&self, category_id: &str, name: &str) -> BoxFuture<'_, DomainResult<bool>> {
        let store = self.store.clone();
        let category_id = category_id.to_string();
        let name = name.to_string();
        Box::pin(async move {
            let query = GraphQuery::new(RENAME)
                .bind("category_id", category_id)
                .bind("name", name);
            Ok(!store.execute(query).await?.is_empty())
        })
    }

    fn delete_subtree(&self, category_id: &str) -> BoxFuture<'_, DomainResult<usize>> {
        let store = self.store.clone();
        let category_id = category_id.to_string();
        Box::pin(async move {
            let start = vec![CategoryEdge::root(category_id, "")];
            let ids: Vec<String> = Self::descend(store.as_ref(), start)
                .await?
                .into_iter()
                .map(|edge| edge.id)
                .collect();
            let query = GraphQuery::new(DELETE_SUBTREE).bind("ids", ids);
            let removed = store.execute(query).await?.len();
            Ok(removed)
        })
    }

    fn owner_of(&self, category_id: &str) -> BoxFuture<'_, DomainResult<Option<String>>> {
        let store = self.store.clone();
        let category_id = category_id.to_string();
        Box::pin(async move {
            let mut current = category_id;
            let mut seen = HashSet::new();
            while seen.insert(current.clone()) {
                match Self::parent_of(store.as_ref(), &current).await? {
                    Some(parent_id) => current = parent_id,
                    None => break,
                }
            }
            let query = GraphQuery::new(OWNER_OF).bind("category_id", current);
            let rows: Vec<OwnerRow> = decode_rows(store.execute(query).await?, "owner")?;
            Ok(rows.into_iter().next().and_then(|row| row.user_id))
        })
    }
}
