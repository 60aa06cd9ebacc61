use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::DomainResult;
use crate::categories::Category;
use crate::forest::{CategoryEdge, assemble_edges};
use crate::ports::BoxFuture;
use crate::ports::categories::CategoryRepository;
use crate::ports::graph::StoreError;

#[derive(Default)]
struct Graph {
    names: HashMap<String, String>,
    users: HashSet<String>,
    // root category id -> owning user id
    own: HashMap<String, String>,
    // child category id -> parent category id
    child: HashMap<String, String>,
}

impl Graph {
    fn children_of(&self, parent_id: &str) -> Vec<String> {
        self.child
            .iter()
            .filter(|(_, parent)| parent.as_str() == parent_id)
            .map(|(child, _)| child.clone())
            .collect()
    }

    fn subtree(&self, category_id: &str) -> Vec<String> {
        if !self.names.contains_key(category_id) {
            return Vec::new();
        }
        let mut seen = HashSet::from([category_id.to_string()]);
        let mut ordered = vec![category_id.to_string()];
        let mut queue = VecDeque::from([category_id.to_string()]);
        while let Some(current) = queue.pop_front() {
            for child in self.children_of(&current) {
                if seen.insert(child.clone()) {
                    ordered.push(child.clone());
                    queue.push_back(child);
                }
            }
        }
        ordered
    }
}

/// Category forest held in process memory, used by the `memory` backend and
/// by tests.
#[derive(Clone, Default)]
pub struct InMemoryCategoryRepository {
    graph: Arc<RwLock<Graph>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn category_count(&self) -> usize {
        self.graph.read().await.names.len()
    }

    pub async fn user_count(&self) -> usize {
        self.graph.read().await.users.len()
    }
}

impl CategoryRepository for InMemoryCategoryRepository {
    fn find_user_categories(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Category>>> {
        let user_id = user_id.to_string();
        let graph = self.graph.clone();
        Box::pin(async move {
            let graph = graph.read().await;
            let mut edges = Vec::new();
            for (root_id, owner) in &graph.own {
                if owner != &user_id {
                    continue;
                }
                for category_id in graph.subtree(root_id) {
                    let Some(name) = graph.names.get(&category_id) else {
                        continue;
                    };
                    let parent_id = graph.child.get(&category_id).cloned();
                    edges.push(CategoryEdge {
                        id: category_id,
                        name: name.clone(),
                        parent_id,
                    });
                }
            }
            Ok(assemble_edges(edges))
        })
    }

    fn user_exists(&self, user_id: &str) -> BoxFuture<'_, DomainResult<bool>> {
        let user_id = user_id.to_string();
        let graph = self.graph.clone();
        Box::pin(async move {
            let graph = graph.read().await;
            Ok(graph.own.values().any(|owner| owner == &user_id))
        })
    }

    fn category_exists(&self, category_id: &str) -> BoxFuture<'_, DomainResult<bool>> {
        let category_id = category_id.to_string();
        let graph = self.graph.clone();
        Box::pin(async move { Ok(graph.read().await.names.contains_key(&category_id)) })
    }

    fn create_root(&self, name: &str, user_id: &str) -> BoxFuture<'_, DomainResult<Category>> {
        let name = name.to_string();
        let user_id = user_id.to_string();
        let graph = self.graph.clone();
        Box::pin(async move {
            let mut graph = graph.write().await;
            let category_id = Uuid::now_v7().to_string();
            graph.users.insert(user_id.clone());
            graph.names.insert(category_id.clone(), name.clone());
            graph.own.insert(category_id.clone(), user_id);
            Ok(Category::new(category_id, name, None))
        })
    }

    fn create_child(
        &self,
        name: &str,
        parent_id: &str,
    ) -> BoxFuture<'_, DomainResult<Category>> {
        let name = name.to_string();
        let parent_id = parent_id.to_string();
        let graph = self.graph.clone();
        Box::pin(async move {
            let mut graph = graph.write().await;
            if !graph.names.contains_key(&parent_id) {
                return Err(StoreError::EmptyResult("create child category").into());
            }
            let category_id = Uuid::now_v7().to_string();
            graph.names.insert(category_id.clone(), name.clone());
            graph.child.insert(category_id.clone(), parent_id.clone());
            Ok(Category::new(category_id, name, Some(parent_id)))
        })
    }

    fn rename(&self, category_id: &str, name: &str) -> BoxFuture<'_, DomainResult<bool>> {
        let category_id = category_id.to_string();
        let name = name.to_string();
        let graph = self.graph.clone();
        Box::pin(async move {
            let mut graph = graph.write().await;
            match graph.names.get_mut(&category_id) {
                Some(current) => {
                    *current = name;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn delete_subtree(&self, category_id: &str) -> BoxFuture<'_, DomainResult<usize>> {
        let category_id = category_id.to_string();
        let graph = self.graph.clone();
        Box::pin(async move {
            let mut graph = graph.write().await;
            let doomed = graph.subtree(&category_id);
            for id in &doomed {
                graph.names.remove(id);
                graph.own.remove(id);
                graph.child.remove(id);
            }
            Ok(doomed.len())
        })
    }

    fn owner_of(&self, category_id: &str) -> BoxFuture<'_, DomainResult<Option<String>>> {
        let category_id = category_id.to_string();
        let graph = self.graph.clone();
        Box::pin(async move {
            let graph = graph.read().await;
            let mut current = category_id;
            let mut seen = HashSet::new();
            while seen.insert(current.clone()) {
                if let Some(owner) = graph.own.get(&current) {
                    return Ok(Some(owner.clone()));
                }
                match graph.child.get(&current) {
                    Some(parent) => current = parent.clone(),
                    None => return Ok(None),
                }
            }
            Ok(None)
        })
    }
}
