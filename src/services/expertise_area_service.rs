//! Expertise-area taxonomy service.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    slugify, ExpertiseArea, ExpertiseAreaNode, ExpertiseAreaUpdate, NewExpertiseArea,
};
use crate::domain::ports::ExpertiseAreaRepository;

pub struct ExpertiseAreaService<R: ExpertiseAreaRepository> {
    repository: Arc<R>,
}

impl<R: ExpertiseAreaRepository> ExpertiseAreaService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a new area. The slug defaults to the slugified name.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewExpertiseArea) -> DomainResult<ExpertiseArea> {
        let name = validate_name(&input.name)?;
        let slug = match input.slug {
            Some(slug) => validate_slug(&slug)?,
            None => validate_slug(&slugify(&name))?,
        };

        self.ensure_slug_free(&slug, None).await?;
        self.ensure_name_free(&name, None).await?;

        let mut area = ExpertiseArea::new(name).with_slug(slug);
        if let Some(description) = input.description {
            area = area.with_description(description);
        }
        if let Some(parent_id) = input.parent_id {
            // Parent must exist
            self.get(&parent_id).await?;
            area = area.with_parent(parent_id);
        }

        self.repository.create(&area).await?;
        info!(area_id = %area.id, slug = %area.slug, "created expertise area");
        Ok(area)
    }

    pub async fn get(&self, id: &str) -> DomainResult<ExpertiseArea> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::AreaNotFound(id.to_string()))
    }

    pub async fn get_by_slug(&self, slug: &str) -> DomainResult<ExpertiseArea> {
        self.repository
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::AreaNotFound(slug.to_string()))
    }

    /// Apply a partial update.
    ///
    /// Reparenting is rejected when the new parent is the area itself or one
    /// of its descendants.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: ExpertiseAreaUpdate) -> DomainResult<ExpertiseArea> {
        let mut area = self.get(id).await?;

        if let Some(name) = update.name {
            let name = validate_name(&name)?;
            self.ensure_name_free(&name, Some(&area.id)).await?;
            area.name = name;
        }
        if let Some(slug) = update.slug {
            let slug = validate_slug(&slug)?;
            self.ensure_slug_free(&slug, Some(&area.id)).await?;
            area.slug = slug;
        }
        if let Some(description) = update.description {
            area.description = Some(description);
        }
        if let Some(parent_id) = update.parent_id {
            if let Some(parent_id) = &parent_id {
                self.ensure_no_cycle(&area.id, parent_id).await?;
            }
            area.parent_id = parent_id;
        }
        if let Some(is_active) = update.is_active {
            area.is_active = is_active;
        }

        area.updated_at = Utc::now();
        self.repository.update(&area).await?;
        Ok(area)
    }

    /// Delete an area. Areas with children must be emptied first.
    pub async fn delete(&self, id: &str) -> DomainResult<()> {
        let children = self.children(id).await?;
        if !children.is_empty() {
            return Err(DomainError::ValidationFailed(format!(
                "cannot delete expertise area {id} with {} children; delete or move them first",
                children.len()
            )));
        }
        self.repository.delete(id).await?;
        info!(area_id = id, "deleted expertise area");
        Ok(())
    }

    /// Direct children of an existing area.
    pub async fn children(&self, id: &str) -> DomainResult<Vec<ExpertiseArea>> {
        self.get(id).await?;
        self.repository.children(id).await
    }

    pub async fn list(&self, active_only: bool) -> DomainResult<Vec<ExpertiseArea>> {
        self.repository.list(active_only).await
    }

    /// The whole taxonomy as a forest of root nodes.
    ///
    /// With `active_only`, inactive areas and everything beneath them are
    /// left out.
    pub async fn tree(&self, active_only: bool) -> DomainResult<Vec<ExpertiseAreaNode>> {
        let areas = self.repository.list(active_only).await?;
        Ok(build_forest(areas))
    }

    /// Ancestors of an area, root first, ending with the area itself.
    pub async fn path_to_root(&self, id: &str) -> DomainResult<Vec<ExpertiseArea>> {
        let mut path: Vec<ExpertiseArea> = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(id.to_string());

        while let Some(area_id) = current {
            if !visited.insert(area_id.clone()) {
                let mut cycle: Vec<String> = path.iter().rev().map(|a| a.id.clone()).collect();
                cycle.push(area_id);
                return Err(DomainError::HierarchyCycle(cycle));
            }
            let area = self.get(&area_id).await?;
            current = area.parent_id.clone();
            path.push(area);
        }

        path.reverse();
        Ok(path)
    }

    /// Number of profiles that list this area.
    pub async fn users_count(&self, id: &str) -> DomainResult<u64> {
        self.get(id).await?;
        self.repository.count_profiles(id).await
    }

    async fn ensure_slug_free(&self, slug: &str, current_id: Option<&str>) -> DomainResult<()> {
        match self.repository.get_by_slug(slug).await? {
            Some(existing) if Some(existing.id.as_str()) != current_id => Err(DomainError::Conflict(
                format!("expertise area slug '{slug}' is already used by {}", existing.id),
            )),
            _ => Ok(()),
        }
    }

    async fn ensure_name_free(&self, name: &str, current_id: Option<&str>) -> DomainResult<()> {
        match self.repository.get_by_name(name).await? {
            Some(existing) if Some(existing.id.as_str()) != current_id => Err(DomainError::Conflict(
                format!("expertise area name '{name}' is already used by {}", existing.id),
            )),
            _ => Ok(()),
        }
    }

    /// Walk up from `new_parent_id`; reaching `area_id` means a cycle.
    async fn ensure_no_cycle(&self, area_id: &str, new_parent_id: &str) -> DomainResult<()> {
        let mut path = vec![area_id.to_string(), new_parent_id.to_string()];
        if new_parent_id == area_id {
            return Err(DomainError::HierarchyCycle(path));
        }

        let mut visited: HashSet<String> = path.iter().cloned().collect();
        let mut current = self.get(new_parent_id).await?;
        while let Some(parent_id) = current.parent_id.take() {
            path.push(parent_id.clone());
            if parent_id == area_id || !visited.insert(parent_id.clone()) {
                return Err(DomainError::HierarchyCycle(path));
            }
            current = self.get(&parent_id).await?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::ValidationFailed(
            "expertise area name cannot be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn validate_slug(slug: &str) -> DomainResult<String> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(DomainError::ValidationFailed(
            "expertise area slug cannot be empty".to_string(),
        ));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(DomainError::ValidationFailed(format!(
            "expertise area slug '{slug}' may only contain a-z, 0-9 and '-'"
        )));
    }
    Ok(slug.to_string())
}

/// Assemble areas into trees without recursion.
///
/// Areas are visited breadth-first from the roots; anything not reachable
/// from a root (orphans, members of a cycle) is dropped. Nodes are then
/// built bottom-up in reverse visit order.
fn build_forest(areas: Vec<ExpertiseArea>) -> Vec<ExpertiseAreaNode> {
    let mut by_parent: HashMap<Option<String>, Vec<ExpertiseArea>> = HashMap::new();
    for area in areas {
        by_parent.entry(area.parent_id.clone()).or_default().push(area);
    }

    let mut visit_order: Vec<(ExpertiseArea, Option<usize>)> = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    for root in by_parent.remove(&None).unwrap_or_default() {
        visited.insert(root.id.clone());
        visit_order.push((root, None));
        queue.push_back(visit_order.len() - 1);
    }
    while let Some(index) = queue.pop_front() {
        let key = Some(visit_order[index].0.id.clone());
        for child in by_parent.remove(&key).unwrap_or_default() {
            if visited.insert(child.id.clone()) {
                visit_order.push((child, Some(index)));
                queue.push_back(visit_order.len() - 1);
            }
        }
    }

    let mut pending: Vec<Vec<ExpertiseAreaNode>> = (0..visit_order.len()).map(|_| Vec::new()).collect();
    let mut roots = Vec::new();
    for (index, (area, parent)) in visit_order.into_iter().enumerate().rev() {
        let mut children = std::mem::take(&mut pending[index]);
        children.reverse();
        let node = ExpertiseAreaNode { area, children };
        match parent {
            Some(parent) => pending[parent].push(node),
            None => roots.push(node),
        }
    }
    roots.reverse();
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteExpertiseAreaRepository};

    async fn setup_service() -> ExpertiseAreaService<SqliteExpertiseAreaRepository> {
        let pool = create_migrated_test_pool().await.unwrap();
        ExpertiseAreaService::new(Arc::new(SqliteExpertiseAreaRepository::new(pool)))
    }

    fn new_area(name: &str, parent_id: Option<&str>) -> NewExpertiseArea {
        NewExpertiseArea {
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug() {
        let service = setup_service().await;
        let area = service.create(new_area("Machine Learning", None)).await.unwrap();
        assert_eq!(area.slug, "machine-learning");

        let fetched = service.get_by_slug("machine-learning").await.unwrap();
        assert_eq!(fetched.id, area.id);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let service = setup_service().await;
        service.create(new_area("Science", None)).await.unwrap();

        let err = service.create(new_area("science", None)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let mut other = new_area("Sciences", None);
        other.slug = Some("science".to_string());
        let err = service.create(other).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_requires_existing_parent() {
        let service = setup_service().await;
        let err = service
            .create(new_area("Orphan", Some("exp_missing")))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AreaNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_self_parent() {
        let service = setup_service().await;
        let area = service.create(new_area("Technology", None)).await.unwrap();

        let update = ExpertiseAreaUpdate {
            parent_id: Some(Some(area.id.clone())),
            ..Default::default()
        };
        let err = service.update(&area.id, update).await.unwrap_err();
        assert!(matches!(err, DomainError::HierarchyCycle(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_descendant_parent() {
        let service = setup_service().await;
        let root = service.create(new_area("Technology", None)).await.unwrap();
        let mid = service.create(new_area("Programming", Some(&root.id))).await.unwrap();
        let leaf = service.create(new_area("Rust", Some(&mid.id))).await.unwrap();

        let update = ExpertiseAreaUpdate {
            parent_id: Some(Some(leaf.id.clone())),
            ..Default::default()
        };
        match service.update(&root.id, update).await.unwrap_err() {
            DomainError::HierarchyCycle(path) => {
                assert_eq!(path.first(), Some(&root.id));
                assert_eq!(path.last(), Some(&root.id));
            }
            other => panic!("unexpected error: {other}"),
        }

        // Unchanged
        assert!(service.get(&root.id).await.unwrap().is_root());
    }

    #[tokio::test]
    async fn test_update_detach_to_root() {
        let service = setup_service().await;
        let root = service.create(new_area("Technology", None)).await.unwrap();
        let child = service.create(new_area("Gaming", Some(&root.id))).await.unwrap();

        let update = ExpertiseAreaUpdate {
            parent_id: Some(None),
            description: Some("Video games".to_string()),
            ..Default::default()
        };
        let updated = service.update(&child.id, update).await.unwrap();
        assert!(updated.is_root());
        assert_eq!(updated.description.as_deref(), Some("Video games"));
    }

    #[tokio::test]
    async fn test_delete_with_children_forbidden() {
        let service = setup_service().await;
        let root = service.create(new_area("Science", None)).await.unwrap();
        let child = service.create(new_area("Physics", Some(&root.id))).await.unwrap();

        let err = service.delete(&root.id).await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));

        service.delete(&child.id).await.unwrap();
        service.delete(&root.id).await.unwrap();
        assert!(matches!(
            service.get(&root.id).await.unwrap_err(),
            DomainError::AreaNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_tree_and_path() {
        let service = setup_service().await;
        let science = service.create(new_area("Science", None)).await.unwrap();
        let physics = service.create(new_area("Physics", Some(&science.id))).await.unwrap();
        let biology = service.create(new_area("Biology", Some(&science.id))).await.unwrap();
        let quantum = service.create(new_area("Quantum", Some(&physics.id))).await.unwrap();
        service.create(new_area("Arts", None)).await.unwrap();

        let tree = service.tree(false).await.unwrap();
        let roots: Vec<_> = tree.iter().map(|n| n.area.name.as_str()).collect();
        assert_eq!(roots, vec!["Arts", "Science"]);

        let science_node = &tree[1];
        let kids: Vec<_> = science_node.children.iter().map(|n| n.area.id.as_str()).collect();
        assert_eq!(kids, vec![biology.id.as_str(), physics.id.as_str()]);
        assert_eq!(science_node.children[1].children[0].area.id, quantum.id);

        let path: Vec<_> = service
            .path_to_root(&quantum.id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(path, vec![science.id, physics.id, quantum.id]);
    }

    #[tokio::test]
    async fn test_tree_active_only_prunes_inactive_subtrees() {
        let service = setup_service().await;
        let science = service.create(new_area("Science", None)).await.unwrap();
        let physics = service.create(new_area("Physics", Some(&science.id))).await.unwrap();
        service.create(new_area("Quantum", Some(&physics.id))).await.unwrap();

        let update = ExpertiseAreaUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        service.update(&physics.id, update).await.unwrap();

        let tree = service.tree(true).await.unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree[0].children.is_empty());
    }

    #[test]
    fn test_build_forest_drops_unreachable_cycles() {
        let mut a = ExpertiseArea::new("A");
        let b = ExpertiseArea::new("B").with_parent(a.id.clone());
        a.parent_id = Some(b.id.clone());
        let root = ExpertiseArea::new("Root");

        let forest = build_forest(vec![a, b, root.clone()]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].area.id, root.id);
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("data-science").is_ok());
        assert!(validate_slug("Data Science").is_err());
        assert!(validate_slug("   ").is_err());
    }
}
