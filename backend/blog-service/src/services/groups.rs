use crate::db::EntityStore;
use crate::error::{AppError, Result};
use crate::models::{Group, GroupForm};
use std::sync::Arc;
use tracing::info;

pub struct GroupService {
    store: Arc<dyn EntityStore>,
}

impl GroupService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Group> {
        self.store
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("group '{}'", slug)))
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        self.store.list_groups().await
    }

    /// Fails with `Conflict` when the slug is taken.
    pub async fn create_group(&self, form: &GroupForm) -> Result<Group> {
        let group = self.store.create_group(form.clean()?).await?;
        info!(group_id = group.id, slug = %group.slug, "group created");
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn form(slug: &str) -> GroupForm {
        GroupForm {
            title: format!("Title {}", slug),
            slug: slug.into(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let service = GroupService::new(Arc::new(MemoryStore::new()));
        let group = service.create_group(&form("cats")).await.unwrap();
        assert_eq!(service.get_by_slug("cats").await.unwrap(), group);
        assert!(matches!(
            service.get_by_slug("dogs").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let service = GroupService::new(Arc::new(MemoryStore::new()));
        service.create_group(&form("cats")).await.unwrap();
        assert!(matches!(
            service.create_group(&form("cats")).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(service.list_groups().await.unwrap().len(), 1);
    }
}
