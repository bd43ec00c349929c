//! Content aggregate usecase.
//!
//! Orchestrates a [`ContentStore`] and the four [`LookupRepository`] ports:
//! resolves relation IDs into lookup entities, hydrates aggregates on read and
//! owns the partial-merge semantics of content edits.

use std::sync::Arc;

use validator::Validate;

use crate::content::{
    unique_ids, Actor, Content, ContentPatch, Country, Director, Genre, LookupEntity, NewContent,
    RelationKind,
};
use crate::error::{CoreError, CoreResult};
use crate::filter::{ContentFilter, Pagination};
use crate::ports::{ContentStore, LookupRepository};
use crate::types::DbId;

/// The lookup ports the aggregate resolves its relations through.
#[derive(Clone)]
pub struct Lookups {
    pub countries: Arc<dyn LookupRepository<Country>>,
    pub genres: Arc<dyn LookupRepository<Genre>>,
    pub actors: Arc<dyn LookupRepository<Actor>>,
    pub directors: Arc<dyn LookupRepository<Director>>,
}

/// Entry point for content reads and writes.
///
/// Cheap to clone; every field is behind an `Arc`.
#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn ContentStore>,
    lookups: Lookups,
}

impl ContentService {
    pub fn new(store: Arc<dyn ContentStore>, lookups: Lookups) -> Self {
        Self { store, lookups }
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Persist an already-hydrated aggregate. `content.id` is set on success.
    pub async fn create(&self, content: &mut Content) -> CoreResult<()> {
        content.clear_personalization();
        self.store.insert(content).await?;
        tracing::info!(content_id = content.id, name = %content.name, "Content created");
        Ok(())
    }

    /// Validate a draft, resolve its relation IDs and persist it.
    pub async fn create_from_draft(&self, draft: NewContent) -> CoreResult<Content> {
        draft
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        let mut content = draft.to_content();
        content.countries = self
            .resolve(&*self.lookups.countries, draft.relation_ids(RelationKind::Country))
            .await?;
        content.genres = self
            .resolve(&*self.lookups.genres, draft.relation_ids(RelationKind::Genre))
            .await?;
        content.actors = self
            .resolve(&*self.lookups.actors, draft.relation_ids(RelationKind::Actor))
            .await?;
        content.directors = self
            .resolve(&*self.lookups.directors, draft.relation_ids(RelationKind::Director))
            .await?;

        self.create(&mut content).await?;
        Ok(content)
    }

    /// Merge `patch` onto the stored aggregate and persist the result.
    ///
    /// Scalars follow [`Content::merge_scalars`]; each relation list is
    /// replaced only when the patch supplies a non-empty ID list.
    pub async fn update_by_id(&self, id: DbId, patch: ContentPatch) -> CoreResult<Content> {
        let mut content = self.get_full_by_id(id, None).await?;
        content.merge_scalars(&patch);

        if !patch.countries.is_empty() {
            content.countries = self
                .resolve(&*self.lookups.countries, &patch.countries)
                .await?;
        }
        if !patch.genres.is_empty() {
            content.genres = self.resolve(&*self.lookups.genres, &patch.genres).await?;
        }
        if !patch.actors.is_empty() {
            content.actors = self.resolve(&*self.lookups.actors, &patch.actors).await?;
        }
        if !patch.directors.is_empty() {
            content.directors = self
                .resolve(&*self.lookups.directors, &patch.directors)
                .await?;
        }

        self.store.update(&content).await?;
        tracing::info!(content_id = id, "Content updated");
        Ok(content)
    }

    /// Point the content at a new asset directory.
    ///
    /// Unchanged paths are a no-op. The previous directory is left in place:
    /// asset paths derive from the content identity and stay stable.
    pub async fn update_posters(&self, content: &mut Content, new_dir: &str) -> CoreResult<()> {
        if content.images == new_dir {
            tracing::debug!(content_id = content.id, "Poster directory unchanged");
            return Ok(());
        }

        let previous = std::mem::replace(&mut content.images, new_dir.to_string());
        if let Err(err) = self.store.update_images(content).await {
            content.images = previous;
            return Err(err);
        }
        Ok(())
    }

    pub async fn delete_by_id(&self, id: DbId) -> CoreResult<()> {
        self.store.select_by_id(id).await?;
        self.store.delete(id).await?;
        tracing::info!(content_id = id, "Content deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Fully hydrated aggregate, personalized for `viewer` when given.
    pub async fn get_full_by_id(&self, id: DbId, viewer: Option<DbId>) -> CoreResult<Content> {
        let mut content = self.store.select_full_by_id(id, viewer).await?;
        self.fill_content(&mut content).await?;
        Ok(content)
    }

    /// Replace the four relation lists of `content` with freshly resolved
    /// entities. Any relation ID that fails to resolve fails the whole call.
    pub async fn fill_content(&self, content: &mut Content) -> CoreResult<()> {
        let id = content.id;

        let ids = self.store.select_relation_ids(id, RelationKind::Country).await?;
        content.countries = self.resolve(&*self.lookups.countries, &ids).await?;

        let ids = self.store.select_relation_ids(id, RelationKind::Genre).await?;
        content.genres = self.resolve(&*self.lookups.genres, &ids).await?;

        let ids = self.store.select_relation_ids(id, RelationKind::Actor).await?;
        content.actors = self.resolve(&*self.lookups.actors, &ids).await?;

        let ids = self.store.select_relation_ids(id, RelationKind::Director).await?;
        content.directors = self.resolve(&*self.lookups.directors, &ids).await?;

        Ok(())
    }

    pub async fn list(
        &self,
        filter: &ContentFilter,
        page: Pagination,
        viewer: Option<DbId>,
    ) -> CoreResult<Vec<Content>> {
        let rows = self.store.select_by_params(filter, page, viewer).await?;
        self.hydrate_all(rows).await
    }

    /// Newest content first.
    pub async fn latest(&self, page: Pagination, viewer: Option<DbId>) -> CoreResult<Vec<Content>> {
        let rows = self.store.select_latest(page, viewer).await?;
        self.hydrate_all(rows).await
    }

    /// Best liked content first.
    pub async fn top_rated(
        &self,
        page: Pagination,
        viewer: Option<DbId>,
    ) -> CoreResult<Vec<Content>> {
        let rows = self.store.select_by_rating(page, viewer).await?;
        self.hydrate_all(rows).await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn hydrate_all(&self, mut rows: Vec<Content>) -> CoreResult<Vec<Content>> {
        for content in &mut rows {
            self.fill_content(content).await?;
        }
        Ok(rows)
    }

    async fn resolve<T: LookupEntity>(
        &self,
        repo: &dyn LookupRepository<T>,
        ids: &[DbId],
    ) -> CoreResult<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        repo.list_by_id(&unique_ids(ids))
            .await
            .map_err(|err| lookup_failure(T::KIND, err))
    }
}

/// A lookup that reports `NotFound` keeps it: an orphaned relation is a real
/// defect worth naming. Everything else becomes `Internal`.
fn lookup_failure(kind: RelationKind, err: CoreError) -> CoreError {
    match err {
        not_found @ CoreError::NotFound { .. } => {
            tracing::warn!(kind = %kind, error = %not_found, "Relation failed to resolve");
            not_found
        }
        other => CoreError::Internal(format!("Failed to resolve {kind} relations: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::content::ContentType;

    // -----------------------------------------------------------------------
    // Fakes
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<BTreeMap<DbId, Content>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl MemoryStore {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn scalar(content: &Content) -> Content {
            Content {
                countries: vec![],
                genres: vec![],
                actors: vec![],
                directors: vec![],
                ..content.clone()
            }
        }

        fn not_found(id: DbId) -> CoreError {
            CoreError::NotFound {
                entity: "Content",
                id,
            }
        }
    }

    #[async_trait]
    impl ContentStore for MemoryStore {
        async fn insert(&self, content: &mut Content) -> CoreResult<()> {
            self.record("insert");
            let mut rows = self.rows.lock().unwrap();
            content.id = rows.keys().last().copied().unwrap_or(0) + 1;
            rows.insert(content.id, content.clone());
            Ok(())
        }

        async fn update(&self, content: &Content) -> CoreResult<()> {
            self.record("update");
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&content.id) {
                Some(row) => {
                    *row = content.clone();
                    Ok(())
                }
                None => Err(Self::not_found(content.id)),
            }
        }

        async fn update_images(&self, content: &Content) -> CoreResult<()> {
            self.record("update_images");
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .get_mut(&content.id)
                .ok_or_else(|| Self::not_found(content.id))?;
            row.images = content.images.clone();
            Ok(())
        }

        async fn delete(&self, id: DbId) -> CoreResult<()> {
            self.record("delete");
            self.rows
                .lock()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| Self::not_found(id))
        }

        async fn select_by_id(&self, id: DbId) -> CoreResult<Content> {
            self.record("select_by_id");
            self.rows
                .lock()
                .unwrap()
                .get(&id)
                .map(Self::scalar)
                .ok_or_else(|| Self::not_found(id))
        }

        async fn select_full_by_id(&self, id: DbId, viewer: Option<DbId>) -> CoreResult<Content> {
            let mut content = self.select_by_id(id).await?;
            if viewer.is_some() {
                content.is_favourite = Some(false);
            }
            Ok(content)
        }

        async fn select_relation_ids(
            &self,
            id: DbId,
            kind: RelationKind,
        ) -> CoreResult<Vec<DbId>> {
            self.rows
                .lock()
                .unwrap()
                .get(&id)
                .map(|c| c.relation_ids(kind))
                .ok_or_else(|| Self::not_found(id))
        }

        async fn select_by_params(
            &self,
            filter: &ContentFilter,
            page: Pagination,
            _viewer: Option<DbId>,
        ) -> CoreResult<Vec<Content>> {
            let rows = self.rows.lock().unwrap();
            let matching = rows
                .values()
                .filter(|c| filter.year.map_or(true, |y| c.year == y))
                .filter(|c| {
                    filter
                        .genre
                        .map_or(true, |g| c.relation_ids(RelationKind::Genre).contains(&g))
                })
                .skip(page.from as usize)
                .take(if page.is_unbounded() {
                    usize::MAX
                } else {
                    page.count as usize
                })
                .map(Self::scalar)
                .collect();
            Ok(matching)
        }

        async fn select_latest(
            &self,
            page: Pagination,
            viewer: Option<DbId>,
        ) -> CoreResult<Vec<Content>> {
            let mut rows = self
                .select_by_params(&ContentFilter::default(), Pagination::UNBOUNDED, viewer)
                .await?;
            rows.reverse();
            Ok(rows
                .into_iter()
                .skip(page.from as usize)
                .take(if page.is_unbounded() {
                    usize::MAX
                } else {
                    page.count as usize
                })
                .collect())
        }

        async fn select_by_rating(
            &self,
            page: Pagination,
            viewer: Option<DbId>,
        ) -> CoreResult<Vec<Content>> {
            self.select_by_params(&ContentFilter::default(), page, viewer)
                .await
        }
    }

    struct MemoryLookup<T> {
        names: HashMap<DbId, &'static str>,
        _kind: std::marker::PhantomData<T>,
    }

    impl<T: LookupEntity> MemoryLookup<T> {
        fn with(entries: &[(DbId, &'static str)]) -> Arc<Self> {
            Arc::new(Self {
                names: entries.iter().copied().collect(),
                _kind: std::marker::PhantomData,
            })
        }
    }

    #[async_trait]
    impl<T: LookupEntity> LookupRepository<T> for MemoryLookup<T> {
        async fn get_by_id(&self, id: DbId) -> CoreResult<T> {
            self.names
                .get(&id)
                .map(|name| T::from_parts(id, name.to_string()))
                .ok_or(CoreError::NotFound {
                    entity: T::KIND.entity_name(),
                    id,
                })
        }
    }

    struct BrokenLookup;

    #[async_trait]
    impl LookupRepository<Actor> for BrokenLookup {
        async fn get_by_id(&self, _id: DbId) -> CoreResult<Actor> {
            Err(CoreError::Validation("bad actor row".to_string()))
        }
    }

    fn lookups() -> Lookups {
        Lookups {
            countries: MemoryLookup::<Country>::with(&[(1, "USA"), (2, "France")]),
            genres: MemoryLookup::<Genre>::with(&[(1, "Comedy"), (2, "Animated"), (3, "Drama")]),
            actors: MemoryLookup::<Actor>::with(&[(1, "Mike Myers"), (2, "Eddie Murphy")]),
            directors: MemoryLookup::<Director>::with(&[(1, "Andrew Adamson")]),
        }
    }

    fn service() -> (ContentService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        (ContentService::new(store.clone(), lookups()), store)
    }

    fn shrek_draft() -> NewContent {
        NewContent {
            name: "Shrek".to_string(),
            original_name: "Shrek".to_string(),
            description: "An ogre finds a friend".to_string(),
            short_description: "Ogre".to_string(),
            year: 2001,
            images: String::new(),
            content_type: ContentType::Movie,
            is_free: false,
            countries: vec![1],
            genres: vec![1, 2],
            actors: vec![1, 2],
            directors: vec![1],
        }
    }

    fn genre_names(content: &Content) -> Vec<&str> {
        content.genres.iter().map(|g| g.name.as_str()).collect()
    }

    // -----------------------------------------------------------------------
    // Create / read
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_from_draft_round_trips_through_get_full() {
        let (service, _) = service();
        let created = service.create_from_draft(shrek_draft()).await.unwrap();
        assert_ne!(created.id, 0);

        let fetched = service.get_full_by_id(created.id, None).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(genre_names(&fetched), vec!["Comedy", "Animated"]);
    }

    #[tokio::test]
    async fn create_rejects_invalid_draft_before_touching_store() {
        let (service, store) = service();
        let draft = NewContent {
            name: String::new(),
            ..shrek_draft()
        };
        let err = service.create_from_draft(draft).await.unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn create_with_unknown_genre_reports_that_genre() {
        let (service, store) = service();
        let draft = NewContent {
            genres: vec![1, 42],
            ..shrek_draft()
        };
        let err = service.create_from_draft(draft).await.unwrap_err();
        assert_matches!(
            err,
            CoreError::NotFound {
                entity: "Genre",
                id: 42
            }
        );
        assert!(!store.calls().contains(&"insert"));
    }

    #[tokio::test]
    async fn duplicate_relation_ids_resolve_once() {
        let (service, _) = service();
        let draft = NewContent {
            genres: vec![1, 1, 2],
            ..shrek_draft()
        };
        let created = service.create_from_draft(draft).await.unwrap();
        assert_eq!(genre_names(&created), vec!["Comedy", "Animated"]);
    }

    #[tokio::test]
    async fn orphaned_relation_fails_whole_fetch() {
        let (service, store) = service();
        let mut content = shrek_draft().to_content();
        content.genres = vec![Genre {
            id: 99,
            name: "Deleted".to_string(),
        }];
        store.insert(&mut content).await.unwrap();

        let err = service.get_full_by_id(content.id, None).await.unwrap_err();
        assert_matches!(
            err,
            CoreError::NotFound {
                entity: "Genre",
                id: 99
            }
        );
    }

    #[tokio::test]
    async fn non_not_found_lookup_failure_becomes_internal() {
        let store = Arc::new(MemoryStore::default());
        let service = ContentService::new(
            store,
            Lookups {
                actors: Arc::new(BrokenLookup),
                ..lookups()
            },
        );
        let err = service.create_from_draft(shrek_draft()).await.unwrap_err();
        assert_matches!(err, CoreError::Internal(msg) if msg.contains("Actor"));
    }

    #[tokio::test]
    async fn personalization_is_unset_without_viewer() {
        let (service, _) = service();
        let created = service.create_from_draft(shrek_draft()).await.unwrap();

        let anonymous = service.get_full_by_id(created.id, None).await.unwrap();
        assert_eq!(anonymous.is_favourite, None);
        assert_eq!(anonymous.is_liked, None);

        let personal = service.get_full_by_id(created.id, Some(5)).await.unwrap();
        assert_eq!(personal.is_favourite, Some(false));
    }

    #[tokio::test]
    async fn list_hydrates_every_row() {
        let (service, _) = service();
        service.create_from_draft(shrek_draft()).await.unwrap();
        service
            .create_from_draft(NewContent {
                name: "Amelie".to_string(),
                genres: vec![3],
                ..shrek_draft()
            })
            .await
            .unwrap();

        let filter = ContentFilter {
            genre: Some(3),
            ..ContentFilter::default()
        };
        let rows = service
            .list(&filter, Pagination::UNBOUNDED, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Amelie");
        assert_eq!(genre_names(&rows[0]), vec!["Drama"]);
        assert_eq!(rows[0].actors.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn empty_patch_is_idempotent() {
        let (service, _) = service();
        let created = service.create_from_draft(shrek_draft()).await.unwrap();

        let updated = service
            .update_by_id(created.id, ContentPatch::default())
            .await
            .unwrap();
        assert_eq!(updated, created);
        assert_eq!(
            service.get_full_by_id(created.id, None).await.unwrap(),
            created
        );
    }

    #[tokio::test]
    async fn patching_genres_replaces_only_genres() {
        let (service, _) = service();
        let created = service.create_from_draft(shrek_draft()).await.unwrap();

        service
            .update_by_id(
                created.id,
                ContentPatch {
                    genres: vec![1],
                    ..ContentPatch::default()
                },
            )
            .await
            .unwrap();

        let fetched = service.get_full_by_id(created.id, None).await.unwrap();
        assert_eq!(genre_names(&fetched), vec!["Comedy"]);
        assert_eq!(fetched.name, "Shrek");
        assert_eq!(fetched.year, 2001);
        assert_eq!(fetched.actors, created.actors);
    }

    #[tokio::test]
    async fn update_of_missing_content_is_not_found() {
        let (service, store) = service();
        let err = service
            .update_by_id(404, ContentPatch::default())
            .await
            .unwrap_err();
        assert_matches!(
            err,
            CoreError::NotFound {
                entity: "Content",
                id: 404
            }
        );
        assert!(!store.calls().contains(&"update"));
    }

    #[tokio::test]
    async fn update_posters_skips_unchanged_directory() {
        let (service, store) = service();
        let mut created = service.create_from_draft(shrek_draft()).await.unwrap();

        let current = created.images.clone();
        service.update_posters(&mut created, &current).await.unwrap();
        assert!(!store.calls().contains(&"update_images"));

        service
            .update_posters(&mut created, "/content/1/v2")
            .await
            .unwrap();
        assert_eq!(created.images, "/content/1/v2");
        let stored = store.select_by_id(created.id).await.unwrap();
        assert_eq!(stored.images, "/content/1/v2");
    }

    #[tokio::test]
    async fn failed_poster_update_restores_previous_directory() {
        let (service, _) = service();
        let mut ghost = Content {
            id: 77,
            images: "/old".to_string(),
            ..Content::default()
        };
        let err = service.update_posters(&mut ghost, "/new").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(ghost.images, "/old");
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn delete_missing_content_short_circuits() {
        let (service, store) = service();
        let err = service.delete_by_id(3).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.calls(), vec!["select_by_id"]);
    }

    #[tokio::test]
    async fn delete_removes_content() {
        let (service, _) = service();
        let created = service.create_from_draft(shrek_draft()).await.unwrap();
        service.delete_by_id(created.id).await.unwrap();
        assert!(service
            .get_full_by_id(created.id, None)
            .await
            .unwrap_err()
            .is_not_found());
    }
}
