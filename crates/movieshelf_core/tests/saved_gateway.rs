use async_trait::async_trait;
use movieshelf_core::repo::saved_gateway::{SavedListOptions, SavedRowGateway, SavedSort};
use movieshelf_core::store::{
    Query, Row, RowList, RowStore, StoreError, StoreErrorKind, StoreResult, TableRef,
};
use movieshelf_core::{SavePayload, SqliteRowStore};
use serde_json::{Map, Value};

const IMAGE_BASE: &str = "https://img.test/w500";

fn saved_table() -> TableRef {
    TableRef::new("shelf", "saved")
}

fn gateway() -> SavedRowGateway<SqliteRowStore> {
    let store = SqliteRowStore::open_in_memory().unwrap();
    store.ensure_unique_index(&saved_table(), "movie_id").unwrap();
    SavedRowGateway::new(store, saved_table(), IMAGE_BASE)
}

fn payload(id: i64, title: &str, vote_average: f64, release_date: &str) -> SavePayload {
    SavePayload {
        id,
        title: Some(title.to_string()),
        poster_path: Some(format!("/{id}.jpg")),
        vote_average: Some(vote_average),
        popularity: Some(10.0),
        release_date: Some(release_date.to_string()),
        genre_ids: Some(vec![18, 53]),
    }
}

#[tokio::test]
async fn save_creates_row_with_snapshot_fields() {
    let gateway = gateway();

    let row = gateway
        .save(&payload(550, "Fight Club", 8.4, "1999-10-15"))
        .await
        .unwrap();

    assert_eq!(row.movie_id, 550);
    assert_eq!(row.title.as_deref(), Some("Fight Club"));
    assert_eq!(row.poster_url.as_deref(), Some("https://img.test/w500/550.jpg"));
    assert_eq!(row.genre_ids, vec![18, 53]);
    assert_eq!(row.saved_at.len(), "2025-01-01T00:00:00.000Z".len());
    assert!(row.saved_at.ends_with('Z'));

    let found = gateway.get_by_movie_id(550).await.unwrap().unwrap();
    assert_eq!(found, row);
}

#[tokio::test]
async fn save_with_only_an_id_stores_empty_optionals() {
    let gateway = gateway();

    let row = gateway.save(&SavePayload::new(7)).await.unwrap();

    assert_eq!(row.title, None);
    assert_eq!(row.poster_url, None);
    assert!(row.genre_ids.is_empty());
}

#[tokio::test]
async fn saving_twice_returns_existing_row() {
    let gateway = gateway();
    let first = gateway
        .save(&payload(550, "Fight Club", 8.4, "1999-10-15"))
        .await
        .unwrap();

    let second = gateway
        .save(&payload(550, "Fight Club", 8.4, "1999-10-15"))
        .await
        .unwrap();

    assert_eq!(second.key, first.key);
    assert_eq!(second.saved_at, first.saved_at);
    let page = gateway.list_saved(&SavedListOptions::default()).await.unwrap();
    assert_eq!(page.rows.len(), 1);
    assert_eq!(page.total, Some(1));
}

#[tokio::test]
async fn list_honors_sort_modes() {
    let gateway = gateway();
    gateway.save(&payload(1, "Heat", 8.3, "1995-12-15")).await.unwrap();
    gateway.save(&payload(2, "Alien", 8.5, "1979-05-25")).await.unwrap();
    gateway.save(&payload(3, "Memento", 8.2, "2000-10-11")).await.unwrap();

    let ids = |rows: Vec<movieshelf_core::SavedRow>| {
        rows.into_iter().map(|row| row.movie_id).collect::<Vec<_>>()
    };

    let by_rating = gateway
        .list_saved(&SavedListOptions {
            sort: SavedSort::Rating,
            ..SavedListOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(by_rating.rows), vec![2, 1, 3]);

    let by_title = gateway
        .list_saved(&SavedListOptions {
            sort: SavedSort::Title,
            ..SavedListOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(by_title.rows), vec![2, 1, 3]);

    let by_release = gateway
        .list_saved(&SavedListOptions {
            sort: SavedSort::Release,
            ..SavedListOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(by_release.rows), vec![3, 1, 2]);
}

#[tokio::test]
async fn list_pages_after_cursor() {
    let gateway = gateway();
    for id in 1..=5 {
        gateway
            .save(&payload(id, &format!("Movie {id}"), id as f64, "2001-01-01"))
            .await
            .unwrap();
    }

    let first = gateway
        .list_saved(&SavedListOptions {
            limit: Some(2),
            cursor_after: None,
            sort: SavedSort::Rating,
        })
        .await
        .unwrap();
    assert_eq!(first.rows.len(), 2);
    assert_eq!(first.total, Some(5));

    let second = gateway
        .list_saved(&SavedListOptions {
            limit: Some(2),
            cursor_after: first.rows.last().map(|row| row.key.clone()),
            sort: SavedSort::Rating,
        })
        .await
        .unwrap();
    let ids: Vec<_> = second.rows.iter().map(|row| row.movie_id).collect();
    assert_eq!(ids, vec![3, 2]);
}

#[tokio::test]
async fn lookups_and_deletes() {
    let gateway = gateway();
    assert_eq!(gateway.get_by_movie_id(99).await.unwrap(), None);
    assert_eq!(gateway.is_saved(99).await.unwrap(), None);

    let row = gateway.save(&SavePayload::new(99)).await.unwrap();
    assert_eq!(gateway.is_saved(99).await.unwrap(), Some(row.key.clone()));

    gateway.delete_saved(&row.key).await.unwrap();
    assert_eq!(gateway.is_saved(99).await.unwrap(), None);

    let err = gateway.delete_saved(&row.key).await.unwrap_err();
    assert_eq!(err.kind, StoreErrorKind::NotFound);
}

/// Reports every create as a duplicate while holding no rows.
struct PhantomConflictStore;

#[async_trait]
impl RowStore for PhantomConflictStore {
    async fn create_row(
        &self,
        _table: &TableRef,
        _row_id: &str,
        _data: Map<String, Value>,
    ) -> StoreResult<Row> {
        Err(StoreError::new(StoreErrorKind::Conflict, "row_already_exists").with_status(409))
    }

    async fn list_rows(&self, _table: &TableRef, _queries: &[Query]) -> StoreResult<RowList> {
        Ok(RowList::default())
    }

    async fn update_row(
        &self,
        table: &TableRef,
        row_id: &str,
        _data: Map<String, Value>,
    ) -> StoreResult<Row> {
        Err(StoreError::new(
            StoreErrorKind::NotFound,
            format!("{row_id} not in {table}"),
        ))
    }

    async fn delete_row(&self, table: &TableRef, row_id: &str) -> StoreResult<()> {
        Err(StoreError::new(
            StoreErrorKind::NotFound,
            format!("{row_id} not in {table}"),
        ))
    }
}

#[tokio::test]
async fn conflict_without_existing_row_is_propagated() {
    let gateway = SavedRowGateway::new(PhantomConflictStore, saved_table(), IMAGE_BASE);

    let err = gateway.save(&SavePayload::new(1)).await.unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(err.status, Some(409));
}
