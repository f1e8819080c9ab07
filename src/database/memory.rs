use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::models::{Movie, MovieFilter, User};
use super::store::{
    duplicate_email, movie_edit_conflict, movie_not_found, user_edit_conflict, user_not_found,
    MovieStore, UserStore,
};
use super::DatabaseError;

#[derive(Debug)]
struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// In-process store with the same version semantics as the Postgres stores.
/// Each write holds the table's write lock for the whole compare-and-set.
#[derive(Debug, Default)]
pub struct MemoryStore {
    movies: RwLock<Table<Movie>>,
    users: RwLock<Table<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare_by(column: &str, a: &Movie, b: &Movie) -> Ordering {
    match column {
        "title" => a.title.cmp(&b.title),
        "release_date" => a.release_date.cmp(&b.release_date),
        "runtime" => a.runtime.cmp(&b.runtime),
        "genres" => a.genres.cmp(&b.genres),
        "version" => a.version.cmp(&b.version),
        _ => a.id.cmp(&b.id),
    }
}

fn matches_filter(movie: &Movie, filter: &MovieFilter) -> bool {
    let title_ok = filter.title.is_empty() || movie.title.to_lowercase() == filter.title.to_lowercase();
    let genres_ok = filter.genres.iter().all(|g| movie.genres.contains(g));
    title_ok && genres_ok
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn get(&self, id: i64) -> Result<Movie, DatabaseError> {
        let table = self.movies.read().await;
        table.rows.get(&id).cloned().ok_or_else(|| movie_not_found(id))
    }

    async fn get_all(&self, filter: &MovieFilter) -> Result<Vec<Movie>, DatabaseError> {
        let table = self.movies.read().await;
        let mut movies: Vec<Movie> = table
            .rows
            .values()
            .filter(|movie| matches_filter(movie, filter))
            .cloned()
            .collect();

        let column = filter.sort_column();
        let descending = filter.sort_descending();
        movies.sort_by(|a, b| {
            let ordering = compare_by(column, a, b);
            let ordering = if descending { ordering.reverse() } else { ordering };
            ordering.then_with(|| a.id.cmp(&b.id))
        });

        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(filter.limit()).unwrap_or(0);
        Ok(movies.into_iter().skip(offset).take(limit).collect())
    }

    async fn create(&self, movie: &Movie) -> Result<Movie, DatabaseError> {
        let mut table = self.movies.write().await;
        let stored = Movie {
            id: table.allocate_id(),
            version: 1,
            ..movie.clone()
        };
        table.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, movie: &Movie, expected_version: i32) -> Result<i32, DatabaseError> {
        let mut table = self.movies.write().await;
        match table.rows.get_mut(&movie.id) {
            Some(current) if current.version == expected_version => {
                let version = current.version + 1;
                *current = Movie {
                    version,
                    ..movie.clone()
                };
                Ok(version)
            }
            _ => Err(movie_edit_conflict(movie.id)),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let mut table = self.movies.write().await;
        table
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| movie_not_found(id))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        let table = self.users.read().await;
        table
            .rows
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or_else(user_not_found)
    }

    async fn create(&self, user: &User) -> Result<User, DatabaseError> {
        let mut table = self.users.write().await;
        if table.rows.values().any(|existing| existing.email == user.email) {
            return Err(duplicate_email());
        }
        let stored = User {
            id: table.allocate_id(),
            version: 1,
            ..user.clone()
        };
        table.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, user: &User, expected_version: i32) -> Result<i32, DatabaseError> {
        let mut table = self.users.write().await;
        if table
            .rows
            .values()
            .any(|existing| existing.id != user.id && existing.email == user.email)
        {
            return Err(duplicate_email());
        }
        match table.rows.get_mut(&user.id) {
            Some(current) if current.version == expected_version => {
                let version = current.version + 1;
                *current = User {
                    version,
                    ..user.clone()
                };
                Ok(version)
            }
            _ => Err(user_edit_conflict(user.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn movie(title: &str, year: i32, runtime: i32, genres: &[&str]) -> Movie {
        Movie {
            id: 0,
            title: title.to_string(),
            release_date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            runtime,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            version: 0,
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        MovieStore::create(&store, &movie("Casablanca", 1942, 102, &["drama", "romance"])).await.unwrap();
        MovieStore::create(&store, &movie("Alien", 1979, 117, &["horror", "sci-fi"])).await.unwrap();
        MovieStore::create(&store, &movie("Heat", 1995, 170, &["crime", "drama"])).await.unwrap();
        store
    }

    #[tokio::test]
    async fn create_assigns_id_and_first_version() {
        let store = MemoryStore::new();
        let first = MovieStore::create(&store, &movie("Up", 2009, 96, &["animation"])).await.unwrap();
        let second = MovieStore::create(&store, &movie("Up", 2009, 96, &["animation"])).await.unwrap();
        assert_eq!((first.id, first.version), (1, 1));
        assert_eq!((second.id, second.version), (2, 1));
    }

    #[tokio::test]
    async fn unchanged_update_still_increments_version() {
        let store = seeded().await;
        let current = MovieStore::get(&store, 1).await.unwrap();
        let version = MovieStore::update(&store, &current, current.version).await.unwrap();
        assert_eq!(version, current.version + 1);
        assert_eq!(MovieStore::get(&store, 1).await.unwrap().version, version);
    }

    #[tokio::test]
    async fn stale_version_is_conflict() {
        let store = seeded().await;
        let current = MovieStore::get(&store, 2).await.unwrap();
        MovieStore::update(&store, &current, 1).await.unwrap();

        let err = MovieStore::update(&store, &current, 1).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_after_delete_is_conflict() {
        let store = seeded().await;
        let current = MovieStore::get(&store, 3).await.unwrap();
        store.delete(3).await.unwrap();

        let err = MovieStore::update(&store, &current, current.version).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let store = seeded().await;
        store.delete(1).await.unwrap();
        assert!(matches!(store.delete(1).await, Err(DatabaseError::NotFound(_))));
        assert!(matches!(MovieStore::get(&store, 1).await, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn concurrent_updates_from_same_version_one_wins() {
        let store = Arc::new(seeded().await);
        let base = MovieStore::get(store.as_ref(), 1).await.unwrap();

        let mut first = base.clone();
        first.runtime = 103;
        let mut second = base.clone();
        second.runtime = 104;
        let expected = base.version;

        let (a, b) = tokio::join!(
            {
                let store = Arc::clone(&store);
                tokio::spawn(async move { MovieStore::update(store.as_ref(), &first, expected).await })
            },
            {
                let store = Arc::clone(&store);
                tokio::spawn(async move { MovieStore::update(store.as_ref(), &second, expected).await })
            }
        );
        let results = [a.unwrap(), b.unwrap()];

        let wins: Vec<i32> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(DatabaseError::Conflict(_))))
            .count();
        assert_eq!(wins, vec![expected + 1]);
        assert_eq!(conflicts, 1);
    }

    #[tokio::test]
    async fn filters_by_title_and_genres() {
        let store = seeded().await;

        let filter = MovieFilter {
            title: "alien".to_string(),
            ..MovieFilter::default()
        };
        let found = store.get_all(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Alien");

        let filter = MovieFilter {
            genres: vec!["drama".to_string()],
            ..MovieFilter::default()
        };
        let titles: Vec<String> = store
            .get_all(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["Casablanca", "Heat"]);
    }

    #[tokio::test]
    async fn sorts_and_pages() {
        let store = seeded().await;
        let filter = MovieFilter {
            sort: "-runtime".to_string(),
            page: 1,
            page_size: 2,
            ..MovieFilter::default()
        };
        let page: Vec<i64> = store.get_all(&filter).await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(page, vec![3, 2]);

        let filter = MovieFilter { page: 2, ..filter };
        let page: Vec<i64> = store.get_all(&filter).await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(page, vec![1]);
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        let user = User {
            id: 0,
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: "hash".into(),
            activated: false,
            version: 0,
        };
        let created = UserStore::create(&store, &user).await.unwrap();
        assert_eq!(created.version, 1);

        let err = UserStore::create(&store, &user).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));

        let fetched = store.get_by_email("alice@example.com").await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert!(matches!(
            store.get_by_email("bob@example.com").await,
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn user_update_checks_version() {
        let store = MemoryStore::new();
        let user = User {
            id: 0,
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: "hash".into(),
            activated: false,
            version: 0,
        };
        let mut created = UserStore::create(&store, &user).await.unwrap();
        created.activated = true;
        assert_eq!(UserStore::update(&store, &created, 1).await.unwrap(), 2);
        assert!(matches!(
            UserStore::update(&store, &created, 1).await,
            Err(DatabaseError::Conflict(_))
        ));
    }
}
