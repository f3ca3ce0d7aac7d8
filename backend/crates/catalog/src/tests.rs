//! Use case and HTTP tests for the catalog crate
//!
//! Routers run against an in-memory repository that mirrors the SQL
//! semantics (ordering, filters, ON DELETE SET NULL).

#[cfg(test)]
mod support {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use chrono::{DateTime, TimeDelta, Utc};
    use kernel::id::{BookId, GenreId, ScrapingLogId, UserId};
    use kernel::pagination::PageRequest;
    use serde_json::Value;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    use crate::application::config::CatalogConfig;
    use crate::domain::entities::{Book, BookFields, Genre, GenreWithCount, ScrapingLog};
    use crate::domain::repository::{
        BookFilter, BookRepository, FavoriteRepository, GenreFilter, GenreRepository,
        ScrapingLogRepository,
    };
    use crate::domain::value_objects::{MediaPath, Price, Rating};
    use crate::error::{CatalogError, CatalogResult};

    #[derive(Clone, Default)]
    pub struct InMemoryCatalogRepository {
        genres: Arc<RwLock<HashMap<GenreId, Genre>>>,
        books: Arc<RwLock<HashMap<BookId, Book>>>,
        runs: Arc<RwLock<HashMap<ScrapingLogId, ScrapingLog>>>,
        favorites: Arc<RwLock<Vec<(UserId, BookId, DateTime<Utc>)>>>,
    }

    impl InMemoryCatalogRepository {
        pub async fn add_genre(&self, name: &str) -> Genre {
            let genre = Genre::new(name.to_string(), None, Utc::now());
            self.genres.write().await.insert(genre.id, genre.clone());
            genre
        }

        /// Book created `age_minutes` ago, so listings have a stable order
        pub async fn add_book(
            &self,
            title: &str,
            genre: Option<GenreId>,
            age_minutes: i64,
            configure: impl FnOnce(&mut BookFields),
        ) -> Book {
            let mut fields = book_fields(title, "Some Author");
            fields.genre_id = genre;
            configure(&mut fields);
            let book = Book::new(fields, Utc::now() - TimeDelta::minutes(age_minutes));
            self.books.write().await.insert(book.id, book.clone());
            book
        }

        pub async fn add_run(&self, run: ScrapingLog) {
            self.runs.write().await.insert(run.id, run);
        }

        pub async fn book(&self, id: &BookId) -> Option<Book> {
            self.books.read().await.get(id).cloned()
        }

        async fn with_count(&self, genre: Genre) -> GenreWithCount {
            let books_count = self
                .books
                .read()
                .await
                .values()
                .filter(|b| b.genre_id == Some(genre.id))
                .count() as u64;
            GenreWithCount { genre, books_count }
        }

        async fn matches(&self, book: &Book, filter: &BookFilter) -> bool {
            let contains = |hay: &str, needle: &Option<String>| {
                needle
                    .as_ref()
                    .is_none_or(|n| hay.to_lowercase().contains(&n.to_lowercase()))
            };
            if !contains(&book.title, &filter.title) || !contains(&book.author, &filter.author) {
                return false;
            }

            let genre_ok = match &filter.genre {
                None => true,
                Some(GenreFilter::Id(id)) => book.genre_id == Some(*id),
                Some(GenreFilter::Name(name)) => {
                    let genres = self.genres.read().await;
                    book.genre_id
                        .and_then(|id| genres.get(&id))
                        .is_some_and(|g| g.name.to_lowercase() == name.to_lowercase())
                }
            };
            let year = book.publication_year.map(|y| y.value());
            let from_ok = filter.from_year.is_none_or(|f| year.is_some_and(|y| y >= f));
            let to_ok = filter.to_year.is_none_or(|t| year.is_some_and(|y| y <= t));
            let stock_ok = filter.in_stock.is_none_or(|s| book.in_stock == s);

            genre_ok && from_ok && to_ok && stock_ok
        }
    }

    fn newest_first(books: &mut [Book]) {
        books.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
    }

    impl GenreRepository for InMemoryCatalogRepository {
        async fn list_genres(&self) -> CatalogResult<Vec<GenreWithCount>> {
            let mut genres: Vec<Genre> = self.genres.read().await.values().cloned().collect();
            genres.sort_by(|a, b| a.name.cmp(&b.name));
            let mut out = Vec::new();
            for genre in genres {
                out.push(self.with_count(genre).await);
            }
            Ok(out)
        }

        async fn find_genre(&self, id: &GenreId) -> CatalogResult<Option<GenreWithCount>> {
            let genre = self.genres.read().await.get(id).cloned();
            match genre {
                Some(genre) => Ok(Some(self.with_count(genre).await)),
                None => Ok(None),
            }
        }

        async fn genre_summaries(&self, ids: &[GenreId]) -> CatalogResult<Vec<GenreWithCount>> {
            let mut out = Vec::new();
            for id in ids {
                if let Some(genre) = self.find_genre(id).await? {
                    out.push(genre);
                }
            }
            Ok(out)
        }

        async fn genre_name_taken(&self, name: &str, except: Option<&GenreId>) -> CatalogResult<bool> {
            Ok(self.genres.read().await.values().any(|g| {
                g.name.to_lowercase() == name.to_lowercase() && Some(&g.id) != except
            }))
        }

        async fn create_genre(&self, genre: &Genre) -> CatalogResult<()> {
            if self.genre_name_taken(&genre.name, None).await? {
                return Err(CatalogError::Conflict("duplicate genre".into()));
            }
            self.genres.write().await.insert(genre.id, genre.clone());
            Ok(())
        }

        async fn update_genre(&self, genre: &Genre) -> CatalogResult<()> {
            self.genres.write().await.insert(genre.id, genre.clone());
            Ok(())
        }

        async fn delete_genre(&self, id: &GenreId) -> CatalogResult<bool> {
            if self.genres.write().await.remove(id).is_none() {
                return Ok(false);
            }
            for book in self.books.write().await.values_mut() {
                if book.genre_id == Some(*id) {
                    book.genre_id = None;
                }
            }
            Ok(true)
        }
    }

    impl BookRepository for InMemoryCatalogRepository {
        async fn search_books(
            &self,
            filter: &BookFilter,
            page: PageRequest,
        ) -> CatalogResult<(Vec<Book>, u64)> {
            let all: Vec<Book> = self.books.read().await.values().cloned().collect();
            let mut hits = Vec::new();
            for book in all {
                if self.matches(&book, filter).await {
                    hits.push(book);
                }
            }
            newest_first(&mut hits);

            let count = hits.len() as u64;
            let page_items = hits
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect();
            Ok((page_items, count))
        }

        async fn find_book(&self, id: &BookId) -> CatalogResult<Option<Book>> {
            Ok(self.book(id).await)
        }

        async fn similar_books(
            &self,
            genre: &GenreId,
            exclude: &BookId,
            limit: u32,
        ) -> CatalogResult<Vec<Book>> {
            let mut books: Vec<Book> = self
                .books
                .read()
                .await
                .values()
                .filter(|b| b.genre_id == Some(*genre) && &b.id != exclude)
                .cloned()
                .collect();
            newest_first(&mut books);
            books.truncate(limit as usize);
            Ok(books)
        }

        async fn book_exists(
            &self,
            title: &str,
            author: &str,
            except: Option<&BookId>,
        ) -> CatalogResult<bool> {
            Ok(self
                .books
                .read()
                .await
                .values()
                .any(|b| b.title == title && b.author == author && Some(&b.id) != except))
        }

        async fn create_book(&self, book: &Book) -> CatalogResult<()> {
            self.books.write().await.insert(book.id, book.clone());
            Ok(())
        }

        async fn update_book(&self, book: &Book) -> CatalogResult<()> {
            self.books.write().await.insert(book.id, book.clone());
            Ok(())
        }

        async fn delete_book(&self, id: &BookId) -> CatalogResult<bool> {
            if self.books.write().await.remove(id).is_none() {
                return Ok(false);
            }
            self.favorites.write().await.retain(|(_, book, _)| book != id);
            Ok(true)
        }
    }

    impl FavoriteRepository for InMemoryCatalogRepository {
        async fn list_favorites(&self, user: &UserId) -> CatalogResult<Vec<Book>> {
            let mut entries: Vec<(BookId, DateTime<Utc>)> = self
                .favorites
                .read()
                .await
                .iter()
                .filter(|(owner, _, _)| owner == user)
                .map(|(_, book, at)| (*book, *at))
                .collect();
            entries.sort_by(|a, b| b.1.cmp(&a.1));

            let books = self.books.read().await;
            Ok(entries
                .iter()
                .filter_map(|(id, _)| books.get(id).cloned())
                .collect())
        }

        async fn add_favorite(
            &self,
            user: &UserId,
            book: &BookId,
            at: DateTime<Utc>,
        ) -> CatalogResult<bool> {
            let mut favorites = self.favorites.write().await;
            if favorites.iter().any(|(u, b, _)| u == user && b == book) {
                return Ok(false);
            }
            favorites.push((*user, *book, at));
            Ok(true)
        }

        async fn remove_favorite(&self, user: &UserId, book: &BookId) -> CatalogResult<bool> {
            let mut favorites = self.favorites.write().await;
            let before = favorites.len();
            favorites.retain(|(u, b, _)| !(u == user && b == book));
            Ok(favorites.len() < before)
        }
    }

    impl ScrapingLogRepository for InMemoryCatalogRepository {
        async fn list_runs(&self) -> CatalogResult<Vec<ScrapingLog>> {
            let mut runs: Vec<ScrapingLog> = self.runs.read().await.values().cloned().collect();
            runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
            Ok(runs)
        }

        async fn find_run(&self, id: &ScrapingLogId) -> CatalogResult<Option<ScrapingLog>> {
            Ok(self.runs.read().await.get(id).cloned())
        }

        async fn create_run(&self, log: &ScrapingLog) -> CatalogResult<()> {
            self.add_run(log.clone()).await;
            Ok(())
        }

        async fn update_run(&self, log: &ScrapingLog) -> CatalogResult<()> {
            self.add_run(log.clone()).await;
            Ok(())
        }
    }

    pub fn book_fields(title: &str, author: &str) -> BookFields {
        BookFields {
            title: title.to_string(),
            author: author.to_string(),
            isbn: None,
            genre_id: None,
            description: None,
            publication_year: None,
            price: Price::parse("10.00").unwrap(),
            rating: Rating::new(3).unwrap(),
            in_stock: true,
            availability: "In stock".to_string(),
            source_url: None,
            image: None,
            last_scraped: None,
        }
    }

    pub fn image(path: &str) -> Option<MediaPath> {
        Some(MediaPath::new(path).unwrap())
    }

    pub fn config() -> CatalogConfig {
        CatalogConfig {
            media_root: std::env::temp_dir().join("catalog-tests-no-media"),
            ..CatalogConfig::default()
        }
    }

    pub fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "shop.test");
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

#[cfg(test)]
mod browse_tests {
    use axum::http::{Method, StatusCode};

    use super::support::*;
    use crate::domain::value_objects::{Price, PublicationYear, Rating};
    use crate::presentation::router::catalog_router_generic;

    fn app(repo: InMemoryCatalogRepository) -> axum::Router {
        catalog_router_generic(repo, config())
    }

    #[tokio::test]
    async fn test_list_is_paginated_newest_first() {
        let repo = InMemoryCatalogRepository::default();
        for i in 0..5 {
            repo.add_book(&format!("Book {i}"), None, i, |_| {}).await;
        }

        let (status, body) = send(&app(repo), Method::GET, "/books?page=2&page_size=2", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 5);
        assert_eq!(body["page"], 2);
        assert_eq!(body["total_pages"], 3);
        let titles: Vec<&str> = body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Book 2", "Book 3"]);
    }

    #[tokio::test]
    async fn test_book_list_path_serves_listing() {
        let repo = InMemoryCatalogRepository::default();
        repo.add_book("Walden", None, 0, |_| {}).await;

        let (status, body) = send(&app(repo), Method::GET, "/book_list?title=wal", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"][0]["title"], "Walden");
    }

    #[tokio::test]
    async fn test_list_item_shape() {
        let repo = InMemoryCatalogRepository::default();
        let genre = repo.add_genre("Poetry").await;
        repo.add_book("Leaves of Grass", Some(genre.id), 0, |f| {
            f.price = Price::parse("19.999").unwrap();
            f.image = image("covers/leaves.jpg");
        })
        .await;

        let (_, body) = send(&app(repo), Method::GET, "/books", None).await;
        let item = &body["results"][0];

        assert_eq!(item["price"], "19.99");
        assert_eq!(item["price_display"], "$19.99");
        assert_eq!(item["rating"], 3);
        assert_eq!(item["genre"]["name"], "Poetry");
        assert_eq!(item["genre"]["books_count"], 1);
        assert_eq!(item["image_url"], "http://shop.test/media/covers/leaves.jpg");
        assert!(item.get("description").is_none());
        assert!(item.get("similar_books").is_none());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let repo = InMemoryCatalogRepository::default();
        let scifi = repo.add_genre("Science Fiction").await;
        let poetry = repo.add_genre("Poetry").await;
        repo.add_book("Dune", Some(scifi.id), 0, |f| {
            f.publication_year = Some(PublicationYear::new(1965).unwrap());
        })
        .await;
        repo.add_book("Dune Messiah", Some(scifi.id), 1, |f| {
            f.publication_year = Some(PublicationYear::new(1969).unwrap());
            f.in_stock = false;
        })
        .await;
        repo.add_book("Ariel", Some(poetry.id), 2, |f| {
            f.publication_year = Some(PublicationYear::new(1965).unwrap());
        })
        .await;
        let app = app(repo);

        let count = |body: serde_json::Value| body["count"].as_u64().unwrap();

        let (_, body) = send(&app, Method::GET, "/books?title=DUNE", None).await;
        assert_eq!(count(body), 2);

        let (_, body) = send(&app, Method::GET, "/books?genre=science%20fiction", None).await;
        assert_eq!(count(body), 2);

        let uri = format!("/books?genre={}", poetry.id);
        let (_, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(count(body), 1);

        let (_, body) = send(&app, Method::GET, "/books?fromYear=1966&toYear=1970", None).await;
        assert_eq!(body["results"][0]["title"], "Dune Messiah");
        assert_eq!(count(body), 1);

        let (_, body) = send(&app, Method::GET, "/books?in_stock=false", None).await;
        assert_eq!(count(body), 1);

        let (_, body) = send(&app, Method::GET, "/books?genre=Westerns", None).await;
        assert_eq!(count(body), 0);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_query() {
        let repo = InMemoryCatalogRepository::default();
        let (status, body) = send(&app(repo), Method::GET, "/books?fromYear=abc&page=x", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["fromYear"].is_array());
        assert!(body["errors"]["page"].is_array());
    }

    #[tokio::test]
    async fn test_detail_projection() {
        let repo = InMemoryCatalogRepository::default();
        let genre = repo.add_genre("Fantasy").await;
        let book = repo
            .add_book("The Hobbit", Some(genre.id), 10, |f| {
                f.rating = Rating::new(4).unwrap();
                f.description = Some("There and back again".into());
                f.image = image("covers/hobbit.png");
            })
            .await;
        for i in 0..4 {
            repo.add_book(&format!("Fantasy {i}"), Some(genre.id), i, |_| {}).await;
        }
        repo.add_book("Elsewhere", None, 0, |_| {}).await;

        let uri = format!("/books/{}", book.id);
        let (status, body) = send(&app(repo), Method::GET, &uri, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rating_display"], "★★★★☆");
        assert_eq!(body["price"], "10.00");
        assert_eq!(body["price_display"], "$10.00");
        assert_eq!(body["genre"]["books_count"], 5);
        assert_eq!(body["description"], "There and back again");

        let image = &body["image"];
        assert_eq!(image["has_image"], true);
        assert_eq!(image["filename"], "hobbit.png");
        assert_eq!(image["extension"], "png");
        assert_eq!(image["url"], "/media/covers/hobbit.png");
        assert_eq!(image["absolute_url"], "http://shop.test/media/covers/hobbit.png");
        assert!(image["size_bytes"].is_null());

        let similar = body["similar_books"].as_array().unwrap();
        assert_eq!(similar.len(), 3);
        let titles: Vec<&str> = similar.iter().map(|b| b["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["Fantasy 0", "Fantasy 1", "Fantasy 2"]);
        assert!(similar.iter().all(|b| b["id"] != body["id"]));
    }

    #[tokio::test]
    async fn test_detail_without_genre_or_image() {
        let repo = InMemoryCatalogRepository::default();
        let book = repo.add_book("Loner", None, 0, |_| {}).await;

        let uri = format!("/books/{}", book.id);
        let (_, body) = send(&app(repo), Method::GET, &uri, None).await;

        assert!(body["genre"].is_null());
        assert_eq!(body["image"]["has_image"], false);
        assert!(body["image"]["url"].is_null());
        assert_eq!(body["similar_books"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_detail_unknown_or_malformed_id() {
        let repo = InMemoryCatalogRepository::default();
        let app = app(repo);

        let uri = format!("/books/{}", kernel::id::BookId::new());
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Book not found");

        let (status, _) = send(&app, Method::GET, "/books/42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_recommended_matches_similar_books() {
        let repo = InMemoryCatalogRepository::default();
        let genre = repo.add_genre("Horror").await;
        let book = repo.add_book("It", Some(genre.id), 5, |_| {}).await;
        repo.add_book("Carrie", Some(genre.id), 1, |f| {
            f.image = image("covers/carrie.jpg");
        })
        .await;

        let uri = format!("/books/{}/recommended", book.id);
        let (status, body) = send(&app(repo), Method::GET, &uri, None).await;

        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["title"], "Carrie");
        assert_eq!(list[0]["thumbnail_url"], "http://shop.test/media/covers/carrie.jpg");
    }

    #[tokio::test]
    async fn test_genres_carry_live_counts() {
        let repo = InMemoryCatalogRepository::default();
        let drama = repo.add_genre("Drama").await;
        repo.add_genre("Comedy").await;
        repo.add_book("Hamlet", Some(drama.id), 0, |_| {}).await;
        repo.add_book("Othello", Some(drama.id), 1, |_| {}).await;
        let app = app(repo.clone());

        let (_, body) = send(&app, Method::GET, "/genres", None).await;
        assert_eq!(body[0]["name"], "Comedy");
        assert_eq!(body[0]["books_count"], 0);
        assert_eq!(body[1]["name"], "Drama");
        assert_eq!(body[1]["books_count"], 2);

        repo.add_book("Macbeth", Some(drama.id), 2, |_| {}).await;
        let uri = format!("/genres/{}", drama.id);
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["books_count"], 3);

        let uri = format!("/genres/{}", kernel::id::GenreId::new());
        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[cfg(test)]
mod write_tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::support::*;
    use crate::presentation::router::{catalog_admin_router_generic, catalog_router_generic};

    fn admin(repo: InMemoryCatalogRepository) -> axum::Router {
        catalog_admin_router_generic(repo, config())
    }

    #[tokio::test]
    async fn test_create_book_truncates_price() {
        let repo = InMemoryCatalogRepository::default();
        let genre = repo.add_genre("Travel").await;

        let (status, body) = send(
            &admin(repo.clone()),
            Method::POST,
            "/books",
            Some(json!({
                "title": "On the Road",
                "author": "Jack Kerouac",
                "genre": genre.id.to_string(),
                "price": 19.999,
                "rating": 5,
                "publication_year": 1957,
                "source_url": "https://books.toscrape.com/on-the-road"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["price"], "19.99");
        assert_eq!(body["price_display"], "$19.99");
        assert_eq!(body["rating_display"], "★★★★★");
        assert_eq!(body["genre"]["books_count"], 1);
        assert_eq!(body["in_stock"], true);
        assert_eq!(body["availability"], "");

        let id = body["id"].as_str().unwrap().parse().unwrap();
        let stored = repo.book(&id).await.unwrap();
        assert_eq!(stored.price.cents(), 1999);
    }

    #[tokio::test]
    async fn test_create_book_reports_every_field() {
        let repo = InMemoryCatalogRepository::default();

        let (status, body) = send(
            &admin(repo),
            Method::POST,
            "/books",
            Some(json!({
                "price": "-3",
                "rating": 7,
                "publication_year": 999,
                "genre": "not-a-uuid",
                "source_url": "ftp://x",
                "image": "../etc/passwd"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let errors = &body["errors"];
        for field in [
            "title",
            "author",
            "price",
            "rating",
            "publication_year",
            "genre",
            "source_url",
            "image",
        ] {
            assert!(errors[field].is_array(), "missing error for {field}");
        }
        assert_eq!(errors["rating"][0], "Ensure this value is less than or equal to 5.");
    }

    #[tokio::test]
    async fn test_create_book_rejects_duplicates_and_unknown_genre() {
        let repo = InMemoryCatalogRepository::default();
        repo.add_book("Emma", None, 0, |_| {}).await;
        let app = admin(repo);

        let (status, body) = send(
            &app,
            Method::POST,
            "/books",
            Some(json!({ "title": "Emma", "author": "Some Author" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["title"].is_array());

        let missing = kernel::id::GenreId::new();
        let (status, body) = send(
            &app,
            Method::POST,
            "/books",
            Some(json!({ "title": "Persuasion", "author": "Jane Austen", "genre": missing.to_string() })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["genre"][0].as_str().unwrap().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_update_book_replaces_fields() {
        let repo = InMemoryCatalogRepository::default();
        let book = repo.add_book("Draft", None, 60, |_| {}).await;

        let uri = format!("/books/{}", book.id);
        let (status, body) = send(
            &admin(repo.clone()),
            Method::PUT,
            &uri,
            Some(json!({ "title": "Final", "author": "Someone Else", "in_stock": false })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Final");
        assert_eq!(body["price"], "0.00");
        assert_eq!(body["in_stock"], false);

        let stored = repo.book(&book.id).await.unwrap();
        assert_eq!(stored.created_at, book.created_at);
        assert!(stored.updated_at > book.updated_at);
    }

    #[tokio::test]
    async fn test_update_book_may_keep_its_own_title() {
        let repo = InMemoryCatalogRepository::default();
        let book = repo.add_book("Same", None, 0, |_| {}).await;

        let uri = format!("/books/{}", book.id);
        let (status, _) = send(
            &admin(repo),
            Method::PUT,
            &uri,
            Some(json!({ "title": "Same", "author": "Some Author", "rating": 1 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_genre_keeps_books() {
        let repo = InMemoryCatalogRepository::default();
        let genre = repo.add_genre("Mystery").await;
        let book = repo.add_book("Rebecca", Some(genre.id), 0, |_| {}).await;

        let uri = format!("/genres/{}", genre.id);
        let (status, _) = send(&admin(repo.clone()), Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let stored = repo.book(&book.id).await.unwrap();
        assert_eq!(stored.genre_id, None);

        let reader = catalog_router_generic(repo, config());
        let (_, body) = send(&reader, Method::GET, &format!("/books/{}", book.id), None).await;
        assert!(body["genre"].is_null());

        let (status, _) = send(&reader, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_unknown_book() {
        let repo = InMemoryCatalogRepository::default();
        let uri = format!("/books/{}", kernel::id::BookId::new());
        let (status, _) = send(&admin(repo), Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_genre_create_and_rename() {
        let repo = InMemoryCatalogRepository::default();
        let app = admin(repo.clone());

        let (status, body) = send(
            &app,
            Method::POST,
            "/genres",
            Some(json!({ "name": "History", "description": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["books_count"], 0);
        assert!(body["description"].is_null());

        let (status, body) = send(&app, Method::POST, "/genres", Some(json!({ "name": "history" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["name"].is_array());

        let (status, body) = send(&app, Method::POST, "/genres", Some(json!({ "name": "x".repeat(101) }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["errors"]["name"][0],
            "Ensure this field has no more than 100 characters."
        );

        let id = body_id(&send(&app, Method::POST, "/genres", Some(json!({ "name": "Art" }))).await.1);
        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/genres/{id}"),
            Some(json!({ "name": "ART", "description": "Painting" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "ART");
        assert_eq!(body["description"], "Painting");
    }

    fn body_id(body: &serde_json::Value) -> String {
        body["id"].as_str().unwrap().to_string()
    }
}

#[cfg(test)]
mod scraping_tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::support::*;
    use crate::domain::entities::{RunCounts, ScrapingLog};
    use crate::domain::value_objects::ScrapingStatus;
    use crate::presentation::router::{catalog_admin_router_generic, catalog_router_generic};

    #[tokio::test]
    async fn test_run_lifecycle_over_http() {
        let repo = InMemoryCatalogRepository::default();
        let admin = catalog_admin_router_generic(repo.clone(), config());

        let (status, body) = send(&admin, Method::POST, "/logs", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "running");
        assert!(body["duration"].is_null());
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &admin,
            Method::PUT,
            &format!("/logs/{id}/progress"),
            Some(json!({ "total_books_found": 40, "books_created": 12 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_books_found"], 40);
        assert_eq!(body["books_updated"], 0);

        let (status, body) = send(
            &admin,
            Method::POST,
            &format!("/logs/{id}/finish"),
            Some(json!({ "status": "completed", "books_updated": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["books_created"], 12);
        assert_eq!(body["books_updated"], 3);
        assert!(body["duration"].as_str().unwrap().starts_with("0:00:0"));

        let (status, _) = send(
            &admin,
            Method::POST,
            &format!("/logs/{id}/finish"),
            Some(json!({ "status": "failed" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &admin,
            Method::PUT,
            &format!("/logs/{id}/progress"),
            Some(json!({ "errors_count": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_finish_validation() {
        let repo = InMemoryCatalogRepository::default();
        let run = ScrapingLog::start(at(0));
        repo.add_run(run.clone()).await;
        let admin = catalog_admin_router_generic(repo, config());
        let uri = format!("/logs/{}/finish", run.id);

        let (status, body) = send(&admin, Method::POST, &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"]["status"][0], "This field is required.");

        let (status, body) = send(&admin, Method::POST, &uri, Some(json!({ "status": "running" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["status"].is_array());

        let (status, body) = send(
            &admin,
            Method::POST,
            &uri,
            Some(json!({ "status": "failed", "errors_count": -1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["errors_count"].is_array());

        let missing = format!("/logs/{}/finish", kernel::id::ScrapingLogId::new());
        let (status, _) = send(&admin, Method::POST, &missing, Some(json!({ "status": "failed" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logs_listing_with_durations() {
        let repo = InMemoryCatalogRepository::default();

        let mut finished = ScrapingLog::start(at(0));
        finished
            .finish(
                ScrapingStatus::Interrupted,
                Some(RunCounts {
                    total_books_found: 7,
                    ..RunCounts::default()
                }),
                Some("SIGTERM".into()),
                at(90),
            )
            .unwrap();
        repo.add_run(finished.clone()).await;

        let mut long = ScrapingLog::start(at(100));
        long.finish(ScrapingStatus::Completed, None, None, at(100 + 86_400 + 3_725))
            .unwrap();
        repo.add_run(long).await;

        repo.add_run(ScrapingLog::start(at(200_000))).await;

        let reader = catalog_router_generic(repo, config());
        let (status, body) = send(&reader, Method::GET, "/logs", None).await;

        assert_eq!(status, StatusCode::OK);
        let runs = body.as_array().unwrap();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0]["status"], "running");
        assert!(runs[0]["duration"].is_null());
        assert_eq!(runs[1]["duration"], "1 day, 1:02:05");
        assert_eq!(runs[2]["duration"], "0:01:30");
        assert_eq!(runs[2]["status"], "interrupted");
        assert_eq!(runs[2]["error_message"], "SIGTERM");
        assert_eq!(runs[2]["total_books_found"], 7);

        let (status, body) = send(&reader, Method::GET, &format!("/logs/{}", finished.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["duration"], "0:01:30");
    }
}

#[cfg(test)]
mod favorites_tests {
    use axum::Extension;
    use axum::http::{Method, StatusCode};
    use kernel::id::{BookId, UserId};

    use super::support::*;
    use crate::presentation::router::{catalog_admin_router_generic, favorites_router_generic};

    /// Favorites as seen by `user`, with the guard's extension in place
    fn shelf(repo: &InMemoryCatalogRepository, user: UserId) -> axum::Router {
        favorites_router_generic(repo.clone(), config()).layer(Extension(user))
    }

    fn titles(body: &serde_json::Value) -> Vec<&str> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|b| b["title"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_add_list_remove() {
        let repo = InMemoryCatalogRepository::default();
        let genre = repo.add_genre("Mystery").await;
        let first = repo.add_book("Rebecca", Some(genre.id), 0, |_| {}).await;
        let second = repo.add_book("Gaudy Night", None, 1, |_| {}).await;
        let app = shelf(&repo, UserId::new());

        let (status, body) = send(&app, Method::POST, &format!("/favorites/{}", first.id), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["title"], "Rebecca");
        assert_eq!(body["genre"]["name"], "Mystery");

        // Adding again is idempotent
        let (status, _) = send(&app, Method::POST, &format!("/favorites/{}", first.id), None).await;
        assert_eq!(status, StatusCode::OK);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        send(&app, Method::POST, &format!("/favorites/{}", second.id), None).await;

        let (status, body) = send(&app, Method::GET, "/favorites", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(titles(&body), vec!["Gaudy Night", "Rebecca"]);
        assert_eq!(body[1]["genre"]["books_count"], 1);

        let uri = format!("/favorites/{}", first.id);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Book is not in favorites");

        let (_, body) = send(&app, Method::GET, "/favorites", None).await;
        assert_eq!(titles(&body), vec!["Gaudy Night"]);
    }

    #[tokio::test]
    async fn test_favorites_are_per_user() {
        let repo = InMemoryCatalogRepository::default();
        let book = repo.add_book("Middlemarch", None, 0, |_| {}).await;
        let alice = shelf(&repo, UserId::new());
        let bob = shelf(&repo, UserId::new());

        send(&alice, Method::POST, &format!("/favorites/{}", book.id), None).await;

        let (_, body) = send(&bob, Method::GET, "/favorites", None).await;
        assert!(body.as_array().unwrap().is_empty());

        let (status, _) = send(&bob, Method::DELETE, &format!("/favorites/{}", book.id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&alice, Method::GET, "/favorites", None).await;
        assert_eq!(titles(&body), vec!["Middlemarch"]);
    }

    #[tokio::test]
    async fn test_unknown_books() {
        let repo = InMemoryCatalogRepository::default();
        let app = shelf(&repo, UserId::new());

        let uri = format!("/favorites/{}", BookId::new());
        let (status, body) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Book not found");

        let (status, _) = send(&app, Method::POST, "/favorites/not-a-book", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_deleted_book_leaves_favorites() {
        let repo = InMemoryCatalogRepository::default();
        let book = repo.add_book("Ulysses", None, 0, |_| {}).await;
        let app = shelf(&repo, UserId::new());
        send(&app, Method::POST, &format!("/favorites/{}", book.id), None).await;

        let admin = catalog_admin_router_generic(repo.clone(), config());
        let (status, _) = send(&admin, Method::DELETE, &format!("/books/{}", book.id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&app, Method::GET, "/favorites", None).await;
        assert!(body.as_array().unwrap().is_empty());
    }
}
