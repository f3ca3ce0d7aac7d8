//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::error::conversions::is_unique_violation;
use kernel::id::{BookId, GenreId, ScrapingLogId, UserId};
use kernel::pagination::PageRequest;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::entities::{Book, Genre, GenreWithCount, RunCounts, ScrapingLog};
use crate::domain::repository::{
    BookFilter, BookRepository, FavoriteRepository, GenreFilter, GenreRepository,
    ScrapingLogRepository,
};
use crate::domain::value_objects::{
    MediaPath, Price, PublicationYear, Rating, ScrapingStatus, SourceUrl,
};
use crate::error::{CatalogError, CatalogResult};

const GENRE_WITH_COUNT: &str = r#"
    SELECT
        g.genre_id,
        g.name,
        g.description,
        g.created_at,
        COUNT(b.book_id) AS books_count
    FROM genres g
    LEFT JOIN books b ON b.genre_id = g.genre_id
"#;

const BOOK_COLUMNS: &str = r#"
    b.book_id,
    b.title,
    b.author,
    b.isbn,
    b.genre_id,
    b.description,
    b.publication_year,
    b.price_cents,
    b.rating,
    b.in_stock,
    b.availability,
    b.source_url,
    b.image_path,
    b.last_scraped,
    b.created_at,
    b.updated_at
"#;

const RUN_COLUMNS: &str = r#"
    log_id,
    started_at,
    finished_at,
    total_books_found,
    books_created,
    books_updated,
    errors_count,
    status,
    error_message
"#;

/// PostgreSQL-backed catalog repository
#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards escaped
fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_book_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    qb.push(" WHERE TRUE");

    if let Some(title) = &filter.title {
        qb.push(" AND b.title ILIKE ").push_bind(contains_pattern(title));
    }
    if let Some(author) = &filter.author {
        qb.push(" AND b.author ILIKE ").push_bind(contains_pattern(author));
    }
    match &filter.genre {
        Some(GenreFilter::Id(id)) => {
            qb.push(" AND b.genre_id = ").push_bind(*id.as_uuid());
        }
        Some(GenreFilter::Name(name)) => {
            qb.push(" AND b.genre_id IN (SELECT genre_id FROM genres WHERE LOWER(name) = LOWER(")
                .push_bind(name.clone())
                .push("))");
        }
        None => {}
    }
    if let Some(from) = filter.from_year {
        qb.push(" AND b.publication_year >= ").push_bind(from);
    }
    if let Some(to) = filter.to_year {
        qb.push(" AND b.publication_year <= ").push_bind(to);
    }
    if let Some(in_stock) = filter.in_stock {
        qb.push(" AND b.in_stock = ").push_bind(in_stock);
    }
}

// ============================================================================
// Genre Repository Implementation
// ============================================================================

impl GenreRepository for PgCatalogRepository {
    async fn list_genres(&self) -> CatalogResult<Vec<GenreWithCount>> {
        let sql = format!("{GENRE_WITH_COUNT} GROUP BY g.genre_id ORDER BY g.name");
        let rows = sqlx::query_as::<_, GenreRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(GenreRow::into_entity).collect())
    }

    async fn find_genre(&self, id: &GenreId) -> CatalogResult<Option<GenreWithCount>> {
        let sql = format!("{GENRE_WITH_COUNT} WHERE g.genre_id = $1 GROUP BY g.genre_id");
        let row = sqlx::query_as::<_, GenreRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(GenreRow::into_entity))
    }

    async fn genre_summaries(&self, ids: &[GenreId]) -> CatalogResult<Vec<GenreWithCount>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let sql = format!("{GENRE_WITH_COUNT} WHERE g.genre_id = ANY($1) GROUP BY g.genre_id");
        let rows = sqlx::query_as::<_, GenreRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(GenreRow::into_entity).collect())
    }

    async fn genre_name_taken(&self, name: &str, except: Option<&GenreId>) -> CatalogResult<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM genres
                WHERE LOWER(name) = LOWER($1)
                  AND ($2::uuid IS NULL OR genre_id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(except.map(|id| *id.as_uuid()))
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn create_genre(&self, genre: &Genre) -> CatalogResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO genres (genre_id, name, description, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(genre.id.as_uuid())
        .bind(&genre.name)
        .bind(genre.description.as_deref())
        .bind(genre.created_at)
        .execute(&self.pool)
        .await;

        map_genre_write(result)
    }

    async fn update_genre(&self, genre: &Genre) -> CatalogResult<()> {
        let result = sqlx::query("UPDATE genres SET name = $2, description = $3 WHERE genre_id = $1")
            .bind(genre.id.as_uuid())
            .bind(&genre.name)
            .bind(genre.description.as_deref())
            .execute(&self.pool)
            .await;

        map_genre_write(result)
    }

    async fn delete_genre(&self, id: &GenreId) -> CatalogResult<bool> {
        // books.genre_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM genres WHERE genre_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn map_genre_write(result: Result<sqlx::postgres::PgQueryResult, sqlx::Error>) -> CatalogResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(CatalogError::Conflict(
            "A genre with this name already exists".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Book Repository Implementation
// ============================================================================

impl BookRepository for PgCatalogRepository {
    async fn search_books(
        &self,
        filter: &BookFilter,
        page: PageRequest,
    ) -> CatalogResult<(Vec<Book>, u64)> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books b");
        push_book_filters(&mut count_query, filter);
        let count = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut page_query = QueryBuilder::<Postgres>::new(format!("SELECT {BOOK_COLUMNS} FROM books b"));
        push_book_filters(&mut page_query, filter);
        page_query
            .push(" ORDER BY b.created_at DESC, b.book_id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = page_query
            .build_query_as::<BookRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((
            rows.into_iter().map(BookRow::into_entity).collect(),
            count.max(0) as u64,
        ))
    }

    async fn find_book(&self, id: &BookId) -> CatalogResult<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books b WHERE b.book_id = $1");
        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(BookRow::into_entity))
    }

    async fn similar_books(
        &self,
        genre: &GenreId,
        exclude: &BookId,
        limit: u32,
    ) -> CatalogResult<Vec<Book>> {
        let sql = format!(
            r#"
            SELECT {BOOK_COLUMNS} FROM books b
            WHERE b.genre_id = $1 AND b.book_id <> $2
            ORDER BY b.created_at DESC, b.book_id
            LIMIT $3
            "#
        );
        let rows = sqlx::query_as::<_, BookRow>(&sql)
            .bind(genre.as_uuid())
            .bind(exclude.as_uuid())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(BookRow::into_entity).collect())
    }

    async fn book_exists(
        &self,
        title: &str,
        author: &str,
        except: Option<&BookId>,
    ) -> CatalogResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM books
                WHERE title = $1 AND author = $2
                  AND ($3::uuid IS NULL OR book_id <> $3)
            )
            "#,
        )
        .bind(title)
        .bind(author)
        .bind(except.map(|id| *id.as_uuid()))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_book(&self, book: &Book) -> CatalogResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO books (
                book_id,
                title,
                author,
                isbn,
                genre_id,
                description,
                publication_year,
                price_cents,
                rating,
                in_stock,
                availability,
                source_url,
                image_path,
                last_scraped,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(book.id.as_uuid())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.isbn.as_deref())
        .bind(book.genre_id.map(|id| *id.as_uuid()))
        .bind(book.description.as_deref())
        .bind(book.publication_year.map(|y| y.value()))
        .bind(book.price.cents())
        .bind(i32::from(book.rating.value()))
        .bind(book.in_stock)
        .bind(&book.availability)
        .bind(book.source_url.as_ref().map(SourceUrl::as_str))
        .bind(book.image.as_ref().map(MediaPath::as_str))
        .bind(book.last_scraped)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await;

        map_book_write(result)
    }

    async fn update_book(&self, book: &Book) -> CatalogResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books SET
                title = $2,
                author = $3,
                isbn = $4,
                genre_id = $5,
                description = $6,
                publication_year = $7,
                price_cents = $8,
                rating = $9,
                in_stock = $10,
                availability = $11,
                source_url = $12,
                image_path = $13,
                last_scraped = $14,
                updated_at = $15
            WHERE book_id = $1
            "#,
        )
        .bind(book.id.as_uuid())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.isbn.as_deref())
        .bind(book.genre_id.map(|id| *id.as_uuid()))
        .bind(book.description.as_deref())
        .bind(book.publication_year.map(|y| y.value()))
        .bind(book.price.cents())
        .bind(i32::from(book.rating.value()))
        .bind(book.in_stock)
        .bind(&book.availability)
        .bind(book.source_url.as_ref().map(SourceUrl::as_str))
        .bind(book.image.as_ref().map(MediaPath::as_str))
        .bind(book.last_scraped)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await;

        map_book_write(result)
    }

    async fn delete_book(&self, id: &BookId) -> CatalogResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE book_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn map_book_write(result: Result<sqlx::postgres::PgQueryResult, sqlx::Error>) -> CatalogResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(CatalogError::Conflict(
            "A book with this title and author already exists".to_string(),
        )),
        Err(e) if is_foreign_key_violation(&e) => Err(CatalogError::Conflict(
            "The selected genre no longer exists".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

// ============================================================================
// ScrapingLog Repository Implementation
// ============================================================================

impl ScrapingLogRepository for PgCatalogRepository {
    async fn list_runs(&self) -> CatalogResult<Vec<ScrapingLog>> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM scraping_logs ORDER BY started_at DESC");
        let rows = sqlx::query_as::<_, RunRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(RunRow::into_entity).collect()
    }

    async fn find_run(&self, id: &ScrapingLogId) -> CatalogResult<Option<ScrapingLog>> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM scraping_logs WHERE log_id = $1");
        let row = sqlx::query_as::<_, RunRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(RunRow::into_entity).transpose()
    }

    async fn create_run(&self, log: &ScrapingLog) -> CatalogResult<()> {
        sqlx::query(
            r#"
            INSERT INTO scraping_logs (
                log_id,
                started_at,
                finished_at,
                total_books_found,
                books_created,
                books_updated,
                errors_count,
                status,
                error_message
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(log.id.as_uuid())
        .bind(log.started_at)
        .bind(log.finished_at)
        .bind(count_to_db(log.counts.total_books_found))
        .bind(count_to_db(log.counts.books_created))
        .bind(count_to_db(log.counts.books_updated))
        .bind(count_to_db(log.counts.errors_count))
        .bind(log.status.as_str())
        .bind(log.error_message.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_run(&self, log: &ScrapingLog) -> CatalogResult<()> {
        sqlx::query(
            r#"
            UPDATE scraping_logs SET
                finished_at = $2,
                total_books_found = $3,
                books_created = $4,
                books_updated = $5,
                errors_count = $6,
                status = $7,
                error_message = $8
            WHERE log_id = $1
            "#,
        )
        .bind(log.id.as_uuid())
        .bind(log.finished_at)
        .bind(count_to_db(log.counts.total_books_found))
        .bind(count_to_db(log.counts.books_created))
        .bind(count_to_db(log.counts.books_updated))
        .bind(count_to_db(log.counts.errors_count))
        .bind(log.status.as_str())
        .bind(log.error_message.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn count_to_db(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

fn count_from_db(count: i32) -> u32 {
    u32::try_from(count).unwrap_or(0)
}

// ============================================================================
// Favorite Repository Implementation
// ============================================================================

impl FavoriteRepository for PgCatalogRepository {
    async fn list_favorites(&self, user: &UserId) -> CatalogResult<Vec<Book>> {
        let sql = format!(
            r#"
            SELECT {BOOK_COLUMNS} FROM favorites f
            JOIN books b ON b.book_id = f.book_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC, b.book_id
            "#
        );
        let rows = sqlx::query_as::<_, BookRow>(&sql)
            .bind(user.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(BookRow::into_entity).collect())
    }

    async fn add_favorite(
        &self,
        user: &UserId,
        book: &BookId,
        at: DateTime<Utc>,
    ) -> CatalogResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, book_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, book_id) DO NOTHING
            "#,
        )
        .bind(user.as_uuid())
        .bind(book.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            // Book deleted since it was looked up
            Err(e) if is_foreign_key_violation(&e) => Err(CatalogError::BookNotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_favorite(&self, user: &UserId, book: &BookId) -> CatalogResult<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND book_id = $2")
            .bind(user.as_uuid())
            .bind(book.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct GenreRow {
    genre_id: Uuid,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    books_count: i64,
}

impl GenreRow {
    fn into_entity(self) -> GenreWithCount {
        GenreWithCount {
            genre: Genre {
                id: GenreId::from_uuid(self.genre_id),
                name: self.name,
                description: self.description,
                created_at: self.created_at,
            },
            books_count: self.books_count.max(0) as u64,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookRow {
    book_id: Uuid,
    title: String,
    author: String,
    isbn: Option<String>,
    genre_id: Option<Uuid>,
    description: Option<String>,
    publication_year: Option<i32>,
    price_cents: i64,
    rating: i32,
    in_stock: bool,
    availability: String,
    source_url: Option<String>,
    image_path: Option<String>,
    last_scraped: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookRow {
    fn into_entity(self) -> Book {
        Book {
            id: BookId::from_uuid(self.book_id),
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            genre_id: self.genre_id.map(GenreId::from_uuid),
            description: self.description,
            publication_year: self.publication_year.map(PublicationYear::from_db),
            price: Price::from_cents(self.price_cents).unwrap_or_default(),
            rating: Rating::from_db(self.rating),
            in_stock: self.in_stock,
            availability: self.availability,
            source_url: self.source_url.map(SourceUrl::from_db),
            image: self.image_path.map(MediaPath::from_db),
            last_scraped: self.last_scraped,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RunRow {
    log_id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    total_books_found: i32,
    books_created: i32,
    books_updated: i32,
    errors_count: i32,
    status: String,
    error_message: Option<String>,
}

impl RunRow {
    fn into_entity(self) -> CatalogResult<ScrapingLog> {
        let status: ScrapingStatus = self
            .status
            .parse()
            .map_err(|e| CatalogError::Internal(format!("Invalid scraping status: {}", e)))?;

        Ok(ScrapingLog {
            id: ScrapingLogId::from_uuid(self.log_id),
            started_at: self.started_at,
            finished_at: self.finished_at,
            counts: RunCounts {
                total_books_found: count_from_db(self.total_books_found),
                books_created: count_from_db(self.books_created),
                books_updated: count_from_db(self.books_updated),
                errors_count: count_from_db(self.errors_count),
            },
            status,
            error_message: self.error_message,
        })
    }
}
