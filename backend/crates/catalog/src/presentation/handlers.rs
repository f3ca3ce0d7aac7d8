//! HTTP Handlers

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use kernel::id::{BookId, GenreId, Id, ScrapingLogId, UserId};
use kernel::pagination::Page;
use std::sync::Arc;

use crate::application::browse_books::genre_of;
use crate::application::{
    AddFavoriteUseCase, BookDetailOutput, BookDetailUseCase, CatalogConfig, CreateBookUseCase, CreateGenreUseCase,
    DeleteBookUseCase, DeleteGenreUseCase, FinishScrapingRunUseCase, GetGenreUseCase,
    GetScrapingRunUseCase, ListBooksOutput, ListBooksUseCase, ListFavoritesUseCase,
    ListGenresUseCase, ListScrapingRunsUseCase, RecommendedBooksUseCase, RecordRunProgressUseCase,
    RemoveFavoriteUseCase, StartScrapingRunUseCase,
    UpdateBookUseCase, UpdateGenreUseCase,
};
use crate::domain::repository::CatalogRepository;
use crate::error::{CatalogError, CatalogResult};
use crate::infra::media::MediaStorage;
use crate::presentation::dto::{
    BookQuery, BookRequest, FinishRunRequest, GenreRequest, RunCountsRequest,
};
use crate::presentation::projection::{
    BookDetail, BookListItem, GenreView, ImageInfo, MediaLinks, ScrapingLogView, SimilarBook,
};

/// Shared state for catalog handlers
#[derive(Clone)]
pub struct CatalogAppState<R>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub media: Arc<MediaStorage>,
    pub config: Arc<CatalogConfig>,
}

impl<R> CatalogAppState<R>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    pub fn new(repo: R, config: CatalogConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            media: Arc::new(MediaStorage::new(config.media_root.clone())),
            config: Arc::new(config),
        }
    }

    async fn render_detail(&self, output: BookDetailOutput, headers: &HeaderMap) -> BookDetail {
        let links = MediaLinks::from_headers(&self.config, headers);
        let image = match &output.book.image {
            Some(path) => ImageInfo::build(path, self.media.file_size(path).await, &links),
            None => ImageInfo::none(),
        };
        BookDetail::build(
            &output.book,
            output.genre.as_ref(),
            image,
            &output.similar,
            &links,
        )
    }
}

/// Unparseable ids can't name anything, so they are plain 404s
fn parse_id<T>(raw: &str, not_found: CatalogError) -> CatalogResult<Id<T>> {
    raw.parse().map_err(|_| not_found)
}

// ============================================================================
// Books
// ============================================================================

/// GET /scraping/books
pub async fn list_books<R>(
    State(state): State<CatalogAppState<R>>,
    headers: HeaderMap,
    Query(query): Query<BookQuery>,
) -> CatalogResult<Json<Page<BookListItem>>>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let listing = query.parse()?;

    let use_case = ListBooksUseCase::new(state.repo.clone(), state.config.clone());
    let output = use_case
        .execute(listing.filter, listing.page, listing.page_size)
        .await?;

    let links = MediaLinks::from_headers(&state.config, &headers);
    let ListBooksOutput { books, genres } = output;

    Ok(Json(books.map(|book| {
        BookListItem::build(&book, genre_of(&genres, &book), &links)
    })))
}

/// GET /scraping/books/{id}
pub async fn book_detail<R>(
    State(state): State<CatalogAppState<R>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> CatalogResult<Json<BookDetail>>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let id: BookId = parse_id(&id, CatalogError::BookNotFound)?;

    let use_case = BookDetailUseCase::new(state.repo.clone(), state.config.clone());
    let output = use_case.execute(&id).await?;

    Ok(Json(state.render_detail(output, &headers).await))
}

/// GET /scraping/books/{id}/recommended
pub async fn recommended_books<R>(
    State(state): State<CatalogAppState<R>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> CatalogResult<Json<Vec<SimilarBook>>>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let id: BookId = parse_id(&id, CatalogError::BookNotFound)?;

    let use_case = RecommendedBooksUseCase::new(state.repo.clone(), state.config.clone());
    let books = use_case.execute(&id).await?;

    let links = MediaLinks::from_headers(&state.config, &headers);
    Ok(Json(
        books.iter().map(|b| SimilarBook::build(b, &links)).collect(),
    ))
}

/// POST /scraping/admin/books
pub async fn create_book<R>(
    State(state): State<CatalogAppState<R>>,
    headers: HeaderMap,
    Json(req): Json<BookRequest>,
) -> CatalogResult<(StatusCode, Json<BookDetail>)>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let book = CreateBookUseCase::new(state.repo.clone())
        .execute(req.into())
        .await?;

    let output = BookDetailUseCase::new(state.repo.clone(), state.config.clone())
        .execute(&book.id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(state.render_detail(output, &headers).await),
    ))
}

/// PUT /scraping/admin/books/{id}
pub async fn update_book<R>(
    State(state): State<CatalogAppState<R>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<BookRequest>,
) -> CatalogResult<Json<BookDetail>>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let id: BookId = parse_id(&id, CatalogError::BookNotFound)?;

    UpdateBookUseCase::new(state.repo.clone())
        .execute(&id, req.into())
        .await?;

    let output = BookDetailUseCase::new(state.repo.clone(), state.config.clone())
        .execute(&id)
        .await?;

    Ok(Json(state.render_detail(output, &headers).await))
}

/// DELETE /scraping/admin/books/{id}
pub async fn delete_book<R>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<String>,
) -> CatalogResult<StatusCode>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let id: BookId = parse_id(&id, CatalogError::BookNotFound)?;
    DeleteBookUseCase::new(state.repo.clone()).execute(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Genres
// ============================================================================

/// GET /scraping/genres
pub async fn list_genres<R>(
    State(state): State<CatalogAppState<R>>,
) -> CatalogResult<Json<Vec<GenreView>>>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let genres = ListGenresUseCase::new(state.repo.clone()).execute().await?;
    Ok(Json(genres.iter().map(GenreView::from).collect()))
}

/// GET /scraping/genres/{id}
pub async fn genre_detail<R>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<String>,
) -> CatalogResult<Json<GenreView>>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let id: GenreId = parse_id(&id, CatalogError::GenreNotFound)?;
    let genre = GetGenreUseCase::new(state.repo.clone()).execute(&id).await?;
    Ok(Json(GenreView::from(&genre)))
}

/// POST /scraping/admin/genres
pub async fn create_genre<R>(
    State(state): State<CatalogAppState<R>>,
    Json(req): Json<GenreRequest>,
) -> CatalogResult<(StatusCode, Json<GenreView>)>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let genre = CreateGenreUseCase::new(state.repo.clone())
        .execute(req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(GenreView::from(&genre))))
}

/// PUT /scraping/admin/genres/{id}
pub async fn update_genre<R>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<String>,
    Json(req): Json<GenreRequest>,
) -> CatalogResult<Json<GenreView>>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let id: GenreId = parse_id(&id, CatalogError::GenreNotFound)?;
    let genre = UpdateGenreUseCase::new(state.repo.clone())
        .execute(&id, req.into())
        .await?;
    Ok(Json(GenreView::from(&genre)))
}

/// DELETE /scraping/admin/genres/{id}
pub async fn delete_genre<R>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<String>,
) -> CatalogResult<StatusCode>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let id: GenreId = parse_id(&id, CatalogError::GenreNotFound)?;
    DeleteGenreUseCase::new(state.repo.clone()).execute(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Scraping logs
// ============================================================================

/// GET /scraping/logs
pub async fn list_scraping_logs<R>(
    State(state): State<CatalogAppState<R>>,
) -> CatalogResult<Json<Vec<ScrapingLogView>>>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let runs = ListScrapingRunsUseCase::new(state.repo.clone())
        .execute()
        .await?;
    Ok(Json(runs.iter().map(ScrapingLogView::from).collect()))
}

/// GET /scraping/logs/{id}
pub async fn scraping_log_detail<R>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<String>,
) -> CatalogResult<Json<ScrapingLogView>>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let id: ScrapingLogId = parse_id(&id, CatalogError::ScrapingLogNotFound)?;
    let run = GetScrapingRunUseCase::new(state.repo.clone())
        .execute(&id)
        .await?;
    Ok(Json(ScrapingLogView::from(&run)))
}

/// POST /scraping/admin/logs
pub async fn start_scraping_run<R>(
    State(state): State<CatalogAppState<R>>,
) -> CatalogResult<(StatusCode, Json<ScrapingLogView>)>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let run = StartScrapingRunUseCase::new(state.repo.clone())
        .execute()
        .await?;
    Ok((StatusCode::CREATED, Json(ScrapingLogView::from(&run))))
}

/// PUT /scraping/admin/logs/{id}/progress
pub async fn record_scraping_progress<R>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<String>,
    Json(req): Json<RunCountsRequest>,
) -> CatalogResult<Json<ScrapingLogView>>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let id: ScrapingLogId = parse_id(&id, CatalogError::ScrapingLogNotFound)?;
    let run = RecordRunProgressUseCase::new(state.repo.clone())
        .execute(&id, req.into())
        .await?;
    Ok(Json(ScrapingLogView::from(&run)))
}

/// POST /scraping/admin/logs/{id}/finish
pub async fn finish_scraping_run<R>(
    State(state): State<CatalogAppState<R>>,
    Path(id): Path<String>,
    Json(req): Json<FinishRunRequest>,
) -> CatalogResult<Json<ScrapingLogView>>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let id: ScrapingLogId = parse_id(&id, CatalogError::ScrapingLogNotFound)?;
    let run = FinishScrapingRunUseCase::new(state.repo.clone())
        .execute(&id, req.into())
        .await?;
    Ok(Json(ScrapingLogView::from(&run)))
}

// ============================================================================
// Favorites (behind a guard that puts the caller's UserId in extensions)
// ============================================================================

/// GET /api/favorites
pub async fn list_favorites<R>(
    State(state): State<CatalogAppState<R>>,
    Extension(user): Extension<UserId>,
    headers: HeaderMap,
) -> CatalogResult<Json<Vec<BookListItem>>>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let use_case = ListFavoritesUseCase::new(state.repo.clone());
    let output = use_case.execute(&user).await?;

    let links = MediaLinks::from_headers(&state.config, &headers);
    Ok(Json(
        output
            .books
            .iter()
            .map(|book| BookListItem::build(book, output.genre_of(book), &links))
            .collect(),
    ))
}

/// POST /api/favorites/{id}
///
/// 201 when newly added, 200 when it already was a favorite.
pub async fn add_favorite<R>(
    State(state): State<CatalogAppState<R>>,
    Extension(user): Extension<UserId>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> CatalogResult<(StatusCode, Json<BookListItem>)>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let id: BookId = parse_id(&id, CatalogError::BookNotFound)?;

    let use_case = AddFavoriteUseCase::new(state.repo.clone());
    let output = use_case.execute(&user, &id).await?;

    let links = MediaLinks::from_headers(&state.config, &headers);
    let status = if output.added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(BookListItem::build(&output.book, output.genre.as_ref(), &links)),
    ))
}

/// DELETE /api/favorites/{id}
pub async fn remove_favorite<R>(
    State(state): State<CatalogAppState<R>>,
    Extension(user): Extension<UserId>,
    Path(id): Path<String>,
) -> CatalogResult<StatusCode>
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let id: BookId = parse_id(&id, CatalogError::FavoriteNotFound)?;

    let use_case = RemoveFavoriteUseCase::new(state.repo.clone());
    use_case.execute(&user, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}
