#[cfg(any(test, feature = "test-utils"))]
#[cfg(not(tarpaulin_include))]
pub mod tests {
    use async_trait::async_trait;
    use chrono::{Datelike, NaiveDate};
    use std::{
        any::Any,
        collections::{HashMap, HashSet},
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        },
        time::Duration,
    };
    use uuid::Uuid;

    use moviebase_types::{
        Result,
        errors::{ApplicationError, DbError},
        movie::{Movie, MovieId, MovieInfo},
        review::{Review, ReviewId, ReviewInfo},
        review_like::ReviewLike,
        user::{RegistrationData, User, UserId},
        user_movie::{ListType, MovieUserInfo, UserMovie, UserMovieId},
    };

    use crate::{
        app::{App, Repositories},
        jwt::JwtTokenService,
        repository::{
            MovieRepository, REVIEWS_PAGE_LIMIT, ReviewLikeRepository, ReviewRepository,
            UserMovieRepository, UserRepository,
        },
        tx::{SharedTransaction, Transaction, TransactionManager, TransactionSource, TxContext},
    };

    /// Full content of the in-memory database.
    #[derive(Debug, Default, Clone)]
    pub struct Tables {
        pub movies: HashMap<MovieId, Movie>,
        pub users: HashMap<UserId, User>,
        pub user_movies: HashMap<UserMovieId, UserMovie>,
        pub reviews: HashMap<ReviewId, Review>,
        pub review_likes: HashSet<ReviewLike>,
    }

    impl Tables {
        fn average_rating(&self, movie_id: MovieId) -> f64 {
            let ratings: Vec<i32> = self
                .user_movies
                .values()
                .filter(|um| um.movie_id == movie_id && um.user_rating() != 0)
                .map(|um| um.user_rating())
                .collect();
            if ratings.is_empty() {
                return 0.0;
            }
            ratings.iter().sum::<i32>() as f64 / ratings.len() as f64
        }

        fn with_rating(&self, movie: &Movie) -> Movie {
            Movie {
                rating: self.average_rating(movie.id),
                ..movie.clone()
            }
        }

        fn find_movie(&self, info: &MovieInfo) -> Result<&Movie> {
            let date = info.release_date()?;
            self.movies
                .values()
                .find(|m| m.title == info.lookup_title() && m.release_date == date)
                .ok_or_else(|| DbError::MovieNotFound(info.title.clone()).into())
        }

        fn user_movie(&self, user_id: UserId, movie_id: MovieId) -> Option<&UserMovie> {
            self.user_movies
                .values()
                .find(|um| um.user_id == user_id && um.movie_id == movie_id)
        }

        fn movie_user_info(&self, user_id: UserId, movie: &Movie) -> (ListType, MovieUserInfo) {
            let row = self.user_movie(user_id, movie.id);
            let list_type = row.map(UserMovie::list_type).unwrap_or_default();
            let info = MovieUserInfo {
                title: movie.title.clone(),
                description: movie.description.clone(),
                release_date: movie.release_date,
                director: movie.director.clone(),
                actors: movie.actors.clone(),
                genres: movie.genres.clone(),
                rating: self.average_rating(movie.id),
                list_type,
                user_rating: row.map(UserMovie::user_rating).unwrap_or(0),
            };
            (list_type, info)
        }

        fn review_infos(&self, movie_id: MovieId, viewer: Option<UserId>) -> Vec<ReviewInfo> {
            let mut infos: Vec<ReviewInfo> = self
                .reviews
                .values()
                .filter(|r| r.movie_id == movie_id)
                .filter_map(|r| {
                    let id = r.id()?;
                    let likes = self.review_likes.iter().filter(|l| l.review_id == id).count();
                    let date = r.writing_date();
                    Some(ReviewInfo {
                        id,
                        username: self
                            .users
                            .get(&r.user_id)
                            .map(|u| u.username.clone())
                            .unwrap_or_default(),
                        text: r.text().to_string(),
                        review_year: date.year(),
                        review_month: date.month(),
                        review_day: date.day(),
                        user_rating: self
                            .user_movie(r.user_id, movie_id)
                            .map(UserMovie::user_rating)
                            .unwrap_or(0),
                        is_liked: viewer.is_some_and(|user_id| {
                            self.review_likes.contains(&ReviewLike::new(user_id, id))
                        }),
                        likes: likes as i64,
                    })
                })
                .collect();
            infos.sort_by(|a, b| b.likes.cmp(&a.likes).then_with(|| a.username.cmp(&b.username)));
            infos.truncate(REVIEWS_PAGE_LIMIT as usize);
            infos
        }
    }

    #[derive(Default)]
    struct Counters {
        next_id: AtomicU64,
        begins: AtomicUsize,
        commits: AtomicUsize,
        rollbacks: AtomicUsize,
        aborts: AtomicUsize,
        fail_next_commit: AtomicBool,
        fail_rollbacks: AtomicBool,
        begin_delay_ms: AtomicU64,
    }

    /// Transaction source over a shared in-memory database.
    ///
    /// Each transaction works on its own copy of the tables and publishes it
    /// on commit. Counts every begin, commit, rollback and abort, and can be
    /// told to fail commits or rollbacks.
    #[derive(Default, Clone)]
    pub struct MemoryTransactionSource {
        store: Arc<Mutex<Tables>>,
        counters: Arc<Counters>,
    }

    impl MemoryTransactionSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn manager(&self) -> TransactionManager {
            TransactionManager::new(Arc::new(self.clone()))
        }

        /// Memory repositories that all run through `manager()`.
        pub fn repositories(&self) -> Repositories {
            let tx = self.manager();
            Repositories {
                movies: Arc::new(MemoryMovieRepository::new(tx.clone())),
                users: Arc::new(MemoryUserRepository::new(tx.clone())),
                user_movies: Arc::new(MemoryUserMovieRepository::new(tx.clone())),
                reviews: Arc::new(MemoryReviewRepository::new(tx.clone())),
                review_likes: Arc::new(MemoryReviewLikeRepository::new(tx)),
            }
        }

        pub fn app(&self) -> App {
            App::new(
                self.repositories(),
                self.manager(),
                Arc::new(JwtTokenService::new("test-secret", chrono::Duration::hours(1))),
            )
        }

        /// Inserts a movie directly, outside any transaction.
        pub fn seed_movie(&self, title: &str, year: i32, month: u32, day: u32) -> Movie {
            let release_date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
            let movie = Movie::new(
                MovieId(Uuid::new_v4()),
                title,
                &format!("About {title}"),
                release_date,
                "Someone",
                vec!["Actor".to_string()],
                vec!["Drama".to_string()],
                0.0,
            );
            self.store
                .lock()
                .unwrap()
                .movies
                .insert(movie.id, movie.clone());
            movie
        }

        /// Committed state.
        pub fn snapshot(&self) -> Tables {
            self.store.lock().unwrap().clone()
        }

        pub fn begins(&self) -> usize {
            self.counters.begins.load(Ordering::SeqCst)
        }

        pub fn commits(&self) -> usize {
            self.counters.commits.load(Ordering::SeqCst)
        }

        pub fn rollbacks(&self) -> usize {
            self.counters.rollbacks.load(Ordering::SeqCst)
        }

        pub fn aborts(&self) -> usize {
            self.counters.aborts.load(Ordering::SeqCst)
        }

        pub fn fail_next_commit(&self) {
            self.counters.fail_next_commit.store(true, Ordering::SeqCst);
        }

        pub fn fail_rollbacks(&self) {
            self.counters.fail_rollbacks.store(true, Ordering::SeqCst);
        }

        /// Makes every `begin` wait before opening, like a drained pool.
        pub fn delay_begin(&self, delay: Duration) {
            self.counters
                .begin_delay_ms
                .store(delay.as_millis() as u64, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl TransactionSource for MemoryTransactionSource {
        async fn begin(&self) -> Result<SharedTransaction> {
            let delay = self.counters.begin_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            self.counters.begins.fetch_add(1, Ordering::SeqCst);
            let staged = self.store.lock().unwrap().clone();
            Ok(Arc::new(MemoryTransaction {
                id: self.counters.next_id.fetch_add(1, Ordering::SeqCst),
                staged: Mutex::new(Some(staged)),
                store: self.store.clone(),
                counters: self.counters.clone(),
            }))
        }
    }

    pub struct MemoryTransaction {
        pub id: u64,
        staged: Mutex<Option<Tables>>,
        store: Arc<Mutex<Tables>>,
        counters: Arc<Counters>,
    }

    impl MemoryTransaction {
        pub fn from_context(ctx: &TxContext) -> Result<&MemoryTransaction> {
            ctx.transaction()
                .and_then(|tx| tx.as_any().downcast_ref::<MemoryTransaction>())
                .ok_or_else(|| {
                    DbError::Transaction("no memory transaction in context".to_string()).into()
                })
        }

        /// Runs `f` against this transaction's copy of the tables.
        pub fn with_tables<R>(&self, f: impl FnOnce(&mut Tables) -> Result<R>) -> Result<R> {
            let mut staged = self.staged.lock().unwrap();
            let tables = staged.as_mut().ok_or_else(finished)?;
            f(tables)
        }
    }

    fn finished() -> ApplicationError {
        DbError::Transaction("transaction already finished".to_string()).into()
    }

    #[async_trait]
    impl Transaction for MemoryTransaction {
        async fn commit(&self) -> Result<()> {
            let mut staged = self.staged.lock().unwrap();
            if staged.is_none() {
                return Err(finished());
            }
            if self.counters.fail_next_commit.swap(false, Ordering::SeqCst) {
                return Err(DbError::Transaction("commit refused".to_string()).into());
            }
            if let Some(tables) = staged.take() {
                *self.store.lock().unwrap() = tables;
            }
            self.counters.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn rollback(&self) -> Result<()> {
            if self.staged.lock().unwrap().take().is_none() {
                return Err(finished());
            }
            self.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
            if self.counters.fail_rollbacks.load(Ordering::SeqCst) {
                return Err(DbError::Transaction("rollback refused".to_string()).into());
            }
            Ok(())
        }

        fn abort(&self) {
            let Ok(mut staged) = self.staged.lock() else {
                return;
            };
            if staged.take().is_some() {
                self.counters.aborts.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// A registered user with known credentials.
    pub struct TestUser {
        pub id: UserId,
        pub email: String,
        pub password: String,
    }

    impl TestUser {
        pub async fn register(app: &App, name: &str) -> Result<Self> {
            let email = format!("{name}@test.io");
            let password = "password".to_string();
            let user = app
                .users
                .register(
                    &TxContext::background(),
                    RegistrationData::new(name, &email, &password),
                )
                .await?;
            Ok(Self {
                id: user.id().ok_or(DbError::UserByEmailNotFound(email.clone()))?,
                email,
                password,
            })
        }
    }

    #[derive(Clone)]
    pub struct MemoryMovieRepository {
        tx: TransactionManager,
    }

    impl MemoryMovieRepository {
        pub fn new(tx: TransactionManager) -> Self {
            Self { tx }
        }
    }

    #[async_trait]
    impl MovieRepository for MemoryMovieRepository {
        async fn get_all(&self, ctx: &TxContext) -> Result<Vec<Movie>> {
            self.tx
                .in_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| {
                        let mut movies: Vec<Movie> =
                            t.movies.values().map(|m| t.with_rating(m)).collect();
                        movies.sort_by(|a, b| {
                            (a.release_date, &a.title).cmp(&(b.release_date, &b.title))
                        });
                        Ok(movies)
                    })
                })
                .await
        }

        async fn get_by_release_date_and_title(
            &self,
            ctx: &TxContext,
            info: &MovieInfo,
        ) -> Result<Movie> {
            self.tx
                .in_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?
                        .with_tables(|t| Ok(t.with_rating(t.find_movie(info)?)))
                })
                .await
        }

        async fn get_id_by_release_date_and_title(
            &self,
            ctx: &TxContext,
            info: &MovieInfo,
        ) -> Result<MovieId> {
            self.tx
                .in_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| Ok(t.find_movie(info)?.id))
                })
                .await
        }
    }

    #[derive(Clone)]
    pub struct MemoryUserRepository {
        tx: TransactionManager,
    }

    impl MemoryUserRepository {
        pub fn new(tx: TransactionManager) -> Self {
            Self { tx }
        }
    }

    #[async_trait]
    impl UserRepository for MemoryUserRepository {
        async fn get_by_id(&self, ctx: &TxContext, id: UserId) -> Result<User> {
            self.tx
                .in_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| {
                        t.users
                            .get(&id)
                            .cloned()
                            .ok_or_else(|| DbError::UserByIdNotFound(id.0).into())
                    })
                })
                .await
        }

        async fn get_by_email(&self, ctx: &TxContext, email: &str) -> Result<User> {
            self.tx
                .in_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| {
                        t.users
                            .values()
                            .find(|u| u.email == email)
                            .cloned()
                            .ok_or_else(|| DbError::UserByEmailNotFound(email.to_string()).into())
                    })
                })
                .await
        }

        async fn save(&self, ctx: &TxContext, user: &mut User) -> Result<()> {
            self.tx
                .use_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| match user.id() {
                        None => {
                            if t.users.values().any(|u| u.email == user.email) {
                                return Err(ApplicationError::Infrastructure(
                                    "duplicate key value violates unique constraint \"users_email_key\""
                                        .to_string(),
                                ));
                            }
                            let id = UserId(Uuid::new_v4());
                            user.set_id(id)?;
                            t.users.insert(id, user.clone());
                            Ok(())
                        }
                        Some(id) => match t.users.get_mut(&id) {
                            Some(row) => {
                                *row = user.clone();
                                Ok(())
                            }
                            None => Err(DbError::UserByIdNotFound(id.0).into()),
                        },
                    })
                })
                .await
        }

        async fn exists_by_email(&self, ctx: &TxContext, email: &str) -> Result<bool> {
            self.tx
                .in_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?
                        .with_tables(|t| Ok(t.users.values().any(|u| u.email == email)))
                })
                .await
        }
    }

    #[derive(Clone)]
    pub struct MemoryUserMovieRepository {
        tx: TransactionManager,
    }

    impl MemoryUserMovieRepository {
        pub fn new(tx: TransactionManager) -> Self {
            Self { tx }
        }
    }

    #[async_trait]
    impl UserMovieRepository for MemoryUserMovieRepository {
        async fn save(&self, ctx: &TxContext, user_movie: &mut UserMovie) -> Result<()> {
            self.tx
                .use_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| match user_movie.id() {
                        None => {
                            let id = UserMovieId(Uuid::new_v4());
                            user_movie.set_id(id)?;
                            t.user_movies.insert(id, user_movie.clone());
                            Ok(())
                        }
                        Some(_) => {
                            let row = t
                                .user_movies
                                .values_mut()
                                .find(|um| {
                                    um.user_id == user_movie.user_id
                                        && um.movie_id == user_movie.movie_id
                                })
                                .ok_or(DbError::UserMovieNotFound)?;
                            row.set_list_type(user_movie.list_type());
                            row.set_rating(user_movie.user_rating())?;
                            Ok(())
                        }
                    })
                })
                .await
        }

        async fn delete(&self, ctx: &TxContext, user_movie: &UserMovie) -> Result<()> {
            self.tx
                .use_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| {
                        let before = t.user_movies.len();
                        t.user_movies.retain(|_, um| {
                            !(um.user_id == user_movie.user_id && um.movie_id == user_movie.movie_id)
                        });
                        if t.user_movies.len() == before {
                            return Err(DbError::UserMovieNotFound.into());
                        }
                        Ok(())
                    })
                })
                .await
        }

        async fn get_by_user_and_movie(
            &self,
            ctx: &TxContext,
            user_id: UserId,
            movie_id: MovieId,
        ) -> Result<UserMovie> {
            self.tx
                .in_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| {
                        t.user_movie(user_id, movie_id)
                            .cloned()
                            .ok_or_else(|| DbError::UserMovieNotFound.into())
                    })
                })
                .await
        }

        async fn get_movies_by_user_and_list_type(
            &self,
            ctx: &TxContext,
            user_id: UserId,
            list_type: ListType,
        ) -> Result<Vec<MovieUserInfo>> {
            self.tx
                .in_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| {
                        Ok(t.movies
                            .values()
                            .map(|m| t.movie_user_info(user_id, m))
                            .filter(|(lt, _)| *lt == list_type)
                            .map(|(_, info)| info)
                            .collect())
                    })
                })
                .await
        }

        async fn get_movie_by_user_and_list_type(
            &self,
            ctx: &TxContext,
            user_id: UserId,
            movie_id: MovieId,
            list_type: ListType,
        ) -> Result<MovieUserInfo> {
            self.tx
                .in_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| {
                        t.movies
                            .get(&movie_id)
                            .map(|m| t.movie_user_info(user_id, m))
                            .filter(|(lt, _)| *lt == list_type)
                            .map(|(_, info)| info)
                            .ok_or_else(|| DbError::UserMovieNotFound.into())
                    })
                })
                .await
        }
    }

    #[derive(Clone)]
    pub struct MemoryReviewRepository {
        tx: TransactionManager,
    }

    impl MemoryReviewRepository {
        pub fn new(tx: TransactionManager) -> Self {
            Self { tx }
        }
    }

    #[async_trait]
    impl ReviewRepository for MemoryReviewRepository {
        async fn save(&self, ctx: &TxContext, review: &mut Review) -> Result<()> {
            self.tx
                .use_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| match review.id() {
                        None => {
                            let id = ReviewId(Uuid::new_v4());
                            review.set_id(id)?;
                            t.reviews.insert(id, review.clone());
                            Ok(())
                        }
                        Some(id) => {
                            let row = t.reviews.get_mut(&id).ok_or(DbError::ReviewNotFound)?;
                            row.set_text(review.text())?;
                            row.set_writing_date(review.writing_date());
                            Ok(())
                        }
                    })
                })
                .await
        }

        async fn delete(&self, ctx: &TxContext, review: &Review) -> Result<()> {
            self.tx
                .use_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| {
                        let before = t.reviews.len();
                        t.reviews.retain(|_, r| {
                            !(r.user_id == review.user_id && r.movie_id == review.movie_id)
                        });
                        if t.reviews.len() == before {
                            return Err(DbError::ReviewNotFound.into());
                        }
                        let reviews = &t.reviews;
                        t.review_likes.retain(|l| reviews.contains_key(&l.review_id));
                        Ok(())
                    })
                })
                .await
        }

        async fn get_by_user_and_movie(
            &self,
            ctx: &TxContext,
            user_id: UserId,
            movie_id: MovieId,
        ) -> Result<Review> {
            self.tx
                .in_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| {
                        t.reviews
                            .values()
                            .find(|r| r.user_id == user_id && r.movie_id == movie_id)
                            .cloned()
                            .ok_or_else(|| DbError::ReviewNotFound.into())
                    })
                })
                .await
        }

        async fn get_by_id(&self, ctx: &TxContext, id: ReviewId) -> Result<Review> {
            self.tx
                .in_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| {
                        t.reviews
                            .get(&id)
                            .cloned()
                            .ok_or_else(|| DbError::ReviewByIdNotFound(id.0).into())
                    })
                })
                .await
        }

        async fn get_reviews_by_movie(
            &self,
            ctx: &TxContext,
            movie_id: MovieId,
        ) -> Result<Vec<ReviewInfo>> {
            self.tx
                .in_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?
                        .with_tables(|t| Ok(t.review_infos(movie_id, None)))
                })
                .await
        }

        async fn get_reviews_by_movie_for_user(
            &self,
            ctx: &TxContext,
            movie_id: MovieId,
            user_id: UserId,
        ) -> Result<Vec<ReviewInfo>> {
            self.tx
                .in_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?
                        .with_tables(|t| Ok(t.review_infos(movie_id, Some(user_id))))
                })
                .await
        }
    }

    #[derive(Clone)]
    pub struct MemoryReviewLikeRepository {
        tx: TransactionManager,
    }

    impl MemoryReviewLikeRepository {
        pub fn new(tx: TransactionManager) -> Self {
            Self { tx }
        }
    }

    #[async_trait]
    impl ReviewLikeRepository for MemoryReviewLikeRepository {
        async fn like(&self, ctx: &TxContext, user_id: UserId, review_id: ReviewId) -> Result<()> {
            self.tx
                .use_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| {
                        t.review_likes.insert(ReviewLike::new(user_id, review_id));
                        Ok(())
                    })
                })
                .await
        }

        async fn unlike(&self, ctx: &TxContext, user_id: UserId, review_id: ReviewId) -> Result<()> {
            self.tx
                .use_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?.with_tables(|t| {
                        t.review_likes.remove(&ReviewLike::new(user_id, review_id));
                        Ok(())
                    })
                })
                .await
        }

        async fn exists(
            &self,
            ctx: &TxContext,
            user_id: UserId,
            review_id: ReviewId,
        ) -> Result<bool> {
            self.tx
                .in_transaction(ctx, |ctx| async move {
                    MemoryTransaction::from_context(&ctx)?
                        .with_tables(|t| Ok(t.review_likes.contains(&ReviewLike::new(user_id, review_id))))
                })
                .await
        }
    }
}
