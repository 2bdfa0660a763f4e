#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use rand::Rng;

    use moviebase_app::{App, TxContext, jwt::JwtTokenService};
    use moviebase_db::{DbPool, establish_test_connection_pool, postgres_repositories};
    use moviebase_types::{
        Result,
        errors::ApplicationError,
        movie::MovieInfo,
        user::{RegistrationData, UserId},
    };

    pub const PASSWORD: &str = "password";

    /// App over `TEST_DATABASE_URL` with migrations applied.
    pub async fn setup_app() -> Result<(DbPool, App)> {
        let pool = establish_test_connection_pool().await?;
        sqlx::migrate!("../migrations")
            .run(&pool)
            .await
            .map_err(|e| ApplicationError::Unknown(e.to_string()))?;

        let (repositories, tx) = postgres_repositories(pool.clone());
        let tokens = Arc::new(JwtTokenService::new("test-secret", chrono::Duration::hours(1)));
        Ok((pool, App::new(repositories, tx, tokens)))
    }

    /// Tests share one database and commit for real, so names must not collide.
    pub fn unique(prefix: &str) -> String {
        let suffix: u32 = rand::thread_rng().gen_range(0..u32::MAX);
        format!("{prefix}{suffix}")
    }

    pub async fn seed_movie(pool: &DbPool) -> Result<MovieInfo> {
        let info = MovieInfo::new(unique("Movie "), 1999, 3, 31);
        sqlx::query(
            r#"
            INSERT INTO movies (title, description, release_date, director, actors, genres)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&info.title)
        .bind("A hacker learns the truth.")
        .bind(info.release_date()?)
        .bind("The Wachowskis")
        .bind(vec!["Keanu Reeves".to_string()])
        .bind(vec!["Sci-Fi".to_string()])
        .execute(pool)
        .await?;
        Ok(info)
    }

    pub async fn register(app: &App) -> Result<(UserId, String)> {
        let username = unique("u");
        let email = format!("{username}@test.io");
        let user = app
            .users
            .register(
                &TxContext::background(),
                RegistrationData::new(&username, &email, PASSWORD),
            )
            .await?;
        let id = user
            .id()
            .ok_or_else(|| ApplicationError::Unknown("registered user has no id".into()))?;
        Ok((id, email))
    }
}
