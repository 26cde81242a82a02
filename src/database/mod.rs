use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::errors::Result;

pub mod memory;
pub mod queries;
pub mod repositories;

pub use memory::MemoryStore;
pub use queries::{FileQueries, FolderQueries, UserQueries};
pub use repositories::{FileRepository, FolderRepository, UserRepository};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| crate::errors::AppError::Internal(e.into()))?;
        Ok(())
    }

    pub fn folders(&self) -> FolderQueries {
        FolderQueries::new(self.pool.clone())
    }

    pub fn files(&self) -> FileQueries {
        FileQueries::new(self.pool.clone())
    }

    pub fn users(&self) -> UserQueries {
        UserQueries::new(self.pool.clone())
    }
}
