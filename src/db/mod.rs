pub mod memory;
pub mod movies;
pub mod postgres;
pub mod redis;

pub use self::memory::InMemoryMovieRepository;
pub use self::movies::{MovieRepository, RefreshSelection};
pub use self::postgres::{create_pool, run_migrations, PgMovieRepository};
pub use self::redis::{create_redis_client, Cache, CacheKey};
