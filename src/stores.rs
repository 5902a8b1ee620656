use ::anyhow::Result;
use ::log::info;
use ::std::sync::Arc;

use crate::config::Config;
use crate::content::ContentStore;
use crate::options::OptionsStore;

/// Builds the options and content providers selected by STORE_INTERFACE.
/// The postgres providers share one pool and create their schema up front;
/// a store that cannot be reached fails loudly here.
pub async fn make_providers(
    config: &Config,
) -> Result<(Arc<dyn OptionsStore>, Arc<dyn ContentStore>)> {
    match config.store_interface.as_str() {
        "postgres" => {
            info!("connecting to postgres");

            let pool = ::sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(&config.postgres_string)
                .await?;

            crate::options::postgres::setup(&pool).await?;
            crate::content::postgres::setup(&pool).await?;

            Ok((
                Arc::new(crate::options::postgres::PostgresOptionsStore::new(
                    pool.clone(),
                )),
                Arc::new(crate::content::postgres::PostgresContentStore::new(
                    pool,
                )),
            ))
        }
        "memory" => {
            info!("using in-memory stores, state will not survive restart");

            Ok((
                Arc::new(crate::options::memory::MemoryOptionsStore::new()),
                Arc::new(crate::content::memory::MemoryContentStore::new()),
            ))
        }
        other => Err(::anyhow::anyhow!("unknown store interface: {}", other)),
    }
}
