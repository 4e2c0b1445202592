//! Meilisearch-backed search index.

use async_trait::async_trait;
use meilisearch_sdk::client::Client;
use meilisearch_sdk::settings::Settings;

use crate::application::search::{ProductDocument, SearchError, SearchIndex};
use crate::config::SearchSettings;

pub const PRODUCT_INDEX: &str = "products";
const PRIMARY_KEY: &str = "id";

pub struct MeiliSearchIndex {
    client: Client,
}

impl MeiliSearchIndex {
    /// Connect and apply index settings. Idempotent; safe on every startup.
    pub async fn connect(settings: &SearchSettings) -> Result<Self, SearchError> {
        let client = Client::new(&settings.url, settings.api_key.as_deref())
            .map_err(SearchError::backend)?;

        client
            .index(PRODUCT_INDEX)
            .set_settings(&index_settings())
            .await
            .map_err(SearchError::backend)?;

        Ok(Self { client })
    }

    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn index_settings() -> Settings {
    Settings::new().with_searchable_attributes(["name", "description"])
}

#[async_trait]
impl SearchIndex for MeiliSearchIndex {
    async fn upsert(
        &self,
        document: &ProductDocument,
        visible_immediately: bool,
    ) -> Result<(), SearchError> {
        let task = self
            .client
            .index(PRODUCT_INDEX)
            .add_or_update(std::slice::from_ref(document), Some(PRIMARY_KEY))
            .await
            .map_err(SearchError::backend)?;

        if visible_immediately {
            task.wait_for_completion(&self.client, None, None)
                .await
                .map_err(SearchError::backend)?;
        }
        Ok(())
    }

    async fn remove(&self, id: i64) -> Result<(), SearchError> {
        self.client
            .index(PRODUCT_INDEX)
            .delete_document(id)
            .await
            .map_err(SearchError::backend)?;
        Ok(())
    }

    async fn query(&self, text: &str) -> Result<Vec<ProductDocument>, SearchError> {
        let results = self
            .client
            .index(PRODUCT_INDEX)
            .search()
            .with_query(text)
            .execute::<ProductDocument>()
            .await
            .map_err(SearchError::backend)?;

        Ok(results.hits.into_iter().map(|hit| hit.result).collect())
    }
}
