//! In-memory fakes backing the service-level integration tests. The fakes
//! honor the same contracts as the Postgres, Meilisearch and object-store
//! adapters: live rows only, soft-delete terminality, transactional toggle
//! semantics.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;

use vetrina::application::objectstore::{ObjectStore, ObjectStoreError, PendingUpload, StoredAsset};
use vetrina::application::repos::{
    CreateProductParams, CreatePromoParams, FavoritesRepo, ProductsRepo, ProductsWriteRepo,
    PromosRepo, PromosWriteRepo, RepoError, ToggleOutcome, UpdateProductParams, UpdatePromoParams,
};
use vetrina::application::search::{ProductDocument, SearchError, SearchIndex};
use vetrina::domain::entities::{
    FavoriteRecord, ProductListEntry, ProductRecord, PromoDetail, PromoRecord,
};

/// One backing store implementing every repository trait, like
/// `PostgresRepositories` does.
#[derive(Default)]
pub struct FakeBackend {
    products: Mutex<HashMap<i64, ProductRecord>>,
    promos: Mutex<HashMap<i64, PromoRecord>>,
    favorites: Mutex<Vec<FavoriteRecord>>,
    next_id: AtomicI64,
    visit_increments: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Total number of visit-counter increments across all products, for
    /// asserting on the de-dup lock.
    pub fn visit_increments(&self) -> usize {
        self.visit_increments.load(Ordering::SeqCst)
    }

    /// Mutates a stored row directly, bypassing the service layer, to
    /// surface cache staleness in tests.
    pub fn rename_product_directly(&self, id: i64, name: &str) {
        let mut products = self.products.lock().unwrap();
        products
            .get_mut(&id)
            .expect("product should exist")
            .name = name.to_string();
    }

    pub fn product(&self, id: i64) -> Option<ProductRecord> {
        self.products.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl ProductsRepo for FakeBackend {
    async fn list_products(&self) -> Result<Vec<ProductListEntry>, RepoError> {
        let favorites = self.favorites.lock().unwrap();
        let mut entries: Vec<ProductListEntry> = self
            .products
            .lock()
            .unwrap()
            .values()
            .filter(|p| !p.is_deleted)
            .map(|p| ProductListEntry {
                favorites_count: favorites.iter().filter(|f| f.product_id == p.id).count() as i64,
                product: p.clone(),
            })
            .collect();
        entries.sort_by_key(|e| e.product.id);
        Ok(entries)
    }

    async fn find_product(&self, id: i64) -> Result<Option<ProductRecord>, RepoError> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .get(&id)
            .filter(|p| !p.is_deleted)
            .cloned())
    }

    async fn list_active_promos_for(&self, product_id: i64) -> Result<Vec<PromoRecord>, RepoError> {
        Ok(self
            .promos
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.product_id == product_id && p.is_active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProductsWriteRepo for FakeBackend {
    async fn create_product(&self, params: CreateProductParams) -> Result<ProductRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let record = ProductRecord {
            id: self.allocate_id(),
            name: params.name,
            description: params.description,
            price: params.price,
            size: params.size,
            stock: params.stock,
            image_url: params.image_url,
            image_key: params.image_key,
            visit_count: 0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.products
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_product(&self, params: UpdateProductParams) -> Result<ProductRecord, RepoError> {
        let mut products = self.products.lock().unwrap();
        let record = products
            .get_mut(&params.id)
            .filter(|p| !p.is_deleted)
            .ok_or(RepoError::NotFound)?;
        record.name = params.name;
        record.description = params.description;
        record.price = params.price;
        record.size = params.size;
        record.stock = params.stock;
        if let Some((url, key)) = params.image {
            record.image_url = url;
            record.image_key = key;
        }
        record.updated_at = OffsetDateTime::now_utc();
        Ok(record.clone())
    }

    async fn find_product_for_update(&self, id: i64) -> Result<Option<ProductRecord>, RepoError> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .get(&id)
            .filter(|p| !p.is_deleted)
            .cloned())
    }

    async fn soft_delete_product(&self, id: i64) -> Result<(), RepoError> {
        let mut products = self.products.lock().unwrap();
        let record = products
            .get_mut(&id)
            .filter(|p| !p.is_deleted)
            .ok_or(RepoError::NotFound)?;
        record.is_deleted = true;
        Ok(())
    }

    async fn increment_visits(&self, id: i64) -> Result<(), RepoError> {
        let mut products = self.products.lock().unwrap();
        let record = products
            .get_mut(&id)
            .filter(|p| !p.is_deleted)
            .ok_or(RepoError::NotFound)?;
        record.visit_count += 1;
        self.visit_increments.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl FakeBackend {
    fn promo_detail(&self, promo: &PromoRecord) -> Option<PromoDetail> {
        self.products
            .lock()
            .unwrap()
            .get(&promo.product_id)
            .cloned()
            .map(|product| PromoDetail {
                promo: promo.clone(),
                product,
            })
    }
}

#[async_trait]
impl PromosRepo for FakeBackend {
    async fn list_promos(&self) -> Result<Vec<PromoDetail>, RepoError> {
        let promos: Vec<PromoRecord> = self.promos.lock().unwrap().values().cloned().collect();
        let mut details: Vec<PromoDetail> = promos
            .iter()
            .filter_map(|p| self.promo_detail(p))
            .collect();
        details.sort_by_key(|d| d.promo.id);
        Ok(details)
    }

    async fn list_active_promos(&self) -> Result<Vec<PromoDetail>, RepoError> {
        let promos: Vec<PromoRecord> = self.promos.lock().unwrap().values().cloned().collect();
        let mut details: Vec<PromoDetail> = promos
            .iter()
            .filter(|p| p.is_active)
            .filter_map(|p| self.promo_detail(p))
            .collect();
        details.sort_by_key(|d| d.promo.id);
        Ok(details)
    }

    async fn find_promo(&self, id: i64) -> Result<Option<PromoDetail>, RepoError> {
        let promo = self.promos.lock().unwrap().get(&id).cloned();
        Ok(promo.and_then(|p| self.promo_detail(&p)))
    }
}

#[async_trait]
impl PromosWriteRepo for FakeBackend {
    async fn create_promo(&self, params: CreatePromoParams) -> Result<PromoRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let record = PromoRecord {
            id: self.allocate_id(),
            product_id: params.product_id,
            discount: params.discount,
            is_active: true,
            image_url: params.image_url,
            image_key: params.image_key,
            created_at: now,
            updated_at: now,
        };
        self.promos.lock().unwrap().insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_promo(&self, params: UpdatePromoParams) -> Result<PromoRecord, RepoError> {
        let mut promos = self.promos.lock().unwrap();
        let record = promos.get_mut(&params.id).ok_or(RepoError::NotFound)?;
        record.discount = params.discount;
        record.is_active = params.is_active;
        if let Some((url, key)) = params.image {
            record.image_url = url;
            record.image_key = key;
        }
        record.updated_at = OffsetDateTime::now_utc();
        Ok(record.clone())
    }

    async fn find_promo_for_update(&self, id: i64) -> Result<Option<PromoRecord>, RepoError> {
        Ok(self.promos.lock().unwrap().get(&id).cloned())
    }

    async fn delete_promo(&self, id: i64) -> Result<(), RepoError> {
        self.promos
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl FavoritesRepo for FakeBackend {
    async fn toggle(&self, user_id: i64, product_id: i64) -> Result<ToggleOutcome, RepoError> {
        let mut favorites = self.favorites.lock().unwrap();
        if let Some(pos) = favorites
            .iter()
            .position(|f| f.user_id == user_id && f.product_id == product_id)
        {
            favorites.remove(pos);
            return Ok(ToggleOutcome::Removed);
        }

        let live = self
            .products
            .lock()
            .unwrap()
            .get(&product_id)
            .is_some_and(|p| !p.is_deleted);
        if !live {
            return Err(RepoError::NotFound);
        }

        let record = FavoriteRecord {
            id: self.allocate_id(),
            user_id,
            product_id,
            created_at: OffsetDateTime::now_utc(),
        };
        favorites.push(record.clone());
        Ok(ToggleOutcome::Added(record))
    }

    async fn exists(&self, user_id: i64, product_id: i64) -> Result<bool, RepoError> {
        Ok(self
            .favorites
            .lock()
            .unwrap()
            .iter()
            .any(|f| f.user_id == user_id && f.product_id == product_id))
    }

    async fn count_for_product(&self, product_id: i64) -> Result<i64, RepoError> {
        Ok(self
            .favorites
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.product_id == product_id)
            .count() as i64)
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<FavoriteRecord>, RepoError> {
        Ok(self
            .favorites
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// Substring matcher standing in for the real full-text index.
#[derive(Default)]
pub struct FakeIndex {
    documents: Mutex<HashMap<i64, ProductDocument>>,
    fail_upserts: AtomicBool,
}

impl FakeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, id: i64) -> bool {
        self.documents.lock().unwrap().contains_key(&id)
    }
}

#[async_trait]
impl SearchIndex for FakeIndex {
    async fn upsert(
        &self,
        document: &ProductDocument,
        _visible_immediately: bool,
    ) -> Result<(), SearchError> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(SearchError::backend("index unavailable"));
        }
        self.documents
            .lock()
            .unwrap()
            .insert(document.id, document.clone());
        Ok(())
    }

    async fn remove(&self, id: i64) -> Result<(), SearchError> {
        self.documents.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn query(&self, text: &str) -> Result<Vec<ProductDocument>, SearchError> {
        let needle = text.to_lowercase();
        let mut hits: Vec<ProductDocument> = self
            .documents
            .lock()
            .unwrap()
            .values()
            .filter(|doc| {
                needle.is_empty()
                    || doc.name.to_lowercase().contains(&needle)
                    || doc.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        hits.sort_by_key(|doc| doc.id);
        Ok(hits)
    }
}

/// Records uploads and deletes without any remote side.
#[derive(Default)]
pub struct FakeObjectStore {
    uploads: AtomicI64,
    deleted: Mutex<Vec<String>>,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn upload(
        &self,
        _local_path: &Path,
        folder: &str,
    ) -> Result<StoredAsset, ObjectStoreError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(StoredAsset {
            url: format!("https://assets.test/{folder}/{n}.png"),
            key: format!("{folder}/{n}"),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

/// Buffers a throwaway image file the way the multipart layer does.
pub fn buffered_image() -> PendingUpload {
    let file = tempfile::Builder::new()
        .prefix("vetrina-test-")
        .suffix(".png")
        .tempfile()
        .expect("temp file");
    let path = file.into_temp_path().keep().expect("keep temp file");
    std::fs::write(&path, b"not a real png").expect("write temp file");
    PendingUpload::new(path)
}
