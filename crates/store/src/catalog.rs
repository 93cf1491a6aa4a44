//! CatalogStore: the catalog document behind one process-wide lock.
//!
//! Every mutation runs load → modify → persist while holding the write side
//! of a single `RwLock`, so interleaved requests can never lose each other's
//! updates. Reads share the read side and serve the cached snapshot, which is
//! loaded lazily on first access and replaced by every successful mutation.

use std::sync::{RwLock, RwLockWriteGuard};

use shelfkeeper_core::{
    AssetRef, Brand, Catalog, CatalogError, CatalogResult, Category, EntityId, NewProduct,
    Product, ProductPatch,
};

use crate::assets::{AssetManager, AssetUpload, sanitize_file_name};
use crate::config::StoreConfig;
use crate::document::DocumentFile;

/// Asset writes and deletes of one mutation.
///
/// Written assets are removed again if the mutation fails; retired assets are
/// only deleted after the document no longer references them.
struct AssetChanges<'a> {
    assets: &'a AssetManager,
    written: Vec<AssetRef>,
    retired: Vec<AssetRef>,
}

impl<'a> AssetChanges<'a> {
    fn new(assets: &'a AssetManager) -> Self {
        Self {
            assets,
            written: Vec::new(),
            retired: Vec::new(),
        }
    }

    /// Store an upload under a name qualified by a fresh asset id, so uploads
    /// with the same client file name never overwrite each other.
    fn write(&mut self, upload: &AssetUpload) -> CatalogResult<AssetRef> {
        let name = format!("{}_{}", EntityId::generate(), sanitize_file_name(&upload.file_name));
        let asset = self.assets.store(&upload.bytes, &name)?;
        self.written.push(asset.clone());
        Ok(asset)
    }

    fn retire(&mut self, asset: AssetRef) {
        self.retired.push(asset);
    }

    fn rollback(self) {
        for asset in self.written {
            if let Err(e) = self.assets.delete(&asset) {
                tracing::warn!(asset = %asset, "failed to remove asset of aborted mutation: {e}");
            }
        }
    }

    fn commit(self) {
        for asset in self.retired {
            if let Err(e) = self.assets.delete(&asset) {
                tracing::warn!(asset = %asset, "orphaned asset left behind: {e}");
            }
        }
    }
}

fn products_assets(products: &[Product]) -> impl Iterator<Item = AssetRef> + '_ {
    products.iter().filter_map(|p| p.image.clone())
}

/// The catalog document plus its asset directory.
#[derive(Debug)]
pub struct CatalogStore {
    document: DocumentFile,
    assets: AssetManager,
    cache: RwLock<Option<Catalog>>,
}

impl CatalogStore {
    /// Open (and create if needed) the data directory described by `config`.
    pub fn open(config: &StoreConfig) -> CatalogResult<Self> {
        let assets = AssetManager::new(config.asset_root());
        assets.ensure_root()?;
        Ok(Self {
            document: DocumentFile::new(config.document_path()),
            assets,
            cache: RwLock::new(None),
        })
    }

    pub fn assets(&self) -> &AssetManager {
        &self.assets
    }

    pub(crate) fn document(&self) -> &DocumentFile {
        &self.document
    }

    /// Take the exclusive section (used by backup export/import).
    pub(crate) fn lock_exclusive(&self) -> CatalogResult<RwLockWriteGuard<'_, Option<Catalog>>> {
        self.cache.write().map_err(|_| CatalogError::poisoned())
    }

    fn read<T>(&self, f: impl FnOnce(&Catalog) -> T) -> CatalogResult<T> {
        {
            let guard = self.cache.read().map_err(|_| CatalogError::poisoned())?;
            if let Some(catalog) = guard.as_ref() {
                return Ok(f(catalog));
            }
        }

        let mut guard = self.lock_exclusive()?;
        let catalog = match guard.take() {
            Some(c) => c,
            None => self.document.load()?,
        };
        let out = f(&catalog);
        *guard = Some(catalog);
        Ok(out)
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Catalog, &mut AssetChanges<'_>) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        let mut guard = self.lock_exclusive()?;

        // Always start from the latest durable snapshot.
        let mut catalog = self.document.load()?;
        let mut changes = AssetChanges::new(&self.assets);

        let out = match f(&mut catalog, &mut changes) {
            Ok(out) => out,
            Err(e) => {
                changes.rollback();
                return Err(e);
            }
        };

        if let Err(e) = self.document.persist(&catalog) {
            changes.rollback();
            return Err(e);
        }

        *guard = Some(catalog);
        changes.commit();
        Ok(out)
    }

    /// Full catalog snapshot.
    pub fn snapshot(&self) -> CatalogResult<Catalog> {
        self.read(Catalog::clone)
    }

    /// Public view: active products only.
    pub fn storefront(&self) -> CatalogResult<Catalog> {
        self.read(Catalog::storefront)
    }

    /// Products of a category; empty when the brand or category is absent.
    pub fn list_products(&self, brand_id: &str, category_id: &str) -> CatalogResult<Vec<Product>> {
        self.read(|catalog| {
            catalog
                .products(brand_id, category_id)
                .map(<[Product]>::to_vec)
                .unwrap_or_default()
        })
    }

    /// Bytes of a stored asset, `None` if it does not exist. Holds the read
    /// side of the lock, so a backup import is never observed mid-swap.
    pub fn read_asset(&self, asset: &AssetRef) -> CatalogResult<Option<Vec<u8>>> {
        let _guard = self.cache.read().map_err(|_| CatalogError::poisoned())?;
        self.assets.read(asset)
    }

    pub fn add_product(
        &self,
        brand_id: &str,
        category_id: &str,
        fields: NewProduct,
        image: Option<AssetUpload>,
    ) -> CatalogResult<Product> {
        let product = self.mutate(|catalog, changes| {
            let category = catalog.category_mut(brand_id, category_id)?;

            let mut product = Product::create(fields);
            if let Some(upload) = &image {
                product.image = Some(changes.write(upload)?);
            }
            category.products.push(product.clone());
            Ok(product)
        })?;

        tracing::info!(brand_id, category_id, product_id = %product.id, "product added");
        Ok(product)
    }

    /// Apply a partial update. A new image is written before the old one is
    /// removed, and the old one only goes once the new reference is persisted.
    pub fn update_product(
        &self,
        brand_id: &str,
        category_id: &str,
        product_id: &str,
        patch: ProductPatch,
        image: Option<AssetUpload>,
    ) -> CatalogResult<Product> {
        let product = self.mutate(|catalog, changes| {
            let product = catalog.product_mut(brand_id, category_id, product_id)?;

            if let Some(upload) = &image {
                let fresh = changes.write(upload)?;
                if let Some(old) = product.image.replace(fresh) {
                    changes.retire(old);
                }
            }
            product.apply(patch);
            Ok(product.clone())
        })?;

        tracing::info!(brand_id, category_id, product_id, "product updated");
        Ok(product)
    }

    pub fn delete_product(&self, brand_id: &str, category_id: &str, product_id: &str) -> CatalogResult<()> {
        self.mutate(|catalog, changes| {
            let removed = catalog
                .category_mut(brand_id, category_id)?
                .remove_product(product_id)?;
            if let Some(image) = removed.image {
                changes.retire(image);
            }
            Ok(())
        })?;

        tracing::info!(brand_id, category_id, product_id, "product deleted");
        Ok(())
    }

    /// Flip `active`; returns the new value.
    pub fn toggle_product(&self, brand_id: &str, category_id: &str, product_id: &str) -> CatalogResult<bool> {
        let active = self.mutate(|catalog, _| {
            let product = catalog.product_mut(brand_id, category_id, product_id)?;
            product.active = !product.active;
            Ok(product.active)
        })?;

        tracing::info!(brand_id, category_id, product_id, active, "product toggled");
        Ok(active)
    }

    pub fn add_category(&self, brand_id: &str, name: &str) -> CatalogResult<Category> {
        let category = self.mutate(|catalog, _| {
            let brand = catalog.brand_mut(brand_id)?;
            let name = name.trim();
            if name.is_empty() {
                return Err(CatalogError::validation("category name cannot be empty"));
            }
            let category = Category::new(name);
            brand.categories.push(category.clone());
            Ok(category)
        })?;

        tracing::info!(brand_id, category_id = %category.id, "category added");
        Ok(category)
    }

    /// Delete a category together with its products and their images.
    pub fn delete_category(&self, brand_id: &str, category_id: &str) -> CatalogResult<()> {
        self.mutate(|catalog, changes| {
            let removed = catalog.brand_mut(brand_id)?.remove_category(category_id)?;
            for asset in products_assets(&removed.products) {
                changes.retire(asset);
            }
            Ok(())
        })?;

        tracing::info!(brand_id, category_id, "category deleted");
        Ok(())
    }

    pub fn add_brand(&self, name: &str) -> CatalogResult<Brand> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::validation("brand name cannot be empty"));
        }

        let brand = self.mutate(|catalog, _| {
            let brand = Brand::new(name);
            catalog.brands.push(brand.clone());
            Ok(brand)
        })?;

        tracing::info!(brand_id = %brand.id, "brand added");
        Ok(brand)
    }

    /// Delete a brand together with every category, product and image below it.
    pub fn delete_brand(&self, brand_id: &str) -> CatalogResult<()> {
        self.mutate(|catalog, changes| {
            let removed = catalog.remove_brand(brand_id)?;
            for category in &removed.categories {
                for asset in products_assets(&category.products) {
                    changes.retire(asset);
                }
            }
            Ok(())
        })?;

        tracing::info!(brand_id, "brand deleted");
        Ok(())
    }
}
