//! Catalog document model: brand → category → product.
//!
//! The serialized shape is the persisted document itself (`{"brands": [...]}`),
//! so field names here are part of the on-disk format.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, find, find_mut};
use crate::error::{CatalogError, CatalogResult, Level};
use crate::id::EntityId;
use crate::patch::ProductPatch;

/// Prefix shared by every asset reference and by asset entries in backups.
pub const ASSET_PREFIX: &str = "uploads/";

/// Relative path of a stored image, e.g. `uploads/3f2c_runner.png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    /// Reference for a file directly under the asset root.
    pub fn for_file(file_name: &str) -> Self {
        Self(format!("{ASSET_PREFIX}{file_name}"))
    }

    /// Wrap a raw reference (as read from a document).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path below the asset root, if the reference is well-formed
    /// (`uploads/` followed by at least one character).
    pub fn relative_path(&self) -> Option<&str> {
        self.0.strip_prefix(ASSET_PREFIX).filter(|rest| !rest.is_empty())
    }
}

impl core::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Legacy documents store "no image" as `""`.
mod image_field {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::AssetRef;

    pub fn serialize<S: Serializer>(value: &Option<AssetRef>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_ref().map(AssetRef::as_str).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<AssetRef>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.filter(|s| !s.is_empty()).map(AssetRef::from_raw))
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "image_field")]
    pub image: Option<AssetRef>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Product {
    /// Build a fresh product: new id, active, no image yet.
    pub fn create(fields: NewProduct) -> Self {
        Self {
            id: EntityId::generate(),
            title: fields.title,
            name: fields.name,
            description: fields.description,
            image: None,
            active: true,
        }
    }

    pub fn apply(&mut self, patch: ProductPatch) {
        patch.title.apply_to(&mut self.title);
        patch.name.apply_to(&mut self.name);
        patch.description.apply_to(&mut self.description);
    }
}

impl Entity for Product {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// Caller-supplied fields of a new product. Missing form fields are empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewProduct {
    pub title: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.into(),
            products: Vec::new(),
        }
    }

    pub fn product_mut(&mut self, product_id: &str) -> CatalogResult<&mut Product> {
        find_mut(&mut self.products, product_id).ok_or(CatalogError::NotFound(Level::Product))
    }

    /// Remove a product and return it.
    pub fn remove_product(&mut self, product_id: &str) -> CatalogResult<Product> {
        let idx = self
            .products
            .iter()
            .position(|p| p.id.as_str() == product_id)
            .ok_or(CatalogError::NotFound(Level::Product))?;
        Ok(self.products.remove(idx))
    }
}

impl Entity for Category {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Brand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.into(),
            categories: Vec::new(),
        }
    }

    pub fn remove_category(&mut self, category_id: &str) -> CatalogResult<Category> {
        let idx = self
            .categories
            .iter()
            .position(|c| c.id.as_str() == category_id)
            .ok_or(CatalogError::NotFound(Level::Category))?;
        Ok(self.categories.remove(idx))
    }
}

impl Entity for Brand {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// Root of the persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub brands: Vec<Brand>,
}

impl Catalog {
    pub fn brand_mut(&mut self, brand_id: &str) -> CatalogResult<&mut Brand> {
        find_mut(&mut self.brands, brand_id).ok_or(CatalogError::NotFound(Level::Brand))
    }

    /// Resolve a category, failing at the first missing level.
    pub fn category_mut(&mut self, brand_id: &str, category_id: &str) -> CatalogResult<&mut Category> {
        let brand = self.brand_mut(brand_id)?;
        find_mut(&mut brand.categories, category_id).ok_or(CatalogError::NotFound(Level::Category))
    }

    pub fn product_mut(
        &mut self,
        brand_id: &str,
        category_id: &str,
        product_id: &str,
    ) -> CatalogResult<&mut Product> {
        self.category_mut(brand_id, category_id)?.product_mut(product_id)
    }

    /// Products of a category; `None` if the brand or category is absent.
    pub fn products(&self, brand_id: &str, category_id: &str) -> Option<&[Product]> {
        let brand = find(&self.brands, brand_id)?;
        let category = find(&brand.categories, category_id)?;
        Some(&category.products)
    }

    pub fn remove_brand(&mut self, brand_id: &str) -> CatalogResult<Brand> {
        let idx = self
            .brands
            .iter()
            .position(|b| b.id.as_str() == brand_id)
            .ok_or(CatalogError::NotFound(Level::Brand))?;
        Ok(self.brands.remove(idx))
    }

    pub fn product_count(&self) -> usize {
        self.brands
            .iter()
            .flat_map(|b| &b.categories)
            .map(|c| c.products.len())
            .sum()
    }

    /// Every image referenced anywhere in the catalog.
    pub fn image_refs(&self) -> impl Iterator<Item = &AssetRef> {
        self.brands
            .iter()
            .flat_map(|b| &b.categories)
            .flat_map(|c| &c.products)
            .filter_map(|p| p.image.as_ref())
    }

    /// Public view: active products only, empty categories and brands dropped.
    pub fn storefront(&self) -> Catalog {
        let brands = self
            .brands
            .iter()
            .filter_map(|brand| {
                let categories: Vec<Category> = brand
                    .categories
                    .iter()
                    .filter_map(|category| {
                        let products: Vec<Product> =
                            category.products.iter().filter(|p| p.active).cloned().collect();
                        (!products.is_empty()).then(|| Category {
                            id: category.id.clone(),
                            name: category.name.clone(),
                            products,
                        })
                    })
                    .collect();
                (!categories.is_empty()).then(|| Brand {
                    id: brand.id.clone(),
                    name: brand.name.clone(),
                    categories,
                })
            })
            .collect();
        Catalog { brands }
    }

    /// Structural check run on imported documents: non-empty ids, unique among
    /// siblings at every level.
    pub fn check_structure(&self) -> CatalogResult<()> {
        check_siblings(&self.brands, "brand")?;
        for brand in &self.brands {
            check_siblings(&brand.categories, "category")?;
            for category in &brand.categories {
                check_siblings(&category.products, "product")?;
            }
        }
        Ok(())
    }
}

fn check_siblings<E: Entity>(items: &[E], what: &str) -> CatalogResult<()> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        let id = item.id().as_str();
        if id.is_empty() {
            return Err(CatalogError::archive(format!("{what} with empty id")));
        }
        if !seen.insert(id) {
            return Err(CatalogError::archive(format!("duplicate {what} id '{id}'")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Patch;

    fn seeded() -> Catalog {
        serde_json::from_str(
            r#"{"brands":[{"id":"b1","name":"Acme","categories":[
                {"id":"c1","name":"Shoes","products":[
                    {"id":"p1","title":"Runner","name":"R","description":"","image":"","active":true},
                    {"id":"p2","title":"Boot","name":"B","description":"","image":"uploads/p2_boot.png","active":false}
                ]},
                {"id":"c2","name":"Hats","products":[]}
            ]}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn empty_image_string_reads_as_none_and_writes_back_empty() {
        let catalog = seeded();
        let products = catalog.products("b1", "c1").unwrap();
        assert_eq!(products[0].image, None);
        assert_eq!(products[1].image, Some(AssetRef::from_raw("uploads/p2_boot.png")));

        let json = serde_json::to_value(&catalog).unwrap();
        assert_eq!(json["brands"][0]["categories"][0]["products"][0]["image"], "");
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let p: Product = serde_json::from_str(r#"{"id":"p9"}"#).unwrap();
        assert!(p.active);
        assert_eq!(p.image, None);
        assert_eq!(p.title, "");
    }

    #[test]
    fn lookup_reports_first_missing_level() {
        let mut catalog = seeded();
        assert!(matches!(
            catalog.product_mut("nope", "nope", "nope"),
            Err(CatalogError::NotFound(Level::Brand))
        ));
        assert!(matches!(
            catalog.product_mut("b1", "nope", "nope"),
            Err(CatalogError::NotFound(Level::Category))
        ));
        assert!(matches!(
            catalog.product_mut("b1", "c1", "nope"),
            Err(CatalogError::NotFound(Level::Product))
        ));
        assert!(catalog.product_mut("b1", "c1", "p1").is_ok());
    }

    #[test]
    fn apply_patch_only_touches_supplied_fields() {
        let mut catalog = seeded();
        let p = catalog.product_mut("b1", "c1", "p1").unwrap();
        p.apply(ProductPatch {
            name: Patch::Set("RunnerX".into()),
            ..Default::default()
        });
        assert_eq!(p.title, "Runner");
        assert_eq!(p.name, "RunnerX");
        assert!(p.active);
    }

    #[test]
    fn storefront_drops_inactive_and_empty_levels() {
        let mut catalog = seeded();
        catalog.brands.push(Brand::new("Empty"));
        let view = catalog.storefront();
        assert_eq!(view.brands.len(), 1);
        assert_eq!(view.brands[0].categories.len(), 1);
        assert_eq!(view.brands[0].categories[0].products.len(), 1);
        assert_eq!(view.brands[0].categories[0].products[0].id.as_str(), "p1");
    }

    #[test]
    fn check_structure_rejects_duplicate_ids() {
        let mut catalog = seeded();
        assert!(catalog.check_structure().is_ok());
        let dup = catalog.brands[0].categories[0].products[0].clone();
        catalog.brands[0].categories[0].products.push(dup);
        assert!(matches!(catalog.check_structure(), Err(CatalogError::Archive(_))));
    }

    #[test]
    fn asset_ref_relative_path() {
        assert_eq!(AssetRef::for_file("a.png").relative_path(), Some("a.png"));
        assert_eq!(AssetRef::from_raw("uploads/").relative_path(), None);
        assert_eq!(AssetRef::from_raw("static/a.png").relative_path(), None);
    }

    mod proptest_tests {
        use super::*;
        use crate::patch::Patch;
        use proptest::prelude::*;

        /// Active flags per product, per category, per brand.
        fn shape() -> impl Strategy<Value = Vec<Vec<Vec<bool>>>> {
            prop::collection::vec(
                prop::collection::vec(prop::collection::vec(any::<bool>(), 0..5), 0..4),
                0..4,
            )
        }

        fn build(shape: &[Vec<Vec<bool>>]) -> Catalog {
            let brands = shape
                .iter()
                .enumerate()
                .map(|(b, categories)| {
                    let mut brand = Brand::new(format!("brand-{b}"));
                    brand.categories = categories
                        .iter()
                        .enumerate()
                        .map(|(c, flags)| {
                            let mut category = Category::new(format!("category-{c}"));
                            category.products = flags
                                .iter()
                                .map(|active| {
                                    let mut product = Product::create(NewProduct::default());
                                    product.active = *active;
                                    product
                                })
                                .collect();
                            category
                        })
                        .collect();
                    brand
                })
                .collect();
            Catalog { brands }
        }

        proptest! {
            #[test]
            fn storefront_keeps_exactly_the_active_products(shape in shape()) {
                let catalog = build(&shape);
                prop_assert!(catalog.check_structure().is_ok());

                let view = catalog.storefront();
                let active = shape.iter().flatten().flatten().filter(|a| **a).count();
                prop_assert_eq!(view.product_count(), active);
                for brand in &view.brands {
                    prop_assert!(!brand.categories.is_empty());
                    for category in &brand.categories {
                        prop_assert!(!category.products.is_empty());
                        prop_assert!(category.products.iter().all(|p| p.active));
                    }
                }
                prop_assert!(view.check_structure().is_ok());
            }

            #[test]
            fn document_survives_serialization(shape in shape()) {
                let catalog = build(&shape);
                let json = serde_json::to_string(&catalog).unwrap();
                let back: Catalog = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(back, catalog);
            }

            #[test]
            fn patch_replaces_only_supplied_fields(
                title in proptest::option::of(".{0,20}"),
                name in proptest::option::of(".{0,20}"),
                description in proptest::option::of(".{0,40}"),
            ) {
                let mut product = Product::create(NewProduct {
                    title: "Runner".into(),
                    name: "R".into(),
                    description: "fast".into(),
                });
                let before = product.clone();
                product.apply(ProductPatch {
                    title: Patch::from(title.clone()),
                    name: Patch::from(name.clone()),
                    description: Patch::from(description.clone()),
                });

                prop_assert_eq!(&product.title, title.as_ref().unwrap_or(&before.title));
                prop_assert_eq!(&product.name, name.as_ref().unwrap_or(&before.name));
                prop_assert_eq!(&product.description, description.as_ref().unwrap_or(&before.description));
                prop_assert_eq!(&product.id, &before.id);
                prop_assert_eq!(product.active, before.active);
            }
        }
    }
}
