//! Product route handlers: table, create/edit form, delete and the
//! spreadsheet import.
//!
//! The product form is `multipart/form-data`. Its variant grid is a dynamic
//! list of rows named `variants[i].color` and
//! `variants[i].sizes[j].label|price|stock`; rows left entirely blank are
//! dropped before validation. Saved rows carry their ids in hidden
//! `variants[i].id` and `variants[i].sizes[j].id` fields, kept variant images
//! are checked `variants[i].image` boxes and new ones arrive as
//! `variants[i].images` files.

use std::collections::BTreeMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use knotwork_core::models::{Page, Product, ProductImage};
use knotwork_core::types::{CollectionId, Price, ProductId, ProductStatus, SizeId, VariantId};
use knotwork_core::validation::FieldErrors;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{
    BulkRowError, BulkUploadResult, FileUpload, ProductInput, ProductQuery, SizeInput, VariantInput,
};
use crate::error::Result;
use crate::filters;
use crate::middleware::auth::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::{
    MultipartForm, OptionView, action_failed, failure_alert, failure_status, set_flash, take_flash,
};

/// Most images accepted per product submission.
pub const MAX_PRODUCT_IMAGES: usize = 10;

/// Most new images accepted per variant.
pub const MAX_VARIANT_IMAGES: usize = 5;

/// Row indexes above this are ignored.
const MAX_ROWS: usize = 50;

/// Blank rows appended to the grid for new entries.
const SPARE_SIZE_ROWS: usize = 2;

// =============================================================================
// Variant Rows
// =============================================================================

/// A size row as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeRow {
    /// Backend id; empty for a new row.
    pub id: String,
    pub label: String,
    pub price: String,
    pub stock: String,
}

impl SizeRow {
    fn is_blank(&self) -> bool {
        [&self.label, &self.price, &self.stock]
            .iter()
            .all(|v| v.trim().is_empty())
    }
}

/// A colour row as typed, with its size rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantRow {
    /// Backend id; empty for a new row.
    pub id: String,
    /// Grid index the row was submitted under, which names its uploads.
    pub slot: usize,
    pub color: String,
    /// Existing image URLs still checked.
    pub images: Vec<String>,
    pub sizes: Vec<SizeRow>,
}

/// Where a multipart field name points in the variant grid.
#[derive(Debug, PartialEq, Eq)]
enum GridField<'a> {
    Id(usize),
    Color(usize),
    Image(usize),
    Upload(usize),
    Size(usize, usize, &'a str),
}

fn parse_grid_field(name: &str) -> Option<GridField<'_>> {
    let (variant, rest) = name.strip_prefix("variants[")?.split_once("].")?;
    let variant: usize = variant.parse().ok().filter(|i| *i < MAX_ROWS)?;
    match rest {
        "id" => return Some(GridField::Id(variant)),
        "color" => return Some(GridField::Color(variant)),
        "image" => return Some(GridField::Image(variant)),
        "images" => return Some(GridField::Upload(variant)),
        _ => {}
    }
    let (size, attr) = rest.strip_prefix("sizes[")?.split_once("].")?;
    let size: usize = size.parse().ok().filter(|i| *i < MAX_ROWS)?;
    matches!(attr, "id" | "label" | "price" | "stock")
        .then_some(GridField::Size(variant, size, attr))
}

/// Rebuild the variant grid from multipart fields, in index order, dropping
/// size rows with every typed field blank and colour rows left with nothing.
#[must_use]
pub fn parse_variant_rows(fields: &[(String, String)]) -> Vec<VariantRow> {
    let mut grid: BTreeMap<usize, (VariantRow, BTreeMap<usize, SizeRow>)> = BTreeMap::new();

    for (name, value) in fields {
        let Some(field) = parse_grid_field(name) else {
            continue;
        };
        match field {
            GridField::Id(v) => grid.entry(v).or_default().0.id.clone_from(value),
            GridField::Color(v) => grid.entry(v).or_default().0.color.clone_from(value),
            GridField::Image(v) => {
                if !value.trim().is_empty() {
                    grid.entry(v).or_default().0.images.push(value.trim().to_string());
                }
            }
            GridField::Upload(_) => {}
            GridField::Size(v, s, attr) => {
                let row = grid.entry(v).or_default().1.entry(s).or_default();
                match attr {
                    "id" => row.id.clone_from(value),
                    "label" => row.label.clone_from(value),
                    "price" => row.price.clone_from(value),
                    _ => row.stock.clone_from(value),
                }
            }
        }
    }

    grid.into_iter()
        .map(|(slot, (variant, sizes))| VariantRow {
            slot,
            sizes: sizes.into_values().filter(|s| !s.is_blank()).collect(),
            ..variant
        })
        .filter(|v| !v.color.trim().is_empty() || !v.sizes.is_empty())
        .collect()
}

/// Files uploaded as `variants[i].images`, grouped by grid index.
#[must_use]
pub fn variant_uploads(files: &[(String, FileUpload)]) -> BTreeMap<usize, Vec<FileUpload>> {
    let mut uploads: BTreeMap<usize, Vec<FileUpload>> = BTreeMap::new();
    for (name, file) in files {
        if let Some(GridField::Upload(slot)) = parse_grid_field(name) {
            uploads.entry(slot).or_default().push(file.clone());
        }
    }
    uploads
}

fn optional_id(raw: &str) -> Option<&str> {
    Some(raw.trim()).filter(|id| !id.is_empty())
}

/// Check the grid and convert it to backend input.
fn validate_variants(rows: &[VariantRow], errors: &mut FieldErrors) -> Vec<VariantInput> {
    let mut variants = Vec::with_capacity(rows.len());
    for (vi, row) in rows.iter().enumerate() {
        let n = vi + 1;
        if row.color.trim().is_empty() {
            errors.add("variants", format!("Variant {n}: color is required."));
        }
        if row.sizes.is_empty() {
            errors.add("variants", format!("Variant {n}: add at least one size."));
        }
        let mut sizes = Vec::with_capacity(row.sizes.len());
        for (si, size) in row.sizes.iter().enumerate() {
            let at = format!("Variant {n}, size {}", si + 1);
            if size.label.trim().is_empty() {
                errors.add("variants", format!("{at}: label is required."));
            }
            let price = Price::parse_input(&size.price);
            if price.is_none() {
                errors.add("variants", format!("{at}: price must be a valid amount."));
            }
            let stock = if size.stock.trim().is_empty() {
                Some(0)
            } else {
                size.stock.trim().parse::<u32>().ok()
            };
            if stock.is_none() {
                errors.add("variants", format!("{at}: stock must be a whole number."));
            }
            if let (Some(price), Some(stock)) = (price, stock) {
                sizes.push(SizeInput {
                    id: optional_id(&size.id).map(SizeId::new),
                    label: size.label.trim().to_string(),
                    price,
                    stock,
                });
            }
        }
        variants.push(VariantInput {
            id: optional_id(&row.id).map(VariantId::new),
            color: row.color.trim().to_string(),
            images: row
                .images
                .iter()
                .map(|url| ProductImage {
                    url: url.clone(),
                    alt: None,
                })
                .collect(),
            sizes,
        });
    }
    variants
}

// =============================================================================
// Product Form
// =============================================================================

/// Product form fields echoed back into the template.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub compare_at_price: String,
    pub collection: String,
    pub status: String,
    pub featured: bool,
    pub material: String,
    pub origin: String,
    pub variants: Vec<VariantRow>,
    /// `(id, name)` pairs for the collection select, carried in hidden
    /// fields so a rejected form re-renders without another backend call.
    pub collection_options: Vec<(String, String)>,
    pub existing_images: Vec<String>,
}

impl ProductForm {
    /// Blank form with one empty colour row.
    fn blank(collections: Vec<(String, String)>) -> Self {
        Self {
            status: ProductStatus::Draft.as_str().to_string(),
            collection_options: collections,
            ..Self::default()
        }
    }

    fn from_product(product: &Product, collections: Vec<(String, String)>) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.amount().to_string(),
            compare_at_price: product
                .compare_at_price
                .map(|p| p.amount().to_string())
                .unwrap_or_default(),
            collection: product
                .collection
                .as_ref()
                .map(|c| c.id().to_string())
                .unwrap_or_default(),
            status: product.status.as_str().to_string(),
            featured: product.featured,
            material: product.material.clone().unwrap_or_default(),
            origin: product.origin.clone().unwrap_or_default(),
            variants: product
                .variants
                .iter()
                .enumerate()
                .map(|(slot, v)| VariantRow {
                    id: v.id.to_string(),
                    slot,
                    color: v.color.clone(),
                    images: v.images.iter().map(|i| i.url.clone()).collect(),
                    sizes: v
                        .sizes
                        .iter()
                        .map(|s| SizeRow {
                            id: s.id.to_string(),
                            label: s.label.clone(),
                            price: s.price.amount().to_string(),
                            stock: s.stock.to_string(),
                        })
                        .collect(),
                })
                .collect(),
            collection_options: collections,
            existing_images: product.images.iter().map(|i| i.url.clone()).collect(),
        }
    }

    fn from_multipart(form: &MultipartForm) -> Self {
        Self {
            name: form.text("name"),
            description: form.text("description"),
            price: form.text("price"),
            compare_at_price: form.text("compare_at_price"),
            collection: form.text("collection"),
            status: form.text("status"),
            featured: form.checked("featured"),
            material: form.text("material"),
            origin: form.text("origin"),
            variants: parse_variant_rows(&form.fields),
            collection_options: form
                .texts("collection_option")
                .iter()
                .filter_map(|raw| raw.split_once('|'))
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
            existing_images: form.texts("existing_image"),
        }
    }

    /// Check every field and build the backend payload. `variant_images` holds
    /// the new uploads per grid index, as read by [`variant_uploads`].
    ///
    /// # Errors
    ///
    /// Returns every field that failed validation.
    pub fn validate(
        &self,
        images: Vec<FileUpload>,
        mut variant_images: BTreeMap<usize, Vec<FileUpload>>,
    ) -> std::result::Result<ProductInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors
            .require("name", "Name", &self.name)
            .length("name", "Name", &self.name, 2, 200)
            .length("description", "Description", &self.description, 0, 5000)
            .require("price", "Price", &self.price)
            .length("material", "Material", &self.material, 0, 100)
            .length("origin", "Origin", &self.origin, 0, 100);

        let price = Price::parse_input(&self.price);
        if price.is_none() && !self.price.trim().is_empty() {
            errors.add("price", "Price must be a valid amount.");
        }
        let compare_at_price = if self.compare_at_price.trim().is_empty() {
            None
        } else {
            let parsed = Price::parse_input(&self.compare_at_price);
            if parsed.is_none() {
                errors.add("compare_at_price", "Compare-at price must be a valid amount.");
            }
            parsed
        };
        let status = self.status.parse::<ProductStatus>().unwrap_or_else(|_| {
            errors.add("status", "Choose a status.");
            ProductStatus::Draft
        });

        let variants = validate_variants(&self.variants, &mut errors);

        if images.len() > MAX_PRODUCT_IMAGES {
            errors.add("images", format!("Please attach at most {MAX_PRODUCT_IMAGES} images."));
        }
        let metas: Vec<_> = images.iter().map(FileUpload::meta).collect();
        errors.images("images", &metas);

        let mut new_variant_images = Vec::new();
        for (position, row) in self.variants.iter().enumerate() {
            let uploads = variant_images.remove(&row.slot).unwrap_or_default();
            if uploads.len() > MAX_VARIANT_IMAGES {
                let n = position + 1;
                errors.add(
                    "variants",
                    format!("Variant {n}: attach at most {MAX_VARIANT_IMAGES} images."),
                );
            }
            let metas: Vec<_> = uploads.iter().map(FileUpload::meta).collect();
            errors.images("variants", &metas);
            new_variant_images.extend(uploads.into_iter().map(|file| (position, file)));
        }

        errors.into_result()?;

        Ok(ProductInput {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            price: price.unwrap_or(Price::ZERO),
            compare_at_price,
            collection: Some(self.collection.trim())
                .filter(|c| !c.is_empty())
                .map(CollectionId::new),
            status,
            featured: self.featured,
            material: self.material.trim().to_string(),
            origin: self.origin.trim().to_string(),
            variants,
            images,
            variant_images: new_variant_images,
        })
    }
}

// =============================================================================
// Views
// =============================================================================

/// Size row with its position in the grid.
#[derive(Debug, Clone)]
pub struct SizeRowView {
    pub index: usize,
    pub id: String,
    pub label: String,
    pub price: String,
    pub stock: String,
}

/// Colour row with its position in the grid.
#[derive(Debug, Clone)]
pub struct VariantRowView {
    pub index: usize,
    pub id: String,
    pub color: String,
    pub images: Vec<String>,
    pub sizes: Vec<SizeRowView>,
}

/// Grid rows as rendered: every typed row plus spare blank ones.
#[must_use]
pub fn grid_view(rows: &[VariantRow]) -> Vec<VariantRowView> {
    let blank_variant = VariantRow {
        sizes: vec![SizeRow::default()],
        ..VariantRow::default()
    };
    rows.iter()
        .chain(std::iter::once(&blank_variant))
        .enumerate()
        .map(|(index, row)| {
            let spare = std::iter::repeat_n(SizeRow::default(), SPARE_SIZE_ROWS);
            VariantRowView {
                index,
                id: row.id.clone(),
                color: row.color.clone(),
                images: row.images.clone(),
                sizes: row
                    .sizes
                    .iter()
                    .cloned()
                    .chain(spare)
                    .enumerate()
                    .map(|(index, size)| SizeRowView {
                        index,
                        id: size.id,
                        label: size.label,
                        price: size.price,
                        stock: size.stock,
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Product table row.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: String,
    pub name: String,
    pub handle: String,
    pub status: String,
    pub status_class: String,
    pub price: String,
    pub stock: u32,
    pub image_url: Option<String>,
    pub collection: String,
    pub featured: bool,
}

impl From<&Product> for ProductRowView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            handle: product.handle().to_string(),
            status: product.status.label().to_string(),
            status_class: product.status.badge_class().to_string(),
            price: product.from_price().display(),
            stock: product.total_stock(),
            image_url: product.featured_image().map(|img| img.url.clone()),
            collection: product
                .collection
                .as_ref()
                .and_then(|c| c.name())
                .unwrap_or("")
                .to_string(),
            featured: product.featured,
        }
    }
}

/// Products list page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub products: Vec<ProductRowView>,
    pub search: String,
    pub status_options: Vec<OptionView>,
    pub total: u64,
    pub current_page: u32,
    pub total_pages: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// Product create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub heading: String,
    pub action: String,
    pub form: ProductForm,
    pub grid: Vec<VariantRowView>,
    pub collections: Vec<OptionView>,
    pub status_options: Vec<OptionView>,
    pub errors: FieldErrors,
    pub alert: Option<String>,
    pub max_images: usize,
}

impl ProductFormTemplate {
    fn new(
        admin_user: AdminUserView,
        product_id: Option<&str>,
        form: ProductForm,
        errors: FieldErrors,
        alert: Option<String>,
    ) -> Self {
        let (heading, action) = match product_id {
            Some(id) => (format!("Edit {}", form.name), format!("/products/{id}")),
            None => ("New product".to_string(), "/products".to_string()),
        };
        let collections = std::iter::once(OptionView::new("", "No collection", &form.collection))
            .chain(form.collection_options.iter().map(|(id, name)| {
                OptionView::new(id.as_str(), name.as_str(), &form.collection)
            }))
            .collect();
        let status_options = ProductStatus::ALL
            .iter()
            .map(|s| OptionView::new(s.as_str(), s.label(), &form.status))
            .collect();
        Self {
            admin_user,
            current_path: "/products".to_string(),
            heading,
            action,
            grid: grid_view(&form.variants),
            form,
            collections,
            status_options,
            errors,
            alert,
            max_images: MAX_PRODUCT_IMAGES,
        }
    }
}

/// Spreadsheet import outcome.
#[derive(Debug, Clone)]
pub struct BulkResultView {
    pub created: u32,
    pub updated: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

impl From<BulkUploadResult> for BulkResultView {
    fn from(result: BulkUploadResult) -> Self {
        Self {
            created: result.created,
            updated: result.updated,
            failed: result.failed,
            errors: result.errors.iter().map(BulkRowError::describe).collect(),
        }
    }
}

/// Spreadsheet import page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/upload.html")]
pub struct BulkUploadTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub errors: FieldErrors,
    pub alert: Option<String>,
    pub result: Option<BulkResultView>,
}

// =============================================================================
// Handlers
// =============================================================================

fn page_url(query: &ProductQuery, page: u32) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    if let Some(search) = &query.search {
        serializer.append_pair("search", search);
    }
    if let Some(status) = &query.status {
        serializer.append_pair("status", status);
    }
    if page > 1 {
        serializer.append_pair("page", &page.to_string());
    }
    let qs = serializer.finish();
    if qs.is_empty() {
        "/products".to_string()
    } else {
        format!("/products?{qs}")
    }
}

/// `(id, name)` pairs for the collection select.
async fn collection_choices(state: &AppState, token: &str) -> Result<Vec<(String, String)>> {
    Ok(state
        .backend()
        .list_collections(token)
        .await?
        .into_iter()
        .map(|c| (c.id.into_inner(), c.name))
        .collect())
}

/// Products list page handler.
///
/// GET /products
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ProductQuery>,
) -> Result<ProductsIndexTemplate> {
    let query = query.normalized();
    let page: Page<Product> = state.backend().list_products(&admin.token, &query).await?;

    let current_status = query.status.clone().unwrap_or_default();
    let status_options = std::iter::once(OptionView::new("", "All statuses", &current_status))
        .chain(
            ProductStatus::ALL
                .iter()
                .map(|s| OptionView::new(s.as_str(), s.label(), &current_status)),
        )
        .collect();

    Ok(ProductsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        flash: take_flash(&session).await,
        products: page.items.iter().map(ProductRowView::from).collect(),
        search: query.search.clone().unwrap_or_default(),
        status_options,
        total: page.total,
        current_page: page.page,
        total_pages: page.total_pages,
        prev_url: page.has_previous().then(|| page_url(&query, page.page - 1)),
        next_url: page.has_next().then(|| page_url(&query, page.page + 1)),
    })
}

/// New product form.
///
/// GET /products/new
#[instrument(skip(admin, state))]
pub async fn new(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<ProductFormTemplate> {
    let collections = collection_choices(&state, &admin.token).await?;
    Ok(ProductFormTemplate::new(
        AdminUserView::from(&admin),
        None,
        ProductForm::blank(collections),
        FieldErrors::new(),
        None,
    ))
}

/// Edit product form.
///
/// GET /products/{id}/edit
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ProductFormTemplate> {
    let id = ProductId::new(id);
    let (product, collections) = tokio::join!(
        state.backend().get_product(&admin.token, &id),
        collection_choices(&state, &admin.token),
    );
    let product = product?;
    Ok(ProductFormTemplate::new(
        AdminUserView::from(&admin),
        Some(id.as_str()),
        ProductForm::from_product(&product, collections?),
        FieldErrors::new(),
        None,
    ))
}

/// Create a product.
///
/// POST /products
#[instrument(skip(admin, state, session, multipart))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    save(admin, state, session, None, multipart).await
}

/// Update a product.
///
/// POST /products/{id}
#[instrument(skip(admin, state, session, multipart))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    save(admin, state, session, Some(ProductId::new(id)), multipart).await
}

async fn save(
    admin: CurrentAdmin,
    state: AppState,
    session: Session,
    id: Option<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let body = MultipartForm::read(multipart).await?;
    let form = ProductForm::from_multipart(&body);
    let admin_user = AdminUserView::from(&admin);
    let id_str = id.as_ref().map(ProductId::as_str);

    let input = match form.validate(body.files("images"), variant_uploads(&body.files)) {
        Ok(input) => input,
        Err(errors) => {
            let page = ProductFormTemplate::new(admin_user, id_str, form, errors, None);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let backend = state.backend();
    let result = match &id {
        Some(id) => backend.update_product(&admin.token, id, input).await,
        None => backend.create_product(&admin.token, input).await,
    };

    match result {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product saved");
            let verb = if id.is_some() { "updated" } else { "created" };
            set_flash(&session, &format!("{} {verb}.", product.name)).await;
            Ok(Redirect::to("/products").into_response())
        }
        Err(e) => {
            let alert = failure_alert(&session, &e).await;
            let page = ProductFormTemplate::new(
                admin_user,
                id_str,
                form,
                FieldErrors::new(),
                Some(alert),
            );
            Ok((failure_status(&e), page).into_response())
        }
    }
}

/// Delete a product.
///
/// POST /products/{id}/delete
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let id = ProductId::new(id);
    match state.backend().delete_product(&admin.token, &id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            set_flash(&session, "Product deleted.").await;
            Redirect::to("/products").into_response()
        }
        Err(e) => action_failed(&admin, &session, &e, "/products").await,
    }
}

/// Spreadsheet import form.
///
/// GET /products/upload
pub async fn upload_page(RequireAdminAuth(admin): RequireAdminAuth) -> BulkUploadTemplate {
    BulkUploadTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        errors: FieldErrors::new(),
        alert: None,
        result: None,
    }
}

/// Import products from an `.xlsx` file.
///
/// POST /products/upload
#[instrument(skip(admin, state, session, multipart))]
pub async fn upload(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let body = MultipartForm::read(multipart).await?;
    let file = body.file("file");
    let mut page = BulkUploadTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        errors: FieldErrors::new(),
        alert: None,
        result: None,
    };

    let meta = file.as_ref().map(FileUpload::meta);
    let mut errors = FieldErrors::new();
    errors.spreadsheet("file", meta.as_ref());
    let (Ok(()), Some(file)) = (errors.clone().into_result(), file) else {
        page.errors = errors;
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    };

    match state.backend().bulk_upload_products(&admin.token, file).await {
        Ok(result) => {
            tracing::info!(
                created = result.created,
                updated = result.updated,
                failed = result.failed,
                "Product spreadsheet imported"
            );
            page.result = Some(BulkResultView::from(result));
            Ok(page.into_response())
        }
        Err(e) => {
            page.alert = Some(failure_alert(&session, &e).await);
            Ok((failure_status(&e), page).into_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_grid_field() {
        assert_eq!(parse_grid_field("variants[2].color"), Some(GridField::Color(2)));
        assert_eq!(
            parse_grid_field("variants[0].sizes[3].price"),
            Some(GridField::Size(0, 3, "price"))
        );
        assert_eq!(parse_grid_field("variants[1].id"), Some(GridField::Id(1)));
        assert_eq!(parse_grid_field("variants[1].image"), Some(GridField::Image(1)));
        assert_eq!(parse_grid_field("variants[1].images"), Some(GridField::Upload(1)));
        assert_eq!(
            parse_grid_field("variants[0].sizes[2].id"),
            Some(GridField::Size(0, 2, "id"))
        );
        assert_eq!(parse_grid_field("variants[0].sizes[0].weight"), None);
        assert_eq!(parse_grid_field("variants[x].color"), None);
        assert_eq!(parse_grid_field("variants[999].color"), None);
        assert_eq!(parse_grid_field("name"), None);
    }

    #[test]
    fn test_parse_variant_rows_drops_blank_rows() {
        let rows = parse_variant_rows(&fields(&[
            ("variants[0].color", "Indigo"),
            ("variants[0].sizes[0].label", "5x8"),
            ("variants[0].sizes[0].price", "890"),
            ("variants[0].sizes[0].stock", "2"),
            ("variants[0].sizes[1].label", ""),
            ("variants[0].sizes[1].price", " "),
            ("variants[0].sizes[1].stock", ""),
            ("variants[1].color", ""),
            ("variants[1].sizes[0].label", ""),
            ("variants[1].sizes[0].price", ""),
            ("variants[1].sizes[0].stock", ""),
        ]));
        assert_eq!(
            rows,
            vec![VariantRow {
                color: "Indigo".to_string(),
                sizes: vec![SizeRow {
                    label: "5x8".to_string(),
                    price: "890".to_string(),
                    stock: "2".to_string(),
                    ..SizeRow::default()
                }],
                ..VariantRow::default()
            }]
        );
    }

    #[test]
    fn test_parse_variant_rows_orders_by_index() {
        let rows = parse_variant_rows(&fields(&[
            ("variants[3].color", "Rust"),
            ("variants[3].sizes[0].label", "8x10"),
            ("variants[1].color", "Ivory"),
            ("variants[1].sizes[0].label", "3x5"),
        ]));
        let colors: Vec<&str> = rows.iter().map(|r| r.color.as_str()).collect();
        assert_eq!(colors, vec!["Ivory", "Rust"]);
        let slots: Vec<usize> = rows.iter().map(|r| r.slot).collect();
        assert_eq!(slots, vec![1, 3]);
    }

    #[test]
    fn test_saved_rows_keep_ids_and_images() {
        let rows = parse_variant_rows(&fields(&[
            ("variants[0].id", "v1"),
            ("variants[0].color", "Indigo"),
            ("variants[0].image", "https://cdn.example/indigo-1.jpg"),
            ("variants[0].image", "https://cdn.example/indigo-2.jpg"),
            ("variants[0].sizes[0].id", "s1"),
            ("variants[0].sizes[0].label", "5x8"),
            ("variants[0].sizes[0].price", "890"),
            ("variants[0].sizes[0].stock", "2"),
            ("variants[0].sizes[1].id", "s2"),
            ("variants[0].sizes[1].label", ""),
            ("variants[0].sizes[1].price", ""),
            ("variants[0].sizes[1].stock", ""),
        ]));
        let form = ProductForm {
            name: "Heriz".to_string(),
            price: "1200".to_string(),
            status: "active".to_string(),
            variants: rows,
            ..ProductForm::default()
        };
        let input = form.validate(Vec::new(), BTreeMap::new()).unwrap();

        let variant = input.variants.first().unwrap();
        assert_eq!(variant.id, Some(VariantId::new("v1")));
        assert_eq!(variant.images.len(), 2);
        assert_eq!(variant.images[1].url, "https://cdn.example/indigo-2.jpg");
        assert_eq!(variant.sizes.len(), 1, "a cleared size row is dropped with its id");
        assert_eq!(variant.sizes[0].id, Some(SizeId::new("s1")));
    }

    #[test]
    fn test_variant_uploads_follow_their_row() {
        let jpeg = |name: &str| FileUpload {
            file_name: name.to_string(),
            content_type: Some("image/jpeg".to_string()),
            bytes: vec![0xFF, 0xD8, 0xFF],
        };
        let files = vec![
            ("images".to_string(), jpeg("cover.jpg")),
            ("variants[2].images".to_string(), jpeg("rust.jpg")),
        ];
        let uploads = variant_uploads(&files);
        assert_eq!(uploads.keys().copied().collect::<Vec<_>>(), vec![2]);

        let rows = parse_variant_rows(&fields(&[
            ("variants[0].color", ""),
            ("variants[0].sizes[0].label", ""),
            ("variants[2].color", "Rust"),
            ("variants[2].sizes[0].label", "8x10"),
            ("variants[2].sizes[0].price", "1450"),
        ]));
        let form = ProductForm {
            name: "Heriz".to_string(),
            price: "1200".to_string(),
            status: "active".to_string(),
            variants: rows,
            ..ProductForm::default()
        };
        let input = form.validate(Vec::new(), uploads).unwrap();
        assert_eq!(input.variants.len(), 1);
        let positions: Vec<usize> = input.variant_images.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![0]);
        assert_eq!(input.variant_images[0].1.file_name, "rust.jpg");
    }

    #[test]
    fn test_validate_empty_name() {
        let form = ProductForm {
            price: "1200".to_string(),
            status: "active".to_string(),
            ..ProductForm::default()
        };
        let errors = form.validate(Vec::new(), BTreeMap::new()).unwrap_err();
        assert_eq!(errors.get("name"), Some("Name is required."));
        assert!(!errors.has("price"));
    }

    #[test]
    fn test_validate_variant_errors() {
        let form = ProductForm {
            name: "Heriz".to_string(),
            price: "1200".to_string(),
            status: "active".to_string(),
            variants: vec![VariantRow {
                sizes: vec![SizeRow {
                    label: "5x8".to_string(),
                    price: "abc".to_string(),
                    ..SizeRow::default()
                }],
                ..VariantRow::default()
            }],
            ..ProductForm::default()
        };
        let errors = form.validate(Vec::new(), BTreeMap::new()).unwrap_err();
        assert_eq!(errors.get("variants"), Some("Variant 1: color is required."));
    }

    #[test]
    fn test_validate_builds_input() {
        let form = ProductForm {
            name: " Heriz Wool ".to_string(),
            price: "$1,200".to_string(),
            compare_at_price: "1500".to_string(),
            collection: "c1".to_string(),
            status: "active".to_string(),
            variants: vec![VariantRow {
                color: "Madder".to_string(),
                sizes: vec![SizeRow {
                    label: "6x9".to_string(),
                    price: "1450".to_string(),
                    ..SizeRow::default()
                }],
                ..VariantRow::default()
            }],
            ..ProductForm::default()
        };
        let input = form.validate(Vec::new(), BTreeMap::new()).unwrap();
        assert_eq!(input.name, "Heriz Wool");
        assert_eq!(input.price, Price::from_cents(120_000));
        assert_eq!(input.compare_at_price, Some(Price::from_cents(150_000)));
        assert_eq!(input.collection, Some(CollectionId::new("c1")));
        assert_eq!(input.variants.first().map(|v| v.sizes.len()), Some(1));
        assert_eq!(
            input.variants.first().and_then(|v| v.sizes.first()).map(|s| s.stock),
            Some(0)
        );
    }

    #[test]
    fn test_grid_view_adds_spare_rows() {
        let grid = grid_view(&[VariantRow {
            id: "v1".to_string(),
            color: "Indigo".to_string(),
            sizes: vec![SizeRow::default()],
            ..VariantRow::default()
        }]);
        assert_eq!(grid.first().map(|v| v.id.as_str()), Some("v1"));
        assert_eq!(grid.get(1).map(|v| v.id.as_str()), Some(""));
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.first().map(|v| v.sizes.len()), Some(1 + SPARE_SIZE_ROWS));
        assert_eq!(grid.get(1).map(|v| v.index), Some(1));
    }

    #[test]
    fn test_page_url() {
        let query = ProductQuery {
            search: Some("kilim rug".to_string()),
            status: None,
            page: None,
        };
        assert_eq!(page_url(&query, 2), "/products?search=kilim+rug&page=2");
        assert_eq!(page_url(&ProductQuery::default(), 1), "/products");
    }
}
