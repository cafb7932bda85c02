//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use knotwork_core::models::{Product, ProductImage, Review, Variant};
use knotwork_core::types::VariantId;
use knotwork_core::validation::FieldErrors;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{ProductFilter, ReviewInput};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalCustomer, RequireCustomer, clear_current_customer, login_url};
use crate::state::AppState;

/// Sort options offered on the listing page: (value, label).
pub const SORT_OPTIONS: &[(&str, &str)] = &[
    ("newest", "Newest"),
    ("price_asc", "Price: low to high"),
    ("price_desc", "Price: high to low"),
    ("rating", "Top rated"),
];

// =============================================================================
// Views
// =============================================================================

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

impl ImageView {
    fn from_image(image: &ProductImage, fallback_alt: &str) -> Self {
        Self {
            url: image.url.clone(),
            alt: image.alt.clone().unwrap_or_else(|| fallback_alt.to_string()),
        }
    }
}

/// Product card for grids (listing, home, collections, related).
#[derive(Clone)]
pub struct ProductCardView {
    pub handle: String,
    pub name: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub image: Option<ImageView>,
    pub collection: Option<String>,
    pub sold_out: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        let from_price = product.from_price();
        Self {
            handle: product.handle().to_string(),
            name: product.name.clone(),
            price: if product.variants.iter().map(|v| v.sizes.len()).sum::<usize>() > 1 {
                format!("From {}", from_price.display())
            } else {
                from_price.display()
            },
            compare_at_price: product
                .compare_at_price
                .filter(|p| *p > from_price)
                .map(|p| p.display()),
            image: product
                .featured_image()
                .map(|img| ImageView::from_image(img, &product.name)),
            collection: product
                .collection
                .as_ref()
                .and_then(|c| c.name())
                .map(String::from),
            sold_out: !product.variants.is_empty() && product.total_stock() == 0,
        }
    }
}

/// Size option within the selected color.
#[derive(Clone)]
pub struct SizeView {
    pub id: String,
    pub label: String,
    pub price: String,
    pub stock: u32,
    pub in_stock: bool,
}

/// Color choice on the product page.
#[derive(Clone)]
pub struct VariantView {
    pub id: String,
    pub color: String,
    pub selected: bool,
}

/// Product detail display data.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: String,
    pub handle: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub material: Option<String>,
    pub origin: Option<String>,
    pub collection: Option<String>,
    pub rating: Option<String>,
    pub review_count: u32,
    pub images: Vec<ImageView>,
    pub variants: Vec<VariantView>,
    pub selected_variant_id: String,
    pub selected_color: String,
    pub sizes: Vec<SizeView>,
}

impl ProductDetailView {
    /// Build the view with the requested color selected (first color otherwise).
    fn new(product: &Product, requested: Option<&VariantId>) -> Self {
        let selected: Option<&Variant> = requested
            .and_then(|id| product.variant(id))
            .or_else(|| product.variants.first());

        let mut images: Vec<ImageView> = selected
            .map(|v| v.images.iter().map(|img| ImageView::from_image(img, &product.name)).collect())
            .unwrap_or_default();
        if images.is_empty() {
            images = product
                .images
                .iter()
                .map(|img| ImageView::from_image(img, &product.name))
                .collect();
        }

        Self {
            id: product.id.to_string(),
            handle: product.handle().to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.from_price().display(),
            compare_at_price: product.compare_at_price.map(|p| p.display()),
            material: product.material.clone(),
            origin: product.origin.clone(),
            collection: product
                .collection
                .as_ref()
                .and_then(|c| c.name())
                .map(String::from),
            rating: (product.review_count > 0).then(|| format!("{:.1}", product.average_rating)),
            review_count: product.review_count,
            images,
            variants: product
                .variants
                .iter()
                .map(|v| VariantView {
                    id: v.id.to_string(),
                    color: v.color.clone(),
                    selected: selected.is_some_and(|s| s.id == v.id),
                })
                .collect(),
            selected_variant_id: selected.map(|v| v.id.to_string()).unwrap_or_default(),
            selected_color: selected.map(|v| v.color.clone()).unwrap_or_default(),
            sizes: selected
                .map(|v| {
                    v.sizes
                        .iter()
                        .map(|s| SizeView {
                            id: s.id.to_string(),
                            label: s.label.clone(),
                            price: s.price.display(),
                            stock: s.stock,
                            in_stock: s.in_stock(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

/// Review display data.
#[derive(Clone)]
pub struct ReviewView {
    pub author: String,
    pub stars: String,
    pub comment: String,
    pub date: String,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            author: review.author_name.clone(),
            stars: review.stars(),
            comment: review.comment.clone(),
            date: review
                .created_at
                .map(|d| d.format("%b %-d, %Y").to_string())
                .unwrap_or_default(),
        }
    }
}

// =============================================================================
// Forms & Templates
// =============================================================================

/// Product page query parameters.
#[derive(Debug, Deserialize)]
pub struct ShowQuery {
    pub variant: Option<String>,
}

/// Review form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

impl ReviewForm {
    fn validate(&self) -> std::result::Result<u8, FieldErrors> {
        let rating = self.rating.trim().parse::<i64>().ok();
        let mut errors = FieldErrors::new();
        if rating.is_none() {
            errors.add("rating", "Please choose a rating.");
        }
        errors
            .range("rating", "Rating", rating, 1, 5)
            .require("comment", "Review", &self.comment)
            .length("comment", "Review", &self.comment, 10, 2000);
        errors.into_result()?;
        Ok(rating.and_then(|r| u8::try_from(r).ok()).unwrap_or(5))
    }
}

/// A `<select>` option.
#[derive(Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl OptionView {
    fn new(value: &str, label: &str, current: Option<&str>) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            selected: current == Some(value),
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCardView>,
    pub search: String,
    pub min_price: String,
    pub max_price: String,
    pub collections: Vec<OptionView>,
    pub sort_options: Vec<OptionView>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductDetailView,
    pub reviews: Vec<ReviewView>,
    pub related: Vec<ProductCardView>,
    pub signed_in: bool,
    pub review_form: ReviewForm,
    pub errors: FieldErrors,
    pub review_alert: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Build a listing URL for another page of the same filter.
fn page_url(filter: &ProductFilter, page: u32) -> String {
    let mut params: Vec<(&str, String)> = Vec::new();
    if let Some(v) = &filter.collection {
        params.push(("collection", v.clone()));
    }
    if let Some(v) = &filter.search {
        params.push(("search", v.clone()));
    }
    if let Some(v) = &filter.sort {
        params.push(("sort", v.clone()));
    }
    if let Some(v) = &filter.min_price {
        params.push(("minPrice", v.clone()));
    }
    if let Some(v) = &filter.max_price {
        params.push(("maxPrice", v.clone()));
    }
    params.push(("page", page.to_string()));

    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("/products?{query}")
}

/// Display product listing page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse> {
    let filter = filter.normalized();
    let (page, collections) = tokio::join!(
        state.backend().list_products(&filter),
        state.backend().list_collections(),
    );
    let page = page?;
    let collections = collections
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to load collections for filter"))
        .unwrap_or_default();

    Ok(ProductsIndexTemplate {
        products: page.items.iter().map(ProductCardView::from).collect(),
        search: filter.search.clone().unwrap_or_default(),
        min_price: filter.min_price.clone().unwrap_or_default(),
        max_price: filter.max_price.clone().unwrap_or_default(),
        collections: collections
            .iter()
            .map(|c| OptionView::new(c.handle(), &c.name, filter.collection.as_deref()))
            .collect(),
        sort_options: SORT_OPTIONS
            .iter()
            .map(|(value, label)| OptionView::new(value, label, filter.sort.as_deref()))
            .collect(),
        current_page: page.page,
        total_pages: page.total_pages,
        total: page.total,
        prev_url: page.has_previous().then(|| page_url(&filter, page.page - 1)),
        next_url: page.has_next().then(|| page_url(&filter, page.page + 1)),
    })
}

/// Assemble the product page. Reviews and related products are best-effort.
async fn render_show(
    state: &AppState,
    slug: &str,
    variant: Option<&VariantId>,
    signed_in: bool,
    review_form: ReviewForm,
    errors: FieldErrors,
    review_alert: Option<String>,
) -> Result<ProductShowTemplate> {
    let product = state.backend().get_product(slug).await?;

    let (reviews, related) = tokio::join!(
        state.backend().list_reviews(&product.id),
        state.backend().related_products(&product.id),
    );
    let reviews = reviews
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to load reviews"))
        .unwrap_or_default();
    let related = related
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to load related products"))
        .unwrap_or_default();

    Ok(ProductShowTemplate {
        product: ProductDetailView::new(&product, variant),
        reviews: reviews.iter().map(ReviewView::from).collect(),
        related: related
            .iter()
            .filter(|p| p.id != product.id)
            .take(4)
            .map(ProductCardView::from)
            .collect(),
        signed_in,
        review_form,
        errors,
        review_alert,
    })
}

/// Display product detail page.
#[instrument(skip(state, customer))]
pub async fn show(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Path(slug): Path<String>,
    Query(query): Query<ShowQuery>,
) -> Result<impl IntoResponse> {
    let variant = query.variant.map(VariantId::new);
    render_show(
        &state,
        &slug,
        variant.as_ref(),
        customer.is_some(),
        ReviewForm::default(),
        FieldErrors::new(),
        None,
    )
    .await
}

/// Post a review for a product.
///
/// Validation failures re-render the page with messages and never reach the
/// backend. An expired token signs the customer out.
#[instrument(skip(state, session, customer, form))]
pub async fn create_review(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(customer): RequireCustomer,
    Path(slug): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let rating = match form.validate() {
        Ok(rating) => rating,
        Err(errors) => {
            let page = render_show(&state, &slug, None, true, form, errors, None).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let product = state.backend().get_product(&slug).await?;
    let input = ReviewInput {
        name: customer.name.clone(),
        rating,
        comment: form.comment.trim().to_string(),
    };

    let product_path = format!("/products/{}", urlencoding::encode(&slug));
    match state
        .backend()
        .create_review(&customer.token, &product.id, &slug, &input)
        .await
    {
        Ok(_) => Ok(Redirect::to(&format!("{product_path}#reviews")).into_response()),
        Err(err) if err.is_unauthorized() => {
            clear_current_customer(&session).await?;
            Ok(Redirect::to(&login_url(&product_path, true)).into_response())
        }
        Err(err) if err.status().is_some_and(|s| (400..500).contains(&s)) => {
            let page = render_show(
                &state,
                &slug,
                None,
                true,
                form,
                FieldErrors::new(),
                Some(err.user_message()),
            )
            .await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(err) => Err(AppError::Backend(err)),
    }
}

#[cfg(test)]
mod tests {
    use knotwork_core::models::{Size, Variant};
    use knotwork_core::types::{Price, ProductId, SizeId};

    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Heriz".to_string(),
            slug: "heriz".to_string(),
            variants: vec![
                Variant {
                    id: VariantId::new("v1"),
                    color: "Crimson".to_string(),
                    images: Vec::new(),
                    sizes: vec![Size {
                        id: SizeId::new("s1"),
                        label: "5x8".to_string(),
                        price: Price::from_cents(120_000),
                        stock: 0,
                    }],
                },
                Variant {
                    id: VariantId::new("v2"),
                    color: "Indigo".to_string(),
                    images: Vec::new(),
                    sizes: vec![Size {
                        id: SizeId::new("s2"),
                        label: "8x10".to_string(),
                        price: Price::from_cents(240_000),
                        stock: 3,
                    }],
                },
            ],
            ..Product::default()
        }
    }

    #[test]
    fn test_detail_view_selects_requested_color() {
        let view = ProductDetailView::new(&product(), Some(&VariantId::new("v2")));
        assert_eq!(view.selected_color, "Indigo");
        assert_eq!(view.sizes.len(), 1);
        assert!(view.sizes.iter().all(|s| s.in_stock));
        assert!(view.variants.iter().any(|v| v.id == "v2" && v.selected));
    }

    #[test]
    fn test_detail_view_defaults_to_first_color() {
        let view = ProductDetailView::new(&product(), Some(&VariantId::new("missing")));
        assert_eq!(view.selected_color, "Crimson");
        assert!(view.sizes.iter().all(|s| !s.in_stock));
    }

    #[test]
    fn test_card_shows_from_price() {
        let card = ProductCardView::from(&product());
        assert_eq!(card.price, "From $1,200.00");
        assert!(!card.sold_out);
    }

    #[test]
    fn test_review_form_validation() {
        let form = ReviewForm {
            rating: "7".to_string(),
            comment: "short".to_string(),
        };
        let errors = form.validate().err().unwrap_or_default();
        assert!(errors.has("rating"));
        assert_eq!(errors.get("comment"), Some("Review must be at least 10 characters."));

        let form = ReviewForm {
            rating: "4".to_string(),
            comment: "Thick pile, beautiful colours.".to_string(),
        };
        assert_eq!(form.validate().ok(), Some(4));
    }

    #[test]
    fn test_page_url_keeps_filters() {
        let filter = ProductFilter {
            search: Some("wool rug".to_string()),
            sort: Some("price_asc".to_string()),
            ..ProductFilter::default()
        };
        assert_eq!(
            page_url(&filter, 2),
            "/products?search=wool+rug&sort=price_asc&page=2"
        );
    }
}
