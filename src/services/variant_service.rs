//! Validation and planning for product variants (color × size).
//!
//! Everything here is pure: the query layer asks this module what to do and
//! then performs the writes inside its own transaction.

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::{
    error::{AppError, Result},
    models::{ColorInput, ProductColor, ProductPayload, ProductSize, SizeInput},
};

pub const MAX_PRODUCT_NAME_LEN: usize = 255;
pub const MAX_CATEGORY_LEN: usize = 64;
pub const MAX_COLOR_NAME_LEN: usize = 64;
pub const MAX_SIZE_LABEL_LEN: usize = 16;
/// Largest value a `NUMERIC(12,2)` money column holds.
pub const MAX_MONEY: Decimal = rust_decimal::prelude::dec!(9999999999.99);

/// Derived product fields kept in sync with the sizes table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub min_price: Decimal,
    pub is_available: bool,
}

impl Pricing {
    /// `min_price` is the lowest size price (zero when there are no sizes),
    /// `is_available` is whether any size has stock.
    pub fn from_sizes<'a>(sizes: impl IntoIterator<Item = &'a SizeInput>) -> Self {
        let mut min_price: Option<Decimal> = None;
        let mut is_available = false;

        for size in sizes {
            min_price = Some(match min_price {
                Some(current) => current.min(size.price),
                None => size.price,
            });
            is_available |= size.stock > 0;
        }

        Self {
            min_price: min_price.unwrap_or(Decimal::ZERO),
            is_available,
        }
    }

    pub fn from_colors(colors: &[ColorInput]) -> Self {
        Self::from_sizes(
            colors
                .iter()
                .flat_map(|c| c.sizes.as_deref().unwrap_or_default()),
        )
    }
}

/// Fields a product must have at creation, borrowed from a validated payload.
#[derive(Debug)]
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub audience: &'a str,
    pub product_type: &'a str,
    pub is_active: bool,
    pub images: &'a [String],
    pub colors: &'a [ColorInput],
    pub pricing: Pricing,
}

pub fn validate_new_product(payload: &ProductPayload) -> Result<NewProduct<'_>> {
    let name = required_text(payload.name.as_deref(), "name", MAX_PRODUCT_NAME_LEN)?;
    let audience = required_text(payload.audience.as_deref(), "audience", MAX_CATEGORY_LEN)?;
    let product_type =
        required_text(payload.product_type.as_deref(), "product_type", MAX_CATEGORY_LEN)?;

    let colors = payload
        .colors
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("At least one color is required".to_string()))?;

    for color in colors {
        if color.sizes.as_ref().is_none_or(|s| s.is_empty()) {
            return Err(AppError::BadRequest(format!(
                "Color '{}' must have at least one size",
                color.name
            )));
        }
        if color.id.is_some() {
            return Err(AppError::BadRequest(
                "New products cannot reference existing color ids".to_string(),
            ));
        }
    }

    validate_colors(colors)?;
    validate_images(payload.images.as_deref().unwrap_or_default())?;

    Ok(NewProduct {
        name,
        description: payload.description.as_deref(),
        audience,
        product_type,
        is_active: payload.is_active.unwrap_or(true),
        images: payload.images.as_deref().unwrap_or_default(),
        colors,
        pricing: Pricing::from_colors(colors),
    })
}

pub fn validate_update(payload: &ProductPayload) -> Result<()> {
    if let Some(name) = payload.name.as_deref() {
        required_text(Some(name), "name", MAX_PRODUCT_NAME_LEN)?;
    }
    if let Some(audience) = payload.audience.as_deref() {
        required_text(Some(audience), "audience", MAX_CATEGORY_LEN)?;
    }
    if let Some(product_type) = payload.product_type.as_deref() {
        required_text(Some(product_type), "product_type", MAX_CATEGORY_LEN)?;
    }
    if let Some(images) = payload.images.as_deref() {
        validate_images(images)?;
    }
    if let Some(colors) = payload.colors.as_deref() {
        if colors.is_empty() {
            return Err(AppError::BadRequest(
                "At least one color is required".to_string(),
            ));
        }
        validate_colors(colors)?;
    }

    Ok(())
}

fn required_text<'a>(value: Option<&'a str>, field: &str, max_len: usize) -> Result<&'a str> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{} is required", field)))?;

    check_length(value, field, max_len)?;

    Ok(value)
}

/// Lengths are counted in characters, matching `VARCHAR(n)`.
fn check_length(value: &str, field: &str, max_len: usize) -> Result<()> {
    if value.chars().count() > max_len {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}

fn check_money(value: Decimal, field: &str, color: &str, label: &str) -> Result<()> {
    if value > MAX_MONEY {
        return Err(AppError::BadRequest(format!(
            "{} must not exceed {} for {} / {}",
            field, MAX_MONEY, color, label
        )));
    }
    Ok(())
}

fn validate_images(images: &[String]) -> Result<()> {
    if images.iter().any(|url| url.trim().is_empty()) {
        return Err(AppError::BadRequest("Image URLs cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_colors(colors: &[ColorInput]) -> Result<()> {
    let mut names = HashSet::new();
    let mut ids = HashSet::new();

    for color in colors {
        let name = color.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Color name is required".to_string()));
        }
        check_length(name, "Color name", MAX_COLOR_NAME_LEN)?;
        if !names.insert(name.to_lowercase()) {
            return Err(AppError::BadRequest(format!(
                "Duplicate color '{}'",
                name
            )));
        }
        if let Some(id) = color.id {
            if !ids.insert(id) {
                return Err(AppError::BadRequest(format!(
                    "Color id {} appears more than once",
                    id
                )));
            }
        }
        if let Some(hex) = color.hex_code.as_deref() {
            if !is_hex_color(hex) {
                return Err(AppError::BadRequest(format!(
                    "Invalid hex code '{}' for color '{}'",
                    hex, name
                )));
            }
        }
        if let Some(images) = color.images.as_deref() {
            validate_images(images)?;
        }
        if let Some(sizes) = color.sizes.as_deref() {
            if sizes.is_empty() {
                return Err(AppError::BadRequest(format!(
                    "Color '{}' must have at least one size",
                    name
                )));
            }
            validate_sizes(name, sizes)?;
        }
    }

    Ok(())
}

fn validate_sizes(color: &str, sizes: &[SizeInput]) -> Result<()> {
    let mut labels = HashSet::new();

    for size in sizes {
        let label = normalize_size_label(&size.size);
        if label.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Size label is required for color '{}'",
                color
            )));
        }
        check_length(&label, "Size label", MAX_SIZE_LABEL_LEN)?;
        if !labels.insert(label.clone()) {
            return Err(AppError::BadRequest(format!(
                "Duplicate size '{}' for color '{}'",
                label, color
            )));
        }
        if size.price.is_sign_negative() || size.stock < 0 {
            return Err(AppError::BadRequest(format!(
                "Price and stock must be non-negative for {} / {}",
                color, label
            )));
        }
        check_money(size.price, "Price", color, &label)?;
        if let Some(cost_price) = size.cost_price {
            check_money(cost_price, "Cost price", color, &label)?;
        }
        if let Some(mrp) = size.mrp {
            check_money(mrp, "MRP", color, &label)?;
        }
        if size.cost_price.is_some_and(|c| c.is_sign_negative()) {
            return Err(AppError::BadRequest(format!(
                "Cost price must be non-negative for {} / {}",
                color, label
            )));
        }
        if let Some(mrp) = size.mrp {
            if mrp.is_sign_negative() {
                return Err(AppError::BadRequest(format!(
                    "MRP must be non-negative for {} / {}",
                    color, label
                )));
            }
            if mrp > Decimal::ZERO && size.price > mrp {
                return Err(AppError::BadRequest(format!(
                    "Price exceeds MRP for {} / {}",
                    color, label
                )));
            }
        }
    }

    Ok(())
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Size labels are stored trimmed and upper-cased so "xl " and "XL" match.
pub fn normalize_size_label(label: &str) -> String {
    label.trim().to_uppercase()
}

#[derive(Debug, PartialEq)]
pub enum ColorAction<'a> {
    Update { id: i32, input: &'a ColorInput },
    Create { input: &'a ColorInput },
}

#[derive(Debug)]
pub struct ColorPlan<'a> {
    /// One action per incoming color, in payload order.
    pub actions: Vec<ColorAction<'a>>,
    /// Stored colors absent from the payload.
    pub removed: Vec<i32>,
}

/// Matches incoming colors to stored ones by id only. A color without an id
/// is always new; an id that does not belong to this product is rejected so
/// a reordered payload can never hand one color's rows to another.
pub fn plan_colors<'a>(
    existing: &[ProductColor],
    incoming: &'a [ColorInput],
) -> Result<ColorPlan<'a>> {
    let existing_ids: HashSet<i32> = existing.iter().map(|c| c.id).collect();
    let mut kept = HashSet::new();
    let mut actions = Vec::with_capacity(incoming.len());

    for input in incoming {
        match input.id {
            Some(id) if existing_ids.contains(&id) => {
                kept.insert(id);
                actions.push(ColorAction::Update { id, input });
            }
            Some(id) => {
                return Err(AppError::BadRequest(format!(
                    "Color {} does not belong to this product",
                    id
                )));
            }
            None => actions.push(ColorAction::Create { input }),
        }
    }

    let removed = existing
        .iter()
        .map(|c| c.id)
        .filter(|id| !kept.contains(id))
        .collect();

    Ok(ColorPlan { actions, removed })
}

/// Stored sizes of one color whose label no longer appears in the payload.
pub fn removed_sizes(existing: &[ProductSize], incoming: &[SizeInput]) -> Vec<i32> {
    let labels: HashSet<String> = incoming
        .iter()
        .map(|s| normalize_size_label(&s.size))
        .collect();

    existing
        .iter()
        .filter(|s| !labels.contains(&normalize_size_label(&s.size)))
        .map(|s| s.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn size(label: &str, price: Decimal, stock: i32) -> SizeInput {
        SizeInput {
            size: label.to_string(),
            mrp: None,
            price,
            stock,
            cost_price: None,
        }
    }

    fn color(id: Option<i32>, name: &str, sizes: Vec<SizeInput>) -> ColorInput {
        ColorInput {
            id,
            name: name.to_string(),
            sizes: Some(sizes),
            ..Default::default()
        }
    }

    fn stored_color(id: i32, name: &str) -> ProductColor {
        ProductColor {
            id,
            product_id: 1,
            name: name.to_string(),
            hex_code: None,
            sort_order: 0,
        }
    }

    fn stored_size(id: i32, label: &str) -> ProductSize {
        ProductSize {
            id,
            color_id: 1,
            size: label.to_string(),
            sku: format!("SKU-{}", id),
            mrp: Decimal::ZERO,
            price: dec!(100),
            stock: 1,
            cost_price: None,
        }
    }

    fn new_payload(colors: Vec<ColorInput>) -> ProductPayload {
        ProductPayload {
            name: Some("Classic Tee".to_string()),
            audience: Some("men".to_string()),
            product_type: Some("t-shirt".to_string()),
            colors: Some(colors),
            ..Default::default()
        }
    }

    #[test]
    fn red_example_prices_at_cheapest_size_and_is_available() {
        let payload = new_payload(vec![color(
            None,
            "Red",
            vec![size("S", dec!(400), 0), size("M", dec!(300), 5)],
        )]);

        let product = validate_new_product(&payload).unwrap();

        assert_eq!(product.pricing.min_price, dec!(300));
        assert!(product.pricing.is_available);
    }

    #[test]
    fn min_price_spans_every_color() {
        let colors = vec![
            color(None, "Red", vec![size("S", dec!(499), 0)]),
            color(None, "Blue", vec![size("S", dec!(520), 0), size("L", dec!(450.5), 0)]),
        ];

        let pricing = Pricing::from_colors(&colors);

        assert_eq!(pricing.min_price, dec!(450.5));
        assert!(!pricing.is_available);
    }

    #[test]
    fn pricing_without_sizes_is_zero_and_unavailable() {
        let pricing = Pricing::from_sizes(&Vec::<SizeInput>::new());
        assert_eq!(pricing.min_price, Decimal::ZERO);
        assert!(!pricing.is_available);
    }

    #[test]
    fn create_requires_name_type_and_audience() {
        let mut payload = new_payload(vec![color(None, "Red", vec![size("S", dec!(1), 1)])]);
        payload.audience = Some("   ".to_string());

        let err = validate_new_product(&payload).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("audience")));
    }

    #[test]
    fn text_fields_respect_column_lengths() {
        let mut payload = new_payload(vec![color(None, "Red", vec![size("S", dec!(1), 1)])]);
        payload.name = Some("n".repeat(MAX_PRODUCT_NAME_LEN));
        assert!(validate_new_product(&payload).is_ok());

        payload.name = Some("n".repeat(MAX_PRODUCT_NAME_LEN + 1));
        let err = validate_new_product(&payload).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("name")));

        let long_color = "c".repeat(MAX_COLOR_NAME_LEN + 1);
        let payload = new_payload(vec![color(None, &long_color, vec![size("S", dec!(1), 1)])]);
        assert!(validate_new_product(&payload).is_err());

        let long_label = "L".repeat(MAX_SIZE_LABEL_LEN + 1);
        let payload = new_payload(vec![color(None, "Red", vec![size(&long_label, dec!(1), 1)])]);
        assert!(validate_new_product(&payload).is_err());

        let update = ProductPayload {
            product_type: Some("t".repeat(MAX_CATEGORY_LEN + 1)),
            ..Default::default()
        };
        assert!(validate_update(&update).is_err());
    }

    #[test]
    fn money_must_fit_the_price_columns() {
        let payload = new_payload(vec![color(None, "Red", vec![size("S", MAX_MONEY, 1)])]);
        assert!(validate_new_product(&payload).is_ok());

        let payload = new_payload(vec![color(
            None,
            "Red",
            vec![size("S", dec!(10000000000), 1)],
        )]);
        assert!(validate_new_product(&payload).is_err());

        let mut oversized_cost = size("S", dec!(10), 1);
        oversized_cost.cost_price = Some(dec!(99999999999));
        let payload = new_payload(vec![color(None, "Red", vec![oversized_cost])]);
        assert!(validate_new_product(&payload).is_err());
    }

    #[test]
    fn create_requires_a_size_per_color() {
        let payload = new_payload(vec![
            color(None, "Red", vec![size("S", dec!(1), 1)]),
            ColorInput {
                name: "Blue".to_string(),
                ..Default::default()
            },
        ]);

        assert!(validate_new_product(&payload).is_err());
    }

    #[test]
    fn create_rejects_empty_color_list() {
        let payload = new_payload(vec![]);
        assert!(validate_new_product(&payload).is_err());
    }

    #[test]
    fn duplicate_color_names_are_rejected_case_insensitively() {
        let payload = new_payload(vec![
            color(None, "Red", vec![size("S", dec!(1), 1)]),
            color(None, "red ", vec![size("S", dec!(1), 1)]),
        ]);

        assert!(validate_new_product(&payload).is_err());
    }

    #[test]
    fn duplicate_size_labels_are_rejected_after_normalizing() {
        let payload = new_payload(vec![color(
            None,
            "Red",
            vec![size("xl", dec!(1), 1), size(" XL", dec!(2), 1)],
        )]);

        assert!(validate_new_product(&payload).is_err());
    }

    #[test]
    fn price_above_mrp_is_rejected() {
        let mut s = size("M", dec!(500), 1);
        s.mrp = Some(dec!(400));
        let payload = new_payload(vec![color(None, "Red", vec![s])]);

        assert!(validate_new_product(&payload).is_err());
    }

    #[test]
    fn zero_mrp_does_not_cap_price() {
        let mut s = size("M", dec!(500), 1);
        s.mrp = Some(Decimal::ZERO);
        let payload = new_payload(vec![color(None, "Red", vec![s])]);

        assert!(validate_new_product(&payload).is_ok());
    }

    #[test]
    fn hex_codes_are_checked() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#A1B2C3"));
        assert!(!is_hex_color("A1B2C3"));
        assert!(!is_hex_color("#GGGGGG"));
    }

    #[test]
    fn update_allows_partial_payload() {
        let payload = ProductPayload {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(validate_update(&payload).is_ok());
    }

    #[test]
    fn update_rejects_emptying_colors() {
        let payload = ProductPayload {
            colors: Some(vec![]),
            ..Default::default()
        };
        assert!(validate_update(&payload).is_err());
    }

    #[test]
    fn update_rejects_repeated_color_id() {
        let payload = ProductPayload {
            colors: Some(vec![
                color(Some(4), "Red", vec![size("S", dec!(1), 1)]),
                color(Some(4), "Blue", vec![size("S", dec!(1), 1)]),
            ]),
            ..Default::default()
        };
        assert!(validate_update(&payload).is_err());
    }

    #[test]
    fn plan_updates_by_id_and_creates_without_id() {
        let existing = vec![stored_color(10, "Red"), stored_color(11, "Blue")];
        let incoming = vec![
            color(Some(10), "Crimson", vec![]),
            color(None, "Green", vec![]),
        ];

        let plan = plan_colors(&existing, &incoming).unwrap();

        assert_eq!(
            plan.actions,
            vec![
                ColorAction::Update {
                    id: 10,
                    input: &incoming[0]
                },
                ColorAction::Create { input: &incoming[1] },
            ]
        );
        assert_eq!(plan.removed, vec![11]);
    }

    #[test]
    fn plan_never_matches_by_position_or_name() {
        let existing = vec![stored_color(10, "Red"), stored_color(11, "Blue")];
        let incoming = vec![color(None, "Blue", vec![]), color(None, "Red", vec![])];

        let plan = plan_colors(&existing, &incoming).unwrap();

        assert!(
            plan.actions
                .iter()
                .all(|a| matches!(a, ColorAction::Create { .. }))
        );
        assert_eq!(plan.removed, vec![10, 11]);
    }

    #[test]
    fn plan_rejects_foreign_color_id() {
        let existing = vec![stored_color(10, "Red")];
        let incoming = vec![color(Some(99), "Red", vec![])];

        assert!(plan_colors(&existing, &incoming).is_err());
    }

    #[test]
    fn removed_sizes_compares_normalized_labels() {
        let existing = vec![stored_size(1, "S"), stored_size(2, "M"), stored_size(3, "XL")];
        let incoming = vec![size("s", dec!(1), 0), size(" xl", dec!(1), 0)];

        assert_eq!(removed_sizes(&existing, &incoming), vec![2]);
    }
}
