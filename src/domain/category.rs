//! Human-readable labels for Keepa category codes.

/// Known root category codes and their display names.
const CATEGORY_NAMES: [(i64, &str); 30] = [
    (1, "Books"),
    (2, "Movies & TV"),
    (3, "Music"),
    (4, "Video Games"),
    (5, "Electronics"),
    (6, "Camera & Photo"),
    (7, "Computers"),
    (8, "Home & Garden"),
    (9, "Toys & Games"),
    (10, "Sports & Outdoors"),
    (11, "Tools & Home Improvement"),
    (12, "Beauty"),
    (13, "Health & Personal Care"),
    (14, "Office Products"),
    (15, "Pet Supplies"),
    (16, "Automotive"),
    (17, "Industrial & Scientific"),
    (18, "Jewelry"),
    (19, "Baby"),
    (20, "Clothing"),
    (21, "Shoes"),
    (22, "Luggage"),
    (23, "Software"),
    (24, "Cell Phones & Accessories"),
    (25, "Musical Instruments"),
    (26, "Grocery"),
    (27, "Watches"),
    (28, "Patio, Lawn & Garden"),
    (29, "Kindle Store"),
    (30, "Apps & Games"),
];

/// Label used for the primary sales rank when the record has no category tree.
pub const MAIN_CATEGORY_LABEL: &str = "Main Category";

/// Returns the display name for a known category code.
pub fn known_category(code: i64) -> Option<&'static str> {
    CATEGORY_NAMES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| *name)
}

/// Resolves a category code to a label. Unknown codes become `"Category {code}"`.
pub fn resolve_category(code: i64) -> String {
    match known_category(code) {
        Some(name) => name.to_string(),
        None => format!("Category {code}"),
    }
}

/// Resolves a category key as it appears in a sales-rank map.
///
/// Keys are decimal codes in practice; anything else is labelled verbatim.
pub fn resolve_category_key(key: &str) -> String {
    match key.trim().parse::<i64>() {
        Ok(code) => resolve_category(code),
        Err(_) => format!("Category {key}"),
    }
}
