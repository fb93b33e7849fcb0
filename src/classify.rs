// src/classify.rs

/// Default label when no keyword table entry matches.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Localized default used by the KAM price-list source.
pub const DEFAULT_CATEGORY_MK: &str = "Останато";

/// Latin/English keyword table, tested in declared order. First match wins,
/// so broader categories placed earlier shadow later ones (e.g. "milk" hits
/// Groceries before Dairy gets a chance).
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Electronics",
        &[
            "tv",
            "television",
            "phone",
            "smartphone",
            "laptop",
            "computer",
            "tablet",
            "camera",
            "headphone",
        ],
    ),
    (
        "Groceries",
        &[
            "bread", "milk", "cheese", "yogurt", "egg", "cereal", "rice", "pasta", "flour",
            "sugar", "oil",
        ],
    ),
    (
        "Produce",
        &[
            "apple",
            "banana",
            "orange",
            "grape",
            "strawberry",
            "vegetable",
            "tomato",
            "potato",
            "onion",
            "carrot",
        ],
    ),
    (
        "Meat & Seafood",
        &[
            "beef", "chicken", "pork", "fish", "salmon", "shrimp", "meat", "seafood", "steak",
            "ground",
        ],
    ),
    (
        "Dairy",
        &["milk", "cheese", "yogurt", "butter", "cream", "ice cream"],
    ),
    (
        "Bakery",
        &["bread", "cake", "cookie", "pastry", "muffin", "bagel"],
    ),
    (
        "Beverages",
        &[
            "water", "soda", "juice", "coffee", "tea", "drink", "beer", "wine", "alcohol",
        ],
    ),
    (
        "Household",
        &[
            "cleaner",
            "detergent",
            "soap",
            "paper towel",
            "toilet paper",
            "trash bag",
        ],
    ),
    (
        "Personal Care",
        &[
            "shampoo",
            "conditioner",
            "toothpaste",
            "soap",
            "deodorant",
            "razor",
            "lotion",
        ],
    ),
    (
        "Clothing",
        &[
            "shirt",
            "pant",
            "dress",
            "sock",
            "underwear",
            "jacket",
            "sweater",
            "shoe",
        ],
    ),
    (
        "Home & Garden",
        &[
            "furniture", "decor", "plant", "garden", "tool", "bedding", "curtain",
        ],
    ),
    ("Baby", &["diaper", "formula", "baby food", "wipe", "baby"]),
    ("Pet", &["pet food", "dog", "cat", "pet", "litter"]),
    (
        "Toys & Games",
        &["toy", "game", "puzzle", "doll", "action figure"],
    ),
    (
        "Sports & Outdoors",
        &[
            "sport", "outdoor", "exercise", "fitness", "camping", "hiking",
        ],
    ),
];

/// Cyrillic keyword table for the KAM structured price list.
const CATEGORY_KEYWORDS_MK: &[(&str, &[&str])] = &[
    (
        "Хлеб и пекарски производи",
        &["леб", "кифл", "пекар", "тост", "брускет", "пченкар"],
    ),
    (
        "Слатки и бонбони",
        &["чокол", "бонбон", "желе", "торт", "крем", "слатк", "какао"],
    ),
    ("Житарки и мусли", &["житарк", "мусли", "корнфлекс"]),
    ("Тестенини", &["фиде", "тестен"]),
    (
        "Месо и месни производи",
        &["месо", "колбас", "салам", "пршут", "сувомес"],
    ),
    (
        "Млеко и млечни производи",
        &["млеко", "јогурт", "сирењ", "кашкав", "павлак"],
    ),
    (
        "Овошје и зеленчук",
        &["овошј", "зеленчук", "јаболк", "домат", "пипер"],
    ),
    ("Пијалоци", &["пијалок", "сок", "вода", "кафе", "чај"]),
    (
        "Производи за домаќинство",
        &["средство", "чист", "детерг", "перал", "сапун", "шампон"],
    ),
    ("Храна за миленици", &["храна за", "миленич"]),
];

/// Look up the first category whose keyword list matches `text`
/// (case-insensitive substring). Returns `None` when nothing matches,
/// so callers can run their own fallbacks before defaulting.
pub fn match_category(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return Some(category);
        }
    }
    None
}

/// Classify a product name against the Latin keyword table.
pub fn classify(name: &str) -> &'static str {
    match_category(name).unwrap_or(DEFAULT_CATEGORY)
}

/// Classify a product name against the Cyrillic keyword table.
pub fn classify_cyrillic(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS_MK {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return category;
        }
    }
    DEFAULT_CATEGORY_MK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert_eq!(classify("Samsung LAPTOP 15\""), "Electronics");
        assert_eq!(classify("Fresh TOMATO 1kg"), "Produce");
    }

    #[test]
    fn first_declared_category_wins() {
        // "milk" appears in both Groceries and Dairy; Groceries is declared first
        assert_eq!(classify("Whole Milk 1L"), "Groceries");
    }

    #[test]
    fn unknown_name_gets_default() {
        assert_eq!(classify("zzyzx widget"), DEFAULT_CATEGORY);
    }

    #[test]
    fn cyrillic_table_matches_and_defaults() {
        assert_eq!(classify_cyrillic("МЛЕКО 2.8% 1Л"), "Млеко и млечни производи");
        assert_eq!(classify_cyrillic("ЛАЈБИЦИ СЛИБО"), DEFAULT_CATEGORY_MK);
    }
}
