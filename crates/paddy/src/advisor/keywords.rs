//! Agricultural topic filter.

/// Words that mark a message as agricultural. Matched as lowercase substrings.
pub const AGRICULTURE_KEYWORDS: [&str; 45] = [
    "crop",
    "farming",
    "agriculture",
    "rice",
    "wheat",
    "irrigation",
    "fertilizer",
    "soil",
    "seed",
    "harvest",
    "yield",
    "plant",
    "cultivation",
    "pesticide",
    "organic",
    "compost",
    "nitrogen",
    "phosphorus",
    "potassium",
    "weather",
    "climate",
    "season",
    "monsoon",
    "drought",
    "flood",
    "pest",
    "disease",
    "fungus",
    "bacteria",
    "virus",
    "insect",
    "weed",
    "herbicide",
    "growth",
    "plantation",
    "field",
    "farm",
    "farmer",
    "agricultural",
    "agronomy",
    "horticulture",
    "livestock",
    "dairy",
    "poultry",
    "aquaculture",
];

/// Leading keywords a backend reply must mention to pass unwrapped.
pub const CORE_KEYWORD_COUNT: usize = 10;

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Whether `message` mentions any agricultural keyword, ignoring case.
pub fn is_agriculture_related(message: &str) -> bool {
    mentions_any(message, &AGRICULTURE_KEYWORDS)
}

/// Whether `reply` mentions one of the core keywords.
pub fn mentions_core_keyword(reply: &str) -> bool {
    mentions_any(reply, &AGRICULTURE_KEYWORDS[..CORE_KEYWORD_COUNT])
}
