use crate::types::Category;

/// Classifies AI output by its first line. The first taxonomy label found in
/// that line wins; anything unrecognised, including error placeholders,
/// falls through to `Other`.
pub fn classify(ai_output: &str) -> Category {
    let first_line = ai_output
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    Category::ALL
        .into_iter()
        .find(|category| first_line.contains(&category.label().to_lowercase()))
        .unwrap_or(Category::Other)
}
