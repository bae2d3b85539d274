use crate::post::{by_date_desc, Post};

pub const DEFAULT_LIMIT: usize = 3;

const SAME_CATEGORY: u32 = 3;
const PER_SHARED_TAG: u32 = 2;
const ANY_SHARED_TAG: u32 = 1;

/// How closely `candidate` relates to `reference` by category and tags.
pub fn score(reference: &Post, candidate: &Post) -> u32 {
    let mut score = 0;
    if reference.category == candidate.category {
        score += SAME_CATEGORY;
    }

    let shared = reference
        .tags
        .iter()
        .filter(|tag| candidate.tags.contains(tag))
        .count() as u32;
    score += shared * PER_SHARED_TAG;
    if shared > 0 {
        score += ANY_SHARED_TAG;
    }

    score
}

/// Up to `limit` other posts ranked by [`score`], most recent first on ties.
pub fn related_posts<'a>(reference: &Post, candidates: &'a [Post], limit: usize) -> Vec<&'a Post> {
    let mut scored: Vec<(u32, &Post)> = candidates
        .iter()
        .filter(|post| post.slug != reference.slug)
        .map(|post| (score(reference, post), post))
        .collect();

    scored.sort_by(|(a_score, a), (b_score, b)| {
        b_score.cmp(a_score).then_with(|| by_date_desc(a, b))
    });

    scored.into_iter().take(limit).map(|(_, post)| post).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(slug: &str, category: &str, tags: &[&str], date: &str) -> Post {
        Post {
            slug: slug.to_string(),
            title: slug.to_string(),
            date: date.to_string(),
            category: category.to_string(),
            excerpt: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            content: None,
        }
    }

    fn slugs(posts: &[&Post]) -> Vec<String> {
        posts.iter().map(|p| p.slug.clone()).collect()
    }

    #[test]
    fn test_scoring_example() {
        let reference = post("ref", "Compilers", &["Rust", "LLVM"], "2024-01-01");
        let a = post("a", "Compilers", &["Rust"], "2023-01-01");
        let b = post("b", "Tools", &["Rust", "LLVM"], "2024-06-01");

        assert_eq!(score(&reference, &a), 6);
        assert_eq!(score(&reference, &b), 5);

        let candidates = vec![a, b];
        assert_eq!(slugs(&related_posts(&reference, &candidates, 2)), vec!["a", "b"]);
    }

    #[test]
    fn test_reference_excluded() {
        let reference = post("ref", "Compilers", &["Rust"], "2024-01-01");
        let candidates = vec![
            reference.clone(),
            post("other", "Misc", &[], "2020-01-01"),
        ];
        let related = related_posts(&reference, &candidates, 5);
        assert_eq!(slugs(&related), vec!["other"]);
    }

    #[test]
    fn test_ties_prefer_recent() {
        let reference = post("ref", "Rust", &[], "2024-01-01");
        let candidates = vec![
            post("old", "Rust", &[], "2022-01-01"),
            post("new", "Rust", &[], "2024-03-01"),
            post("unrelated", "Go", &[], "2025-01-01"),
        ];
        assert_eq!(
            slugs(&related_posts(&reference, &candidates, DEFAULT_LIMIT)),
            vec!["new", "old", "unrelated"]
        );
    }

    #[test]
    fn test_limit_and_small_pool() {
        let reference = post("ref", "Rust", &[], "2024-01-01");
        let candidates: Vec<Post> = (0..5)
            .map(|i| post(&format!("p{}", i), "Rust", &[], &format!("2024-01-0{}", i + 1)))
            .collect();
        assert_eq!(related_posts(&reference, &candidates, 3).len(), 3);
        assert_eq!(related_posts(&reference, &candidates[..1], 3).len(), 1);
        assert!(related_posts(&reference, &[], 3).is_empty());
    }

    #[test]
    fn test_zero_scores_still_returned() {
        let reference = post("ref", "A", &["x"], "2024-01-01");
        let candidates = vec![post("b", "B", &["y"], "2024-01-01")];
        assert_eq!(slugs(&related_posts(&reference, &candidates, 3)), vec!["b"]);
    }
}
