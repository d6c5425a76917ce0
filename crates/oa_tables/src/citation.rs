//! Citation impact normalisation.
//!
//! The mean normalised citation score (MNCS) of a work is its citation count
//! divided by the mean citation count of works published in the same year.
//! A proper MNCS also normalises by field against the whole database; this
//! only normalises within the works handed in, so values are only comparable
//! inside one dataset.

use oa_core::WorkMetadata;
use std::collections::HashMap;

/// MNCS for each work, in input order. Retracted works, works whose
/// retraction status is unknown and works missing a year or citation count
/// get `None`.
pub fn mean_normalized_citation_scores(works: &[&WorkMetadata]) -> Vec<Option<f64>> {
    let eligible = |w: &WorkMetadata| -> Option<(i32, f64)> {
        if w.is_retracted != Some(false) {
            return None;
        }
        let year = w
            .publication_year
            .or_else(|| w.publication_date.map(|d| chrono::Datelike::year(&d)))?;
        Some((year, w.total_citations? as f64))
    };

    let mut per_year: HashMap<i32, (f64, usize)> = HashMap::new();
    for (year, citations) in works.iter().filter_map(|w| eligible(*w)) {
        let entry = per_year.entry(year).or_insert((0.0, 0));
        entry.0 += citations;
        entry.1 += 1;
    }

    works
        .iter()
        .map(|w| {
            let (year, citations) = eligible(*w)?;
            let (total, count) = per_year.get(&year)?;
            let mean = total / *count as f64;
            (mean > 0.0).then(|| citations / mean)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(year: i32, citations: u64, retracted: Option<bool>) -> WorkMetadata {
        WorkMetadata {
            publication_year: Some(year),
            total_citations: Some(citations),
            is_retracted: retracted,
            ..Default::default()
        }
    }

    #[test]
    fn test_normalises_within_year() {
        let works = [
            work(2018, 10, Some(false)),
            work(2018, 30, Some(false)),
            work(2019, 5, Some(false)),
        ];
        let refs: Vec<&WorkMetadata> = works.iter().collect();
        let scores = mean_normalized_citation_scores(&refs);
        assert_eq!(scores, vec![Some(0.5), Some(1.5), Some(1.0)]);
    }

    #[test]
    fn test_retracted_and_unknown_are_excluded() {
        let works = [
            work(2018, 10, Some(false)),
            work(2018, 1000, Some(true)),
            work(2018, 50, None),
        ];
        let refs: Vec<&WorkMetadata> = works.iter().collect();
        let scores = mean_normalized_citation_scores(&refs);
        assert_eq!(scores, vec![Some(1.0), None, None]);
    }

    #[test]
    fn test_uncited_year_has_no_score() {
        let works = [work(2020, 0, Some(false)), work(2020, 0, Some(false))];
        let refs: Vec<&WorkMetadata> = works.iter().collect();
        assert_eq!(mean_normalized_citation_scores(&refs), vec![None, None]);
    }
}
