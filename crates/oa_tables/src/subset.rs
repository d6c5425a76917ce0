use crate::dataset::{Dataset, DatasetColumns, SHARING_CLASS_COLUMN};
use oa_core::ArticleRow;
use tracing::debug;

pub const SHARED_ANY_COLUMN: &str = "shared_any";

/// Selection rules for the study subset of the article spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetCriteria {
    pub year_column: String,
    pub min_year: i32,
    pub max_year: i32,
    /// Columns that must read `YES` for a row to be kept
    pub required: Vec<String>,
    /// Labelling columns carried into the subset
    pub keep: Vec<String>,
    /// Columns where any `YES` means the article shared something
    pub shared: Vec<String>,
}

impl Default for SubsetCriteria {
    fn default() -> Self {
        let owned = |cols: &[&str]| cols.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        Self {
            year_column: "YEAR_PUBLISHED".to_string(),
            min_year: 2017,
            max_year: 2022,
            required: owned(&["IS_PRIMARY_RESEARCH_HUMAN", "IS_VISUAL_SEARCH", "IS_EYE_TRACKING"]),
            keep: owned(&[
                "CLAIMED_TO_SHARE",
                "SHARING_LINK",
                "ACTUALLY_SHARED",
                "EXPERIMENT",
                "MATERIALS",
                "CODE",
                "CODEBOOK_GUIDE",
                "BY_FIXATION",
                "BY_TRIAL",
                "BY_PPT",
            ]),
            shared: owned(&[
                "EXPERIMENT",
                "MATERIALS",
                "CODE",
                "CODEBOOK_GUIDE",
                "BY_FIXATION",
                "BY_TRIAL",
                "BY_PPT",
            ]),
        }
    }
}

impl SubsetCriteria {
    pub fn matches(&self, row: &ArticleRow) -> bool {
        let year = row
            .get(&self.year_column)
            .and_then(|y| y.parse::<f64>().ok())
            .map(|y| y as i32);
        let in_range = matches!(year, Some(y) if y >= self.min_year && y <= self.max_year);
        in_range && self.required.iter().all(|c| row.is_yes(c))
    }

    pub fn shared_any(&self, row: &ArticleRow) -> bool {
        self.shared.iter().any(|c| row.is_yes(c))
    }

    /// Filter the dataset down to the study subset and project it onto the
    /// identifying and labelling columns, adding `shared_any`.
    pub fn apply(&self, dataset: &Dataset, columns: &DatasetColumns) -> Dataset {
        let sharing_class = SHARING_CLASS_COLUMN.to_string();
        let mut headers: Vec<String> = vec![columns.link.clone(), columns.title.clone()];
        headers.extend(
            self.keep
                .iter()
                .chain([&sharing_class])
                .filter(|c| dataset.has_column(c))
                .cloned(),
        );
        headers.push(SHARED_ANY_COLUMN.to_string());

        let rows: Vec<ArticleRow> = dataset
            .rows
            .iter()
            .filter(|row| self.matches(row))
            .map(|row| {
                let mut projected = ArticleRow::new(row.index);
                for header in &headers {
                    if let Some(value) = row.values.get(header) {
                        projected.set(header, value.clone());
                    }
                }
                projected.set(SHARED_ANY_COLUMN, self.shared_any(row).to_string());
                projected
            })
            .collect();

        debug!("Study subset kept {} of {} rows", rows.len(), dataset.len());
        Dataset { headers, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
PAPER_LINK,PAPER_TITLE,YEAR_PUBLISHED,IS_PRIMARY_RESEARCH_HUMAN,IS_VISUAL_SEARCH,IS_EYE_TRACKING,CODE,BY_PPT,NOTES
a,A,2016,YES,YES,YES,YES,NO,x
b,B,2017,YES,YES,YES,NO,NO,x
c,C,2022.0,YES,YES,YES,YES,NO,x
d,D,2023,YES,YES,YES,YES,NO,x
e,E,2019,YES,NO,YES,YES,NO,x
f,F,,YES,YES,YES,YES,NO,x
";

    #[test]
    fn test_apply_filters_years_and_flags() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        let subset = SubsetCriteria::default().apply(&dataset, &DatasetColumns::default());

        let links: Vec<&str> = subset.rows.iter().map(|r| r.get("PAPER_LINK").unwrap()).collect();
        assert_eq!(links, vec!["b", "c"]);
        assert_eq!(subset.rows[0].index, 1);
    }

    #[test]
    fn test_apply_projects_columns_and_adds_shared_any() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        let subset = SubsetCriteria::default().apply(&dataset, &DatasetColumns::default());

        assert!(subset.has_column("CODE"));
        assert!(subset.has_column(SHARED_ANY_COLUMN));
        assert!(!subset.has_column("NOTES"));
        assert!(!subset.has_column("MATERIALS"));
        assert_eq!(subset.rows[0].get(SHARED_ANY_COLUMN), Some("false"));
        assert_eq!(subset.rows[1].get(SHARED_ANY_COLUMN), Some("true"));
        assert_eq!(subset.rows[1].get("NOTES"), None);
    }
}
