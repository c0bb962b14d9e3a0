//! Column ordering for the lead table.
//!
//! Missing ratings and review counts always sort after present ones,
//! whichever direction is asked for. Equal keys fall back to name order.
use leadscout_common::Lead;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum SortError {
    #[error("unknown sort key '{0}' (expected name, rating, reviews or website)")]
    Key(String),
    #[error("unknown sort order '{0}' (expected asc or desc)")]
    Order(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Name,
    Rating,
    Reviews,
    Website,
}

impl FromStr for SortKey {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "rating" => Ok(Self::Rating),
            "reviews" | "review_count" => Ok(Self::Reviews),
            "website" | "has_website" => Ok(Self::Website),
            other => Err(SortError::Key(other.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Rating => "rating",
            Self::Reviews => "reviews",
            Self::Website => "website",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeadSort {
    pub key: SortKey,
    pub descending: bool,
}

impl LeadSort {
    pub fn new(key: SortKey, descending: bool) -> Self {
        Self { key, descending }
    }

    /// Parse query-string style input: `sort=rating&order=desc`.
    pub fn parse(key: &str, order: Option<&str>) -> Result<Self, SortError> {
        let descending = match order.map(|o| o.trim().to_ascii_lowercase()) {
            None => false,
            Some(o) if o.is_empty() || o == "asc" => false,
            Some(o) if o == "desc" => true,
            Some(o) => return Err(SortError::Order(o)),
        };
        Ok(Self::new(key.parse()?, descending))
    }

    pub fn apply(&self, leads: &mut [Lead]) {
        leads.sort_by(|a, b| self.compare(a, b));
    }

    pub fn compare(&self, a: &Lead, b: &Lead) -> Ordering {
        let primary = match self.key {
            SortKey::Name => self.directed(by_name(a, b)),
            SortKey::Rating => self.missing_last(a.rating, b.rating, |x, y| x.total_cmp(&y)),
            SortKey::Reviews => self.missing_last(a.review_count, b.review_count, |x, y| x.cmp(&y)),
            SortKey::Website => self.directed(a.has_website.cmp(&b.has_website)),
        };
        primary.then_with(|| by_name(a, b))
    }

    fn directed(&self, ord: Ordering) -> Ordering {
        if self.descending { ord.reverse() } else { ord }
    }

    fn missing_last<T: Copy>(
        &self,
        a: Option<T>,
        b: Option<T>,
        cmp: impl Fn(T, T) -> Ordering,
    ) -> Ordering {
        match (a, b) {
            (Some(x), Some(y)) => self.directed(cmp(x, y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

fn by_name(a: &Lead, b: &Lead) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadscout_common::LeadFields;

    fn lead(name: &str, rating: Option<f64>, reviews: Option<u32>, site: bool) -> Lead {
        Lead::new(LeadFields {
            name: name.into(),
            rating,
            review_count: reviews,
            website: site.then(|| format!("https://{name}.example")),
            ..Default::default()
        })
    }

    fn names(leads: &[Lead]) -> Vec<&str> {
        leads.iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn parses_keys_and_orders() {
        assert_eq!(
            LeadSort::parse("review_count", Some("DESC")).unwrap(),
            LeadSort::new(SortKey::Reviews, true)
        );
        assert_eq!(LeadSort::parse("has_website", None).unwrap().key, SortKey::Website);
        assert!(matches!(LeadSort::parse("distance", None), Err(SortError::Key(_))));
        assert!(matches!(LeadSort::parse("name", Some("up")), Err(SortError::Order(_))));
    }

    #[test]
    fn missing_ratings_sort_last_both_ways() {
        let mut leads = vec![
            lead("c", None, None, false),
            lead("a", Some(3.0), None, false),
            lead("b", Some(4.5), None, false),
        ];
        LeadSort::new(SortKey::Rating, false).apply(&mut leads);
        assert_eq!(names(&leads), vec!["a", "b", "c"]);
        LeadSort::new(SortKey::Rating, true).apply(&mut leads);
        assert_eq!(names(&leads), vec!["b", "a", "c"]);
    }

    #[test]
    fn ties_break_by_name() {
        let mut leads = vec![
            lead("zeta", Some(4.0), Some(10), true),
            lead("Alpha", Some(4.0), Some(10), true),
            lead("mid", Some(4.0), Some(10), false),
        ];
        LeadSort::new(SortKey::Website, true).apply(&mut leads);
        assert_eq!(names(&leads), vec!["Alpha", "zeta", "mid"]);
        LeadSort::new(SortKey::Reviews, true).apply(&mut leads);
        assert_eq!(names(&leads), vec!["Alpha", "mid", "zeta"]);
    }

    #[test]
    fn name_sort_ignores_case() {
        let mut leads = vec![lead("bravo", None, None, false), lead("Alpha", None, None, false)];
        LeadSort::default().apply(&mut leads);
        assert_eq!(names(&leads), vec!["Alpha", "bravo"]);
        LeadSort::new(SortKey::Name, true).apply(&mut leads);
        assert_eq!(names(&leads), vec!["bravo", "Alpha"]);
    }
}
