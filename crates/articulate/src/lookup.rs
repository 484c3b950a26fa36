//! Queries over a finished dataset: equivalents of one receiving course, or
//! every mapping from one sending institution.

use crate::types::EquivalencyTriple;

/// What to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Every sending course accepted for this receiving course.
    Course(String),
    /// Every mapping offered by this sending institution.
    College(String),
}

impl Lookup {
    /// Exact match on the queried field.
    pub fn matches(&self, triple: &EquivalencyTriple) -> bool {
        match self {
            Lookup::Course(course) => triple.receiving_course == *course,
            Lookup::College(college) => triple.sending_institution == *college,
        }
    }

    /// Column names for the two fields shown per match.
    pub fn columns(&self) -> [&'static str; 2] {
        match self {
            Lookup::Course(_) => ["cc_name", "cc_course"],
            Lookup::College(_) => ["b_course", "cc_course"],
        }
    }

    /// The two shown fields of `triple`, in `columns` order.
    pub fn project<'a>(&self, triple: &'a EquivalencyTriple) -> [&'a str; 2] {
        match self {
            Lookup::Course(_) => [triple.sending_institution.as_str(), triple.sending_course.as_str()],
            Lookup::College(_) => [triple.receiving_course.as_str(), triple.sending_course.as_str()],
        }
    }

    /// Matching triples, in dataset order.
    pub fn run<'a>(&self, triples: &'a [EquivalencyTriple]) -> Vec<&'a EquivalencyTriple> {
        triples.iter().filter(|t| self.matches(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Vec<EquivalencyTriple> {
        vec![
            EquivalencyTriple::new("CS 61A", "De Anza College", "CIS 22A"),
            EquivalencyTriple::new("CS 61A", "Foothill College", "CS 3A"),
            EquivalencyTriple::new("MATH 1B", "Foothill College", "MATH 1C"),
        ]
    }

    #[test]
    fn test_lookup_by_course() {
        let data = dataset();
        let query = Lookup::Course("CS 61A".to_string());
        let rows: Vec<[&str; 2]> = query.run(&data).into_iter().map(|t| query.project(t)).collect();
        assert_eq!(rows, vec![["De Anza College", "CIS 22A"], ["Foothill College", "CS 3A"]]);
        assert_eq!(query.columns(), ["cc_name", "cc_course"]);
    }

    #[test]
    fn test_lookup_by_college() {
        let data = dataset();
        let query = Lookup::College("Foothill College".to_string());
        let rows: Vec<[&str; 2]> = query.run(&data).into_iter().map(|t| query.project(t)).collect();
        assert_eq!(rows, vec![["CS 61A", "CS 3A"], ["MATH 1B", "MATH 1C"]]);
        assert_eq!(query.columns(), ["b_course", "cc_course"]);
    }

    #[test]
    fn test_lookup_is_exact() {
        let data = dataset();
        assert!(Lookup::Course("cs 61a".to_string()).run(&data).is_empty());
        assert!(Lookup::College("Foothill".to_string()).run(&data).is_empty());
    }
}
