use crate::adapters::reference::ZipTable;
use crate::domain::model::{MetroQuery, PostalCode};
use std::collections::HashSet;

pub struct ZipResolver {
    table: ZipTable,
}

impl ZipResolver {
    pub fn new(table: ZipTable) -> Self {
        Self { table }
    }

    /// Postal codes for a metro, in table order. No match is an empty result, never an error.
    pub fn resolve(&self, query: &MetroQuery) -> Vec<PostalCode> {
        let codes: Vec<PostalCode> = match query {
            MetroQuery::Code(code) => self
                .table
                .rows()
                .iter()
                .filter(|row| row.msa == *code)
                .map(|row| row.postal_code.clone())
                .collect(),
            MetroQuery::Name(name) => {
                let needle = name.trim().to_uppercase();
                if needle.is_empty() {
                    tracing::warn!("Empty metro name, nothing to resolve");
                    return Vec::new();
                }
                self.table
                    .rows()
                    .iter()
                    .filter(|row| row.addr.to_uppercase().contains(&needle))
                    .map(|row| row.postal_code.clone())
                    .collect()
            }
        };

        tracing::info!("Found {} ZIP codes in {}", codes.len(), query);
        codes
    }

    pub fn all_postal_codes(&self) -> Vec<PostalCode> {
        distinct(self.table.rows().iter().map(|row| row.postal_code.clone()))
    }

    pub fn metro_names(&self) -> Vec<String> {
        distinct(self.table.rows().iter().map(|row| row.addr.clone()))
    }
}

fn distinct<T: Clone + Eq + std::hash::Hash>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
MSA,ZIP,Addr
21940,00601,\"Aguadilla-Isabela, PR\"
21940,00602,\"Aguadilla-Isabela, PR\"
10380,00603,\"Aguadilla-Isabela, PR Metro\"
14460,02108,\"Boston-Cambridge-Newton, MA-NH\"
14460,02108,\"Boston-Cambridge-Newton, MA-NH\"
";

    fn resolver() -> ZipResolver {
        ZipResolver::new(ZipTable::from_reader(TABLE.as_bytes()).unwrap())
    }

    fn strings(codes: Vec<PostalCode>) -> Vec<String> {
        codes.into_iter().map(String::from).collect()
    }

    #[test]
    fn test_resolve_by_code_is_exact() {
        let codes = resolver().resolve(&MetroQuery::parse("21940"));
        assert_eq!(strings(codes), vec!["00601", "00602"]);
    }

    #[test]
    fn test_resolve_by_name_is_case_insensitive_substring() {
        let codes = resolver().resolve(&MetroQuery::parse("aguadilla"));
        assert_eq!(strings(codes), vec!["00601", "00602", "00603"]);
    }

    #[test]
    fn test_resolve_miss_is_empty() {
        assert!(resolver().resolve(&MetroQuery::parse("99999")).is_empty());
        assert!(resolver().resolve(&MetroQuery::parse("atlantis")).is_empty());
        assert!(resolver().resolve(&MetroQuery::parse("   ")).is_empty());
    }

    #[test]
    fn test_all_postal_codes_and_names_are_distinct() {
        let resolver = resolver();
        assert_eq!(
            strings(resolver.all_postal_codes()),
            vec!["00601", "00602", "00603", "02108"]
        );
        assert_eq!(
            resolver.metro_names(),
            vec![
                "Aguadilla-Isabela, PR",
                "Aguadilla-Isabela, PR Metro",
                "Boston-Cambridge-Newton, MA-NH"
            ]
        );
    }
}
