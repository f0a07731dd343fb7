//! Constant-time document lookup and category metadata (spec.md §4.9).

use std::collections::HashMap;

use crate::document::{Category, CategoryId, Document, Language};

/// Aggregate statistics over the catalog's documents.
#[derive(Debug, Clone, Default)]
pub struct CatalogStats {
    pub total_documents: usize,
    pub by_language: HashMap<Language, usize>,
    pub by_category: HashMap<CategoryId, usize>,
}

/// In-memory, read-only index over the ingested [`Document`]s and the
/// fixed [`Category`] taxonomy.
///
/// Built once from the documents manifest and kept for the process
/// lifetime alongside the [`crate::document::VectorIndex`]; both are
/// immutable, so sharing a reference across concurrent queries needs no
/// locking (spec.md §5).
pub struct DocumentCatalog {
    documents: Vec<Document>,
    by_id: HashMap<String, usize>,
    by_category: HashMap<CategoryId, Vec<usize>>,
    categories: HashMap<CategoryId, Category>,
}

impl DocumentCatalog {
    /// Build a catalog from the full document list and category metadata.
    pub fn new(documents: Vec<Document>, categories: Vec<Category>) -> Self {
        let mut by_id = HashMap::with_capacity(documents.len());
        let mut by_category: HashMap<CategoryId, Vec<usize>> = HashMap::new();

        for (i, doc) in documents.iter().enumerate() {
            by_id.insert(doc.id.clone(), i);
            by_category.entry(doc.category).or_default().push(i);
        }

        let categories = categories.into_iter().map(|c| (c.id, c)).collect();

        Self { documents, by_id, by_category, categories }
    }

    /// Look up a document by id.
    pub fn by_id(&self, document_id: &str) -> Option<&Document> {
        self.by_id.get(document_id).map(|&i| &self.documents[i])
    }

    /// All documents in a category, in ingestion order.
    pub fn by_category(&self, category: CategoryId) -> Vec<&Document> {
        self.by_category
            .get(&category)
            .map(|indices| indices.iter().map(|&i| &self.documents[i]).collect())
            .unwrap_or_default()
    }

    /// The bilingual display name for a category id, falling back to the
    /// raw id string if the category is unknown to this catalog.
    pub fn category_name(&self, category: CategoryId, language: Language) -> String {
        match self.categories.get(&category) {
            Some(c) => match language {
                Language::Uk => c.name_uk.clone(),
                Language::En => c.name_en.clone(),
            },
            None => category.as_str().to_string(),
        }
    }

    /// Case-insensitive substring search over `title` and `filename`,
    /// optionally restricted to one language.
    pub fn search(&self, query: &str, language: Option<Language>) -> Vec<&Document> {
        let needle = query.to_lowercase();
        self.documents
            .iter()
            .filter(|d| language.map_or(true, |l| d.language == l))
            .filter(|d| {
                d.title.to_lowercase().contains(&needle) || d.filename.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Aggregate statistics over all documents.
    pub fn stats(&self) -> CatalogStats {
        let mut by_language = HashMap::new();
        let mut by_category = HashMap::new();
        for doc in &self.documents {
            *by_language.entry(doc.language).or_insert(0) += 1;
            *by_category.entry(doc.category).or_insert(0) += 1;
        }
        CatalogStats { total_documents: self.documents.len(), by_language, by_category }
    }

    /// The total number of documents in the catalog.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the catalog holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::test_helpers;

    fn doc_with(id: &str, category: CategoryId, language: Language, title: &str) -> Document {
        let mut d = test_helpers::document(id, category);
        d.language = language;
        d.title = title.to_string();
        d
    }

    fn sample_categories() -> Vec<Category> {
        vec![Category {
            id: CategoryId::Safety,
            name_uk: "Безпека".to_string(),
            name_en: "Safety".to_string(),
            icon: "shield".to_string(),
            description_uk: String::new(),
            description_en: String::new(),
            document_count: 0,
        }]
    }

    #[test]
    fn by_id_finds_known_and_none_for_unknown() {
        let docs = vec![doc_with("doc_a", CategoryId::Safety, Language::En, "Fire Safety Policy")];
        let catalog = DocumentCatalog::new(docs, sample_categories());
        assert_eq!(catalog.by_id("doc_a").unwrap().id, "doc_a");
        assert!(catalog.by_id("doc_z").is_none());
    }

    #[test]
    fn by_category_preserves_ingestion_order() {
        let docs = vec![
            doc_with("doc_a", CategoryId::Safety, Language::En, "A"),
            doc_with("doc_b", CategoryId::Dormitories, Language::En, "B"),
            doc_with("doc_c", CategoryId::Safety, Language::En, "C"),
        ];
        let catalog = DocumentCatalog::new(docs, sample_categories());
        let safety: Vec<&str> = catalog.by_category(CategoryId::Safety).iter().map(|d| d.id.as_str()).collect();
        assert_eq!(safety, vec!["doc_a", "doc_c"]);
    }

    #[test]
    fn category_name_uses_requested_language() {
        let docs = vec![doc_with("doc_a", CategoryId::Safety, Language::En, "A")];
        let catalog = DocumentCatalog::new(docs, sample_categories());
        assert_eq!(catalog.category_name(CategoryId::Safety, Language::En), "Safety");
        assert_eq!(catalog.category_name(CategoryId::Safety, Language::Uk), "Безпека");
    }

    #[test]
    fn category_name_falls_back_to_raw_id_when_unknown() {
        let catalog = DocumentCatalog::new(vec![], vec![]);
        assert_eq!(
            catalog.category_name(CategoryId::Dormitories, Language::En),
            CategoryId::Dormitories.as_str()
        );
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_filename() {
        let docs = vec![doc_with("doc_a", CategoryId::Safety, Language::En, "Fire Safety Policy")];
        let catalog = DocumentCatalog::new(docs, sample_categories());
        let results = catalog.search("FIRE", None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "doc_a");
        assert!(catalog.search("nonexistent", None).is_empty());
    }

    #[test]
    fn search_restricts_to_requested_language() {
        let docs = vec![
            doc_with("doc_a", CategoryId::Safety, Language::En, "Policy"),
            doc_with("doc_b", CategoryId::Safety, Language::Uk, "Policy"),
        ];
        let catalog = DocumentCatalog::new(docs, sample_categories());
        let results = catalog.search("policy", Some(Language::Uk));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "doc_b");
    }

    #[test]
    fn stats_counts_by_language_and_category() {
        let docs = vec![
            doc_with("doc_a", CategoryId::Safety, Language::En, "A"),
            doc_with("doc_b", CategoryId::Safety, Language::Uk, "B"),
            doc_with("doc_c", CategoryId::Dormitories, Language::En, "C"),
        ];
        let catalog = DocumentCatalog::new(docs, sample_categories());
        let stats = catalog.stats();
        assert_eq!(stats.total_documents, 3);
        assert_eq!(stats.by_language[&Language::En], 2);
        assert_eq!(stats.by_language[&Language::Uk], 1);
        assert_eq!(stats.by_category[&CategoryId::Safety], 2);
        assert_eq!(stats.by_category[&CategoryId::Dormitories], 1);
    }

    #[test]
    fn len_and_is_empty_reflect_document_count() {
        let catalog = DocumentCatalog::new(vec![], vec![]);
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);

        let docs = vec![doc_with("doc_a", CategoryId::Safety, Language::En, "A")];
        let catalog = DocumentCatalog::new(docs, sample_categories());
        assert!(!catalog.is_empty());
        assert_eq!(catalog.len(), 1);
    }
}
