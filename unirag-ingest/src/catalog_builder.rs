//! Builds the `categories.json` artifact: the fixed twelve-category
//! taxonomy, enriched with bilingual display metadata and a document count
//! computed from the documents manifest.

use unirag_core::artifacts::CategoriesFile;
use unirag_core::document::{Category, CategoryId, Document};

/// Bilingual display metadata for one category, independent of how many
/// documents happen to land in it during a given run.
struct CategorySeed {
    id: CategoryId,
    name_uk: &'static str,
    name_en: &'static str,
    icon: &'static str,
    description_uk: &'static str,
    description_en: &'static str,
}

const SEEDS: [CategorySeed; 12] = [
    CategorySeed {
        id: CategoryId::GeneralOperations,
        name_uk: "Загальна діяльність",
        name_en: "General Operations",
        icon: "building",
        description_uk: "Положення про загальну організацію роботи університету.",
        description_en: "Regulations governing the university's general operations.",
    },
    CategorySeed {
        id: CategoryId::AntiCorruption,
        name_uk: "Антикорупційна діяльність",
        name_en: "Anti-Corruption",
        icon: "scale",
        description_uk: "Антикорупційні політики та процедури.",
        description_en: "Anti-corruption policies and procedures.",
    },
    CategorySeed {
        id: CategoryId::AcademicCouncil,
        name_uk: "Вчена рада",
        name_en: "Academic Council",
        icon: "gavel",
        description_uk: "Положення про діяльність вченої ради.",
        description_en: "Regulations governing the academic council.",
    },
    CategorySeed {
        id: CategoryId::StructuralDivisions,
        name_uk: "Структурні підрозділи",
        name_en: "Structural Divisions",
        icon: "sitemap",
        description_uk: "Положення про факультети, кафедри та інші підрозділи.",
        description_en: "Regulations governing faculties, departments, and other divisions.",
    },
    CategorySeed {
        id: CategoryId::EducationalProcess,
        name_uk: "Освітній процес",
        name_en: "Educational Process",
        icon: "book",
        description_uk: "Положення про організацію навчання та атестацію.",
        description_en: "Regulations governing teaching and assessment.",
    },
    CategorySeed {
        id: CategoryId::ScientificWork,
        name_uk: "Наукова робота",
        name_en: "Scientific Work",
        icon: "flask",
        description_uk: "Положення про наукову та дослідницьку діяльність.",
        description_en: "Regulations governing research activity.",
    },
    CategorySeed {
        id: CategoryId::FinancialActivities,
        name_uk: "Фінансова діяльність",
        name_en: "Financial Activities",
        icon: "coins",
        description_uk: "Положення про фінанси та матеріальне забезпечення.",
        description_en: "Regulations governing finance and material support.",
    },
    CategorySeed {
        id: CategoryId::InformationActivities,
        name_uk: "Інформаційна діяльність",
        name_en: "Information Activities",
        icon: "broadcast",
        description_uk: "Положення про інформаційну політику та комунікації.",
        description_en: "Regulations governing information policy and communications.",
    },
    CategorySeed {
        id: CategoryId::SocialCivic,
        name_uk: "Соціально-громадська діяльність",
        name_en: "Social & Civic Activity",
        icon: "people",
        description_uk: "Положення про соціальну підтримку та громадську діяльність.",
        description_en: "Regulations governing social support and civic activity.",
    },
    CategorySeed {
        id: CategoryId::Dormitories,
        name_uk: "Гуртожитки",
        name_en: "Dormitories",
        icon: "home",
        description_uk: "Положення про проживання у студентських гуртожитках.",
        description_en: "Regulations governing residence in student dormitories.",
    },
    CategorySeed {
        id: CategoryId::HrManagement,
        name_uk: "Кадрова робота",
        name_en: "HR Management",
        icon: "badge",
        description_uk: "Положення про кадрову політику та трудові відносини.",
        description_en: "Regulations governing personnel policy and employment.",
    },
    CategorySeed {
        id: CategoryId::Safety,
        name_uk: "Безпека",
        name_en: "Safety",
        icon: "shield",
        description_uk: "Положення про охорону праці та безпеку.",
        description_en: "Regulations governing occupational safety.",
    },
];

/// Build the `categories.json` contents from the fixed taxonomy and the
/// per-category document counts found in `documents`.
///
/// Documents assigned [`CategoryId::Uncategorized`] are counted but do not
/// appear in the emitted category list — `uncategorized` is a fallback id,
/// not a thirteenth taxonomy entry.
pub fn build_categories(documents: &[Document], generated_at: &str) -> CategoriesFile {
    let categories: Vec<Category> = SEEDS
        .iter()
        .map(|seed| {
            let document_count = documents.iter().filter(|d| d.category == seed.id).count();
            Category {
                id: seed.id,
                name_uk: seed.name_uk.to_string(),
                name_en: seed.name_en.to_string(),
                icon: seed.icon.to_string(),
                description_uk: seed.description_uk.to_string(),
                description_en: seed.description_en.to_string(),
                document_count,
            }
        })
        .collect();

    CategoriesFile {
        version: "1".to_string(),
        generated_at: generated_at.to_string(),
        total_categories: categories.len(),
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unirag_core::document::{DocumentType, Language};

    fn doc(category: CategoryId) -> Document {
        Document {
            id: format!("doc_{}", category.as_str()),
            title: "Title".to_string(),
            filename: "f.pdf".to_string(),
            source_url: "https://example.test/f.pdf".to_string(),
            category,
            language: Language::En,
            doc_type: DocumentType::Pdf,
            downloaded: true,
            download_error: None,
            download_date: None,
        }
    }

    #[test]
    fn builds_all_twelve_categories_with_counts() {
        let docs = vec![doc(CategoryId::Safety), doc(CategoryId::Safety), doc(CategoryId::Dormitories)];
        let file = build_categories(&docs, "2026-01-01T00:00:00Z");
        assert_eq!(file.total_categories, 12);
        assert_eq!(file.categories.len(), 12);

        let safety = file.categories.iter().find(|c| c.id == CategoryId::Safety).unwrap();
        assert_eq!(safety.document_count, 2);

        let dorms = file.categories.iter().find(|c| c.id == CategoryId::Dormitories).unwrap();
        assert_eq!(dorms.document_count, 1);

        let general = file.categories.iter().find(|c| c.id == CategoryId::GeneralOperations).unwrap();
        assert_eq!(general.document_count, 0);
    }

    #[test]
    fn uncategorized_documents_are_excluded_from_the_taxonomy_list() {
        let docs = vec![doc(CategoryId::Uncategorized)];
        let file = build_categories(&docs, "2026-01-01T00:00:00Z");
        assert!(file.categories.iter().all(|c| c.id != CategoryId::Uncategorized));
        assert_eq!(file.total_categories, 12);
    }

    #[test]
    fn every_category_has_bilingual_names() {
        let file = build_categories(&[], "2026-01-01T00:00:00Z");
        for category in &file.categories {
            assert!(!category.name_uk.is_empty());
            assert!(!category.name_en.is_empty());
        }
    }
}
