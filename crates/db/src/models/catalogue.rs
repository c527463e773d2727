//! BEEP catalogue models: categories, subcategories and questions.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use starthub_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `beep_categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `beep_subcategories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subcategory {
    pub id: DbId,
    pub category_id: DbId,
    pub name: String,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `beep_questions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: DbId,
    pub subcategory_id: DbId,
    pub text: String,
    /// Reference weight. Not used by the final score.
    pub weight: f64,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a category.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

/// DTO for creating a subcategory.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubcategory {
    pub category_id: DbId,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub sort_order: Option<i32>,
}

/// DTO for creating a question. `weight` defaults to 1.0, `is_active` to true.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestion {
    pub subcategory_id: DbId,
    #[validate(length(min = 1))]
    pub text: String,
    #[validate(range(exclusive_min = 0.0))]
    pub weight: Option<f64>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// A subcategory with its active questions, for the catalogue tree.
#[derive(Debug, Clone, Serialize)]
pub struct SubcategoryNode {
    #[serde(flatten)]
    pub subcategory: Subcategory,
    pub questions: Vec<Question>,
}

/// A category with its subcategories, for the catalogue tree.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<SubcategoryNode>,
}

/// Assemble the catalogue tree from flat, already-ordered lists.
///
/// Subcategories and questions whose parent is missing are dropped.
pub fn build_catalogue_tree(
    categories: Vec<Category>,
    subcategories: Vec<Subcategory>,
    questions: Vec<Question>,
) -> Vec<CategoryNode> {
    let mut tree: Vec<CategoryNode> = categories
        .into_iter()
        .map(|category| CategoryNode {
            category,
            subcategories: Vec::new(),
        })
        .collect();

    let mut subs: Vec<SubcategoryNode> = subcategories
        .into_iter()
        .map(|subcategory| SubcategoryNode {
            subcategory,
            questions: Vec::new(),
        })
        .collect();

    for question in questions {
        if let Some(node) = subs
            .iter_mut()
            .find(|s| s.subcategory.id == question.subcategory_id)
        {
            node.questions.push(question);
        }
    }

    for sub in subs {
        if let Some(node) = tree
            .iter_mut()
            .find(|c| c.category.id == sub.subcategory.category_id)
        {
            node.subcategories.push(sub);
        }
    }

    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Timestamp {
        chrono::Utc::now()
    }

    fn category(id: DbId) -> Category {
        Category {
            id,
            name: format!("Category {id}"),
            description: None,
            sort_order: 0,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn subcategory(id: DbId, category_id: DbId) -> Subcategory {
        Subcategory {
            id,
            category_id,
            name: format!("Subcategory {id}"),
            sort_order: 0,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn question(id: DbId, subcategory_id: DbId) -> Question {
        Question {
            id,
            subcategory_id,
            text: format!("Question {id}"),
            weight: 1.0,
            sort_order: 0,
            is_active: true,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn tree_nests_questions_under_parents() {
        let tree = build_catalogue_tree(
            vec![category(1), category(2)],
            vec![subcategory(10, 1), subcategory(11, 1), subcategory(20, 2)],
            vec![question(100, 10), question(101, 10), question(200, 20)],
        );

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].subcategories.len(), 2);
        assert_eq!(tree[0].subcategories[0].questions.len(), 2);
        assert!(tree[0].subcategories[1].questions.is_empty());
        assert_eq!(tree[1].subcategories[0].questions[0].id, 200);
    }

    #[test]
    fn orphans_are_dropped() {
        let tree = build_catalogue_tree(
            vec![category(1)],
            vec![subcategory(10, 99)],
            vec![question(100, 77)],
        );
        assert_eq!(tree.len(), 1);
        assert!(tree[0].subcategories.is_empty());
    }
}
