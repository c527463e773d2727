//! BEEP self-assessment scoring and maturity classification.
//!
//! A BEEP assessment is a set of 1-5 ratings, one per catalogue question.
//! The final score is the mean rating over the answered questions on a
//! 0.0-5.0 scale, and the maturity level is a fixed-threshold bucket of that
//! score. All functions here are pure; the caller loads answers and catalogue
//! counts and persists the results.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lowest rating a question can receive.
pub const MIN_RATING: i16 = 1;

/// Highest rating a question can receive.
pub const MAX_RATING: i16 = 5;

/// Upper bound of the final score scale.
pub const MAX_SCORE: f64 = 5.0;

/// Inclusive lower bounds of each maturity level, evaluated highest-first.
pub const THRESHOLD_EVOLUINDO: f64 = 4.3;
pub const THRESHOLD_VALIDANDO_MERCADO: f64 = 3.5;
pub const THRESHOLD_INICIANDO_NEGOCIO: f64 = 2.7;
pub const THRESHOLD_VALIDANDO_PROBLEMAS_SOLUCOES: f64 = 1.9;

/// Assessment lifecycle states (stored in `beep_assessments.status`).
pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_COMPLETED: &str = "completed";

/// All valid assessment status strings.
pub const VALID_ASSESSMENT_STATUSES: &[&str] = &[STATUS_DRAFT, STATUS_COMPLETED];

/// Maturity level strings (stored in `beep_assessments.maturity_level`).
pub const LEVEL_IDEALIZANDO: &str = "idealizando";
pub const LEVEL_VALIDANDO_PROBLEMAS_SOLUCOES: &str = "validando_problemas_solucoes";
pub const LEVEL_INICIANDO_NEGOCIO: &str = "iniciando_negocio";
pub const LEVEL_VALIDANDO_MERCADO: &str = "validando_mercado";
pub const LEVEL_EVOLUINDO: &str = "evoluindo";

/// All valid maturity level strings, lowest first.
pub const VALID_MATURITY_LEVELS: &[&str] = &[
    LEVEL_IDEALIZANDO,
    LEVEL_VALIDANDO_PROBLEMAS_SOLUCOES,
    LEVEL_INICIANDO_NEGOCIO,
    LEVEL_VALIDANDO_MERCADO,
    LEVEL_EVOLUINDO,
];

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

/// A single answer value, guaranteed to be within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub struct Rating(i16);

impl Rating {
    /// Validate a raw rating value.
    pub fn new(value: i16) -> Result<Self, CoreError> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::Validation(format!(
                "Rating must be between {MIN_RATING} and {MAX_RATING}, got {value}"
            )))
        }
    }

    pub fn value(self) -> i16 {
        self.0
    }
}

impl TryFrom<i16> for Rating {
    type Error = CoreError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i16 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Ratings keyed by question id.
pub type AnswerSet = HashMap<DbId, Rating>;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Startup maturity stage derived from a BEEP score.
///
/// Variants are declared lowest-first so the derived `Ord` matches the
/// business ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaturityLevel {
    Idealizando,
    ValidandoProblemasSolucoes,
    IniciandoNegocio,
    ValidandoMercado,
    Evoluindo,
}

impl MaturityLevel {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            LEVEL_IDEALIZANDO => Ok(Self::Idealizando),
            LEVEL_VALIDANDO_PROBLEMAS_SOLUCOES => Ok(Self::ValidandoProblemasSolucoes),
            LEVEL_INICIANDO_NEGOCIO => Ok(Self::IniciandoNegocio),
            LEVEL_VALIDANDO_MERCADO => Ok(Self::ValidandoMercado),
            LEVEL_EVOLUINDO => Ok(Self::Evoluindo),
            _ => Err(CoreError::Validation(format!(
                "Invalid maturity level '{s}'. Must be one of: {}",
                VALID_MATURITY_LEVELS.join(", ")
            ))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idealizando => LEVEL_IDEALIZANDO,
            Self::ValidandoProblemasSolucoes => LEVEL_VALIDANDO_PROBLEMAS_SOLUCOES,
            Self::IniciandoNegocio => LEVEL_INICIANDO_NEGOCIO,
            Self::ValidandoMercado => LEVEL_VALIDANDO_MERCADO,
            Self::Evoluindo => LEVEL_EVOLUINDO,
        }
    }

    /// English display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idealizando => "Idealizing",
            Self::ValidandoProblemasSolucoes => "Validating problems and solutions",
            Self::IniciandoNegocio => "Starting the business",
            Self::ValidandoMercado => "Validating market",
            Self::Evoluindo => "Evolving",
        }
    }
}

/// Lifecycle of an assessment. `Draft` moves to `Completed` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    Draft,
    Completed,
}

impl AssessmentStatus {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_DRAFT => Ok(Self::Draft),
            STATUS_COMPLETED => Ok(Self::Completed),
            _ => Err(CoreError::Validation(format!(
                "Invalid assessment status '{s}'. Must be one of: {}",
                VALID_ASSESSMENT_STATUSES.join(", ")
            ))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => STATUS_DRAFT,
            Self::Completed => STATUS_COMPLETED,
        }
    }
}

/// Which question count an in-progress score is normalized by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreDenominator {
    /// Mean over the answered questions only (the completion-time rule).
    #[default]
    Answered,
    /// Sum divided by the full catalogue; unanswered questions count as 0.
    Catalogue,
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// Score and classification produced when an assessment is scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BeepResult {
    pub final_score: f64,
    pub maturity_level: MaturityLevel,
}

/// Answer progress against the active catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub answered: i64,
    pub total: i64,
    pub percentage: u8,
}

impl Progress {
    /// Whether every catalogue question has an answer.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.answered == self.total
    }
}

/// Sub-score for one category or subcategory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupScore {
    pub group_id: DbId,
    pub answered: usize,
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Mean of `ratings` scaled to the 0-5 range, normalized by `question_count`.
fn scaled_sum<I>(ratings: I, question_count: usize) -> f64
where
    I: IntoIterator<Item = Rating>,
{
    if question_count == 0 {
        return 0.0;
    }
    let sum: i64 = ratings.into_iter().map(|r| i64::from(r.value())).sum();
    let max_possible = question_count as f64 * f64::from(MAX_RATING);
    (sum as f64 / max_possible) * MAX_SCORE
}

/// Compute the final BEEP score over the answered questions.
///
/// Returns `0.0` for an empty set. Full precision is returned; use
/// [`round_for_display`] when presenting it.
pub fn compute_final_score(answers: &AnswerSet) -> f64 {
    scaled_sum(answers.values().copied(), answers.len())
}

/// Map a score to its maturity level using the fixed thresholds.
pub fn classify(score: f64) -> MaturityLevel {
    if score >= THRESHOLD_EVOLUINDO {
        MaturityLevel::Evoluindo
    } else if score >= THRESHOLD_VALIDANDO_MERCADO {
        MaturityLevel::ValidandoMercado
    } else if score >= THRESHOLD_INICIANDO_NEGOCIO {
        MaturityLevel::IniciandoNegocio
    } else if score >= THRESHOLD_VALIDANDO_PROBLEMAS_SOLUCOES {
        MaturityLevel::ValidandoProblemasSolucoes
    } else {
        MaturityLevel::Idealizando
    }
}

/// Score and classify an answer set in one step.
pub fn score_assessment(answers: &AnswerSet) -> BeepResult {
    let final_score = compute_final_score(answers);
    BeepResult {
        final_score,
        maturity_level: classify(final_score),
    }
}

/// Score an in-progress assessment with an explicit denominator.
///
/// With [`ScoreDenominator::Answered`] this equals [`compute_final_score`].
/// With [`ScoreDenominator::Catalogue`] the sum is normalized by
/// `catalogue_total`; if the catalogue is smaller than the answer set (stale
/// count) the answer count is used instead so the result stays within 0-5.
pub fn preview_score(
    answers: &AnswerSet,
    catalogue_total: usize,
    denominator: ScoreDenominator,
) -> f64 {
    match denominator {
        ScoreDenominator::Answered => compute_final_score(answers),
        ScoreDenominator::Catalogue => {
            let count = catalogue_total.max(answers.len());
            scaled_sum(answers.values().copied(), count)
        }
    }
}

/// Round a score to one decimal place for display.
pub fn round_for_display(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

/// Compute per-group sub-scores from `(group_id, rating)` pairs.
///
/// Each group uses the same mean-over-answered rule as the final score.
/// Results are ordered by group id.
pub fn compute_group_scores(ratings: &[(DbId, Rating)]) -> Vec<GroupScore> {
    let mut groups: BTreeMap<DbId, Vec<Rating>> = BTreeMap::new();
    for &(group_id, rating) in ratings {
        groups.entry(group_id).or_default().push(rating);
    }

    groups
        .into_iter()
        .map(|(group_id, values)| {
            let answered = values.len();
            GroupScore {
                group_id,
                answered,
                score: scaled_sum(values, answered),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Compute answer progress. The percentage is 0 when `total` is 0.
pub fn compute_progress(total: i64, answered: i64) -> Progress {
    let percentage = if total > 0 {
        let pct = (answered as f64 / total as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    } else {
        0
    };
    Progress {
        answered,
        total,
        percentage,
    }
}

/// Reject completion unless every catalogue question is answered.
pub fn ensure_completable(progress: &Progress) -> Result<(), CoreError> {
    if progress.total == 0 {
        return Err(CoreError::Validation(
            "The question catalogue is empty; nothing to complete".to_string(),
        ));
    }
    if progress.answered < progress.total {
        return Err(CoreError::Validation(format!(
            "All questions must be answered before completing: {} of {} answered",
            progress.answered, progress.total
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
