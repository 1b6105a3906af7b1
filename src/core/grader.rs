// src/core/grader.rs

//! Turns check results into a score, and a score into a grade.

use crate::core::models::CheckResult;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Every scan starts here before any check has had its say.
pub const BASELINE_SCORE: i64 = 100;

/// Letter grades, declared worst first so that `Ord` follows quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum Grade {
    #[strum(to_string = "F")]
    #[serde(rename = "F")]
    F,
    #[strum(to_string = "D-")]
    #[serde(rename = "D-")]
    DMinus,
    #[strum(to_string = "D")]
    #[serde(rename = "D")]
    D,
    #[strum(to_string = "D+")]
    #[serde(rename = "D+")]
    DPlus,
    #[strum(to_string = "C-")]
    #[serde(rename = "C-")]
    CMinus,
    #[strum(to_string = "C")]
    #[serde(rename = "C")]
    C,
    #[strum(to_string = "C+")]
    #[serde(rename = "C+")]
    CPlus,
    #[strum(to_string = "B-")]
    #[serde(rename = "B-")]
    BMinus,
    #[strum(to_string = "B")]
    #[serde(rename = "B")]
    B,
    #[strum(to_string = "B+")]
    #[serde(rename = "B+")]
    BPlus,
    #[strum(to_string = "A-")]
    #[serde(rename = "A-")]
    AMinus,
    #[strum(to_string = "A")]
    #[serde(rename = "A")]
    A,
    #[strum(to_string = "A+")]
    #[serde(rename = "A+")]
    APlus,
}

impl Grade {
    /// How likely the host is to be exposed, judged by the grade's letter.
    pub fn likelihood(self) -> Likelihood {
        match self {
            Grade::APlus | Grade::A | Grade::AMinus => Likelihood::Low,
            Grade::BPlus | Grade::B | Grade::BMinus => Likelihood::Medium,
            Grade::CPlus | Grade::C | Grade::CMinus => Likelihood::Medium,
            Grade::DPlus | Grade::D | Grade::DMinus | Grade::F => Likelihood::High,
        }
    }
}

/// Qualitative risk label shown next to the grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Likelihood {
    High,
    Medium,
    Low,
}

/// Lower bound of each grade band, highest first. The last band has no floor.
pub static GRADE_TABLE: &[(i64, Grade)] = &[
    (100, Grade::APlus),
    (95, Grade::A),
    (90, Grade::A),
    (85, Grade::AMinus),
    (80, Grade::BPlus),
    (75, Grade::B),
    (70, Grade::B),
    (65, Grade::BMinus),
    (60, Grade::CPlus),
    (55, Grade::C),
    (50, Grade::C),
    (45, Grade::CMinus),
    (40, Grade::DPlus),
    (35, Grade::D),
    (30, Grade::D),
    (25, Grade::DMinus),
    (0, Grade::F),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeRecord {
    /// The input score, raised to the bottom band's floor if it fell below it.
    pub score: i64,
    pub grade: Grade,
    pub likelihood: Likelihood,
}

/// `100 + Σ score_modifier`. No clamping happens here.
pub fn aggregate_score(results: &[CheckResult]) -> i64 {
    BASELINE_SCORE + results.iter().map(|r| r.score_modifier).sum::<i64>()
}

/// Maps any integer score onto the grade table.
///
/// Scores above the top band stay in the top band; scores below the bottom
/// band's floor fall into the bottom band.
pub fn grade(score: i64) -> GradeRecord {
    let (floor, bottom) = GRADE_TABLE[GRADE_TABLE.len() - 1];
    let grade = GRADE_TABLE
        .iter()
        .find(|(lower, _)| *lower <= score)
        .map(|(_, grade)| *grade)
        .unwrap_or(bottom);

    GradeRecord {
        score: score.max(floor),
        grade,
        likelihood: grade.likelihood(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn modifier(name: &str, score_modifier: i64) -> CheckResult {
        CheckResult {
            score_modifier,
            ..CheckResult::neutral(name)
        }
    }

    #[test]
    fn table_is_strictly_descending_and_never_improves_downwards() {
        for pair in GRADE_TABLE.windows(2) {
            assert!(pair[0].0 > pair[1].0);
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn every_grade_is_reachable() {
        for g in Grade::iter() {
            assert!(GRADE_TABLE.iter().any(|(_, t)| *t == g), "{g} missing from table");
        }
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(grade(100).grade, Grade::APlus);
        assert_eq!(grade(99).grade, Grade::A);
        assert_eq!(grade(90).grade, Grade::A);
        assert_eq!(grade(89).grade, Grade::AMinus);
        assert_eq!(grade(85).grade, Grade::AMinus);
        assert_eq!(grade(84).grade, Grade::BPlus);
        assert_eq!(grade(70).grade, Grade::B);
        assert_eq!(grade(69).grade, Grade::BMinus);
        assert_eq!(grade(45).grade, Grade::CMinus);
        assert_eq!(grade(25).grade, Grade::DMinus);
        assert_eq!(grade(24).grade, Grade::F);
        assert_eq!(grade(0).grade, Grade::F);
    }

    #[test]
    fn out_of_range_scores_clamp_to_the_extremes() {
        for score in [101, 135, 1_000, i64::MAX] {
            assert_eq!(grade(score).grade, Grade::APlus);
            assert_eq!(grade(score).score, score);
        }
        for score in [-1, -50, -1_000, i64::MIN] {
            let record = grade(score);
            assert_eq!(record.grade, Grade::F);
            assert_eq!(record.likelihood, Likelihood::High);
            assert_eq!(record.score, 0);
        }
    }

    #[test]
    fn grading_is_total_and_deterministic() {
        for score in -1_000..=1_000 {
            let first = grade(score);
            let second = grade(score);
            assert_eq!(first, second);
            assert_eq!(first.likelihood, first.grade.likelihood());
            if score >= 0 {
                assert_eq!(first.score, score);
            }
        }
    }

    #[test]
    fn likelihood_follows_the_letter() {
        assert_eq!(grade(100).likelihood, Likelihood::Low);
        assert_eq!(grade(85).likelihood, Likelihood::Low);
        assert_eq!(grade(80).likelihood, Likelihood::Medium);
        assert_eq!(grade(45).likelihood, Likelihood::Medium);
        assert_eq!(grade(44).likelihood, Likelihood::High);
    }

    #[test]
    fn aggregate_of_nothing_is_the_baseline() {
        assert_eq!(aggregate_score(&[]), 100);
    }

    #[test]
    fn aggregate_is_a_plain_sum() {
        let results = vec![
            modifier("a", 0),
            modifier("b", -20),
            modifier("c", 5),
            CheckResult::neutral("d"),
        ];
        assert_eq!(aggregate_score(&results), 85);

        let results = vec![modifier("a", -90), modifier("b", -50)];
        assert_eq!(aggregate_score(&results), -40);

        let results = vec![modifier("a", 5), modifier("b", 5)];
        assert_eq!(aggregate_score(&results), 110);
    }

    #[test]
    fn labels_render_like_the_report() {
        assert_eq!(Grade::APlus.to_string(), "A+");
        assert_eq!(Grade::DMinus.to_string(), "D-");
        assert_eq!(Likelihood::Medium.to_string(), "MEDIUM");
        assert_eq!(serde_json::to_string(&Grade::BPlus).unwrap(), "\"B+\"");
        assert_eq!(serde_json::to_string(&Likelihood::High).unwrap(), "\"HIGH\"");
    }
}
