//! Response Scoring
//!
//! Pure conversion of per-control answers into weighted domain and overall
//! percentages plus gap tallies. N/A answers are dropped before any
//! arithmetic. Only NO counts as a gap; PARTIAL shows up per domain.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::catalog::{Control, RiskLevel};
use super::value_objects::Answer;

/// One answered control
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub control: &'a Control,
    pub answer: Answer,
}

impl<'a> ScoringInput<'a> {
    pub fn new(control: &'a Control, answer: Answer) -> Self {
        Self { control, answer }
    }
}

/// Per-domain sub-score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub domain_number: u8,
    pub total_points: Decimal,
    pub earned_points: Decimal,
    pub percentage: Decimal,
    pub controls_assessed: usize,
    pub gap_count: usize,
    pub partial_count: usize,
    pub na_count: usize,
}

impl DomainScore {
    fn empty(domain_number: u8) -> Self {
        Self {
            domain_number,
            total_points: Decimal::ZERO,
            earned_points: Decimal::ZERO,
            percentage: Decimal::ZERO,
            controls_assessed: 0,
            gap_count: 0,
            partial_count: 0,
            na_count: 0,
        }
    }
}

/// NO answers bucketed by risk level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl GapCounts {
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }

    fn record(&mut self, risk: RiskLevel) {
        match risk {
            RiskLevel::Critical => self.critical += 1,
            RiskLevel::High => self.high += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::Low => self.low += 1,
        }
    }
}

/// Scoring result written onto a finalized assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub overall_score: Decimal,
    pub domain_scores: Vec<DomainScore>,
    pub gaps: GapCounts,
    pub total_controls_assessed: usize,
}

/// Stateless scoring engine
pub struct ScoringService;

impl ScoringService {
    pub fn score(inputs: &[ScoringInput<'_>]) -> ScoreSummary {
        let mut domains: BTreeMap<u8, DomainScore> = BTreeMap::new();
        let mut gaps = GapCounts::default();
        let mut total_available = Decimal::ZERO;
        let mut total_earned = Decimal::ZERO;
        let mut assessed = 0;

        for input in inputs {
            let control = input.control;
            let domain = domains
                .entry(control.domain_number)
                .or_insert_with(|| DomainScore::empty(control.domain_number));

            if input.answer == Answer::Na {
                domain.na_count += 1;
                continue;
            }

            let weight = weight_of(control);
            let max_points = Decimal::from(control.points_yes) * weight;
            let earned = Decimal::from(control.points_for(input.answer)) * weight;

            domain.total_points += max_points;
            domain.earned_points += earned;
            domain.controls_assessed += 1;
            total_available += max_points;
            total_earned += earned;
            assessed += 1;

            match input.answer {
                Answer::No => {
                    domain.gap_count += 1;
                    gaps.record(control.risk_level);
                }
                Answer::Partial => domain.partial_count += 1,
                Answer::Yes | Answer::Na => {}
            }
        }

        let domain_scores = domains
            .into_values()
            .map(|mut d| {
                d.percentage = percentage(d.earned_points, d.total_points);
                d
            })
            .collect();

        ScoreSummary {
            overall_score: percentage(total_earned, total_available),
            domain_scores,
            gaps,
            total_controls_assessed: assessed,
        }
    }
}

fn weight_of(control: &Control) -> Decimal {
    // Catalog validation guarantees a finite positive weight.
    Decimal::from_f64(control.weight_multiplier).unwrap_or(Decimal::ONE)
}

/// `earned / available * 100` to two places, or zero when nothing is available
pub fn percentage(earned: Decimal, available: Decimal) -> Decimal {
    if available.is_zero() {
        return Decimal::ZERO;
    }
    round2(earned / available * Decimal::ONE_HUNDRED)
}

/// Round half-up at the hundredths place
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::ControlSource;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn control(id: &str, domain: u8, risk: RiskLevel, yes: u32, partial: u32) -> Control {
        Control::new(id, ControlSource::Pdpl, domain, "test", risk, yes, partial).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_empty_input() {
        let summary = ScoringService::score(&[]);
        assert_eq!(summary.overall_score, Decimal::ZERO);
        assert!(summary.domain_scores.is_empty());
        assert_eq!(summary.gaps.total(), 0);
        assert_eq!(summary.total_controls_assessed, 0);
    }

    #[test]
    fn test_only_na_scores_zero() {
        let a = control("A-1", 1, RiskLevel::High, 8, 4);
        let b = control("A-2", 2, RiskLevel::Low, 4, 2);
        let summary = ScoringService::score(&[
            ScoringInput::new(&a, Answer::Na),
            ScoringInput::new(&b, Answer::Na),
        ]);
        assert_eq!(summary.overall_score, Decimal::ZERO);
        assert_eq!(summary.total_controls_assessed, 0);
        assert_eq!(summary.gaps.total(), 0);
        assert_eq!(summary.domain_scores.len(), 2);
        assert!(summary.domain_scores.iter().all(|d| d.percentage.is_zero() && d.na_count == 1));
    }

    #[test]
    fn test_partial_is_not_a_global_gap() {
        let a = control("A-1", 1, RiskLevel::Critical, 10, 5);
        let b = control("A-2", 1, RiskLevel::Low, 4, 2);
        let summary = ScoringService::score(&[
            ScoringInput::new(&a, Answer::Partial),
            ScoringInput::new(&b, Answer::No),
        ]);
        assert_eq!(summary.gaps, GapCounts { critical: 0, high: 0, medium: 0, low: 1 });
        let domain = &summary.domain_scores[0];
        assert_eq!(domain.partial_count, 1);
        assert_eq!(domain.gap_count, 1);
        // 5 / 14
        assert_eq!(summary.overall_score, dec("35.71"));
    }

    #[test]
    fn test_weights_apply_to_both_sides() {
        let a = control("A-1", 1, RiskLevel::Critical, 10, 5).weighted(1.5);
        let b = control("A-2", 2, RiskLevel::Medium, 6, 3);
        let summary = ScoringService::score(&[
            ScoringInput::new(&a, Answer::Yes),
            ScoringInput::new(&b, Answer::No),
        ]);
        // 15 / 21
        assert_eq!(summary.overall_score, dec("71.43"));
        assert_eq!(summary.domain_scores[0].percentage, dec("100"));
        assert_eq!(summary.domain_scores[1].percentage, Decimal::ZERO);
        assert_eq!(summary.gaps.medium, 1);
    }

    #[test]
    fn test_domains_sorted() {
        let a = control("A-1", 9, RiskLevel::Low, 4, 2);
        let b = control("A-2", 3, RiskLevel::Low, 4, 2);
        let summary = ScoringService::score(&[
            ScoringInput::new(&a, Answer::Yes),
            ScoringInput::new(&b, Answer::Yes),
        ]);
        let order: Vec<u8> = summary.domain_scores.iter().map(|d| d.domain_number).collect();
        assert_eq!(order, vec![3, 9]);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round2(dec("12.345")), dec("12.35"));
        assert_eq!(round2(dec("12.344")), dec("12.34"));
        assert_eq!(percentage(dec("1"), dec("3")), dec("33.33"));
        assert_eq!(percentage(dec("2"), dec("3")), dec("66.67"));
    }

    fn arb_answer() -> impl Strategy<Value = Answer> {
        prop_oneof![
            Just(Answer::Yes),
            Just(Answer::Partial),
            Just(Answer::No),
            Just(Answer::Na),
        ]
    }

    fn arb_risk() -> impl Strategy<Value = RiskLevel> {
        prop_oneof![
            Just(RiskLevel::Critical),
            Just(RiskLevel::High),
            Just(RiskLevel::Medium),
            Just(RiskLevel::Low),
        ]
    }

    proptest! {
        #[test]
        fn prop_score_in_range_and_matches_formula(
            rows in prop::collection::vec(
                (1u8..=10, arb_risk(), 2u32..=10, 0u32..10, 1u32..=4, arb_answer()),
                0..40,
            )
        ) {
            let controls: Vec<Control> = rows
                .iter()
                .enumerate()
                .map(|(i, (domain, risk, yes, partial, weight, _))| {
                    control(&format!("P-{i}"), *domain, *risk, *yes, partial % yes)
                        .weighted(f64::from(*weight) * 0.5)
                })
                .collect();
            let inputs: Vec<ScoringInput<'_>> = controls
                .iter()
                .zip(rows.iter())
                .map(|(c, row)| ScoringInput::new(c, row.5))
                .collect();

            let summary = ScoringService::score(&inputs);
            prop_assert!(summary.overall_score >= Decimal::ZERO);
            prop_assert!(summary.overall_score <= Decimal::ONE_HUNDRED);

            let mut available = Decimal::ZERO;
            let mut earned = Decimal::ZERO;
            for input in inputs.iter().filter(|i| i.answer != Answer::Na) {
                let w = Decimal::from_f64(input.control.weight_multiplier).unwrap();
                available += Decimal::from(input.control.points_yes) * w;
                earned += Decimal::from(input.control.points_for(input.answer)) * w;
            }
            prop_assert_eq!(summary.overall_score, percentage(earned, available));

            let nos = inputs.iter().filter(|i| i.answer == Answer::No).count();
            prop_assert_eq!(summary.gaps.total(), nos);
            let assessed = inputs.iter().filter(|i| i.answer != Answer::Na).count();
            prop_assert_eq!(summary.total_controls_assessed, assessed);
        }
    }
}
