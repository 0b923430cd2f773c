//! Offense-versus-defense features.
//!
//! Composers read the offensive and defensive aggregates already written to a
//! row for the same game and add interaction columns. Absent inputs are
//! zero-filled before any arithmetic.

use core_types::{
    DerivedMetric, FeatureKey, FeatureRow, Metric, Side, Stat, WindowKind, fill_missing_as_zero,
    safe_ratio,
};

fn metric(row: &FeatureRow, metric: Metric) -> f64 {
    fill_missing_as_zero(row.get(&FeatureKey::Metric(metric)))
}

pub fn expected_points_differential(scored: f64, allowed: f64) -> f64 {
    scored - allowed
}

/// `Σ points_per_touch × touches_per_game` over carries and targets.
pub fn expected_points(points_per_carry: f64, points_per_target: f64, rushes_per_game: f64, targets_per_game: f64) -> f64 {
    points_per_carry * rushes_per_game + points_per_target * targets_per_game
}

/// Adds the running-back interaction columns.
///
/// Expects the capitalization, team-opportunity and defense metrics on the row.
pub fn compose_running_back(row: &mut FeatureRow) {
    let rushes_per_game = metric(row, Metric::RushesPerGame);
    let targets_per_game = metric(row, Metric::TargetsPerGame);

    let scored = expected_points(
        metric(row, Metric::FpointsPerCarry),
        metric(row, Metric::FpointsPerTarget),
        rushes_per_game,
        targets_per_game,
    );
    let allowed = expected_points(
        metric(row, Metric::FpointsPerCarryAgainst),
        metric(row, Metric::FpointsPerTargetAgainst),
        rushes_per_game,
        targets_per_game,
    );

    let rushing_edge =
        metric(row, Metric::RushingCapitalizationScore) - metric(row, Metric::RushingCapitalizationScoreAgainst);
    let receiving_edge =
        metric(row, Metric::ReceivingCapitalizationScore) - metric(row, Metric::ReceivingCapitalizationScoreAgainst);
    let per_opportunity = safe_ratio(metric(row, Metric::FpointsPerGame), metric(row, Metric::OpportunitiesPerGame));

    row.set(Metric::WeightedRushingCapitalizationScore, rushing_edge);
    row.set(Metric::WeightedReceivingCapitalizationScore, receiving_edge);
    row.set(Metric::ExpectedFpointsScored, scored);
    row.set(Metric::ExpectedFpointsAllowed, allowed);
    row.set(Metric::ExpectedFpointsDifferential, expected_points_differential(scored, allowed));
    row.set(Metric::FpointsPerOpportunity, per_opportunity);
}

/// Adds `racr_differential` and `rec_epa_differential` for each window.
pub fn compose_receiver(row: &mut FeatureRow, windows: &[WindowKind]) {
    for &window in windows {
        let pairs = [
            (Stat::Racr, DerivedMetric::RacrDifferential),
            (Stat::ReceivingEpa, DerivedMetric::RecEpaDifferential),
        ];
        for (stat, derived) in pairs {
            let offense = fill_missing_as_zero(row.get(&FeatureKey::rolling(stat, Side::Offense, window)));
            let against = fill_missing_as_zero(row.get(&FeatureKey::rolling(stat, Side::Defense, window)));
            row.set(FeatureKey::derived(derived, window), offense - against);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row() -> FeatureRow {
        FeatureRow {
            entity_id: "p".into(),
            player_name: None,
            team: "PHI".into(),
            opponent_team: "WAS".into(),
            season: 2023,
            week: 9,
            depth_chart_position: Some(1),
            features: BTreeMap::new(),
            target: None,
        }
    }

    #[test]
    fn differential_is_exact() {
        assert_eq!(expected_points_differential(12.0, 9.5), 2.5);
    }

    #[test]
    fn running_back_composition() {
        let mut row = row();
        row.set(Metric::FpointsPerCarry, 0.8);
        row.set(Metric::FpointsPerTarget, 1.5);
        row.set(Metric::RushesPerGame, 10.0);
        row.set(Metric::TargetsPerGame, 4.0);
        row.set(Metric::FpointsPerCarryAgainst, 0.5);
        row.set(Metric::FpointsPerTargetAgainst, 1.0);
        row.set(Metric::FpointsPerGame, 14.0);
        row.set(Metric::OpportunitiesPerGame, 14.0);
        row.set(Metric::RushingCapitalizationScore, 0.4);
        row.set(Metric::RushingCapitalizationScoreAgainst, 0.1);
        compose_running_back(&mut row);

        assert_eq!(row.get(&Metric::ExpectedFpointsScored.into()), Some(14.0));
        assert_eq!(row.get(&Metric::ExpectedFpointsAllowed.into()), Some(9.0));
        assert_eq!(row.get(&Metric::ExpectedFpointsDifferential.into()), Some(5.0));
        assert_eq!(row.get(&Metric::FpointsPerOpportunity.into()), Some(1.0));
        assert!((row.get(&Metric::WeightedRushingCapitalizationScore.into()).unwrap() - 0.3).abs() < 1e-12);
        assert_eq!(row.get(&Metric::WeightedReceivingCapitalizationScore.into()), Some(0.0));
    }

    #[test]
    fn missing_opportunities_give_zero_ratio() {
        let mut row = row();
        row.set(Metric::FpointsPerGame, 10.0);
        compose_running_back(&mut row);
        assert_eq!(row.get(&Metric::FpointsPerOpportunity.into()), Some(0.0));
    }

    #[test]
    fn receiver_differentials_zero_fill_missing_sides() {
        let mut row = row();
        row.set(FeatureKey::rolling(Stat::Racr, Side::Offense, WindowKind::Season), 1.25);
        row.set(FeatureKey::rolling(Stat::Racr, Side::Defense, WindowKind::Season), 0.75);
        row.set(FeatureKey::rolling(Stat::ReceivingEpa, Side::Defense, WindowKind::Season), 3.0);
        compose_receiver(&mut row, &[WindowKind::Season]);

        let racr = FeatureKey::derived(DerivedMetric::RacrDifferential, WindowKind::Season);
        let epa = FeatureKey::derived(DerivedMetric::RecEpaDifferential, WindowKind::Season);
        assert_eq!(row.get(&racr), Some(0.5));
        assert_eq!(row.get(&epa), Some(-3.0));
    }
}
