use crate::metric::{MetricDefinition, red_zone_weight};
use configuration::ScoringSettings;
use core_types::{FeatureRow, Metric, PlayRecord, TouchKind, fill_missing_as_zero, safe_ratio};

/// Totals over the plays a `MetricDefinition` counts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TouchSummary {
    pub touches: f64,
    pub yards: f64,
    pub fantasy_points: f64,
    pub epa: f64,
    /// Touches that carried an EPA value.
    pub epa_plays: f64,
    pub red_zone_touches: f64,
    pub red_zone_weight: f64,
    pub red_zone_touchdowns: f64,
}

impl TouchSummary {
    pub fn collect<'a>(
        plays: impl IntoIterator<Item = &'a PlayRecord>,
        definition: &MetricDefinition,
        scoring: &ScoringSettings,
    ) -> Self {
        let mut summary = Self::default();
        for play in plays.into_iter().filter(|p| definition.counts(p)) {
            summary.touches += 1.0;
            summary.yards += fill_missing_as_zero(match definition.touch {
                TouchKind::Rush => play.rushing_yards,
                TouchKind::Target => play.receiving_yards,
            });
            summary.fantasy_points += definition.fantasy_points(play, scoring);
            if let Some(epa) = play.epa.filter(|e| !e.is_nan()) {
                summary.epa += epa;
                summary.epa_plays += 1.0;
            }
            if let Some(weight) = red_zone_weight(play) {
                summary.red_zone_touches += 1.0;
                summary.red_zone_weight += weight;
                if definition.credits_touchdown(play) {
                    summary.red_zone_touchdowns += 1.0;
                }
            }
        }
        summary
    }

    pub fn yards_per_touch(&self) -> f64 {
        safe_ratio(self.yards, self.touches)
    }

    pub fn points_per_touch(&self) -> f64 {
        safe_ratio(self.fantasy_points, self.touches)
    }

    pub fn epa_per_touch(&self) -> f64 {
        safe_ratio(self.epa, self.epa_plays)
    }

    /// Red-zone touchdowns scaled by the inverse of the average proximity weight.
    ///
    /// Zero with no red-zone touches or zero total weight.
    pub fn capitalization_score(&self) -> f64 {
        if self.red_zone_touches == 0.0 || self.red_zone_weight == 0.0 {
            return 0.0;
        }
        self.red_zone_touchdowns / (self.red_zone_weight / self.red_zone_touches)
    }
}

/// `touchdowns / (total_weight / play_count)` over the red-zone plays a definition counts.
pub fn capitalization_score<'a>(
    plays: impl IntoIterator<Item = &'a PlayRecord>,
    definition: &MetricDefinition,
    scoring: &ScoringSettings,
) -> f64 {
    TouchSummary::collect(plays, definition, scoring).capitalization_score()
}

/// How well a back turned his own touches into production over a window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CapitalizationStats {
    pub yards_per_carry: f64,
    pub yards_per_target: f64,
    pub fpoints_per_carry: f64,
    pub fpoints_per_target: f64,
    pub rushing_capitalization_score: f64,
    pub receiving_capitalization_score: f64,
}

impl CapitalizationStats {
    /// Touchdowns only count when the player is the credited scorer.
    pub fn for_player<'a>(
        plays: &[&'a PlayRecord],
        player_id: &str,
        scoring: &ScoringSettings,
    ) -> Self {
        let carries = TouchSummary::collect(
            plays.iter().copied(),
            &MetricDefinition::player(TouchKind::Rush, player_id),
            scoring,
        );
        let targets = TouchSummary::collect(
            plays.iter().copied(),
            &MetricDefinition::player(TouchKind::Target, player_id),
            scoring,
        );
        Self {
            yards_per_carry: carries.yards_per_touch(),
            yards_per_target: targets.yards_per_touch(),
            fpoints_per_carry: carries.points_per_touch(),
            fpoints_per_target: targets.points_per_touch(),
            rushing_capitalization_score: carries.capitalization_score(),
            receiving_capitalization_score: targets.capitalization_score(),
        }
    }

    pub fn write_to(&self, row: &mut FeatureRow) {
        row.set(Metric::YardsPerCarry, self.yards_per_carry);
        row.set(Metric::YardsPerTarget, self.yards_per_target);
        row.set(Metric::FpointsPerCarry, self.fpoints_per_carry);
        row.set(Metric::FpointsPerTarget, self.fpoints_per_target);
        row.set(Metric::RushingCapitalizationScore, self.rushing_capitalization_score);
        row.set(Metric::ReceivingCapitalizationScore, self.receiving_capitalization_score);
    }
}

/// What a defense allowed to opposing running backs over a window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DefenseMetrics {
    pub epa_per_carry_against: f64,
    pub epa_per_target_against: f64,
    pub fpoints_per_carry_against: f64,
    pub fpoints_per_target_against: f64,
    pub rushing_capitalization_score_against: f64,
    pub receiving_capitalization_score_against: f64,
}

impl DefenseMetrics {
    /// `plays` must already be restricted to opposing backs' touches.
    /// Returns `None` when there are none.
    pub fn from_plays(plays: &[&PlayRecord], scoring: &ScoringSettings) -> Option<Self> {
        let rushes = TouchSummary::collect(
            plays.iter().copied(),
            &MetricDefinition::any_scorer(TouchKind::Rush),
            scoring,
        );
        let targets = TouchSummary::collect(
            plays.iter().copied(),
            &MetricDefinition::any_scorer(TouchKind::Target),
            scoring,
        );
        if rushes.touches == 0.0 && targets.touches == 0.0 {
            return None;
        }
        Some(Self {
            epa_per_carry_against: rushes.epa_per_touch(),
            epa_per_target_against: targets.epa_per_touch(),
            fpoints_per_carry_against: rushes.points_per_touch(),
            fpoints_per_target_against: targets.points_per_touch(),
            rushing_capitalization_score_against: rushes.capitalization_score(),
            receiving_capitalization_score_against: targets.capitalization_score(),
        })
    }

    pub fn write_to(&self, row: &mut FeatureRow) {
        row.set(Metric::EpaPerCarryAgainst, self.epa_per_carry_against);
        row.set(Metric::EpaPerTargetAgainst, self.epa_per_target_against);
        row.set(Metric::FpointsPerCarryAgainst, self.fpoints_per_carry_against);
        row.set(Metric::FpointsPerTargetAgainst, self.fpoints_per_target_against);
        row.set(Metric::RushingCapitalizationScoreAgainst, self.rushing_capitalization_score_against);
        row.set(
            Metric::ReceivingCapitalizationScoreAgainst,
            self.receiving_capitalization_score_against,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carry(player: &str, yardline: f64, td: bool) -> PlayRecord {
        PlayRecord {
            rush_attempt: true,
            rusher_player_id: Some(player.into()),
            yardline_100: Some(yardline),
            rushing_yards: Some(3.0),
            yards_gained: 3.0,
            touchdown: td,
            rush_touchdown: td,
            td_player_id: td.then(|| player.to_string()),
            epa: Some(0.5),
            ..Default::default()
        }
    }

    fn target(player: &str, yardline: f64, caught: bool) -> PlayRecord {
        PlayRecord {
            pass_attempt: true,
            complete_pass: caught,
            receiver_player_id: Some(player.into()),
            yardline_100: Some(yardline),
            receiving_yards: caught.then_some(8.0),
            yards_gained: if caught { 8.0 } else { 0.0 },
            epa: Some(-0.25),
            ..Default::default()
        }
    }

    #[test]
    fn no_red_zone_plays_scores_zero_for_both_variants() {
        let scoring = ScoringSettings::default();
        let plays = [carry("rb", 45.0, false), target("rb", 60.0, true)];
        let refs: Vec<&PlayRecord> = plays.iter().collect();

        let stats = CapitalizationStats::for_player(&refs, "rb", &scoring);
        assert_eq!(stats.rushing_capitalization_score, 0.0);
        assert_eq!(stats.receiving_capitalization_score, 0.0);

        let against = DefenseMetrics::from_plays(&refs, &scoring).unwrap();
        assert_eq!(against.rushing_capitalization_score_against, 0.0);
        assert_eq!(against.receiving_capitalization_score_against, 0.0);
    }

    #[test]
    fn score_is_touchdowns_over_mean_weight() {
        let scoring = ScoringSettings::default();
        // Weights 20/2 = 10 and 20/10 = 2, mean 6, one touchdown.
        let plays = [carry("rb", 2.0, true), carry("rb", 10.0, false)];
        let score = capitalization_score(&plays, &MetricDefinition::player(TouchKind::Rush, "rb"), &scoring);
        assert!((score - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn another_players_touches_do_not_count() {
        let scoring = ScoringSettings::default();
        let plays = [carry("other", 2.0, true), carry("rb", 30.0, false)];
        let refs: Vec<&PlayRecord> = plays.iter().collect();
        let stats = CapitalizationStats::for_player(&refs, "rb", &scoring);

        assert_eq!(stats.yards_per_carry, 3.0);
        assert_eq!(stats.rushing_capitalization_score, 0.0);
        assert!((stats.fpoints_per_carry - 0.3).abs() < 1e-12);
    }

    #[test]
    fn per_target_ratios_include_incompletions() {
        let scoring = ScoringSettings::default();
        let plays = [target("rb", 30.0, true), target("rb", 30.0, false)];
        let refs: Vec<&PlayRecord> = plays.iter().collect();
        let stats = CapitalizationStats::for_player(&refs, "rb", &scoring);

        assert_eq!(stats.yards_per_target, 4.0);
        // (1 + 0.8) / 2
        assert!((stats.fpoints_per_target - 0.9).abs() < 1e-12);
        assert_eq!(stats.yards_per_carry, 0.0);
    }

    #[test]
    fn empty_defense_window_has_no_metrics() {
        let scoring = ScoringSettings::default();
        assert!(DefenseMetrics::from_plays(&[], &scoring).is_none());
    }

    #[test]
    fn defense_epa_is_a_per_touch_mean() {
        let scoring = ScoringSettings::default();
        let plays = [carry("a", 30.0, false), carry("b", 30.0, false), target("c", 30.0, false)];
        let refs: Vec<&PlayRecord> = plays.iter().collect();
        let against = DefenseMetrics::from_plays(&refs, &scoring).unwrap();

        assert_eq!(against.epa_per_carry_against, 0.5);
        assert_eq!(against.epa_per_target_against, -0.25);
        assert_eq!(against.fpoints_per_target_against, 0.0);
    }
}
