use chrono::NaiveDate;

use super::types::MatchTier;

/// Point table for ranking candidate vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreWeights {
    /// Endpoint found verbatim on the vehicle's route.
    pub exact_match: i32,
    /// Endpoint found in the nearby-city index of a route member.
    pub nearby_match: i32,
    pub in_time: i32,
    /// Subtracted from `in_time` per day outside the availability window.
    pub late_penalty_per_day: i32,
    /// 0.9 ≤ weight/capacity ≤ 1.0
    pub capacity_full_fit: i32,
    /// weight/capacity < 0.9
    pub capacity_underload: i32,
    /// 1.0 < weight/capacity ≤ 1.1
    pub capacity_slight_overload: i32,
    /// weight/capacity > 1.1
    pub capacity_overload: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            exact_match: 50,
            nearby_match: 25,
            in_time: 40,
            late_penalty_per_day: 10,
            capacity_full_fit: 25,
            capacity_underload: 15,
            capacity_slight_overload: 0,
            capacity_overload: -30,
        }
    }
}

impl ScoreWeights {
    pub fn location(&self, tier: MatchTier) -> i32 {
        match tier {
            MatchTier::Exact => self.exact_match,
            MatchTier::Nearby => self.nearby_match,
        }
    }

    /// Time fit between the vehicle's availability and the cargo's pickup date.
    /// Zero when either the vehicle's start or the pickup date is unknown.
    pub fn time(
        &self,
        available_from: Option<NaiveDate>,
        available_until: Option<NaiveDate>,
        pickup_date: Option<NaiveDate>,
    ) -> i32 {
        let (Some(from), Some(pickup)) = (available_from, pickup_date) else {
            return 0;
        };

        let delta_days = match available_until {
            // Open-ended: only a pickup before the vehicle frees up costs points
            None => (from - pickup).num_days().max(0),
            Some(until) if from <= pickup && pickup <= until => 0,
            Some(until) => {
                if pickup < from {
                    (from - pickup).num_days()
                } else {
                    (pickup - until).num_days()
                }
            }
        };

        let points = i64::from(self.in_time) - i64::from(self.late_penalty_per_day) * delta_days;
        points.clamp(0, i64::from(i32::MAX)) as i32
    }

    /// Load fit of `weight_tons` on a vehicle of `capacity_tons`.
    /// Zero unless both are known, finite and positive.
    pub fn capacity(&self, capacity_tons: Option<f64>, weight_tons: Option<f64>) -> i32 {
        let (Some(capacity), Some(weight)) = (capacity_tons, weight_tons) else {
            return 0;
        };
        if !(capacity.is_finite() && capacity > 0.0 && weight.is_finite() && weight > 0.0) {
            return 0;
        }

        let ratio = weight / capacity;
        if (0.9..=1.0).contains(&ratio) {
            self.capacity_full_fit
        } else if ratio < 0.9 {
            self.capacity_underload
        } else if ratio <= 1.1 {
            self.capacity_slight_overload
        } else {
            self.capacity_overload
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_location_points() {
        let w = ScoreWeights::default();
        assert_eq!(w.location(MatchTier::Exact), 50);
        assert_eq!(w.location(MatchTier::Nearby), 25);
    }

    #[test]
    fn test_capacity_tiers_for_ten_ton_vehicle() {
        let w = ScoreWeights::default();
        assert_eq!(w.capacity(Some(10.0), Some(9.5)), 25);
        assert_eq!(w.capacity(Some(10.0), Some(8.0)), 15);
        assert_eq!(w.capacity(Some(10.0), Some(10.5)), 0);
        assert_eq!(w.capacity(Some(10.0), Some(12.0)), -30);
    }

    #[test]
    fn test_capacity_band_edges() {
        let w = ScoreWeights::default();
        assert_eq!(w.capacity(Some(10.0), Some(9.0)), 25);
        assert_eq!(w.capacity(Some(10.0), Some(10.0)), 25);
        assert_eq!(w.capacity(Some(10.0), Some(11.0)), 0);
        assert_eq!(w.capacity(Some(20.0), Some(18.0)), 25);
    }

    #[test]
    fn test_capacity_absent_or_unusable() {
        let w = ScoreWeights::default();
        assert_eq!(w.capacity(None, Some(5.0)), 0);
        assert_eq!(w.capacity(Some(10.0), None), 0);
        assert_eq!(w.capacity(Some(0.0), Some(5.0)), 0);
        assert_eq!(w.capacity(Some(10.0), Some(f64::NAN)), 0);
    }

    #[test]
    fn test_time_inside_window_is_full() {
        let w = ScoreWeights::default();
        let from = date(2025, 1, 1);
        let until = date(2025, 1, 10);
        assert_eq!(w.time(from, until, date(2025, 1, 3)), 40);
        assert_eq!(w.time(from, until, date(2025, 1, 1)), 40);
        assert_eq!(w.time(from, until, date(2025, 1, 10)), 40);
    }

    #[test]
    fn test_time_outside_window_decays_from_nearer_edge() {
        let w = ScoreWeights::default();
        let from = date(2025, 1, 10);
        let until = date(2025, 1, 20);
        assert_eq!(w.time(from, until, date(2025, 1, 8)), 20);
        assert_eq!(w.time(from, until, date(2025, 1, 21)), 30);
        assert_eq!(w.time(from, until, date(2025, 2, 1)), 0);
    }

    #[test]
    fn test_time_open_ended_decay() {
        let w = ScoreWeights::default();
        let from = date(2025, 3, 10);
        // Pickup three days before the vehicle frees up
        assert_eq!(w.time(from, None, date(2025, 3, 7)), 10);
        // Five or more days: floored at zero
        assert_eq!(w.time(from, None, date(2025, 3, 5)), 0);
        assert_eq!(w.time(from, None, date(2024, 3, 5)), 0);
        // Vehicle already available
        assert_eq!(w.time(from, None, date(2025, 3, 13)), 40);
    }

    #[test]
    fn test_time_unknown_dates() {
        let w = ScoreWeights::default();
        assert_eq!(w.time(None, date(2025, 1, 10), date(2025, 1, 3)), 0);
        assert_eq!(w.time(date(2025, 1, 1), None, None), 0);
    }
}
