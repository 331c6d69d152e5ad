//! Vitality effects applied to workers by the production rules.
//!
//! - Field: with probability `field_injury_chance`, a loss drawn uniformly
//!   from `[field_injury_min, field_injury_max]`
//! - Dining hall: `round(dining_scale * atan(6 * quality - 2))`, so poor food
//!   hurts and good food heals
//! - Home: a gain drawn uniformly from `[rest_gain_min, rest_gain_max)`
//! - Factory: `round(-factory_wear_scale * r^2 - harm_level)` with `r`
//!   uniform in `[0, 1)`
//!
//! Every function returns a signed change; clamping to `[0, 100]` is the
//! worker's job.

use rand::Rng;

use crate::config::RuleConfig;

/// Round a bounded float to the nearest vitality change.
#[allow(clippy::cast_possible_truncation)]
fn to_change(value: f64) -> i32 {
    // Every caller produces values well inside i32; `as` saturates anyway.
    value.round() as i32
}

/// Vitality change from eating food of the given quality.
///
/// Quality 0 gives `round(25 * atan(-2)) = -28`, quality 0.9 gives 32.
pub fn dining_gain(quality: f64, config: &RuleConfig) -> i32 {
    let x = 6.0f64.mul_add(quality, -2.0);
    to_change(config.dining_scale * x.atan())
}

/// Vitality change from one factory shift.
pub fn factory_wear(r: f64, harm_level: u8, config: &RuleConfig) -> i32 {
    let wear = (-config.factory_wear_scale).mul_add(r * r, -f64::from(harm_level));
    to_change(wear)
}

/// Draw the vitality change of one field shift: zero, or a negative injury.
pub fn field_injury<R: Rng + ?Sized>(rng: &mut R, config: &RuleConfig) -> i32 {
    if !rng.random_bool(config.injury_chance()) {
        return 0;
    }
    let low = config.field_injury_min.min(config.field_injury_max);
    let high = config.field_injury_min.max(config.field_injury_max);
    -i32::from(rng.random_range(low..=high))
}

/// Draw the vitality gain of one rest at a home.
pub fn rest_gain<R: Rng + ?Sized>(rng: &mut R, config: &RuleConfig) -> i32 {
    let low = config.rest_gain_min.min(config.rest_gain_max);
    let high = config.rest_gain_min.max(config.rest_gain_max);
    if low == high {
        return i32::from(low);
    }
    i32::from(rng.random_range(low..high))
}

/// Draw a factory's fixed harm level.
pub fn harm_level<R: Rng + ?Sized>(rng: &mut R, config: &RuleConfig) -> u8 {
    if config.factory_harm_levels == 0 {
        return 0;
    }
    rng.random_range(0..config.factory_harm_levels)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn dining_curve_matches_reference_points() {
        let config = RuleConfig::default();
        assert_eq!(dining_gain(0.0, &config), -28);
        assert_eq!(dining_gain(0.9, &config), 32);
        // atan(0) at quality 1/3: neutral meal.
        assert_eq!(dining_gain(1.0 / 3.0, &config), 0);
    }

    #[test]
    fn dining_curve_is_monotonic() {
        let config = RuleConfig::default();
        let gains: Vec<i32> = (0..10)
            .map(|i| dining_gain(f64::from(i) / 10.0, &config))
            .collect();
        assert!(gains.windows(2).all(|w| w.first() <= w.last()));
    }

    #[test]
    fn factory_wear_bounds() {
        let config = RuleConfig::default();
        assert_eq!(factory_wear(0.0, 0, &config), 0);
        assert_eq!(factory_wear(0.0, 9, &config), -9);
        assert_eq!(factory_wear(0.5, 3, &config), -13);
        assert!(factory_wear(0.999, 9, &config) >= -49);
    }

    #[test]
    fn field_injury_stays_in_range() {
        let config = RuleConfig {
            field_injury_chance: 1.0,
            ..RuleConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let change = field_injury(&mut rng, &config);
            assert!((-80..=-30).contains(&change));
        }
    }

    #[test]
    fn field_never_injures_at_zero_chance() {
        let config = RuleConfig {
            field_injury_chance: 0.0,
            ..RuleConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        assert!((0..100).all(|_| field_injury(&mut rng, &config) == 0));
    }

    #[test]
    fn rest_gain_is_half_open() {
        let config = RuleConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let gain = rest_gain(&mut rng, &config);
            assert!((10..35).contains(&gain));
        }
    }

    #[test]
    fn harm_level_below_level_count() {
        let config = RuleConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        assert!((0..100).all(|_| harm_level(&mut rng, &config) < 10));
        let none = RuleConfig {
            factory_harm_levels: 0,
            ..RuleConfig::default()
        };
        assert_eq!(harm_level(&mut rng, &none), 0);
    }
}
