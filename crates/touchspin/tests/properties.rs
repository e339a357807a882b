use proptest::prelude::*;
use touchspin::settings::{CosmeticOptions, SettingsResolver};
use touchspin::value::{align_to_step, boosted_step, format_value};
use touchspin::{CheckOptions, HostDocument, SpinOptions, StepDivisibility, ValueEngine};

fn divisibility() -> impl Strategy<Value = StepDivisibility> {
    prop_oneof![
        Just(StepDivisibility::Round),
        Just(StepDivisibility::Floor),
        Just(StepDivisibility::Ceil),
        Just(StepDivisibility::None),
    ]
}

proptest! {
    #[test]
    fn clamp_above_max_is_idempotent(
        excess in 0.001f64..1e6,
        min in -1_000i32..1_000,
        span in 1i32..10_000,
        step_hundredths in 1u32..2_000,
        decimals in 0u32..4,
        mode in divisibility(),
    ) {
        let min = f64::from(min);
        let max = min + f64::from(span);
        let step = f64::from(step_hundredths) / 100.0;
        let options = SpinOptions::new()
            .min(min)
            .max(max)
            .step(step)
            .decimals(decimals)
            .force_step_divisibility(mode);
        let settings = SettingsResolver::resolve(&[], &options, None, &CosmeticOptions::default());
        let engine = ValueEngine::new(&settings);
        let mut doc = HostDocument::new();
        let input = doc.create_element("input");
        let commit = CheckOptions { commit: true, populate: false };

        let first = engine.check_value(&mut doc, input, &(max + excess).to_string(), commit);
        prop_assert!(first.hit_max);
        let second = engine.check_value(&mut doc, input, &first.text, commit);
        prop_assert!(!second.changed);
        prop_assert_eq!(&second.text, &first.text);
    }

    #[test]
    fn aligned_values_sit_on_the_grid(
        k in -10_000i64..10_000,
        step_hundredths in 1i64..1_000,
        offset in 0.0f64..1.0,
        mode in prop_oneof![
            Just(StepDivisibility::Round),
            Just(StepDivisibility::Floor),
            Just(StepDivisibility::Ceil),
        ],
    ) {
        let step = step_hundredths as f64 / 100.0;
        let value = (k as f64 + offset) * step;
        let aligned = align_to_step(value, step, 0.0, mode);

        let steps = (aligned / step).round();
        prop_assert!((aligned - steps * step).abs() < 1e-6);
        prop_assert!((aligned - value).abs() <= step + 1e-6);
        match mode {
            StepDivisibility::Floor => prop_assert!(aligned <= value + 1e-9),
            StepDivisibility::Ceil => prop_assert!(aligned >= value - 1e-9),
            _ => {}
        }
    }

    #[test]
    fn grid_values_are_fixed_points(k in -100_000i64..100_000, decimals in 0u32..4) {
        let step = 10f64.powi(-(decimals as i32));
        let value: f64 = format_value(k as f64 * step, decimals).parse().unwrap();
        prop_assert_eq!(align_to_step(value, step, 0.0, StepDivisibility::Round), value);
    }

    #[test]
    fn boosted_step_stays_within_step_and_cap(
        spincount in 0u32..10_000,
        boost_at in 1u32..50,
        cap in proptest::option::of(0.5f64..1_000.0),
    ) {
        let options = SpinOptions::new().step(2.0).boost_at(boost_at).max_boosted_step(cap);
        let settings = SettingsResolver::resolve(&[], &options, None, &CosmeticOptions::default());
        let (step, _) = boosted_step(2.0, spincount, &settings);

        prop_assert!(step >= 2.0);
        if let Some(cap) = cap {
            prop_assert!(step <= cap.max(2.0));
        }
    }
}
