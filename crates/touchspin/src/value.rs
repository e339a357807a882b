//! Numeric domain logic: parsing, step alignment, clamping, formatting.
//!
//! The bound element's text is read fresh on every call; nothing here caches
//! a value across operations.

use crate::dom::HostDocument;
use crate::settings::{CalculationHook, Settings, StepDivisibility};
use core_types::{ElementId, SpinDirection};

const LOG_TARGET: &str = "touchspin.value";

/// Digits after the point considered when scaling to integers.
const MAX_PRECISION: u32 = 10;

/// Beyond this magnitude scaled arithmetic would overflow; plain floats are used.
const SCALED_LIMIT: f64 = 1e30;

/// Upper bound on the booster exponent.
const MAX_BOOST_EXPONENT: u32 = 60;

/// Lenient numeric prefix parse: leading whitespace, sign, digits, fraction,
/// exponent. Trailing garbage is ignored (`"12px"` is `12`).
pub fn parse_number(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Decimal digits in the shortest representation of `v`, capped.
pub fn precision_of(v: f64) -> u32 {
    if !v.is_finite() {
        return 0;
    }
    let repr = format!("{v}");
    let Some(dot) = repr.find('.') else {
        return 0;
    };
    let digits = u32::try_from(repr.len() - dot - 1).unwrap_or(MAX_PRECISION);
    digits.min(MAX_PRECISION)
}

/// Snap `value` onto the grid `base + k * step`.
///
/// Works on integers scaled by the largest decimal precision involved, so
/// values already on the grid come back unchanged and `0.1 + 0.2` aligns to
/// exactly `0.3`.
pub fn align_to_step(value: f64, step: f64, base: f64, mode: StepDivisibility) -> f64 {
    if mode == StepDivisibility::None || !(step > 0.0) || !value.is_finite() {
        return value;
    }
    let precision = precision_of(value)
        .max(precision_of(step))
        .max(precision_of(base));
    let scale = 10f64.powi(precision as i32);
    let scaled = [value * scale, step * scale, base * scale];
    if scaled.iter().any(|v| v.abs() > SCALED_LIMIT) {
        return align_float(value, step, base, mode);
    }
    let [v, s, b] = scaled.map(|x| x.round() as i128);
    if s == 0 {
        return value;
    }
    let offset = v - b;
    let k = match mode {
        StepDivisibility::Round => (2 * offset + s).div_euclid(2 * s),
        StepDivisibility::Floor => offset.div_euclid(s),
        StepDivisibility::Ceil => -(-offset).div_euclid(s),
        StepDivisibility::None => return value,
    };
    (k * s + b) as f64 / scale
}

fn align_float(value: f64, step: f64, base: f64, mode: StepDivisibility) -> f64 {
    let q = (value - base) / step;
    let k = match mode {
        StepDivisibility::Round => (q + 0.5).floor(),
        StepDivisibility::Floor => q.floor(),
        StepDivisibility::Ceil => q.ceil(),
        StepDivisibility::None => return value,
    };
    k * step + base
}

/// Clamp to the bounds. A bound is "hit" whenever it is the binding
/// constraint, including when the value sits exactly on it.
pub fn clamp(value: f64, min: Option<f64>, max: Option<f64>) -> Clamped {
    if let Some(max) = max {
        if value >= max {
            return Clamped {
                value: max,
                hit_min: min == Some(max),
                hit_max: true,
            };
        }
    }
    if let Some(min) = min {
        if value <= min {
            return Clamped {
                value: min,
                hit_min: true,
                hit_max: false,
            };
        }
    }
    Clamped {
        value,
        hit_min: false,
        hit_max: false,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clamped {
    pub value: f64,
    pub hit_min: bool,
    pub hit_max: bool,
}

/// Fixed-point rendering. Ties round half away from zero (`2.5` shows as
/// `3`, `0.125` with two decimals as `0.13`). Never produces `-0`.
pub fn format_value(value: f64, decimals: u32) -> String {
    let scale = 10f64.powi(decimals as i32);
    let scaled = value * scale;
    let rounded = if scaled.is_finite() {
        scaled.round() / scale
    } else {
        value
    };
    let text = format!("{:.*}", decimals as usize, rounded);
    match text.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => text,
    }
}

/// Step size for tick `spincount` of a held spin.
///
/// Doubles every `boost_at` ticks, is capped by `cap`, and never drops below
/// `step`. The second field is `true` when the cap was the binding limit.
pub fn boosted_step(step: f64, spincount: u32, settings: &Settings) -> (f64, bool) {
    if !settings.booster {
        return (step, false);
    }
    let exponent = (spincount / settings.boost_at.max(1)).min(MAX_BOOST_EXPONENT);
    let boosted = step * 2f64.powi(exponent as i32);
    match settings.max_boosted_step {
        Some(cap) if boosted > cap && cap >= step => (cap, true),
        Some(cap) if boosted > cap => (step, false),
        _ => (boosted, false),
    }
}

/// Result of running a candidate through the pipeline, before any write.
#[derive(Clone, Debug, PartialEq)]
pub struct Calculation {
    pub value: f64,
    pub text: String,
    pub hit_min: bool,
    pub hit_max: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckOptions {
    /// Write the result back to the element.
    pub commit: bool,
    /// The call populates an empty field (first click), so
    /// `firstclickvalueifempty` applies.
    pub populate: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CheckOutcome {
    pub value: f64,
    pub text: String,
    /// The element text differs (or, when committing, differed) from the result.
    pub changed: bool,
    pub hit_min: bool,
    pub hit_max: bool,
}

pub struct ValueEngine<'a> {
    settings: &'a Settings,
}

impl<'a> ValueEngine<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    pub fn parse(&self, text: &str) -> Option<f64> {
        parse_number(text)
    }

    /// Substitute for an empty or unparseable value.
    pub fn recover(&self, populate: bool) -> f64 {
        let s = self.settings;
        if !s.replacement_value.is_empty() {
            match parse_number(&s.replacement_value) {
                Some(v) => return v,
                None => log::warn!(
                    target: LOG_TARGET,
                    "replacementval {:?} is not numeric; ignoring it",
                    s.replacement_value
                ),
            }
        }
        if populate {
            if let Some(v) = s.first_click_value_if_empty {
                return v;
            }
        }
        match (s.min, s.max) {
            (Some(lo), Some(hi)) => (lo + hi) / 2.0,
            _ => 0.0,
        }
    }

    /// Run hooks, alignment, clamping and formatting on a number.
    pub fn settle(&self, value: f64) -> Calculation {
        let s = self.settings;
        let value = run_hook("callback_before_calculation", s.before_calculation.as_ref(), value);
        // A value at or past a bound settles on the bound, grid or not, so
        // re-checking a clamped result leaves it alone.
        let bounded = clamp(value, s.min, s.max);
        let clamped = if bounded.hit_min || bounded.hit_max {
            bounded
        } else {
            let aligned = align_to_step(value, s.step, s.min.unwrap_or(0.0), s.force_step_divisibility);
            clamp(aligned, s.min, s.max)
        };
        let value = run_hook("callback_after_calculation", s.after_calculation.as_ref(), clamped.value);
        Calculation {
            value,
            text: format_value(value, s.decimals),
            hit_min: clamped.hit_min,
            hit_max: clamped.hit_max,
        }
    }

    /// Parse `candidate` (recovering when it is not a number) and settle it.
    pub fn calculate(&self, candidate: &str, populate: bool) -> Calculation {
        let value = self
            .parse(candidate)
            .unwrap_or_else(|| self.recover(populate));
        self.settle(value)
    }

    /// One step from `current` in `direction`.
    ///
    /// With `snap`, the value is first rounded to a multiple of `snap` (the
    /// boost cap), so capped spins land on a regular grid.
    pub fn step_from(&self, current: f64, step: f64, direction: SpinDirection, snap: Option<f64>) -> f64 {
        let base = match snap {
            Some(unit) if unit > 0.0 => (current / unit).round() * unit,
            _ => current,
        };
        base + direction.sign() * step
    }

    /// Sanitise `candidate` against the settings, optionally writing it back
    /// to `element`. A second committed call with no intervening edit always
    /// reports `changed: false`.
    pub fn check_value(
        &self,
        doc: &mut HostDocument,
        element: ElementId,
        candidate: &str,
        opts: CheckOptions,
    ) -> CheckOutcome {
        let calc = self.calculate(candidate, opts.populate);
        self.apply(doc, element, calc, opts.commit)
    }

    /// [`check_value`](Self::check_value) for an already numeric candidate.
    pub fn check_number(
        &self,
        doc: &mut HostDocument,
        element: ElementId,
        candidate: f64,
        commit: bool,
    ) -> CheckOutcome {
        let calc = self.settle(candidate);
        self.apply(doc, element, calc, commit)
    }

    fn apply(&self, doc: &mut HostDocument, element: ElementId, calc: Calculation, commit: bool) -> CheckOutcome {
        let changed = if commit {
            write(doc, element, &calc.text)
        } else {
            doc.value(element) != Some(calc.text.as_str())
        };
        CheckOutcome {
            value: calc.value,
            text: calc.text,
            changed,
            hit_min: calc.hit_min,
            hit_max: calc.hit_max,
        }
    }
}

/// Write `text` unless the element already shows it. Returns `true` on write.
pub fn write(doc: &mut HostDocument, element: ElementId, text: &str) -> bool {
    if doc.value(element) == Some(text) {
        return false;
    }
    log::trace!(target: LOG_TARGET, "write {element} = {text:?}");
    doc.set_value(element, text)
}

fn run_hook(name: &str, hook: Option<&CalculationHook>, value: f64) -> f64 {
    let Some(hook) = hook else {
        return value;
    };
    match bus::run_isolated(name, || hook.call(value)) {
        Some(v) if v.is_finite() => v,
        Some(v) => {
            log::warn!(target: LOG_TARGET, "{name} returned {v}; keeping {value}");
            value
        }
        None => value,
    }
}
