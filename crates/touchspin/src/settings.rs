//! Settings sources and their resolution into one immutable [`Settings`].
//!
//! Precedence, highest first: update arguments, the options object, element
//! data attributes, renderer cosmetic defaults, built-in defaults. Every
//! field is optional until the final merge so "unset" and "set to a falsy
//! value" stay distinguishable.

use crate::error::SettingsError;
use core_types::Generation;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

const LOG_TARGET: &str = "touchspin.settings";

const MAX_DECIMALS: u32 = 15;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDivisibility {
    #[default]
    Round,
    #[serde(alias = "down")]
    Floor,
    #[serde(alias = "up")]
    Ceil,
    None,
}

impl StepDivisibility {
    pub fn as_str(self) -> &'static str {
        match self {
            StepDivisibility::Round => "round",
            StepDivisibility::Floor => "floor",
            StepDivisibility::Ceil => "ceil",
            StepDivisibility::None => "none",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "round" => Some(StepDivisibility::Round),
            "floor" | "down" => Some(StepDivisibility::Floor),
            "ceil" | "up" => Some(StepDivisibility::Ceil),
            "none" => Some(StepDivisibility::None),
            _ => None,
        }
    }
}

/// User value transform run around the numeric pipeline.
#[derive(Clone)]
pub struct CalculationHook(Rc<dyn Fn(f64) -> f64>);

impl CalculationHook {
    pub fn new(f: impl Fn(f64) -> f64 + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, value: f64) -> f64 {
        (self.0)(value)
    }
}

impl fmt::Debug for CalculationHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CalculationHook(..)")
    }
}

/// Renderer-facing fields. Opaque to the engine beyond set-vs-unset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CosmeticOptions {
    #[serde(rename = "verticalbuttons")]
    pub vertical_buttons: Option<bool>,
    pub prefix: Option<String>,
    pub postfix: Option<String>,
    pub prefix_extraclass: Option<String>,
    pub postfix_extraclass: Option<String>,
    pub buttonup_class: Option<String>,
    pub buttondown_class: Option<String>,
    pub buttonup_txt: Option<String>,
    pub buttondown_txt: Option<String>,
    pub verticalup: Option<String>,
    pub verticaldown: Option<String>,
    pub verticalupclass: Option<String>,
    pub verticaldownclass: Option<String>,
}

macro_rules! cosmetic_text_fields {
    ($m:ident) => {
        $m!(prefix, "prefix");
        $m!(postfix, "postfix");
        $m!(prefix_extraclass, "prefix_extraclass");
        $m!(postfix_extraclass, "postfix_extraclass");
        $m!(buttonup_class, "buttonup_class");
        $m!(buttondown_class, "buttondown_class");
        $m!(buttonup_txt, "buttonup_txt");
        $m!(buttondown_txt, "buttondown_txt");
        $m!(verticalup, "verticalup");
        $m!(verticaldown, "verticaldown");
        $m!(verticalupclass, "verticalupclass");
        $m!(verticaldownclass, "verticaldownclass");
    };
}

impl CosmeticOptions {
    /// Keep every field already set; take the rest from `lower`.
    pub fn or(mut self, lower: &CosmeticOptions) -> Self {
        if self.vertical_buttons.is_none() {
            self.vertical_buttons = lower.vertical_buttons;
        }
        macro_rules! fill {
            ($field:ident, $key:literal) => {
                if self.$field.is_none() {
                    self.$field = lower.$field.clone();
                }
            };
        }
        cosmetic_text_fields!(fill);
        self
    }

    fn resolve(&self) -> Cosmetic {
        let text = |v: &Option<String>, fallback: &str| {
            v.clone().unwrap_or_else(|| fallback.to_string())
        };
        Cosmetic {
            vertical_buttons: self.vertical_buttons.unwrap_or(false),
            prefix: text(&self.prefix, ""),
            postfix: text(&self.postfix, ""),
            prefix_extraclass: text(&self.prefix_extraclass, ""),
            postfix_extraclass: text(&self.postfix_extraclass, ""),
            buttonup_class: text(&self.buttonup_class, ""),
            buttondown_class: text(&self.buttondown_class, ""),
            buttonup_txt: text(&self.buttonup_txt, "+"),
            buttondown_txt: text(&self.buttondown_txt, "\u{2212}"),
            verticalup: text(&self.verticalup, "+"),
            verticaldown: text(&self.verticaldown, "\u{2212}"),
            verticalupclass: text(&self.verticalupclass, ""),
            verticaldownclass: text(&self.verticaldownclass, ""),
        }
    }
}

/// Fully resolved cosmetic fields handed to the renderer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cosmetic {
    pub vertical_buttons: bool,
    pub prefix: String,
    pub postfix: String,
    pub prefix_extraclass: String,
    pub postfix_extraclass: String,
    pub buttonup_class: String,
    pub buttondown_class: String,
    pub buttonup_txt: String,
    pub buttondown_txt: String,
    pub verticalup: String,
    pub verticaldown: String,
    pub verticalupclass: String,
    pub verticaldownclass: String,
}

impl Cosmetic {
    fn to_options(&self) -> CosmeticOptions {
        let mut out = CosmeticOptions {
            vertical_buttons: Some(self.vertical_buttons),
            ..CosmeticOptions::default()
        };
        macro_rules! copy {
            ($field:ident, $key:literal) => {
                out.$field = Some(self.$field.clone());
            };
        }
        cosmetic_text_fields!(copy);
        out
    }
}

/// One settings source. Every field is optional; `None` means "not given here".
///
/// `min`, `max`, `maxboostedstep` and `firstclickvalueifempty` are doubly
/// optional: `Some(None)` is an explicit "unbounded"/"none".
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SpinOptions {
    #[serde(deserialize_with = "explicit")]
    pub min: Option<Option<f64>>,
    #[serde(deserialize_with = "explicit")]
    pub max: Option<Option<f64>>,
    pub step: Option<f64>,
    pub decimals: Option<u32>,
    #[serde(rename = "forcestepdivisibility")]
    pub force_step_divisibility: Option<StepDivisibility>,
    pub booster: Option<bool>,
    #[serde(rename = "boostat")]
    pub boost_at: Option<u32>,
    #[serde(rename = "maxboostedstep", deserialize_with = "number_or_false")]
    pub max_boosted_step: Option<Option<f64>>,
    #[serde(rename = "firstclickvalueifempty", deserialize_with = "explicit")]
    pub first_click_value_if_empty: Option<Option<f64>>,
    #[serde(rename = "replacementval", deserialize_with = "text_or_number")]
    pub replacement_value: Option<String>,
    #[serde(rename = "initval", deserialize_with = "text_or_number")]
    pub init_value: Option<String>,
    #[serde(rename = "stepinterval")]
    pub step_interval_ms: Option<u64>,
    #[serde(rename = "stepintervaldelay")]
    pub step_interval_delay_ms: Option<u64>,
    pub mousewheel: Option<bool>,
    #[serde(flatten)]
    pub cosmetic: CosmeticOptions,
    #[serde(skip)]
    pub before_calculation: Option<CalculationHook>,
    #[serde(skip)]
    pub after_calculation: Option<CalculationHook>,
}

fn explicit<'de, D>(de: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(de).map(Some)
}

fn number_or_false<'de, D>(de: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cap {
        Number(f64),
        Flag(bool),
    }
    match Option::<Cap>::deserialize(de)? {
        Some(Cap::Number(n)) => Ok(Some(Some(n))),
        Some(Cap::Flag(false)) | None => Ok(Some(None)),
        Some(Cap::Flag(true)) => Err(serde::de::Error::custom(
            "maxboostedstep must be a number or false",
        )),
    }
}

fn text_or_number<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Text(String),
        Number(f64),
    }
    Ok(Option::<Text>::deserialize(de)?.map(|t| match t {
        Text::Text(s) => s,
        Text::Number(n) => n.to_string(),
    }))
}

impl SpinOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The engine's built-in defaults as a fully populated source.
    pub fn builtin() -> Self {
        Self {
            min: Some(Some(0.0)),
            max: Some(Some(100.0)),
            step: Some(1.0),
            decimals: Some(0),
            force_step_divisibility: Some(StepDivisibility::Round),
            booster: Some(true),
            boost_at: Some(10),
            max_boosted_step: Some(None),
            first_click_value_if_empty: Some(None),
            replacement_value: Some(String::new()),
            init_value: Some(String::new()),
            step_interval_ms: Some(100),
            step_interval_delay_ms: Some(500),
            mousewheel: Some(true),
            cosmetic: CosmeticOptions::default(),
            before_calculation: None,
            after_calculation: None,
        }
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(Some(min));
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(Some(max));
        self
    }

    pub fn unbounded_min(mut self) -> Self {
        self.min = Some(None);
        self
    }

    pub fn unbounded_max(mut self) -> Self {
        self.max = Some(None);
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn decimals(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    pub fn force_step_divisibility(mut self, mode: StepDivisibility) -> Self {
        self.force_step_divisibility = Some(mode);
        self
    }

    pub fn booster(mut self, on: bool) -> Self {
        self.booster = Some(on);
        self
    }

    pub fn boost_at(mut self, count: u32) -> Self {
        self.boost_at = Some(count);
        self
    }

    pub fn max_boosted_step(mut self, cap: Option<f64>) -> Self {
        self.max_boosted_step = Some(cap);
        self
    }

    pub fn first_click_value_if_empty(mut self, value: Option<f64>) -> Self {
        self.first_click_value_if_empty = Some(value);
        self
    }

    pub fn replacement_value(mut self, value: impl Into<String>) -> Self {
        self.replacement_value = Some(value.into());
        self
    }

    pub fn init_value(mut self, value: impl Into<String>) -> Self {
        self.init_value = Some(value.into());
        self
    }

    pub fn step_interval(mut self, interval: Duration) -> Self {
        self.step_interval_ms = Some(duration_ms(interval));
        self
    }

    pub fn step_interval_delay(mut self, delay: Duration) -> Self {
        self.step_interval_delay_ms = Some(duration_ms(delay));
        self
    }

    pub fn mousewheel(mut self, on: bool) -> Self {
        self.mousewheel = Some(on);
        self
    }

    pub fn vertical_buttons(mut self, on: bool) -> Self {
        self.cosmetic.vertical_buttons = Some(on);
        self
    }

    pub fn prefix(mut self, text: impl Into<String>) -> Self {
        self.cosmetic.prefix = Some(text.into());
        self
    }

    pub fn postfix(mut self, text: impl Into<String>) -> Self {
        self.cosmetic.postfix = Some(text.into());
        self
    }

    pub fn before_calculation(mut self, f: impl Fn(f64) -> f64 + 'static) -> Self {
        self.before_calculation = Some(CalculationHook::new(f));
        self
    }

    pub fn after_calculation(mut self, f: impl Fn(f64) -> f64 + 'static) -> Self {
        self.after_calculation = Some(CalculationHook::new(f));
        self
    }

    /// Read `data-bts-<key>` attributes (plus native `min`/`max`/`step`).
    ///
    /// Malformed values are logged and left unset.
    pub fn from_attributes(attributes: &[(String, Option<String>)]) -> Self {
        let reader = AttributeReader { attributes };
        let mut out = SpinOptions::new();

        out.min = reader.bound("min");
        out.max = reader.bound("max");
        out.step = reader.number("step");
        out.decimals = reader.parsed("decimals", "non-negative integer", |s| s.parse().ok());
        out.force_step_divisibility = reader.parsed(
            "forcestepdivisibility",
            "divisibility mode",
            StepDivisibility::parse,
        );
        out.booster = reader.flag("booster");
        out.boost_at = reader.parsed("boostat", "positive integer", |s| s.parse().ok());
        out.max_boosted_step = reader.parsed("maxboostedstep", "number or false", |s| {
            if s.eq_ignore_ascii_case("false") {
                Some(None)
            } else {
                s.parse::<f64>().ok().map(Some)
            }
        });
        out.first_click_value_if_empty =
            reader.parsed("firstclickvalueifempty", "number", |s| {
                s.parse::<f64>().ok().map(Some)
            });
        out.replacement_value = reader.text("replacementval");
        out.init_value = reader.text("initval");
        out.step_interval_ms = reader.parsed("stepinterval", "millisecond count", |s| s.parse().ok());
        out.step_interval_delay_ms =
            reader.parsed("stepintervaldelay", "millisecond count", |s| s.parse().ok());
        out.mousewheel = reader.flag("mousewheel");

        out.cosmetic.vertical_buttons = reader.flag("verticalbuttons");
        macro_rules! read_text {
            ($field:ident, $key:literal) => {
                out.cosmetic.$field = reader.text($key);
            };
        }
        cosmetic_text_fields!(read_text);
        out
    }

    /// Keep every field set here; take the rest from `lower`.
    pub fn or(self, lower: &SpinOptions) -> Self {
        SpinOptions {
            min: self.min.or(lower.min),
            max: self.max.or(lower.max),
            step: self.step.or(lower.step),
            decimals: self.decimals.or(lower.decimals),
            force_step_divisibility: self.force_step_divisibility.or(lower.force_step_divisibility),
            booster: self.booster.or(lower.booster),
            boost_at: self.boost_at.or(lower.boost_at),
            max_boosted_step: self.max_boosted_step.or(lower.max_boosted_step),
            first_click_value_if_empty: self
                .first_click_value_if_empty
                .or(lower.first_click_value_if_empty),
            replacement_value: self.replacement_value.or_else(|| lower.replacement_value.clone()),
            init_value: self.init_value.or_else(|| lower.init_value.clone()),
            step_interval_ms: self.step_interval_ms.or(lower.step_interval_ms),
            step_interval_delay_ms: self.step_interval_delay_ms.or(lower.step_interval_delay_ms),
            mousewheel: self.mousewheel.or(lower.mousewheel),
            cosmetic: self.cosmetic.or(&lower.cosmetic),
            before_calculation: self
                .before_calculation
                .or_else(|| lower.before_calculation.clone()),
            after_calculation: self
                .after_calculation
                .or_else(|| lower.after_calculation.clone()),
        }
    }

    /// Drop values that cannot be used, logging each one.
    fn validated(mut self, source: SettingsSource) -> Self {
        let reject = |key: &'static str, value: &dyn fmt::Display, reason: &'static str| {
            let err = SettingsError::Rejected {
                source_name: source.name(),
                key,
                value: value.to_string(),
                reason,
            };
            log::warn!(target: LOG_TARGET, "{err}");
        };

        let finite = |v: &f64| v.is_finite();
        let positive = |v: &f64| v.is_finite() && *v > 0.0;

        check_bound(&mut self.min, "min", finite, "not a finite number", &reject);
        check_bound(&mut self.max, "max", finite, "not a finite number", &reject);
        check_bound(
            &mut self.max_boosted_step,
            "maxboostedstep",
            positive,
            "must be greater than zero",
            &reject,
        );
        check_bound(
            &mut self.first_click_value_if_empty,
            "firstclickvalueifempty",
            finite,
            "not a finite number",
            &reject,
        );
        check(&mut self.step, "step", positive, "must be greater than zero", &reject);
        check(
            &mut self.decimals,
            "decimals",
            |v| *v <= MAX_DECIMALS,
            "at most 15 decimals are supported",
            &reject,
        );
        check(&mut self.boost_at, "boostat", |v| *v >= 1, "must be at least 1", &reject);
        check(
            &mut self.step_interval_ms,
            "stepinterval",
            |v| *v > 0,
            "must be greater than zero",
            &reject,
        );
        self
    }
}

/// Clear `slot` when its value fails `ok`.
fn check<T: fmt::Display>(
    slot: &mut Option<T>,
    key: &'static str,
    ok: impl Fn(&T) -> bool,
    reason: &'static str,
    reject: &dyn Fn(&'static str, &dyn fmt::Display, &'static str),
) {
    if let Some(v) = slot.as_ref() {
        if !ok(v) {
            reject(key, v, reason);
            *slot = None;
        }
    }
}

/// Like [`check`] for doubly optional fields; an explicit `None` always passes.
fn check_bound(
    slot: &mut Option<Option<f64>>,
    key: &'static str,
    ok: impl Fn(&f64) -> bool,
    reason: &'static str,
    reject: &dyn Fn(&'static str, &dyn fmt::Display, &'static str),
) {
    if let Some(Some(v)) = *slot {
        if !ok(&v) {
            reject(key, &v, reason);
            *slot = None;
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

struct AttributeReader<'a> {
    attributes: &'a [(String, Option<String>)],
}

impl AttributeReader<'_> {
    fn raw(&self, name: &str) -> Option<(&str, &str)> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(k, v)| (k.as_str(), v.as_deref().unwrap_or("")))
    }

    /// `data-bts-<key>`, also accepting dashes for underscores.
    fn data(&self, key: &str) -> Option<(&str, &str)> {
        self.raw(&format!("data-bts-{key}")).or_else(|| {
            key.contains('_')
                .then(|| self.raw(&format!("data-bts-{}", key.replace('_', "-"))))
                .flatten()
        })
    }

    fn parsed<T>(&self, key: &str, expected: &'static str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        let (name, value) = self.data(key)?;
        parse(value.trim()).or_else(|| {
            malformed(name, value, expected);
            None
        })
    }

    fn number(&self, key: &str) -> Option<f64> {
        let data = self.parsed(key, "number", |s| s.parse::<f64>().ok());
        data.or_else(|| self.native(key))
    }

    fn bound(&self, key: &str) -> Option<Option<f64>> {
        self.number(key).map(Some)
    }

    /// Native `min`/`max`/`step`. An empty native attribute is ignored.
    fn native(&self, key: &str) -> Option<f64> {
        let (name, value) = self.raw(key)?;
        if value.trim().is_empty() {
            return None;
        }
        value.trim().parse::<f64>().ok().or_else(|| {
            malformed(name, value, "number");
            None
        })
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.parsed(key, "boolean", |s| match s.to_ascii_lowercase().as_str() {
            "" | "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        })
    }

    fn text(&self, key: &str) -> Option<String> {
        self.data(key).map(|(_, v)| v.to_string())
    }
}

fn malformed(name: &str, value: &str, expected: &'static str) {
    let err = SettingsError::MalformedAttribute {
        name: name.to_string(),
        value: value.to_string(),
        expected,
    };
    log::warn!(target: LOG_TARGET, "{err}");
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsSource {
    Attributes,
    Options,
    Update,
}

impl SettingsSource {
    pub fn name(self) -> &'static str {
        match self {
            SettingsSource::Attributes => "data attribute",
            SettingsSource::Options => "options",
            SettingsSource::Update => "update",
        }
    }
}

/// One generation of resolved configuration. Replaced wholesale, never mutated.
#[derive(Clone, Debug)]
pub struct Settings {
    pub generation: Generation,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: f64,
    pub decimals: u32,
    pub force_step_divisibility: StepDivisibility,
    pub booster: bool,
    pub boost_at: u32,
    pub max_boosted_step: Option<f64>,
    pub first_click_value_if_empty: Option<f64>,
    pub replacement_value: String,
    pub init_value: String,
    pub step_interval: Duration,
    pub step_interval_delay: Duration,
    pub mousewheel: bool,
    pub before_calculation: Option<CalculationHook>,
    pub after_calculation: Option<CalculationHook>,
    pub cosmetic: Cosmetic,
}

impl Default for Settings {
    fn default() -> Self {
        SettingsResolver::resolve(&[], &SpinOptions::new(), None, &CosmeticOptions::default())
    }
}

impl Settings {
    /// The fully populated source this generation was built from.
    pub fn to_options(&self) -> SpinOptions {
        SpinOptions {
            min: Some(self.min),
            max: Some(self.max),
            step: Some(self.step),
            decimals: Some(self.decimals),
            force_step_divisibility: Some(self.force_step_divisibility),
            booster: Some(self.booster),
            boost_at: Some(self.boost_at),
            max_boosted_step: Some(self.max_boosted_step),
            first_click_value_if_empty: Some(self.first_click_value_if_empty),
            replacement_value: Some(self.replacement_value.clone()),
            init_value: Some(self.init_value.clone()),
            step_interval_ms: Some(duration_ms(self.step_interval)),
            step_interval_delay_ms: Some(duration_ms(self.step_interval_delay)),
            mousewheel: Some(self.mousewheel),
            cosmetic: self.cosmetic.to_options(),
            before_calculation: self.before_calculation.clone(),
            after_calculation: self.after_calculation.clone(),
        }
    }
}

pub struct SettingsResolver;

impl SettingsResolver {
    /// Merge all sources into a new generation.
    ///
    /// With `previous`, the previous generation replaces the built-in
    /// defaults and element attributes as the base, so only fields present
    /// in `options` change.
    pub fn resolve(
        attributes: &[(String, Option<String>)],
        options: &SpinOptions,
        previous: Option<&Settings>,
        renderer_defaults: &CosmeticOptions,
    ) -> Settings {
        let (merged, generation) = match previous {
            None => {
                let attrs = SpinOptions::from_attributes(attributes)
                    .validated(SettingsSource::Attributes);
                let merged = options
                    .clone()
                    .validated(SettingsSource::Options)
                    .or(&attrs)
                    .or(&SpinOptions::builtin());
                (merged, Generation::INITIAL)
            }
            Some(prev) => {
                let merged = options
                    .clone()
                    .validated(SettingsSource::Update)
                    .or(&prev.to_options());
                (merged, prev.generation.next())
            }
        };
        let settings = Self::finish(merged, generation, renderer_defaults);
        log::debug!(
            target: LOG_TARGET,
            "resolved generation {}: min={:?} max={:?} step={} decimals={}",
            settings.generation.0,
            settings.min,
            settings.max,
            settings.step,
            settings.decimals
        );
        settings
    }

    fn finish(merged: SpinOptions, generation: Generation, renderer_defaults: &CosmeticOptions) -> Settings {
        let min = merged.min.unwrap_or(Some(0.0));
        let mut max = merged.max.unwrap_or(Some(100.0));
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                log::warn!(target: LOG_TARGET, "{}", SettingsError::InvertedBounds { min: lo, max: hi });
                max = None;
            }
        }

        Settings {
            generation,
            min,
            max,
            step: merged.step.unwrap_or(1.0),
            decimals: merged.decimals.unwrap_or(0),
            force_step_divisibility: merged.force_step_divisibility.unwrap_or_default(),
            booster: merged.booster.unwrap_or(true),
            boost_at: merged.boost_at.unwrap_or(10),
            max_boosted_step: merged.max_boosted_step.flatten(),
            first_click_value_if_empty: merged.first_click_value_if_empty.flatten(),
            replacement_value: merged.replacement_value.unwrap_or_default(),
            init_value: merged.init_value.unwrap_or_default(),
            step_interval: Duration::from_millis(merged.step_interval_ms.unwrap_or(100)),
            step_interval_delay: Duration::from_millis(merged.step_interval_delay_ms.unwrap_or(500)),
            mousewheel: merged.mousewheel.unwrap_or(true),
            before_calculation: merged.before_calculation,
            after_calculation: merged.after_calculation,
            cosmetic: merged.cosmetic.or(renderer_defaults).resolve(),
        }
    }
}
