//! Per-channel vertical scale factors.
//!
//! A channel's factor defaults to `1 / global_sensitivity`. Recording types with a
//! registered rule table may override that for channels whose name matches one of the
//! table's patterns; the first matching rule wins. Resolved factors are cached by
//! channel name and survive rebuilds of the same context. A change of global
//! sensitivity or recording type drops them again, except for channels the user has
//! rescaled: those overrides stay pinned until reset or the cache is cleared.
use std::collections::HashMap;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use crate::error::ChartError;
use crate::store::{RecordingType, Snapshot};
/// Inputs a rule's factor function may depend on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformContext {
    pub recording_type: RecordingType,
    pub global_sensitivity: f64,
    pub channel_height: f64,
}
impl TransformContext {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            recording_type: snapshot.recording_type,
            global_sensitivity: snapshot.global_sensitivity,
            channel_height: snapshot.channel_height,
        }
    }
}
pub type FactorFn = fn(&TransformContext) -> f64;
pub struct TransformRule {
    pattern: Regex,
    factor: FactorFn,
}
impl TransformRule {
    /// Panics on an invalid pattern; rule tables are compiled from literals.
    pub fn new(pattern: &str, factor: FactorFn) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("invalid channel pattern"),
            factor,
        }
    }
    pub fn matches(&self, channel: &str) -> bool {
        self.pattern.is_match(channel)
    }
    pub fn factor(&self, ctx: &TransformContext) -> f64 {
        (self.factor)(ctx)
    }
}
// Auxiliary channels in a scalp EEG montage carry much larger amplitudes than cortex.
static EEG_RULES: Lazy<Vec<TransformRule>> = Lazy::new(|| {
    vec![
        TransformRule::new(r"(?i)^(ecg|ekg)", |ctx| {
            1.0 / (ctx.global_sensitivity * 10.0)
        }),
        TransformRule::new(r"(?i)^(emg|chin)", |ctx| {
            1.0 / (ctx.global_sensitivity * 2.0)
        }),
        TransformRule::new(r"(?i)^(eog|loc|roc)", |ctx| {
            1.0 / (ctx.global_sensitivity * 3.0)
        }),
        TransformRule::new(r"(?i)^(resp|thor|abd)", |ctx| {
            1.0 / (ctx.global_sensitivity * 5.0)
        }),
    ]
});
static EKG_RULES: Lazy<Vec<TransformRule>> = Lazy::new(|| {
    vec![
        // Precordial leads swing roughly twice as far as the limb leads.
        TransformRule::new(r"^V[1-6]$", |ctx| 1.0 / (ctx.global_sensitivity * 20.0)),
        TransformRule::new(r"^(I|II|III|aVR|aVL|aVF)$", |ctx| {
            1.0 / (ctx.global_sensitivity * 10.0)
        }),
    ]
});
pub fn rules_for(recording_type: RecordingType) -> Option<&'static [TransformRule]> {
    match recording_type {
        RecordingType::Eeg => Some(EEG_RULES.as_slice()),
        RecordingType::Ekg => Some(EKG_RULES.as_slice()),
        RecordingType::Other => None,
    }
}
#[derive(Clone, Copy, Debug, PartialEq)]
struct CachedFactor {
    value: f64,
    /// Set once the user rescaled the channel; rule-derived factors stay `false`.
    overridden: bool,
}
/// Channel name -> scale factor. Owned by the chart instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformationCache {
    factors: HashMap<String, CachedFactor>,
}
impl TransformationCache {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, channel: &str) -> Option<f64> {
        self.factors.get(channel).map(|f| f.value)
    }
    pub fn contains(&self, channel: &str) -> bool {
        self.factors.contains_key(channel)
    }
    pub fn is_override(&self, channel: &str) -> bool {
        self.factors.get(channel).is_some_and(|f| f.overridden)
    }
    /// Stores a rule-derived factor.
    pub fn insert(&mut self, channel: impl Into<String>, factor: f64) {
        self.factors.insert(
            channel.into(),
            CachedFactor {
                value: factor,
                overridden: false,
            },
        );
    }
    /// Multiplies an existing factor in place and pins it as a user override. Returns
    /// the new value, or `None` when the channel has not been resolved yet.
    pub fn scale(&mut self, channel: &str, multiplier: f64) -> Option<f64> {
        let factor = self.factors.get_mut(channel)?;
        factor.value *= multiplier;
        factor.overridden = true;
        Some(factor.value)
    }
    pub fn remove(&mut self, channel: &str) -> Option<f64> {
        self.factors.remove(channel).map(|f| f.value)
    }
    /// Drops every factor that came from the rules so the next build resolves it
    /// against the current context. Overrides are kept. Returns how many were dropped.
    pub fn invalidate_resolved(&mut self) -> usize {
        let before = self.factors.len();
        self.factors.retain(|_, f| f.overridden);
        before - self.factors.len()
    }
    pub fn clear(&mut self) {
        self.factors.clear();
    }
    pub fn len(&self) -> usize {
        self.factors.len()
    }
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}
/// Resolves `channel` against the rule table registered for the context's recording type.
pub fn resolve(
    cache: &mut TransformationCache,
    channel: &str,
    ctx: &TransformContext,
) -> Result<f64, ChartError> {
    resolve_with(cache, channel, ctx, rules_for(ctx.recording_type))
}
pub fn resolve_with(
    cache: &mut TransformationCache,
    channel: &str,
    ctx: &TransformContext,
    rules: Option<&[TransformRule]>,
) -> Result<f64, ChartError> {
    if let Some(cached) = cache.get(channel) {
        return Ok(cached);
    }
    if ctx.global_sensitivity == 0.0 {
        return Err(ChartError::ZeroSensitivity);
    }
    let mut factor = 1.0 / ctx.global_sensitivity;
    if let Some(rule) = rules.and_then(|rules| rules.iter().find(|r| r.matches(channel))) {
        factor = rule.factor(ctx);
        debug!("channel {channel} matched rule {}", rule.pattern.as_str());
    }
    cache.insert(channel, factor);
    Ok(factor)
}
