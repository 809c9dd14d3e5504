//! Region/channel keys and label-ordered matrix maps.

use std::fmt;

use hashbrown::HashMap;
use serde::Serialize;
use serde::ser::SerializeMap;

use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// Label given to the correction-fiber region once the background is removed.
pub const CORRECTION_LABEL: &str = "corrsig";

/// Composite key of one region and one channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalKey {
    pub region: String,
    pub channel: usize,
}

impl SignalKey {
    pub fn new(region: impl Into<String>, channel: usize) -> Self {
        Self {
            region: region.into(),
            channel,
        }
    }

    /// Pre-regression label, `sig_<region>_ch<n>`.
    pub fn signal_label(&self) -> String {
        format!("sig_{}_ch{}", self.region, self.channel)
    }

    /// Post-regression label, `<region>_ch<n>`.
    pub fn residual_label(&self) -> String {
        format!("{}_ch{}", self.region, self.channel)
    }

    pub fn is_correction(&self) -> bool {
        self.region == CORRECTION_LABEL
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_ch{}", self.region, self.channel)
    }
}

/// Regions and channel count of one run after background removal.
///
/// [`LabelLayout::keys`] is the enumeration contract for every labeled output:
/// region-major, channel-minor, regions in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelLayout {
    regions: Vec<String>,
    channel_count: usize,
}

impl LabelLayout {
    /// Builds the layout from the full region label list.
    ///
    /// The first label is the background and is dropped; the second is the
    /// correction fiber and is renamed to [`CORRECTION_LABEL`].
    pub fn from_region_labels<S: AsRef<str>>(labels: &[S], channel_count: usize) -> Result<Self> {
        if labels.len() < 2 {
            return Err(Error::TooFewRegions {
                required: 2,
                actual: labels.len(),
            });
        }
        if channel_count == 0 {
            return Err(Error::InvalidParameter {
                name: "channel_count",
                reason: "must be at least 1".to_string(),
            });
        }

        let mut regions = Vec::with_capacity(labels.len() - 1);
        regions.push(CORRECTION_LABEL.to_string());
        for label in &labels[2..] {
            let label = label.as_ref();
            if regions.iter().any(|r| r == label) {
                return Err(Error::InvalidParameter {
                    name: "region labels",
                    reason: format!("duplicate region label '{label}'"),
                });
            }
            regions.push(label.to_string());
        }

        Ok(Self {
            regions,
            channel_count,
        })
    }

    /// Regions in output order, correction fiber first.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Number of labeled signals, `regions * channels`.
    pub fn len(&self) -> usize {
        self.regions.len() * self.channel_count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> impl Iterator<Item = SignalKey> + '_ {
        self.regions.iter().flat_map(move |region| {
            (0..self.channel_count).map(move |channel| SignalKey::new(region.as_str(), channel))
        })
    }
}

/// How keys render when a [`SignalMap`] is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    /// `sig_<region>_ch<n>`
    Signal,
    /// `<region>_ch<n>`
    Residual,
}

/// Matrices keyed by region/channel, iterated in insertion order.
#[derive(Debug, Clone)]
pub struct SignalMap {
    style: LabelStyle,
    order: Vec<SignalKey>,
    matrices: HashMap<SignalKey, Matrix>,
}

impl SignalMap {
    pub fn new(style: LabelStyle) -> Self {
        Self {
            style,
            order: Vec::new(),
            matrices: HashMap::new(),
        }
    }

    /// Pairs matrices with the layout keys, in layout order.
    pub fn from_layout(layout: &LabelLayout, matrices: Vec<Matrix>) -> Result<Self> {
        if matrices.len() != layout.len() {
            return Err(Error::ShapeMismatch {
                context: "signal labeling",
                expected: (layout.len(), 1),
                actual: (matrices.len(), 1),
            });
        }
        let mut map = Self::new(LabelStyle::Signal);
        for (key, matrix) in layout.keys().zip(matrices) {
            map.insert(key, matrix);
        }
        Ok(map)
    }

    pub fn style(&self) -> LabelStyle {
        self.style
    }

    /// Inserts or replaces; a new key is appended to the iteration order.
    pub fn insert(&mut self, key: SignalKey, matrix: Matrix) {
        if self.matrices.insert(key.clone(), matrix).is_none() {
            self.order.push(key);
        }
    }

    pub fn get(&self, key: &SignalKey) -> Option<&Matrix> {
        self.matrices.get(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn keys(&self) -> &[SignalKey] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SignalKey, &Matrix)> + '_ {
        self.order.iter().map(move |key| (key, &self.matrices[key]))
    }

    /// Distinct regions in first-seen order.
    pub fn regions(&self) -> Vec<&str> {
        let mut regions: Vec<&str> = Vec::new();
        for key in &self.order {
            if !regions.contains(&key.region.as_str()) {
                regions.push(&key.region);
            }
        }
        regions
    }

    /// Distinct channel indices in first-seen order.
    pub fn channels(&self) -> Vec<usize> {
        let mut channels = Vec::new();
        for key in &self.order {
            if !channels.contains(&key.channel) {
                channels.push(key.channel);
            }
        }
        channels
    }

    pub fn label(&self, key: &SignalKey) -> String {
        match self.style {
            LabelStyle::Signal => key.signal_label(),
            LabelStyle::Residual => key.residual_label(),
        }
    }
}

impl Serialize for SignalMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.order.len()))?;
        for (key, matrix) in self.iter() {
            map.serialize_entry(&self.label(key), matrix)?;
        }
        map.end()
    }
}
