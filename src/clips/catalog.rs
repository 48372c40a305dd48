use std::{collections::BTreeMap, path::Path};

use crate::foundation::error::{ChoreoError, ChoreoResult};

/// Suffix of root-translation tracks.
const POSITION_SUFFIX: &str = ".position";

/// One keyframed channel of a clip.
///
/// `values` holds `times.len()` consecutive samples of `stride` components each.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    /// Animated property, e.g. `Hips.position` or `Spine.quaternion`.
    pub target: String,
    /// Key times in seconds, sorted.
    pub times: Vec<f64>,
    /// Flattened key values.
    pub values: Vec<f64>,
}

impl Track {
    /// Components per key.
    pub fn stride(&self) -> usize {
        if self.times.is_empty() {
            0
        } else {
            self.values.len() / self.times.len()
        }
    }

    pub fn is_root_translation(&self) -> bool {
        self.target.ends_with(POSITION_SUFFIX)
    }

    pub fn validate(&self) -> ChoreoResult<()> {
        if self.times.is_empty() {
            return Err(ChoreoError::animation(format!(
                "track '{}' has no keys",
                self.target
            )));
        }
        if self.values.is_empty() || self.values.len() % self.times.len() != 0 {
            return Err(ChoreoError::animation(format!(
                "track '{}' has {} values for {} keys",
                self.target,
                self.values.len(),
                self.times.len()
            )));
        }
        if !self.times.windows(2).all(|w| w[0] <= w[1]) {
            return Err(ChoreoError::animation(format!(
                "track '{}' key times must be sorted",
                self.target
            )));
        }
        Ok(())
    }

    /// Linearly interpolated value at `time`, holding the first/last key outside the range.
    pub fn sample(&self, time: f64) -> Vec<f64> {
        let stride = self.stride();
        if stride == 0 {
            return Vec::new();
        }
        let key = |i: usize| &self.values[i * stride..(i + 1) * stride];

        let idx = self.times.partition_point(|&t| t <= time);
        if idx == 0 {
            return key(0).to_vec();
        }
        if idx >= self.times.len() {
            return key(self.times.len() - 1).to_vec();
        }

        let (t0, t1) = (self.times[idx - 1], self.times[idx]);
        let denom = t1 - t0;
        if denom <= 0.0 {
            return key(idx - 1).to_vec();
        }
        let t = (time - t0) / denom;
        key(idx - 1)
            .iter()
            .zip(key(idx))
            .map(|(a, b)| a + (b - a) * t)
            .collect()
    }
}

/// Immutable clip data.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClipData {
    /// Length in seconds.
    pub duration: f64,
    /// Keyframed channels.
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl ClipData {
    /// A clip with no channels; enough for timing-only playback.
    pub fn timing_only(duration: f64) -> Self {
        Self {
            duration,
            tracks: Vec::new(),
        }
    }

    fn validate(&self, name: &str) -> ChoreoResult<()> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(ChoreoError::animation(format!(
                "clip '{name}' duration must be finite and > 0"
            )));
        }
        for track in &self.tracks {
            track.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    #[serde(default)]
    keep_root_motion: Option<String>,
    clips: Vec<ManifestClip>,
}

#[derive(Debug, serde::Deserialize)]
struct ManifestClip {
    name: String,
    #[serde(flatten)]
    data: ClipData,
}

/// Logical clip name to clip data.
///
/// Root-translation tracks are stripped on construction, except on the one clip
/// allowed to keep its root motion (the seated pose).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClipCatalog {
    clips: BTreeMap<String, ClipData>,
}

impl ClipCatalog {
    /// Build from in-memory clips.
    pub fn from_clips(
        clips: impl IntoIterator<Item = (String, ClipData)>,
        keep_root_motion: &str,
    ) -> ChoreoResult<Self> {
        let mut out = BTreeMap::new();
        for (name, mut data) in clips {
            if name.trim().is_empty() {
                return Err(ChoreoError::animation("clip name must be non-empty"));
            }
            data.validate(&name)?;
            if name != keep_root_motion {
                data.tracks.retain(|t| !t.is_root_translation());
            }
            if out.insert(name.clone(), data).is_some() {
                return Err(ChoreoError::animation(format!("duplicate clip '{name}'")));
            }
        }
        Ok(Self { clips: out })
    }

    /// Parse a JSON manifest: `{ "keep_root_motion": "...", "clips": [{ "name", "duration", "tracks" }] }`.
    pub fn from_manifest_str(s: &str, default_keep_root_motion: &str) -> ChoreoResult<Self> {
        let manifest: Manifest = serde_json::from_str(s)?;
        let keep = manifest
            .keep_root_motion
            .unwrap_or_else(|| default_keep_root_motion.to_owned());
        Self::from_clips(manifest.clips.into_iter().map(|c| (c.name, c.data)), &keep)
    }

    #[tracing::instrument]
    pub fn from_manifest_path(path: &Path, default_keep_root_motion: &str) -> ChoreoResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ChoreoError::config(format!("cannot read clip manifest '{}': {e}", path.display()))
        })?;
        Self::from_manifest_str(&text, default_keep_root_motion)
    }

    /// Timing-only stand-ins for the site's nine clips.
    pub fn builtin() -> Self {
        let clips = [
            ("lookOverShoulder", 4.0),
            ("running", 0.73),
            ("kneelingPointing", 3.2),
            ("swinging", 1.9),
            ("crouchToStand", 1.6),
            ("changeDirection", 1.2),
            ("sittingLaughing", 5.0),
            ("jumpToFreehang", 1.7),
            ("ropeClimb", 2.3),
        ]
        .into_iter()
        .map(|(name, d)| (name.to_owned(), ClipData::timing_only(d)))
        .collect();
        Self { clips }
    }

    pub fn get(&self, name: &str) -> Option<&ClipData> {
        self.clips.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clips.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clips/catalog.rs"]
mod tests;
