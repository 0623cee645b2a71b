use super::{Runtime, SpiceLevel, clean_list, clean_opt};

/// Dramatized ("graphic audio") edition details, maintained by hand.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct GraphicAudio {
    pub voices: Vec<String>,
    pub runtime: Option<Runtime>,
}

/// User-owned fields of a book.
///
/// No source provides these, so fetching fresh metadata never overwrites them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Curation {
    pub spice_level: Option<SpiceLevel>,
    pub subgenre: Option<String>,
    pub kindle_unlimited: Option<bool>,
    pub graphic_audio: Option<GraphicAudio>,
}
impl Curation {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply a set of edits. Fields left as `None` in the patch are untouched.
    pub fn apply(&mut self, patch: CurationPatch) {
        if let Some(spice) = patch.spice_level {
            self.spice_level = Some(spice);
        }
        if let Some(subgenre) = clean_opt(patch.subgenre) {
            self.subgenre = Some(subgenre);
        }
        if let Some(ku) = patch.kindle_unlimited {
            self.kindle_unlimited = Some(ku);
        }
        if patch.graphic_audio_voices.is_some() || patch.graphic_audio_runtime.is_some() {
            let graphic = self.graphic_audio.get_or_insert_with(GraphicAudio::default);
            if let Some(voices) = patch.graphic_audio_voices {
                graphic.voices = clean_list(voices);
            }
            if let Some(runtime) = patch.graphic_audio_runtime {
                graphic.runtime = Some(runtime);
            }
        }
    }
}

/// A partial update of [`Curation`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurationPatch {
    pub spice_level: Option<SpiceLevel>,
    pub subgenre: Option<String>,
    pub kindle_unlimited: Option<bool>,
    pub graphic_audio_voices: Option<Vec<String>>,
    pub graphic_audio_runtime: Option<Runtime>,
}
impl CurationPatch {
    /// Nothing would change: every field is unset, or cleans away to nothing
    /// (a blank subgenre, say).
    pub fn is_empty(&self) -> bool {
        let mut applied = Curation::default();
        applied.apply(self.clone());
        applied.is_empty()
    }
}
