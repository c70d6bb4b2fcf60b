//! Built-in keyword analysis.
//!
//! Used when no generation service is configured. Detects a few broad
//! genre families in the description and returns a matching canned
//! analysis.

use crate::models::AnalysisText;

/// Genre families the keyword analysis recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TasteProfile {
    /// Introspective indie plus atmospheric electronic.
    AestheticArchitect,
    /// Mainstream pop plus hip-hop.
    CulturalCurrentRider,
    /// Rock plus classical.
    IntensityBipolarity,
    /// Anything else.
    OmnivorousOpenness,
}

const INDIE: &[&str] = &["indie", "fleet foxes", "bon iver"];
const ELECTRONIC: &[&str] = &["electronic", "tycho", "bonobo"];
const HIP_HOP: &[&str] = &["hip hop", "rap", "drake"];
const POP: &[&str] = &["pop", "taylor swift", "ariana"];
const ROCK: &[&str] = &["rock", "metal"];
const CLASSICAL: &[&str] = &["classical", "chopin"];

fn mentions(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

impl TasteProfile {
    /// Classify a listening description. Case-insensitive substring match.
    pub fn detect(description: &str) -> Self {
        let text = description.to_lowercase();

        if mentions(&text, INDIE) && mentions(&text, ELECTRONIC) {
            TasteProfile::AestheticArchitect
        } else if mentions(&text, POP) && mentions(&text, HIP_HOP) {
            TasteProfile::CulturalCurrentRider
        } else if mentions(&text, ROCK) && mentions(&text, CLASSICAL) {
            TasteProfile::IntensityBipolarity
        } else {
            TasteProfile::OmnivorousOpenness
        }
    }

    pub fn analysis(&self) -> AnalysisText {
        match self {
            TasteProfile::AestheticArchitect => AnalysisText::new(
                "You pair hushed, confessional indie with textured electronic music. \
                 You value emotional depth and production that rewards headphones.",
                "You're an 'Aesthetic Architect': you build sonic rooms rather than just \
                 playing songs. Intimate folk and cerebral electronica are both tools for \
                 shifting your mood on purpose, which points to high openness and a taste \
                 for complexity.",
                "📝 Journal: note which playlist you reach for in each mood. Are you matching it or changing it?\n\
                 🎯 Challenge: build a playlist that moves from your most inward track to your most uplifting one, and notice where you want to stop.\n\
                 🎵 Serendipity Picks: Explosions in the Sky, Nils Frahm, Ólafur Arnalds.",
            ),
            TasteProfile::CulturalCurrentRider => AnalysisText::new(
                "You follow contemporary pop and hip-hop closely. You like music that is \
                 catchy, well produced, and part of the conversation.",
                "You're a 'Cultural Current Rider': music is social for you. Sharing new \
                 releases and talking about them matters as much as the songs, and the mix \
                 of hooks and rhythm shows you enjoy melody and flow in equal measure.",
                "📝 Journal: when did you start following each of these artists? Map it to who you were spending time with.\n\
                 🎯 Challenge: find three artists who are almost mainstream but not yet.\n\
                 🎵 Serendipity Picks: Raveena, Smino, Kali Uchis.",
            ),
            TasteProfile::IntensityBipolarity => AnalysisText::new(
                "Your taste spans the raw force of rock and the structure of classical \
                 music. You like both power and precision.",
                "This is 'Intensity Bipolarity': you regulate emotion through extremes. \
                 Rock gives release, classical gives order, and the middle ground rarely \
                 earns a place because it doesn't do a clear job for you.",
                "📝 Journal: track which moods send you to rock and which to classical. Are you amplifying or counteracting?\n\
                 🎯 Challenge: look for music that bridges both, like Shostakovich or Opeth.\n\
                 🎵 Serendipity Picks: Godspeed You! Black Emperor, Sigur Rós.",
            ),
            TasteProfile::OmnivorousOpenness => AnalysisText::new(
                "Your listening is broad. You don't settle into one genre and you're open \
                 to very different sounds.",
                "Your eclecticism suggests 'Omnivorous Openness': you pick music for the \
                 context rather than as an identity badge, which tracks with curiosity and \
                 emotional flexibility.",
                "📝 Journal: look for hidden rules. Do certain moods, tasks, or times of day call up specific genres?\n\
                 🎯 Challenge: make tightly scoped playlists (morning coffee, late-night thinking, workouts) and see what you pick.\n\
                 🎵 Serendipity Picks: FKA twigs, Thundercat, Khruangbin.",
            ),
        }
    }
}

/// Analyze a description without calling a model.
pub fn keyword_analysis(description: &str) -> AnalysisText {
    TasteProfile::detect(description).analysis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_profiles() {
        assert_eq!(
            TasteProfile::detect("Mostly Bon Iver and Fleet Foxes, plus Tycho"),
            TasteProfile::AestheticArchitect
        );
        assert_eq!(
            TasteProfile::detect("Taylor Swift and DRAKE on repeat"),
            TasteProfile::CulturalCurrentRider
        );
        assert_eq!(
            TasteProfile::detect("metal in the gym, Chopin at night"),
            TasteProfile::IntensityBipolarity
        );
        assert_eq!(
            TasteProfile::detect("bossa nova and field recordings"),
            TasteProfile::OmnivorousOpenness
        );
    }

    #[test]
    fn test_indie_alone_is_generic() {
        assert_eq!(
            TasteProfile::detect("indie folk only"),
            TasteProfile::OmnivorousOpenness
        );
    }

    #[test]
    fn test_keyword_analysis_fills_every_section() {
        let analysis = keyword_analysis("classical and rock");

        assert!(analysis.mirror.contains("rock"));
        assert!(analysis.pattern.contains("Intensity Bipolarity"));
        assert_eq!(analysis.actions.lines().count(), 3);
    }
}
