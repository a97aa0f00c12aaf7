//! Speaking session extractor

use crate::base::Extractor;
use studymem_core::{
    MispronouncedWord, Module, Observations, PhonemeError, SpeakingObservations, SpeakingScores,
};
use studymem_sessions::{SessionRecord, SessionSource};

const MISPRONOUNCED_BELOW: f64 = 70.0;
const PHONEME_ERROR_BELOW: f64 = 60.0;
const LOW_FLUENCY_BELOW: f64 = 70.0;
const MAX_PAUSES: u32 = 5;
const MAX_FILLERS: u32 = 3;
const MAX_SPEAKING_ITEMS: usize = 20;

#[derive(Debug, Default)]
pub struct SpeakingExtractor;

impl Extractor for SpeakingExtractor {
    fn module(&self) -> Module {
        Module::Speaking
    }

    fn extract(&self, record: &SessionRecord, _source: &dyn SessionSource) -> Observations {
        let SessionRecord::Speaking(session) = record else {
            return Observations::empty(Module::Speaking);
        };

        let mispronounced_words = session
            .words
            .iter()
            .filter(|w| w.accuracy_score < MISPRONOUNCED_BELOW)
            .map(|w| MispronouncedWord {
                word: w.word.clone(),
                accuracy: w.accuracy_score,
                error_type: Some(w.error_type.clone().unwrap_or_else(|| "unknown".to_string())),
            })
            .take(MAX_SPEAKING_ITEMS)
            .collect();

        let phoneme_errors = session
            .words
            .iter()
            .flat_map(|w| w.phonemes.iter())
            .filter(|p| p.accuracy_score < PHONEME_ERROR_BELOW)
            .map(|p| PhonemeError {
                phoneme: p.phoneme.clone(),
                accuracy: p.accuracy_score,
            })
            .take(MAX_SPEAKING_ITEMS)
            .collect();

        let mut fluency_problems = Vec::new();
        if matches!(session.fluency_score, Some(f) if f > 0.0 && f < LOW_FLUENCY_BELOW) {
            fluency_problems.push("low_fluency".to_string());
        }
        if session.pause_count > MAX_PAUSES {
            fluency_problems.push("excessive_pauses".to_string());
        }
        if session.filler_word_count > MAX_FILLERS {
            fluency_problems.push("filler_words".to_string());
        }

        Observations::Speaking(SpeakingObservations {
            mispronounced_words,
            phoneme_errors,
            fluency_problems,
            scores: SpeakingScores {
                pronunciation: session.pronunciation_score.unwrap_or(0.0),
                accuracy: session.accuracy_score.unwrap_or(0.0),
                fluency: session.fluency_score.unwrap_or(0.0),
                completeness: session.completeness_score.unwrap_or(0.0),
            },
            practice_level: session.practice_type.clone(),
        })
    }
}
