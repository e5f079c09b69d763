//! Lexicon-based sentiment scoring
//!
//! Each token takes its valence from the [`Lexicon`], then a fixed set of
//! local modifiers adjusts it before the summed valence is squashed into
//! `[-1, 1]`:
//!
//! - intensifiers ("very", "extremely") and dampeners ("slightly") in the
//!   three preceding tokens push the valence away from or toward zero
//! - a negator in the three preceding tokens flips and shrinks the valence
//! - an ALL-CAPS term inside mixed-case text is emphasized
//! - "but" halves what came before it and amplifies what follows
//! - repeated `!` and `?` boost the overall magnitude
//!
//! Scoring is total: any string, including empty input, yields a score.

use crate::analytics::lexicon::Lexicon;
use crate::models::{SentimentScore, TextUnit};
use crate::utils::tokenize;

/// Valence shift added by an intensifier directly before a term
const BOOSTER_INCREMENT: f64 = 0.293;

/// Multiplier applied to a negated valence
const NEGATION_SCALAR: f64 = -0.74;

/// Valence shift for an ALL-CAPS term in mixed-case text
const CAPS_INCREMENT: f64 = 0.733;

/// Per-`!` emphasis, counted up to [`MAX_EXCLAMATIONS`]
const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;

/// Per-`?` emphasis when more than one question mark is present
const QUESTION_INCREMENT: f64 = 0.18;
const MAX_QUESTION_EMPHASIS: f64 = 0.96;

/// Normalization constant: `compound = s / sqrt(s² + ALPHA)`
const ALPHA: f64 = 15.0;

/// Distance damping for modifiers one, two and three tokens back
const DISTANCE_DAMPING: [f64; 3] = [1.0, 0.95, 0.9];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "nowhere", "neither", "nor", "without",
    "cannot", "nope", "aint", "dont", "doesnt", "didnt", "isnt", "wasnt", "arent", "werent",
    "wont", "cant", "couldnt", "shouldnt", "wouldnt", "hasnt", "havent", "hadnt", "mustnt",
];

const INTENSIFIERS: &[&str] = &[
    "absolutely", "amazingly", "completely", "considerably", "deeply", "enormously",
    "entirely", "especially", "exceptionally", "extremely", "fully", "greatly", "highly",
    "hugely", "incredibly", "intensely", "majorly", "more", "most", "particularly", "purely",
    "quite", "really", "remarkably", "so", "substantially", "thoroughly", "totally",
    "tremendously", "truly", "unbelievably", "unusually", "utterly", "very",
];

const DAMPENERS: &[&str] = &[
    "almost", "barely", "hardly", "kinda", "less", "little", "marginally", "occasionally",
    "partly", "scarcely", "slightly", "somewhat", "sorta",
];

/// Scores text units against a lexicon
#[derive(Debug, Clone)]
pub struct SentimentScorer {
    lexicon: Lexicon,
    fingerprint: String,
}

impl SentimentScorer {
    /// Create a scorer over a lexicon
    #[must_use]
    pub fn new(lexicon: Lexicon) -> Self {
        let fingerprint = lexicon.fingerprint();
        Self {
            lexicon,
            fingerprint,
        }
    }

    /// Fingerprint of the lexicon in use
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Score one unit
    pub fn score(&self, unit: &TextUnit) -> SentimentScore {
        self.score_text(&unit.id, &unit.text)
    }

    /// Score raw text under the given unit id
    pub fn score_text(&self, unit_id: &str, text: &str) -> SentimentScore {
        let text = text.replace('\u{2019}', "'");
        let tokens = tokenize(&text);
        if tokens.is_empty() {
            return SentimentScore::neutral(unit_id);
        }

        let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        let mixed_case = is_mixed_case(&tokens);

        let mut valences = Vec::with_capacity(tokens.len());
        let mut matched = false;

        for (i, word) in lowered.iter().enumerate() {
            if modifier_scalar(word).is_some() {
                valences.push(0.0);
                continue;
            }

            let Some(base) = self.lexicon.valence(word) else {
                valences.push(0.0);
                continue;
            };
            matched = true;

            let mut valence = base;
            if valence != 0.0 {
                if mixed_case && is_all_caps(tokens[i]) {
                    valence += CAPS_INCREMENT.copysign(valence);
                }

                for (distance, damping) in DISTANCE_DAMPING.iter().enumerate() {
                    let Some(prev) = i.checked_sub(distance + 1) else {
                        break;
                    };
                    if let Some(scalar) = modifier_scalar(&lowered[prev]) {
                        // intensifiers push away from zero, dampeners toward it
                        valence += scalar * damping * valence.signum();
                    }
                }

                let negated = (1..=3)
                    .filter_map(|d| i.checked_sub(d))
                    .any(|prev| is_negator(&lowered[prev]));
                if negated {
                    valence *= NEGATION_SCALAR;
                }
            }

            valences.push(valence);
        }

        if !matched {
            return SentimentScore::neutral(unit_id);
        }

        apply_contrast(&lowered, &mut valences);

        let emphasis = punctuation_emphasis(&text);
        let mut sum: f64 = valences.iter().sum();
        if sum > 0.0 {
            sum += emphasis;
        } else if sum < 0.0 {
            sum -= emphasis;
        }

        let (positive, neutral, negative) = proportions(&valences, emphasis);

        SentimentScore {
            unit_id: unit_id.to_string(),
            positive,
            neutral,
            negative,
            compound: normalize(sum),
        }
    }
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new(Lexicon::default())
    }
}

/// Signed scalar for intensifiers (+) and dampeners (-)
fn modifier_scalar(word: &str) -> Option<f64> {
    if INTENSIFIERS.contains(&word) {
        Some(BOOSTER_INCREMENT)
    } else if DAMPENERS.contains(&word) {
        Some(-BOOSTER_INCREMENT)
    } else {
        None
    }
}

fn is_negator(word: &str) -> bool {
    let bare: String = word.chars().filter(|c| *c != '\'').collect();
    NEGATORS.contains(&bare.as_str()) || word.ends_with("n't")
}

fn is_all_caps(token: &str) -> bool {
    token.chars().any(char::is_alphabetic) && !token.chars().any(char::is_lowercase)
}

/// True when some, but not all, tokens are ALL-CAPS
fn is_mixed_case(tokens: &[&str]) -> bool {
    let caps = tokens.iter().filter(|t| is_all_caps(t)).count();
    caps > 0 && caps < tokens.len()
}

/// Halve valences before the first "but" and amplify those after it
fn apply_contrast(words: &[String], valences: &mut [f64]) {
    let Some(pivot) = words.iter().position(|w| w == "but") else {
        return;
    };
    for (i, valence) in valences.iter_mut().enumerate() {
        if i < pivot {
            *valence *= 0.5;
        } else if i > pivot {
            *valence *= 1.5;
        }
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
    let questions = text.matches('?').count();

    let question_emphasis = if questions > 1 {
        (questions as f64 * QUESTION_INCREMENT).min(MAX_QUESTION_EMPHASIS)
    } else {
        0.0
    };

    exclamations as f64 * EXCLAMATION_INCREMENT + question_emphasis
}

/// Saturating normalization into `[-1, 1]`
fn normalize(sum: f64) -> f64 {
    if sum == 0.0 {
        return 0.0;
    }
    // hypot keeps huge sums from overflowing to inf / inf
    (sum / sum.hypot(ALPHA.sqrt())).clamp(-1.0, 1.0)
}

/// Positive, neutral and negative shares summing to one
fn proportions(valences: &[f64], emphasis: f64) -> (f64, f64, f64) {
    let mut positive = 0.0;
    let mut negative = 0.0;
    let mut neutral = 0.0;

    for &v in valences {
        if v > 0.0 {
            positive += v + 1.0;
        } else if v < 0.0 {
            negative += v - 1.0;
        } else {
            neutral += 1.0;
        }
    }

    if positive > negative.abs() {
        positive += emphasis;
    } else if positive < negative.abs() {
        negative -= emphasis;
    }

    let total = positive + negative.abs() + neutral;
    if total <= 0.0 {
        return (0.0, 1.0, 0.0);
    }

    (positive / total, neutral / total, negative.abs() / total)
}
