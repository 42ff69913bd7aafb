use crate::Term;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"\W+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = ENGLISH_STOPWORDS.iter().copied().collect();
}

/// English stopwords, checked after lowercasing and before stemming.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i","me","my","myself","we","our","ours","ourselves","you","you're","you've","you'll","you'd",
    "your","yours","yourself","yourselves","he","him","his","himself","she","she's","her","hers",
    "herself","it","it's","its","itself","they","them","their","theirs","themselves",
    "what","which","who","whom","this","that","that'll","these","those",
    "am","is","are","was","were","be","been","being","have","has","had","having","do","does","did","doing",
    "a","an","the","and","but","if","or","because","as","until","while",
    "of","at","by","for","with","about","against","between","into","through","during","before","after",
    "above","below","to","from","up","down","in","out","on","off","over","under",
    "again","further","then","once","here","there","when","where","why","how",
    "all","any","both","each","few","more","most","other","some","such",
    "no","nor","not","only","own","same","so","than","too","very",
    "s","t","can","will","just","don","don't","should","should've","now",
    "d","ll","m","o","re","ve","y",
    "ain","aren","aren't","couldn","couldn't","didn","didn't","doesn","doesn't","hadn","hadn't",
    "hasn","hasn't","haven","haven't","isn","isn't","ma","mightn","mightn't","mustn","mustn't",
    "needn","needn't","shan","shan't","shouldn","shouldn't","wasn","wasn't","weren","weren't",
    "won","won't","wouldn","wouldn't",
];

/// Turns raw text into the term sequence used for both documents and queries.
///
/// Implementations must be deterministic: the same text always yields the same
/// terms, in order, with repetitions kept.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, text: &str) -> Vec<Term>;
}

/// NFKC, non-word stripping, lowercasing, stopword removal and Porter2 stemming.
#[derive(Debug, Clone, Default)]
pub struct EnglishNormalizer {
    custom_stopwords: Option<HashSet<String>>,
}

impl EnglishNormalizer {
    pub fn new() -> Self { Self::default() }

    /// Replace the built-in stopword list. Words are lowercased on the way in.
    pub fn with_stopwords<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = words.into_iter().map(|w| w.as_ref().to_lowercase()).collect();
        Self { custom_stopwords: Some(set) }
    }

    fn is_stopword(&self, token: &str) -> bool {
        match &self.custom_stopwords {
            Some(set) => set.contains(token),
            None => STOPWORDS.contains(token),
        }
    }
}

impl Normalizer for EnglishNormalizer {
    fn normalize(&self, text: &str) -> Vec<Term> {
        let composed = text.nfkc().collect::<String>();
        let spaced = NON_WORD.replace_all(&composed, " ").to_lowercase();
        spaced
            .split_whitespace()
            .filter(|token| !self.is_stopword(token))
            .map(|token| STEMMER.stem(token).into_owned())
            .collect()
    }
}

/// Normalize with the default English pipeline.
pub fn normalize(text: &str) -> Vec<Term> {
    EnglishNormalizer::default().normalize(text)
}
