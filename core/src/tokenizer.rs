use crate::Term;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = ENGLISH_STOPWORDS.split_whitespace().collect();
}

const ENGLISH_STOPWORDS: &str = "
    i me my myself we our ours ourselves you you're you've you'll you'd your yours yourself
    yourselves he him his himself she she's her hers herself it it's its itself they them their
    theirs themselves what which who whom this that that'll these those am is are was were be
    been being have has had having do does did doing a an the and but if or because as until
    while of at by for with about against between into through during before after above below
    to from up down in out on off over under again further then once here there when where why
    how all any both each few more most other some such no nor not only own same so than too
    very s t can will just don don't should should've now d ll m o re ve y ain aren aren't
    couldn couldn't didn didn't doesn doesn't hadn hadn't hasn hasn't haven haven't isn isn't ma
    mightn mightn't mustn mustn't needn needn't shan shan't shouldn shouldn't wasn wasn't weren
    weren't won won't wouldn wouldn't
";

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Turns raw text into the normalized terms the index is built from.
///
/// Implementations must be deterministic and case-folding; documents and
/// queries go through the same instance.
pub trait Preprocess: Send + Sync {
    fn preprocess(&self, text: &str) -> Vec<Term>;
}

impl<F> Preprocess for F
where
    F: Fn(&str) -> Vec<Term> + Send + Sync,
{
    fn preprocess(&self, text: &str) -> Vec<Term> {
        self(text)
    }
}

/// English analyzer: NFKC, lowercase, stop-word removal, Snowball stemming.
#[derive(Debug, Clone, Copy, Default)]
pub struct Analyzer;

impl Preprocess for Analyzer {
    fn preprocess(&self, text: &str) -> Vec<Term> {
        tokenize(text).into_iter().map(|(term, _pos)| term).collect()
    }
}

/// Tokenize text into (term, position) using NFKC normalization, lowercase, stopword removal, and stemming.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    for (pos, mat) in RE.find_iter(&normalized).enumerate() {
        let token = mat.as_str();
        if is_stopword(token) { continue; }
        let stem = STEMMER.stem(token).to_string();
        tokens.push((stem, pos));
    }
    tokens
}
