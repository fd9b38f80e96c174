use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

use ragmix_core::settings::StopWordsSetting;

const ENGLISH: &[&str] = &[
	"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

const PORTUGUESE: &[&str] = &[
	"a","o","as","os","um","uma","uns","umas","de","do","da","dos","das","em","no","na","nos","nas","por","pelo","pela","para","com","sem","que","e","ou","mas","se","é","são","foi","ser","ao","aos","à","às","seu","sua","seus","suas","ele","ela","eles","elas","isso","isto","este","esta","esse","essa","como","mais","muito","já","não",
];

/// Stopword policy for the lexical pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopWords {
	English,
	Portuguese,
	None,
	Custom(Vec<String>),
}

impl StopWords {
	fn words(&self) -> Vec<String> {
		match self {
			Self::English => ENGLISH.iter().map(|s| s.to_string()).collect(),
			Self::Portuguese => PORTUGUESE.iter().map(|s| s.to_string()).collect(),
			Self::None => Vec::new(),
			Self::Custom(words) => words.iter().map(|w| w.to_lowercase()).collect(),
		}
	}
}

impl From<StopWordsSetting> for StopWords {
	fn from(setting: StopWordsSetting) -> Self {
		match setting {
			StopWordsSetting::English => Self::English,
			StopWordsSetting::Portuguese => Self::Portuguese,
			StopWordsSetting::Disabled => Self::None,
		}
	}
}

/// Lowercase, split on non-alphanumeric boundaries, drop stopwords.
#[derive(Clone)]
pub struct Analyzer {
	inner: TextAnalyzer,
}

impl Analyzer {
	pub fn new(stop_words: &StopWords) -> Self {
		let inner = TextAnalyzer::builder(SimpleTokenizer::default())
			.filter(LowerCaser)
			.filter(StopWordFilter::remove(stop_words.words()))
			.build();
		Self { inner }
	}

	pub fn tokenize(&self, text: &str) -> Vec<String> {
		// token_stream needs &mut; the clone copies the boxed pipeline
		let mut analyzer = self.inner.clone();
		let mut stream = analyzer.token_stream(text);
		let mut tokens = Vec::new();
		stream.process(&mut |token| tokens.push(token.text.clone()));
		tokens
	}
}

impl Default for Analyzer {
	fn default() -> Self {
		Self::new(&StopWords::English)
	}
}
