pub mod analysis;
pub mod batch;
pub mod config;
pub mod incremental;
pub mod normalizer;
pub mod parsers;
pub mod prompts;
pub mod reader;

// Re-export main types for convenient access
pub use normalizer::{normalize, Normalizer, NormalizerConfig, PunctuationSet};

pub use analysis::{TextAnalysis, TextAnalyzer};
pub use config::{AnalysisConfig, AppConfig};
pub use parsers::{LiteracyActivity, OutputParser, ReflectionSheet};
pub use prompts::{build_request, Catalogue, ChatMessage, ChatRequest, ChatResponse, PromptTemplate};

// Re-export batch processing types for the CLI and benchmarks
pub use batch::{clean_files, write_stats, BatchConfig, FileStats};
