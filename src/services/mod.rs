pub mod arabic;
pub mod compiler;
pub mod excerpts;
pub mod fetcher;
pub mod flattener;
pub mod matcher;
pub mod output;
pub mod segmenter;
pub mod tokens;

pub use compiler::RuleCompiler;
pub use fetcher::ContentFetcher;
pub use output::OutputWriter;
pub use segmenter::Segmenter;
pub use tokens::TokenExpander;
