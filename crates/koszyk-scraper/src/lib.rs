pub mod error;
pub mod extract;
pub mod fallback;
pub mod orchestrator;
pub mod random;
pub mod registry;
pub mod remote;
pub mod report;
pub mod session;
pub mod source;

pub use error::ScrapeError;
pub use extract::{build_extractor, Extractor, HeuristicExtractor};
pub use fallback::FallbackCatalog;
pub use orchestrator::{OrchestratorSettings, ScrapeOrchestrator, ScrapeRequest};
pub use random::RandomSource;
pub use registry::{StoreEntry, StoreRegistry};
pub use remote::resolve_ws_url;
pub use report::{ScrapeOutcome, ScrapeReport, ScrapeRun, StoreReport, StoreStatus};
pub use session::{BrowserSettings, ChromiumPageSource, PageSession};
pub use source::{PageSnapshot, PageSource};
