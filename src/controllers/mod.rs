pub mod extractor;
pub mod proxy;
pub mod root;
pub mod stream;
pub use extractor::{MetadataExtractor, YtDlp};
pub use proxy::ProxyController;
pub use root::RootController;
pub use stream::StreamController;
