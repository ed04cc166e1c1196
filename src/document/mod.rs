pub mod probe;
pub mod resolver;

pub use probe::{DocumentProbe, HttpProbe};
pub use resolver::{candidate_urls, information_document_url, product_document_url, DocumentResolver, Resolution};
