pub mod detail;
pub mod http;
pub mod listing;
pub mod normalize;
pub mod pipeline;

pub use detail::DetailParser;
pub use http::{HttpClient, Transport};
pub use listing::ListingProvider;
pub use pipeline::ScrapePipeline;
