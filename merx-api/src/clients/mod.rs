pub mod account;
pub mod catalog;
pub mod order_status;
pub mod processor;

pub use account::HttpAccountDirectory;
pub use catalog::HttpProductCatalog;
pub use order_status::HttpOrderStatusSink;
pub use processor::RestPaymentProvider;
