pub mod memory;
pub mod postgres;
pub mod razorpay;
pub mod s3;

pub use memory::{FakePaymentProvider, MemoryBlobStore, MemoryStore};
pub use razorpay::RazorpayClient;
pub use s3::S3BlobStore;
