pub mod sample_file;
pub mod upload;

pub use sample_file::SampleFileSource;
pub use upload::{UploadedContent, UploadedFileSource};
