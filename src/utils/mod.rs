pub mod files;
pub mod image_urls;
