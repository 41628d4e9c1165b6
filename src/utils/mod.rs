pub mod image_urls;
