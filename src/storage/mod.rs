//! Media storage module
//!
//! Handles blog image upload/delete against Cloudflare R2 (public bucket)
//! or a local directory.

mod media;

pub use media::{
    BLOG_IMAGE_PREFIX, MAX_IMAGE_BYTES, MediaStorage, StoredObject, blog_image_key,
    sanitize_filename,
};

pub(crate) fn build_r2_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_only()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(https_connector)
}
